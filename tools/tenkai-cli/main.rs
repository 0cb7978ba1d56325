use clap::{Parser, Subcommand};
use tenkai::prelude::*;

/// A graph-template resolution and job-tracking CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the execution backend
    #[arg(short, long, default_value = "http://127.0.0.1:8188")]
    url: String,

    /// Path of the durable client store file
    #[arg(short, long, default_value = "tenkai-store.json")]
    store: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the templates available in the backend catalog
    List,
    /// Show the extracted controls of a template
    Schema {
        /// Template name
        template: String,
    },
    /// Resolve a template against the stored form state and print the
    /// submission-ready graph without submitting it
    Resolve {
        /// Template name
        template: String,
    },
    /// Set a form value for a template
    Set {
        /// Template name
        template: String,
        /// Control display name
        name: String,
        /// New value (stored as a string; coerced at resolve time)
        value: String,
    },
    /// Resolve, submit, and watch the job until a terminal event
    Generate {
        /// Template name
        template: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tenkai=debug".to_string()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = BackendClient::new(BackendConfig::new(&cli.url))?;
    let mut store = ClientStore::open(&cli.store)?;

    match cli.command {
        Command::List => {
            for name in client.list_templates().await? {
                println!("{name}");
            }
        }
        Command::Schema { template } => {
            let session = load_session(&client, &mut store, &template).await?;
            if session.has_no_controls() {
                println!("Template declares no controls.");
                return Ok(());
            }
            for control in session.controls() {
                println!(
                    "{:>3}  {:<24} {:?}  default={}",
                    control.priority, control.name, control.kind, control.default
                );
            }
        }
        Command::Resolve { template } => {
            let mut session = load_session(&client, &mut store, &template).await?;
            let resolved = session.resolve(&mut store, &mut rand::rng())?;
            println!("{}", serde_json::to_string_pretty(&resolved.to_value())?);
        }
        Command::Set {
            template,
            name,
            value,
        } => {
            let mut session = load_session(&client, &mut store, &template).await?;
            session.set_value(&mut store, &name, value.into())?;
            println!("Stored '{name}' for template '{template}'.");
        }
        Command::Generate { template } => {
            let mut session = load_session(&client, &mut store, &template).await?;
            let mut tracker = JobTracker::new();
            let job = session.submit(&client, &mut store, &mut tracker).await?;
            println!("Queued job {}", job.correlation_id);

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let channel = spawn_status_channel(client.config().ws_url(), tx);

            while let Some(event) = rx.recv().await {
                record_status_event(&mut tracker, &mut store, event);
                if let Some((value, max)) = tracker.progress() {
                    println!("progress {value}/{max}");
                }
                if let Some(step) = tracker.current_step() {
                    println!("executing: {step}");
                }
                if tracker.state() == JobState::Completed {
                    break;
                }
            }
            channel.abort();

            match tracker.artifact_url() {
                Some(url) => println!("Artifact ready: {url}"),
                None => println!("Job completed without a new artifact."),
            }
        }
    }

    Ok(())
}

async fn load_session(
    client: &BackendClient,
    store: &mut ClientStore,
    template: &str,
) -> Result<Session> {
    let graph = client.get_template(template).await?;
    Ok(Session::load(template, graph, store)?)
}
