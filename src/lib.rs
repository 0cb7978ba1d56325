//! # Tenkai - Graph Template Resolution and Job Tracking
//!
//! **Tenkai** turns a *parameterized computation graph template* — the
//! node-id-keyed JSON mapping a visual graph editor produces — into a
//! concrete, submission-ready graph for a node-based generation backend,
//! and then tracks the resulting asynchronous job over the backend's
//! streaming status channel.
//!
//! ## Core Workflow
//!
//! 1.  **Load a template**: fetch it from the backend catalog (or any other
//!     source) and parse it into a [`graph::Graph`].
//! 2.  **Extract the schema**: [`schema::extract_controls`] finds the
//!     template's parameter-declaring nodes and yields ordered control
//!     descriptors for a form layer.
//! 3.  **Resolve**: given the current form state, [`resolver::resolve_values`]
//!     computes each parameter's concrete scalar (coercion + randomized
//!     draws), and [`rewrite::Rewriter`] injects them into a clone of the
//!     template, deleting parameter slots and rewiring bypassed nodes.
//! 4.  **Submit & track**: [`client::BackendClient`] posts the resolved
//!     graph; [`job::JobTracker`] consumes the streaming status events
//!     until an artifact-ready or completion event arrives.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tenkai::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = BackendClient::new(BackendConfig::new("http://127.0.0.1:8188"))?;
//!     let mut store = ClientStore::open("tenkai-store.json")?;
//!
//!     // Load a template from the backend catalog.
//!     let names = client.list_templates().await?;
//!     let template = client.get_template(&names[0]).await?;
//!     let mut session = Session::load(&names[0], template, &mut store)?;
//!
//!     // Fill in a value, then resolve and submit.
//!     session.set_value(&mut store, "Prompt", "a quiet harbor at dawn".into())?;
//!     let mut tracker = JobTracker::new();
//!     let job = session.submit(&client, &mut store, &mut tracker).await?;
//!     println!("queued job {}", job.correlation_id);
//!
//!     // Drive the tracker from the streaming status channel.
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!     let _channel = spawn_status_channel(client.config().ws_url(), tx);
//!     while let Some(event) = rx.recv().await {
//!         record_status_event(&mut tracker, &mut store, event);
//!         if tracker.state() == JobState::Completed {
//!             break;
//!         }
//!     }
//!
//!     if let Some(url) = tracker.artifact_url() {
//!         println!("artifact ready: {url}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod form;
pub mod graph;
pub mod job;
pub mod prelude;
pub mod resolver;
pub mod rewrite;
pub mod schema;
pub mod session;
pub mod storage;
