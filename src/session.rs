//! A session ties one loaded template to its extracted schema, form state,
//! and tracker bookkeeping, and drives the resolve-and-submit cycle.

use rand::Rng;
use tracing::warn;
use uuid::Uuid;

use crate::client::BackendClient;
use crate::error::{BackendError, ResolveError, StorageError, TemplateError};
use crate::form::FormState;
use crate::graph::Graph;
use crate::job::{Job, JobTracker, StatusEvent};
use crate::resolver::resolve_values;
use crate::rewrite::Rewriter;
use crate::schema::{ControlDescriptor, ControlLayout, extract_controls, layout_controls};
use crate::storage::ClientStore;

/// One loaded template and everything needed to submit it.
#[derive(Debug)]
pub struct Session {
    template_name: String,
    template: Graph,
    controls: Vec<ControlDescriptor>,
    form: FormState,
    session_id: String,
    rewriter: Rewriter,
}

impl Session {
    /// Loads a template: extracts its schema, seeds the form state from
    /// durable storage, and records the selection as the last used
    /// template.
    ///
    /// A template with no parameter nodes is not an error — the session
    /// simply carries an empty control list and the presentation layer
    /// shows its empty state.
    pub fn load(
        name: impl Into<String>,
        template: Graph,
        store: &mut ClientStore,
    ) -> Result<Self, StorageError> {
        let name = name.into();
        let controls = match extract_controls(&template) {
            Ok(controls) => controls,
            Err(TemplateError::EmptyTemplate) => Vec::new(),
            // extract_controls only fails with EmptyTemplate.
            Err(_) => Vec::new(),
        };

        let mut form = store.load_form(&name);
        form.seed_defaults(&controls);
        store.set_last_template(&name)?;
        store.save_form(&name, &form)?;

        Ok(Self {
            template_name: name,
            template,
            controls,
            form,
            session_id: Uuid::new_v4().to_string(),
            rewriter: Rewriter::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.template_name
    }

    pub fn template(&self) -> &Graph {
        &self.template
    }

    pub fn controls(&self) -> &[ControlDescriptor] {
        &self.controls
    }

    /// Presentation rows for the control list (adjacent numerics grouped).
    pub fn layout(&self) -> Vec<ControlLayout> {
        layout_controls(&self.controls)
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the template declares no controls at all.
    pub fn has_no_controls(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn set_value(
        &mut self,
        store: &mut ClientStore,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), StorageError> {
        self.form.set_value(name, value);
        store.save_form(&self.template_name, &self.form)
    }

    pub fn set_randomize(
        &mut self,
        store: &mut ClientStore,
        name: &str,
        on: bool,
    ) -> Result<(), StorageError> {
        self.form.set_randomize(name, on);
        store.save_form(&self.template_name, &self.form)
    }

    pub fn set_bypassed(
        &mut self,
        store: &mut ClientStore,
        name: &str,
        on: bool,
    ) -> Result<(), StorageError> {
        self.form.set_bypassed(name, on);
        store.save_form(&self.template_name, &self.form)
    }

    /// Resolves the template against the current form state into a
    /// submission-ready graph. All failures occur here, before any network
    /// effect.
    pub fn resolve<R: Rng>(
        &mut self,
        store: &mut ClientStore,
        rng: &mut R,
    ) -> Result<Graph, ResolveError> {
        let values = resolve_values(&self.controls, &mut self.form, rng);

        // Randomized draws were written back into the form; persist them so
        // the UI reflects the values actually used. A storage hiccup must
        // not block the submission itself.
        if let Err(e) = store.save_form(&self.template_name, &self.form) {
            warn!(error = %e, "could not persist randomized form values");
        }

        let form = &self.form;
        self.rewriter.resolve(&self.template, &self.controls, &values, |control| {
            form.is_bypassed(&control.name)
        })
    }

    /// Resolves and submits, wiring the new job into the tracker.
    pub async fn submit(
        &mut self,
        client: &BackendClient,
        store: &mut ClientStore,
        tracker: &mut JobTracker,
    ) -> Result<Job, BackendError> {
        let resolved = self.resolve(store, &mut rand::rng())?;
        let correlation_id = client.submit(&resolved, &self.session_id).await?;
        let job = Job {
            correlation_id,
            session_id: self.session_id.clone(),
        };
        tracker.begin(job.clone(), &self.template);
        Ok(job)
    }
}

/// Feeds a status event into the tracker and persists any newly stored
/// artifact URL so it survives client restarts.
pub fn record_status_event(
    tracker: &mut JobTracker,
    store: &mut ClientStore,
    event: StatusEvent,
) {
    let before = tracker.artifact_url().map(str::to_string);
    tracker.apply(event);
    if let Some(url) = tracker.artifact_url()
        && before.as_deref() != Some(url)
    {
        let url = url.to_string();
        if let Err(e) = store.set_last_artifact_url(&url) {
            warn!(error = %e, "could not persist artifact url");
        }
    }
}
