use ahash::AHashMap;
use tracing::trace;

use super::{Job, StatusEvent};
use crate::graph::Graph;

/// The lifecycle of the tracked job.
///
/// `Completed` is reachable directly from `Queued`: the backend may report
/// an artifact before any intermediate progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Queued,
    Executing,
    Completed,
}

/// State machine consuming status events for the most recent submission.
///
/// The tracker holds the display labels of the *pre-rewrite* template so
/// `executing` events can be shown by node title or kind even though the
/// submitted graph no longer contains the client's parameter nodes. It
/// tracks one job at a time; events arriving with no active job are
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct JobTracker {
    state: JobState,
    job: Option<Job>,
    progress: Option<(u64, u64)>,
    current_step: Option<String>,
    artifact_url: Option<String>,
    step_labels: AHashMap<String, String>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a freshly submitted job. Labels are captured from
    /// the template as it was *before* rewriting.
    pub fn begin(&mut self, job: Job, template: &Graph) {
        self.step_labels = template
            .iter()
            .map(|(id, node)| {
                let label = node
                    .title()
                    .map(str::to_string)
                    .unwrap_or_else(|| node.kind.as_str().to_string());
                (id.to_string(), label)
            })
            .collect();
        self.job = Some(job);
        self.state = JobState::Queued;
        self.progress = None;
        self.current_step = None;
    }

    /// Feeds one status event into the machine.
    pub fn apply(&mut self, event: StatusEvent) {
        if self.job.is_none() {
            trace!(?event, "status event with no active job, dropped");
            return;
        }
        match event {
            StatusEvent::Progress { value, max } => {
                // Latest pair wins; out-of-order delivery is tolerated.
                self.progress = Some((value, max));
            }
            StatusEvent::Executing { node: Some(id) } => {
                self.state = JobState::Executing;
                self.current_step =
                    Some(self.step_labels.get(&id).cloned().unwrap_or(id));
            }
            // A null node is the backend's end-of-execution marker. It can
            // trail the artifact-ready event, so it must never reopen a
            // completed job.
            StatusEvent::Executing { node: None } => {
                self.finish();
            }
            StatusEvent::ImageReady { url } | StatusEvent::VideoReady { url } => {
                self.artifact_url = Some(url);
                self.finish();
            }
            StatusEvent::Done => {
                // Completion without an artifact keeps the previous one.
                self.finish();
            }
        }
    }

    fn finish(&mut self) {
        self.state = JobState::Completed;
        self.progress = None;
        self.current_step = None;
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    /// Whether a submission is still in flight. The presentation layer uses
    /// this to disable further submissions.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, JobState::Queued | JobState::Executing)
    }

    pub fn progress(&self) -> Option<(u64, u64)> {
        self.progress
    }

    pub fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

    /// The retrieval URL of the most recent artifact, if any.
    pub fn artifact_url(&self) -> Option<&str> {
        self.artifact_url.as_deref()
    }

    /// Restores a previously stored artifact URL (surviving reloads).
    pub fn restore_artifact_url(&mut self, url: impl Into<String>) {
        self.artifact_url = Some(url.into());
    }
}
