//! Job lifecycle: the status event model, the tracker state machine, and
//! the supervised streaming channel task that feeds it.

mod channel;
mod tracker;

pub use channel::{RECONNECT_DELAY, spawn_status_channel};
pub use tracker::{JobState, JobTracker};

use serde_json::Value as JsonValue;

/// One submission's asynchronous execution, identified by the
/// backend-assigned correlation id and the client-chosen session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub correlation_id: String,
    pub session_id: String,
}

/// A parsed inbound message from the streaming status channel.
///
/// The wire format is a JSON envelope `{ "type": ..., "data": ... }`; any
/// envelope type not listed here is silently ignored by the channel task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// Progress indicator update. Pairs may arrive out of order; the latest
    /// received pair wins.
    Progress { value: u64, max: u64 },
    /// The backend started executing a node; `None` is the backend's own
    /// end-of-execution marker.
    Executing { node: Option<String> },
    /// An image artifact is ready at the given retrieval URL.
    ImageReady { url: String },
    /// A video artifact is ready at the given retrieval URL.
    VideoReady { url: String },
    /// The job finished without producing a new artifact.
    Done,
}

impl StatusEvent {
    /// Parses one channel message. Returns `None` for unknown envelope
    /// types and for envelopes missing their required payload fields.
    pub fn parse(text: &str) -> Option<Self> {
        let envelope: JsonValue = serde_json::from_str(text).ok()?;
        let data = envelope.get("data");
        match envelope.get("type")?.as_str()? {
            "progress" => Some(StatusEvent::Progress {
                value: data?.get("value")?.as_u64()?,
                max: data?.get("max")?.as_u64()?,
            }),
            "executing" => Some(StatusEvent::Executing {
                node: data
                    .and_then(|d| d.get("node"))
                    .and_then(JsonValue::as_str)
                    .map(str::to_string),
            }),
            "tenkai_image_ready" => Some(StatusEvent::ImageReady {
                url: data?.get("image_url")?.as_str()?.to_string(),
            }),
            "tenkai_video_ready" => Some(StatusEvent::VideoReady {
                url: data?.get("video_url")?.as_str()?.to_string(),
            }),
            "tenkai_prompt_done" => Some(StatusEvent::Done),
            _ => None,
        }
    }
}
