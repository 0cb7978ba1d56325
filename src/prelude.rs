//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types from the tenkai crate so callers
//! can bring the whole resolve-and-submit surface in with one `use`.

// Graph model
pub use crate::graph::{EdgeRef, FieldValue, Graph, Node, NodeKind};

// Schema extraction
pub use crate::schema::{
    ControlDescriptor, ControlKind, ControlLayout, ParamType, extract_controls, layout_controls,
};

// Form state and value resolution
pub use crate::form::FormState;
pub use crate::resolver::{ResolvedValues, coerce, resolve_values};

// Graph rewriting
pub use crate::rewrite::{BypassRule, BypassTable, Rewriter};

// Backend boundary
pub use crate::client::{BackendClient, BackendConfig, GalleryEntry};

// Job lifecycle
pub use crate::job::{Job, JobState, JobTracker, StatusEvent, spawn_status_channel};

// Durable storage and session orchestration
pub use crate::session::{Session, record_status_event};
pub use crate::storage::ClientStore;

// Error types
pub use crate::error::{BackendError, ResolveError, StorageError, TemplateError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
