use thiserror::Error;

/// Errors that can occur while loading or inspecting a template graph.
#[derive(Error, Debug, Clone)]
pub enum TemplateError {
    #[error("Failed to parse template JSON: {0}")]
    JsonParseError(String),

    #[error("Template is not a mapping of node ids to node shapes: {0}")]
    MalformedTemplate(String),

    #[error("Template contains no parameter-declaring nodes")]
    EmptyTemplate,
}

/// Errors that can occur while resolving a template into a submission-ready graph.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("Image input '{name}' has no uploaded or selected file")]
    MissingRequiredImage { name: String },

    #[error(
        "Node '{missing_node_id}' not found, but is referenced by a field on node '{consumer_node_id}'"
    )]
    DanglingReference {
        missing_node_id: String,
        consumer_node_id: String,
    },
}

/// Errors that can occur while talking to the execution backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend rejected the request with status {status}")]
    Status { status: u16 },

    #[error("Backend response was missing the '{field}' field")]
    MalformedResponse { field: &'static str },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Errors that can occur when reading or writing the durable client store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Could not access store file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file '{path}' holds invalid JSON: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
