//! Error types for the OpenAPI spec generator

use thiserror::Error;

use crate::scheme::GroupVersionKind;

/// Result type for the generator
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the generator
#[derive(Debug, Error)]
pub enum Error {
    /// Kind was never added to the scheme
    #[error("no kind {0} is registered in the scheme")]
    NotRegistered(GroupVersionKind),

    /// Kind was already added with a different type
    #[error("kind {gvk} is already registered as {existing}")]
    AlreadyRegistered {
        gvk: GroupVersionKind,
        existing: String,
    },

    /// Invalid server configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server setup error (route installation)
    #[error("Server error: {0}")]
    Server(String),

    /// Route references a definition that was never reflected
    #[error("route {path} references missing definition {name}")]
    MissingDefinition { path: String, name: String },

    /// Two routes with the same method were installed on one path
    #[error("duplicate {method} route for {path}")]
    DuplicateRoute { method: String, path: String },

    /// Wrapped failure of a generation step
    #[error("{context}")]
    Step {
        context: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap this error with the name of the step that failed
    pub fn context(self, context: &'static str) -> Self {
        Error::Step {
            context,
            source: Box::new(self),
        }
    }
}
