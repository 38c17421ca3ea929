//! Typed error hierarchy for orgcompile.
//!
//! Two enums cover the two layers:
//! - `RemoteError`: a single tooling API call failed
//! - `CompileError`: a compile phase failed, wrapping the remote cause
//!
//! An unsuccessful compile is not an error; see
//! [`crate::compile::CompileOutcome::Unsuccessful`].

use thiserror::Error;

/// Errors from the remote access client.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The query call itself reported a non-success status.
    #[error("Tooling query failed: {message}")]
    Query { message: String },

    /// A resource request returned an error-shaped payload.
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    /// The CLI failed without printing a parseable response.
    #[error("{message}")]
    Cli { message: String },

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stage request body at {path}: {source}")]
    BodyStaging {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid response from tooling API: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Errors from a compile run, tagged with the phase that failed.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Failed to fetch compilation inventory: {0}")]
    Inventory(#[source] RemoteError),

    #[error("Failed to create metadata container: {0}")]
    ContainerCreate(#[source] RemoteError),

    #[error("Failed to stage {unit} into container: {source}")]
    Staging {
        unit: String,
        #[source]
        source: RemoteError,
    },

    #[error("Failed to submit compile request: {0}")]
    Submit(#[source] RemoteError),

    #[error("Failed to poll compile request {id}: {source}")]
    Poll {
        id: String,
        #[source]
        source: RemoteError,
    },

    #[error("Remote returned no id for {resource}")]
    MissingId { resource: String },
}
