//! Remote access to the org's tooling API.
//!
//! Everything the compile engine needs from the org goes through the
//! [`ToolingApi`] trait: one structured query call and one generic resource
//! request. The production implementation, [`SfCliClient`], shells out to the
//! platform CLI; [`blocking::ToolingClient`] wraps it for synchronous callers.

pub mod blocking;
mod body;
mod client;

pub use client::{DEFAULT_API_VERSION, DEFAULT_SF_CMD, SfCliClient};

use crate::errors::RemoteError;
use async_trait::async_trait;
use serde_json::Value;

/// HTTP verb for a tooling resource request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstraction over the org's tooling API for testability.
/// Real implementation: `SfCliClient`. Test double: `ScriptedApi`.
#[async_trait]
pub trait ToolingApi: Send + Sync {
    /// Run a read-only tooling query and return its records.
    async fn query(&self, statement: &str) -> Result<Vec<Value>, RemoteError>;

    /// Create, read or delete a tooling resource.
    ///
    /// `resource` is relative to the versioned tooling namespace,
    /// e.g. `/sobjects/MetadataContainer`. Error-shaped payloads come back as
    /// [`RemoteError::Api`].
    async fn request(
        &self,
        resource: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, RemoteError>;
}
