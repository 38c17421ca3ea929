//! Blocking wrapper around [`SfCliClient`] for synchronous callers.
//!
//! Must not be used from inside an async runtime.

use super::{Method, SfCliClient, ToolingApi};
use crate::errors::RemoteError;
use serde_json::Value;

pub struct ToolingClient {
    inner: SfCliClient,
    runtime: tokio::runtime::Runtime,
}

impl ToolingClient {
    pub fn new(inner: SfCliClient) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { inner, runtime })
    }

    pub fn query(&self, statement: &str) -> Result<Vec<Value>, RemoteError> {
        self.runtime.block_on(self.inner.query(statement))
    }

    pub fn request(
        &self,
        resource: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, RemoteError> {
        self.runtime
            .block_on(self.inner.request(resource, method, body))
    }
}
