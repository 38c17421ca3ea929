//! Scripted `ToolingApi` double shared by the compile tests.

use crate::errors::RemoteError;
use crate::remote::{Method, ToolingApi};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One recorded call against the double.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query(String),
    Request {
        resource: String,
        method: Method,
        body: Option<Value>,
    },
}

/// Answers queries by sObject name and requests by resource, recording
/// every call in order.
#[derive(Default)]
pub struct ScriptedApi {
    calls: Mutex<Vec<Call>>,
    query_records: HashMap<String, Vec<Value>>,
    query_failures: HashMap<String, String>,
    status_reads: Mutex<VecDeque<Value>>,
    failing_units: HashMap<String, (String, String)>,
    fail_container_delete: bool,
    fail_container_create: bool,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records returned for queries mentioning `sobject`.
    pub fn with_records(mut self, sobject: &str, records: Vec<Value>) -> Self {
        self.query_records.insert(sobject.to_string(), records);
        self
    }

    /// Fail queries mentioning `sobject`.
    pub fn with_query_failure(mut self, sobject: &str, message: &str) -> Self {
        self.query_failures
            .insert(sobject.to_string(), message.to_string());
        self
    }

    /// Successive reads of the async request, in order.
    pub fn with_status_reads(self, reads: Vec<Value>) -> Self {
        *self.status_reads.lock().unwrap() = reads.into();
        self
    }

    /// Reject staging of the unit with `unit_id`.
    pub fn with_failing_unit(mut self, unit_id: &str, code: &str, message: &str) -> Self {
        self.failing_units
            .insert(unit_id.to_string(), (code.to_string(), message.to_string()));
        self
    }

    pub fn with_failing_container_delete(mut self) -> Self {
        self.fail_container_delete = true;
        self
    }

    pub fn with_failing_container_create(mut self) -> Self {
        self.fail_container_create = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requests_to(&self, resource_prefix: &str, method: Method) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(call, Call::Request { resource, method: m, .. }
                    if resource.starts_with(resource_prefix) && *m == method)
            })
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Unit record as returned by the inventory queries.
pub fn unit_record(id: &str, name: &str) -> Value {
    json!({"Id": id, "Name": name, "Body": format!("// {}", name)})
}

#[async_trait]
impl ToolingApi for ScriptedApi {
    async fn query(&self, statement: &str) -> Result<Vec<Value>, RemoteError> {
        self.record(Call::Query(statement.to_string()));
        tokio::task::yield_now().await;

        for (sobject, message) in &self.query_failures {
            if statement.contains(&format!("FROM {} ", sobject)) {
                return Err(RemoteError::Query {
                    message: message.clone(),
                });
            }
        }
        for (sobject, records) in &self.query_records {
            if statement.contains(&format!("FROM {} ", sobject)) {
                return Ok(records.clone());
            }
        }
        Ok(Vec::new())
    }

    async fn request(
        &self,
        resource: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, RemoteError> {
        self.record(Call::Request {
            resource: resource.to_string(),
            method,
            body: body.cloned(),
        });
        tokio::task::yield_now().await;

        match (resource, method) {
            ("/sobjects/MetadataContainer", Method::Post) => {
                if self.fail_container_create {
                    return Err(RemoteError::Api {
                        code: "DUPLICATE_VALUE".to_string(),
                        message: "duplicate container name".to_string(),
                    });
                }
                Ok(json!({"id": "1dc000000000001", "success": true}))
            }
            ("/sobjects/ApexClassMember" | "/sobjects/ApexTriggerMember", Method::Post) => {
                let unit_id = body
                    .and_then(|b| b.get("ContentEntityId"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if let Some((code, message)) = self.failing_units.get(unit_id) {
                    return Err(RemoteError::Api {
                        code: code.clone(),
                        message: message.clone(),
                    });
                }
                Ok(json!({"id": format!("400{}", unit_id), "success": true}))
            }
            ("/sobjects/ContainerAsyncRequest", Method::Post) => {
                Ok(json!({"id": "1dr000000000001", "success": true}))
            }
            (path, Method::Get) if path.starts_with("/sobjects/ContainerAsyncRequest/") => {
                let next = self.status_reads.lock().unwrap().pop_front();
                Ok(next.unwrap_or_else(|| json!({"State": "Queued"})))
            }
            (path, Method::Delete) if path.starts_with("/sobjects/MetadataContainer/") => {
                if self.fail_container_delete {
                    return Err(RemoteError::Api {
                        code: "ENTITY_IS_LOCKED".to_string(),
                        message: "container in use".to_string(),
                    });
                }
                Ok(json!({}))
            }
            _ => Err(RemoteError::Api {
                code: "NOT_FOUND".to_string(),
                message: format!("no scripted response for {} {}", method, resource),
            }),
        }
    }
}
