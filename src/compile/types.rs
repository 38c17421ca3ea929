//! Domain types for a compile run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Kind of program unit being recompiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Class,
    Trigger,
}

impl UnitKind {
    /// Tooling sObject holding units of this kind.
    pub fn sobject(&self) -> &'static str {
        match self {
            UnitKind::Class => "ApexClass",
            UnitKind::Trigger => "ApexTrigger",
        }
    }

    /// Tooling sObject used to stage a unit of this kind into a container.
    pub fn member_sobject(&self) -> &'static str {
        match self {
            UnitKind::Class => "ApexClassMember",
            UnitKind::Trigger => "ApexTriggerMember",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::Class => write!(f, "class"),
            UnitKind::Trigger => write!(f, "trigger"),
        }
    }
}

/// Row returned by the inventory queries.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UnitRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub body: String,
}

/// A class or trigger snapshot taken at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub id: String,
    pub name: String,
    /// Sent back unchanged to force recompilation.
    pub body: String,
    pub kind: UnitKind,
}

impl CompilationUnit {
    pub fn new(
        kind: UnitKind,
        id: impl Into<String>,
        name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            body: body.into(),
            kind,
        }
    }

    pub fn from_record(kind: UnitKind, record: UnitRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            body: record.body,
            kind,
        }
    }
}

/// Transient server-side staging area for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataContainer {
    pub id: String,
    pub name: String,
}

impl MetadataContainer {
    pub const RESOURCE: &'static str = "/sobjects/MetadataContainer";

    /// Run-unique container name derived from the creation time.
    pub fn run_name(created_at: DateTime<Utc>) -> String {
        format!("Compile_{}", created_at.timestamp_millis())
    }

    pub fn creation_body(name: &str) -> Value {
        json!({ "Name": name })
    }

    pub fn resource_path(&self) -> String {
        format!("{}/{}", Self::RESOURCE, self.id)
    }
}

/// One unit's body staged into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMember {
    pub container_id: String,
    pub unit_id: String,
    pub unit_name: String,
    pub kind: UnitKind,
    pub body: String,
}

impl ContainerMember {
    pub fn for_unit(container_id: &str, unit: &CompilationUnit) -> Self {
        Self {
            container_id: container_id.to_string(),
            unit_id: unit.id.clone(),
            unit_name: unit.name.clone(),
            kind: unit.kind,
            body: unit.body.clone(),
        }
    }

    pub fn resource_path(&self) -> String {
        format!("/sobjects/{}", self.kind.member_sobject())
    }

    pub fn payload(&self) -> Value {
        json!({
            "MetadataContainerId": self.container_id,
            "ContentEntityId": self.unit_id,
            "Body": self.body,
        })
    }
}

/// The single check-only compile job submitted for a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncCompileRequest {
    pub id: String,
    pub container_id: String,
    pub is_check_only: bool,
}

impl AsyncCompileRequest {
    pub const RESOURCE: &'static str = "/sobjects/ContainerAsyncRequest";

    /// Creation payload. Always check-only: nothing is deployed.
    pub fn submission_body(container_id: &str) -> Value {
        json!({
            "MetadataContainerId": container_id,
            "IsCheckOnly": true,
        })
    }

    pub fn resource_path(&self) -> String {
        format!("{}/{}", Self::RESOURCE, self.id)
    }

    /// Fallback query for the diagnostics field, which the REST read
    /// sometimes omits.
    pub fn diagnostics_query(&self) -> String {
        format!(
            "SELECT CompilerErrors FROM ContainerAsyncRequest WHERE Id = '{}'",
            self.id.replace('\'', "\\'")
        )
    }
}

/// Remote state of an async compile request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    Queued,
    Completed,
    Failed,
    Error,
    Aborted,
    Invalidated,
    /// Any value this build does not know about; treated as still running.
    Other(String),
    /// The read carried no state at all.
    #[default]
    Missing,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Completed
                | RequestState::Failed
                | RequestState::Error
                | RequestState::Aborted
                | RequestState::Invalidated
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestState::Completed)
    }
}

impl From<&str> for RequestState {
    fn from(value: &str) -> Self {
        match value {
            "Queued" => RequestState::Queued,
            "Completed" => RequestState::Completed,
            "Failed" => RequestState::Failed,
            "Error" => RequestState::Error,
            "Aborted" => RequestState::Aborted,
            "Invalidated" => RequestState::Invalidated,
            "" => RequestState::Missing,
            other => RequestState::Other(other.to_string()),
        }
    }
}

impl From<String> for RequestState {
    fn from(value: String) -> Self {
        RequestState::from(value.as_str())
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestState::Queued => write!(f, "Queued"),
            RequestState::Completed => write!(f, "Completed"),
            RequestState::Failed => write!(f, "Failed"),
            RequestState::Error => write!(f, "Error"),
            RequestState::Aborted => write!(f, "Aborted"),
            RequestState::Invalidated => write!(f, "Invalidated"),
            RequestState::Other(state) => write!(f, "{}", state),
            RequestState::Missing => write!(f, "Unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for RequestState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.map(RequestState::from).unwrap_or_default())
    }
}

/// One read of an async compile request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestStatus {
    #[serde(rename = "State", default)]
    pub state: RequestState,
    /// Structured array or its serialized string form.
    #[serde(rename = "CompilerErrors", default)]
    pub compiler_errors: Option<Value>,
    #[serde(rename = "ErrorMsg", default)]
    pub error_message: Option<String>,
}
