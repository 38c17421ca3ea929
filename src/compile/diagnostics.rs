//! Compiler diagnostic extraction and rendering.
//!
//! The remote reports compiler errors either as a JSON array or as a string
//! holding that array serialized. Both forms render identically. Rendering
//! never fails: unparseable input is returned as-is.

use serde_json::Value;

/// Notice printed when neither diagnostics nor a generic error are available.
pub const NO_DETAILS_NOTICE: &str =
    "No error details available. Check Setup → Apex Classes in the org.";

/// A single compiler error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerDiagnostic {
    pub unit_name: String,
    pub line: Option<u64>,
    pub column: Option<u64>,
    pub message: String,
}

impl CompilerDiagnostic {
    /// Build from one remote record, filling gaps with placeholders.
    pub fn from_value(record: &Value) -> Self {
        let unit_name = text_field(record, &["name", "extent"]).unwrap_or("Unknown");
        let message = text_field(record, &["problem", "message"]).unwrap_or("Unknown error");
        Self {
            unit_name: unit_name.to_string(),
            line: position_field(record, "line"),
            column: position_field(record, "column"),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for CompilerDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.unit_name)?;
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, ": line {}, column {}", line, column)?,
            (Some(line), None) => write!(f, ": line {}", line)?,
            _ => {}
        }
        write!(f, ": {}", self.message)
    }
}

/// Diagnostics recovered from a raw `CompilerErrors` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostics {
    Structured(Vec<CompilerDiagnostic>),
    /// The payload could not be parsed; kept verbatim.
    Raw(String),
}

impl Diagnostics {
    /// Parse a raw value. Returns `None` when there is nothing to report.
    pub fn parse(raw: &Value) -> Option<Self> {
        match raw {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(parsed) => Self::from_array(&parsed),
                Err(_) => Some(Diagnostics::Raw(text.clone())),
            },
            other => Self::from_array(other),
        }
    }

    fn from_array(value: &Value) -> Option<Self> {
        let records = value.as_array()?;
        if records.is_empty() {
            return None;
        }
        Some(Diagnostics::Structured(
            records.iter().map(CompilerDiagnostic::from_value).collect(),
        ))
    }

    /// One line per diagnostic, in input order.
    pub fn render(&self) -> String {
        match self {
            Diagnostics::Structured(items) => items
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            Diagnostics::Raw(text) => text.clone(),
        }
    }
}

/// Render a raw `CompilerErrors` value, or `None` if it holds nothing.
pub fn format_compiler_errors(raw: &Value) -> Option<String> {
    Diagnostics::parse(raw).map(|d| d.render())
}

/// First non-empty string among `keys`.
fn text_field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| record.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// A positive source position, given as a number or numeric string.
fn position_field(record: &Value, key: &str) -> Option<u64> {
    let value = record.get(key)?;
    let position = value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))?;
    (position > 0).then_some(position)
}
