//! Project namespace resolution.
//!
//! Scopes the inventory to units owned by the project's namespace (plus
//! unnamespaced ones), leaving out managed-package code installed in the
//! same org.

use serde::Deserialize;
use std::path::Path;

/// Project manifest holding the namespace.
pub const PROJECT_MANIFEST: &str = "sfdx-project.json";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace(Option<String>);

#[derive(Debug, Deserialize)]
struct ProjectManifest {
    #[serde(default)]
    namespace: Option<String>,
}

impl Namespace {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn named(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(prefix))
        }
    }

    /// Read the namespace from the manifest in `project_dir`.
    ///
    /// A missing or malformed manifest means no namespace.
    pub fn resolve(project_dir: &Path) -> Self {
        let path = project_dir.join(PROJECT_MANIFEST);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_manifest(&content),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no project manifest");
                Self::none()
            }
        }
    }

    pub fn from_manifest(content: &str) -> Self {
        match serde_json::from_str::<ProjectManifest>(content) {
            Ok(manifest) => manifest.namespace.map(Self::named).unwrap_or_default(),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unparseable project manifest");
                Self::none()
            }
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// `WHERE` clause selecting units in this namespace or in none.
    pub fn predicate(&self) -> String {
        match &self.0 {
            Some(prefix) => format!(
                "WHERE (NamespacePrefix = '{}' OR NamespacePrefix = null)",
                prefix.replace('\'', "\\'")
            ),
            None => "WHERE NamespacePrefix = null".to_string(),
        }
    }
}
