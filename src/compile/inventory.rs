//! Inventory of classes and triggers to recompile.

use super::namespace::Namespace;
use super::types::{CompilationUnit, UnitKind, UnitRecord};
use crate::errors::{CompileError, RemoteError};
use crate::remote::ToolingApi;

/// Units fetched once at the start of a run. Classes are staged before
/// triggers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub classes: Vec<CompilationUnit>,
    pub triggers: Vec<CompilationUnit>,
}

/// Query returning every unit of `kind` in scope, ordered by name.
pub fn inventory_query(kind: UnitKind, namespace: &Namespace) -> String {
    format!(
        "SELECT Id, Name, Body FROM {} {} ORDER BY Name",
        kind.sobject(),
        namespace.predicate()
    )
}

impl Inventory {
    pub fn new(classes: Vec<CompilationUnit>, triggers: Vec<CompilationUnit>) -> Self {
        Self { classes, triggers }
    }

    pub async fn fetch(api: &dyn ToolingApi, namespace: &Namespace) -> Result<Self, CompileError> {
        let classes = fetch_kind(api, UnitKind::Class, namespace).await?;
        let triggers = fetch_kind(api, UnitKind::Trigger, namespace).await?;
        tracing::info!(
            classes = classes.len(),
            triggers = triggers.len(),
            "fetched inventory"
        );
        Ok(Self { classes, triggers })
    }

    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.classes.iter().chain(self.triggers.iter())
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn fetch_kind(
    api: &dyn ToolingApi,
    kind: UnitKind,
    namespace: &Namespace,
) -> Result<Vec<CompilationUnit>, CompileError> {
    let records = api
        .query(&inventory_query(kind, namespace))
        .await
        .map_err(CompileError::Inventory)?;

    records
        .into_iter()
        .map(|record| {
            serde_json::from_value::<UnitRecord>(record)
                .map(|r| CompilationUnit::from_record(kind, r))
                .map_err(|e| CompileError::Inventory(RemoteError::InvalidResponse(e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_query_scopes_by_namespace() {
        assert_eq!(
            inventory_query(UnitKind::Class, &Namespace::none()),
            "SELECT Id, Name, Body FROM ApexClass WHERE NamespacePrefix = null ORDER BY Name"
        );
        assert_eq!(
            inventory_query(UnitKind::Trigger, &Namespace::named("acme")),
            "SELECT Id, Name, Body FROM ApexTrigger WHERE (NamespacePrefix = 'acme' OR NamespacePrefix = null) ORDER BY Name"
        );
    }

    #[test]
    fn test_units_lists_classes_before_triggers() {
        let inventory = Inventory::new(
            vec![CompilationUnit::new(UnitKind::Class, "01p1", "B", "")],
            vec![CompilationUnit::new(UnitKind::Trigger, "01q1", "A", "")],
        );
        let names: Vec<&str> = inventory.units().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(inventory.len(), 2);
        assert!(!inventory.is_empty());
        assert!(Inventory::default().is_empty());
    }
}
