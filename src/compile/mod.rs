//! Check-only compile orchestration.
//!
//! | Module        | Responsibility                                         |
//! |---------------|--------------------------------------------------------|
//! | `namespace`   | Project namespace and inventory predicate              |
//! | `inventory`   | Fetch classes and triggers in scope                    |
//! | `batch`       | Bounded batch scheduler for member staging             |
//! | `lifecycle`   | Container → members → request → poll → cleanup         |
//! | `diagnostics` | Render compiler errors                                 |
//! | `types`       | Units, containers, members, request state              |

pub mod batch;
pub mod diagnostics;
pub mod inventory;
pub mod lifecycle;
pub mod namespace;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{DEFAULT_CONCURRENCY, run_batched};
pub use diagnostics::{CompilerDiagnostic, Diagnostics, NO_DETAILS_NOTICE, format_compiler_errors};
pub use inventory::{Inventory, inventory_query};
pub use lifecycle::{
    CompileOutcome, CompileSettings, ContainerLifecycle, DEFAULT_POLL_INTERVAL, FailureReport,
    LifecycleState,
};
pub use namespace::{Namespace, PROJECT_MANIFEST};
pub use types::{
    AsyncCompileRequest, CompilationUnit, ContainerMember, MetadataContainer, RequestState,
    RequestStatus, UnitKind, UnitRecord,
};
