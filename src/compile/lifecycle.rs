//! Container lifecycle manager.
//!
//! Drives one compile run end to end:
//!
//! ```text
//! Created -> Populating -> Submitted -> Polling -> {Completed | Failed | Error | Aborted | Invalidated} -> Deleted
//! ```
//!
//! The container is deleted best-effort once it exists, whatever happens
//! after creation. Deletion errors are logged and dropped so they never
//! replace the compile result.

use super::batch::{DEFAULT_CONCURRENCY, run_batched};
use super::diagnostics::{NO_DETAILS_NOTICE, format_compiler_errors};
use super::inventory::Inventory;
use super::types::{
    AsyncCompileRequest, ContainerMember, MetadataContainer, RequestState, RequestStatus,
};
use crate::errors::{CompileError, RemoteError};
use crate::remote::{Method, ToolingApi};
use crate::ui::CompileUI;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Default wait between two reads of the async request.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Tunables for a compile run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileSettings {
    /// Maximum member staging calls in flight at once
    pub concurrency: usize,
    /// Wait between async request reads
    pub poll_interval: Duration,
}

impl Default for CompileSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl CompileSettings {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Populating,
    Submitted,
    Polling,
    Resolved(RequestState),
    Deleted,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Created => write!(f, "created"),
            LifecycleState::Populating => write!(f, "populating"),
            LifecycleState::Submitted => write!(f, "submitted"),
            LifecycleState::Polling => write!(f, "polling"),
            LifecycleState::Resolved(state) => write!(f, "resolved ({})", state),
            LifecycleState::Deleted => write!(f, "deleted"),
        }
    }
}

/// Details gathered for an unsuccessful compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureReport {
    /// Rendered compiler diagnostics, one per line
    pub diagnostics: Option<String>,
    /// Generic error reported by the remote
    pub error_message: Option<String>,
}

impl FailureReport {
    pub fn has_details(&self) -> bool {
        self.diagnostics.is_some() || self.error_message.is_some()
    }

    /// Human-readable sections, in print order.
    pub fn sections(&self) -> Vec<String> {
        let mut sections = Vec::new();
        if let Some(diagnostics) = &self.diagnostics {
            sections.push(format!("Compilation Errors found:\n{}", diagnostics));
        }
        if let Some(message) = &self.error_message {
            sections.push(format!("Error: {}", message));
        }
        if !self.has_details() {
            sections.push(NO_DETAILS_NOTICE.to_string());
        }
        sections
    }
}

/// Terminal result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The inventory was empty; no container was created.
    NothingToCompile,
    Completed {
        classes: usize,
        triggers: usize,
        polls: u32,
    },
    Unsuccessful {
        state: RequestState,
        report: FailureReport,
        polls: u32,
    },
}

impl CompileOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, CompileOutcome::Unsuccessful { .. })
    }
}

/// Runs the container → members → async request → poll → cleanup protocol.
pub struct ContainerLifecycle {
    api: Arc<dyn ToolingApi>,
    settings: CompileSettings,
    ui: Option<Arc<CompileUI>>,
}

impl ContainerLifecycle {
    pub fn new(api: Arc<dyn ToolingApi>, settings: CompileSettings) -> Self {
        Self {
            api,
            settings,
            ui: None,
        }
    }

    pub fn with_ui(mut self, ui: Option<Arc<CompileUI>>) -> Self {
        self.ui = ui;
        self
    }

    pub fn settings(&self) -> &CompileSettings {
        &self.settings
    }

    fn enter(&self, state: LifecycleState) {
        tracing::info!(state = %state, "compile lifecycle transition");
    }

    /// Compile every unit in `inventory` as one check-only request.
    ///
    /// An empty inventory returns [`CompileOutcome::NothingToCompile`] without
    /// touching the org. Otherwise a container is created, and it is deleted
    /// before returning whether the run completed, failed remotely or hit an
    /// error.
    ///
    /// # Errors
    /// Returns a [`CompileError`] naming the phase whose remote call failed.
    /// An unsuccessful compile is an `Ok` outcome, not an error.
    pub async fn run(&self, inventory: &Inventory) -> Result<CompileOutcome, CompileError> {
        if inventory.is_empty() {
            tracing::info!("inventory is empty, nothing to compile");
            return Ok(CompileOutcome::NothingToCompile);
        }

        let container = self.create_container().await?;
        let result = self.compile_in(&container, inventory).await;
        if result.is_err()
            && let Some(ui) = &self.ui
        {
            ui.clear();
        }

        self.delete_container(&container).await;
        result
    }

    async fn create_container(&self) -> Result<MetadataContainer, CompileError> {
        let name = MetadataContainer::run_name(Utc::now());
        let response = self
            .api
            .request(
                MetadataContainer::RESOURCE,
                Method::Post,
                Some(&MetadataContainer::creation_body(&name)),
            )
            .await
            .map_err(CompileError::ContainerCreate)?;

        let id = response_id(&response).ok_or_else(|| CompileError::MissingId {
            resource: "MetadataContainer".to_string(),
        })?;
        self.enter(LifecycleState::Created);
        if let Some(ui) = &self.ui {
            ui.container_created(&name);
        }
        Ok(MetadataContainer { id, name })
    }

    async fn compile_in(
        &self,
        container: &MetadataContainer,
        inventory: &Inventory,
    ) -> Result<CompileOutcome, CompileError> {
        self.populate(container, inventory).await?;
        let request = self.submit(container).await?;
        let (status, polls) = self.poll(&request).await?;
        self.enter(LifecycleState::Resolved(status.state.clone()));
        if let Some(ui) = &self.ui {
            ui.compile_finished(&status.state);
        }

        if status.state.is_success() {
            return Ok(CompileOutcome::Completed {
                classes: inventory.classes.len(),
                triggers: inventory.triggers.len(),
                polls,
            });
        }

        let report = self.failure_report(&request, &status).await;
        Ok(CompileOutcome::Unsuccessful {
            state: status.state,
            report,
            polls,
        })
    }

    /// Stage one member per unit. Any failure aborts before submission.
    async fn populate(
        &self,
        container: &MetadataContainer,
        inventory: &Inventory,
    ) -> Result<(), CompileError> {
        self.enter(LifecycleState::Populating);
        let members: Vec<ContainerMember> = inventory
            .units()
            .map(|unit| ContainerMember::for_unit(&container.id, unit))
            .collect();
        let total = members.len();
        let staged = AtomicUsize::new(0);

        let result = run_batched(&members, self.settings.concurrency, |member| {
            let staged = &staged;
            async move {
                self.api
                    .request(&member.resource_path(), Method::Post, Some(&member.payload()))
                    .await
                    .map_err(|source| CompileError::Staging {
                        unit: member.unit_name.clone(),
                        source,
                    })?;
                let done = staged.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!(
                    unit = %member.unit_name,
                    kind = %member.kind,
                    done,
                    total,
                    "member staged"
                );
                if let Some(ui) = &self.ui {
                    ui.member_staged(done, total);
                }
                Ok::<_, CompileError>(())
            }
        })
        .await;

        match result {
            Ok(_) => {
                if let Some(ui) = &self.ui {
                    ui.staging_complete(total);
                }
                Ok(())
            }
            Err(err) => {
                if let (Some(ui), CompileError::Staging { unit, .. }) = (&self.ui, &err) {
                    ui.staging_failed(unit);
                }
                Err(err)
            }
        }
    }

    async fn submit(
        &self,
        container: &MetadataContainer,
    ) -> Result<AsyncCompileRequest, CompileError> {
        let response = self
            .api
            .request(
                AsyncCompileRequest::RESOURCE,
                Method::Post,
                Some(&AsyncCompileRequest::submission_body(&container.id)),
            )
            .await
            .map_err(CompileError::Submit)?;

        let id = response_id(&response).ok_or_else(|| CompileError::MissingId {
            resource: "ContainerAsyncRequest".to_string(),
        })?;
        self.enter(LifecycleState::Submitted);
        if let Some(ui) = &self.ui {
            ui.compile_submitted(&id);
        }
        Ok(AsyncCompileRequest {
            id,
            container_id: container.id.clone(),
            is_check_only: true,
        })
    }

    /// Read the request until it reaches a terminal state.
    ///
    /// Reads are strictly sequential with `poll_interval` between them.
    /// Unknown states keep the loop going.
    async fn poll(
        &self,
        request: &AsyncCompileRequest,
    ) -> Result<(RequestStatus, u32), CompileError> {
        self.enter(LifecycleState::Polling);
        let mut polls = 0u32;
        loop {
            let status = self.read_status(request).await?;
            polls += 1;
            tracing::debug!(
                request = %request.id,
                state = %status.state,
                polls,
                "polled compile request"
            );

            if status.state.is_terminal() {
                return Ok((status, polls));
            }
            if let Some(ui) = &self.ui {
                ui.poll_state(&status.state);
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn read_status(
        &self,
        request: &AsyncCompileRequest,
    ) -> Result<RequestStatus, CompileError> {
        let poll_error = |source: RemoteError| CompileError::Poll {
            id: request.id.clone(),
            source,
        };
        let value = self
            .api
            .request(&request.resource_path(), Method::Get, None)
            .await
            .map_err(poll_error)?;
        serde_json::from_value(value).map_err(|e| poll_error(RemoteError::InvalidResponse(e)))
    }

    /// Collect diagnostics from the terminal read, falling back to a query
    /// by id when the read left them out.
    async fn failure_report(
        &self,
        request: &AsyncCompileRequest,
        status: &RequestStatus,
    ) -> FailureReport {
        let mut diagnostics = status
            .compiler_errors
            .as_ref()
            .and_then(format_compiler_errors);

        if diagnostics.is_none() {
            diagnostics = self.requery_diagnostics(request).await;
        }

        FailureReport {
            diagnostics,
            error_message: status.error_message.clone().filter(|m| !m.trim().is_empty()),
        }
    }

    async fn requery_diagnostics(&self, request: &AsyncCompileRequest) -> Option<String> {
        match self.api.query(&request.diagnostics_query()).await {
            Ok(records) => records
                .first()
                .and_then(|record| record.get("CompilerErrors"))
                .and_then(format_compiler_errors),
            Err(e) => {
                tracing::debug!(request = %request.id, error = %e, "diagnostics re-query failed");
                None
            }
        }
    }

    async fn delete_container(&self, container: &MetadataContainer) {
        match self
            .api
            .request(&container.resource_path(), Method::Delete, None)
            .await
        {
            Ok(_) => self.enter(LifecycleState::Deleted),
            Err(e) => {
                tracing::debug!(
                    container = %container.id,
                    error = %e,
                    "container cleanup failed, ignoring"
                )
            }
        }
    }
}

fn response_id(response: &Value) -> Option<String> {
    response
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
