//! Lifecycle reconciliation for BYOC projects
//!
//! Each operation issues at most one mutating request, then drives the
//! [`Poller`] with a describe probe that maps the reported status onto
//! "keep waiting", "done" or "halt".
//!
//! | operation | waiting on | done | halts on |
//! |-----------|------------|------|----------|
//! | create    | `pending`, `connected` | `running` | `init`, anything else |
//! | delete    | `deleting` | `deleted` | anything else |
//! | agent     | anything but `connected` | `connected` | never |
//!
//! A failed describe call halts every probe. Set
//! [`ReconcilerConfig::network_retries`] to retry describe calls that fail
//! with network errors before they count as failed. Those retries share the
//! poll deadline: running out of time or being cancelled while retrying
//! ends the poll as a timeout or cancellation, not as a halt.

use crate::config::ReconcilerConfig;
use crate::error::{CloudError, Result};
use crate::network::{is_network_give_up, retry_network};
use crate::poll::{Poller, RetriableError};
use crate::provider::{ByocApi, ProjectDescription};
use crate::state::{AgentState, ProjectHandle, ProjectSpec, ProjectState};
use crate::status::ProjectStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type ProbeResult<T> = std::result::Result<T, RetriableError<CloudError>>;

async fn describe(
    api: &dyn ByocApi,
    config: &ReconcilerConfig,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
    handle: &ProjectHandle,
) -> Result<ProjectDescription> {
    if config.network_retries == 0 {
        return api.describe_project(handle).await;
    }

    retry_network(
        cancel,
        &config.network_backoff,
        config.network_retries.saturating_add(1),
        deadline,
        || api.describe_project(handle),
    )
    .await
}

/// Deadline of a poll starting now, `None` when it cannot be represented
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Classify a failed describe inside a probe
///
/// Network retries cut short by the deadline or by cancellation stay
/// transient so the poller reports the timeout or cancellation itself.
fn describe_failed(
    err: CloudError,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> RetriableError<CloudError> {
    let out_of_time =
        cancel.is_cancelled() || deadline.is_some_and(|deadline| Instant::now() >= deadline);
    if out_of_time && is_network_give_up(&err) {
        RetriableError::retry(err)
    } else {
        RetriableError::halt(err)
    }
}

/// Drives a BYOC project through create and delete
pub struct ProjectReconciler {
    api: Arc<dyn ByocApi>,
    config: ReconcilerConfig,
}

impl ProjectReconciler {
    pub fn new(api: Arc<dyn ByocApi>, config: ReconcilerConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    async fn describe(
        &self,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
        handle: &ProjectHandle,
    ) -> Result<ProjectDescription> {
        describe(self.api.as_ref(), &self.config, cancel, deadline, handle).await
    }

    /// Create a project
    ///
    /// With `wait_for_ready` the call returns once the project is `running`;
    /// otherwise it returns after one describe with whatever status that
    /// reports.
    pub async fn create(
        &self,
        cancel: &CancellationToken,
        spec: ProjectSpec,
        wait_for_ready: bool,
    ) -> Result<ProjectState> {
        tracing::info!(project = %spec.project_name, "Creating BYOC project");

        let handle = self
            .api
            .create_project(&spec)
            .await
            .map_err(|e| CloudError::RequestFailed {
                operation: "create",
                target: spec.project_name.clone(),
                source: Box::new(e),
            })?;
        tracing::info!(
            project_id = handle.project_id(),
            data_plane_id = handle.data_plane_id(),
            "BYOC project created"
        );

        let mut state = ProjectState::new(handle, spec);

        if !wait_for_ready {
            let description = self
                .describe(cancel, None, &state.handle)
                .await
                .map_err(|e| CloudError::RequestFailed {
                    operation: "create",
                    target: state.project_id().to_string(),
                    source: Box::new(e),
                })?;
            state.set_status(description.status());
            return Ok(state);
        }

        let handle = &state.handle;
        let deadline = deadline_after(self.config.create_timeout);
        let status = Poller::new(self.config.create_timeout)
            .with_backoff(self.config.backoff)
            .poll(cancel, || self.probe_running(cancel, deadline, handle))
            .await
            .map_err(|e| CloudError::CreateFailed {
                project_id: handle.project_id().to_string(),
                source: Box::new(e),
            })?;

        tracing::info!(project_id = state.project_id(), "BYOC project is running");
        state.set_status(status);
        Ok(state)
    }

    async fn probe_running(
        &self,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
        handle: &ProjectHandle,
    ) -> ProbeResult<ProjectStatus> {
        let status = self
            .describe(cancel, deadline, handle)
            .await
            .map_err(|e| describe_failed(e, cancel, deadline))?
            .status();
        tracing::debug!(project_id = handle.project_id(), %status, "create probe");

        match status {
            ProjectStatus::Running => Ok(status),
            ProjectStatus::Connected => Err(RetriableError::retry(CloudError::AgentConnecting)),
            ProjectStatus::Pending => Err(RetriableError::retry(CloudError::NotReady(status))),
            ProjectStatus::Init => Err(RetriableError::halt(CloudError::InvalidState {
                project_id: handle.project_id().to_string(),
            })),
            other => Err(RetriableError::halt(CloudError::UnknownState(other))),
        }
    }

    /// Refresh a project from the control plane
    ///
    /// Returns `None` once the project reports `deleted`, so the caller can
    /// drop it from its state.
    pub async fn read(
        &self,
        cancel: &CancellationToken,
        prior: &ProjectState,
    ) -> Result<Option<ProjectState>> {
        let description = self.describe(cancel, None, &prior.handle).await?;
        let status = description.status();
        tracing::debug!(project_id = prior.project_id(), %status, "read project");

        if status == ProjectStatus::Deleted {
            return Ok(None);
        }

        let mut state = prior.clone();
        state.set_status(status);
        if let Some(name) = description.project_name {
            state.spec.project_name = name;
        }
        Ok(Some(state))
    }

    /// Apply a new desired configuration without calling the control plane
    ///
    /// Every field that matters to the control plane forces replacement, so
    /// an update only carries the observed server-assigned fields forward.
    pub fn update(&self, prior: &ProjectState, desired: ProjectSpec) -> ProjectState {
        tracing::debug!(project_id = prior.project_id(), "carrying project state forward");
        prior.carry_forward(desired)
    }

    /// Request deletion and wait until the project reports `deleted`
    pub async fn delete(&self, cancel: &CancellationToken, handle: &ProjectHandle) -> Result<()> {
        tracing::info!(project_id = handle.project_id(), "Deleting BYOC project");

        self.api
            .delete_project(handle)
            .await
            .map_err(|e| CloudError::RequestFailed {
                operation: "delete",
                target: handle.project_id().to_string(),
                source: Box::new(e),
            })?;

        let deadline = deadline_after(self.config.delete_timeout);
        Poller::new(self.config.delete_timeout)
            .with_backoff(self.config.backoff)
            .poll(cancel, || self.probe_deleted(cancel, deadline, handle))
            .await
            .map_err(|e| CloudError::DeleteFailed {
                project_id: handle.project_id().to_string(),
                source: Box::new(e),
            })?;

        tracing::info!(project_id = handle.project_id(), "BYOC project deleted");
        Ok(())
    }

    /// Delete a project whose teardown was started from the cloud console
    ///
    /// Peeks the status first and refuses unless the project already
    /// reports `deleted`. The status can still change between the peek and
    /// the delete request; the control plane rejects a delete that is no
    /// longer valid, so no locking is attempted here.
    pub async fn delete_confirmed(
        &self,
        cancel: &CancellationToken,
        handle: &ProjectHandle,
    ) -> Result<()> {
        let status = self
            .describe(cancel, None, handle)
            .await
            .map_err(|e| CloudError::RequestFailed {
                operation: "delete",
                target: handle.project_id().to_string(),
                source: Box::new(e),
            })?
            .status();

        if status != ProjectStatus::Deleted {
            tracing::warn!(
                project_id = handle.project_id(),
                %status,
                "refusing to delete a project that is not deleted in the console"
            );
            return Err(CloudError::ManualDeletionRequired {
                project_id: handle.project_id().to_string(),
                status,
            });
        }

        self.delete(cancel, handle).await
    }

    async fn probe_deleted(
        &self,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
        handle: &ProjectHandle,
    ) -> ProbeResult<()> {
        let status = self
            .describe(cancel, deadline, handle)
            .await
            .map_err(|e| describe_failed(e, cancel, deadline))?
            .status();
        tracing::debug!(project_id = handle.project_id(), %status, "delete probe");

        match status {
            ProjectStatus::Deleted => Ok(()),
            ProjectStatus::Deleting => Err(RetriableError::retry(CloudError::NotReady(status))),
            other => Err(RetriableError::halt(CloudError::UnknownState(other))),
        }
    }
}

/// Waits for the data-plane agent of a project to connect
pub struct AgentReconciler {
    api: Arc<dyn ByocApi>,
    config: ReconcilerConfig,
}

impl AgentReconciler {
    pub fn new(api: Arc<dyn ByocApi>, config: ReconcilerConfig) -> Self {
        Self { api, config }
    }

    /// Observe the agent of `handle`
    ///
    /// With `wait_for_connection` the call returns once the project reports
    /// `connected`, treating every other status as not yet connected;
    /// otherwise it returns after one describe.
    pub async fn create(
        &self,
        cancel: &CancellationToken,
        handle: ProjectHandle,
        wait_for_connection: bool,
    ) -> Result<AgentState> {
        if !wait_for_connection {
            let status = describe(self.api.as_ref(), &self.config, cancel, None, &handle)
                .await
                .map_err(|e| CloudError::RequestFailed {
                    operation: "observe the agent of",
                    target: handle.project_id().to_string(),
                    source: Box::new(e),
                })?
                .status();
            return Ok(AgentState::new(handle, status));
        }

        tracing::info!(project_id = handle.project_id(), "Waiting for agent to connect");

        let deadline = deadline_after(self.config.agent_timeout);
        let status = Poller::new(self.config.agent_timeout)
            .with_backoff(self.config.backoff)
            .poll(cancel, || self.probe_connected(cancel, deadline, &handle))
            .await
            .map_err(|e| CloudError::AgentFailed {
                project_id: handle.project_id().to_string(),
                source: Box::new(e),
            })?;

        tracing::info!(project_id = handle.project_id(), "Agent connected");
        Ok(AgentState::new(handle, status))
    }

    async fn probe_connected(
        &self,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
        handle: &ProjectHandle,
    ) -> ProbeResult<ProjectStatus> {
        let status = describe(self.api.as_ref(), &self.config, cancel, deadline, handle)
            .await
            .map_err(|e| describe_failed(e, cancel, deadline))?
            .status();
        tracing::debug!(project_id = handle.project_id(), %status, "agent probe");

        match status {
            ProjectStatus::Connected => Ok(status),
            other => Err(RetriableError::retry(CloudError::NotReady(other))),
        }
    }
}
