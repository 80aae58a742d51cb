//! Remote control-plane API

use crate::error::Result;
use crate::state::{ProjectHandle, ProjectSpec};
use crate::status::ProjectStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Control-plane operations the reconcilers drive
///
/// Implementations own transport and wire encoding. `describe_project`
/// must be safe to call repeatedly; it is the probe behind every wait.
#[async_trait]
pub trait ByocApi: Send + Sync {
    /// Request a new project; returns the server-assigned handle
    async fn create_project(&self, spec: &ProjectSpec) -> Result<ProjectHandle>;

    /// Report the current status of a project
    async fn describe_project(&self, handle: &ProjectHandle) -> Result<ProjectDescription>;

    /// Request deletion of a project
    async fn delete_project(&self, handle: &ProjectHandle) -> Result<()>;
}

/// Answer to a describe call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescription {
    /// Raw status code as reported by the control plane
    pub status: i32,

    pub project_name: Option<String>,
}

impl ProjectDescription {
    pub fn new(status: i32) -> Self {
        Self {
            status,
            project_name: None,
        }
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn status(&self) -> ProjectStatus {
        ProjectStatus::from_code(self.status)
    }
}
