//! In-memory representation of BYOC resources
//!
//! Persisting these is the caller's job; every type here is serde-ready so
//! it can be written to whatever state store the caller owns.

use crate::status::ProjectStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Address of one BYOC project instance
///
/// Fixed once the project exists; changing either id means destroying and
/// recreating the project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectHandle {
    project_id: String,
    data_plane_id: String,
}

impl ProjectHandle {
    pub fn new(project_id: impl Into<String>, data_plane_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            data_plane_id: data_plane_id.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn data_plane_id(&self) -> &str {
        &self.data_plane_id
    }
}

impl std::fmt::Display for ProjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project_id, self.data_plane_id)
    }
}

/// Desired configuration of a BYOC project, already validated by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub project_name: String,

    /// Cloud provider id (e.g., "aws", "gcp")
    pub cloud_provider: String,

    pub region: String,

    /// Provider-specific settings (instance types, network ids, ...)
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

impl ProjectSpec {
    pub fn new(
        project_name: impl Into<String>,
        cloud_provider: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            cloud_provider: cloud_provider.into(),
            region: region.into(),
            settings: HashMap::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    pub fn get_setting<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.settings
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Observed state of a BYOC project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Server-assigned address
    pub handle: ProjectHandle,

    pub spec: ProjectSpec,

    pub status: ProjectStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ProjectState {
    /// State of a freshly created project, seeded as `pending`
    pub fn new(handle: ProjectHandle, spec: ProjectSpec) -> Self {
        let now = Utc::now();
        Self {
            handle,
            spec,
            status: ProjectStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    pub fn set_status(&mut self, status: ProjectStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn project_id(&self) -> &str {
        self.handle.project_id()
    }

    /// New desired configuration carrying over the server-assigned fields
    /// (handle, status, creation time) observed so far
    pub fn carry_forward(&self, desired: ProjectSpec) -> Self {
        Self {
            handle: self.handle.clone(),
            spec: desired,
            status: self.status,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}

/// Observed state of the data-plane agent of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub handle: ProjectHandle,
    pub status: ProjectStatus,
    pub updated_at: DateTime<Utc>,
}

impl AgentState {
    pub fn new(handle: ProjectHandle, status: ProjectStatus) -> Self {
        Self {
            handle,
            status,
            updated_at: Utc::now(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ProjectStatus::Connected
    }
}
