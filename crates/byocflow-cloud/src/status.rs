//! Lifecycle status of a BYOC project
//!
//! The control plane reports status as a raw integer. Values `0..=8` come
//! from the control plane's own enumeration; `90` and `99` are sentinels
//! used only by this crate's protocols (`connected`, `init`) and never by
//! the remote enumeration itself.

use serde::{Deserialize, Serialize};

/// Sentinel code: the data-plane agent has connected to the control plane.
pub const STATUS_CODE_CONNECTED: i32 = 90;

/// Sentinel code: the project exists but has not been initialised yet.
pub const STATUS_CODE_INIT: i32 = 99;

/// Status of a BYOC project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Init,
    Connected,
    Pending,
    Running,
    Deleting,
    Deleted,
    Upgrading,
    Failed,
    Stopping,
    Stopped,
    Resuming,
    /// A code outside the known table, kept verbatim for diagnostics
    ///
    /// Only [`ProjectStatus::from_code`] should build this variant. A known
    /// code wrapped by hand (`Unknown(1)`) does not survive the round trip
    /// through [`ProjectStatus::code`].
    Unknown(i32),
}

impl ProjectStatus {
    /// Map a raw status code reported by the control plane
    pub fn from_code(code: i32) -> Self {
        match code {
            STATUS_CODE_INIT => ProjectStatus::Init,
            STATUS_CODE_CONNECTED => ProjectStatus::Connected,
            0 => ProjectStatus::Pending,
            1 => ProjectStatus::Running,
            2 => ProjectStatus::Deleting,
            3 => ProjectStatus::Deleted,
            4 => ProjectStatus::Upgrading,
            5 => ProjectStatus::Failed,
            6 => ProjectStatus::Stopping,
            7 => ProjectStatus::Stopped,
            8 => ProjectStatus::Resuming,
            other => ProjectStatus::Unknown(other),
        }
    }

    /// Raw code of this status
    ///
    /// Inverse of [`ProjectStatus::from_code`] for every status it returns.
    pub fn code(&self) -> i32 {
        match self {
            ProjectStatus::Init => STATUS_CODE_INIT,
            ProjectStatus::Connected => STATUS_CODE_CONNECTED,
            ProjectStatus::Pending => 0,
            ProjectStatus::Running => 1,
            ProjectStatus::Deleting => 2,
            ProjectStatus::Deleted => 3,
            ProjectStatus::Upgrading => 4,
            ProjectStatus::Failed => 5,
            ProjectStatus::Stopping => 6,
            ProjectStatus::Stopped => 7,
            ProjectStatus::Resuming => 8,
            ProjectStatus::Unknown(code) => *code,
        }
    }

    /// Whether the control plane will not move the project out of this
    /// status on its own
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Running
                | ProjectStatus::Deleted
                | ProjectStatus::Failed
                | ProjectStatus::Stopped
        )
    }
}

impl From<i32> for ProjectStatus {
    fn from(code: i32) -> Self {
        ProjectStatus::from_code(code)
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Init => write!(f, "init"),
            ProjectStatus::Connected => write!(f, "connected"),
            ProjectStatus::Pending => write!(f, "pending"),
            ProjectStatus::Running => write!(f, "running"),
            ProjectStatus::Deleting => write!(f, "deleting"),
            ProjectStatus::Deleted => write!(f, "deleted"),
            ProjectStatus::Upgrading => write!(f, "upgrading"),
            ProjectStatus::Failed => write!(f, "failed"),
            ProjectStatus::Stopping => write!(f, "stopping"),
            ProjectStatus::Stopped => write!(f, "stopped"),
            ProjectStatus::Resuming => write!(f, "resuming"),
            ProjectStatus::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}
