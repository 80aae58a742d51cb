//! Cloud reconciliation error types

use crate::network::NetworkGiveUpError;
use crate::poll::PollError;
use crate::status::ProjectStatus;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Cloud reconciliation errors
#[derive(Error, Debug)]
pub enum CloudError {
    /// The control plane answered, but rejected the request
    #[error("API error: {0}")]
    ApiError(String),

    /// The request never got a usable answer (connection, TLS, DNS, ...)
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// `init` observed where the protocol expects the data plane to exist
    #[error(
        "Project {project_id} is still in init state; \
         the data plane must be set up before it can be provisioned"
    )]
    InvalidState { project_id: String },

    #[error("Unknown state: {0}")]
    UnknownState(ProjectStatus),

    #[error("Agent already connected, deploying")]
    AgentConnecting,

    #[error("Waiting for project: {0}")]
    NotReady(ProjectStatus),

    #[error(
        "Project {project_id} is {status}; delete it from the cloud console first, \
         then run the deletion again to confirm it"
    )]
    ManualDeletionRequired {
        project_id: String,
        status: ProjectStatus,
    },

    #[error("{0}")]
    NetworkGiveUp(#[from] NetworkGiveUpError),

    #[error("Configuration error: {0}")]
    Config(#[from] byocflow_config::ConfigError),

    /// A request outside the poll failed: the create/delete call itself, or
    /// the single describe of a call that does not wait
    #[error("Failed to {operation} BYOC project {target}: {source}")]
    RequestFailed {
        operation: &'static str,
        target: String,
        #[source]
        source: Box<CloudError>,
    },

    #[error("Failed to create BYOC project {project_id}: {source}")]
    CreateFailed {
        project_id: String,
        #[source]
        source: Box<PollError<CloudError>>,
    },

    #[error("Failed to delete BYOC project {project_id}: {source}")]
    DeleteFailed {
        project_id: String,
        #[source]
        source: Box<PollError<CloudError>>,
    },

    #[error("Failed to wait for agent of BYOC project {project_id}: {source}")]
    AgentFailed {
        project_id: String,
        #[source]
        source: Box<PollError<CloudError>>,
    },
}

impl CloudError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        CloudError::Transport(err.into())
    }

    /// The poll failure wrapped by an operation error, if any
    pub fn poll_error(&self) -> Option<&PollError<CloudError>> {
        match self {
            CloudError::CreateFailed { source, .. }
            | CloudError::DeleteFailed { source, .. }
            | CloudError::AgentFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether the operation ran out of time while only transient
    /// conditions were observed
    pub fn is_timeout(&self) -> bool {
        self.poll_error().is_some_and(PollError::is_timeout)
    }

    /// Whether the operation stopped on a non-retriable condition
    pub fn is_halted(&self) -> bool {
        self.poll_error().is_some_and(PollError::is_halted)
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
