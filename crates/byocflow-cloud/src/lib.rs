//! byocflow Cloud Reconciliation
//!
//! Drives BYOC ("bring your own cloud") projects through their
//! create/delete lifecycle by polling the control plane until the project
//! reaches the wanted status, or failing cleanly on timeout, cancellation
//! or an unrecoverable status.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │          caller (CLI / IaC framework)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │ ProjectSpec / ProjectState
//! ┌─────────────────▼───────────────────────────────┐
//! │                byocflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  ProjectReconciler / AgentReconciler      │   │
//! │  └───────┬──────────────────────┬───────────┘   │
//! │  ┌───────▼───────┐  ┌───────────▼───────────┐   │
//! │  │  Poller       │  │  network classifier   │   │
//! │  │  + Backoff    │  │  + retry_network      │   │
//! │  └───────────────┘  └───────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │ trait ByocApi
//! ┌─────────────────▼───────────────────────────────┐
//! │            control-plane API client              │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use byocflow_cloud::{ProjectReconciler, ProjectSpec, ReconcilerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let reconciler = ProjectReconciler::new(api, ReconcilerConfig::load()?);
//! let cancel = CancellationToken::new();
//!
//! let spec = ProjectSpec::new("analytics", "aws", "us-west-2");
//! let state = reconciler.create(&cancel, spec, true).await?;
//! ```

pub mod backoff;
pub mod config;
pub mod error;
pub mod network;
pub mod poll;
pub mod provider;
pub mod reconciler;
pub mod state;
pub mod status;

// Re-exports
pub use backoff::{Backoff, JITTER_COEFFICIENT};
pub use config::ReconcilerConfig;
pub use error::{BoxError, CloudError, Result};
pub use network::{NetworkGiveUpError, is_network_error, is_network_give_up, retry_network};
pub use poll::{PollError, Poller, RetriableError, poll};
pub use provider::{ByocApi, ProjectDescription};
pub use reconciler::{AgentReconciler, ProjectReconciler};
pub use state::{AgentState, ProjectHandle, ProjectSpec, ProjectState};
pub use status::{ProjectStatus, STATUS_CODE_CONNECTED, STATUS_CODE_INIT};
pub use tokio_util::sync::CancellationToken;
