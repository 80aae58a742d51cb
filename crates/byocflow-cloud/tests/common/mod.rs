use async_trait::async_trait;
use byocflow_cloud::{
    ByocApi, CloudError, ProjectDescription, ProjectHandle, ProjectSpec, ReconcilerConfig, Result,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PROJECT_ID: &str = "proj-0001";
pub const DATA_PLANE_ID: &str = "dp-0001";

/// One scripted answer to a describe call
pub enum Reply {
    Status(i32),
    Fail(CloudError),
}

/// Fake control plane replaying a fixed describe script
///
/// Once the script runs out, the last reported status repeats forever.
pub struct ScriptedApi {
    replies: Mutex<VecDeque<Reply>>,
    last_status: Mutex<Option<i32>>,
    create_error: Mutex<Option<CloudError>>,
    describes: AtomicUsize,
    creates: AtomicUsize,
    deletes: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(statuses: impl IntoIterator<Item = i32>) -> Arc<Self> {
        Self::with_replies(statuses.into_iter().map(Reply::Status))
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            last_status: Mutex::new(None),
            create_error: Mutex::new(None),
            describes: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        })
    }

    #[allow(dead_code)]
    pub fn fail_create_with(&self, err: CloudError) {
        *self.create_error.lock().unwrap() = Some(err);
    }

    pub fn describes(&self) -> usize {
        self.describes.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ByocApi for ScriptedApi {
    async fn create_project(&self, _spec: &ProjectSpec) -> Result<ProjectHandle> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        match self.create_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(ProjectHandle::new(PROJECT_ID, DATA_PLANE_ID)),
        }
    }

    async fn describe_project(&self, handle: &ProjectHandle) -> Result<ProjectDescription> {
        assert_eq!(handle.project_id(), PROJECT_ID);
        assert_eq!(handle.data_plane_id(), DATA_PLANE_ID);
        self.describes.fetch_add(1, Ordering::SeqCst);

        let reply = self.replies.lock().unwrap().pop_front();
        let mut last_status = self.last_status.lock().unwrap();
        match reply {
            Some(Reply::Status(status)) => {
                *last_status = Some(status);
                Ok(ProjectDescription::new(status))
            }
            Some(Reply::Fail(err)) => Err(err),
            None => last_status
                .map(ProjectDescription::new)
                .ok_or_else(|| CloudError::ApiError("no scripted reply".to_string())),
        }
    }

    async fn delete_project(&self, _handle: &ProjectHandle) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Default config with ten-minute timeouts
pub fn test_config() -> ReconcilerConfig {
    let ten_minutes = Duration::from_secs(600);
    ReconcilerConfig::default().with_timeouts(ten_minutes, ten_minutes, ten_minutes)
}

pub fn handle() -> ProjectHandle {
    ProjectHandle::new(PROJECT_ID, DATA_PLANE_ID)
}

pub fn spec() -> ProjectSpec {
    ProjectSpec::new("analytics", "aws", "us-west-2")
}
