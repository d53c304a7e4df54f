// report-service-rs/src/queue.rs
// In-memory report job queue

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::submission::FormSubmission;

/// One queued report request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportJob {
    #[serde(default = "Uuid::new_v4")]
    pub job_id: Uuid,
    pub user_id: String,
    pub values: FormSubmission,
    /// Overrides the configured view when set
    #[serde(default)]
    pub view_name: Option<String>,
    #[serde(default)]
    pub view_display_name: Option<String>,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl ReportJob {
    pub fn new(user_id: impl Into<String>, values: FormSubmission) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            user_id: user_id.into(),
            values,
            view_name: None,
            view_display_name: None,
            submitted_at: Utc::now(),
        }
    }
}

/// Cloneable handle to a shared FIFO of jobs
#[derive(Debug, Clone)]
pub struct ReportQueue {
    sender: mpsc::UnboundedSender<ReportJob>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<ReportJob>>>,
}

impl Default for ReportQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    pub fn enqueue(&self, job: ReportJob) -> Result<Uuid, crate::worker::WorkerError> {
        let job_id = job.job_id;
        self.sender
            .send(job)
            .map_err(|_| crate::worker::WorkerError::QueueClosed)?;
        log::info!("Queued report job {}", job_id);
        Ok(job_id)
    }

    /// Next job if one is waiting; never blocks on an empty queue
    pub async fn try_next(&self) -> Option<ReportJob> {
        self.receiver.lock().await.try_recv().ok()
    }
}
