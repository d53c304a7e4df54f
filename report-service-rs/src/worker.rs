// report-service-rs/src/worker.rs
// Drains the report queue: generate, then mail the result to the submitter

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use thiserror::Error;
use tokio::time::Instant;

use crate::mail::{MailError, Mailer};
use crate::orchestrator::{ReportConfig, ReportOrchestrator, ReportResult};
use crate::queue::{ReportJob, ReportQueue};
use crate::recipients::RecipientResolver;
use crate::spool::JobSpool;
use crate::view::ViewRenderer;

pub const REPORT_SUBJECT: &str = "Your Generated Report";

/// Default lease for one batch, matching a one-minute cron slot
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("User {0} not found")]
    RecipientNotFound(String),

    #[error("Failed to send report email: {0}")]
    Mail(#[from] MailError),

    #[error("Report queue is closed")]
    QueueClosed,

    #[error("Job spool error: {0}")]
    Spool(#[from] std::io::Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

pub struct QueueWorker {
    queue: ReportQueue,
    orchestrator: Arc<ReportOrchestrator>,
    views: Arc<dyn ViewRenderer>,
    mailer: Arc<dyn Mailer>,
    recipients: Arc<dyn RecipientResolver>,
    report_config: ReportConfig,
    time_budget: Duration,
    spool: Option<JobSpool>,
}

impl QueueWorker {
    pub fn new(
        queue: ReportQueue,
        orchestrator: Arc<ReportOrchestrator>,
        views: Arc<dyn ViewRenderer>,
        mailer: Arc<dyn Mailer>,
        recipients: Arc<dyn RecipientResolver>,
        report_config: ReportConfig,
    ) -> Self {
        Self {
            queue,
            orchestrator,
            views,
            mailer,
            recipients,
            report_config,
            time_budget: DEFAULT_TIME_BUDGET,
            spool: None,
        }
    }

    pub fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = time_budget;
        self
    }

    /// Pull new jobs from `spool` at the start of every tick
    pub fn with_spool(mut self, spool: JobSpool) -> Self {
        self.spool = Some(spool);
        self
    }

    /// Generate one report and mail it
    ///
    /// Failures are mailed too, as the stage's user message. Unknown users
    /// are dropped before any remote call is made.
    pub async fn process_job(&self, job: &ReportJob) -> Result<ReportResult, WorkerError> {
        info!("Processing report job {} for user {}", job.job_id, job.user_id);

        let recipient = match self.recipients.resolve(&job.user_id) {
            Some(address) => address,
            None => {
                error!("User ID {} not found.", job.user_id);
                return Err(WorkerError::RecipientNotFound(job.user_id.clone()));
            }
        };

        let mut config = self.report_config.clone();
        if let Some(view_name) = &job.view_name {
            config.view_name = view_name.clone();
        }
        if let Some(display) = &job.view_display_name {
            config.view_display_name = display.clone();
        }

        let view_html = self
            .views
            .render(&config.view_name, &config.view_display_name)
            .await;
        let result = self.orchestrator.run(&job.values, &view_html, &config).await;

        if !result.is_success() {
            warn!("Report job {} failed: {:?}", job.job_id, result);
        }

        info!("Sending email to: {}", recipient);
        self.mailer
            .send(&recipient, REPORT_SUBJECT, result.text())
            .await
            .map_err(|e| {
                error!("Failed to send report email to {}: {}", recipient, e);
                WorkerError::from(e)
            })?;

        Ok(result)
    }

    /// Process queued jobs until the queue is empty or the time budget is spent
    ///
    /// A job that starts before the deadline is allowed to finish.
    pub async fn run_batch(&self) -> BatchSummary {
        let deadline = Instant::now() + self.time_budget;
        let mut summary = BatchSummary::default();

        while Instant::now() < deadline {
            let Some(job) = self.queue.try_next().await else {
                break;
            };

            summary.processed += 1;
            match self.process_job(&job).await {
                Ok(result) if result.is_success() => {}
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!("Report job {} dropped: {}", job.job_id, e);
                }
            }
        }

        info!(
            "Report batch finished: {} processed, {} failed",
            summary.processed, summary.failed
        );
        summary
    }

    /// Collect spooled jobs, then run one batch
    ///
    /// A spool failure is logged and jobs already queued are still processed.
    pub async fn tick(&self) -> BatchSummary {
        if let Some(spool) = &self.spool {
            if let Err(e) = spool.collect(&self.queue).await {
                error!("Failed to collect jobs from {}: {}", spool.dir().display(), e);
            }
        }
        self.run_batch().await
    }

    /// Tick every `tick`; never returns
    pub async fn run_forever(&self, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }
}
