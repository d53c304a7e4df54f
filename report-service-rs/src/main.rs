// report-service-rs/src/main.rs
// Main Entry Point for report-service-rs
// Queues report jobs from JSON files and the job spool, then drains them through the assistant workflow

use std::env;
use std::sync::Arc;

use anyhow::Context;
use assistant_sdk::config::DEFAULT_PROVIDER;
use dotenv::dotenv;

mod events;
mod extractor;
mod mail;
mod orchestrator;
mod prompt;
mod queue;
mod recipients;
mod settings;
mod spool;
mod submission;
mod view;
mod worker;

use mail::OutboxMailer;
use orchestrator::ReportOrchestrator;
use queue::{ReportJob, ReportQueue};
use recipients::MapRecipientResolver;
use settings::ServiceSettings;
use spool::JobSpool;
use view::FileViewRenderer;
use worker::QueueWorker;

fn load_job(path: &str) -> anyhow::Result<ReportJob> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read job file {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid job file {}", path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = ServiceSettings::from_provider(DEFAULT_PROVIDER.as_ref())?;
    log::info!(
        "Starting report service (views: {}, outbox: {}, jobs: {}, poll: {} x {:?})",
        settings.views_dir.display(),
        settings.outbox_dir.display(),
        settings.jobs_dir.display(),
        settings.poll_max_attempts,
        settings.poll_interval
    );

    let orchestrator = ReportOrchestrator::from_config(&settings.report, &settings.assistant)?
        .with_poller(settings.poller());
    let recipients = MapRecipientResolver::from_file(&settings.recipients_file)?;

    let queue = ReportQueue::new();
    let worker = QueueWorker::new(
        queue.clone(),
        Arc::new(orchestrator),
        Arc::new(FileViewRenderer::new(&settings.views_dir)),
        Arc::new(OutboxMailer::new(&settings.outbox_dir, &settings.mail_from)),
        Arc::new(recipients),
        settings.report.clone(),
    )
    .with_time_budget(settings.worker_time_budget)
    .with_spool(JobSpool::new(&settings.jobs_dir));

    let mut watch = false;
    for arg in env::args().skip(1) {
        if arg == "--watch" {
            watch = true;
            continue;
        }
        queue.enqueue(load_job(&arg)?)?;
    }

    if watch {
        log::info!(
            "Watching {} every {:?}",
            settings.jobs_dir.display(),
            settings.worker_tick
        );
        tokio::select! {
            _ = worker.run_forever(settings.worker_tick) => {}
            _ = tokio::signal::ctrl_c() => log::info!("Shutting down report service"),
        }
    } else {
        let summary = worker.tick().await;
        if summary.failed > 0 {
            log::warn!("{} of {} report jobs failed", summary.failed, summary.processed);
        }
    }

    Ok(())
}
