// report-service-rs/src/spool.rs
// Job spool directory: submitters drop ReportJob JSON files, the worker picks them up

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::queue::{ReportJob, ReportQueue};
use crate::worker::WorkerError;

pub const PROCESSED_DIR: &str = "processed";
pub const REJECTED_DIR: &str = "rejected";

/// `*.json` job files waiting in one directory
#[derive(Debug, Clone)]
pub struct JobSpool {
    dir: PathBuf,
}

impl JobSpool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Queue every waiting job file, in file name order
    ///
    /// Each file is moved to `processed/` once queued, or to `rejected/`
    /// when it does not parse, so no file is picked up twice. A missing
    /// spool directory holds no jobs.
    pub async fn collect(&self, queue: &ReportQueue) -> Result<usize, WorkerError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
            if is_json && entry.file_type().await?.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut queued = 0;
        for path in paths {
            let raw = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<ReportJob>(&raw) {
                Ok(job) => {
                    self.move_into(&path, PROCESSED_DIR).await?;
                    queue.enqueue(job)?;
                    queued += 1;
                }
                Err(e) => {
                    error!("Rejected job file {}: {}", path.display(), e);
                    self.move_into(&path, REJECTED_DIR).await?;
                }
            }
        }

        if queued > 0 {
            info!("Collected {} job(s) from {}", queued, self.dir.display());
        }
        Ok(queued)
    }

    async fn move_into(&self, path: &Path, folder: &str) -> Result<(), WorkerError> {
        let target = self.dir.join(folder);
        tokio::fs::create_dir_all(&target).await?;
        if let Some(name) = path.file_name() {
            tokio::fs::rename(path, target.join(name)).await?;
        }
        Ok(())
    }
}
