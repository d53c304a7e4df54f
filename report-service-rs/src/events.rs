// report-service-rs/src/events.rs
// Stage events emitted by the report orchestrator

use std::fmt;

use assistant_sdk::util::{sanitize_for_logging, truncate_string};

/// Workflow stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    BuildPrompt,
    CreateThread,
    AddMessage,
    StartRun,
    Poll,
    ListMessages,
    Extract,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::BuildPrompt => "build_prompt",
            Stage::CreateThread => "create_thread",
            Stage::AddMessage => "add_message",
            Stage::StartRun => "start_run",
            Stage::Poll => "poll",
            Stage::ListMessages => "list_messages",
            Stage::Extract => "extract",
        }
    }

    /// Message shown to the user when this stage fails
    pub fn user_message(&self) -> &'static str {
        match self {
            Stage::BuildPrompt => "Failed to prepare the report request. Please try again later.",
            Stage::CreateThread => "Failed to create thread. Please try again later.",
            Stage::AddMessage => "Failed to add message to thread. Please try again later.",
            Stage::StartRun => "Failed to run assistant. Please try again later.",
            Stage::Poll => "Failed to poll run status. This may be due to network issues or server unavailability. Please try again later.",
            Stage::ListMessages => "Failed to list messages in thread. Please check your network connection and try again.",
            Stage::Extract => "No reply received from the assistant. Please try again later.",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// One stage transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEvent {
    pub stage: Stage,
    pub outcome: Outcome,
    pub thread_id: Option<String>,
    pub run_id: Option<String>,
    /// Free text; raw error output on failure
    pub detail: String,
}

impl ReportEvent {
    pub fn succeeded(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            outcome: Outcome::Succeeded,
            thread_id: None,
            run_id: None,
            detail: detail.into(),
        }
    }

    pub fn failed(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failed,
            ..Self::succeeded(stage, detail)
        }
    }

    pub fn thread(mut self, thread_id: Option<&str>) -> Self {
        self.thread_id = thread_id.map(str::to_string);
        self
    }

    pub fn run(mut self, run_id: Option<&str>) -> Self {
        self.run_id = run_id.map(str::to_string);
        self
    }
}

/// Receives orchestrator stage events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ReportEvent);
}

/// Writes events as structured `tracing` records
#[derive(Debug, Clone, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &ReportEvent) {
        let detail = truncate_string(&sanitize_for_logging(&event.detail), 2000);
        let thread_id = event.thread_id.as_deref().unwrap_or("-");
        let run_id = event.run_id.as_deref().unwrap_or("-");

        match event.outcome {
            Outcome::Succeeded => tracing::info!(
                stage = event.stage.as_str(),
                thread_id,
                run_id,
                "report stage succeeded: {}",
                detail
            ),
            Outcome::Failed => tracing::error!(
                stage = event.stage.as_str(),
                thread_id,
                run_id,
                "report stage failed: {}",
                detail
            ),
        }
    }
}

/// Keeps every event in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: std::sync::Mutex<Vec<ReportEvent>>,
}

#[cfg(test)]
impl RecordingEventSink {
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl EventSink for RecordingEventSink {
    fn emit(&self, event: &ReportEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
