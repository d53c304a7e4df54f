// report-service-rs/src/orchestrator.rs
// Sequential thread -> message -> run -> poll -> fetch -> extract workflow

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use assistant_sdk::assistants::AssistantClient;
use assistant_sdk::{AssistantApi, AssistantConfig, AssistantError, RunPoller, ServiceConfig};

use crate::events::{EventSink, ReportEvent, Stage, TracingEventSink};
use crate::extractor;
use crate::prompt;
use crate::submission::FormSubmission;

/// Per-request assistant settings
#[derive(Clone)]
pub struct ReportConfig {
    pub api_key: String,
    pub assistant_id: String,
    /// Base instructions placed at the top of the prompt
    pub prompt: String,
    pub view_name: String,
    pub view_display_name: String,
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("api_key", &"[REDACTED]")
            .field("assistant_id", &self.assistant_id)
            .field("prompt", &self.prompt)
            .field("view_name", &self.view_name)
            .field("view_display_name", &self.view_display_name)
            .finish()
    }
}

impl ServiceConfig for ReportConfig {
    fn validate(&self) -> assistant_sdk::Result<()> {
        let required = [
            ("api_key", &self.api_key),
            ("assistant_id", &self.assistant_id),
            ("prompt", &self.prompt),
            ("view_name", &self.view_name),
            ("view_display_name", &self.view_display_name),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AssistantError::configuration(format!(
                    "Report setting {} is required",
                    name
                )));
            }
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "report"
    }
}

/// Classification of a failed report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Api,
    PollExhausted,
    RunTerminated,
    NoAssistantReply,
    /// Configuration or decoding problems
    Internal,
}

impl From<&AssistantError> for FailureKind {
    fn from(err: &AssistantError) -> Self {
        match err.root() {
            AssistantError::Network(_) => FailureKind::Network,
            AssistantError::Api { .. } => FailureKind::Api,
            AssistantError::PollExhausted { .. } => FailureKind::PollExhausted,
            AssistantError::RunTerminated { .. } => FailureKind::RunTerminated,
            _ => FailureKind::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportResult {
    Success(String),
    Failure {
        kind: FailureKind,
        stage: Stage,
        /// User-facing text; never contains raw error output
        message: String,
    },
}

impl ReportResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ReportResult::Success(_))
    }

    /// Report text on success, the user message otherwise
    pub fn text(&self) -> &str {
        match self {
            ReportResult::Success(text) => text,
            ReportResult::Failure { message, .. } => message,
        }
    }
}

enum ApiSource {
    /// One handle for every run, whatever key the run carries
    Shared(Arc<dyn AssistantApi>),
    /// HTTP clients built on demand, one per API key
    Keyed {
        connection: AssistantConfig,
        clients: Mutex<HashMap<String, Arc<dyn AssistantApi>>>,
    },
}

impl ApiSource {
    fn keyed(connection: &AssistantConfig) -> Self {
        ApiSource::Keyed {
            connection: connection.clone(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn for_key(&self, api_key: &str) -> assistant_sdk::Result<Arc<dyn AssistantApi>> {
        match self {
            ApiSource::Shared(api) => Ok(api.clone()),
            ApiSource::Keyed { connection, clients } => {
                let mut clients = clients.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(api) = clients.get(api_key) {
                    return Ok(api.clone());
                }

                let client: Arc<dyn AssistantApi> = Arc::new(AssistantClient::new_with_config(AssistantConfig {
                    api_key: api_key.to_string(),
                    ..connection.clone()
                })?);
                clients.insert(api_key.to_string(), client.clone());
                Ok(client)
            }
        }
    }
}

pub struct ReportOrchestrator {
    api: ApiSource,
    poller: RunPoller,
    events: Arc<dyn EventSink>,
}

impl ReportOrchestrator {
    /// Orchestrator over a fixed API handle; `ReportConfig::api_key` is only validated
    pub fn new(api: Arc<dyn AssistantApi>, poller: RunPoller, events: Arc<dyn EventSink>) -> Self {
        Self {
            api: ApiSource::Shared(api),
            poller,
            events,
        }
    }

    /// HTTP-backed orchestrator with the default poll policy
    ///
    /// `connection` supplies base URL, beta header and timeout. Every run
    /// authenticates with the key of the `ReportConfig` it is given; the
    /// client for `config`'s key is built up front so bad settings fail here.
    pub fn from_config(config: &ReportConfig, connection: &AssistantConfig) -> assistant_sdk::Result<Self> {
        config.validate()?;
        let api = ApiSource::keyed(connection);
        api.for_key(&config.api_key)?;

        Ok(Self {
            api,
            poller: RunPoller::default(),
            events: Arc::new(TracingEventSink),
        })
    }

    pub fn with_poller(mut self, poller: RunPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Produce a report for one submission
    ///
    /// Stages run strictly in order and the first failure ends the run.
    /// Exactly one event is emitted for every stage that was attempted.
    pub async fn run(&self, values: &FormSubmission, view_html: &str, config: &ReportConfig) -> ReportResult {
        if let Err(err) = config.validate() {
            return self.fail(Stage::BuildPrompt, FailureKind::Internal, err.to_string(), None, None);
        }
        let api = match self.api.for_key(&config.api_key) {
            Ok(api) => api,
            Err(err) => return self.fail(Stage::BuildPrompt, FailureKind::Internal, err.to_string(), None, None),
        };

        let prompt = prompt::with_view_data(
            prompt::build(&config.prompt, &config.view_name, &config.view_display_name, values),
            view_html,
        );
        self.events.emit(&ReportEvent::succeeded(
            Stage::BuildPrompt,
            format!("{} fields, {} chars", values.len(), prompt.chars().count()),
        ));

        let thread_id = match api.create_thread().await {
            Ok(thread) => thread.id,
            Err(err) => return self.fail_with(Stage::CreateThread, &err, None, None),
        };
        let tid = Some(thread_id.as_str());
        self.events
            .emit(&ReportEvent::succeeded(Stage::CreateThread, "thread created").thread(tid));

        match api.add_message(&thread_id, &prompt).await {
            Ok(message) => self.events.emit(
                &ReportEvent::succeeded(Stage::AddMessage, format!("message {}", message.id)).thread(tid),
            ),
            Err(err) => return self.fail_with(Stage::AddMessage, &err, tid, None),
        }

        let run_id = match api.start_run(&thread_id, &config.assistant_id).await {
            Ok(run) => run.id,
            Err(err) => return self.fail_with(Stage::StartRun, &err, tid, None),
        };
        let rid = Some(run_id.as_str());
        self.events
            .emit(&ReportEvent::succeeded(Stage::StartRun, "run started").thread(tid).run(rid));

        match self.poller.wait_for_completion(api.as_ref(), &thread_id, &run_id).await {
            Ok(run) => self.events.emit(
                &ReportEvent::succeeded(Stage::Poll, format!("run status {}", run.status))
                    .thread(tid)
                    .run(rid),
            ),
            Err(err) => return self.fail_with(Stage::Poll, &err, tid, rid),
        }

        let messages = match api.list_messages(&thread_id).await {
            Ok(messages) => messages,
            Err(err) => return self.fail_with(Stage::ListMessages, &err, tid, rid),
        };
        self.events.emit(
            &ReportEvent::succeeded(Stage::ListMessages, format!("{} messages", messages.len()))
                .thread(tid)
                .run(rid),
        );

        match extractor::extract(&messages) {
            Ok(text) => {
                self.events.emit(
                    &ReportEvent::succeeded(Stage::Extract, format!("{} chars", text.chars().count()))
                        .thread(tid)
                        .run(rid),
                );
                ReportResult::Success(text)
            }
            Err(err) => self.fail(Stage::Extract, FailureKind::NoAssistantReply, err.to_string(), tid, rid),
        }
    }

    fn fail_with(
        &self,
        stage: Stage,
        err: &AssistantError,
        thread_id: Option<&str>,
        run_id: Option<&str>,
    ) -> ReportResult {
        let detail = match err.context() {
            Some(context) => format!("{} (service: {}, endpoint: {:?})", err, context.service, context.endpoint),
            None => err.to_string(),
        };
        self.fail(stage, FailureKind::from(err), detail, thread_id, run_id)
    }

    fn fail(
        &self,
        stage: Stage,
        kind: FailureKind,
        detail: String,
        thread_id: Option<&str>,
        run_id: Option<&str>,
    ) -> ReportResult {
        self.events
            .emit(&ReportEvent::failed(stage, detail).thread(thread_id).run(run_id));

        ReportResult::Failure {
            kind,
            stage,
            message: stage.user_message().to_string(),
        }
    }
}
