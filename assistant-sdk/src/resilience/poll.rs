//! Bounded polling of run status
//!
//! The poller asks for the run's state until it reads `completed` or the
//! attempt budget is spent. A failed status request aborts immediately; the
//! budget only covers runs that are still working.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use backoff::ExponentialBackoff;
use log::{debug, error, warn};

use crate::core::AssistantApi;
use crate::error::{AssistantError, ErrorContext, Result};
use crate::services::assistants::{Run, RunStatus};

/// Attempt budget and delay schedule for run polling
pub trait PollPolicy: fmt::Debug + Send + Sync {
    /// Maximum number of status requests
    fn max_attempts(&self) -> u32;

    /// A fresh delay schedule for one polling session
    ///
    /// Returning `None` from the schedule ends polling early.
    fn schedule(&self) -> Box<dyn Backoff + Send>;
}

/// Constant delay between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedInterval {
    /// Maximum number of status requests
    pub max_attempts: u32,

    /// Delay between two requests
    pub interval: Duration,
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(2),
        }
    }
}

impl FixedInterval {
    /// Create a fixed-interval policy
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Poll back to back with no delay
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl PollPolicy for FixedInterval {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn schedule(&self) -> Box<dyn Backoff + Send> {
        Box::new(Constant::new(self.interval))
    }
}

/// Exponentially growing delay between attempts
#[derive(Debug, Clone)]
pub struct ExponentialPolicy {
    /// Maximum number of status requests
    pub max_attempts: u32,

    /// First delay
    pub initial_interval: Duration,

    /// Upper bound for a single delay
    pub max_interval: Duration,

    /// Growth factor between delays
    pub multiplier: f64,

    /// Jitter applied to each delay (0.0 disables it)
    pub randomization_factor: f64,

    /// Wall-clock cap on the whole session
    pub max_elapsed_time: Option<Duration>,
}

impl Default for ExponentialPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(8),
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_elapsed_time: Some(Duration::from_secs(60)),
        }
    }
}

impl PollPolicy for ExponentialPolicy {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn schedule(&self) -> Box<dyn Backoff + Send> {
        Box::new(ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            randomization_factor: self.randomization_factor,
            max_elapsed_time: self.max_elapsed_time,
            ..ExponentialBackoff::default()
        })
    }
}

/// How the poller treats runs that stopped without completing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalStatePolicy {
    /// Treat `failed`, `cancelled`, `expired` and `incomplete` like a run
    /// that is still working; they surface only as exhaustion
    #[default]
    KeepPolling,

    /// Stop at the first terminal failure state with `RunTerminated`
    FailFast,
}

impl FromStr for TerminalStatePolicy {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "keep_polling" | "keep-polling" => Ok(TerminalStatePolicy::KeepPolling),
            "fail_fast" | "fail-fast" => Ok(TerminalStatePolicy::FailFast),
            other => Err(AssistantError::configuration(format!(
                "Unknown terminal state policy: {}",
                other
            ))),
        }
    }
}

/// Polls a run until it completes or the policy's budget runs out
#[derive(Debug, Clone)]
pub struct RunPoller {
    policy: Arc<dyn PollPolicy>,
    terminal_states: TerminalStatePolicy,
}

impl Default for RunPoller {
    fn default() -> Self {
        Self::new(FixedInterval::default())
    }
}

impl RunPoller {
    /// Create a poller with the given policy
    pub fn new(policy: impl PollPolicy + 'static) -> Self {
        Self {
            policy: Arc::new(policy),
            terminal_states: TerminalStatePolicy::default(),
        }
    }

    /// Set the terminal state handling
    pub fn with_terminal_state_policy(mut self, terminal_states: TerminalStatePolicy) -> Self {
        self.terminal_states = terminal_states;
        self
    }

    /// Active policy
    pub fn policy(&self) -> &dyn PollPolicy {
        self.policy.as_ref()
    }

    /// Wait until the run reports `completed`
    pub async fn wait_for_completion<A>(&self, api: &A, thread_id: &str, run_id: &str) -> Result<Run>
    where
        A: AssistantApi + ?Sized,
    {
        let max_attempts = self.policy.max_attempts();
        let mut schedule = self.policy.schedule();
        let mut attempts = 0;
        let mut last_status: Option<RunStatus> = None;

        while attempts < max_attempts {
            attempts += 1;

            let run = match api.get_run_status(thread_id, run_id).await {
                Ok(run) => run,
                Err(err) => {
                    error!(
                        "Error polling run {} on thread {} (attempt {}/{}): {}",
                        run_id, thread_id, attempts, max_attempts, err
                    );
                    return Err(err.with_context_value("poll_attempt", attempts));
                }
            };

            debug!(
                "Run {} status {} (attempt {}/{})",
                run_id, run.status, attempts, max_attempts
            );

            if run.status.is_completed() {
                return Ok(run);
            }

            if self.terminal_states == TerminalStatePolicy::FailFast && run.status.is_terminal_failure() {
                warn!("Run {} stopped with status {}", run_id, run.status);
                return Err(AssistantError::RunTerminated {
                    run_id: run_id.to_string(),
                    status: run.status.to_string(),
                }
                .with_context(self.context(thread_id, run_id)));
            }

            last_status = Some(run.status);

            if attempts == max_attempts {
                break;
            }

            match schedule.next_backoff() {
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    warn!("Poll schedule for run {} ended after {} attempts", run_id, attempts);
                    break;
                }
            }
        }

        let last_status = last_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        warn!(
            "Max attempts reached while polling run {} (attempts: {}, last status: {})",
            run_id, attempts, last_status
        );

        Err(AssistantError::PollExhausted {
            run_id: run_id.to_string(),
            attempts,
            last_status,
        }
        .with_context(self.context(thread_id, run_id)))
    }

    fn context(&self, thread_id: &str, run_id: &str) -> ErrorContext {
        ErrorContext::for_service("assistants")
            .thread_id(thread_id)
            .run_id(run_id)
            .with("max_attempts", self.policy.max_attempts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::services::assistants::{Message, MessageRef, Thread};

    /// Answers run status requests from a script; other calls are not expected
    struct ScriptedRuns {
        script: Mutex<VecDeque<Result<RunStatus>>>,
        fallback: RunStatus,
        calls: AtomicUsize,
    }

    impl ScriptedRuns {
        fn new(script: Vec<Result<RunStatus>>, fallback: RunStatus) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: AtomicUsize::new(0),
            }
        }

        fn in_progress_then_completed(in_progress: usize) -> Self {
            let mut script: Vec<Result<RunStatus>> =
                (0..in_progress).map(|_| Ok(RunStatus::InProgress)).collect();
            script.push(Ok(RunStatus::Completed));
            Self::new(script, RunStatus::Completed)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssistantApi for ScriptedRuns {
        async fn create_thread(&self) -> Result<Thread> {
            Err(AssistantError::configuration("not scripted"))
        }

        async fn add_message(&self, _thread_id: &str, _content: &str) -> Result<MessageRef> {
            Err(AssistantError::configuration("not scripted"))
        }

        async fn start_run(&self, _thread_id: &str, _assistant_id: &str) -> Result<Run> {
            Err(AssistantError::configuration("not scripted"))
        }

        async fn get_run_status(&self, thread_id: &str, run_id: &str) -> Result<Run> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            let status = match next {
                Some(step) => step?,
                None => self.fallback.clone(),
            };
            Ok(Run {
                id: run_id.to_string(),
                thread_id: Some(thread_id.to_string()),
                assistant_id: None,
                status,
                last_error: None,
            })
        }

        async fn list_messages(&self, _thread_id: &str) -> Result<Vec<Message>> {
            Err(AssistantError::configuration("not scripted"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_on_tenth_attempt_after_nine_intervals() {
        let api = ScriptedRuns::in_progress_then_completed(9);
        let poller = RunPoller::default();

        let started = tokio::time::Instant::now();
        let run = poller.wait_for_completion(&api, "thread_1", "run_1").await.unwrap();
        let waited = started.elapsed();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(api.calls(), 10);
        assert!(waited >= Duration::from_secs(18), "waited {:?}", waited);
        assert!(waited < Duration::from_secs(19), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_exactly_max_attempts() {
        let api = ScriptedRuns::new(Vec::new(), RunStatus::InProgress);
        let poller = RunPoller::default();

        let err = poller.wait_for_completion(&api, "thread_1", "run_1").await.unwrap_err();

        assert_eq!(api.calls(), 10);
        match err.root() {
            AssistantError::PollExhausted {
                run_id,
                attempts,
                last_status,
            } => {
                assert_eq!(run_id, "run_1");
                assert_eq!(*attempts, 10);
                assert_eq!(last_status, "in_progress");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.context().and_then(|c| c.thread_id.as_deref()), Some("thread_1"));
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_immediately() {
        let api = ScriptedRuns::new(
            vec![
                Ok(RunStatus::Queued),
                Ok(RunStatus::InProgress),
                Err(AssistantError::network("connection refused")),
            ],
            RunStatus::Completed,
        );
        let poller = RunPoller::new(FixedInterval::immediate(10));

        let err = poller.wait_for_completion(&api, "thread_1", "run_1").await.unwrap_err();

        assert_eq!(api.calls(), 3);
        assert!(err.is_network());
        assert_eq!(
            err.context().and_then(|c| c.data.get("poll_attempt")).map(String::as_str),
            Some("3")
        );
    }

    #[tokio::test]
    async fn test_failed_run_keeps_polling_by_default() {
        let api = ScriptedRuns::new(Vec::new(), RunStatus::Failed);
        let poller = RunPoller::new(FixedInterval::immediate(4));

        let err = poller.wait_for_completion(&api, "thread_1", "run_1").await.unwrap_err();

        assert_eq!(api.calls(), 4);
        assert!(matches!(err.root(), AssistantError::PollExhausted { last_status, .. } if last_status == "failed"));
    }

    #[tokio::test]
    async fn test_fail_fast_stops_on_terminal_state() {
        let api = ScriptedRuns::new(
            vec![Ok(RunStatus::InProgress), Ok(RunStatus::Expired)],
            RunStatus::Completed,
        );
        let poller = RunPoller::new(FixedInterval::immediate(10))
            .with_terminal_state_policy(TerminalStatePolicy::FailFast);

        let err = poller.wait_for_completion(&api, "thread_1", "run_1").await.unwrap_err();

        assert_eq!(api.calls(), 2);
        assert!(matches!(err.root(), AssistantError::RunTerminated { status, .. } if status == "expired"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_policy_grows_delays() {
        let api = ScriptedRuns::in_progress_then_completed(3);
        let poller = RunPoller::new(ExponentialPolicy {
            max_attempts: 5,
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(1),
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_elapsed_time: None,
        });

        let started = tokio::time::Instant::now();
        poller.wait_for_completion(&api, "thread_1", "run_1").await.unwrap();

        // 100ms + 200ms + 400ms
        let waited = started.elapsed();
        assert_eq!(api.calls(), 4);
        assert!(waited >= Duration::from_millis(700), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(710), "waited {:?}", waited);
    }

    #[test]
    fn test_terminal_state_policy_parsing() {
        assert_eq!("fail_fast".parse::<TerminalStatePolicy>().unwrap(), TerminalStatePolicy::FailFast);
        assert_eq!(
            "Keep-Polling".parse::<TerminalStatePolicy>().unwrap(),
            TerminalStatePolicy::KeepPolling
        );
        assert!("sometimes".parse::<TerminalStatePolicy>().is_err());
    }
}
