// report-service-rs/src/settings.rs
// Service settings loaded from a config provider (REPORT_* environment by default)

use std::path::PathBuf;
use std::time::Duration;

use assistant_sdk::config::ConfigProviderExt;
use assistant_sdk::util::parse_duration;
use assistant_sdk::{
    AssistantConfig, AssistantError, ConfigProvider, FixedInterval, RunPoller, ServiceConfig,
    TerminalStatePolicy,
};

use crate::orchestrator::ReportConfig;

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub assistant: AssistantConfig,
    pub report: ReportConfig,
    pub views_dir: PathBuf,
    pub outbox_dir: PathBuf,
    pub jobs_dir: PathBuf,
    pub mail_from: String,
    pub recipients_file: PathBuf,
    pub poll_max_attempts: u32,
    pub poll_interval: Duration,
    pub terminal_state_policy: TerminalStatePolicy,
    pub worker_time_budget: Duration,
    pub worker_tick: Duration,
}

fn duration_setting<P: ConfigProvider + ?Sized>(
    provider: &P,
    key: &str,
    default: &str,
) -> assistant_sdk::Result<Duration> {
    let raw = provider.get_string_or(key, default);
    parse_duration(&raw)
        .ok_or_else(|| AssistantError::configuration(format!("Invalid duration for {}: {}", key, raw)))
}

impl ServiceSettings {
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> assistant_sdk::Result<Self> {
        let assistant = AssistantConfig::from_provider(provider)?;

        let report = ReportConfig {
            api_key: assistant.api_key.clone(),
            assistant_id: provider.get_string("assistant_id")?,
            prompt: provider.get_string("prompt")?,
            view_name: provider.get_string("view_name")?,
            view_display_name: provider.get_string("view_display_name")?,
        };

        let poll_max_attempts = provider.get_int_or("poll_max_attempts", 10)?;
        if poll_max_attempts < 1 || poll_max_attempts > u32::MAX as i64 {
            return Err(AssistantError::configuration(format!(
                "poll_max_attempts out of range: {}",
                poll_max_attempts
            )));
        }

        let settings = Self {
            assistant,
            report,
            views_dir: PathBuf::from(provider.get_string_or("views_dir", "views")),
            outbox_dir: PathBuf::from(provider.get_string_or("outbox_dir", "outbox")),
            jobs_dir: PathBuf::from(provider.get_string_or("jobs_dir", "jobs")),
            mail_from: provider.get_string_or("mail_from", "reports@localhost"),
            recipients_file: PathBuf::from(provider.get_string_or("recipients_file", "recipients.json")),
            poll_max_attempts: poll_max_attempts as u32,
            poll_interval: duration_setting(provider, "poll_interval", "2s")?,
            terminal_state_policy: provider
                .get_string_or("terminal_state_policy", "keep_polling")
                .parse()?,
            worker_time_budget: duration_setting(provider, "worker_time_budget", "60s")?,
            worker_tick: duration_setting(provider, "worker_tick", "60s")?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn poller(&self) -> RunPoller {
        RunPoller::new(FixedInterval::new(self.poll_max_attempts, self.poll_interval))
            .with_terminal_state_policy(self.terminal_state_policy)
    }
}

impl ServiceConfig for ServiceSettings {
    fn validate(&self) -> assistant_sdk::Result<()> {
        self.assistant.validate()?;
        self.report.validate()?;

        if self.worker_time_budget.is_zero() {
            return Err(AssistantError::configuration("worker_time_budget must be greater than zero"));
        }
        if self.worker_tick.is_zero() {
            return Err(AssistantError::configuration("worker_tick must be greater than zero"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "report-service"
    }
}
