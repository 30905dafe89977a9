//! Runtime configuration, loaded from the environment.
//!
//! Every knob has a default that matches the deployed service; `from_env`
//! only overrides what is explicitly set. The API key is the one value with
//! no default and is held behind `SecretString` so it never ends up in logs.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::context::CodeContextMode;

/// Connection settings for the remote assistant service.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Base URL of the service, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token. Required to construct the production client.
    pub api_key: Option<SecretString>,
    /// Id of the pre-provisioned review assistant.
    pub assistant_id: String,
    /// Per-request timeout on the HTTP client.
    pub request_timeout: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            assistant_id: String::new(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl AssistantConfig {
    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Set the assistant id.
    pub fn with_assistant_id(mut self, id: impl Into<String>) -> Self {
        self.assistant_id = id.into();
        self
    }
}

/// Budget and cadence for run polling.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Wall-clock budget for one polling session.
    pub timeout: Duration,
    /// Pause between status fetches.
    pub interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(180),
            interval: Duration::from_millis(1000),
        }
    }
}

impl PollingConfig {
    /// Set the wall-clock budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the inter-poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Top-level configuration for the reviewer.
#[derive(Debug, Clone)]
pub struct ReviewerConfig {
    pub assistant: AssistantConfig,
    pub polling: PollingConfig,
    /// How many `requires_action` rounds are serviced per orchestration.
    pub max_action_retries: u32,
    /// Attempts at retrieving run steps before giving up.
    pub step_retries: u32,
    /// Pause between step-retrieval attempts.
    pub step_retry_interval: Duration,
    /// How the assistant gets access to source code.
    pub context_mode: CodeContextMode,
    /// Root of the source tree under review.
    pub source_root: PathBuf,
    /// Where per-subject thread ids are persisted. `None` keeps them in
    /// memory for the process lifetime.
    pub thread_state_file: Option<PathBuf>,
}

impl Default for ReviewerConfig {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig::default(),
            polling: PollingConfig::default(),
            max_action_retries: 1,
            step_retries: 3,
            step_retry_interval: Duration::from_secs(5),
            context_mode: CodeContextMode::OnDemand,
            source_root: PathBuf::from("."),
            thread_state_file: default_thread_state_file(),
        }
    }
}

impl ReviewerConfig {
    /// Load configuration from `REVIEWCLAW_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("REVIEWCLAW_BASE_URL") {
            config.assistant.base_url = url;
        }
        if let Some(key) = env_first(&["REVIEWCLAW_API_KEY", "OPENAI_API_KEY"]) {
            config.assistant.api_key = Some(SecretString::from(key));
        }
        if let Ok(id) = std::env::var("REVIEWCLAW_ASSISTANT_ID") {
            config.assistant.assistant_id = id;
        }
        if let Some(secs) = env_parse::<u64>("REVIEWCLAW_REQUEST_TIMEOUT_SECS") {
            config.assistant.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("REVIEWCLAW_POLL_TIMEOUT_SECS") {
            config.polling.timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = env_parse::<u64>("REVIEWCLAW_POLL_INTERVAL_MS") {
            config.polling.interval = Duration::from_millis(millis);
        }
        if let Some(n) = env_parse::<u32>("REVIEWCLAW_MAX_ACTION_RETRIES") {
            config.max_action_retries = n;
        }
        if let Some(n) = env_parse::<u32>("REVIEWCLAW_STEP_RETRIES") {
            config.step_retries = n;
        }
        if let Some(secs) = env_parse::<u64>("REVIEWCLAW_STEP_RETRY_SECS") {
            config.step_retry_interval = Duration::from_secs(secs);
        }
        if let Some(mode) = env_parse::<CodeContextMode>("REVIEWCLAW_CONTEXT_MODE") {
            config.context_mode = mode;
        }
        if let Ok(root) = std::env::var("REVIEWCLAW_SOURCE_ROOT") {
            config.source_root = PathBuf::from(root);
        }
        if let Ok(path) = std::env::var("REVIEWCLAW_THREAD_STATE") {
            config.thread_state_file = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }

        config
    }
}

fn default_thread_state_file() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("reviewclaw").join("threads.json"))
}

fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}
