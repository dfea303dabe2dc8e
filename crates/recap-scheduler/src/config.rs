use config::builder::DefaultState;
use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, File};
use recap_llm::gemini::{GEMINI_DEFAULT_MODEL, GEMINI_DEFAULT_TEMPERATURE};
use recap_llm::invoke::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TOP_P};
use recap_summary::{DEFAULT_COLLECTION, DEFAULT_LOCK_KEY};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379";

/// Environment variables applied on top of the TOML files, in order.
/// Later entries win, so the prefixed names override the legacy ones.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SCHEDULE_INTERVAL", "scheduler.interval_secs"),
    ("NUMBER_OF_SUMMARY", "summary.threshold"),
    ("SCHEDULER_INTERVAL_SECS", "scheduler.interval_secs"),
    ("SCHEDULER_COLLECTION", "scheduler.collection"),
    ("SCHEDULER_RUN_ON_START", "scheduler.run_on_start"),
    ("SUMMARY_THRESHOLD", "summary.threshold"),
    ("SUMMARY_SCHEMA_PATH", "summary.schema_path"),
    ("SUMMARY_PROMPT_PATH", "summary.prompt_path"),
    ("SUMMARY_LOCK_ENABLED", "summary.lock_enabled"),
    ("SUMMARY_LOCK_KEY", "summary.lock_key"),
    ("SUMMARY_LOCK_TTL_SECS", "summary.lock_ttl_secs"),
    ("STORE_DATABASE", "store.database"),
    ("STORE_COLLECTION", "store.collection"),
    ("LLM_PROVIDER", "llm.provider"),
    ("LLM_MODEL", "llm.model"),
    ("LLM_TEMPERATURE", "llm.temperature"),
    ("LLM_TOP_P", "llm.top_p"),
    ("LLM_TIMEOUT_SECS", "llm.timeout_secs"),
    ("LLM_BASE_URL", "llm.base_url"),
    ("LLM_MAX_RETRIES", "llm.max_retries"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub summary: SummaryConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub store_url: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Check immediately at startup instead of waiting one interval
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryConfig {
    pub threshold: NonZeroUsize,
    #[serde(default)]
    pub schema_path: Option<PathBuf>,
    #[serde(default)]
    pub prompt_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub lock_enabled: bool,
    #[serde(default = "default_lock_key")]
    pub lock_key: String,
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub database: String,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: "recap".to_string(),
            collection: "kv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Gemini,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::Gemini => "gemini",
        }
    }
}

/// Model settings; unset sampling values fall back to the provider's defaults
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Gemini only
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl LlmConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(match self.provider {
            LlmProvider::OpenAI => DEFAULT_MODEL,
            LlmProvider::Gemini => GEMINI_DEFAULT_MODEL,
        })
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(match self.provider {
            LlmProvider::OpenAI => DEFAULT_TEMPERATURE,
            LlmProvider::Gemini => GEMINI_DEFAULT_TEMPERATURE,
        })
    }

    pub fn top_p(&self) -> f32 {
        self.top_p.unwrap_or(DEFAULT_TOP_P)
    }

    /// Longest a single invocation can take, retries included
    pub fn worst_case_secs(&self) -> Option<u64> {
        let attempts = match self.provider {
            LlmProvider::OpenAI => 1,
            LlmProvider::Gemini => 1 + u64::from(self.max_retries.unwrap_or(2)),
        };
        self.timeout_secs.map(|timeout| timeout.saturating_mul(attempts))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_lock_key() -> String {
    DEFAULT_LOCK_KEY.to_string()
}

fn default_lock_ttl_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables listed in `ENV_OVERRIDES`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::load`] with an injectable environment lookup
    pub fn load_with<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = env("ENV").unwrap_or_else(|| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", profile)).required(false));

        let config = apply_env_overrides(builder, &env)?.build()?;
        let mut cfg: Config = config.try_deserialize()?;
        cfg.apply_secrets(&env);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;
        let mut cfg: Config = config.try_deserialize()?;
        cfg.apply_secrets(&|_: &str| None);
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_secrets<F>(&mut self, env: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.store_url = env("STORE_URL")
            .or_else(|| env("REDIS_URL"))
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_URL.to_string());
        self.openai_api_key = env("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        self.gemini_api_key = env("GEMINI_API_KEY")
            .or_else(|| env("GOOGLE_API_KEY"))
            .filter(|key| !key.trim().is_empty());
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::Message(
                "scheduler.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.collection.trim().is_empty() {
            return Err(ConfigError::Message(
                "scheduler.collection must not be empty".to_string(),
            ));
        }
        if self.summary.lock_enabled {
            if self.summary.lock_ttl_secs == 0 {
                return Err(ConfigError::Message(
                    "summary.lock_ttl_secs must be greater than zero".to_string(),
                ));
            }
            // The lease must outlive the LLM call it guards
            match self.llm.worst_case_secs() {
                Some(llm_secs) if self.summary.lock_ttl_secs <= llm_secs => {
                    return Err(ConfigError::Message(format!(
                        "summary.lock_ttl_secs ({}) must exceed the worst-case LLM call time ({}s)",
                        self.summary.lock_ttl_secs, llm_secs
                    )));
                }
                Some(_) => {}
                None => tracing::warn!(
                    lock_ttl_secs = self.summary.lock_ttl_secs,
                    "llm.timeout_secs is unset; a slow LLM call can outlive the summary lock"
                ),
            }
        }
        Ok(())
    }

    /// API key of the configured provider, required only by commands that call the LLM
    pub fn require_llm_api_key(&self) -> Result<&str, ConfigError> {
        let (key, var) = match self.llm.provider {
            LlmProvider::OpenAI => (&self.openai_api_key, "OPENAI_API_KEY"),
            LlmProvider::Gemini => (&self.gemini_api_key, "GEMINI_API_KEY"),
        };
        key.as_deref().ok_or_else(|| {
            ConfigError::Message(format!("{} environment variable is required", var))
        })
    }
}

fn apply_env_overrides<F>(
    mut builder: ConfigBuilder<DefaultState>,
    env: &F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for &(name, key) in ENV_OVERRIDES {
        builder = builder.set_override_option(key, env(name))?;
    }
    Ok(builder)
}
