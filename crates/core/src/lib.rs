pub mod credentials;
pub mod domain;
pub mod intent;
pub mod llm;
pub mod market;

#[cfg(test)]
pub(crate) mod testing;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
    const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
    const DEFAULT_ANTHROPIC_MAX_TOKENS: u32 = 4000;
    const DEFAULT_LLM_MAX_RETRIES: u32 = 3;
    const DEFAULT_LLM_BASE_DELAY_MS: u64 = 1000;
    const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://query1.finance.yahoo.com";
    const DEFAULT_MARKET_DATA_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_SNAPSHOT_CACHE_TTL_SECS: u64 = 900;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub anthropic_api_key: Option<String>,
        pub anthropic_base_url: String,
        pub anthropic_model: String,
        pub anthropic_max_tokens: u32,
        pub llm_max_retries: u32,
        pub llm_base_delay: Duration,
        pub market_data_base_url: String,
        pub market_data_timeout: Duration,
        pub snapshot_cache_ttl: Duration,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                anthropic_api_key: None,
                anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
                anthropic_model: DEFAULT_ANTHROPIC_MODEL.to_string(),
                anthropic_max_tokens: DEFAULT_ANTHROPIC_MAX_TOKENS,
                llm_max_retries: DEFAULT_LLM_MAX_RETRIES,
                llm_base_delay: Duration::from_millis(DEFAULT_LLM_BASE_DELAY_MS),
                market_data_base_url: DEFAULT_MARKET_DATA_BASE_URL.to_string(),
                market_data_timeout: Duration::from_secs(DEFAULT_MARKET_DATA_TIMEOUT_SECS),
                snapshot_cache_ttl: Duration::from_secs(DEFAULT_SNAPSHOT_CACHE_TTL_SECS),
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();
            Ok(Self {
                anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
                anthropic_base_url: non_empty_var("ANTHROPIC_BASE_URL")
                    .unwrap_or(defaults.anthropic_base_url),
                anthropic_model: non_empty_var("ANTHROPIC_MODEL")
                    .unwrap_or(defaults.anthropic_model),
                anthropic_max_tokens: parsed_var("ANTHROPIC_MAX_TOKENS")?
                    .unwrap_or(defaults.anthropic_max_tokens),
                llm_max_retries: parsed_var("LLM_MAX_RETRIES")?
                    .unwrap_or(defaults.llm_max_retries),
                llm_base_delay: parsed_var("LLM_BASE_DELAY_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.llm_base_delay),
                market_data_base_url: non_empty_var("MARKET_DATA_BASE_URL")
                    .unwrap_or(defaults.market_data_base_url),
                market_data_timeout: parsed_var("MARKET_DATA_TIMEOUT_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.market_data_timeout),
                snapshot_cache_ttl: parsed_var("SNAPSHOT_CACHE_TTL_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.snapshot_cache_ttl),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY not found in environment or .env file")
        }

        /// Replaces the configured credential with one supplied by the caller.
        pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
            if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
                self.anthropic_api_key = Some(key.trim().to_string());
            }
            self
        }
    }

    fn non_empty_var(name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parsed_var<T>(name: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        non_empty_var(name)
            .map(|s| s.parse::<T>().with_context(|| format!("{name} is not valid: {s}")))
            .transpose()
    }

}
