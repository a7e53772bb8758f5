use crate::config::Settings;
use crate::llm::error::{LlmError, ValidationError};
use crate::llm::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::llm::transport::{CreateMessageRequest, HttpTransport, Message, MessagesTransport};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);
const VERIFY_MODEL: &str = "claude-3-haiku-20240307";
const VERIFY_MAX_TOKENS: u32 = 10;
const VERIFY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct AnthropicClient {
    transport: Arc<dyn MessagesTransport>,
    sleeper: Arc<dyn Sleeper>,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?;
        let transport = HttpTransport::new(settings.anthropic_base_url.clone(), api_key)?;

        Ok(Self::new(Arc::new(transport), settings.anthropic_model.clone())
            .with_max_tokens(settings.anthropic_max_tokens)
            .with_retry(RetryPolicy::new(
                settings.llm_max_retries,
                settings.llm_base_delay,
            )))
    }

    pub fn new(transport: Arc<dyn MessagesTransport>, model: impl Into<String>) -> Self {
        Self {
            transport,
            sleeper: Arc::new(TokioSleeper),
            model: model.into(),
            max_tokens: 4000,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    fn request(&self, system: Option<&str>, user: &str, max_tokens: u32) -> CreateMessageRequest {
        CreateMessageRequest {
            model: self.model.clone(),
            max_tokens,
            system: system.map(str::to_string),
            messages: vec![Message::user(user)],
        }
    }

    fn parse_body(body: &str) -> Result<Value, LlmError> {
        serde_json::from_str::<Value>(body)
            .map_err(|e| ValidationError(format!("Invalid JSON in API response: {e}")).into())
    }

    /// Sends the completion with the retry schedule and returns the parsed response body.
    ///
    /// 200 returns at once. 429 waits `base * 2^attempt * 2` and tries again.
    /// Transport errors wait `base * 2^attempt` and try again unless this was
    /// the last attempt. Any other status fails immediately.
    pub async fn complete(&self, system: &str, user: &str) -> Result<Value, LlmError> {
        let req = self.request(Some(system), user, self.max_tokens);
        let max = self.retry.max_retries;
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..max {
            match self.transport.send(&req, COMPLETION_TIMEOUT).await {
                Ok(res) if res.status == StatusCode::OK => {
                    if attempt > 0 {
                        tracing::debug!(attempt, "completion succeeded after retry");
                    }
                    return Self::parse_body(&res.body);
                }
                Ok(res) if res.status == StatusCode::TOO_MANY_REQUESTS => {
                    let delay = self.retry.rate_limit_delay(attempt);
                    tracing::warn!(attempt, ?delay, "completion rate limited; backing off");
                    self.sleeper.sleep(delay).await;
                    last_error = Some(LlmError::RateLimited {
                        attempts: attempt + 1,
                    });
                }
                Ok(res) => {
                    tracing::error!(attempt, status = %res.status, "completion rejected");
                    return Err(LlmError::Status {
                        status: res.status,
                        body: res.body,
                    });
                }
                Err(err) => {
                    if attempt + 1 >= max {
                        tracing::error!(attempt, error = %err, "completion failed; no attempts left");
                        return Err(err.into());
                    }
                    let delay = self.retry.transport_delay(attempt);
                    tracing::warn!(attempt, ?delay, error = %err, "completion failed; retrying");
                    self.sleeper.sleep(delay).await;
                    last_error = Some(err.into());
                }
            }
        }

        Err(last_error.unwrap_or(LlmError::RateLimited { attempts: max }))
    }

    /// One attempt, no system prompt, no retry. Returns the first text block.
    pub async fn complete_once(
        &self,
        user: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let req = self.request(None, user, max_tokens);
        let res = self.transport.send(&req, timeout).await?;
        if res.status != StatusCode::OK {
            return Err(LlmError::Status {
                status: res.status,
                body: res.body,
            });
        }
        let body = Self::parse_body(&res.body)?;
        let text = crate::llm::json::response_text(&body)?;
        Ok(text.to_string())
    }

    /// Minimal request used to check that a credential is accepted.
    pub async fn verify_key(&self) -> Result<(), LlmError> {
        let req = CreateMessageRequest {
            model: VERIFY_MODEL.to_string(),
            ..self.request(None, "Hi", VERIFY_MAX_TOKENS)
        };
        let res = self.transport.send(&req, VERIFY_TIMEOUT).await?;
        if res.status.is_success() {
            Ok(())
        } else {
            Err(LlmError::Status {
                status: res.status,
                body: res.body,
            })
        }
    }
}
