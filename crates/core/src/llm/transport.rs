use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MESSAGES_PATH: &str = "/v1/messages";

#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: &'static str,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    Request(String),
}

/// One POST to the messages endpoint. Status handling and retries belong to the caller.
#[async_trait::async_trait]
pub trait MessagesTransport: Send + Sync {
    async fn send(
        &self,
        req: &CreateMessageRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, api_key: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).context("API key is not a valid header value")?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            headers,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), MESSAGES_PATH)
    }
}

#[async_trait::async_trait]
impl MessagesTransport for HttpTransport {
    async fn send(
        &self,
        req: &CreateMessageRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::Request(e.to_string())
            }
        };

        let res = self
            .http
            .post(self.url())
            .headers(self.headers.clone())
            .timeout(timeout)
            .json(req)
            .send()
            .await
            .map_err(classify)?;

        let status = res.status();
        let body = res.text().await.map_err(classify)?;
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_absent_system_prompt() {
        let req = CreateMessageRequest {
            model: "m".to_string(),
            max_tokens: 100,
            system: None,
            messages: vec![Message::user("hi")],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("system").is_none());
        assert_eq!(v["messages"][0]["role"], "user");
        assert_eq!(v["messages"][0]["content"], "hi");
    }

    #[test]
    fn transport_builds_messages_url_and_headers() {
        let t = HttpTransport::new("https://api.example.test/", "sk-ant-api-test").unwrap();
        assert_eq!(t.url(), "https://api.example.test/v1/messages");
        assert_eq!(t.headers["anthropic-version"], ANTHROPIC_VERSION);
        assert_eq!(t.headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn rejects_key_with_control_characters() {
        assert!(HttpTransport::new("https://api.example.test", "bad\nkey").is_err());
    }
}
