use crate::domain::analysis::AnalysisReport;
use crate::llm::LlmError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedSymbol {
    pub symbol: String,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No usable market data; the model was never called.
    #[error("{message}")]
    DataUnavailable {
        failed: Vec<FailedSymbol>,
        message: String,
    },

    #[error("API request timed out - please try again")]
    UpstreamTimeout(String),

    #[error("API request failed: {0}")]
    UpstreamRequest(String),

    #[error("Response parsing failed: {0}")]
    Validation(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl IntentError {
    pub fn data_unavailable(failed: Vec<FailedSymbol>) -> Self {
        let message = match failed.as_slice() {
            [] => "Could not retrieve market data for analysis. Please specify a stock symbol \
                   (e.g., \"What do you think about AAPL?\") and try again."
                .to_string(),
            [only] => format!(
                "Could not retrieve data for {}. Please check the symbol and try again.",
                only.symbol
            ),
            many => format!(
                "Could not retrieve data for the requested stocks ({}). Please check the symbols and try again.",
                many.iter()
                    .map(|f| f.symbol.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        Self::DataUnavailable { failed, message }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::DataUnavailable { .. } => "data_unavailable",
            Self::UpstreamTimeout(_) => "upstream_timeout",
            Self::UpstreamRequest(_) => "upstream_request",
            Self::Validation(_) => "validation",
            Self::Unexpected(_) => "unexpected",
        }
    }

    /// Whether resubmitting the same question may succeed. `None` when the
    /// answer depends on the caller changing the input.
    pub fn retry_recommended(&self) -> Option<bool> {
        match self {
            Self::UpstreamTimeout(_) | Self::UpstreamRequest(_) => Some(true),
            Self::Validation(_) | Self::Unexpected(_) => Some(false),
            Self::InvalidInput(_) | Self::DataUnavailable { .. } => None,
        }
    }

    pub fn data_fetch_failed(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}

impl From<LlmError> for IntentError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(msg) => Self::UpstreamTimeout(msg),
            LlmError::Request(msg) => Self::UpstreamRequest(msg),
            e @ (LlmError::Status { .. } | LlmError::RateLimited { .. }) => {
                Self::UpstreamRequest(e.to_string())
            }
            LlmError::Validation(v) => Self::Validation(v.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_recommended: Option<bool>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub data_fetch_failed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_symbols: Vec<FailedSymbol>,
}

impl From<&IntentError> for ErrorBody {
    fn from(err: &IntentError) -> Self {
        let failed_symbols = match err {
            IntentError::DataUnavailable { failed, .. } => failed.clone(),
            _ => Vec::new(),
        };
        Self {
            success: false,
            error: err.to_string(),
            kind: err.kind(),
            retry_recommended: err.retry_recommended(),
            data_fetch_failed: err.data_fetch_failed(),
            failed_symbols,
        }
    }
}

/// What a caller receives for one question: the report, or a flat error object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IntentResponse {
    Success(Box<AnalysisReport>),
    Failure(ErrorBody),
}

impl IntentResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<Result<AnalysisReport, IntentError>> for IntentResponse {
    fn from(result: Result<AnalysisReport, IntentError>) -> Self {
        match result {
            Ok(report) => Self::Success(Box::new(report)),
            Err(err) => Self::Failure(ErrorBody::from(&err)),
        }
    }
}
