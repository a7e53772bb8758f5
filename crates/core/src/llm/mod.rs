pub mod anthropic;
pub mod error;
pub mod json;
pub mod retry;
pub mod transport;

pub use anthropic::AnthropicClient;
pub use error::{LlmError, ValidationError};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use transport::{CreateMessageRequest, HttpTransport, Message, MessagesTransport, RawResponse};
