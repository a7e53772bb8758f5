use thiserror::Error;

const KEY_PREFIX: &str = "sk-ant-api";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("API key is required")]
    Missing,

    #[error("Invalid API key format")]
    BadFormat,
}

/// Local shape check only; whether the key is accepted is `AnthropicClient::verify_key`.
pub fn check_key_format(key: &str) -> Result<&str, CredentialError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CredentialError::Missing);
    }
    if !key.starts_with(KEY_PREFIX) {
        return Err(CredentialError::BadFormat);
    }
    Ok(key)
}
