//! Model-suggested symbols for open-ended "what should I buy" questions.

use crate::intent::prompt::suggestion_prompt;
use crate::llm::AnthropicClient;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

const SUGGESTION_MAX_TOKENS: u32 = 100;
const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_SUGGESTIONS: usize = 3;

static UPPERCASE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,5}\b").expect("uppercase token pattern"));

pub const RECOMMENDATION_KEYWORDS: [&str; 9] = [
    "good buys",
    "recommendations",
    "suggest",
    "what to buy",
    "best stocks",
    "good buy",
    "buys",
    "stock picks",
    "what stocks",
];

pub fn wants_recommendations(question: &str) -> bool {
    let lower = question.to_lowercase();
    RECOMMENDATION_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// A JSON array of short strings, upper-cased. Anything that is not JSON falls
/// back to the first three all-caps tokens in the text.
pub fn parse_suggestions(text: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty() && s.chars().count() <= 5)
            .map(str::to_uppercase)
            .collect(),
        Ok(_) => Vec::new(),
        Err(_) => UPPERCASE_TOKEN
            .find_iter(text)
            .take(MAX_SUGGESTIONS)
            .map(|m| m.as_str().to_string())
            .collect(),
    }
}

/// Never fails: any upstream problem yields no suggestions.
pub async fn suggest_symbols(llm: &AnthropicClient, question: &str) -> Vec<String> {
    let prompt = suggestion_prompt(question);
    match llm
        .complete_once(&prompt, SUGGESTION_MAX_TOKENS, SUGGESTION_TIMEOUT)
        .await
    {
        Ok(text) => {
            let mut symbols = parse_suggestions(&text);
            symbols.truncate(MAX_SUGGESTIONS);
            tracing::info!(?symbols, "model suggested symbols");
            symbols
        }
        Err(err) => {
            tracing::warn!(error = %err, "symbol suggestion failed");
            Vec::new()
        }
    }
}
