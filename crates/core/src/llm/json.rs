use crate::domain::analysis::AnalysisResult;
use crate::llm::error::ValidationError;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("fenced json pattern"));

pub const REQUIRED_FIELDS: [&str; 7] = [
    "analysis_summary",
    "symbols_analyzed",
    "current_data",
    "zanger_analysis",
    "recommendation",
    "trading_details",
    "risk_assessment",
];

/// Picks the JSON candidate out of model text: a ```json fence first, then the
/// span from the first `{` to the last `}`, then the whole text.
pub fn extract_json(text: &str) -> &str {
    if let Some(inner) = FENCED_JSON.captures(text).and_then(|c| c.get(1)) {
        return inner.as_str();
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return &text[start..=end];
        }
    }
    text
}

/// Text of the first content block of a messages API response body.
pub fn response_text(api_body: &Value) -> Result<&str, ValidationError> {
    let first = api_body
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .ok_or_else(|| ValidationError::new("Invalid API response format: no content found"))?;

    first
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ValidationError::new("Invalid API response format: no text content found"))
}

fn is_truthy(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn nested<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    obj.get(key).and_then(Value::as_object)
}

/// Checks the parsed reply for every required section and the two key leaves.
pub fn validate_fields(obj: &Map<String, Value>) -> Result<(), ValidationError> {
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !obj.contains_key(**f)) {
        return Err(ValidationError(format!("Missing required field: {missing}")));
    }

    let action = nested(obj, "recommendation").and_then(|r| r.get("action"));
    if !is_truthy(action) {
        return Err(ValidationError::new("Missing recommendation action"));
    }

    let ticker = nested(obj, "trading_details").and_then(|t| t.get("ticker"));
    if !is_truthy(ticker) {
        let received = obj.get("trading_details").cloned().unwrap_or(Value::Null);
        return Err(ValidationError(format!(
            "Missing trading ticker. Received trading_details: {received}"
        )));
    }
    Ok(())
}

/// Turns a raw messages API body into a validated analysis, or says why it can't.
pub fn parse_and_validate(api_body: &Value) -> Result<AnalysisResult, ValidationError> {
    let text = response_text(api_body)?;
    let candidate = extract_json(text);

    let parsed: Value = serde_json::from_str(candidate)
        .map_err(|e| ValidationError(format!("Invalid JSON in API response: {e}")))?;
    let Value::Object(obj) = parsed else {
        return Err(ValidationError::new(
            "Invalid JSON in API response: expected a JSON object",
        ));
    };

    validate_fields(&obj)?;

    serde_json::from_value(Value::Object(obj))
        .map_err(|e| ValidationError(format!("Unexpected analysis structure: {e}")))
}
