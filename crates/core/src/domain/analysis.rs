use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const METHODOLOGY: &str = "Dan Zanger";

/// A user question together with the ticker symbols found in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub question: String,
    /// Deduplicated, in first-seen order.
    pub symbols: Vec<String>,
}

/// Structured analysis the model is asked to return.
///
/// Only presence of the top-level sections and the two key leaves
/// (`recommendation.action`, `trading_details.ticker`) is enforced; every other
/// leaf is optional and accepted as text whatever JSON scalar the model used.
/// The descriptive sections keep whatever JSON the model sent when it is not
/// the documented object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(deserialize_with = "lenient::string")]
    pub analysis_summary: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub symbols_analyzed: Vec<String>,
    pub current_data: Section<CurrentData>,
    #[serde(rename = "zanger_analysis")]
    pub pattern_analysis: Section<PatternAnalysis>,
    pub recommendation: Recommendation,
    pub trading_details: TradingDetails,
    pub risk_assessment: Section<RiskAssessment>,
}

/// A reply section: typed when it is a JSON object, verbatim otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    Structured(T),
    Raw(Value),
}

impl<T> Section<T> {
    pub fn structured(&self) -> Option<&T> {
        match self {
            Self::Structured(inner) => Some(inner),
            Self::Raw(_) => None,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Section<T> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;
        // Arrays would otherwise bind to struct fields by position.
        if value.is_object() {
            if let Ok(inner) = serde_json::from_value::<T>(value.clone()) {
                return Ok(Self::Structured(inner));
            }
        }
        Ok(Self::Raw(value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentData {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub price: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub volume_vs_avg: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub earnings_growth: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub sector_performance: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternAnalysis {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub pattern_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub volume_ratio: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub breakout_level: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub meets_zanger_criteria: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(deserialize_with = "lenient::string")]
    pub action: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingDetails {
    #[serde(deserialize_with = "lenient::string")]
    pub ticker: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub entry_price: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub stop_loss: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub target_price: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub position_size: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub time_horizon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessment {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub risk_level: Option<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub key_risks: Vec<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub risk_reward_ratio: Option<String>,
}

/// A validated analysis annotated for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub success: bool,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub processed_at: DateTime<Utc>,
    pub methodology: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_warning: Option<String>,
}

impl AnalysisReport {
    pub fn new(analysis: AnalysisResult, processed_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            analysis,
            processed_at,
            methodology: METHODOLOGY.to_string(),
            data_warning: None,
        }
    }

    pub fn with_failed_symbols(mut self, failed: &[String]) -> Self {
        if !failed.is_empty() {
            self.data_warning = Some(format!(
                "Note: Could not retrieve data for {}. Analysis is based on available data only.",
                failed.join(", ")
            ));
        }
        self
    }
}

mod lenient {
    use super::*;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(scalar_text(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(Value::deserialize(d)?))
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
            other => scalar_text(other).into_iter().collect(),
        })
    }
}
