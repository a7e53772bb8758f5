use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time bundle of price, volume and fundamental metrics for one ticker.
///
/// Built once per upstream fetch and never mutated; a refetch replaces the
/// whole value in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub volume: Option<u64>,
    pub avg_volume_20d: Option<u64>,
    pub volume_ratio_pct: f64,
    #[serde(rename = "52_week_high")]
    pub week_52_high: Option<f64>,
    #[serde(rename = "52_week_low")]
    pub week_52_low: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub quarterly_eps: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub from_cache: bool,
}

impl StockSnapshot {
    /// Names of the fields a snapshot must carry before it is worth showing to the model.
    pub fn missing_essential_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.current_price.is_none() {
            missing.push("current_price");
        }
        if self.volume.is_none() {
            missing.push("volume");
        }
        if self.avg_volume_20d.is_none() {
            missing.push("avg_volume_20d");
        }
        missing
    }

    pub fn as_cached(&self) -> Self {
        Self {
            from_cache: true,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum EarningsFigure {
    /// Latest quarterly net income, in billions.
    NetIncomeBillions(f64),
    TrailingEps(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsView {
    pub latest: Option<EarningsFigure>,
    pub growth_yoy_pct: Option<f64>,
    /// Period end of the latest quarter; `None` when the view came from trailing metadata.
    pub period: Option<NaiveDate>,
}

/// Volume of the latest session as a percentage of the trailing average.
pub fn volume_ratio_pct(current_volume: f64, avg_volume: f64) -> f64 {
    if avg_volume > 0.0 {
        current_volume / avg_volume * 100.0
    } else {
        0.0
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
