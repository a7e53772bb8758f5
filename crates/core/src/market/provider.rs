use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryRange {
    OneMonth,
    OneYear,
}

impl HistoryRange {
    pub fn as_query(self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::OneYear => "1y",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub timestamp: DateTime<Utc>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub shares_outstanding: Option<f64>,
    pub trailing_eps: Option<f64>,
    /// Year-over-year earnings growth as a fraction (0.25 == 25%).
    pub earnings_growth: Option<f64>,
    pub revenue_growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyNetIncome {
    pub period_end: NaiveDate,
    pub net_income: f64,
}

/// Upstream market data source. Every method is a single request/response round trip.
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily bars, oldest first. An unknown symbol yields an empty vector.
    async fn daily_history(&self, symbol: &str, range: HistoryRange) -> Result<Vec<DailyBar>>;

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile>;

    /// Quarterly net income, most recent quarter first.
    async fn quarterly_net_income(&self, symbol: &str) -> Result<Vec<QuarterlyNetIncome>>;
}
