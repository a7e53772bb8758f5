//! Fakes for the upstream collaborators, shared by unit tests.

use crate::domain::snapshot::StockSnapshot;
use crate::llm::retry::Sleeper;
use crate::llm::transport::{CreateMessageRequest, MessagesTransport, RawResponse, TransportError};
use crate::market::provider::{
    CompanyProfile, DailyBar, HistoryRange, MarketDataProvider, QuarterlyNetIncome,
};
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn snapshot(symbol: &str) -> StockSnapshot {
    StockSnapshot {
        symbol: symbol.to_string(),
        current_price: Some(187.25),
        volume: Some(52_345_678),
        avg_volume_20d: Some(48_000_000),
        volume_ratio_pct: 109.1,
        week_52_high: Some(199.62),
        week_52_low: Some(164.08),
        market_cap: Some(2.9e12),
        pe_ratio: Some(29.4),
        quarterly_eps: Some(1.57),
        earnings_growth: Some(0.11),
        revenue_growth: Some(0.05),
        sector: Some("Technology".to_string()),
        industry: Some("Consumer Electronics".to_string()),
        last_updated: Utc.with_ymd_and_hms(2026, 3, 2, 15, 30, 0).unwrap(),
        from_cache: false,
    }
}

/// Daily bars with the given volumes, oldest first, all closing at `close`.
pub fn bars(volumes: &[u64], close: f64) -> Vec<DailyBar> {
    let start = Utc.with_ymd_and_hms(2026, 1, 5, 21, 0, 0).unwrap();
    volumes
        .iter()
        .enumerate()
        .map(|(i, v)| DailyBar {
            timestamp: start + chrono::Duration::days(i as i64),
            high: Some(close + 1.0),
            low: Some(close - 1.0),
            close: Some(close),
            volume: Some(*v),
        })
        .collect()
}

pub fn analysis_json(ticker: &str) -> Value {
    json!({
        "analysis_summary": format!("{ticker} is basing near highs"),
        "symbols_analyzed": [ticker],
        "current_data": {
            "price": "$131.50",
            "volume_vs_avg": "145%",
            "earnings_growth": "120%",
            "sector_performance": "leading"
        },
        "zanger_analysis": {
            "pattern_type": "flat-base",
            "volume_ratio": "45% above 20-day avg",
            "breakout_level": "$135.00",
            "meets_zanger_criteria": "pass"
        },
        "recommendation": {
            "action": "BUY",
            "confidence": "medium",
            "reasoning": "Tight base with rising volume"
        },
        "trading_details": {
            "ticker": ticker,
            "entry_price": "$135.10",
            "stop_loss": "$124.29",
            "target_price": "$162.00",
            "position_size": "5% of portfolio",
            "time_horizon": "6 weeks"
        },
        "risk_assessment": {
            "risk_level": "medium",
            "key_risks": ["earnings gap", "sector rotation"],
            "risk_reward_ratio": "2.5:1"
        }
    })
}

/// Messages API response body carrying `text` as its only content block.
pub fn api_body(text: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn"
    })
}

#[derive(Debug, Clone)]
pub enum Scripted {
    Response(StatusCode, String),
    Timeout(String),
    RequestError(String),
}

impl Scripted {
    pub fn status(code: u16, body: &str) -> Self {
        Self::Response(StatusCode::from_u16(code).unwrap(), body.to_string())
    }

    pub fn timeout(msg: &str) -> Self {
        Self::Timeout(msg.to_string())
    }

    pub fn request_error(msg: &str) -> Self {
        Self::RequestError(msg.to_string())
    }

    pub fn analysis(ticker: &str) -> Self {
        Self::status(200, &api_body(&analysis_json(ticker).to_string()).to_string())
    }
}

/// Replays canned responses in order and records what was sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<(CreateMessageRequest, Duration)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(CreateMessageRequest, Duration)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<CreateMessageRequest> {
        self.requests.lock().unwrap().last().map(|(r, _)| r.clone())
    }
}

#[async_trait::async_trait]
impl MessagesTransport for ScriptedTransport {
    async fn send(
        &self,
        req: &CreateMessageRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push((req.clone(), timeout));
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Response(status, body)) => Ok(RawResponse { status, body }),
            Some(Scripted::Timeout(msg)) => Err(TransportError::Timeout(msg)),
            Some(Scripted::RequestError(msg)) => Err(TransportError::Request(msg)),
            None => Err(TransportError::Request("script exhausted".to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// In-memory market data. Unknown symbols have empty history.
#[derive(Debug, Default)]
pub struct FakeMarket {
    history: HashMap<String, Vec<DailyBar>>,
    profiles: HashMap<String, CompanyProfile>,
    income: HashMap<String, Vec<QuarterlyNetIncome>>,
    failing: HashSet<String>,
    metadata_errors: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeMarket {
    pub fn with_history(mut self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.history.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_profile(mut self, symbol: &str, profile: CompanyProfile) -> Self {
        self.profiles.insert(symbol.to_string(), profile);
        self
    }

    pub fn with_income(mut self, symbol: &str, rows: Vec<QuarterlyNetIncome>) -> Self {
        self.income.insert(symbol.to_string(), rows);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    /// Profile and income queries for `symbol` fail with `message`; history still answers.
    pub fn failing_metadata(mut self, symbol: &str, message: &str) -> Self {
        self.metadata_errors.insert(symbol.to_string(), message.to_string());
        self
    }

    /// Total upstream queries served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, symbol: &str) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(symbol) {
            anyhow::bail!("upstream unavailable");
        }
        Ok(())
    }

    fn record_metadata(&self, symbol: &str) -> anyhow::Result<()> {
        self.record(symbol)?;
        if let Some(message) = self.metadata_errors.get(symbol) {
            anyhow::bail!("{message}");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for FakeMarket {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn daily_history(&self, symbol: &str, _range: HistoryRange) -> anyhow::Result<Vec<DailyBar>> {
        self.record(symbol)?;
        Ok(self.history.get(symbol).cloned().unwrap_or_default())
    }

    async fn company_profile(&self, symbol: &str) -> anyhow::Result<CompanyProfile> {
        self.record_metadata(symbol)?;
        Ok(self.profiles.get(symbol).cloned().unwrap_or_default())
    }

    async fn quarterly_net_income(&self, symbol: &str) -> anyhow::Result<Vec<QuarterlyNetIncome>> {
        self.record_metadata(symbol)?;
        Ok(self.income.get(symbol).cloned().unwrap_or_default())
    }
}
