use crate::config::Settings;
use crate::market::provider::{
    CompanyProfile, DailyBar, HistoryRange, MarketDataProvider, QuarterlyNetIncome,
};
use anyhow::{Context, Result};
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use yahoo_finance_api as yahoo;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const HISTORY_INTERVAL: &str = "1d";
const UNKNOWN_SYMBOL_MARKERS: [&str; 5] = ["NoQuotes", "NoResult", "EmptyDataSet", "Not Found", "404"];
const QUOTE_SUMMARY_PATH: &str = "/v10/finance/quoteSummary";
const PROFILE_MODULES: &str = "summaryDetail,defaultKeyStatistics,financialData,assetProfile";
const INCOME_MODULES: &str = "incomeStatementHistoryQuarterly";
const NOT_FOUND_CODE: &str = "Not Found";

/// Daily history goes through `yahoo_finance_api`; fundamentals come from the
/// quoteSummary endpoint, which that crate does not cover.
#[derive(Debug, Clone)]
pub struct YahooFinanceProvider {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl YahooFinanceProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.market_data_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url: settings.market_data_base_url.clone(),
            timeout: settings.market_data_timeout,
        })
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let settings = Settings {
            market_data_base_url: base_url.into(),
            market_data_timeout: timeout,
            ..Settings::default()
        };
        Self::from_settings(&settings)
    }

    fn url(&self, path: &str, symbol: &str) -> String {
        format!("{}{}/{}", self.base_url.trim_end_matches('/'), path, symbol)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<(reqwest::StatusCode, T)> {
        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("market data request failed: {url}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;
        let parsed = serde_json::from_str::<T>(&text).with_context(|| {
            format!("market data HTTP {status}: response is not the expected JSON: {text}")
        })?;
        Ok((status, parsed))
    }

    async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<Option<SummaryResult>> {
        let (status, envelope) = self
            .get_json::<SummaryEnvelope>(
                self.url(QUOTE_SUMMARY_PATH, symbol),
                &[("modules", modules)],
            )
            .await?;

        let body = envelope.quote_summary;
        if let Some(err) = body.error {
            if err.code == NOT_FOUND_CODE {
                return Ok(None);
            }
            anyhow::bail!("quote summary error for {symbol}: {}", err.describe());
        }
        anyhow::ensure!(status.is_success(), "quote summary HTTP {status} for {symbol}");

        Ok(body.result.and_then(|r| r.into_iter().next()))
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn daily_history(&self, symbol: &str, range: HistoryRange) -> Result<Vec<DailyBar>> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| anyhow::anyhow!("failed to build yahoo connector: {e}"))?;

        let fetched = tokio::time::timeout(
            self.timeout,
            connector.get_quote_range(symbol, HISTORY_INTERVAL, range.as_query()),
        )
        .await
        .with_context(|| format!("history request for {symbol} timed out after {:?}", self.timeout))?;

        let quotes = match fetched.and_then(|response| response.quotes()) {
            Ok(quotes) => quotes,
            Err(err) if is_unknown_symbol(&err) => {
                tracing::debug!(symbol, range = range.as_query(), error = %err, "history reports unknown symbol");
                return Ok(Vec::new());
            }
            Err(err) => anyhow::bail!("history error for {symbol}: {err:?}"),
        };

        Ok(quotes.iter().filter_map(bar_from_quote).collect())
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let Some(summary) = self.quote_summary(symbol, PROFILE_MODULES).await? else {
            return Ok(CompanyProfile::default());
        };
        Ok(summary.into_profile())
    }

    async fn quarterly_net_income(&self, symbol: &str) -> Result<Vec<QuarterlyNetIncome>> {
        let Some(summary) = self.quote_summary(symbol, INCOME_MODULES).await? else {
            return Ok(Vec::new());
        };
        Ok(summary.into_quarterly_net_income())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl ApiError {
    fn describe(&self) -> String {
        match &self.description {
            Some(d) => format!("{} - {d}", self.code),
            None => self.code.clone(),
        }
    }
}

fn bar_from_quote(q: &yahoo::Quote) -> Option<DailyBar> {
    Some(DailyBar {
        timestamp: DateTime::from_timestamp(q.timestamp as i64, 0)?,
        high: Some(q.high).filter(|v| v.is_finite()),
        low: Some(q.low).filter(|v| v.is_finite()),
        close: Some(q.close).filter(|v| v.is_finite()),
        volume: Some(q.volume),
    })
}

/// Yahoo answers an unknown ticker with a 404 or an empty chart rather than a
/// typed error, so the error text is the only signal.
fn is_unknown_symbol(err: &yahoo::YahooError) -> bool {
    let text = format!("{err} {err:?}");
    UNKNOWN_SYMBOL_MARKERS.iter().any(|m| text.contains(m))
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}` and uses `{}` for absent values.
#[derive(Debug, Default, Deserialize)]
struct RawNumber {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(v: &Option<RawNumber>) -> Option<f64> {
    v.as_ref().and_then(|n| n.raw)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryResult {
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
    financial_data: Option<FinancialData>,
    asset_profile: Option<AssetProfile>,
    income_statement_history_quarterly: Option<IncomeHistory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetail {
    market_cap: Option<RawNumber>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatistics {
    shares_outstanding: Option<RawNumber>,
    trailing_eps: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialData {
    earnings_growth: Option<RawNumber>,
    revenue_growth: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IncomeHistory {
    income_statement_history: Vec<IncomeStatement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IncomeStatement {
    end_date: Option<RawNumber>,
    net_income: Option<RawNumber>,
}

impl SummaryResult {
    fn into_profile(self) -> CompanyProfile {
        let detail = self.summary_detail.unwrap_or_default();
        let stats = self.default_key_statistics.unwrap_or_default();
        let financial = self.financial_data.unwrap_or_default();
        let asset = self.asset_profile.unwrap_or_default();

        CompanyProfile {
            market_cap: raw(&detail.market_cap),
            trailing_pe: raw(&detail.trailing_pe),
            sector: asset.sector.filter(|s| !s.is_empty()),
            industry: asset.industry.filter(|s| !s.is_empty()),
            shares_outstanding: raw(&stats.shares_outstanding),
            trailing_eps: raw(&stats.trailing_eps),
            earnings_growth: raw(&financial.earnings_growth),
            revenue_growth: raw(&financial.revenue_growth),
        }
    }

    fn into_quarterly_net_income(self) -> Vec<QuarterlyNetIncome> {
        let mut out: Vec<QuarterlyNetIncome> = self
            .income_statement_history_quarterly
            .unwrap_or_default()
            .income_statement_history
            .iter()
            .filter_map(|stmt| {
                let end = raw(&stmt.end_date)?;
                let net_income = raw(&stmt.net_income)?;
                let period_end = DateTime::from_timestamp(end as i64, 0)?.date_naive();
                Some(QuarterlyNetIncome {
                    period_end,
                    net_income,
                })
            })
            .collect();
        out.sort_by(|a, b| b.period_end.cmp(&a.period_end));
        out
    }
}
