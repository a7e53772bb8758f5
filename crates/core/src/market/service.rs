use crate::domain::snapshot::{
    round_to, volume_ratio_pct, EarningsFigure, EarningsView, StockSnapshot,
};
use crate::market::cache::SnapshotCache;
use crate::market::error::MarketError;
use crate::market::format;
use crate::market::provider::{CompanyProfile, DailyBar, HistoryRange, MarketDataProvider};
use chrono::Utc;
use std::sync::Arc;

const VOLUME_WINDOW: usize = 20;

/// Fetches, caches, validates and renders per-symbol market data.
#[derive(Clone)]
pub struct FinancialDataService {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<SnapshotCache>,
}

impl FinancialDataService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: Arc<SnapshotCache>) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    pub async fn fetch(&self, symbol: &str) -> Result<StockSnapshot, MarketError> {
        if let Some(cached) = self.cache.get(symbol).await {
            tracing::debug!(symbol, "snapshot cache hit");
            return Ok(cached.as_cached());
        }
        tracing::debug!(symbol, provider = self.provider.provider_name(), "snapshot cache miss");

        let provider_err = |e: anyhow::Error| MarketError::Provider {
            symbol: symbol.to_string(),
            reason: format!("{e:#}"),
        };

        let recent = self
            .provider
            .daily_history(symbol, HistoryRange::OneMonth)
            .await
            .map_err(provider_err)?;
        let Some(last) = recent.last() else {
            return Err(MarketError::NotFound {
                symbol: symbol.to_string(),
            });
        };

        let year = self
            .provider
            .daily_history(symbol, HistoryRange::OneYear)
            .await
            .map_err(provider_err)?;

        // Fundamentals are optional; price history alone makes a snapshot.
        let profile = match self.provider.company_profile(symbol).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(symbol, error = %err, "company profile unavailable");
                CompanyProfile::default()
            }
        };

        let current_volume = last.volume;
        let avg_volume = average_volume(&recent);
        let volume_ratio = match (current_volume, avg_volume) {
            (Some(v), Some(avg)) => round_to(volume_ratio_pct(v as f64, avg), 1),
            _ => 0.0,
        };

        let quarterly_eps = match self.provider.quarterly_net_income(symbol).await {
            Ok(rows) => rows
                .first()
                .zip(profile.shares_outstanding.filter(|s| *s > 0.0))
                .map(|(latest, shares)| round_to(latest.net_income / shares, 2))
                .or(profile.trailing_eps),
            Err(err) => {
                tracing::warn!(symbol, error = %err, "quarterly financials unavailable; using trailing EPS");
                profile.trailing_eps
            }
        };

        let snapshot = StockSnapshot {
            symbol: symbol.to_string(),
            current_price: last.close.map(|p| round_to(p, 2)),
            volume: current_volume,
            avg_volume_20d: avg_volume.map(|v| v as u64),
            volume_ratio_pct: volume_ratio,
            week_52_high: max_of(year.iter().filter_map(|b| b.high)).map(|v| round_to(v, 2)),
            week_52_low: min_of(year.iter().filter_map(|b| b.low)).map(|v| round_to(v, 2)),
            market_cap: profile.market_cap,
            pe_ratio: profile.trailing_pe,
            quarterly_eps,
            earnings_growth: profile.earnings_growth,
            revenue_growth: profile.revenue_growth,
            sector: profile.sector,
            industry: profile.industry,
            last_updated: Utc::now(),
            from_cache: false,
        };

        self.cache.insert(symbol, snapshot.clone()).await;
        Ok(snapshot)
    }

    /// Fetches `symbol` and rejects snapshots lacking price or volume data.
    pub async fn validate(&self, symbol: &str) -> Result<StockSnapshot, MarketError> {
        let snapshot = self.fetch(symbol).await?;
        let fields = snapshot.missing_essential_fields();
        if !fields.is_empty() {
            return Err(MarketError::MissingFields {
                symbol: symbol.to_string(),
                fields,
            });
        }
        Ok(snapshot)
    }

    /// Secondary earnings view: quarter-over-quarter net income when two quarters
    /// are on file, trailing metadata otherwise.
    pub async fn earnings(&self, symbol: &str) -> Result<EarningsView, MarketError> {
        match self.provider.quarterly_net_income(symbol).await {
            Ok(rows) if rows.len() >= 2 => {
                let latest = rows[0].net_income / 1e9;
                let previous = rows[1].net_income / 1e9;
                let growth = (previous != 0.0)
                    .then(|| round_to((latest - previous) / previous.abs() * 100.0, 1));
                return Ok(EarningsView {
                    latest: Some(EarningsFigure::NetIncomeBillions(round_to(latest, 2))),
                    growth_yoy_pct: growth,
                    period: Some(rows[0].period_end),
                });
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(symbol, error = %err, "quarterly income unavailable; falling back to trailing data");
            }
        }

        let profile = self
            .provider
            .company_profile(symbol)
            .await
            .map_err(|e| MarketError::Provider {
                symbol: symbol.to_string(),
                reason: format!("{e:#}"),
            })?;
        Ok(EarningsView {
            latest: profile.trailing_eps.map(EarningsFigure::TrailingEps),
            growth_yoy_pct: profile.earnings_growth.map(|g| round_to(g * 100.0, 1)),
            period: None,
        })
    }

    /// Validated snapshot plus earnings, rendered as the model's data block.
    pub async fn format_for_model(&self, symbol: &str) -> Result<String, MarketError> {
        let snapshot = self.validate(symbol).await?;
        let earnings = match self.earnings(symbol).await {
            Ok(view) => view,
            Err(err) => {
                tracing::warn!(symbol, error = %err, "earnings view unavailable");
                EarningsView {
                    latest: None,
                    growth_yoy_pct: None,
                    period: None,
                }
            }
        };
        Ok(format::render_for_model(&snapshot, &earnings))
    }
}

fn average_volume(bars: &[DailyBar]) -> Option<f64> {
    let start = bars.len().saturating_sub(VOLUME_WINDOW);
    let volumes: Vec<f64> = bars[start..]
        .iter()
        .filter_map(|b| b.volume)
        .map(|v| v as f64)
        .collect();
    if volumes.is_empty() {
        return None;
    }
    Some(volumes.iter().sum::<f64>() / volumes.len() as f64)
}

fn max_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
}

fn min_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
}
