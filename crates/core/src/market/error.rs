use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    /// The provider returned no price history for the symbol.
    #[error("No data available for {symbol}")]
    NotFound { symbol: String },

    #[error("Failed to fetch data for {symbol}: {reason}")]
    Provider { symbol: String, reason: String },

    #[error("Missing essential data for {symbol}: {}", fields.join(", "))]
    MissingFields {
        symbol: String,
        fields: Vec<&'static str>,
    },
}

impl MarketError {
    pub fn symbol(&self) -> &str {
        match self {
            Self::NotFound { symbol }
            | Self::Provider { symbol, .. }
            | Self::MissingFields { symbol, .. } => symbol,
        }
    }
}
