use crate::domain::snapshot::{EarningsFigure, EarningsView, StockSnapshot};

const NOT_AVAILABLE: &str = "N/A";

/// Groups the integer part of `digits` in threes: `"1234567"` -> `"1,234,567"`.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn thousands(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// `$1,234.50`, `-$3.10`.
pub fn currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${}.{frac}", group_thousands(whole))
}

fn or_na<T>(value: Option<T>, render: impl FnOnce(T) -> String) -> String {
    value.map(render).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn earnings_line(figure: Option<EarningsFigure>) -> String {
    match figure {
        Some(EarningsFigure::NetIncomeBillions(b)) => format!("{}B net income", currency(b)),
        Some(EarningsFigure::TrailingEps(eps)) => format!("{} per share", currency(eps)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Renders the plaintext block handed to the model for one symbol.
pub fn render_for_model(snapshot: &StockSnapshot, earnings: &EarningsView) -> String {
    let updated = snapshot.last_updated.format("%Y-%m-%d %H:%M:%S UTC");
    let text_or_na = |s: &Option<String>| s.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let lines = [
        format!("LIVE MARKET DATA FOR {} (Updated: {updated}):", snapshot.symbol),
        String::new(),
        "PRICE DATA:".to_string(),
        format!("- Current Price: {}", or_na(snapshot.current_price, currency)),
        format!(
            "- 52-Week Range: {} - {}",
            or_na(snapshot.week_52_low, currency),
            or_na(snapshot.week_52_high, currency)
        ),
        String::new(),
        "VOLUME ANALYSIS:".to_string(),
        format!("- Current Volume: {}", or_na(snapshot.volume, thousands)),
        format!(
            "- 20-Day Average Volume: {}",
            or_na(snapshot.avg_volume_20d, thousands)
        ),
        format!(
            "- Volume Ratio: {:.1}% of 20-day average",
            snapshot.volume_ratio_pct
        ),
        String::new(),
        "FUNDAMENTAL DATA:".to_string(),
        format!("- Market Cap: {}", or_na(snapshot.market_cap, currency)),
        format!("- P/E Ratio: {}", or_na(snapshot.pe_ratio, |pe| format!("{pe:.2}"))),
        format!("- Quarterly EPS: {}", or_na(snapshot.quarterly_eps, currency)),
        format!("- Sector: {}", text_or_na(&snapshot.sector)),
        format!("- Industry: {}", text_or_na(&snapshot.industry)),
        String::new(),
        "EARNINGS DATA:".to_string(),
        format!("- Latest Earnings: {}", earnings_line(earnings.latest)),
        format!(
            "- YoY Earnings Growth: {}",
            or_na(earnings.growth_yoy_pct, |g| format!("{g:.1}%"))
        ),
        format!(
            "- Last Earnings Date: {}",
            earnings
                .period
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "Recent".to_string())
        ),
    ];
    lines.join("\n")
}
