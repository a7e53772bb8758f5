//! Best-effort ticker detection in free text.
//!
//! Two passes: `$`-prefixed tokens of 2-5 letters (any case, upper-cased), then
//! bare all-caps words of 2-5 letters that are not on the stoplist. The second
//! pass both misses lower-case tickers and picks up shouted words that happen
//! not to be listed; callers treat the output as candidates, not facts.

use regex::Regex;
use std::sync::LazyLock;

static DOLLAR_TICKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z]{2,5})\b").expect("dollar ticker pattern"));
static BARE_TICKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,5}\b").expect("bare ticker pattern"));

/// Common English words and trading jargon that look like tickers when capitalised.
pub const STOPLIST: &[&str] = &[
    "THE", "AND", "FOR", "ARE", "BUT", "NOT", "YOU", "ALL", "CAN", "HER", "WAS", "ONE", "OUR",
    "OUT", "DAY", "GET", "HAS", "HIM", "HIS", "HOW", "ITS", "MAY", "NEW", "NOW", "OLD", "SEE",
    "TWO", "WAY", "WHO", "BOY", "DID", "LET", "PUT", "SAY", "SHE", "TOO", "USE", "WHAT", "WILL",
    "WITH", "HAVE", "FROM", "THEY", "KNOW", "WANT", "BEEN", "GOOD", "MUCH", "SOME", "TIME",
    "VERY", "WHEN", "COME", "HERE", "JUST", "LIKE", "LONG", "MAKE", "MANY", "OVER", "SUCH",
    "TAKE", "THAN", "THEM", "WELL", "WERE", "BUYS", "THEN", "BEST", "LOOK", "NICE", "THINK",
    "ABOUT", "STOCK", "STOCKS", "BUY", "SELL", "HOLD", "TRADE", "INVEST", "MARKET", "PRICE",
    "TODAY", "ANALYSIS",
];

pub trait SymbolExtractor: Send + Sync {
    /// Candidate symbols, upper-case, deduplicated, in first-seen order.
    fn extract(&self, text: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexSymbolExtractor;

impl SymbolExtractor for RegexSymbolExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        extract_symbols(text)
    }
}

pub fn extract_symbols(text: &str) -> Vec<String> {
    let dollar = DOLLAR_TICKER
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_uppercase());

    let bare = BARE_TICKER
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|s| !STOPLIST.contains(s))
        .map(str::to_string);

    let mut out: Vec<String> = Vec::new();
    for symbol in dollar.chain(bare) {
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}
