pub mod error;
pub mod processor;
pub mod prompt;
pub mod suggest;
pub mod symbols;

pub use error::{FailedSymbol, IntentError, IntentResponse};
pub use processor::{process_intent, IntentProcessor};
pub use symbols::{extract_symbols, RegexSymbolExtractor, SymbolExtractor};
