use crate::config::Settings;
use crate::domain::analysis::{AnalysisReport, AnalysisRequest};
use crate::intent::error::{FailedSymbol, IntentError, IntentResponse};
use crate::intent::prompt::{analysis_prompt, SUGGESTED_HEADER, SYSTEM_PROMPT};
use crate::intent::suggest::{suggest_symbols, wants_recommendations};
use crate::intent::symbols::{RegexSymbolExtractor, SymbolExtractor};
use crate::llm::json::parse_and_validate;
use crate::llm::AnthropicClient;
use crate::market::yahoo::YahooFinanceProvider;
use crate::market::{FinancialDataService, SnapshotCache};
use chrono::Utc;
use std::sync::Arc;

const MIN_QUESTION_CHARS: usize = 5;
const MAX_SYMBOLS: usize = 3;

/// Question in, validated Zanger analysis out.
#[derive(Clone)]
pub struct IntentProcessor {
    data: FinancialDataService,
    llm: AnthropicClient,
    extractor: Arc<dyn SymbolExtractor>,
}

impl IntentProcessor {
    pub fn from_settings(settings: &Settings, cache: Arc<SnapshotCache>) -> anyhow::Result<Self> {
        let provider = YahooFinanceProvider::from_settings(settings)?;
        let data = FinancialDataService::new(Arc::new(provider), cache);
        let llm = AnthropicClient::from_settings(settings)?;
        Ok(Self::new(data, llm))
    }

    pub fn new(data: FinancialDataService, llm: AnthropicClient) -> Self {
        Self {
            data,
            llm,
            extractor: Arc::new(RegexSymbolExtractor),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn SymbolExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub async fn process_intent(&self, question: &str) -> Result<AnalysisReport, IntentError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(IntentError::InvalidInput(
                "user_question must be a non-empty string".to_string(),
            ));
        }
        if trimmed.chars().count() < MIN_QUESTION_CHARS {
            return Err(IntentError::InvalidInput(
                "user_question too short".to_string(),
            ));
        }

        let mut request = AnalysisRequest {
            question: question.to_string(),
            symbols: self.extractor.extract(question),
        };
        let mut suggested = false;
        if request.symbols.is_empty() && wants_recommendations(question) {
            request.symbols = suggest_symbols(&self.llm, question).await;
            suggested = !request.symbols.is_empty();
        }
        request.symbols.truncate(MAX_SYMBOLS);
        tracing::info!(symbols = ?request.symbols, suggested, "processing question");

        let mut blocks: Vec<String> = Vec::new();
        let mut failed: Vec<FailedSymbol> = Vec::new();
        for symbol in &request.symbols {
            match self.data.format_for_model(symbol).await {
                Ok(block) => blocks.push(block),
                Err(err) => {
                    tracing::warn!(symbol = %symbol, error = %err, "market data unavailable");
                    failed.push(FailedSymbol {
                        symbol: symbol.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        if blocks.is_empty() {
            return Err(IntentError::data_unavailable(failed));
        }

        if suggested {
            blocks.insert(0, SUGGESTED_HEADER.to_string());
        }
        let prompt = analysis_prompt(&request.question, &blocks.join("\n\n"));

        let body = self.llm.complete(SYSTEM_PROMPT, &prompt).await?;
        let analysis =
            parse_and_validate(&body).map_err(|e| IntentError::Validation(e.0))?;

        let failed_symbols: Vec<String> = failed.into_iter().map(|f| f.symbol).collect();
        let report = AnalysisReport::new(analysis, Utc::now()).with_failed_symbols(&failed_symbols);
        tracing::info!(
            ticker = %report.analysis.trading_details.ticker,
            action = %report.analysis.recommendation.action,
            "analysis complete"
        );
        Ok(report)
    }
}

/// One-shot entry point: build a processor from `settings` (with an optional
/// key override) and answer `question`. Never fails; errors come back as the
/// failure variant.
pub async fn process_intent(
    settings: &Settings,
    cache: Arc<SnapshotCache>,
    question: &str,
    api_key: Option<String>,
) -> IntentResponse {
    let settings = settings.clone().with_api_key(api_key);
    let result = match IntentProcessor::from_settings(&settings, cache) {
        Ok(processor) => processor.process_intent(question).await,
        Err(err) => {
            tracing::error!(error = %err, "failed to build intent processor");
            Err(IntentError::Unexpected(format!("{err:#}")))
        }
    };
    IntentResponse::from(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::retry::RetryPolicy;
    use crate::testing::{
        analysis_json, api_body, bars, FakeMarket, RecordingSleeper, Scripted, ScriptedTransport,
    };
    use serde_json::json;
    use std::time::Duration;

    struct Harness {
        processor: IntentProcessor,
        transport: Arc<ScriptedTransport>,
        market: Arc<FakeMarket>,
    }

    fn harness(market: FakeMarket, script: Vec<Scripted>) -> Harness {
        let market = Arc::new(market);
        let transport = Arc::new(ScriptedTransport::new(script));
        let data = FinancialDataService::new(market.clone(), Arc::new(SnapshotCache::default()));
        let llm = AnthropicClient::new(transport.clone(), "test-model")
            .with_retry(RetryPolicy::new(3, Duration::from_secs(1)))
            .with_sleeper(Arc::new(RecordingSleeper::default()));
        Harness {
            processor: IntentProcessor::new(data, llm),
            transport,
            market,
        }
    }

    fn market_with(symbols: &[&str]) -> FakeMarket {
        symbols.iter().fold(FakeMarket::default(), |m, s| {
            m.with_history(s, bars(&[1_000_000; 20], 120.0))
        })
    }

    fn user_prompt(t: &ScriptedTransport) -> String {
        t.last_request().unwrap().messages[0].content.clone()
    }

    #[tokio::test]
    async fn short_question_is_rejected_before_any_call() {
        let h = harness(market_with(&["AAPL"]), vec![]);
        let err = h.processor.process_intent("  hi  ").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: user_question too short");
        assert_eq!(h.transport.sent(), 0);
        assert_eq!(h.market.calls(), 0);

        let err = h.processor.process_intent("   ").await.unwrap_err();
        assert!(matches!(err, IntentError::InvalidInput(ref m) if !m.is_empty()));
    }

    #[tokio::test]
    async fn unknown_symbol_fails_without_model_call() {
        let h = harness(FakeMarket::default(), vec![Scripted::analysis("ZZZZZ")]);
        let err = h
            .processor
            .process_intent("What about ZZZZZ?")
            .await
            .unwrap_err();
        assert!(err.data_fetch_failed());
        assert_eq!(
            err.to_string(),
            "Could not retrieve data for ZZZZZ. Please check the symbol and try again."
        );
        assert_eq!(h.transport.sent(), 0);
    }

    #[tokio::test]
    async fn unknown_symbol_reports_no_data_even_when_fundamentals_fail() {
        let market = FakeMarket::default().failing_metadata("ZZZZZ", "HTTP 401 Invalid Crumb");
        let h = harness(market, vec![Scripted::analysis("ZZZZZ")]);
        let err = h
            .processor
            .process_intent("What about ZZZZZ?")
            .await
            .unwrap_err();
        match err {
            IntentError::DataUnavailable { ref failed, .. } => {
                assert_eq!(failed[0].error, "No data available for ZZZZZ");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(h.transport.sent(), 0);
    }

    #[tokio::test]
    async fn provider_outage_is_reported_per_symbol() {
        let h = harness(
            market_with(&["AAPL", "MSFT"]).failing("AAPL").failing("MSFT"),
            vec![Scripted::analysis("AAPL")],
        );
        let err = h
            .processor
            .process_intent("AAPL or MSFT this week?")
            .await
            .unwrap_err();
        match err {
            IntentError::DataUnavailable { ref failed, .. } => {
                assert_eq!(failed.len(), 2);
                assert!(failed[0].error.contains("upstream unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Could not retrieve data for the requested stocks (AAPL, MSFT). Please check the symbols and try again."
        );
        assert_eq!(h.transport.sent(), 0);
    }

    #[tokio::test]
    async fn general_question_without_symbols_fails() {
        let h = harness(market_with(&["AAPL"]), vec![]);
        let err = h
            .processor
            .process_intent("how is the market looking lately")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Could not retrieve market data for analysis."));
        assert_eq!(h.transport.sent(), 0);
    }

    #[tokio::test]
    async fn partial_failure_adds_warning() {
        let h = harness(market_with(&["AAPL"]), vec![Scripted::analysis("AAPL")]);
        let report = h
            .processor
            .process_intent("Compare AAPL and ZZZZZ")
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.methodology, "Dan Zanger");
        assert_eq!(report.analysis.trading_details.ticker, "AAPL");
        assert_eq!(
            report.data_warning.as_deref(),
            Some("Note: Could not retrieve data for ZZZZZ. Analysis is based on available data only.")
        );

        let req = h.transport.last_request().unwrap();
        assert_eq!(req.system.as_deref(), Some(SYSTEM_PROMPT));
        let prompt = user_prompt(&h.transport);
        assert!(prompt.starts_with("USER QUESTION: Compare AAPL and ZZZZZ\n\nLIVE MARKET DATA:\n"));
        assert!(prompt.contains("LIVE MARKET DATA FOR AAPL"));
        assert!(!prompt.contains("FOR ZZZZZ"));
    }

    #[tokio::test]
    async fn at_most_three_symbols_are_fetched() {
        let h = harness(
            market_with(&["AAPL", "MSFT", "NVDA", "AMD"]),
            vec![Scripted::analysis("NVDA")],
        );
        let report = h
            .processor
            .process_intent("AAPL MSFT NVDA AMD which one?")
            .await
            .unwrap();
        assert!(report.data_warning.is_none());

        let prompt = user_prompt(&h.transport);
        for sym in ["AAPL", "MSFT", "NVDA"] {
            assert!(prompt.contains(&format!("LIVE MARKET DATA FOR {sym}")), "{sym}");
        }
        assert!(!prompt.contains("LIVE MARKET DATA FOR AMD"));
    }

    #[tokio::test]
    async fn recommendation_request_uses_suggestions() {
        let suggestion = api_body("[\"NVDA\"]").to_string();
        let h = harness(
            market_with(&["NVDA"]),
            vec![Scripted::status(200, &suggestion), Scripted::analysis("NVDA")],
        );
        let report = h
            .processor
            .process_intent("what are some good buys right now?")
            .await
            .unwrap();
        assert_eq!(report.analysis.trading_details.ticker, "NVDA");
        assert_eq!(h.transport.sent(), 2);

        let prompt = user_prompt(&h.transport);
        let header = prompt.find(SUGGESTED_HEADER).unwrap();
        let data = prompt.find("LIVE MARKET DATA FOR NVDA").unwrap();
        assert!(header < data);
    }

    #[tokio::test]
    async fn failed_suggestions_fall_through_to_no_data() {
        let h = harness(market_with(&["NVDA"]), vec![Scripted::status(500, "down")]);
        let err = h
            .processor
            .process_intent("suggest something to buy")
            .await
            .unwrap_err();
        assert!(matches!(err, IntentError::DataUnavailable { ref failed, .. } if failed.is_empty()));
        assert_eq!(h.transport.sent(), 1);
    }

    struct Fixed(&'static str);

    impl SymbolExtractor for Fixed {
        fn extract(&self, _text: &str) -> Vec<String> {
            vec![self.0.to_string()]
        }
    }

    #[tokio::test]
    async fn custom_extractor_replaces_regex() {
        let h = harness(market_with(&["AAPL"]), vec![Scripted::analysis("AAPL")]);
        let processor = h.processor.with_extractor(Arc::new(Fixed("AAPL")));
        let report = processor
            .process_intent("what do you think about apple")
            .await
            .unwrap();
        assert_eq!(report.analysis.trading_details.ticker, "AAPL");
        assert!(user_prompt(&h.transport).contains("LIVE MARKET DATA FOR AAPL"));
    }

    #[tokio::test]
    async fn timeouts_recommend_retry() {
        let h = harness(
            market_with(&["AAPL"]),
            vec![
                Scripted::timeout("a"),
                Scripted::timeout("b"),
                Scripted::timeout("c"),
            ],
        );
        let err = h.processor.process_intent("Is AAPL a buy?").await.unwrap_err();
        assert_eq!(err.to_string(), "API request timed out - please try again");
        assert_eq!(err.retry_recommended(), Some(true));
    }

    #[tokio::test]
    async fn invalid_reply_is_not_retried() {
        let mut analysis = analysis_json("AAPL");
        analysis["trading_details"] = json!({"entry_price": "$1.00"});
        let reply = api_body(&analysis.to_string()).to_string();
        let h = harness(market_with(&["AAPL"]), vec![Scripted::status(200, &reply)]);

        let err = h.processor.process_intent("Is AAPL a buy?").await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Response parsing failed: Missing trading ticker."));
        assert_eq!(err.retry_recommended(), Some(false));
        assert_eq!(h.transport.sent(), 1);
    }

    #[tokio::test]
    async fn missing_key_surfaces_as_unexpected() {
        let settings = Settings {
            anthropic_api_key: None,
            ..Settings::default()
        };
        let res = process_intent(
            &settings,
            Arc::new(SnapshotCache::default()),
            "Is AAPL a buy?",
            None,
        )
        .await;
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["kind"], json!("unexpected"));
        assert!(v["error"].as_str().unwrap().contains("ANTHROPIC_API_KEY"));
    }
}
