//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{
        ChannelProgress, Extractor, ExtractorConfig, ExtractorError, ExtractionRequest, MergeStrategy,
        ProgressEvent,
    };
    use eltariff_domain::traits::{BackendError, Role};
    use eltariff_domain::{ErrorKind, SourceInput, SourceKind, TariffModel};
    use eltariff_gatekeeper::Gatekeeper;
    use eltariff_llm::MockBackend;
    use std::time::Duration;

    const TARIFF_OUTPUT: &str = r#"{
        "tariffs": [{
            "name": "Säkringstariff 16A",
            "validPeriod": {"fromIncluding": "2025-01-01"},
            "companyName": "Exempel Nät AB",
            "companyOrgNo": "556000-0000",
            "fixedPrice": {
                "name": "Fast avgift",
                "components": [{
                    "name": "Abonnemang",
                    "price": {"priceExVat": 3600, "vatRate": 0.25},
                    "pricedPeriod": "P1Y"
                }]
            },
            "energyPrice": {
                "name": "Överföring",
                "components": [{
                    "name": "Energiavgift",
                    "type": "variable",
                    "price": {"priceExVat": 0.24, "vatRate": 0.25},
                    "unit": "kWh"
                }]
            }
        }]
    }"#;

    const TARIFF_TEXT: &str = "Elnätstariff 2025: fast avgift 3 600 kr/år, överföringsavgift 24 öre/kWh";

    fn fast_config() -> ExtractorConfig {
        ExtractorConfig {
            backoff_base_ms: 1,
            backoff_max_ms: 5,
            call_timeout_ms: 1_000,
            ..ExtractorConfig::default()
        }
    }

    fn extractor(backend: &MockBackend, config: ExtractorConfig) -> Extractor {
        Extractor::new(backend.clone(), Gatekeeper::default_config(), config)
    }

    fn text_request() -> ExtractionRequest {
        ExtractionRequest::new(vec![SourceInput::text(TARIFF_TEXT)])
    }

    fn validated(json: &str) -> TariffModel {
        Gatekeeper::default_config().validate_json(json).unwrap().into_model()
    }

    #[tokio::test]
    async fn test_extract_single_text_source() {
        let backend = MockBackend::new(TARIFF_OUTPUT);
        let extraction = extractor(&backend, fast_config())
            .extract(text_request())
            .await
            .unwrap();

        assert_eq!(extraction.model.tariffs[0].name, "Säkringstariff 16A");
        assert_eq!(extraction.metadata.backend, "mock");
        assert_eq!(extraction.metadata.model_attempts, 1);
        assert_eq!(extraction.metadata.backend_calls, 1);
        assert_eq!(extraction.metadata.sources, vec![SourceKind::Text]);
        assert!(extraction.alternatives.is_empty());

        let request = backend.last_request().unwrap();
        assert!(request.messages[0].content.contains("=== SOURCE 1: TEXT ==="));
    }

    #[tokio::test]
    async fn test_malformed_output_retries_are_bounded() {
        let backend = MockBackend::new("Tyvärr, det kan jag inte hjälpa till med.");
        let err = extractor(&backend, fast_config())
            .extract(text_request())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ModelOutputMalformed);
        assert!(matches!(err, ExtractorError::ModelOutputMalformed { attempts: 3, .. }));
        assert_eq!(err.raw_output(), Some("Tyvärr, det kan jag inte hjälpa till med."));
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_corrective_turn_after_malformed_output() {
        let backend = MockBackend::new(TARIFF_OUTPUT).then_respond("not json");
        let extraction = extractor(&backend, fast_config())
            .extract(text_request())
            .await
            .unwrap();
        assert_eq!(extraction.metadata.model_attempts, 2);

        let retry = &backend.requests()[1];
        assert_eq!(retry.messages.len(), 3);
        assert_eq!(retry.messages[1].role, Role::Assistant);
        assert_eq!(retry.messages[1].content, "not json");
        assert_eq!(retry.messages[2].role, Role::User);
        assert!(retry.messages[2].content.contains("no JSON object found"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_retried() {
        let backend = MockBackend::new(TARIFF_OUTPUT)
            .then_error(BackendError::Transport("connection reset".to_string()))
            .then_error(BackendError::RateLimited {
                retry_after: Some(Duration::from_millis(1)),
            });
        let extraction = extractor(&backend, fast_config())
            .extract(text_request())
            .await
            .unwrap();

        assert_eq!(extraction.metadata.model_attempts, 1);
        assert_eq!(extraction.metadata.backend_calls, 3);
    }

    #[tokio::test]
    async fn test_transport_retries_exhausted() {
        let mut backend = MockBackend::new(TARIFF_OUTPUT);
        for _ in 0..4 {
            backend = backend.then_error(BackendError::Server {
                status: 503,
                message: "overloaded".to_string(),
            });
        }
        let err = extractor(&backend, fast_config())
            .extract(text_request())
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(err, ExtractorError::BackendUnavailable { attempts: 4, .. }));
        assert_eq!(backend.call_count(), 4);
    }

    #[tokio::test]
    async fn test_rejected_request_surfaces_immediately() {
        let backend = MockBackend::new(TARIFF_OUTPUT)
            .then_error(BackendError::Rejected("invalid x-api-key".to_string()));
        let err = extractor(&backend, fast_config())
            .extract(text_request())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert!(!err.is_retryable());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_call_timeout_counts_as_transport_failure() {
        let backend = MockBackend::new(TARIFF_OUTPUT).with_delay(Duration::from_millis(200));
        let config = ExtractorConfig {
            call_timeout_ms: 20,
            transport_retries: 1,
            ..fast_config()
        };
        let err = extractor(&backend, config)
            .extract(text_request())
            .await
            .unwrap_err();

        let ExtractorError::BackendUnavailable { source, retryable, .. } = err else {
            panic!("expected BackendUnavailable");
        };
        assert_eq!(source, BackendError::Timeout);
        assert!(retryable);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_schema_violation_is_not_retried() {
        let backend = MockBackend::new(r#"{"tariffs": [{"name": "Enkeltariff"}]}"#);
        let err = extractor(&backend, fast_config())
            .extract(text_request())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SchemaValidationFailed);
        assert!(err.report().unwrap().len() >= 2);
        assert!(err.raw_output().unwrap().contains("Enkeltariff"));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_relevance_guard_blocks_model_call() {
        let backend = MockBackend::new(TARIFF_OUTPUT);
        let request = ExtractionRequest::new(vec![SourceInput::text("Recept på kanelbullar med kardemumma")]);
        let err = extractor(&backend, fast_config()).extract(request).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_sources_rejected() {
        let backend = MockBackend::new(TARIFF_OUTPUT);
        let request = ExtractionRequest::new(vec![SourceInput::text("  \n ")]);
        let err = extractor(&backend, fast_config()).extract(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_structured_source_needs_no_model_call() {
        let backend = MockBackend::new("unused");
        let request = ExtractionRequest::new(vec![SourceInput::structured(TARIFF_OUTPUT)]);
        let extraction = extractor(&backend, fast_config()).extract(request).await.unwrap();

        assert_eq!(extraction.model, validated(TARIFF_OUTPUT));
        assert_eq!(extraction.metadata.sources, vec![SourceKind::Structured]);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_per_source_extraction_is_merged_by_priority() {
        let pdf_output = TARIFF_OUTPUT.replace("3600", "4000");
        // groups run in priority order: url before pdf
        let backend = MockBackend::new("unused")
            .then_respond(TARIFF_OUTPUT)
            .then_respond(pdf_output);
        let request = ExtractionRequest::new(vec![
            SourceInput::pdf("Fast avgift 4 000 kr/år. Överföringsavgift 24 öre/kWh", "tariffer.pdf"),
            SourceInput::url(TARIFF_TEXT, "https://example.se/elnat/tariffer"),
        ]);
        let extraction = extractor(&backend, fast_config()).extract(request).await.unwrap();

        let fee = &extraction.model.tariffs[0].fixed_price.as_ref().unwrap().components[0];
        assert_eq!(fee.price.price_ex_vat, 3600.0);
        assert_eq!(extraction.metadata.sources, vec![SourceKind::Url, SourceKind::Pdf]);

        assert_eq!(extraction.alternatives.len(), 1);
        let alternative = &extraction.alternatives[0];
        assert_eq!(alternative.source, SourceKind::Pdf);
        assert_eq!(alternative.discarded["priceExVat"], serde_json::json!(4000.0));

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].messages[0].content.contains("=== SOURCE 2: URL (https://example.se/elnat/tariffer) ==="));
        assert!(!requests[0].messages[0].content.contains("PDF"));
        assert!(requests[1].messages[0].content.contains("=== SOURCE 1: PDF (tariffer.pdf) ==="));
    }

    #[tokio::test]
    async fn test_seasonal_prices_from_url_and_pdf_are_both_kept() {
        let season = |from: &str, to: &str, price: &str| {
            TARIFF_OUTPUT
                .replace(
                    r#""name": "Energiavgift","#,
                    &format!(r#""name": "Energiavgift", "validPeriod": {{"fromIncluding": "{from}", "toExcluding": "{to}"}},"#),
                )
                .replace("0.24", price)
        };
        let backend = MockBackend::new("unused")
            .then_respond(season("2025-01-01", "2025-04-01", "0.30"))
            .then_respond(season("2025-04-01", "2025-11-01", "0.20"));
        let request = ExtractionRequest::new(vec![
            SourceInput::pdf("Elnätstariff sommar: överföringsavgift 20 öre/kWh april till oktober", "tariffer.pdf"),
            SourceInput::url("Elnätstariff vinter: överföringsavgift 30 öre/kWh januari till mars", "https://example.se/elnat/tariffer"),
        ]);
        let extraction = extractor(&backend, fast_config()).extract(request).await.unwrap();

        let components = &extraction.model.tariffs[0].energy_price.as_ref().unwrap().components;
        assert_eq!(components.len(), 2);
        assert_ne!(components[0].id, components[1].id);
        let prices: Vec<f64> = components.iter().map(|c| c.price.price_ex_vat).collect();
        assert_eq!(prices, vec![0.30, 0.20]);
    }

    #[tokio::test]
    async fn test_combined_strategy_sends_one_request() {
        let backend = MockBackend::new(TARIFF_OUTPUT);
        let config = ExtractorConfig {
            merge_strategy: MergeStrategy::Combined,
            ..fast_config()
        };
        let request = ExtractionRequest::new(vec![
            SourceInput::text("Anteckning: effektavgift saknas för 16A"),
            SourceInput::url(TARIFF_TEXT, "https://example.se/elnat/tariffer"),
        ]);
        let extraction = extractor(&backend, config).extract(request).await.unwrap();

        assert_eq!(backend.call_count(), 1);
        assert_eq!(extraction.metadata.sources, vec![SourceKind::Url]);
        let prompt = &backend.last_request().unwrap().messages[0].content;
        assert!(prompt.contains("=== SOURCE 1: TEXT ==="));
        assert!(prompt.contains("=== SOURCE 2: URL"));
    }

    #[tokio::test]
    async fn test_improve_without_changes_returns_prior() {
        let prior = validated(TARIFF_OUTPUT);
        let backend = MockBackend::new(prior.to_json_pretty().unwrap());
        let extraction = extractor(&backend, fast_config())
            .improve(prior.clone(), "Ingen ändring behövs", Vec::new())
            .await
            .unwrap();

        assert_eq!(extraction.model, prior);
        let prompt = &backend.last_request().unwrap().messages[0].content;
        assert!(prompt.contains("Instruction:\nIngen ändring behövs"));
        assert!(prompt.contains("Säkringstariff 16A"));
    }

    #[tokio::test]
    async fn test_improve_rejects_empty_instruction() {
        let backend = MockBackend::new(TARIFF_OUTPUT);
        let err = extractor(&backend, fast_config())
            .improve(validated(TARIFF_OUTPUT), "   ", Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_improve_skips_relevance_guard_for_evidence() {
        let backend = MockBackend::new(TARIFF_OUTPUT.replace("3600", "4200"));
        let extraction = extractor(&backend, fast_config())
            .improve(
                validated(TARIFF_OUTPUT),
                "Uppdatera fast avgift",
                vec![SourceInput::text("Nytt pris: 4 200")],
            )
            .await
            .unwrap();

        let fee = &extraction.model.tariffs[0].fixed_price.as_ref().unwrap().components[0];
        assert_eq!(fee.price.price_ex_vat, 4200.0);
        assert!(backend.last_request().unwrap().messages[0].content.contains("Additional evidence"));
    }

    #[tokio::test]
    async fn test_progress_events() {
        let backend = MockBackend::new(TARIFF_OUTPUT).then_respond("{}");
        let (sink, mut receiver) = ChannelProgress::new();
        extractor(&backend, fast_config())
            .with_progress(sink)
            .extract(text_request())
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        assert_eq!(events.first(), Some(&ProgressEvent::Normalizing));
        assert_eq!(events.last(), Some(&ProgressEvent::Done));
        assert!(events.contains(&ProgressEvent::SendingToModel { attempt: 2 }));
        assert!(events.iter().any(|e| e.stage() == "retrying"));
        assert!(events.contains(&ProgressEvent::Validating));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let backend = MockBackend::new(TARIFF_OUTPUT);
        let config = ExtractorConfig {
            call_timeout_ms: 0,
            ..ExtractorConfig::default()
        };
        let err = extractor(&backend, config).extract(text_request()).await.unwrap_err();
        assert!(matches!(err, ExtractorError::Config(_)));
        assert_eq!(backend.call_count(), 0);
    }
}
