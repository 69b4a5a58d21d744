//! Integration tests for the AI extractor

#[cfg(test)]
mod tests {
    use crate::{AiExtractor, ExtractorConfig, ExtractorError};
    use menudraft_domain::{ServiceType, FALLBACK_WARNING};
    use menudraft_llm::MockProvider;
    use std::sync::Arc;

    const DINNER_RESPONSE: &str = r#"{
        "rawText": "CENA\nSopa\nPescado",
        "warnings": [],
        "detectedServices": [{
            "serviceType": "dinner",
            "startsAtGuess": "21:00",
            "paxGuess": 60,
            "formatGuess": "seated",
            "sections": [{"title": "CENA", "items": ["Sopa", "Pescado"]}]
        }]
    }"#;

    #[tokio::test]
    async fn test_full_extraction_flow() {
        let llm = Arc::new(MockProvider::new(DINNER_RESPONSE));
        let extractor = AiExtractor::from_arc(llm.clone(), ExtractorConfig::default()).unwrap();

        let draft = extractor
            .extract_from_document(b"%PDF-1.7 fake", "application/pdf", "cena.pdf")
            .await
            .unwrap();

        assert_eq!(draft.raw_text, "CENA\nSopa\nPescado");
        assert_eq!(draft.detected_services[0].service_type, ServiceType::Dinner);
        assert_eq!(llm.call_count(), 1);

        let document = llm.last_document().unwrap();
        assert_eq!(document.mime_type, "application/pdf");
        assert_eq!(document.data_base64, "JVBERi0xLjcgZmFrZQ==");
    }

    #[tokio::test]
    async fn test_extraction_with_invalid_json() {
        let llm = MockProvider::new("This is not JSON");
        let extractor = AiExtractor::new(llm, ExtractorConfig::default()).unwrap();

        let draft = extractor
            .extract_from_document(b"\x89PNG", "image/png", "menu.png")
            .await
            .unwrap();

        assert_eq!(draft.raw_text, "");
        assert_eq!(draft.warnings, vec![FALLBACK_WARNING.to_string()]);
        assert_eq!(draft.detected_services.len(), 1);
        assert_eq!(draft.detected_services[0].service_type, ServiceType::Other);
        assert_eq!(draft.detected_services[0].sections[0].title, "OCR");
        assert_eq!(draft.detected_services[0].sections[0].items, vec!["menu.png"]);
    }

    #[tokio::test]
    async fn test_empty_services_get_placeholder() {
        let llm = MockProvider::new(r#"{"rawText": "blurry", "detectedServices": []}"#);
        let extractor = AiExtractor::new(llm, ExtractorConfig::default()).unwrap();

        let draft = extractor
            .extract_from_document(b"img", "image/jpeg", "foto.jpg")
            .await
            .unwrap();

        assert_eq!(draft.raw_text, "blurry");
        assert_eq!(draft.detected_services.len(), 1);
        assert_eq!(draft.detected_services[0].sections[0].items, vec!["foto.jpg"]);
        assert!(draft.warnings.contains(&FALLBACK_WARNING.to_string()));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let llm = MockProvider::new("{}");
        llm.push_error("connection reset");
        let extractor = AiExtractor::new(llm, ExtractorConfig::default()).unwrap();

        let result = extractor
            .extract_from_document(b"img", "image/png", "menu.png")
            .await;

        match result {
            Err(ExtractorError::Llm(msg)) => assert!(msg.contains("connection reset")),
            other => panic!("Expected Llm error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let llm = Arc::new(MockProvider::new(DINNER_RESPONSE));
        let extractor = AiExtractor::from_arc(llm.clone(), ExtractorConfig::default()).unwrap();

        let result = extractor.extract_from_document(b"", "image/png", "x.png").await;
        assert!(matches!(result, Err(ExtractorError::EmptyDocument)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_document_too_large() {
        let config = ExtractorConfig {
            max_document_bytes: 4,
            ..Default::default()
        };
        let extractor = AiExtractor::new(MockProvider::new(DINNER_RESPONSE), config).unwrap();

        let result = extractor
            .extract_from_document(b"12345", "image/png", "x.png")
            .await;
        assert!(matches!(result, Err(ExtractorError::DocumentTooLarge(5, 4))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExtractorConfig {
            extraction_timeout_secs: 0,
            ..Default::default()
        };
        let result = AiExtractor::new(MockProvider::new("{}"), config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[test]
    fn test_model_name() {
        let extractor = AiExtractor::new(MockProvider::new("{}"), ExtractorConfig::default()).unwrap();
        assert_eq!(extractor.model_name(), "mock");
    }
}
