/*!
 * Tests for the translation layer seen from outside the crate
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use yadtwai::app_config::{TranslationConfig, TranslationProvider};
use yadtwai::document::{DocumentFormat, Granularity, TextUnitIndexer};
use yadtwai::providers::mock::{MockProvider, MockRequest};
use yadtwai::translation::cache::TranslationCache;
use yadtwai::translation::{DispatchOptions, TranslationCapability, TranslationDispatcher, TranslationService};
use yadtwai::xml::XmlDocument;

const DOCX: &str = concat!(
    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    r#"<w:p><w:r><w:t>Alpha</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t>Beta</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t>Gamma</w:t></w:r></w:p>"#,
    r#"</w:body></w:document>"#
);

fn reversed(request: &MockRequest) -> String {
    request.text.chars().rev().collect()
}

#[tokio::test]
async fn test_dispatcher_withIndexedUnits_shouldFillEveryUnit() {
    let doc = XmlDocument::parse(DOCX).unwrap();
    let mut units = TextUnitIndexer::new(DocumentFormat::Docx, Granularity::Paragraph).index(&doc);

    let dispatcher = TranslationDispatcher::new(
        Arc::new(MockProvider::working().with_custom_response(reversed)),
        DispatchOptions {
            max_concurrent_requests: 3,
            timeout: Some(Duration::from_secs(5)),
        },
    );
    let report = dispatcher.translate_all(&mut units, "en", "fr", None).await;

    assert_eq!(report.translated, 3);
    let translated: Vec<&str> = units.iter().map(|u| u.translated_text.as_deref().unwrap()).collect();
    assert_eq!(translated, ["ahplA", "ateB", "ammaG"]);
}

#[tokio::test]
async fn test_dispatcher_withSelectiveFailure_shouldReportOnlyThatUnit() {
    let doc = XmlDocument::parse(DOCX).unwrap();
    let mut units = TextUnitIndexer::new(DocumentFormat::Docx, Granularity::Leaf).index(&doc);

    let provider = MockProvider::working().with_failure_when(|text| text == "Beta");
    let dispatcher = TranslationDispatcher::new(Arc::new(provider), DispatchOptions::default());

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let progress = move |_done: usize, total: usize| {
        assert_eq!(total, 3);
        counter.fetch_add(1, Ordering::SeqCst);
    };
    let report = dispatcher.translate_all(&mut units, "auto", "de", Some(&progress)).await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].unit_id, 1);
    assert_eq!(units[1].translated_text.as_deref(), Some("Beta"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_mockProvider_asCapability_shouldCountRequests() {
    let provider = MockProvider::intermittent(2);
    let (first, second) = tokio_test::block_on(async {
        (
            provider.translate("one", "en", "fr").await,
            provider.translate("two", "en", "fr").await,
        )
    });
    assert!(first.is_ok());
    assert!(second.is_err());
    assert_eq!(provider.request_count(), 2);
    assert_eq!(
        provider.usage_summary().as_deref(),
        Some("Mock provider: 2 requests")
    );
}

#[test]
fn test_translationService_new_withDefaultConfig_shouldSelectProvider() {
    let mut config = TranslationConfig {
        provider: TranslationProvider::LMStudio,
        ..TranslationConfig::default()
    };
    config.active_provider_config_mut().model = "qwen2.5-7b-instruct".to_string();

    let service = TranslationService::new(config).unwrap();
    assert_eq!(service.config.get_model(), "qwen2.5-7b-instruct");
    assert!(service.cache.is_enabled());
    assert_eq!(service.token_usage().requests, 0);
}

#[test]
fn test_translationCache_shouldIgnoreLanguageCase() {
    let cache = TranslationCache::new(true);
    cache.store("Hello", "EN", "FR", "Bonjour");
    assert_eq!(cache.get("Hello", "en", "fr").as_deref(), Some("Bonjour"));
    assert_eq!(cache.get("hello", "en", "fr"), None);
    let (hits, misses, _) = cache.stats();
    assert_eq!((hits, misses), (1, 1));
}
