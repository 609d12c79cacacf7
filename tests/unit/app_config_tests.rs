/*!
 * Tests for application configuration functionality
 */

use yadtwai::app_config::{Config, LogLevel, ProviderConfig, TranslationProvider};
use yadtwai::document::Granularity;
use yadtwai::pipeline::PipelineOptions;

use crate::common;

fn ollama_config() -> Config {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;
    config
}

#[test]
fn test_default_config_shouldHaveReasonableValues() {
    let config = Config::default();
    assert_eq!(config.source_language, "auto");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translation.provider, TranslationProvider::OpenAI);
    assert_eq!(config.translation.available_providers.len(), 5);
    assert_eq!(config.translation.common.retry_count, 3);
    assert!(config.translation.common.enable_cache);
    assert_eq!(config.document.granularity, None);
    assert!(!config.document.include_auxiliary_parts);
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();
    assert!(path.exists());
    let reloaded = Config::from_file(&path).unwrap();
    assert_eq!(reloaded.target_language, config.target_language);
    assert_eq!(reloaded.translation.available_providers.len(), 5);
}

#[test]
fn test_fromFile_withPartialJson_shouldFillDefaults() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "target_language": "ar",
            "translation": {
                "provider": "modernmt",
                "available_providers": [{ "type": "modernmt", "api_key": "mmt-key" }]
            },
            "document": { "granularity": "leaf", "force_rtl": false }
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.source_language, "auto");
    assert_eq!(config.translation.provider, TranslationProvider::ModernMT);
    assert_eq!(config.translation.get_api_key(), "mmt-key");
    assert_eq!(config.translation.get_endpoint(), "https://api.modernmt.com");
    assert_eq!(config.document.granularity, Some(Granularity::Leaf));
    assert_eq!(config.document.force_rtl, Some(false));
    assert!(config.validate().is_ok());
}

#[test]
fn test_fromFile_withInvalidJson_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json").unwrap();
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_validate_withLocalProvider_shouldNotRequireApiKey() {
    assert!(ollama_config().validate().is_ok());
}

#[test]
fn test_validate_withKeyedProvider_shouldAcceptConfiguredKey() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;
    config.translation.active_provider_config_mut().api_key = "sk-ant-test".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withInvalidLanguages_shouldFail() {
    let mut config = ollama_config();
    config.target_language = "zz".to_string();
    assert!(config.validate().is_err());

    let mut config = ollama_config();
    config.source_language = "qq".to_string();
    assert!(config.validate().is_err());

    let mut config = ollama_config();
    config.target_language = "Arabic".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withZeroConcurrency_shouldFail() {
    let mut config = ollama_config();
    config.translation.active_provider_config_mut().concurrent_requests = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_activeProviderConfigMut_withMissingEntry_shouldCreateDefaults() {
    let mut config = ollama_config();
    config.translation.available_providers.clear();
    config.translation.active_provider_config_mut().model = "qwen2.5:7b".to_string();

    assert_eq!(config.translation.available_providers.len(), 1);
    assert_eq!(config.translation.get_model(), "qwen2.5:7b");
    assert_eq!(config.translation.get_endpoint(), "http://localhost:11434");
}

#[test]
fn test_providerConfig_new_shouldUseProviderProfile() {
    let openai = ProviderConfig::new(TranslationProvider::OpenAI);
    assert_eq!(openai.model, "gpt-3.5-turbo");
    assert_eq!(openai.rate_limit, Some(60));

    let lmstudio = ProviderConfig::new(TranslationProvider::LMStudio);
    assert_eq!(lmstudio.endpoint, "http://localhost:1234/v1");
    assert_eq!(lmstudio.rate_limit, None);
}

#[test]
fn test_translationProvider_fromStr_shouldBeCaseInsensitive() {
    assert_eq!("OpenAI".parse::<TranslationProvider>().unwrap(), TranslationProvider::OpenAI);
    assert_eq!("modernmt".parse::<TranslationProvider>().unwrap(), TranslationProvider::ModernMT);
    assert!("gemini".parse::<TranslationProvider>().is_err());
    assert_eq!(TranslationProvider::LMStudio.to_string(), "lmstudio");
}

#[test]
fn test_pipelineOptions_fromConfig_shouldCarryDocumentSettings() {
    let mut config = ollama_config();
    config.source_language = "en".to_string();
    config.document.granularity = Some(Granularity::Paragraph);
    config.document.include_auxiliary_parts = true;
    config.translation.active_provider_config_mut().concurrent_requests = 7;
    config.translation.active_provider_config_mut().timeout_secs = 90;

    let options = PipelineOptions::from_config(&config);
    assert_eq!(options.source_language, "en");
    assert_eq!(options.granularity, Some(Granularity::Paragraph));
    assert!(options.include_auxiliary_parts);
    assert_eq!(options.max_concurrent_requests, 7);
    assert_eq!(options.timeout, Some(std::time::Duration::from_secs(90)));
}
