/*!
 * Tests for error types and conversions
 */

use std::path::PathBuf;

use yadtwai::errors::{
    AppError, ContainerError, PipelineError, ProviderError, RunStage, TranslationError, ValidationError, XmlError,
};

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("429"));
    assert!(display.contains("Too many requests"));
}

#[test]
fn test_providerError_isRetryable_shouldOnlyRetryTransientFailures() {
    assert!(ProviderError::ConnectionError("reset".into()).is_retryable());
    assert!(ProviderError::RateLimitExceeded("slow down".into()).is_retryable());
    assert!(ProviderError::ApiError { status_code: 503, message: String::new() }.is_retryable());
    assert!(!ProviderError::ApiError { status_code: 400, message: String::new() }.is_retryable());
    assert!(!ProviderError::AuthenticationError("bad key".into()).is_retryable());
    assert!(!ProviderError::ParseError("bad json".into()).is_retryable());
}

#[test]
fn test_translationError_fromProviderError_shouldWrapCorrectly() {
    let error: TranslationError = ProviderError::RequestFailed("Test error".to_string()).into();
    assert!(matches!(error, TranslationError::Provider(_)));
    assert!(error.to_string().contains("Test error"));
    assert!(TranslationError::Timeout(30).to_string().contains("30s"));
}

#[test]
fn test_pipelineError_stage_shouldNameFailedStage() {
    let unreadable = PipelineError::Container(ContainerError::Unreadable {
        path: PathBuf::from("in.docx"),
        reason: "invalid zip".into(),
    });
    assert_eq!(unreadable.stage(), RunStage::Extracted);

    let missing = PipelineError::Container(ContainerError::MissingPart("word/document.xml".into()));
    assert_eq!(missing.stage(), RunStage::Indexed);

    let malformed = PipelineError::MalformedPart {
        part: "content.xml".into(),
        source: XmlError::Malformed { position: 12, message: "mismatched tag".into() },
    };
    assert_eq!(malformed.stage(), RunStage::Indexed);
    assert!(malformed.to_string().contains("content.xml"));

    let invalid = PipelineError::Validation(ValidationError {
        part: "word/document.xml".into(),
        source: XmlError::Write("broken".into()),
    });
    assert_eq!(invalid.stage(), RunStage::Validated);

    let write_failed = PipelineError::Container(ContainerError::WriteFailed {
        path: PathBuf::from("out.docx"),
        reason: "disk full".into(),
    });
    assert_eq!(write_failed.stage(), RunStage::Repackaged);
    assert_eq!(RunStage::CleanedUp.to_string(), "cleaned-up");
}

#[test]
fn test_appError_fromPipelineError_shouldKeepMessage() {
    let error: AppError = PipelineError::UnsupportedFormat("notes.pdf".into()).into();
    assert!(matches!(error, AppError::Pipeline(_)));
    assert!(error.to_string().contains("notes.pdf"));

    let error: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(error, AppError::File(_)));
}
