/*!
 * Error types for the yadtwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Policy: `TranslationError` is per-unit and recovered by the dispatcher
 * (the unit keeps its original text). Container, XML and validation errors
 * are fatal to a run and surface as `PipelineError`.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Errors that can occur while translating a single text unit
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider answered with nothing for a non-empty input
    #[error("Provider returned an empty translation")]
    EmptyResponse,

    /// The call did not finish in time
    #[error("Translation timed out after {0}s")]
    Timeout(u64),

    /// The answer holds a character XML 1.0 does not allow
    #[error("Translation contains character U+{0:04X}, which XML does not allow")]
    IllegalCharacter(u32),

    /// The requested language could not be resolved
    #[error("Unsupported language: {0}")]
    Language(String),
}

/// Errors raised by the container store
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Input is missing, not a zip archive, or holds an unsafe entry
    #[error("Cannot read archive {path:?}: {reason}")]
    Unreadable {
        /// Archive path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Output archive or working area could not be written
    #[error("Cannot write {path:?}: {reason}")]
    WriteFailed {
        /// Target path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// A part the format requires is absent from the archive
    #[error("Archive has no part named '{0}'")]
    MissingPart(String),
}

/// Errors raised while parsing or serializing an XML part
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XmlError {
    /// The document is not well-formed
    #[error("Malformed XML at byte {position}: {message}")]
    Malformed {
        /// Byte offset reported by the reader
        position: u64,
        /// Reader message
        message: String,
    },

    /// The part is not valid UTF-8
    #[error("XML part is not valid UTF-8: {0}")]
    Encoding(String),

    /// Serialization failed
    #[error("Failed to write XML: {0}")]
    Write(String),
}

/// Raised when a patched part fails the well-formedness check
#[derive(Error, Debug)]
#[error("Part '{part}' is not well-formed after patching: {source}")]
pub struct ValidationError {
    /// Part name inside the container
    pub part: String,
    /// Underlying parser error
    #[source]
    pub source: XmlError,
}

/// Stages a translation run moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Extracted,
    Indexed,
    Translated,
    Patched,
    Validated,
    Repackaged,
    CleanedUp,
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Extracted => "extracted",
            Self::Indexed => "indexed",
            Self::Translated => "translated",
            Self::Patched => "patched",
            Self::Validated => "validated",
            Self::Repackaged => "repackaged",
            Self::CleanedUp => "cleaned-up",
        };
        f.write_str(name)
    }
}

/// Terminal outcome of a failed translation run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Container extraction or repackaging failed
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// A patched part is not well-formed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A targeted part was not well-formed before modification
    #[error("Part '{part}' could not be parsed: {source}")]
    MalformedPart {
        /// Part name inside the container
        part: String,
        /// Underlying parser error
        #[source]
        source: XmlError,
    },

    /// Input is not a supported container family
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Configuration could not produce a translation capability
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    /// The last stage the run would have entered when it failed
    pub fn stage(&self) -> RunStage {
        match self {
            Self::Container(ContainerError::WriteFailed { .. }) => RunStage::Repackaged,
            Self::Container(ContainerError::MissingPart(_)) => RunStage::Indexed,
            Self::Container(_) | Self::UnsupportedFormat(_) | Self::Configuration(_) => RunStage::Extracted,
            Self::MalformedPart { .. } => RunStage::Indexed,
            Self::Validation(_) => RunStage::Validated,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the document pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
