/*!
 * Translation dispatcher.
 *
 * Sends every text unit of a part to the translation capability with a
 * bounded number of calls in flight. Results are matched back to units by
 * index, never by completion order. A unit whose call fails, times out,
 * comes back empty or carries characters XML cannot hold keeps its original
 * text and is reported as a failure; the part carries on.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::core::TranslationCapability;
use super::formatting::restore_margins;
use crate::document::TextUnit;
use crate::errors::TranslationError;
use crate::xml::first_illegal_char;

/// Progress callback receiving (done, total)
pub type ProgressCallback = dyn Fn(usize, usize) + Send + Sync;

/// Dispatch settings
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Calls allowed in flight at once
    pub max_concurrent_requests: usize,
    /// Deadline for one call, None for no deadline
    pub timeout: Option<Duration>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            max_concurrent_requests: crate::app_config::default_concurrent_requests(),
            timeout: Some(Duration::from_secs(crate::app_config::default_timeout_secs())),
        }
    }
}

/// A unit that kept its original text
#[derive(Debug, Clone, PartialEq)]
pub struct UnitFailure {
    pub unit_id: usize,
    pub message: String,
}

/// Outcome of translating one part's units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub translated: usize,
    pub failed: usize,
    /// Failures in unit order
    pub failures: Vec<UnitFailure>,
}

impl DispatchReport {
    /// Message of the first failing unit in document order
    pub fn first_error(&self) -> Option<&str> {
        self.failures.first().map(|failure| failure.message.as_str())
    }
}

/// Translates text units through a capability
#[derive(Clone)]
pub struct TranslationDispatcher {
    capability: Arc<dyn TranslationCapability>,
    options: DispatchOptions,
}

impl TranslationDispatcher {
    pub fn new(capability: Arc<dyn TranslationCapability>, options: DispatchOptions) -> Self {
        Self { capability, options }
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    async fn translate_one(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let call = self.capability.translate(text, source_language, target_language);
        let translated = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| TranslationError::Timeout(limit.as_secs()))??,
            None => call.await?,
        };
        if translated.trim().is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        if let Some((_, c)) = first_illegal_char(&translated) {
            return Err(TranslationError::IllegalCharacter(c as u32));
        }
        Ok(restore_margins(text, &translated))
    }

    /// Fill `translated_text` on every unit
    ///
    /// Failed units get their original text back, so the patcher leaves
    /// their slots untouched.
    pub async fn translate_all(
        &self,
        units: &mut [TextUnit],
        source_language: &str,
        target_language: &str,
        progress: Option<&ProgressCallback>,
    ) -> DispatchReport {
        let total = units.len();
        let done = AtomicUsize::new(0);
        let max_concurrent = self.options.max_concurrent_requests.max(1);

        let results: Vec<(usize, Result<String, TranslationError>)> = {
            let done = &done;
            stream::iter(units.iter().enumerate())
                .map(|(index, unit)| async move {
                    let result = self
                        .translate_one(&unit.original_text, source_language, target_language)
                        .await;
                    let current = done.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(callback) = progress {
                        callback(current, total);
                    }
                    (index, result)
                })
                .buffer_unordered(max_concurrent)
                .collect()
                .await
        };

        let mut report = DispatchReport::default();
        for (index, result) in results {
            let unit = &mut units[index];
            match result {
                Ok(translated) => {
                    unit.translated_text = Some(translated);
                    report.translated += 1;
                }
                Err(error) => {
                    warn!(
                        "Unit {} kept its original text ('{}'): {}",
                        unit.id,
                        crate::providers::preview(&unit.original_text),
                        error
                    );
                    unit.translated_text = Some(unit.original_text.clone());
                    report.failed += 1;
                    report.failures.push(UnitFailure {
                        unit_id: unit.id,
                        message: error.to_string(),
                    });
                }
            }
        }
        report.failures.sort_by_key(|failure| failure.unit_id);
        debug!(
            "Dispatched {} units: {} translated, {} failed",
            total, report.translated, report.failed
        );
        report
    }
}
