/*!
 * Translation layer between documents and AI providers.
 *
 * - `core`: the `TranslationCapability` seam and the provider-backed `TranslationService`
 * - `dispatcher`: bounded-concurrency, fail-open translation of text units
 * - `cache`: per-service reuse of identical translations
 * - `formatting`: cleanup of provider output
 * - `concurrency`: per-provider defaults
 */

pub use self::core::{TokenUsageStats, TranslationCapability, TranslationService};
pub use self::dispatcher::{DispatchOptions, DispatchReport, ProgressCallback, TranslationDispatcher, UnitFailure};

pub mod cache;
pub mod concurrency;
pub mod core;
pub mod dispatcher;
pub mod formatting;
