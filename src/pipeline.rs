/*!
 * Structure-preserving document translation pipeline.
 *
 * One run goes extract → index → translate → patch → validate → repackage
 * and always ends by removing its working area, whether it succeeded or
 * not. Each run has its own working area, so runs can execute concurrently.
 */

use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::app_config::Config;
use crate::container::{ContainerStore, WorkingArea};
use crate::document::{
    ContainerValidator, DocumentFormat, Granularity, StructuralPatcher, TextUnitIndexer,
};
use crate::errors::{PipelineError, RunStage, TranslationError};
use crate::language_utils;
use crate::translation::{
    DispatchOptions, ProgressCallback, TranslationCapability, TranslationDispatcher, TranslationService,
    UnitFailure,
};
use crate::xml::XmlDocument;

/// Per-run settings
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// None picks the format default
    pub granularity: Option<Granularity>,
    pub include_auxiliary_parts: bool,
    /// None follows the target language
    pub force_rtl: Option<bool>,
    /// Source language code or "auto"
    pub source_language: String,
    pub max_concurrent_requests: usize,
    /// Per-call deadline
    pub timeout: Option<Duration>,
    /// Parent of working areas
    pub working_dir: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        let dispatch = DispatchOptions::default();
        Self {
            granularity: None,
            include_auxiliary_parts: false,
            force_rtl: None,
            source_language: language_utils::AUTO_LANGUAGE.to_string(),
            max_concurrent_requests: dispatch.max_concurrent_requests,
            timeout: dispatch.timeout,
            working_dir: None,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            granularity: config.document.granularity,
            include_auxiliary_parts: config.document.include_auxiliary_parts,
            force_rtl: config.document.force_rtl,
            source_language: config.source_language.clone(),
            max_concurrent_requests: config.translation.optimal_concurrent_requests(),
            timeout: Some(Duration::from_secs(config.translation.get_timeout_secs())),
            working_dir: config.document.working_dir.clone(),
        }
    }
}

/// Result for one translated part
#[derive(Debug, Clone, PartialEq)]
pub struct PartReport {
    pub name: String,
    pub units: usize,
    pub translated: usize,
    pub failed: usize,
    pub first_error: Option<String>,
    pub failures: Vec<UnitFailure>,
    pub paragraphs_marked: usize,
    /// Whether the part was serialized back into the archive
    pub rewritten: bool,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub input: PathBuf,
    pub output_path: PathBuf,
    pub format: DocumentFormat,
    pub granularity: Granularity,
    pub target_language: String,
    pub rtl_applied: bool,
    pub parts: Vec<PartReport>,
}

impl RunReport {
    /// Units that kept their original text
    pub fn warning_count(&self) -> usize {
        self.parts.iter().map(|part| part.failed).sum()
    }

    pub fn unit_count(&self) -> usize {
        self.parts.iter().map(|part| part.units).sum()
    }

    pub fn translated_count(&self) -> usize {
        self.parts.iter().map(|part| part.translated).sum()
    }
}

/// Translates documents through one capability
pub struct DocumentTranslator {
    capability: Arc<dyn TranslationCapability>,
    store: ContainerStore,
    options: PipelineOptions,
    progress: Option<Arc<ProgressCallback>>,
}

impl DocumentTranslator {
    pub fn new(capability: Arc<dyn TranslationCapability>, options: PipelineOptions) -> Self {
        Self {
            capability,
            store: ContainerStore::with_working_root(options.working_dir.clone()),
            options,
            progress: None,
        }
    }

    /// Build the provider-backed capability from an explicit configuration
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let service = TranslationService::new(config.translation.clone())
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        Ok(Self::new(Arc::new(service), PipelineOptions::from_config(config)))
    }

    /// Report (done, total) units of the part being translated
    pub fn with_progress(mut self, progress: Arc<ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Ask the capability whether its backend answers
    pub async fn check_connection(&self) -> Result<(), TranslationError> {
        self.capability.check_connection().await
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Translate `input` into a new archive at `output`
    ///
    /// Either a complete, validated archive is written or nothing is.
    pub async fn run(&self, input: &Path, output: &Path, target_language: &str) -> Result<RunReport, PipelineError> {
        let language = language_utils::resolve_language(target_language)
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        let rtl = self
            .options
            .force_rtl
            .unwrap_or_else(|| language_utils::is_rtl(target_language));
        let run_id = Uuid::new_v4();
        info!(
            "Run {}: translating {:?} into {}{}",
            run_id,
            input,
            language.to_name(),
            if rtl { " (right-to-left)" } else { "" }
        );

        let area = self.store.extract(input)?;
        debug!("Run {}: {}", run_id, RunStage::Extracted);

        let result = self
            .translate_area(&area, input, output, target_language, rtl, run_id)
            .await;

        self.store.cleanup(area);
        debug!("Run {}: {}", run_id, RunStage::CleanedUp);

        match &result {
            Ok(report) => {
                info!(
                    "Run {}: {}/{} units translated into {:?} ({} warnings)",
                    run_id,
                    report.translated_count(),
                    report.unit_count(),
                    report.output_path,
                    report.warning_count()
                );
                if let Some(summary) = self.capability.usage_summary() {
                    info!("{}", summary);
                }
            }
            Err(e) => error!("Run {} failed while {}: {}", run_id, e.stage(), e),
        }
        result
    }

    async fn translate_area(
        &self,
        area: &WorkingArea,
        input: &Path,
        output: &Path,
        target_language: &str,
        rtl: bool,
        run_id: Uuid,
    ) -> Result<RunReport, PipelineError> {
        let format = DocumentFormat::from_path(input)
            .filter(|format| area.has_part(format.primary_part()))
            .or_else(|| DocumentFormat::detect(area))
            .ok_or_else(|| PipelineError::UnsupportedFormat(input.display().to_string()))?;
        let granularity = self.options.granularity.unwrap_or_else(|| format.default_granularity());

        let indexer = TextUnitIndexer::new(format, granularity);
        let patcher = StructuralPatcher::new(format);
        let dispatcher = TranslationDispatcher::new(
            Arc::clone(&self.capability),
            DispatchOptions {
                max_concurrent_requests: self.options.max_concurrent_requests,
                timeout: self.options.timeout,
            },
        );

        let mut parts = Vec::new();
        let mut changed: Vec<(String, XmlDocument)> = Vec::new();

        for name in format.target_parts(area, self.options.include_auxiliary_parts) {
            let bytes = area.read_part(&name)?;
            let mut doc = XmlDocument::parse_bytes(&bytes).map_err(|source| PipelineError::MalformedPart {
                part: name.clone(),
                source,
            })?;

            let mut units = indexer.index(&doc);
            debug!("Run {}: {} {} units in '{}' ({})", run_id, RunStage::Indexed, units.len(), name, granularity);

            let dispatch = if units.is_empty() {
                Default::default()
            } else {
                dispatcher
                    .translate_all(
                        &mut units,
                        &self.options.source_language,
                        target_language,
                        self.progress.as_deref(),
                    )
                    .await
            };
            debug!("Run {}: {} '{}'", run_id, RunStage::Translated, name);

            let summary = patcher.patch(&mut doc, &units, rtl);
            debug!("Run {}: {} '{}'", run_id, RunStage::Patched, name);

            parts.push(PartReport {
                name: name.clone(),
                units: units.len(),
                translated: dispatch.translated,
                failed: dispatch.failed,
                first_error: dispatch.first_error().map(str::to_string),
                failures: dispatch.failures,
                paragraphs_marked: summary.paragraphs_marked,
                rewritten: summary.changed(),
            });
            if summary.changed() {
                changed.push((name, doc));
            }
        }

        let rewritten: Vec<(String, &XmlDocument)> = changed.iter().map(|(name, doc)| (name.clone(), doc)).collect();
        ContainerValidator::new(&self.store).finalize(area, &rewritten, output)?;
        debug!("Run {}: {} and {}", run_id, RunStage::Validated, RunStage::Repackaged);

        Ok(RunReport {
            run_id,
            input: input.to_path_buf(),
            output_path: output.to_path_buf(),
            format,
            granularity,
            target_language: target_language.to_string(),
            rtl_applied: rtl,
            parts,
        })
    }
}

/// Translate one document with everything taken from `config`
pub async fn run(
    input_path: &Path,
    output_path: &Path,
    target_language: &str,
    config: &Config,
) -> Result<RunReport, PipelineError> {
    DocumentTranslator::from_config(config)?
        .run(input_path, output_path, target_language)
        .await
}
