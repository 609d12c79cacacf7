use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::pipeline::{DocumentTranslator, RunReport};

// @module: Application controller for document translation

/// Outcome of a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub translated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Pipeline shared by every file of the session
    translator: DocumentTranslator,
    // @field: Unit progress of the current part
    progress_bar: ProgressBar,
}

fn bar_style(unit: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        ))
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

impl Controller {
    // @method: Create a controller whose pipeline is built from the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let progress_bar = ProgressBar::new(0);
        progress_bar.set_style(bar_style("units"));

        let bar = progress_bar.clone();
        let translator = DocumentTranslator::from_config(&config)
            .context("Failed to create translation service")?
            .with_progress(Arc::new(move |done, total| {
                bar.set_length(total as u64);
                bar.set_position(done as u64);
            }));

        Ok(Self {
            config,
            translator,
            progress_bar,
        })
    }

    // @method: Create a controller around a prepared pipeline, without progress output
    pub fn with_translator(config: Config, translator: DocumentTranslator) -> Self {
        Self {
            config,
            translator,
            progress_bar: ProgressBar::hidden(),
        }
    }

    /// Check the provider once before translating
    pub async fn test_connection(&self) -> Result<()> {
        self.translator.check_connection().await.with_context(|| {
            format!(
                "Cannot reach {} ({})",
                self.config.translation.provider.display_name(),
                self.config.translation.get_model()
            )
        })
    }

    /// Language tag used in output file names
    fn output_language_tag(&self) -> String {
        language_utils::normalize_to_part1_or_part2t(&self.config.target_language)
            .unwrap_or_else(|_| self.config.target_language.to_lowercase())
    }

    /// Default output path: `<stem>.<lang>.<ext>` beside the input
    pub fn default_output_path(&self, input_file: &Path) -> PathBuf {
        let extension = input_file
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_else(|| "docx".to_string());
        let output_dir = input_file.parent().unwrap_or(Path::new("."));
        FileManager::generate_output_path(input_file, output_dir, &self.output_language_tag(), &extension)
    }

    /// Translate one document; returns None when skipped
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_path: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<Option<RunReport>> {
        let start_time = Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_path.unwrap_or_else(|| self.default_output_path(&input_file));
        if output_path.exists() && !force_overwrite {
            warn!(
                "Skipping {:?}, translation already exists (use -f to force overwrite)",
                input_file
            );
            return Ok(None);
        }

        info!(
            "YADTwAI: {} - {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );

        self.progress_bar.reset();
        self.progress_bar.set_message(
            input_file
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        let result = self
            .translator
            .run(&input_file, &output_path, &self.config.target_language)
            .await;
        self.progress_bar.finish_and_clear();

        let report = result.with_context(|| format!("Failed to translate {:?}", input_file))?;

        if report.warning_count() > 0 {
            warn!(
                "{} unit(s) kept their original text, see {}",
                report.warning_count(),
                FileManager::issues_log_path(&output_path).display()
            );
            self.write_issues(&report)?;
        }

        info!(
            "Translation completed in {}: {:?}",
            Self::format_duration(start_time.elapsed()),
            report.output_path
        );
        Ok(Some(report))
    }

    /// Translate every supported document under `input_dir`
    /// Files that already are translations, or whose output exists, are skipped
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();
        let documents: Vec<PathBuf> = FileManager::find_documents(&input_dir)?
            .into_iter()
            .filter(|path| !FileManager::is_translation_output(path))
            .collect();

        if documents.is_empty() {
            warn!("No .docx or .odt documents found in {:?}", input_dir);
            return Ok(FolderSummary::default());
        }
        info!("Found {} document(s) in {:?}", documents.len(), input_dir);

        let folder_pb = ProgressBar::new(documents.len() as u64);
        folder_pb.set_style(bar_style("files"));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();
        for document in documents {
            match self.run(document.clone(), None, force_overwrite).await {
                Ok(Some(_)) => summary.translated += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("{:#}", e);
                    summary.failed += 1;
                    let log_path = input_dir.join(crate::file_utils::ISSUES_LOG_FILE);
                    FileManager::append_to_log_file(&log_path, &format!("{:?}: {:#}", document, e))?;
                }
            }
            folder_pb.inc(1);
        }
        folder_pb.finish_and_clear();

        info!(
            "Processed folder in {}: {} translated, {} skipped, {} failed",
            Self::format_duration(start_time.elapsed()),
            summary.translated,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    /// Append every failed unit of a run to the issues log beside the output
    fn write_issues(&self, report: &RunReport) -> Result<()> {
        let log_path = FileManager::issues_log_path(&report.output_path);
        FileManager::append_to_log_file(
            &log_path,
            &format!(
                "Run {} ({:?} -> {:?}): {} unit(s) untranslated",
                report.run_id,
                report.input,
                report.output_path,
                report.warning_count()
            ),
        )?;
        for part in &report.parts {
            for failure in &part.failures {
                FileManager::append_to_log_file(
                    &log_path,
                    &format!("  {} unit {}: {}", part.name, failure.unit_id, failure.message),
                )?;
            }
        }
        Ok(())
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
