// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::PathBuf;

use yadtwai::app_config::{self, Config, TranslationProvider};
use yadtwai::app_controller::Controller;
use yadtwai::document::Granularity;
use yadtwai::errors::{AppError, PipelineError};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    #[value(name = "lmstudio")]
    LMStudio,
    #[value(name = "modernmt")]
    ModernMT,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
            CliTranslationProvider::ModernMT => TranslationProvider::ModernMT,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for Granularity to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliGranularity {
    Leaf,
    Paragraph,
}

impl From<CliGranularity> for Granularity {
    fn from(cli_granularity: CliGranularity) -> Self {
        match cli_granularity {
            CliGranularity::Leaf => Granularity::Leaf,
            CliGranularity::Paragraph => Granularity::Paragraph,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate documents using AI providers (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for yadtwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input .docx/.odt document or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output document (single input only; default: <stem>.<lang>.<ext> beside the input)
    #[arg(short, long, value_name = "OUTPUT_PATH")]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code or 'auto' (e.g., 'en', 'fra', 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code or name (e.g., 'ar', 'deu', 'Hebrew')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Translate leaf runs or whole paragraphs
    #[arg(short, long, value_enum)]
    granularity: Option<CliGranularity>,

    /// Also translate headers, footers, notes and comments
    #[arg(long)]
    include_auxiliary_parts: bool,

    /// Mark paragraphs right-to-left regardless of the target language
    #[arg(long, conflicts_with = "no_rtl")]
    rtl: bool,

    /// Never mark paragraphs right-to-left
    #[arg(long)]
    no_rtl: bool,

    /// Maximum concurrent translation requests
    #[arg(short = 'j', long)]
    concurrent_requests: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// YADTwAI - Yet Another Document Translator with AI
///
/// Translates the text of DOCX and ODT documents while leaving their
/// markup, styling, tables and embedded objects untouched.
#[derive(Parser, Debug)]
#[command(name = "yadtwai")]
#[command(version)]
#[command(about = "AI-powered structure-preserving document translation")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "YADTwAI translates DOCX and ODT documents with AI providers, keeping every non-text element intact.

EXAMPLES:
    yadtwai report.docx                          # Translate using default config
    yadtwai -t ar report.docx                    # Translate to Arabic, paragraphs marked right-to-left
    yadtwai -p anthropic -g leaf notes.odt       # Use Anthropic and keep run boundaries
    yadtwai -t de -o out/bericht.docx report.docx
    yadtwai -f --log-level debug /documents/     # Process an entire directory
    yadtwai completions bash > yadtwai.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (default: llama3.2:3b)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)
    modernmt  - ModernMT machine translation API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Filtering is left to log::max_level so it can be raised later
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config or the command line says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "yadtwai", &mut std::io::stdout());
            return Ok(());
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    };

    if let Err(e) = result {
        let app_error = match e.downcast::<PipelineError>() {
            Ok(pipeline_error) => AppError::Pipeline(pipeline_error),
            Err(other) => AppError::from(other),
        };
        error!("{}", app_error);
        std::process::exit(1);
    }
    Ok(())
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(concurrent_requests) = options.concurrent_requests {
        config.translation.active_provider_config_mut().concurrent_requests = concurrent_requests;
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(granularity) = &options.granularity {
        config.document.granularity = Some(granularity.clone().into());
    }
    if options.include_auxiliary_parts {
        config.document.include_auxiliary_parts = true;
    }
    if options.rtl {
        config.document.force_rtl = Some(true);
    } else if options.no_rtl {
        config.document.force_rtl = Some(false);
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // Command line level applies before the config is read
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    if let Err(e) = controller.test_connection().await {
        warn!("{:#}; continuing, failed units keep their original text", e);
    }

    if input_path.is_file() {
        controller
            .run(input_path, options.output.clone(), options.force_overwrite)
            .await?;
    } else if input_path.is_dir() {
        if options.output.is_some() {
            return Err(anyhow!("--output cannot be used with a directory input"));
        }
        let summary = controller.run_folder(input_path, options.force_overwrite).await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} document(s) could not be translated", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    info!("Done");
    Ok(())
}
