// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use yomikaki::app_config::{self, AssistantProvider, Config, TimestampStrategy};
use yomikaki::app_controller::{AnalysisTarget, Controller};
use yomikaki::errors::AppError;
use yomikaki::language_utils::DisplayLanguage;
use yomikaki::service::LanguageService;

/// CLI Wrapper for AssistantProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliAssistantProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliAssistantProvider> for AssistantProvider {
    fn from(cli_provider: CliAssistantProvider) -> Self {
        match cli_provider {
            CliAssistantProvider::Ollama => AssistantProvider::Ollama,
            CliAssistantProvider::OpenAI => AssistantProvider::OpenAI,
            CliAssistantProvider::Anthropic => AssistantProvider::Anthropic,
            CliAssistantProvider::LMStudio => AssistantProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for DisplayLanguage to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDisplayLanguage {
    #[value(alias = "zh")]
    Chinese,
    #[value(alias = "en")]
    English,
    #[value(alias = "ko")]
    Korean,
}

impl From<CliDisplayLanguage> for DisplayLanguage {
    fn from(cli_language: CliDisplayLanguage) -> Self {
        match cli_language {
            CliDisplayLanguage::Chinese => DisplayLanguage::Chinese,
            CliDisplayLanguage::English => DisplayLanguage::English,
            CliDisplayLanguage::Korean => DisplayLanguage::Korean,
        }
    }
}

/// CLI Wrapper for TimestampStrategy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTimestampStrategy {
    Positional,
    ContentAware,
}

impl From<CliTimestampStrategy> for TimestampStrategy {
    fn from(cli_strategy: CliTimestampStrategy) -> Self {
        match cli_strategy {
            CliTimestampStrategy::Positional => TimestampStrategy::Positional,
            CliTimestampStrategy::ContentAware => TimestampStrategy::ContentAware,
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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transcribe media and build bilingual subtitles (default command)
    Process(ProcessArgs),

    /// Explain the vocabulary and grammar of one sentence
    Analyze(AnalyzeArgs),

    /// Check that the configured chat model provider is reachable
    Check,

    /// Generate shell completions for yomikaki
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every command that talks to a model
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Chat model provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliAssistantProvider>,

    /// Model name to use for merging, translation and analysis
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Language translations and analyses are written in
    #[arg(short, long, value_enum, global = true)]
    display_language: Option<CliDisplayLanguage>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Input media file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Directory for the outputs (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Timestamp reconciliation strategy
    #[arg(long, value_enum)]
    strategy: Option<CliTimestampStrategy>,

    /// Also write an SRT copy of the subtitles
    #[arg(long)]
    srt: bool,
}

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("target").required(true).args(["index", "sentence"]))]
struct AnalyzeArgs {
    /// Transcript JSON written by `process`
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// 1-based sentence number in the transcript
    #[arg(short, long, requires = "transcript")]
    index: Option<usize>,

    /// Sentence text to analyze
    #[arg(short, long)]
    sentence: Option<String>,
}

/// Yomikaki - Japanese listening companion
///
/// Transcribes Japanese audio and video, regroups the speech into sentences
/// and writes subtitles with a translation and furigana for each sentence.
#[derive(Parser, Debug)]
#[command(name = "yomikaki")]
#[command(version)]
#[command(about = "Bilingual subtitles and sentence analysis for Japanese media")]
#[command(long_about = "Yomikaki transcribes Japanese media, merges the recognized segments into sentences
and writes a WebVTT track pairing each sentence with its translation.

EXAMPLES:
    yomikaki lesson.mp4                                  # Process using default config
    yomikaki -f lesson.mp4                               # Force overwrite existing files
    yomikaki -p anthropic -m claude-3-5-haiku lesson.mp4 # Use specific provider and model
    yomikaki -d english lesson.mp3                       # Translate into English
    yomikaki process --strategy content-aware lesson.mp4 # Align sentences by content
    yomikaki --log-level debug /lessons/                 # Process an entire directory
    yomikaki analyze -t lesson.transcript.json -i 3      # Analyze the third sentence
    yomikaki analyze -s '私は学生です'                     # Analyze any sentence
    yomikaki check -p ollama                             # Test the provider connection
    yomikaki completions bash > yomikaki.bash            # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

OUTPUTS:
    <name>.ja.vtt           - Japanese and translated line per cue
    <name>.transcript.json  - sentences with timings, translations and furigana
    <name>.ja.srt           - optional SRT copy (--srt)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input media file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    #[command(flatten)]
    common: CommonArgs,
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
        // Filtering is left to log::max_level so it can change after config load
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let (color, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Level is updated once the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "yomikaki", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Process(args)) => run_process(&cli.common, args).await,
        Some(Commands::Analyze(args)) => run_analyze(&cli.common, args).await,
        Some(Commands::Check) => run_check(&cli.common).await,
        None => {
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            let args = ProcessArgs {
                input_path,
                force_overwrite: cli.force_overwrite,
                output_dir: None,
                strategy: None,
                srt: false,
            };
            run_process(&cli.common, args).await
        }
    }
}

/// Load the config file and apply command line overrides
fn load_config(common: &CommonArgs) -> Result<Config> {
    if let Some(cmd_log_level) = &common.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let (mut config, created) = Config::load_or_create(&common.config_path)
        .map_err(|e| AppError::Config(format!("{:#}", e)))?;
    if created {
        warn!("Config file not found at '{}', created default config.", common.config_path);
    }

    if let Some(provider) = &common.provider {
        config.assistant.provider = provider.clone().into();
    }

    if let Some(model) = &common.model {
        config.assistant.active_provider_config_mut().model = model.clone();
    }

    if let Some(language) = &common.display_language {
        config.display_language = language.clone().into();
    }

    if let Some(log_level) = &common.log_level {
        config.log_level = log_level.clone().into();
    }

    config
        .validate()
        .map_err(|e| AppError::Config(format!("{:#}", e)))
        .context("Configuration validation failed")?;

    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}

async fn run_process(common: &CommonArgs, options: ProcessArgs) -> Result<()> {
    let mut config = load_config(common)?;

    if let Some(strategy) = options.strategy {
        config.pipeline.timestamp_strategy = strategy.into();
    }
    if options.srt {
        config.pipeline.write_srt = true;
    }

    info!("Display language: {}", config.display_language);
    let controller = Controller::with_config(config)?;

    if options.input_path.is_file() {
        let output_dir = match options.output_dir {
            Some(dir) => dir,
            None => options.input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };
        controller.run(options.input_path, output_dir, options.force_overwrite).await?;
    } else if options.input_path.is_dir() {
        if options.output_dir.is_some() {
            warn!("--output-dir is ignored for directories, outputs are written next to each file");
        }
        controller.run_folder(options.input_path, options.force_overwrite).await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}

async fn run_analyze(common: &CommonArgs, options: AnalyzeArgs) -> Result<()> {
    let config = load_config(common)?;
    let controller = Controller::with_config(config)?;

    let analysis = match (options.sentence, options.transcript, options.index) {
        (Some(sentence), _, _) => controller.analyze(&sentence).await?,
        (None, Some(transcript), Some(index)) => {
            controller.analyze_transcript(&transcript, AnalysisTarget::Index(index)).await?
        }
        _ => return Err(anyhow!("Either --sentence or --transcript with --index is required")),
    };

    println!("{}", analysis);
    Ok(())
}

async fn run_check(common: &CommonArgs) -> Result<()> {
    let config = load_config(common)?;
    let service = LanguageService::new(&config.assistant)?;

    service.test_connection().await?;
    info!("{} is reachable ({})", service.provider_name(), service.model());
    Ok(())
}
