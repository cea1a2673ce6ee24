//! Configuration: typed settings with layered precedence
//! (defaults, then an optional file, then the environment, then command line flags).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File};
use manuscript_ast::{ExportFormat, ExportOverrides, PageSize, PdfStrategy, TypesetEngine};
use manuscript_common::process::find_program;
use manuscript_html::BrowserRenderer;
use manuscript_latex::{TypesetRenderer, DEFAULT_TYPESETTER};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Prefix of environment variables read as configuration;
/// nested keys are separated by a double underscore, as in `MANUSCRIPT_EXPORT_BROWSER__PROGRAM`
pub const ENV_PREFIX: &str = "MANUSCRIPT_EXPORT";
/// Browsers tried in order when none is configured
pub const BROWSER_CANDIDATES: [&str; 4] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];
const SCRATCH_DIR_NAME: &str = "manuscript_export";
const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;
const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
const DEFAULT_VIEWPORT_HEIGHT: u32 = 800;

/// Command-line arguments for the `manuscript-export` binary.
#[derive(Debug, Parser)]
#[command(
    name = "manuscript-export",
    version,
    about = "Export markdown manuscripts to pdf or html"
)]
pub struct CliArgs {
    /// Optional path to a configuration file (toml or json).
    #[arg(long = "config-file", env = "MANUSCRIPT_EXPORT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[allow(missing_docs)]
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[allow(missing_docs)]
    #[command(subcommand)]
    pub command: Command,
}

#[allow(missing_docs)]
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Export a manuscript, read as json, to pdf or html.
    Export(ExportArgs),
    /// Print the heading outline of a manuscript, read as json.
    Outline(OutlineArgs),
}

/// Arguments of the `export` subcommand
#[derive(Debug, Args, Clone, Default)]
pub struct ExportArgs {
    /// Manuscript json file; stdin if absent.
    #[arg(long, short, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Where to write the artifact; stdout if absent.
    /// If this is a directory, the artifact's suggested filename is used inside it.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Json file of export option overrides, with the same fields as the flags below.
    #[arg(long = "options-file", value_name = "PATH")]
    pub options_file: Option<PathBuf>,

    /// pdf or html.
    #[arg(long)]
    pub format: Option<ExportFormat>,

    /// a4, letter or a5.
    #[arg(long = "page-size")]
    pub page_size: Option<PageSize>,

    /// Include a table of contents (true|false).
    #[arg(long = "include-toc")]
    pub include_toc: Option<bool>,

    /// Include a cover page (true|false).
    #[arg(long = "include-cover")]
    pub include_cover: Option<bool>,

    /// Include page numbers (true|false).
    #[arg(long = "include-page-numbers")]
    pub include_page_numbers: Option<bool>,

    /// Include running headers (true|false).
    #[arg(long = "include-headers")]
    pub include_headers: Option<bool>,

    /// browser or typeset.
    #[arg(long)]
    pub strategy: Option<PdfStrategy>,

    /// pdflatex, xelatex or lualatex.
    #[arg(long)]
    pub engine: Option<TypesetEngine>,
}

impl ExportArgs {
    /// Apply these flags on top of `base`, field by field
    pub fn apply_to(&self, base: ExportOverrides) -> ExportOverrides {
        ExportOverrides {
            format: self.format.or(base.format),
            page_size: self.page_size.or(base.page_size),
            include_toc: self.include_toc.or(base.include_toc),
            include_cover: self.include_cover.or(base.include_cover),
            include_page_numbers: self.include_page_numbers.or(base.include_page_numbers),
            include_headers: self.include_headers.or(base.include_headers),
            strategy: self.strategy.or(base.strategy),
            engine: self.engine.or(base.engine),
        }
    }
}

/// Arguments of the `outline` subcommand
#[derive(Debug, Args, Clone, Default)]
pub struct OutlineArgs {
    /// Manuscript json file; stdin if absent.
    #[arg(long, short, value_name = "PATH")]
    pub input: Option<PathBuf>,
}

/// Configuration set directly on the command line; these take precedence over everything else.
#[derive(Debug, Args, Default, Clone)]
pub struct ConfigOverrides {
    /// Override the directory scratch files are written to.
    #[arg(long = "scratch-dir", value_name = "PATH", global = true)]
    pub scratch_dir: Option<PathBuf>,

    /// Override the typesetter executable.
    #[arg(long = "typesetter", value_name = "PATH", global = true)]
    pub typesetter: Option<PathBuf>,

    /// Override the browser executable.
    #[arg(long = "browser", value_name = "PATH", global = true)]
    pub browser: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Override the log format (compact|json).
    #[arg(long = "log-format", value_name = "FORMAT", global = true)]
    pub log_format: Option<String>,
}

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered sources could not be read or merged
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    /// A value was read but is not acceptable
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid {
        /// dotted key of the setting
        key: &'static str,
        /// what is wrong with it
        reason: String,
    },
    /// The log subscriber could not be installed
    #[error("failed to install tracing subscriber: {0}")]
    Telemetry(String),
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// How log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// one human readable line per event
    Compact,
    /// one json object per event
    Json,
}

#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

/// Settings for the typesetting strategy
#[derive(Debug, Clone)]
pub struct TypesetterSettings {
    /// executable to run
    pub program: PathBuf,
    /// pass preamble commands in a separate header file
    pub use_header_file: bool,
}

/// Settings for the browser strategy
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// executable to run; found on `PATH` if unset
    pub program: Option<PathBuf>,
    #[allow(missing_docs)]
    pub load_timeout: Duration,
    #[allow(missing_docs)]
    pub settle_delay: Duration,
    #[allow(missing_docs)]
    pub viewport_width: u32,
    #[allow(missing_docs)]
    pub viewport_height: u32,
}

/// Complete, validated configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// where each export's scratch files are written
    pub scratch_dir: PathBuf,
    #[allow(missing_docs)]
    pub typesetter: TypesetterSettings,
    #[allow(missing_docs)]
    pub browser: BrowserSettings,
    #[allow(missing_docs)]
    pub logging: LoggingSettings,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            scratch_dir: std::env::temp_dir().join(SCRATCH_DIR_NAME),
            typesetter: TypesetterSettings {
                program: PathBuf::from(DEFAULT_TYPESETTER),
                use_header_file: true,
            },
            browser: BrowserSettings {
                program: None,
                load_timeout: Duration::from_secs(DEFAULT_LOAD_TIMEOUT_SECS),
                settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
                viewport_width: DEFAULT_VIEWPORT_WIDTH,
                viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            },
            logging: LoggingSettings {
                level: LevelFilter::INFO,
                format: LogFormat::Compact,
            },
        }
    }
}

impl ExportConfig {
    /// The browser to run: the configured one, else the first candidate found on `PATH`.
    /// If none is found the first candidate's bare name is returned,
    /// so that an export fails with a clear message rather than configuration failing.
    pub fn browser_program(&self) -> PathBuf {
        self.browser
            .program
            .clone()
            .or_else(|| find_program(&BROWSER_CANDIDATES))
            .unwrap_or_else(|| PathBuf::from(BROWSER_CANDIDATES[0]))
    }

    /// A browser renderer with these settings
    pub fn browser_renderer(&self) -> BrowserRenderer {
        let mut renderer = BrowserRenderer::new(self.browser_program(), &self.scratch_dir);
        renderer
            .load_timeout(self.browser.load_timeout)
            .settle_delay(self.browser.settle_delay)
            .viewport(self.browser.viewport_width, self.browser.viewport_height);
        renderer
    }

    /// A typesetting renderer with these settings
    pub fn typeset_renderer(&self) -> TypesetRenderer {
        let mut renderer = TypesetRenderer::new(&self.typesetter.program, &self.scratch_dir);
        renderer.use_header_file(self.typesetter.use_header_file);
        renderer
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let mut config = ExportConfig::default();
        if let Some(dir) = non_empty_path(raw.scratch_dir) {
            config.scratch_dir = dir;
        }

        if let Some(program) = non_empty_path(raw.typesetter.program) {
            config.typesetter.program = program;
        }
        if let Some(use_header_file) = raw.typesetter.use_header_file {
            config.typesetter.use_header_file = use_header_file;
        }

        config.browser.program = non_empty_path(raw.browser.program);
        if let Some(secs) = raw.browser.load_timeout_secs {
            if secs == 0 {
                return Err(ConfigError::invalid(
                    "browser.load_timeout_secs",
                    "must be greater than zero",
                ));
            }
            config.browser.load_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = raw.browser.settle_delay_ms {
            config.browser.settle_delay = Duration::from_millis(ms);
        }
        if let Some(width) = raw.browser.viewport_width {
            config.browser.viewport_width = positive("browser.viewport_width", width)?;
        }
        if let Some(height) = raw.browser.viewport_height {
            config.browser.viewport_height = positive("browser.viewport_height", height)?;
        }

        if let Some(level) = raw.logging.level {
            config.logging.level = LevelFilter::from_str(level.trim()).map_err(|err| {
                ConfigError::invalid("logging.level", format!("failed to parse: {}", err))
            })?;
        }
        if let Some(format) = raw.logging.format {
            config.logging.format = match format.trim().to_ascii_lowercase().as_str() {
                "compact" => LogFormat::Compact,
                "json" => LogFormat::Json,
                other => {
                    return Err(ConfigError::invalid(
                        "logging.format",
                        format!("expected compact or json, not `{}`", other),
                    ))
                }
            };
        }
        Ok(config)
    }
}

fn non_empty_path(path: Option<String>) -> Option<PathBuf> {
    path.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    })
}

fn positive(key: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        Err(ConfigError::invalid(key, "must be greater than zero"))
    } else {
        Ok(value)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    scratch_dir: Option<String>,
    typesetter: RawTypesetterSettings,
    browser: RawBrowserSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTypesetterSettings {
    program: Option<String>,
    use_header_file: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBrowserSettings {
    program: Option<String>,
    load_timeout_secs: Option<u64>,
    settle_delay_ms: Option<u64>,
    viewport_width: Option<u32>,
    viewport_height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    format: Option<String>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(dir) = overrides.scratch_dir.as_ref() {
            self.scratch_dir = Some(dir.display().to_string());
        }
        if let Some(program) = overrides.typesetter.as_ref() {
            self.typesetter.program = Some(program.display().to_string());
        }
        if let Some(program) = overrides.browser.as_ref() {
            self.browser.program = Some(program.display().to_string());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(format) = overrides.log_format.as_ref() {
            self.logging.format = Some(format.clone());
        }
    }
}

/// Load configuration for `cli` from the file it names (if any),
/// the process environment and its flags
pub fn load(cli: &CliArgs) -> Result<ExportConfig, ConfigError> {
    load_layers(cli.config_file.as_deref(), None, &cli.overrides)
}

/// Load configuration as `load` does, reading environment variables from `env`
/// in place of the process environment when it is given
pub fn load_layers(
    config_file: Option<&Path>,
    env: Option<HashMap<String, String>>,
    overrides: &ConfigOverrides,
) -> Result<ExportConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(overrides);
    ExportConfig::from_raw(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_without_any_source() {
        let config = load_layers(None, env(&[]), &ConfigOverrides::default()).expect("config");
        assert_eq!(config.typesetter.program, PathBuf::from("pandoc"));
        assert!(config.typesetter.use_header_file);
        assert_eq!(config.browser.load_timeout, Duration::from_secs(30));
        assert_eq!(config.browser.settle_delay, Duration::from_millis(1000));
        assert_eq!(config.logging.level, LevelFilter::INFO);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.scratch_dir.ends_with("manuscript_export"));
    }

    #[test]
    fn file_then_env_then_cli() {
        let dir = TempDir::new().expect("temp dir");
        let file = dir.path().join("export.toml");
        fs::write(
            &file,
            "scratch_dir = \"/from/file\"\n\n[typesetter]\nprogram = \"file-pandoc\"\n\n[browser]\nload_timeout_secs = 10\nsettle_delay_ms = 250\n",
        )
        .expect("write config");

        let config = load_layers(
            Some(&file),
            env(&[
                ("MANUSCRIPT_EXPORT_TYPESETTER__PROGRAM", "env-pandoc"),
                ("MANUSCRIPT_EXPORT_BROWSER__LOAD_TIMEOUT_SECS", "5"),
            ]),
            &ConfigOverrides {
                scratch_dir: Some(PathBuf::from("/from/cli")),
                ..ConfigOverrides::default()
            },
        )
        .expect("config");

        assert_eq!(config.scratch_dir, PathBuf::from("/from/cli"));
        assert_eq!(config.typesetter.program, PathBuf::from("env-pandoc"));
        assert_eq!(config.browser.load_timeout, Duration::from_secs(5));
        assert_eq!(config.browser.settle_delay, Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = load_layers(
            None,
            env(&[("MANUSCRIPT_EXPORT_LOGGING__FORMAT", "xml")]),
            &ConfigOverrides::default(),
        )
        .expect_err("invalid format");
        assert!(matches!(err, ConfigError::Invalid { key: "logging.format", .. }));

        let err = load_layers(
            None,
            env(&[]),
            &ConfigOverrides {
                log_level: Some("loud".into()),
                ..ConfigOverrides::default()
            },
        )
        .expect_err("invalid level");
        assert!(matches!(err, ConfigError::Invalid { key: "logging.level", .. }));
    }

    #[test]
    fn configured_browser_is_used_verbatim() {
        let mut config = ExportConfig::default();
        config.browser.program = Some(PathBuf::from("/opt/chrome/chrome"));
        assert_eq!(config.browser_program(), PathBuf::from("/opt/chrome/chrome"));
        assert_eq!(
            config.browser_renderer().program(),
            Path::new("/opt/chrome/chrome")
        );
    }

    #[test]
    fn cli_parses_export_flags() {
        let cli = CliArgs::parse_from([
            "manuscript-export",
            "export",
            "--format",
            "html",
            "--include-toc",
            "false",
            "--engine",
            "lualatex",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.overrides.log_level.as_deref(), Some("debug"));
        match cli.command {
            Command::Export(args) => {
                let overrides = args.apply_to(ExportOverrides {
                    include_toc: Some(true),
                    include_cover: Some(false),
                    ..ExportOverrides::default()
                });
                assert_eq!(overrides.format, Some(ExportFormat::Html));
                assert_eq!(overrides.include_toc, Some(false));
                assert_eq!(overrides.include_cover, Some(false));
                assert_eq!(overrides.engine, Some(TypesetEngine::Lualatex));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
