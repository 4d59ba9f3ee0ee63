//! Configuration loading for lda-notebook.
//!
//! Layered config: defaults -> config file -> CLI config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/lda-notebook/config.toml.
//!
//! Thresholds, the junk list and the topic-count range are corpus dependent,
//! so every one of them is a setting rather than a constant.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PipelineError;

/// Topic counts swept when none are configured.
pub const DEFAULT_TOPIC_COUNTS: [usize; 9] = [2, 3, 4, 5, 6, 7, 8, 9, 10];

/// Input table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path of the delimited input file
    #[serde(default)]
    pub path: Option<String>,

    /// Column holding the document identifier
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Column holding the full text
    #[serde(default = "default_text_column")]
    pub text_column: String,

    /// Single-character field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_id_column() -> String {
    "document_id".to_string()
}

fn default_text_column() -> String {
    "full_text".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: None,
            id_column: default_id_column(),
            text_column: default_text_column(),
            delimiter: default_delimiter(),
        }
    }
}

impl InputConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.id_column.trim().is_empty() || self.text_column.trim().is_empty() {
            return Err(PipelineError::Config(
                "id_column and text_column must be non-empty".to_string(),
            ));
        }
        if self.id_column == self.text_column {
            return Err(PipelineError::Config(format!(
                "id_column and text_column must differ, both are '{}'",
                self.id_column
            )));
        }
        self.delimiter_byte().map(|_| ())
    }

    /// Delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, PipelineError> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(PipelineError::Config(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ))),
        }
    }
}

/// Tokenizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Extra stop words, matched case-insensitively
    #[serde(default)]
    pub stop_words: Vec<String>,

    /// Merge the built-in English stop-word list
    #[serde(default = "default_true")]
    pub include_default_stop_words: bool,

    /// Tokens shorter than this (in characters) are dropped
    #[serde(default = "default_min_token_length")]
    pub min_token_length: usize,
}

fn default_true() -> bool {
    true
}

fn default_min_token_length() -> usize {
    1
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            stop_words: Vec::new(),
            include_default_stop_words: default_true(),
            min_token_length: default_min_token_length(),
        }
    }
}

impl TokenizerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.min_token_length == 0 {
            return Err(PipelineError::Config(
                "min_token_length must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Vocabulary filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Words present in at most this many documents are dropped
    #[serde(default = "default_singleton_threshold")]
    pub singleton_threshold: usize,

    /// Words present in more than this fraction of documents are dropped
    #[serde(default = "default_common_fraction")]
    pub common_fraction_threshold: f64,

    /// Explicit exclusion list, matched case-insensitively
    #[serde(default)]
    pub junk_words: Vec<String>,
}

fn default_singleton_threshold() -> usize {
    1
}

fn default_common_fraction() -> f64 {
    0.5
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            singleton_threshold: default_singleton_threshold(),
            common_fraction_threshold: default_common_fraction(),
            junk_words: Vec::new(),
        }
    }
}

impl FilterConfig {
    /// Validate thresholds.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.singleton_threshold < 1 {
            return Err(PipelineError::InvalidThreshold(format!(
                "singleton_threshold must be >= 1, got {}",
                self.singleton_threshold
            )));
        }
        if !self.common_fraction_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.common_fraction_threshold)
        {
            return Err(PipelineError::InvalidThreshold(format!(
                "common_fraction_threshold must be 0.0-1.0, got {}",
                self.common_fraction_threshold
            )));
        }
        Ok(())
    }
}

/// Topic-count sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Candidate topic counts, swept in this order
    #[serde(default = "default_topic_counts")]
    pub topic_counts: Vec<usize>,

    /// Number of top terms per topic fed to the coherence scorer
    #[serde(default = "default_top_n_terms")]
    pub top_n_terms: usize,

    /// Top-level seed; per-k seeds are derived from it
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Maximum number of fits running at once
    #[serde(default = "default_max_parallel_fits")]
    pub max_parallel_fits: usize,

    /// Per-fit timeout; a fit exceeding it counts as failed
    #[serde(default)]
    pub fit_timeout_ms: Option<u64>,
}

fn default_topic_counts() -> Vec<usize> {
    DEFAULT_TOPIC_COUNTS.to_vec()
}

fn default_top_n_terms() -> usize {
    10
}

fn default_seed() -> u64 {
    1234
}

fn default_max_parallel_fits() -> usize {
    4
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            topic_counts: default_topic_counts(),
            top_n_terms: default_top_n_terms(),
            seed: default_seed(),
            max_parallel_fits: default_max_parallel_fits(),
            fit_timeout_ms: None,
        }
    }
}

impl SweepConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.topic_counts.is_empty() {
            return Err(PipelineError::Config(
                "topic_counts must not be empty".to_string(),
            ));
        }
        if self.topic_counts.contains(&0) {
            return Err(PipelineError::Config(
                "topic_counts must not contain 0".to_string(),
            ));
        }
        if self.top_n_terms == 0 {
            return Err(PipelineError::Config("top_n_terms must be > 0".to_string()));
        }
        if self.max_parallel_fits == 0 {
            return Err(PipelineError::Config(
                "max_parallel_fits must be > 0".to_string(),
            ));
        }
        if self.fit_timeout_ms == Some(0) {
            return Err(PipelineError::Config("fit_timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory receiving exported tables
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub sweep: SweepConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> String {
    "./lda-output".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            output_dir: default_output_dir(),
            input: InputConfig::default(),
            tokenizer: TokenizerConfig::default(),
            filter: FilterConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/lda-notebook/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (LDA_*, `__` between nested keys)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, PipelineError> {
        let config_dir = ProjectDirs::from("", "", "lda-notebook")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(|e| PipelineError::Config(e.to_string()))?
            .set_default("output_dir", default_output_dir())
            .map_err(|e| PipelineError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: LDA_LOG_LEVEL, LDA_FILTER__COMMON_FRACTION_THRESHOLD,
        // LDA_SWEEP__TOPIC_COUNTS=2,4,8, etc.
        builder = builder.add_source(
            Environment::with_prefix("LDA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("tokenizer.stop_words")
                .with_list_parse_key("filter.junk_words")
                .with_list_parse_key("sweep.topic_counts"),
        );

        let config = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.input.validate()?;
        self.tokenizer.validate()?;
        self.filter.validate()?;
        self.sweep.validate()
    }

    /// Output directory with a leading `~/` expanded.
    pub fn expanded_output_dir(&self) -> PathBuf {
        if let Some(rest) = self.output_dir.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.input.id_column, "document_id");
        assert_eq!(settings.input.text_column, "full_text");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_filter_defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.singleton_threshold, 1);
        assert!((config.common_fraction_threshold - 0.5).abs() < f64::EPSILON);
        assert!(config.junk_words.is_empty());
    }

    #[test]
    fn test_sweep_defaults() {
        let config = SweepConfig::default();
        assert_eq!(config.topic_counts, vec![2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(config.top_n_terms, 10);
        assert_eq!(config.fit_timeout_ms, None);
    }

    #[test]
    fn test_filter_validation() {
        let mut config = FilterConfig::default();
        assert!(config.validate().is_ok());

        config.singleton_threshold = 0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidThreshold(_))
        ));

        config.singleton_threshold = 2;
        config.common_fraction_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidThreshold(_))
        ));

        config.common_fraction_threshold = f64::NAN;
        assert!(config.validate().is_err());

        config.common_fraction_threshold = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sweep_validation() {
        let mut config = SweepConfig::default();
        assert!(config.validate().is_ok());

        config.topic_counts = vec![];
        assert!(config.validate().is_err());

        config.topic_counts = vec![2, 0];
        assert!(config.validate().is_err());

        config.topic_counts = vec![2];
        config.fit_timeout_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delimiter_byte() {
        let mut config = InputConfig::default();
        assert_eq!(config.delimiter_byte().unwrap(), b',');

        config.delimiter = "\t".to_string();
        assert_eq!(config.delimiter_byte().unwrap(), b'\t');

        config.delimiter = ";;".to_string();
        assert!(config.delimiter_byte().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[filter]
common_fraction_threshold = 0.3
junk_words = ["elsevier", "rights"]

[sweep]
topic_counts = [3, 6, 9]
seed = 99
"#
        )
        .unwrap();

        let settings = Settings::load(Some(&file.path().to_string_lossy())).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert!((settings.filter.common_fraction_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(settings.filter.junk_words, vec!["elsevier", "rights"]);
        assert_eq!(settings.sweep.topic_counts, vec![3, 6, 9]);
        assert_eq!(settings.sweep.seed, 99);
        // Unset sections fall back to defaults
        assert_eq!(settings.sweep.top_n_terms, 10);
        assert_eq!(settings.input.id_column, "document_id");
    }

    #[test]
    fn test_load_rejects_invalid_threshold() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[filter]\nsingleton_threshold = 0").unwrap();

        let result = Settings::load(Some(&file.path().to_string_lossy()));
        assert!(matches!(result, Err(PipelineError::InvalidThreshold(_))));
    }

    #[test]
    fn test_settings_toml_roundtrip() {
        let settings = Settings::default();
        let text = toml::to_string(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed.sweep.topic_counts, settings.sweep.topic_counts);
        assert_eq!(parsed.input.delimiter, ",");
    }

    #[test]
    fn test_expanded_output_dir_plain() {
        let settings = Settings {
            output_dir: "/tmp/lda".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.expanded_output_dir(), PathBuf::from("/tmp/lda"));
    }
}
