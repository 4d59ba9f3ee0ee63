//! CLI argument parsing for lda-notebook.
//!
//! Flags given here override the config file and `LDA_*` environment.

use clap::{Parser, Subcommand};

/// LDA notebook pipeline
///
/// Prepares a document-term matrix from a table of abstracts and scores
/// topic models by coherence.
#[derive(Parser, Debug)]
#[command(name = "lda-notebook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/lda-notebook/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Pipeline commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tokenize, filter and write the document-term matrix
    Prepare {
        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Score an externally fitted model's word-topic table
    Score {
        /// Number of topics in the model
        #[arg(short, long)]
        k: usize,

        /// CSV with topic, word and beta columns
        #[arg(short, long)]
        beta: String,

        /// Top terms per topic to score
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Print the seed each candidate topic count would be fitted with
    Seeds {
        /// Comma-separated topic counts (default from config)
        #[arg(short, long, value_delimiter = ',')]
        topic_counts: Option<Vec<usize>>,

        /// Top-level seed (default from config)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Input and output overrides shared by corpus commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CorpusArgs {
    /// Input CSV (overrides input.path)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output directory (overrides output_dir)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Over-common threshold as a fraction of documents
    #[arg(long)]
    pub common_fraction: Option<f64>,

    /// Words in at most this many documents are dropped
    #[arg(long)]
    pub singleton_threshold: Option<usize>,

    /// Extra stop words, comma separated
    #[arg(long, value_delimiter = ',')]
    pub stop_words: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_prepare() {
        let cli = Cli::parse_from(["lda-notebook", "prepare", "-i", "records.csv"]);
        match cli.command {
            Commands::Prepare { corpus } => {
                assert_eq!(corpus.input, Some("records.csv".to_string()));
                assert!(corpus.output_dir.is_none());
            }
            _ => panic!("Expected Prepare command"),
        }
    }

    #[test]
    fn test_cli_prepare_thresholds() {
        let cli = Cli::parse_from([
            "lda-notebook",
            "prepare",
            "--common-fraction",
            "0.4",
            "--singleton-threshold",
            "2",
            "--stop-words",
            "salmon,aquaculture",
        ]);
        match cli.command {
            Commands::Prepare { corpus } => {
                assert_eq!(corpus.common_fraction, Some(0.4));
                assert_eq!(corpus.singleton_threshold, Some(2));
                assert_eq!(corpus.stop_words, vec!["salmon", "aquaculture"]);
            }
            _ => panic!("Expected Prepare command"),
        }
    }

    #[test]
    fn test_cli_score() {
        let cli = Cli::parse_from(["lda-notebook", "score", "-k", "6", "--beta", "beta.csv"]);
        match cli.command {
            Commands::Score { k, beta, top_n, .. } => {
                assert_eq!(k, 6);
                assert_eq!(beta, "beta.csv");
                assert_eq!(top_n, None);
            }
            _ => panic!("Expected Score command"),
        }
    }

    #[test]
    fn test_cli_score_requires_beta() {
        let result = Cli::try_parse_from(["lda-notebook", "score", "-k", "6"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_seeds() {
        let cli = Cli::parse_from(["lda-notebook", "seeds", "--topic-counts", "2,4,8", "-s", "7"]);
        match cli.command {
            Commands::Seeds { topic_counts, seed } => {
                assert_eq!(topic_counts, Some(vec![2, 4, 8]));
                assert_eq!(seed, Some(7));
            }
            _ => panic!("Expected Seeds command"),
        }
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["lda-notebook", "--config", "/path/to/config.toml", "config"]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_cli_with_log_level() {
        let cli = Cli::parse_from(["lda-notebook", "prepare", "--log-level", "debug"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }
}
