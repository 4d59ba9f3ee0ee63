//! lda-notebook
//!
//! Corpus preparation and coherence scoring for LDA topic modelling.
//!
//! # Usage
//!
//! ```bash
//! lda-notebook prepare --input records.csv [--output-dir DIR]
//! lda-notebook score --k 6 --beta beta_k6.csv --input records.csv
//! lda-notebook seeds [--topic-counts 2,4,8] [--seed 1234]
//! lda-notebook config
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/lda-notebook/config.toml)
//! 3. File given with --config
//! 4. Environment variables (LDA_*)
//! 5. CLI flags
//!
//! Exits with status 2 when the input table or thresholds are unusable and
//! 1 on any other error.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use lda_cli::{
    apply_corpus_args, exit_code, init_logging, load_settings, run_prepare, run_score,
    show_config, show_seeds, Cli, Commands,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref())?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Prepare { corpus } => {
            apply_corpus_args(&mut settings, &corpus)?;
            run_prepare(&settings)?;
        }
        Commands::Score {
            k,
            beta,
            top_n,
            corpus,
        } => {
            apply_corpus_args(&mut settings, &corpus)?;
            run_score(&settings, k, Path::new(&beta), top_n)?;
        }
        Commands::Seeds { topic_counts, seed } => {
            show_seeds(&settings, topic_counts, seed)?;
        }
        Commands::Config => {
            show_config(&settings)?;
        }
    }

    Ok(())
}
