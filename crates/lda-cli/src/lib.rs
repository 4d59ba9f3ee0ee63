//! lda-notebook command-line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (prepare, score, seeds, config)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, CorpusArgs};
pub use commands::{
    apply_corpus_args, exit_code, init_logging, load_settings, run_prepare, run_score, show_config,
    show_seeds,
};
