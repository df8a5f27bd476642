use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::runtime::DEFAULT_MAX_STEPS;

#[derive(Parser, Debug)]
#[clap(version, about = "A line-numbered BASIC interpreter")]
pub struct Args {
    /// Maximum statements executed by one RUN (0 disables the limit)
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a line-numbered program and run it
    Run {
        /// Path to the program file
        file: PathBuf,
    },

    /// Check a program file for syntax errors
    Check {
        /// Path to the program file to check
        file: PathBuf,
    },

    /// Start an interactive session
    Repl,
}
