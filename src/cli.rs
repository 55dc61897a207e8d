use anyhow::Result;
use clap::Parser;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

Copyright (c) 2025 InkyQuill
License: MIT
Source: https://github.com/InkyQuill/edx
Rust Edition: 2024"
);

#[derive(Parser, Debug)]
#[command(name = "edx")]
#[command(about = "The classic ed line editor, rebuilt in Rust")]
#[command(long_about = "EdX is a line-oriented text editor in the tradition of ed.

It reads single-line commands made of an optional address expression and a
command letter, resolves the addresses against the in-memory buffer, and
executes the edit. Regular expressions use modern Rust regex syntax.

FEATURES:
  • Full classic addressing: numbers, . $ + - ^, marks, /re/ and ?re? search
  • Substitution with & and \\1..\\9 backreferences
  • Batch and interactive global commands (g, G, v, V)
  • Undo of the most recent command, globals included
  • Atomic file writes (never a half-written file)
  • Verbose error explanations with H, or the classic terse ?

EXAMPLES:
  edx notes.txt                 Edit a file
  edx -p '*' notes.txt          Edit with a command prompt
  edx -s notes.txt              Suppress byte-count diagnostics
  printf ',s/foo/bar/g\\nwq\\n' | edx notes.txt
                                Scripted edit from a pipe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
pub struct Cli {
    /// File to edit
    #[arg(value_name = "FILE")]
    pub file: Option<String>,

    /// Command prompt string (enables the prompt)
    #[arg(short = 'p', long, value_name = "STRING")]
    #[arg(help = "Show STRING as the command prompt\nThe P command toggles it during the session.")]
    pub prompt: Option<String>,

    /// Suppress byte counts and diagnostics
    #[arg(short = 's', long)]
    #[arg(help = "Suppress byte counts printed by e, r, and w\nUseful when edx runs inside scripts.")]
    pub silent: bool,

    /// Start with verbose error explanations
    #[arg(long)]
    #[arg(help = "Print full error messages instead of the terse ?\nEquivalent to issuing H at startup.")]
    pub verbose: bool,

    /// Enable debug logging to the log file
    #[arg(long)]
    pub debug: bool,

    /// Print the configuration file path and exit
    #[arg(long = "config-path")]
    pub config_path: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Cli> {
    Ok(Cli::parse())
}
