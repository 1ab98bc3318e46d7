//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How subscribed events are rendered.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored transcript
    Console,
    /// SSE `data:` frames, one JSON event each
    Sse,
}

/// CLI arguments for roundtable
#[derive(Parser, Debug)]
#[command(name = "roundtable")]
#[command(author, version, about = "AI personas hold a meeting on your topic")]
#[command(long_about = r#"
Roundtable runs a conversation between configured AI personas on a meeting
topic and streams the exchange as typed events.

A topic that mentions recruitment (e.g. "interview", "面试") switches the
loop into interview mode: paired interviewer/interviewee exchanges instead
of an open discussion ranked by speaking weight.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./roundtable.toml   Project-level config
3. ~/.config/roundtable/config.toml   Global config

Example:
  roundtable "Q3 roadmap planning"
  roundtable --rounds 6 --persona "Grace:CTO:platform architecture" \
             --persona "Sam:Engineer:frontend" "Frontend engineer interview"
"#)]
pub struct Cli {
    /// The meeting topic (interview keywords switch the mode)
    pub topic: Option<String>,

    /// Meeting title shown in prompts and the transcript
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Personas as NAME:ROLE[:EXPERTISE,...] (can be repeated)
    #[arg(short, long, value_name = "SPEC")]
    pub persona: Vec<String>,

    /// Number of exchanges to run
    #[arg(short, long, value_name = "N")]
    pub rounds: Option<u32>,

    /// Per-turn speaking budget in seconds (drives pacing)
    #[arg(long, value_name = "SECS")]
    pub speaking_time_limit: Option<u64>,

    /// Skip the closing meeting summary
    #[arg(long)]
    pub no_summary: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "console")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress typing indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Write the JSONL transcript to this path
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
}
