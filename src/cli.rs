//! Command-line argument parsing for gptplugin

use clap::Parser;
use std::path::PathBuf;

/// gptplugin - let an LLM pick a plugin for your goal
#[derive(Parser, Debug)]
#[command(name = "gptplugin")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// What you want done, in plain words
    #[arg(value_name = "GOAL", required_unless_present = "list_plugins")]
    pub goal: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Print the selection prompt instead of calling the model
    #[arg(long)]
    pub show_prompt: bool,

    /// List the registered plugins and exit
    #[arg(short, long)]
    pub list_plugins: bool,

    /// Append an audit entry for this call to FILE
    #[arg(long, value_name = "FILE")]
    pub audit_log: Option<PathBuf>,
}
