//! Clap argument types.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use prscribe::models::SummaryResult;
use prscribe::output::OutputRenderer;
use prscribe::output::json::JsonRenderer;
use prscribe::output::markdown::MarkdownRenderer;

/// Summarize pull request diffs with an LLM and post the summary as a comment.
#[derive(Parser, Debug)]
#[command(name = "prscribe", version = prscribe::constants::VERSION)]
pub struct Cli {
    /// Show debug logs.
    #[arg(short, long, global = true, default_value_t = false, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors.
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Summarize the diff and post (or print) the comment.
    Run(RunArgs),

    /// Render a stored summary JSON file without calling any service.
    Render(RenderArgs),

    /// Print version and build information.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the repository (default: current directory).
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Base revision of the diff (default from config: origin/main).
    #[arg(long)]
    pub base_ref: Option<String>,

    /// Head revision of the diff (default from config: HEAD).
    #[arg(long)]
    pub head_ref: Option<String>,

    /// Pre-computed unified diff file instead of running git ("-" for stdin).
    #[arg(long)]
    pub diff_file: Option<PathBuf>,

    /// Print the comment instead of posting it.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Output format for --dry-run.
    #[arg(long, default_value = "markdown", requires = "dry_run")]
    pub format: OutputFormat,
}

/// Arguments for the `render` subcommand.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// JSON file with the three summary lists.
    #[arg(long)]
    pub summary_file: PathBuf,

    /// Output format.
    #[arg(long, default_value = "markdown")]
    pub format: OutputFormat,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl OutputFormat {
    /// Render a summary using the renderer for this format.
    pub fn render(&self, summary: &SummaryResult, markdown: &MarkdownRenderer) -> String {
        match self {
            OutputFormat::Markdown => markdown.render(summary),
            OutputFormat::Json => JsonRenderer::new(markdown.clone()).render(summary),
        }
    }
}
