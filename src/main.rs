//! prscribe: LLM-written pull request summaries for CI.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use prscribe::config;
use prscribe::constants;
use prscribe::context;
use prscribe::diff;
use prscribe::env;
use prscribe::models;
use prscribe::orchestrator;
use prscribe::output;
use prscribe::providers;
use prscribe::publish;

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cli::args::{Cli, Command, RenderArgs, RunArgs};
use config::Config;
use context::ExecutionContext;
use diff::{DiffSource, FileDiffSource, GitDiffSource};
use env::Env;
use orchestrator::{Pipeline, PipelineError};
use output::markdown::MarkdownRenderer;
use providers::rig::RigSummarizer;
use publish::GithubPublisher;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        match err.downcast_ref::<PipelineError>() {
            Some(pipeline_err) => cli::print_failure(pipeline_err.stage(), &format!("{err:#}")),
            None => eprintln!("Error: {err:#}"),
        }
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Run(args) => run_summary(args).await,
        Command::Render(args) => run_render(args),
        Command::Version => run_version(),
    }
}

/// Print detailed version and build information.
fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    println!("{}     {}", "target:".dimmed(), constants::TARGET);
    Ok(())
}

/// Render a stored summary JSON file to stdout.
fn run_render(args: RenderArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.summary_file)
        .with_context(|| format!("failed to read {}", args.summary_file.display()))?;
    let summary: models::SummaryResult = serde_json::from_str(&raw)
        .with_context(|| format!("invalid summary in {}", args.summary_file.display()))?;

    let config = Config::load(None, &Env::real()).context("failed to load configuration")?;
    let renderer = MarkdownRenderer::new(config.comment.marker);
    print!("{}", args.format.render(&summary, &renderer));
    Ok(())
}

async fn run_summary(args: RunArgs) -> Result<()> {
    let env = Env::real();

    let base_dir = std::fs::canonicalize(&args.path)
        .with_context(|| format!("--path directory not found: {}", args.path.display()))?;
    let repo_root = match diff::git::find_repo_root(&base_dir).await {
        Ok(root) => root,
        Err(e) if args.diff_file.is_some() => {
            tracing::debug!(error = %e, "not a git repository, using --path as root");
            base_dir
        }
        Err(e) => return Err(PipelineError::DiffUnavailable(e).into()),
    };

    let config = Config::load(Some(repo_root.as_path()), &env)
        .context("failed to load configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let base_ref = args.base_ref.unwrap_or_else(|| config.diff.base_ref.clone());
    let head_ref = args.head_ref.unwrap_or_else(|| config.diff.head_ref.clone());

    let diff_source: Arc<dyn DiffSource> = match args.diff_file {
        Some(path) => Arc::new(FileDiffSource::new(path)),
        None => Arc::new(GitDiffSource::new(repo_root)),
    };

    let summarizer = RigSummarizer::new(config.provider.clone(), config.diff.max_chars)
        .map_err(|e| PipelineError::Config(e.to_string()))?;

    let renderer = MarkdownRenderer::new(config.comment.marker.clone());
    let pipeline = Pipeline::new(
        diff_source,
        Arc::new(summarizer),
        renderer.clone(),
        base_ref,
        head_ref,
    );
    let context = ExecutionContext::from_env(&env);

    if args.dry_run {
        let dry = pipeline.dry_run(&context).await?;
        print!("{}", args.format.render(&dry.prepared.summary, &renderer));
        let target = dry
            .target
            .map_or_else(|| "no target".to_string(), |t| t.to_string());
        cli::print_success(&format!("dry run complete ({target}), nothing posted"));
        return Ok(());
    }

    let publisher = GithubPublisher::new(
        &context.api_url,
        context.repository().map_err(PipelineError::from)?,
        context.token().map_err(PipelineError::from)?,
        renderer.marker(),
    )
    .map_err(PipelineError::from)?;

    let outcome = pipeline.run(&context, &publisher).await?;

    let mut message = format!("summary posted (comment {})", outcome.comment_id);
    if outcome.replaced > 0 {
        message.push_str(&format!(", replaced {} earlier", outcome.replaced));
    }
    if let Some(url) = outcome.html_url {
        message.push_str(&format!(": {url}"));
    }
    cli::print_success(&message);
    Ok(())
}
