//! spectrum-bridge - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use spectrum_bridge::{
    aggregator::{AggregateReport, OverallStatus},
    bootstrap::{Bootstrap, BootstrapStatus},
    cli::{Args, Commands, Verbosity},
    config::Config,
    logging::init_logging,
    report::{JsonAssembler, MarkdownAssembler, ReportAssembler},
    retry::RetryPolicy,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Runs before loading so a broken file can be replaced
    if let Commands::InitConfig { force } = &args.command {
        return init_config(&args, *force);
    }

    let mut config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    if let Some(level) = args.verbosity().log_level() {
        config.logging.level = level.to_string();
    }
    init_logging(&config.logging)?;

    match &args.command {
        Commands::Ask { .. } => run_ask(&args, config).await?,
        Commands::Search {
            query,
            top_k,
            min_score,
            by_source,
        } => run_search(config, query, *top_k, *min_score, *by_source).await?,
        Commands::Stats => run_stats(config).await?,
        Commands::Config => show_config(&args, &config),
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

async fn run_ask(args: &Args, config: Config) -> Result<()> {
    let Commands::Ask {
        json,
        markdown_out,
        retries,
        ..
    } = &args.command
    else {
        return Ok(());
    };
    let Some(request) = args.command.to_request() else {
        return Ok(());
    };

    let bootstrap = Bootstrap::new(config)?;
    if bootstrap.check().await == BootstrapStatus::OllamaNotRunning {
        eprintln!("{}", "Ollama is not running!".red().bold());
        eprintln!("\nStart Ollama with: ollama serve");
        std::process::exit(2);
    }
    let pipeline = bootstrap.pipeline()?;

    let spinner = spinner(args.verbosity(), "Retrieving and enriching...");
    let policy = RetryPolicy::new(*retries);
    let report = policy.run(|| pipeline.scheduler.process(&request)).await;
    spinner.finish_and_clear();

    if let Some(path) = markdown_out {
        MarkdownAssembler.write_to(&report, path)?;
    }

    if *json {
        println!("{}", JsonAssembler.render(&report)?);
    } else {
        print_report(&report, args.verbosity());
    }

    if report.is_failed() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_search(
    config: Config,
    query: &str,
    top_k: Option<usize>,
    min_score: Option<f32>,
    by_source: bool,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let min_score = min_score.unwrap_or(config.retrieval.min_score);
    let gateway = Bootstrap::new(config)?.gateway()?;

    if by_source {
        let passages = gateway.search_by_source(query, top_k).await?;
        println!("{} {} chunk(s) from {}", "✓".green(), passages.len(), query.bold());
        for passage in passages {
            println!("\n[{}] {}", passage.chunk_index, passage.text);
        }
        return Ok(());
    }

    let outcome = gateway.retrieve(query, top_k, min_score).await;
    if !outcome.succeeded {
        let reason = outcome.error.unwrap_or_default();
        eprintln!("{} {}", "✗ Retrieval failed:".red(), reason);
        std::process::exit(1);
    }

    println!(
        "{} {} passage(s) in {}ms",
        "✓".green(),
        outcome.passages.len(),
        outcome.elapsed_ms
    );
    for (i, passage) in outcome.passages.iter().enumerate() {
        println!(
            "\n{}. {} ({:.3})",
            i + 1,
            passage.source_id.bold(),
            passage.relevance_score
        );
        println!("{}", passage.text);
    }
    Ok(())
}

async fn run_stats(config: Config) -> Result<()> {
    let collection = config.services.collection.clone();
    let gateway = Bootstrap::new(config)?.gateway()?;
    let stats = gateway.statistics().await?;

    println!("Knowledge base: {}", collection.bold());
    println!("  Total chunks: {}", stats.total_chunks);
    Ok(())
}

fn init_config(args: &Args, force: bool) -> Result<()> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path().context("Could not determine home directory")?,
    };

    if path.exists() && !force {
        eprintln!(
            "{} {} already exists (use --force to overwrite)",
            "✗".red(),
            path.display()
        );
        std::process::exit(1);
    }

    Config::default().save(&path)?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

fn show_config(args: &Args, config: &Config) {
    println!("{}", "spectrum-bridge configuration".bold());
    println!();
    println!("Services:");
    println!("  Ollama:          {}", config.ollama_url());
    println!("  Generation:      {}", config.services.generation_model);
    println!(
        "  Embeddings:      {} ({})",
        config.services.embedding_model, config.services.embedding_backend
    );
    println!(
        "  Qdrant:          {} / {}",
        config.services.qdrant_url, config.services.collection
    );
    println!("  Images:          {}", config.services.image_endpoint);
    println!();
    println!("Retrieval:");
    println!("  top_k:           {}", config.retrieval.top_k);
    println!("  min_score:       {}", config.retrieval.min_score);
    println!();
    println!("Scheduler:");
    println!(
        "  Timeouts (s):    simplify {}, story {}, image {}",
        config.scheduler.simplify_timeout_sec,
        config.scheduler.story_timeout_sec,
        config.scheduler.image_timeout_sec
    );
    println!("  Context chars:   {}", config.scheduler.max_context_chars);
    match config.scheduler.max_workers {
        Some(n) => println!("  Max workers:     {}", n),
        None => println!("  Max workers:     one per task"),
    }
    println!();
    println!("Verbosity:         {:?}", args.verbosity());
}

fn spinner(verbosity: Verbosity, message: &'static str) -> ProgressBar {
    if !verbosity.show_progress() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_report(report: &AggregateReport, verbosity: Verbosity) {
    let status = match report.overall_status {
        OverallStatus::Success => report.overall_status.to_string().green().bold(),
        OverallStatus::Partial => report.overall_status.to_string().yellow().bold(),
        OverallStatus::Failed => report.overall_status.to_string().red().bold(),
    };
    println!(
        "{} {} ({:.2}s)",
        "Status:".bold(),
        status,
        report.total_elapsed_ms as f64 / 1000.0
    );

    if let Some(reason) = &report.failure_reason {
        println!("{} {}", "Reason:".bold(), reason);
        return;
    }

    println!(
        "{} {} passage(s) in {}ms",
        "Retrieved:".bold(),
        report.retrieval.passages.len(),
        report.retrieval.elapsed_ms
    );

    if let Some(text) = report.simplified_text() {
        println!("\n{}\n{}", "Simple explanation".cyan().bold(), text);
    }

    if let Some((title, story)) = report.story() {
        println!("\n{}\n{}", title.cyan().bold(), story);
    }

    if let Some((prompt, path)) = report.image() {
        match path {
            Some(path) => println!("\n{} {}", "Image saved:".cyan().bold(), path.display()),
            None => println!("\n{} {}", "Image generated:".cyan().bold(), prompt),
        }
    }

    for failed in report.failed_tasks() {
        println!(
            "{} {}: {}",
            "✗".red(),
            failed.task_name,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }

    if !matches!(verbosity, Verbosity::Quiet) {
        println!("\n{}", "Sources".bold());
        for (i, (source, score)) in report.retrieval.sources().into_iter().enumerate() {
            println!("  {}. {} ({:.2})", i + 1, source, score);
        }
        println!(
            "\n{} {}",
            "Completed:".dimmed(),
            report
                .tasks_completed
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" → ")
        );
    }
}
