//! Sentiment Eval CLI
//!
//! Runs the few-shot condition grid for the sentiment benchmark and browses
//! persisted results as per-condition series.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use sentiment_eval::{
    render_series, Condition, Corpus, EvalConfig, EvalRunner, GermEval2017, MetricName,
    ReportView, ResultsFile, RunnerConfig, SimulatedBackend, Task,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sentiment-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured condition grid and write a results file
    Evaluate {
        /// Evaluation configuration (YAML)
        #[arg(long, default_value = "eval.yaml")]
        config: String,

        /// Override the configured output directory
        #[arg(long)]
        output: Option<String>,
    },

    /// Browse a results file: tasks, metrics, then one series table
    Report {
        /// Results file (JSON)
        #[arg(long)]
        input: String,

        /// Task to inspect; omitted lists available tasks
        #[arg(long)]
        task: Option<String>,

        /// Metric to plot; omitted lists metrics for the task
        #[arg(long)]
        metric: Option<String>,
    },

    /// Show corpus statistics for the configured splits
    CorpusStats {
        /// Evaluation configuration (YAML)
        #[arg(long, default_value = "eval.yaml")]
        config: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Evaluate { config, output } => evaluate(&config, output.as_deref()),
        Commands::Report {
            input,
            task,
            metric,
        } => report(&input, task.as_deref(), metric.as_deref()),
        Commands::CorpusStats { config } => corpus_stats(&config),
    }
}

fn evaluate(config_path: &str, output_override: Option<&str>) -> Result<()> {
    let config = EvalConfig::from_file(config_path)
        .with_context(|| format!("loading config {config_path}"))?;
    let corpus = Corpus::load(&config.train_path, &config.test_path)
        .context("loading corpus splits")?;

    let task = GermEval2017;
    let backend = SimulatedBackend::new(config.seed);
    let mut results = ResultsFile::default();

    for (num_fewshot, stratified) in config.condition_grid() {
        let runner = EvalRunner::with_config(RunnerConfig {
            condition: Condition {
                num_fewshot,
                stratified,
            },
            seed: config.seed,
            limit: config.limit,
        });

        let run = runner
            .run(&task, &backend, &corpus)
            .with_context(|| format!("run {num_fewshot}-shot stratified={stratified}"))?;

        println!(
            "{}: acc={:.4} precision={:.4} recall={:.4} f1={:.4} ({} docs)",
            run.run_id,
            run.metrics.acc,
            run.metrics.precision,
            run.metrics.recall,
            run.metrics.f1,
            run.sample_count
        );

        results.insert(&run.run_id, run.metric_values());
    }

    let output_dir = output_override
        .map_or_else(|| config.output_dir.clone(), std::path::PathBuf::from);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let path = output_dir.join(format!("results_{}.json", Utc::now().format("%Y-%m-%d")));
    results
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Results written to {}", path.display());

    Ok(())
}

fn report(input: &str, task: Option<&str>, metric: Option<&str>) -> Result<()> {
    let results = ResultsFile::load(input).with_context(|| format!("loading {input}"))?;
    let store = results.normalize().context("normalizing results")?;
    let view = ReportView::new(store);

    let Some(task) = task else {
        let tasks = view.tasks();
        if tasks.is_empty() {
            println!("No tasks in {input}");
        } else {
            println!("Tasks:");
            for name in tasks {
                println!("  {name}");
            }
        }
        return Ok(());
    };

    let Some(metric) = metric else {
        let metrics = view.metrics(task);
        if metrics.is_empty() {
            println!("{task}: no data");
        } else {
            println!("Metrics for {task}:");
            for name in metrics {
                println!("  {name}");
            }
        }
        return Ok(());
    };

    let metric: MetricName = metric
        .parse()
        .with_context(|| format!("unknown metric {metric}"))?;
    let series = view.series(task, metric);
    print!("{}", render_series(task, metric, &series));

    Ok(())
}

fn corpus_stats(config_path: &str) -> Result<()> {
    let config = EvalConfig::from_file(config_path)
        .with_context(|| format!("loading config {config_path}"))?;
    let corpus = Corpus::load(&config.train_path, &config.test_path)
        .context("loading corpus splits")?;

    let task = GermEval2017;
    let stats = corpus.stats();

    println!("Corpus Statistics");
    println!("=================");
    println!("Train documents:   {}", stats.train_documents);
    println!("  labeled:         {}", stats.train_labeled);
    println!("  training view:   {}", task.training_view(&corpus.train).len());
    println!("Test documents:    {}", stats.test_documents);
    println!("  labeled:         {}", stats.test_labeled);
    println!("  test view:       {}", task.test_view(&corpus.test).len());

    Ok(())
}
