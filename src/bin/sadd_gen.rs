use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use sadd_disagg::app::{App, ProgressEvent, ProgressSink, RunOptions};
use sadd_disagg::config::ConfigLoader;
use sadd_disagg::error::SaddError;
use sadd_disagg::loader::CsvDatasetSource;
use sadd_disagg::output::{CsvTableSink, JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "sadd-gen")]
#[command(about = "Generate sex-and-age disaggregated population percentages per country")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the disaggregation pipeline")]
    Generate(GenerateArgs),
}

#[derive(Args, Default)]
struct GenerateArgs {
    #[arg(long, help = "Path to the config file (default: ./sadd-gen.json)")]
    config: Option<String>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Requested age labels, overriding the config (e.g. 0-4,65+)"
    )]
    labels: Option<Vec<String>>,

    #[arg(long, help = "Output CSV path, overriding the config")]
    output: Option<String>,

    #[arg(long, help = "Resolve and reconcile without writing the output file")]
    dry_run: bool,
}

struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn event(&self, event: ProgressEvent) {
        eprintln!("{}", event.message);
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(sadd) = report.downcast_ref::<SaddError>() {
            return ExitCode::from(map_exit_code(sadd));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SaddError) -> u8 {
    match error {
        SaddError::MissingConfig | SaddError::ConfigRead(_) | SaddError::ConfigParse(_) => 2,
        SaddError::InvalidAgeLabel(_) | SaddError::UnresolvableLabel { .. } => 2,
        SaddError::DatasetRead { .. }
        | SaddError::DatasetParse { .. }
        | SaddError::MissingColumn { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let args = match cli.command {
        Some(Commands::Generate(args)) => args,
        None => GenerateArgs::default(),
    };

    run_generate(args, output_mode)
}

fn run_generate(args: GenerateArgs, output_mode: OutputMode) -> miette::Result<()> {
    let mut resolved = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;

    if let Some(labels) = args.labels {
        resolved.age_labels = labels
            .iter()
            .map(|label| label.parse())
            .collect::<Result<Vec<_>, SaddError>>()
            .into_diagnostic()?;
    }
    if let Some(output) = args.output {
        resolved.output = output.into();
    }

    let source = CsvDatasetSource::new(resolved.datasets.clone());
    let sink = CsvTableSink::new(resolved.output.clone());
    let app = App::new(source, sink);
    let options = RunOptions {
        dry_run: args.dry_run,
    };

    match output_mode {
        OutputMode::NonInteractive => {
            let summary = app.generate(&resolved, options, &JsonOutput).into_diagnostic()?;
            JsonOutput::print_summary(&summary).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let summary = app
                .generate(&resolved, options, &StderrProgress)
                .into_diagnostic()?;
            print_summary(&summary);
        }
    }
    Ok(())
}

fn print_summary(summary: &sadd_disagg::app::RunSummary) {
    for label in &summary.labels {
        match &label.aggregated_buckets {
            Some(buckets) => {
                println!("{}: {} ({})", label.label, label.strategy, buckets.join(" + "))
            }
            None => println!("{}: {}", label.label, label.strategy),
        }
    }
    println!(
        "{} locations resolved, {} dropped",
        summary.locations_resolved,
        summary.locations_dropped.len()
    );
    for name in &summary.locations_dropped {
        println!("  dropped: {name}");
    }
    match &summary.output {
        Some(path) => println!("{} rows written to {path}", summary.rows),
        None => println!("dry run, nothing written"),
    }
}
