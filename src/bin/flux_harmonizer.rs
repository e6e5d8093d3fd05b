use std::collections::BTreeMap;
use std::io::Write;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use flux_harmonizer::app::{App, HarmonizeResult, ProgressSink};
use flux_harmonizer::config::{
    Config, ConfigLoader, ResolvedConfig, SamplesEntry, SourceEntry, SourceEntryObject,
};
use flux_harmonizer::domain::{Author, Experiment, KurataMode};
use flux_harmonizer::error::FluxError;
use flux_harmonizer::output::{JsonOutput, OutputFormat, StderrProgress};

#[derive(Parser)]
#[command(name = "flux-harmonizer")]
#[command(about = "Harmonize kinetic-model flux predictions into one glucose-normalized table")]
#[command(version, author)]
struct Cli {
    /// Suppress progress messages on stderr.
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Load, correct and normalize simulation outputs")]
    Harmonize(HarmonizeArgs),
    #[command(about = "List the sample to file table of a simulation set")]
    Catalog(CatalogArgs),
    #[command(about = "Show the variables stored in a .mat file")]
    Inspect(InspectArgs),
}

#[derive(Args)]
struct HarmonizeArgs {
    /// Run file; defaults to flux-harmonizer.json when no --author is given.
    #[arg(long)]
    config: Option<String>,

    #[arg(long, requires_all = ["experiment", "id_map"])]
    author: Option<Author>,

    #[arg(long)]
    experiment: Option<Experiment>,

    /// Sample names, or `all`.
    #[arg(long, value_delimiter = ',')]
    samples: Vec<String>,

    /// Directory holding the simulation files of the ad hoc source.
    #[arg(long)]
    data_dir: Option<String>,

    #[arg(long)]
    id_map: Option<String>,

    #[arg(long)]
    mode: Option<KurataMode>,

    #[arg(long)]
    output: Option<String>,

    #[arg(long)]
    format: Option<OutputFormat>,
}

#[derive(Args)]
struct CatalogArgs {
    #[arg(long)]
    author: Author,

    #[arg(long)]
    experiment: Experiment,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InspectArgs {
    path: String,

    /// Dotted path into the file, e.g. `sol.y`.
    #[arg(long)]
    variable: Option<String>,

    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<FluxError>() {
            return ExitCode::from(error.exit_code());
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::new();

    match cli.command {
        Commands::Harmonize(args) => run_harmonize(args, app, cli.quiet),
        Commands::Catalog(args) => run_catalog(args, app),
        Commands::Inspect(args) => run_inspect(args, app),
    }
}

fn run_harmonize(args: HarmonizeArgs, app: App, quiet: bool) -> miette::Result<()> {
    let mut resolved = resolve_harmonize(&args)?;
    if let Some(output) = &args.output {
        resolved.output = Some(Utf8PathBuf::from(output));
    }
    if let Some(format) = args.format {
        resolved.format = format;
    }

    let sink: &dyn ProgressSink = if quiet { &JsonOutput } else { &StderrProgress };
    let result = app.harmonize(&resolved, sink)?;

    match &resolved.output {
        Some(output) => {
            app.write(&result, output, resolved.format, sink)?;
            if !quiet {
                print_summary(&result, output.as_str());
            }
        }
        None => {
            let bytes = resolved.format.render(&result.table)?;
            std::io::stdout().write_all(&bytes).into_diagnostic()?;
        }
    }
    Ok(())
}

fn resolve_harmonize(args: &HarmonizeArgs) -> miette::Result<ResolvedConfig> {
    let Some(author) = args.author else {
        return Ok(ConfigLoader::resolve(args.config.as_deref())?);
    };
    let experiment = args.experiment.unwrap_or(Experiment::Knockouts);
    let id_map = args
        .id_map
        .clone()
        .ok_or(FluxError::MissingIdMap(author))?;
    let data_dir = args.data_dir.clone().unwrap_or_else(|| ".".to_string());

    let config = Config {
        data_dir: Some(data_dir.clone()),
        id_maps: BTreeMap::from([(author.dir_name().to_string(), id_map)]),
        sources: vec![SourceEntry::Detailed(SourceEntryObject {
            author: author.dir_name().to_string(),
            experiment: experiment.as_str().to_string(),
            samples: (!args.samples.is_empty()).then(|| SamplesEntry::Many(args.samples.clone())),
            mode: args.mode,
            dir: Some(data_dir),
            files: None,
        })],
        ..Config::default()
    };
    Ok(ConfigLoader::resolve_config(config)?)
}

fn print_summary(result: &HarmonizeResult, output: &str) {
    let green = "\x1b[32m";
    let cyan = "\x1b[36m";
    let yellow = "\x1b[33m";
    let reset = "\x1b[0m";

    eprintln!("{cyan}flux-harmonizer summary{reset}");
    eprintln!("{green}rows written: {} -> {output}{reset}", result.table.len());
    for source in &result.sources {
        eprintln!(
            "{green}  {} {} samples, {} rows{reset}",
            source.source,
            source.samples.len(),
            source.rows
        );
    }
    for summary in result.table.summary() {
        if summary.mapped < summary.rows {
            eprintln!(
                "{yellow}  {} {}: {} of {} rows without a BiGG id{reset}",
                summary.author,
                summary.sample_id,
                summary.rows - summary.mapped,
                summary.rows
            );
        }
    }
}

fn run_catalog(args: CatalogArgs, app: App) -> miette::Result<()> {
    let result = app.catalog(args.author, args.experiment)?;
    if args.json {
        JsonOutput::print_catalog(&result).into_diagnostic()?;
        return Ok(());
    }
    println!("{} {}", result.author, result.experiment);
    let width = result
        .entries
        .iter()
        .map(|entry| entry.sample.len())
        .max()
        .unwrap_or(0);
    for entry in &result.entries {
        println!("  {:<width$}  {}", entry.sample, entry.file);
    }
    Ok(())
}

fn run_inspect(args: InspectArgs, app: App) -> miette::Result<()> {
    let path = Utf8PathBuf::from(args.path);
    let (mat, result) = app.inspect(&path)?;

    if let Some(variable) = &args.variable {
        let (name, rest) = variable.split_once('.').unwrap_or((variable.as_str(), ""));
        let value = mat
            .get(name)
            .and_then(|value| value.lookup(rest))
            .ok_or_else(|| FluxError::MissingVariable {
                path: path.to_string(),
                name: variable.clone(),
            })?;
        JsonOutput::print_json(&value.to_json()).into_diagnostic()?;
        return Ok(());
    }

    if args.json {
        JsonOutput::print_json(&mat.to_json()).into_diagnostic()?;
        return Ok(());
    }

    println!("{}", result.description);
    for variable in &result.variables {
        println!("  {} {} {:?}", variable.name, variable.kind, variable.shape);
    }
    Ok(())
}
