//! CloudFormation schema to typed record generator
//!
//! Reads resource specifications or registry schemas and writes one record
//! description per resource and property type.
//!
//! Usage:
//!   # Generate from a resource specification into a directory
//!   cfnbind-codegen --file CloudFormationResourceSpecification.json --output generated
//!
//!   # Generate from a registry schema piped from the aws cli
//!   aws cloudformation describe-type --type RESOURCE --type-name AWS::EC2::VPC \
//!     --query 'Schema' --output text | cfnbind-codegen --format registry
//!
//!   # Verify that a directory is up to date
//!   cfnbind-codegen --file spec.json --output generated --check --diff

mod sink;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cfnbind_core::{Catalog, GenerationReport, Generator, GeneratorConfig, SchemaFormat};
use clap::Parser;
use colored::Colorize;
use log::info;
use similar::{ChangeTag, TextDiff};

use crate::sink::{DirectorySink, StaleArtifact, StreamSink, write_catalog};

#[derive(Parser, Debug)]
#[command(name = "cfnbind-codegen")]
#[command(about = "Generate typed record descriptions from CloudFormation schemas")]
struct Args {
    /// Schema files, merged in order (reads from stdin if none given)
    #[arg(long, short)]
    file: Vec<PathBuf>,

    /// Input format: specification or registry
    #[arg(long)]
    format: Option<SchemaFormat>,

    /// Output directory (writes to stdout if not specified)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// JSON generator config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep successful records when some entries fail
    #[arg(long)]
    partial: bool,

    /// Number of types to process concurrently
    #[arg(long, short)]
    jobs: Option<usize>,

    /// Fail if the output directory is not up to date, without writing
    #[arg(long)]
    check: bool,

    /// Show diffs for artifacts that would change, without writing
    #[arg(long)]
    diff: bool,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(args).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let generator = Generator::new(config);

    let sources = read_sources(&args.file)?;
    let schema = generator
        .read(sources.iter().map(String::as_str))
        .context("Failed to parse schema")?;

    let report = if generator.config().is_concurrent() {
        generator.generate_concurrent(schema).await?
    } else {
        generator.generate(schema)?
    };
    print_failures(&report);

    let Some(catalog) = report.catalog else {
        bail!(
            "{} schema entries failed; rerun with --partial to keep the rest",
            report.failures.len()
        );
    };

    match &args.output {
        Some(dir) if args.check || args.diff => run_check(dir, &catalog, args.check, args.diff)?,
        Some(dir) => {
            let mut sink = DirectorySink::new(dir);
            let count = write_catalog(&mut sink, &catalog)?;
            println!(
                "{}",
                format!("Generated {} record(s) in {}", count, sink.root().display())
                    .green()
                    .bold()
            );
        }
        None if args.check || args.diff => bail!("--check and --diff need --output"),
        None => {
            write_catalog(&mut StreamSink::stdout(), &catalog)?;
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            GeneratorConfig::from_json(&content)
                .with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if args.partial {
        config.partial_output = true;
    }
    info!(
        "Generating from {} schema(s), {} job(s)",
        config.format,
        config.workers()
    );
    Ok(config)
}

fn read_sources(files: &[PathBuf]) -> Result<Vec<String>> {
    if files.is_empty() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        return Ok(vec![buffer]);
    }
    files
        .iter()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))
        })
        .collect()
}

fn print_failures(report: &GenerationReport) {
    for failure in &report.failures {
        eprintln!("{} {}", "Skipped:".yellow(), failure);
    }
}

fn run_check(dir: &Path, catalog: &Catalog, check: bool, show_diff: bool) -> Result<()> {
    let sink = DirectorySink::new(dir);
    let stale = sink.stale_artifacts(catalog)?;

    if stale.is_empty() {
        println!("{}", "All artifacts are up to date.".green());
        return Ok(());
    }

    if show_diff {
        for artifact in &stale {
            print_diff(artifact);
        }
    }
    println!("{}", "The following artifacts are out of date:".yellow());
    for artifact in &stale {
        if artifact.is_orphan() {
            println!("  {} (no longer generated)", artifact.path.display());
        } else {
            println!("  {}", artifact.path.display());
        }
    }
    if check {
        bail!("{} artifact(s) are out of date", stale.len());
    }
    Ok(())
}

fn print_diff(artifact: &StaleArtifact) {
    println!("\n{} {}:", "Diff for".cyan().bold(), artifact.path.display());

    let existing = artifact.existing.as_deref().unwrap_or("");
    let generated = artifact.generated.as_deref().unwrap_or("");
    let diff = TextDiff::from_lines(existing, generated);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        print!("{}{}", sign, change);
    }
}
