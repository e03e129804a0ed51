use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use quotation_cleaner::app::{decode_records, CleanUseCase, DedupeUseCase, ValidateUseCase};
use quotation_cleaner::config::Config;
use quotation_cleaner::infra::json_store::read_array;
use quotation_cleaner::infra::{split_json_file, JsonRecordStore};
use quotation_cleaner::logging;
use quotation_cleaner::types::RawRecord;

#[derive(Parser)]
#[command(name = "quotation_cleaner")]
#[command(about = "Cleans and de-duplicates scraped product quotation records")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check required fields and split the complete rows into parts
    Validate {
        /// JSON array of raw rows
        #[arg(long)]
        input: PathBuf,
    },
    /// Normalize every JSON file of a directory
    Clean {
        /// Defaults to the configured split directory
        #[arg(long)]
        input_dir: Option<PathBuf>,
    },
    /// Resolve duplicate titles across every JSON file of a directory
    Dedupe {
        /// Defaults to the configured cleaned directory
        #[arg(long)]
        input_dir: Option<PathBuf>,
    },
    /// Run validate, clean and dedupe in sequence
    Run {
        #[arg(long)]
        input: PathBuf,
    },
    /// Split one JSON array file into numbered parts
    Split {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        chunk_size: Option<usize>,
    },
}

fn store(dir: &Path, config: &Config) -> Box<JsonRecordStore> {
    Box::new(JsonRecordStore::new(dir, config.output.indent))
}

fn run_validate(config: &Config, input: &Path) -> Result<()> {
    let values = read_array(input).with_context(|| format!("reading {}", input.display()))?;
    let records: Vec<RawRecord> = decode_records(values, &input.to_string_lossy());
    let validated = &config.paths.validated_dir;

    let use_case = ValidateUseCase::new(
        config.required_fields.clone(),
        store(&validated.join("complete"), config),
        store(&validated.join("incomplete"), config),
        store(&validated.join("logs"), config),
    );
    let suffix = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let run = use_case.run(records, &suffix)?;

    println!("\n📋 Validation results:\n{}", run.report);
    match run.complete_file {
        Some(complete_file) => {
            let split = split_json_file(
                &complete_file,
                Some(config.paths.split_dir.as_path()),
                config.split.chunk_size,
                config.output.indent,
            )?;
            println!("✂️  Split complete rows:\n{}", split);
        }
        None => warn!("No complete rows, nothing to split"),
    }
    Ok(())
}

fn run_clean(config: &Config, input_dir: &Path) -> Result<()> {
    let use_case = CleanUseCase::with_default_normalizer(
        store(input_dir, config),
        store(&config.paths.cleaned_dir, config),
        store(&config.paths.cleaning_error_dir, config),
    );
    let run = use_case.run()?;

    println!("\n🧹 Cleaning results ({} files):", run.files_processed);
    println!("   {}", run.report());
    Ok(())
}

fn run_dedupe(config: &Config, input_dir: &Path) -> Result<()> {
    let use_case = DedupeUseCase::new(
        store(input_dir, config),
        store(&config.paths.unique_dir, config),
        store(&config.paths.duplicate_dir, config),
        config.dedupe.chunk_size,
    );
    let summary = use_case.run()?;

    println!("\n🔍 Dedupe results:");
    println!("   Files read: {}", summary.total_files);
    println!("   Products: {}", summary.total_products);
    println!("   Unique: {} ({} files)", summary.unique_products, summary.unique_files);
    println!("   Duplicate: {} ({} files)", summary.duplicate_products, summary.duplicate_files);
    println!("   Collapsed: {}", summary.collapsed_count);
    println!("   Missing title: {}", summary.missing_title_count);
    println!("   Undecodable: {}", summary.undecodable_count);
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let _guard = logging::init_logging(&config.logging);

    match cli.command {
        Commands::Validate { input } => run_validate(&config, &input)?,
        Commands::Clean { input_dir } => {
            let input_dir = input_dir.unwrap_or_else(|| config.paths.split_dir.clone());
            run_clean(&config, &input_dir)?
        }
        Commands::Dedupe { input_dir } => {
            let input_dir = input_dir.unwrap_or_else(|| config.paths.cleaned_dir.clone());
            run_dedupe(&config, &input_dir)?
        }
        Commands::Run { input } => {
            info!("Running full pipeline on {}", input.display());
            run_validate(&config, &input)?;
            run_clean(&config, &config.paths.split_dir)?;
            run_dedupe(&config, &config.paths.cleaned_dir)?;
        }
        Commands::Split {
            input,
            output_dir,
            chunk_size,
        } => {
            let result = split_json_file(
                &input,
                output_dir.as_deref(),
                chunk_size.unwrap_or(config.split.chunk_size),
                config.output.indent,
            )?;
            println!("\n✂️  Split results:\n{}", result);
        }
    }

    Ok(())
}
