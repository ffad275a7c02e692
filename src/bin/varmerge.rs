//! varmerge CLI - reconcile clinical variant tables with VEP annotations
//!
//! Three pipelines:
//! - `normalize`: raw VEP output -> normalized annotation table
//! - `merge`: gene-filtered clinical table + normalized annotations -> merged table + log
//! - `vcf`: gene-filtered clinical table -> minimal VCF body

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use varmerge::{
    filter_by_gene, read_csv, read_vep, vcf, write_table_to_path, AnnotationNormalizer,
    AnnotationSchema, OutputFormat, UnmatchedLog, VariantMatcher,
};

#[derive(Parser)]
#[command(name = "varmerge")]
#[command(version, about = "Reconcile clinical variant tables with VEP functional annotations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Unpack the VEP Extra column into a normalized annotation table
    Normalize {
        /// Raw VEP tab-delimited output
        input: PathBuf,

        /// Normalized annotation table to write
        output: PathBuf,

        /// Annotation schema YAML (default: $VARMERGE_SCHEMA or built-in)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Output format (csv, ndjson)
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,
    },

    /// Attach the best normalized annotation to every clinical record of a gene
    Merge {
        /// Gene symbol to keep from the clinical table
        gene_name: String,

        /// Clinical variant table (CSV)
        clinvar_path: PathBuf,

        /// Normalized annotation table (CSV)
        vep_path: PathBuf,

        /// Merged table to write
        output_path: PathBuf,

        /// Unmatched-variant log to write
        log_path: PathBuf,

        /// Output format (csv, ndjson)
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,
    },

    /// Write a minimal VCF for the clinical records of a gene
    Vcf {
        /// Gene symbol to keep from the clinical table
        #[arg(long = "gene_name", alias = "gene-name")]
        gene_name: String,

        /// Clinical variant table (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// VCF file to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Normalize {
            input,
            output,
            schema,
            format,
        } => normalize(&input, &output, schema.as_deref(), format),
        Commands::Merge {
            gene_name,
            clinvar_path,
            vep_path,
            output_path,
            log_path,
            format,
        } => merge(&gene_name, &clinvar_path, &vep_path, &output_path, &log_path, format),
        Commands::Vcf {
            gene_name,
            input,
            output,
        } => generate_vcf(&gene_name, &input, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Normalize raw VEP output
fn normalize(
    input: &Path,
    output: &Path,
    schema: Option<&Path>,
    format: OutputFormat,
) -> Result<(), String> {
    println!("🔧 Normalizing {}...", input.display());

    let schema = AnnotationSchema::resolve(schema)?;
    let normalizer = AnnotationNormalizer::new(schema).map_err(|e| e.to_string())?;

    let raw = read_vep(input)
        .map_err(|e| format!("Failed to read VEP output {}: {}", input.display(), e))?;
    println!("  ✓ Loaded {} annotation rows", raw.len());

    let normalized = normalizer.normalize(&raw).map_err(|e| e.to_string())?;

    write_table_to_path(&normalized, format, output)
        .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;

    println!(
        "  ✓ Wrote {} rows x {} columns to {}",
        normalized.len(),
        normalized.columns().len(),
        output.display()
    );
    println!("✨ Normalization complete!");

    Ok(())
}

/// Merge clinical records with normalized annotations
fn merge(
    gene_name: &str,
    clinvar_path: &Path,
    vep_path: &Path,
    output_path: &Path,
    log_path: &Path,
    format: OutputFormat,
) -> Result<(), String> {
    println!("🔗 Merging {} variants...", gene_name);

    let clinical = read_csv(clinvar_path)
        .map_err(|e| format!("Failed to read {}: {}", clinvar_path.display(), e))?;
    let clinical = filter_by_gene(&clinical, gene_name).map_err(|e| e.to_string())?;
    println!("  ✓ {} clinical records for {}", clinical.len(), gene_name);

    let annotations = read_csv(vep_path)
        .map_err(|e| format!("Failed to read {}: {}", vep_path.display(), e))?;
    println!("  ✓ Loaded {} annotation rows", annotations.len());

    let mut log = UnmatchedLog::create(log_path)
        .map_err(|e| format!("Failed to create log {}: {}", log_path.display(), e))?;

    let report = VariantMatcher::new()
        .run(&clinical, &annotations, &mut log)
        .map_err(|e| e.to_string())?;

    tracing::info!(
        "Matches by step: feature={}, existing_variation={}, codons={}, tie_break={}",
        report.stats.by_feature,
        report.stats.by_existing_variation,
        report.stats.by_codons,
        report.stats.by_tie_break
    );

    write_table_to_path(&report.merged, format, output_path)
        .map_err(|e| format!("Failed to write {}: {}", output_path.display(), e))?;

    println!(
        "  ✓ Merged {} records into {}",
        report.stats.matched,
        output_path.display()
    );
    if report.stats.unmatched > 0 {
        println!(
            "  ℹ {} records could not be merged, see {}",
            report.stats.unmatched,
            log_path.display()
        );
    }
    println!("✨ Merge complete!");

    Ok(())
}

/// Write a VCF body for one gene
fn generate_vcf(gene_name: &str, input: &Path, output: &Path) -> Result<(), String> {
    println!("🧬 Generating VCF for {}...", gene_name);

    let clinical = read_csv(input)
        .map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;
    let filtered = filter_by_gene(&clinical, gene_name).map_err(|e| e.to_string())?;

    let file = File::create(output)
        .map_err(|e| format!("Failed to create {}: {}", output.display(), e))?;
    let written = vcf::write_vcf(&filtered, BufWriter::new(file)).map_err(|e| e.to_string())?;

    println!("  ✓ Wrote {} records to {}", written, output.display());
    println!("✨ VCF generation complete!");

    Ok(())
}
