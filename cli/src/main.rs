//! sectionrank CLI - persona-driven section ranking for PDF collections

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use sectionrank::{
    render, AnalysisConfig, AnalysisOutcome, AnalysisRequest, Analyzer, Embedder, JsonFormat,
};

#[derive(Parser)]
#[command(name = "sectionrank")]
#[command(version)]
#[command(about = "Rank PDF sections against a persona and a task", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse one collection described by an input JSON file
    Analyze {
        /// Request JSON (persona, job_to_be_done, documents)
        #[arg(value_name = "INPUT_JSON")]
        input: PathBuf,

        /// Directory holding the PDFs (default: <input dir>/PDFs, else <input dir>)
        #[arg(long, value_name = "DIR")]
        pdf_dir: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Analysis configuration JSON
        #[arg(long, value_name = "FILE", env = "SECTIONRANK_CONFIG")]
        config: Option<PathBuf>,

        /// Number of sections to report
        #[arg(long)]
        top_k: Option<usize>,

        /// Maximum sections per document
        #[arg(long)]
        cap: Option<usize>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Analyse documents one at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Print the detected outline of a PDF as JSON
    Outline {
        /// Input PDF file
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Analyse every request JSON in a directory
    Batch {
        /// Directory of request JSON files
        #[arg(value_name = "INPUT_DIR")]
        input_dir: PathBuf,

        /// Root holding one PDF directory per request (named after its file stem)
        #[arg(value_name = "PDF_ROOT")]
        pdf_root: PathBuf,

        /// Directory for the reports
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,

        /// Analysis configuration JSON
        #[arg(long, value_name = "FILE", env = "SECTIONRANK_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            input,
            pdf_dir,
            output,
            config,
            top_k,
            cap,
            compact,
            sequential,
        } => {
            let overrides = Overrides {
                top_k,
                cap,
                sequential,
            };
            cmd_analyze(
                &input,
                pdf_dir.as_deref(),
                output.as_deref(),
                config.as_deref(),
                &overrides,
                compact,
            )
        }
        Commands::Outline {
            input,
            output,
            compact,
        } => cmd_outline(&input, output.as_deref(), compact),
        Commands::Batch {
            input_dir,
            pdf_root,
            output_dir,
            config,
        } => cmd_batch(&input_dir, &pdf_root, &output_dir, config.as_deref()),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Command-line settings that take precedence over the config file.
struct Overrides {
    top_k: Option<usize>,
    cap: Option<usize>,
    sequential: bool,
}

fn load_config(
    path: Option<&Path>,
    overrides: &Overrides,
) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(p) => AnalysisConfig::from_json_file(p)?,
        None => AnalysisConfig::new(),
    };
    if let Some(k) = overrides.top_k {
        config = config.with_top_k(k);
    }
    if let Some(cap) = overrides.cap {
        config = config.with_document_cap(cap);
    }
    if overrides.sequential {
        config = config.sequential();
    }
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "local-embeddings")]
fn embedder() -> Result<Arc<dyn Embedder>, Box<dyn std::error::Error>> {
    Ok(Arc::new(sectionrank::MiniLmEmbedder::load()?))
}

#[cfg(not(feature = "local-embeddings"))]
fn embedder() -> Result<Arc<dyn Embedder>, Box<dyn std::error::Error>> {
    Ok(Arc::new(sectionrank::HashingEmbedder::new()))
}

/// `<input dir>/PDFs` when present, else the input file's directory.
fn default_pdf_dir(input: &Path) -> PathBuf {
    let base = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let pdfs = base.join("PDFs");
    if pdfs.is_dir() {
        pdfs
    } else {
        base
    }
}

fn print_warnings(outcome: &AnalysisOutcome) {
    for warning in &outcome.warnings {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn cmd_analyze(
    input: &Path,
    pdf_dir: Option<&Path>,
    output: Option<&Path>,
    config: Option<&Path>,
    overrides: &Overrides,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = AnalysisRequest::from_file(input)?;
    let config = load_config(config, overrides)?;
    let pdf_dir = pdf_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_pdf_dir(input));

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Analysing {} document(s)...", request.documents.len()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let outcome = Analyzer::new()
        .with_embedder(embedder()?)
        .with_config(config)
        .analyze(&request, &pdf_dir);
    pb.finish_and_clear();
    let outcome = outcome?;

    print_warnings(&outcome);
    let json = render::report_json(&outcome.report, json_format(compact))?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!(
            "{} {} ({} sections)",
            "Saved to".green(),
            path.display(),
            outcome.report.extracted_sections.len()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_outline(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = sectionrank::outline_to_json(input, json_format(compact))?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_batch(
    input_dir: &Path,
    pdf_root: &Path,
    output_dir: &Path,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut inputs: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
        .collect();
    inputs.sort();

    if inputs.is_empty() {
        println!("{} no request files in {}", "Nothing to do:".yellow(), input_dir.display());
        return Ok(());
    }

    fs::create_dir_all(output_dir)?;
    let overrides = Overrides {
        top_k: None,
        cap: None,
        sequential: false,
    };
    let analyzer = Analyzer::new()
        .with_embedder(embedder()?)
        .with_config(load_config(config, &overrides)?);

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut failed = 0;
    for input in &inputs {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(stem.clone());

        let result = AnalysisRequest::from_file(input)
            .and_then(|request| analyzer.analyze(&request, pdf_root.join(&stem)))
            .and_then(|outcome| {
                let json = render::report_json(&outcome.report, JsonFormat::Pretty)?;
                fs::write(output_dir.join(format!("{}.json", stem)), json)?;
                Ok(outcome)
            });

        match result {
            Ok(outcome) => {
                log::info!(
                    "{}: {} section(s), {} warning(s)",
                    stem,
                    outcome.report.extracted_sections.len(),
                    outcome.warnings.len()
                );
                for warning in &outcome.warnings {
                    pb.println(format!("{} {}: {}", "Warning:".yellow().bold(), stem, warning));
                }
            }
            Err(e) => {
                failed += 1;
                log::warn!("collection {} failed: {:?}", input.display(), e);
                pb.println(format!("{} {}: {}", "Failed:".red().bold(), stem, e));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    println!(
        "\n{} {} of {} collection(s) written to {}",
        "Done!".green().bold(),
        inputs.len() - failed,
        inputs.len(),
        output_dir.display()
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "sectionrank".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Persona-driven section ranking for PDF collections");
    println!();
    #[cfg(feature = "local-embeddings")]
    println!("Embeddings: {}", "all-MiniLM-L6-v2".dimmed());
    #[cfg(not(feature = "local-embeddings"))]
    println!("Embeddings: {}", "hashing".dimmed());
    println!("License: MIT");
}
