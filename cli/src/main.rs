//! pdfprobe CLI - multi-engine PDF parsing tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfprobe::engine::LopdfBackend;
use pdfprobe::{default_registry, ground_truth, output, Availability, JsonFormat, PdfEngine};

#[derive(Parser)]
#[command(name = "pdfprobe")]
#[command(version)]
#[command(about = "Parse PDFs with multiple engines into one JSON shape", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a PDF with one engine and emit the common JSON shape
    Parse {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Engine to use
        #[arg(short, long, default_value = "text")]
        engine: String,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Parse a PDF with every available engine, one JSON file each
    Compare {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// List engines and their availability
    Engines,

    /// Extract ground-truth annotations from a LaTeX aux file
    Gt {
        /// Compiled .aux file
        #[arg(value_name = "AUX")]
        aux: PathBuf,

        /// Document id recorded in the sidecar
        #[arg(long)]
        doc_id: Option<String>,

        /// Page width in points
        #[arg(long, default_value_t = ground_truth::A4_WIDTH_PT)]
        page_width: f64,

        /// Page height in points
        #[arg(long, default_value_t = ground_truth::A4_HEIGHT_PT)]
        page_height: f64,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input,
            engine,
            output,
            compact,
        } => cmd_parse(&input, &engine, output.as_deref(), compact),
        Commands::Compare { input, output } => cmd_compare(&input, output.as_deref()),
        Commands::Engines => {
            cmd_engines();
            Ok(())
        }
        Commands::Gt {
            aux,
            doc_id,
            page_width,
            page_height,
            output,
        } => cmd_gt(&aux, doc_id, page_width, page_height, output.as_deref()),
        Commands::Info { input } => cmd_info(&input),
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

fn cmd_parse(
    input: &Path,
    engine: &str,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = default_registry();

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Parsing with {engine}..."));
    let result = registry.parse_with(engine, input);
    pb.finish_and_clear();
    let result = result?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = output::to_json(&result, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_compare(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let registry = default_registry();
    let names = registry.names();

    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_parsed", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    let mut written = Vec::new();
    for name in names {
        pb.set_message(format!("Parsing with {name}..."));
        match registry.parse_with(name, input) {
            Ok(result) => {
                let path = output_dir.join(format!("{name}.json"));
                output::write_json(&result, &path, JsonFormat::Pretty)?;
                written.push(name.to_string());
            }
            Err(e) => {
                pb.println(format!("{} {name}: {e}", "Skipped".yellow()));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    println!("\n{}", "Output files:".green().bold());
    for name in &written {
        println!("  {} {}.json", "├─".dimmed(), name);
    }

    Ok(())
}

fn cmd_engines() {
    let registry = default_registry();

    println!("{}", "Engines".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for name in registry.names() {
        let Some(engine) = registry.get(name) else {
            continue;
        };
        match engine.availability() {
            Availability::Available => {
                println!("{} {}", "✓".green(), name.bold());
            }
            Availability::Unavailable { reason } => {
                println!("{} {} {}", "✗".red(), name.bold(), format!("({reason})").dimmed());
            }
        }
    }
}

fn cmd_gt(
    aux: &Path,
    doc_id: Option<String>,
    page_width: f64,
    page_height: f64,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let annotations = ground_truth::extract(aux, page_height)?;
    let doc_id = doc_id.unwrap_or_else(|| {
        aux.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let mut file = ground_truth::GroundTruthFile::new(doc_id, page_width, page_height);
    file.annotations = annotations;

    if let Some(path) = output {
        ground_truth::write_sidecar(path, &file)?;
        println!(
            "{} {} annotations -> {}",
            "Extracted".green(),
            file.annotations.len(),
            path.display()
        );
    } else {
        println!("{}", serde_json::to_string_pretty(&file)?);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    use pdfprobe::engine::PdfBackend;

    let backend = LopdfBackend::load_file(input)?;
    let metadata = backend.metadata();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), backend.version());
    println!("{}: {}", "Pages".bold(), backend.page_count());
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if backend.is_encrypted() { "Yes" } else { "No" }
    );

    for key in ["title", "author", "subject", "creator", "producer"] {
        if let Some(value) = metadata.get(key) {
            let label = {
                let mut c = key.chars();
                match c.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + c.as_str(),
                    None => String::new(),
                }
            };
            println!("{}: {}", label.bold(), value);
        }
    }

    if let Ok((width, height)) = backend.page_size(1) {
        println!("{}: {:.2} x {:.2} pt", "Page size".bold(), width, height);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfprobe".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Multi-engine PDF parsing tool");
}
