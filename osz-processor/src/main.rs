use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use osz_processor::{MapsetRecord, OszProcessor, ProcessOptions};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

/// Parse and validate .osz beatmap archives
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// An .osz file, or a directory containing .osz files
    input: PathBuf,

    /// Write a JSON report of every processed archive to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Number of threads used to parse charts (default: one per core)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Parse charts one after another instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Append "name: reason" lines for archives that could not be processed
    #[arg(long)]
    fail_list: Option<PathBuf>,
}

/// One line of the JSON report
#[derive(Serialize)]
struct ArchiveReport {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mapset: Option<MapsetRecord>,
    diagnostics: Vec<String>,
    problems: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    if !args.input.exists() {
        anyhow::bail!("Input does not exist: {}", args.input.display());
    }

    let osz_files = collect_osz_files(&args.input);
    if osz_files.is_empty() {
        println!("No .osz files found.");
        return Ok(());
    }
    println!("Found {} .osz files", osz_files.len());

    // Set up graceful shutdown flag
    let shutdown_requested = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown_requested.clone();
    ctrlc::set_handler(move || {
        println!("\n⏳ Ctrl+C received! Finishing current archive then stopping...");
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    let processor = OszProcessor::new(ProcessOptions {
        parallel_charts: !args.sequential,
    });

    let pb = ProgressBar::new(osz_files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    let mut reports = Vec::with_capacity(osz_files.len());
    let mut failures = Vec::new();
    let mut valid_count = 0;
    let mut invalid_count = 0;
    let mut interrupted = 0;

    for (i, osz_path) in osz_files.iter().enumerate() {
        if shutdown_requested.load(Ordering::SeqCst) {
            interrupted = osz_files.len() - i;
            pb.println("🛑 Stopping gracefully...");
            break;
        }

        let osz_name = osz_path.file_name().unwrap_or_default().to_string_lossy().to_string();
        pb.set_message(osz_name.clone());

        match processor.process_file(osz_path) {
            Ok(processed) => {
                if processed.is_valid() {
                    valid_count += 1;
                } else {
                    invalid_count += 1;
                    pb.println(format!(
                        "⚠ {} - {} problem(s)",
                        osz_name,
                        processed.problems.len()
                    ));
                    for problem in &processed.problems {
                        pb.println(format!("    {}", problem));
                    }
                }
                reports.push(ArchiveReport {
                    file: osz_name,
                    mapset: Some(processed.mapset),
                    diagnostics: processed.diagnostics,
                    problems: processed.problems,
                    error: None,
                });
            }
            Err(e) => {
                pb.println(format!("❌ {} - {}", osz_name, e));
                failures.push(format!("{}: {}", osz_name, e));
                reports.push(ArchiveReport {
                    file: osz_name,
                    mapset: None,
                    diagnostics: Vec::new(),
                    problems: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    if let Some(path) = &args.fail_list {
        if !failures.is_empty() {
            append_failures(path, &failures)?;
        }
    }

    if let Some(path) = &args.json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &reports)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
    }

    println!("\n✅ Summary:");
    println!("   Valid:       {}", valid_count);
    println!("   Invalid:     {}", invalid_count);
    println!("   Failed:      {}", failures.len());
    if interrupted > 0 {
        println!("   Interrupted: {} (due to Ctrl+C)", interrupted);
    }

    Ok(())
}

/// A single file is taken as-is; a directory is scanned one level deep.
fn collect_osz_files(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("osz"))
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

fn append_failures(path: &Path, failures: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open fail list: {}", path.display()))?;
    for line in failures {
        writeln!(file, "{}", line)?;
    }
    Ok(())
}
