//! CLI binary for tiffpages.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessOptions`, dispatches the subcommand, and prints summaries.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tiffpages::{
    CompressionPreference, ConversionMode, PageEngine, ProcessOptions, RunSummary,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Append every page of extra.tif onto batch.tif
  tiffpages merge batch.tif extra.tif

  # Drop blank separator sheets, writing a new file
  tiffpages remove-blank scans.tif -o clean.tif

  # Drop blank sheets in place (atomic replace of the input)
  tiffpages remove-blank scans.tif

  # Remove the cover page and page 7
  tiffpages remove-pages scans.tif --pages 1,7 -o trimmed.tif

  # Collapse color scans of monochrome originals to grayscale
  tiffpages convert scans.tif --to gray -o gray.tif

  # Binarize with a custom threshold, keep strips uncompressed
  tiffpages convert scans.tif --to binary --threshold 128 --compression none

  # Per-page report (text to stdout, or structured with --json)
  tiffpages info scans.tif
  tiffpages info scans.tif --json > report.json

ENVIRONMENT VARIABLES:
  TIFFPAGES_COMPRESSION   Compression preference (none, jpeg, lzw)
  TIFFPAGES_THRESHOLD     Binarization threshold (0-255)
  TIFFPAGES_WORK_DIR      Staging directory for in-place edits
  TIFFPAGES_VERBOSE       Enable DEBUG-level logs
  TIFFPAGES_QUIET         Suppress all output except errors

NOTES:
  Page numbers are 1-based. Mutating subcommands edit the input in place
  when -o/--output is omitted; the original file is only replaced once the
  whole run has succeeded.

  Pages with more than one sample per pixel that are not palette-indexed
  are always written as JPEG, regardless of --compression.
"#;

/// Merge, prune, and convert pages of multi-page TIFF files.
#[derive(Parser, Debug)]
#[command(
    name = "tiffpages",
    version,
    about = "Merge, prune, and convert pages of multi-page TIFF files",
    long_about = "Page-level operations on multi-page TIFF containers: merge two files, \
drop blank or selected pages, convert color pages to grayscale or thresholded binary, \
and report per-page header fields. Strip-based 8-bit TIFF only.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Compression preference: none, jpeg, lzw.
    #[arg(long, global = true, env = "TIFFPAGES_COMPRESSION", value_enum, default_value = "jpeg")]
    compression: CompressionArg,

    /// Staging directory for in-place edits (same filesystem as the input).
    #[arg(long, global = true, env = "TIFFPAGES_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Use the strict color-conversion eligibility predicate.
    #[arg(long, global = true, env = "TIFFPAGES_STRICT_ELIGIBILITY")]
    strict_eligibility: bool,

    /// Print run summaries and reports as JSON.
    #[arg(long, global = true, env = "TIFFPAGES_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "TIFFPAGES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "TIFFPAGES_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append every page of FILE2 onto FILE1 (in place on FILE1).
    Merge {
        /// Destination container; created when missing.
        file1: PathBuf,
        /// Source container whose pages are appended.
        file2: PathBuf,
    },

    /// Copy non-blank pages, dropping the blank ones.
    RemoveBlank {
        /// Input container.
        input: PathBuf,
        /// Write here instead of editing the input in place.
        #[arg(short, long, env = "TIFFPAGES_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Drop pages by 1-based number, e.g. --pages 2,3,7.
    RemovePages {
        /// Input container.
        input: PathBuf,
        /// Comma-separated 1-based page numbers (duplicates collapse).
        #[arg(long)]
        pages: String,
        /// Write here instead of editing the input in place.
        #[arg(short, long, env = "TIFFPAGES_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Convert eligible color pages to grayscale or binary.
    Convert {
        /// Input container.
        input: PathBuf,
        /// Target: gray or binary.
        #[arg(long = "to", value_enum)]
        to: ModeArg,
        /// Binarization threshold (0-255); only used with --to binary.
        #[arg(long, env = "TIFFPAGES_THRESHOLD", default_value_t = 100)]
        threshold: u8,
        /// Write here instead of editing the input in place.
        #[arg(short, long, env = "TIFFPAGES_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Report page count, blank count, and per-page header fields.
    Info {
        /// Input container.
        input: PathBuf,
        /// Write the text report here instead of stdout.
        #[arg(short, long, env = "TIFFPAGES_OUTPUT")]
        output: Option<PathBuf>,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CompressionArg {
    None,
    Jpeg,
    Lzw,
}

impl From<CompressionArg> for CompressionPreference {
    fn from(v: CompressionArg) -> Self {
        match v {
            CompressionArg::None => CompressionPreference::None,
            CompressionArg::Jpeg => CompressionPreference::Jpeg,
            CompressionArg::Lzw => CompressionPreference::Lzw,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Gray,
    Binary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut builder = ProcessOptions::builder()
        .compression(cli.compression.into())
        .strict_eligibility(cli.strict_eligibility);
    if let Some(ref dir) = cli.work_dir {
        builder = builder.work_dir(dir);
    }
    if let Command::Convert { threshold, .. } = cli.command {
        builder = builder.threshold(threshold);
    }
    let engine = PageEngine::new(builder.build());

    let spinner = make_spinner(!cli.quiet && !cli.json);

    match &cli.command {
        Command::Merge { file1, file2 } => {
            spinner_msg(&spinner, format!("Merging {}…", file2.display()));
            let summary = engine
                .merge(file1, file2)
                .with_context(|| format!("Merge into '{}' failed", file1.display()))?;
            finish(spinner);
            print_summary(&cli, &summary, &format!("pages appended to {}", file1.display()))?;
        }
        Command::RemoveBlank { input, output } => {
            spinner_msg(&spinner, format!("Scanning {} for blank pages…", input.display()));
            let summary = engine
                .remove_blank_pages(input, output.as_deref())
                .context("Blank-page removal failed")?;
            finish(spinner);
            print_summary(&cli, &summary, "blank pages removed")?;
        }
        Command::RemovePages {
            input,
            pages,
            output,
        } => {
            let set = parse_page_set(pages)?;
            spinner_msg(&spinner, format!("Removing {} page(s)…", set.len()));
            let summary = engine
                .remove_pages(input, &set, output.as_deref())
                .context("Page removal failed")?;
            finish(spinner);
            print_summary(&cli, &summary, "pages removed by number")?;
        }
        Command::Convert {
            input, to, output, ..
        } => {
            let mode = match to {
                ModeArg::Gray => ConversionMode::Grayscale,
                ModeArg::Binary => ConversionMode::Binary {
                    threshold: engine.options().threshold,
                },
            };
            spinner_msg(&spinner, format!("Converting {}…", input.display()));
            let summary = engine
                .convert_pages(input, mode, output.as_deref())
                .context("Conversion failed")?;
            finish(spinner);
            print_summary(&cli, &summary, "pages converted")?;
        }
        Command::Info { input, output } => {
            spinner_msg(&spinner, format!("Inspecting {}…", input.display()));
            let report = engine
                .file_info(input, output.as_deref())
                .context("Inspection failed")?;
            finish(spinner);

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report)
                        .context("Failed to serialise report")?
                );
            } else if output.is_none() {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(report.render().as_bytes())
                    .context("Failed to write to stdout")?;
            } else if !cli.quiet {
                eprintln!(
                    "{} report written  {}",
                    green("✔"),
                    dim(&format!(
                        "{} pages, {} blank",
                        report.total_pages, report.blank_pages
                    ))
                );
            }
        }
    }

    Ok(())
}

fn make_spinner(enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

fn spinner_msg(spinner: &Option<ProgressBar>, msg: String) {
    if let Some(bar) = spinner {
        bar.set_message(msg);
    }
}

fn finish(spinner: Option<ProgressBar>) {
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
}

/// Print a run summary as a coloured one-liner, or JSON with `--json`.
fn print_summary(cli: &Cli, summary: &RunSummary, what: &str) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(what),
            dim(&format!(
                "{} copied, {} skipped of {} pages",
                summary.copied, summary.skipped, summary.total_pages
            ))
        );
        if summary.copied == 0 && summary.total_pages > 0 {
            eprintln!("  {} every page was skipped; the output has no pages", cyan("⚠"));
        }
    }
    Ok(())
}

/// Parse `--pages` into a deduplicated set of 1-based ordinals.
fn parse_page_set(s: &str) -> Result<BTreeSet<u16>> {
    let mut set = BTreeSet::new();
    for part in s.split(',') {
        let page: u16 = part
            .trim()
            .parse()
            .with_context(|| format!("Invalid page number: '{}'", part.trim()))?;
        if page < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
        }
        set.insert(page);
    }
    if set.is_empty() {
        anyhow::bail!("--pages must name at least one page");
    }
    Ok(set)
}
