//! issuekit CLI
//!
//! Command-line interface for finalizing and rendering validation issues.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use issuekit::{load_issues, FinalIssue, ParseContext, ValidationError};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "issuekit")]
#[command(about = "Finalize and render validation issues")]
#[command(version)]
struct Cli {
    /// Log pipeline decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Finalize issues and print one of the projections
    Render {
        /// Issue document (JSON array of raw issue records)
        file: PathBuf,

        /// Projection to print
        #[arg(long, value_enum, default_value_t = Projection::Pretty)]
        format: Projection,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Finalize issues and print them as JSON
    Finalize {
        /// Issue document (JSON array of raw issue records)
        file: PathBuf,

        /// Drop the offending input from finalized issues
        #[arg(long)]
        no_input: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Projection {
    /// `path: message` joined by "; "
    Pretty,
    /// Nested map with `_errors` at every node
    Format,
    /// `errors` / `properties` / `items` tree
    Tree,
    /// `form_errors` and `field_errors` keyed by first path segment
    Flatten,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Render {
            file,
            format,
            pretty,
            output,
        } => run_render(&file, format, pretty, output),

        Commands::Finalize {
            file,
            no_input,
            pretty,
            output,
        } => run_finalize(&file, no_input, pretty, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("issuekit=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn finalize_file(file: &Path, ctx: &ParseContext) -> Result<ValidationError, u8> {
    let raws = load_issues(file).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    debug!(count = raws.len(), report_input = ctx.report_input, "finalizing");
    Ok(ValidationError::from_raw(&raws, Some(ctx), None))
}

fn run_render(
    file: &Path,
    projection: Projection,
    pretty: bool,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let err = finalize_file(file, &ParseContext::new())?;

    let rendered = match projection {
        Projection::Pretty => err.prettify(),
        Projection::Format => to_json(&err.format(), pretty)?,
        Projection::Tree => to_json(&err.treeify(), pretty)?,
        Projection::Flatten => to_json(&err.flatten(), pretty)?,
    };

    write_output(&rendered, output)
}

fn run_finalize(
    file: &Path,
    no_input: bool,
    pretty: bool,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let ctx = ParseContext::new().report_input(!no_input);
    let err = finalize_file(file, &ctx)?;
    let issues: &[FinalIssue] = err.issues();
    let rendered = to_json(&issues, pretty)?;
    write_output(&rendered, output)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, u8> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

fn write_output(rendered: &str, output: Option<PathBuf>) -> Result<(), u8> {
    match output {
        Some(path) => {
            std::fs::write(&path, rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", rendered);
        }
    }

    Ok(())
}
