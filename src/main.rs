//! # Inspekt CLI
//!
//! Usage:
//!   inspekt inspection.json --template TREC_Template_Blank.pdf -o report.pdf

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use inspekt::assets::HttpFetcher;
use inspekt::compress::compress_in_place;
use inspekt::render_report_json;

#[derive(Parser)]
#[command(name = "inspekt", version, about = "Render an inspection record into a paginated PDF report")]
struct Args {
    /// Path to the inspection-record JSON.
    data: PathBuf,

    /// Path to the report template PDF.
    #[arg(short, long)]
    template: PathBuf,

    /// Where to write the finished report.
    #[arg(short, long, default_value = "output_pdf.pdf")]
    output: PathBuf,

    /// Skip the Ghostscript compression pass.
    #[arg(long)]
    no_compress: bool,

    /// Log more (repeat for debug output).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(&args.data)
        .map_err(|e| format!("failed to read {}: {e}", args.data.display()))?;
    let template = std::fs::read(&args.template)
        .map_err(|e| format!("failed to read {}: {e}", args.template.display()))?;

    let fetcher = HttpFetcher::new();
    let pdf_bytes = render_report_json(&json, &template, &fetcher)?;

    std::fs::write(&args.output, &pdf_bytes)?;
    info!("wrote {} bytes to {}", pdf_bytes.len(), args.output.display());

    if !args.no_compress {
        compress_in_place(&args.output);
    }

    Ok(())
}
