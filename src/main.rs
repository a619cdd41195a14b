use std::path::PathBuf;

use anyhow::Context;
use bayer2dng::image_pipeline::{
    ConversionConfig, ConversionError, ConversionRequest, DEFAULT_PROFILE_FILE, RawToDngPipeline,
};
use bayer2dng::logger::{self, error, info};
use clap::{CommandFactory, Parser};

#[derive(Parser)]
#[command(name = "bayer2dng")]
#[command(version, about = "Convert a Bayer raw buffer and its JSON sidecar to DNG")]
#[command(after_help = format!("The camera profile defaults to {} in the working directory.", DEFAULT_PROFILE_FILE))]
struct Cli {
    /// Headerless 16-bit Bayer raw file
    raw: Option<PathBuf>,

    /// JSON metadata sidecar
    json: Option<PathBuf>,

    /// DNG camera profile (.dcp)
    dcp: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn run(request: &ConversionRequest) -> Result<(), ConversionError> {
    let pipeline = RawToDngPipeline::new(ConversionConfig::default());
    let report = pipeline.convert_file(request)?;
    if !report.diagnostics.is_empty() {
        info!(count = report.diagnostics.len(), "Sidecar had unrecognized entries");
    }
    println!("Conversion complete: {}", report.output_path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (Some(raw), Some(json)) = (cli.raw, cli.json) else {
        Cli::command().print_help().context("failed to print usage")?;
        println!();
        return Ok(());
    };

    logger::init(cli.verbose);

    let mut request = ConversionRequest::new(raw).metadata(json);
    if let Some(dcp) = cli.dcp {
        request = request.profile(dcp);
    }

    if let Err(e) = run(&request) {
        error!(code = e.code(), "Conversion failed: {}", e);
        eprintln!("Conversion failed ({}): {}", e.code(), e);
        std::process::exit(e.code());
    }
    Ok(())
}
