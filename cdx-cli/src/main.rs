//! cdx CLI
//!
//! Command-line front end for the legacy CD-ROM asset extractor. Scoped
//! down to the `flc` subcommand: the SI/WDB container formats are out of
//! scope (SPEC_FULL.md §1), so there is nothing for a `si`/`wdb` subcommand
//! to parse standalone FLC files into — those only make sense as an SI
//! object's chunk list, fed in by an external SI reader.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cdx_decoder::FlcDecoder;
use cdx_encoder::AviMuxer;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cdx")]
#[command(about = "Legacy CD-ROM asset extractor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Operate on a standalone FLC animation file
    Flc {
        #[command(subcommand)]
        action: FlcAction,
    },
}

#[derive(Subcommand)]
enum FlcAction {
    /// Print dimensions, frame rate, and frame count
    Info {
        /// Input .flc file path
        input: PathBuf,
    },

    /// Decode and re-mux to an uncompressed AVI
    Export {
        /// Input .flc file path
        input: PathBuf,

        /// Output .avi file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Flc { action } => match action {
            FlcAction::Info { input } => flc_info(input),
            FlcAction::Export { input, output } => flc_export(input, output),
        },
    }
}

fn flc_info(input: PathBuf) -> Result<()> {
    let file = File::open(&input).with_context(|| format!("failed to open {}", input.display()))?;
    let stream = FlcDecoder::decode(BufReader::new(file)).context("failed to decode FLC stream")?;

    println!("{}", input.display());
    println!("  dimensions : {}x{}", stream.width, stream.height);
    println!("  frame rate : {} fps", stream.fps);
    println!("  frames     : {}", stream.frames.len());

    Ok(())
}

fn flc_export(input: PathBuf, output: PathBuf) -> Result<()> {
    let file = File::open(&input).with_context(|| format!("failed to open {}", input.display()))?;
    let stream = FlcDecoder::decode(BufReader::new(file)).context("failed to decode FLC stream")?;

    log::info!(
        "decoded {} frames at {}x{}, {} fps",
        stream.frames.len(),
        stream.width,
        stream.height,
        stream.fps
    );

    let avi = AviMuxer::new(stream.width, stream.height, stream.fps, stream.frames)
        .context("frames did not match the declared dimensions")?
        .mux()
        .context("failed to mux AVI container")?;

    std::fs::write(&output, avi).with_context(|| format!("failed to write {}", output.display()))?;
    println!("wrote {}", output.display());

    Ok(())
}
