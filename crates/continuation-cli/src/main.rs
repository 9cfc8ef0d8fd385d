//! `blocks-to-transfers`: converts a GTFS feed's implied block continuations
//! into explicit trip-to-trip transfer records.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use continuation_graph::config::Config;
use gtfs::Feed;

/// CLI arguments for the blocks-to-transfers conversion binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input GTFS feed directory.
    feed_dir: PathBuf,

    /// Output directory the converted feed is written to.
    out_dir: PathBuf,

    /// Simplify the output graph so every non-composite trip has at most one
    /// predecessor and one successor continuation.
    #[arg(short = 'L', long)]
    linear: bool,

    /// Remove the output directory before writing, if it already exists.
    #[arg(long)]
    remove_existing_files: bool,

    /// Defer cloning a split trip's stop_times until the pickup/drop-off
    /// rule actually needs to change them, instead of always up front.
    #[arg(long)]
    itinerary_layout: bool,

    /// Path to a JSON document of configuration overrides, layered onto the
    /// defaults section by section.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn run(args: Args) -> Result<bool, continuation_graph::error::ConvertError> {
    let config = match args.config {
        Some(path) => {
            let json = std::fs::read_to_string(&path).map_err(|err| {
                continuation_graph::error::ConvertError::Config(format!(
                    "could not read {}: {err}",
                    path.display()
                ))
            })?;
            Config::from_json_overrides(&json)?
        }
        None => Config::with_defaults(),
    };

    let mut feed = Feed::load(&args.feed_dir)?;
    let (_, warnings) =
        continuation_graph::convert(&mut feed, &config, args.linear, args.itinerary_layout);
    feed.write(&args.out_dir, args.remove_existing_files)?;

    Ok(warnings.any_fired())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(false) => ExitCode::from(0),
        Ok(true) => ExitCode::from(2),
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(1)
        }
    }
}
