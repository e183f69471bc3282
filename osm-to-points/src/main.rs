use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use clap::Parser;

use osm_to_points::convert_osm;
use points_format::{write_metadata, Metadata};

#[derive(Parser)]
struct Args {
    /// Path to an .osm XML file to convert
    #[arg(long)]
    input: String,

    /// Output file for the binary point stream
    #[arg(long, default_value = "points.bin")]
    output: String,

    /// Output file for the bounding-box metadata
    #[arg(long, default_value = "points.meta.json")]
    metadata: String,
}

fn main() -> Result<()> {
    simple_logger::init_with_level(log::Level::Info).unwrap();
    let args = Args::parse();

    // All three handles open before any decoding starts.
    let input = File::open(&args.input).with_context(|| format!("opening {}", args.input))?;
    let points = BufWriter::new(
        File::create(&args.output).with_context(|| format!("creating {}", args.output))?,
    );
    let metadata =
        File::create(&args.metadata).with_context(|| format!("creating {}", args.metadata))?;

    let summary = convert_osm(input, points)?;
    write_metadata(
        metadata,
        &Metadata::new(summary.bounds, summary.points_written),
    )
    .with_context(|| format!("writing {}", args.metadata))?;
    Ok(())
}
