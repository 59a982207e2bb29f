//! Example: Inspect an AFNI dataset
//!
//! Run with: cargo run --example inspect_dataset -- /data/anat+orig
//!
//! Set `RUST_LOG=afni_brik=debug` to see how decode parameters were resolved.

use afni_brik::{BrikReader, DataType, DecodeParams, ReaderOptions};
use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: inspect_dataset <dataset prefix or .HEAD/.BRIK path>");
    };

    let options = ReaderOptions::default();
    let reader = BrikReader::new(options.clone());

    let header = reader
        .read_header(&path)
        .with_context(|| format!("reading header of {}", path))?;
    println!("{} attributes", header.len());

    let params = DecodeParams::from_header(&header, &options)?;
    println!("Layout: {}", params.summary());
    if let Some(labels) = header.brick_labels()? {
        println!("Sub-bricks: {}", labels.join(", "));
    }

    let volume = reader
        .read_volume(&path, &header)
        .with_context(|| format!("reading volume of {}", path))?;
    println!("Volume: {}", volume.summary());

    if volume.data_type() == DataType::Complex64 {
        return Ok(());
    }
    if let Some(values) = volume.to_f64() {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        println!("Value range: {} .. {}", min, max);
    }

    Ok(())
}
