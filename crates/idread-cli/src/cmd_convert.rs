/// Implementation of `idread convert`.
///
/// Decodes the stream into a dataset container directory and prints the
/// resulting datasets.
///
/// ```text
/// Wrote 12 datasets to out.idc (shuffle-zstd)
///   /SINEG01:X1/data          float64  []     1000 rows
///   /SINEG01:X1/pulse_id      int64    []     1000 rows
///   ...
/// ```
use anyhow::{Context, Result};
use idread_collect::{DatasetCollector, DatasetOptions};
use idread_decoder::StreamDecoder;
use idread_types::Collector;

use crate::{ConvertArgs, input};

/// Run the `idread convert` command.
///
/// # Errors
///
/// Returns an error if the input cannot be opened, the container cannot
/// be created (including when it is locked), or the stream fails to
/// decode. On a decode failure the container is left locked and without
/// a manifest.
pub fn run(args: &ConvertArgs) -> Result<()> {
    let label = input::label(&args.input.file);
    let reader = input::open(&args.input.file)?;
    let options = DatasetOptions {
        chunk_rows: args.chunk_rows,
        compress: args.compress,
        compression_level: args.compression_level,
    };
    let mut collector = DatasetCollector::create(&args.output, options)
        .with_context(|| format!("cannot create container {}", args.output.display()))?;

    let mut decoder = StreamDecoder::with_config(reader, args.input.config());
    decoder
        .run(&mut collector)
        .with_context(|| format!("failed to decode {label}"))?;
    for warning in &decoder.report().warnings {
        tracing::warn!(%warning, "stream degraded");
    }

    let manifest = collector
        .finalize()
        .with_context(|| format!("cannot finish container {}", args.output.display()))?;

    let codec = if args.compress { "shuffle-zstd" } else { "raw" };
    println!(
        "Wrote {} datasets to {} ({codec})",
        manifest.datasets.len(),
        args.output.display()
    );
    let width = manifest
        .datasets
        .iter()
        .map(|d| d.name.len())
        .max()
        .unwrap_or(0);
    for dataset in &manifest.datasets {
        println!(
            "  {:<width$}  {:<8} {:<8} {} rows",
            dataset.name,
            dataset.kind.name(),
            format!("{:?}", dataset.shape),
            dataset.rows
        );
    }
    Ok(())
}
