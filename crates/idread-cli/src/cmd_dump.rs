/// Implementation of `idread dump`.
///
/// Decodes the stream into the dictionary or mapping collector and writes
/// the result as one JSON document.
///
/// ```text
/// dict:    [ { "channel": { "name", "backend" }, "data": [ {record}, ... ] }, ... ]
/// mapping: [ [ {"channel", "backend", record...} | null, ... ], ... ]
/// ```
use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use idread_collect::{DictionaryCollector, MappingCollector};
use idread_decoder::StreamDecoder;
use idread_types::Collector;
use serde_json::Value;

use crate::{DumpArgs, Layout, input};

/// Run the `idread dump` command.
///
/// # Errors
///
/// Returns an error if the input cannot be opened, the stream fails to
/// decode, or the output cannot be written.
pub fn run(args: &DumpArgs) -> Result<()> {
    let label = input::label(&args.input.file);
    let reader = input::open(&args.input.file)?;
    let mut decoder = StreamDecoder::with_config(reader, args.input.config());

    let json = match args.layout {
        Layout::Dict => {
            let mut collector = DictionaryCollector::new(args.fields);
            decoder
                .run(&mut collector)
                .with_context(|| format!("failed to decode {label}"))?;
            let groups = match collector.finalize() {
                Ok(groups) => groups,
                Err(never) => match never {},
            };
            serde_json::to_value(groups)?
        }
        Layout::Mapping => {
            let mut collector = MappingCollector::from_header(args.fields);
            decoder
                .run(&mut collector)
                .with_context(|| format!("failed to decode {label}"))?;
            serde_json::to_value(collector.finalize()?)?
        }
    };

    for warning in &decoder.report().warnings {
        tracing::warn!(%warning, "stream degraded");
    }
    write_json(args, &json)
}

fn write_json(args: &DumpArgs, json: &Value) -> Result<()> {
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot write {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    if args.pretty {
        serde_json::to_writer_pretty(&mut out, json)?;
    } else {
        serde_json::to_writer(&mut out, json)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
