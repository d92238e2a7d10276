/// Implementation of `idread inspect`.
///
/// Walks the stream frame by frame and prints one line per frame. After
/// every header frame the new channel table is printed.
///
/// # Output format
///
/// ```text
/// Frame 0 @0: HEADER size=412 (2 channels)
///   #  name        backend        type     shape  order   compression
///   0  SINEG01:X1  sf-databuffer  float64  [1]    little  none
///   1  SINEG01:WF  sf-databuffer  uint16   [128]  big     bitshuffle_lz4
/// Frame 1 @422: VALUES size=320 (2 events, 0 null)
/// Frame 2 @752: UNKNOWN(7) size=6 skipped: unknown frame kind 7 ...
/// ---
/// 3 frames, 764 bytes
/// ```
use anyhow::{Context, Result};
use idread_collect::ChannelStats;
use idread_decoder::{FrameOutcome, StreamDecoder};
use idread_types::{ByteOrder, ChannelDescriptor};
use idread_wire::FrameKind;

use crate::{InspectArgs, input};

/// Run the `idread inspect` command.
///
/// # Errors
///
/// Returns an error if the input cannot be opened or a frame fails to
/// decode. Frames before the failing one have already been printed.
pub fn run(args: &InspectArgs) -> Result<()> {
    let label = input::label(&args.input.file);
    let reader = input::open(&args.input.file)?;
    let mut decoder = StreamDecoder::with_config(reader, args.input.config());
    let mut stats = ChannelStats::new();

    let mut index = 0u64;
    while let Some(frame) = decoder
        .next_frame(&mut stats)
        .with_context(|| format!("failed to decode {label} after {index} frames"))?
    {
        println!(
            "Frame {index} @{}: {} size={} {}",
            frame.offset,
            kind_label(frame.kind),
            frame.size,
            outcome_label(&frame.outcome)
        );
        if matches!(frame.outcome, FrameOutcome::Header { .. }) && !args.frames_only {
            print_channels(decoder.channels());
        }
        index += 1;
    }

    let report = decoder.report();
    println!("---");
    println!("{} frames, {} bytes", report.frames, report.bytes);
    Ok(())
}

// ── Formatting helpers ────────────────────────────────────────────────────────

fn kind_label(kind: FrameKind) -> String {
    match kind {
        FrameKind::Values => "VALUES".to_owned(),
        FrameKind::Header => "HEADER".to_owned(),
        FrameKind::Unknown(id) => format!("UNKNOWN({id})"),
    }
}

fn outcome_label(outcome: &FrameOutcome) -> String {
    match outcome {
        FrameOutcome::Header { channels } => format!("({channels} channels)"),
        FrameOutcome::Values {
            events,
            null_events,
            trailing: 0,
        } => format!("({events} events, {null_events} null)"),
        FrameOutcome::Values {
            events,
            null_events,
            trailing,
        } => format!("({events} events, {null_events} null, {trailing} trailing bytes)"),
        FrameOutcome::Skipped(warning) => format!("skipped: {warning}"),
    }
}

fn print_channels(channels: &[ChannelDescriptor]) {
    let rows: Vec<[String; 7]> = channels
        .iter()
        .enumerate()
        .map(|(i, c)| {
            [
                i.to_string(),
                c.name.clone(),
                c.backend.clone(),
                c.kind.name().to_owned(),
                format!("{:?}", c.shape),
                match c.byte_order {
                    ByteOrder::Little => "little".to_owned(),
                    ByteOrder::Big => "big".to_owned(),
                },
                c.compression.name().unwrap_or("none").to_owned(),
            ]
        })
        .collect();

    let titles = ["#", "name", "backend", "type", "shape", "order", "compression"];
    let mut widths = titles.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: [&str; 7]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        println!("  {}", padded.join("  ").trim_end());
    };
    line(titles);
    for row in &rows {
        line(row.each_ref().map(String::as_str));
    }
}
