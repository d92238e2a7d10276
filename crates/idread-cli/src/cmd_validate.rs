/// Implementation of `idread validate`.
///
/// Decodes the whole stream into per-channel counters and prints a
/// report. The command fails on any decode error, and with `--strict`
/// also on any warning.
///
/// # Success output
///
/// ```text
/// ✓ Frames: 1001 (1 header, 1000 values), 84210 bytes
/// ✓ Events: 2000 (12 null)
/// ✓ Channels:
///     SINEG01:X1 [sf-databuffer] float64  1000 events, 0 null, pulses 1..1000
///     SINEG01:WF [sf-databuffer] uint16   1000 events, 12 null, pulses 1..1000
/// ! Warning: value frame at offset 822 has 3 unused trailing bytes
/// ```
///
/// # Failure output
///
/// ```text
/// ✗ Error (protocol): frame at offset 0 declares 18446744073709551615 bytes ...
/// ```
use anyhow::{Result, bail};
use idread_collect::{ChannelStats, ChannelSummary};
use idread_decoder::{DecodeError, DecodeErrorKind, StreamDecoder};
use idread_types::Collector;

use crate::{ValidateArgs, input};

/// Run the `idread validate` command.
///
/// # Errors
///
/// Returns an error if the input cannot be opened, the stream fails to
/// decode, or `--strict` is set and the decode produced warnings.
pub fn run(args: &ValidateArgs) -> Result<()> {
    let reader = input::open(&args.input.file)?;
    let mut decoder = StreamDecoder::with_config(reader, args.input.config());
    let mut stats = ChannelStats::new();

    let outcome = decoder.run(&mut stats).map(|_| ());
    if let Err(e) = outcome {
        print_failure(&e, decoder.position());
        bail!("validation of {} failed", input::label(&args.input.file));
    }

    let report = decoder.into_report();
    println!(
        "✓ Frames: {} ({} header, {} values), {} bytes",
        report.frames, report.header_frames, report.value_frames, report.bytes
    );
    println!("✓ Events: {} ({} null)", report.events, report.null_events);

    let summaries = match stats.finalize() {
        Ok(summaries) => summaries,
        Err(never) => match never {},
    };
    println!("✓ Channels:");
    for summary in &summaries {
        println!("    {}", summary_line(summary));
    }

    for warning in &report.warnings {
        println!("! Warning: {warning}");
    }
    if args.strict && report.is_degraded() {
        bail!("{} warning(s) in strict mode", report.warnings.len());
    }
    Ok(())
}

fn print_failure(e: &DecodeError, position: u64) {
    println!("✗ Error ({}): {e}", kind_label(e));
    println!("  stopped at byte {position}");
}

fn kind_label(e: &DecodeError) -> &'static str {
    match e.kind() {
        DecodeErrorKind::Protocol => "protocol",
        DecodeErrorKind::Transport => "transport",
        DecodeErrorKind::Collector => "collector",
    }
}

fn summary_line(summary: &ChannelSummary) -> String {
    let kind = summary.kind.map_or("-", |k| k.name());
    let pulses = match (summary.first_pulse_id, summary.last_pulse_id) {
        (Some(first), Some(last)) => format!(", pulses {first}..{last}"),
        _ => String::new(),
    };
    format!(
        "{} [{}] {kind}  {} events, {} null{pulses}",
        summary.channel, summary.backend, summary.events, summary.null_events
    )
}
