/// idread command-line tool: inspect, validate, dump and convert idread
/// binary streams.
///
/// # Command overview
///
/// ```text
/// idread <COMMAND> [OPTIONS]
///
/// Commands:
///   inspect    List frames and each header's channel table
///   validate   Decode the whole stream and report per-channel counts
///   dump       Print the events as JSON (dictionary or mapping layout)
///   convert    Write the events into a dataset container directory
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log at debug level (RUST_LOG overrides)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// Every command takes the stream path as its first argument; `-` reads
/// from stdin.
///
/// # Exit codes
///
/// | Code | Meaning                                          |
/// |------|--------------------------------------------------|
/// | 0    | Success                                          |
/// | 1    | Error (I/O failure, corrupt stream, strict mode) |
///
/// All error details are written to stderr so stdout can be piped cleanly.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use idread_collect::FieldSelection;
use idread_decoder::DecoderConfig;
use tracing_subscriber::EnvFilter;

mod cmd_convert;
mod cmd_dump;
mod cmd_inspect;
mod cmd_validate;
mod input;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// The idread stream tool.
#[derive(Parser)]
#[command(name = "idread", version, about = "idread binary stream tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level. `RUST_LOG` takes precedence when set.
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// List frames (offset, kind, size) and each header's channels.
    Inspect(InspectArgs),
    /// Decode the whole stream and report per-channel counts.
    Validate(ValidateArgs),
    /// Print the decoded events as JSON.
    Dump(DumpArgs),
    /// Write the decoded events into a dataset container.
    Convert(ConvertArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Input and decoder limits shared by every command.
#[derive(clap::Args)]
pub struct InputArgs {
    /// Stream to read, or `-` for stdin.
    pub file: PathBuf,

    /// Largest frame body to accept, in bytes.
    #[arg(long, default_value_t = DecoderConfig::default().max_frame_size)]
    pub max_frame_size: u64,

    /// Largest size a compressed payload may inflate to, in bytes.
    #[arg(long, default_value_t = DecoderConfig::default().max_decompressed_size)]
    pub max_decompressed_size: usize,
}

impl InputArgs {
    #[must_use]
    pub fn config(&self) -> DecoderConfig {
        DecoderConfig {
            max_frame_size: self.max_frame_size,
            max_decompressed_size: self.max_decompressed_size,
        }
    }
}

/// Arguments for `idread inspect`.
#[derive(clap::Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print only frames, not the channel tables.
    #[arg(long)]
    pub frames_only: bool,
}

/// Arguments for `idread validate`.
///
/// A stream with warnings (unknown frame kinds, values before a header,
/// trailing bytes) still validates unless `--strict` is given.
#[derive(clap::Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Fail if the decode produced any warning.
    #[arg(long)]
    pub strict: bool,
}

/// JSON layout for `idread dump`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// One group per channel with all its records.
    Dict,
    /// One array per pulse with one record per channel.
    Mapping,
}

/// Arguments for `idread dump`.
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────────┐
/// │ Flag         │ Values / default                                     │
/// ├──────────────┼──────────────────────────────────────────────────────┤
/// │ --layout     │ dict (default) | mapping                             │
/// │ --fields     │ comma list of value,time,pulseId,status,severity,    │
/// │              │ timeRaw (default: all)                               │
/// │ --pretty     │ indent the JSON                                      │
/// │ -o/--output  │ write to file instead of stdout                      │
/// └──────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct DumpArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long, value_enum, default_value = "dict")]
    pub layout: Layout,

    /// Fields to emit per record.
    #[arg(long, default_value = "value,time,pulseId,status,severity,timeRaw")]
    pub fields: FieldSelection,

    #[arg(long)]
    pub pretty: bool,

    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `idread convert`.
#[derive(clap::Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Container directory to create.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Shuffle and zstd-compress every dataset.
    #[arg(long)]
    pub compress: bool,

    /// zstd level used with `--compress`.
    #[arg(long, default_value_t = 3)]
    pub compression_level: i32,

    /// Rows added to a dataset each time it grows.
    #[arg(long, default_value_t = 1000)]
    pub chunk_rows: u64,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args),
        Commands::Dump(args) => cmd_dump::run(&args),
        Commands::Convert(args) => cmd_convert::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
