//! # dotnet-binder
//!
//! Binary contracts shared between an ahead-of-time .NET binder, its dispatch stubs
//! and the runtime: interface dispatch cells and their cache headers, PInvoke
//! transition frames for every supported architecture, blob streams and the
//! exception clause kind.
//!
//! ## Feature Flags
//!
//! - `memory-validation`: Checks the memory ordering of every access to a dispatch
//!   cell's cache word. Release loads and acquire stores panic; relaxed accesses are
//!   reported through `tracing`.
use clap::{Parser, Subcommand};
use std::{fs, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

pub mod atomic;
pub mod blob;
pub mod dispatch;
pub mod eh;
pub mod error;
pub mod frame;

pub use error::BinderError;

use blob::BlobStream;
use dispatch::CacheWord;
use frame::{TargetArch, TransitionFrameLayout};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Inspect the binary structures shared by the binder and the runtime"
)]
pub struct Args {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the records of a blob stream
    Blobs {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Only print the blob with this id
        #[arg(long)]
        id: Option<u32>,
    },
    /// Print the transition frame layout of one or every architecture
    FrameLayout {
        #[arg(long)]
        arch: Option<TargetArch>,
    },
    /// Name the bits of a transition frame flags word
    DecodeFlags {
        #[arg(long)]
        arch: TargetArch,
        /// Flags word, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_word)]
        bits: u64,
    },
    /// Classify a dispatch cell cache word by its tag
    CacheWord {
        #[arg(value_parser = parse_word)]
        word: u64,
    },
}

fn parse_word(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

pub fn run_cli() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no blob with id {0}")]
    MissingBlob(u32),
    #[error("{0} does not fit in a machine word")]
    WordTooWide(u64),
    #[error(transparent)]
    Binder(#[from] BinderError),
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Blobs { file, id } => {
            let bytes = fs::read(&file).map_err(|source| CliError::Io { path: file, source })?;
            let stream = BlobStream::new(&bytes);
            if let Some(id) = id {
                let blob = stream
                    .find(id)
                    .map_err(BinderError::from)?
                    .ok_or(CliError::MissingBlob(id))?;
                print_blob(&blob);
                return Ok(());
            }
            for blob in stream {
                print_blob(&blob.map_err(BinderError::from)?);
            }
        }
        Command::FrameLayout { arch } => {
            let archs = match arch {
                Some(arch) => vec![arch],
                None => TargetArch::ALL.to_vec(),
            };
            for arch in archs {
                print_layout(arch);
            }
        }
        Command::DecodeFlags { arch, bits } => {
            let flags = arch.flags(bits);
            println!("{}: {:#x} = {}", arch, bits, flags);
            println!("saved registers: {}", flags.saved_count());
            println!("frame size: {:#x}", arch.frame_size(bits));
        }
        Command::CacheWord { word } => {
            let word = usize::try_from(word).map_err(|_| CliError::WordTooWide(word))?;
            println!("{:#x}: {:?}", word, CacheWord::classify(word));
        }
    }
    Ok(())
}

fn print_blob(blob: &blob::Blob<'_>) {
    println!(
        "id {:>6}  flags {:#010x}  size {:#x}",
        blob.id(),
        blob.flags(),
        blob.payload.len()
    );
}

fn print_layout(arch: TargetArch) {
    println!("{}:", arch);
    println!("  pointer size:        {}", arch.pointer_size());
    println!("  return address:      {:#x}", arch.return_address_offset());
    println!("  frame pointer:       {:#x}", arch.frame_pointer_offset());
    println!("  thread:              {:#x}", arch.thread_offset());
    println!("  flags:               {:#x} ({} bytes)", arch.flags_offset(), arch.flags_size());
    println!("  header size:         {:#x}", arch.header_size());
    println!("  max frame size:      {:#x}", arch.max_frame_size());
    println!("  thread frame offset: {:#x}", arch.transition_frame_offset());
    let names: Vec<_> = arch.saved_registers().iter().map(|reg| reg.name).collect();
    println!("  push order:          {}", names.join(" "));
    println!(
        "  THREAD_ABORT {:#x}  THREAD_HIJACK {:#x}",
        arch.thread_abort_flag(),
        arch.thread_hijack_flag()
    );
}
