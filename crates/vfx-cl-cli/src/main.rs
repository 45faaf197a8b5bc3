//! vfxcl - gradient edge filter on an accelerator device
//!
//! Reads a raw 8-bit grayscale image, runs one filter call, writes the
//! raw result. Any pipeline failure prints the failing stage with its
//! status and exits with that status.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use vfx_cl::{Backend, ClError, TransferMode};

mod commands;

#[derive(Parser)]
#[command(name = "vfxcl")]
#[command(author, version, about = "Gradient edge filter on OpenCL devices")]
#[command(long_about = "
Runs a 3x3 gradient-magnitude edge filter over a raw 8-bit grayscale image.

Examples:
  vfxcl devices                               # List platforms
  vfxcl filter in.raw -o out.raw -W 640 -H 480
  vfxcl filter in.raw -o out.raw -W 640 -H 480 --transfer image
  vfxcl filter in.raw -o out.raw -W 640 -H 480 --backend host
  vfxcl filter in.raw -o out.raw -W 640 -H 480 --config filter.yaml
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a raw grayscale image
    #[command(visible_alias = "f")]
    Filter(FilterArgs),

    /// List backends and platform vendors
    #[command(visible_alias = "d")]
    Devices(DevicesArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Host,
    Opencl,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Host => Backend::Host,
            BackendArg::Opencl => Backend::OpenCl,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TransferArg {
    /// Flat byte buffers
    Linear,
    /// 2D surfaces with clamp-to-edge sampling
    Image,
}

impl From<TransferArg> for TransferMode {
    fn from(arg: TransferArg) -> Self {
        match arg {
            TransferArg::Linear => TransferMode::LinearBuffer,
            TransferArg::Image => TransferMode::ClampedImage,
        }
    }
}

#[derive(Args)]
struct FilterArgs {
    /// Input image, raw 8-bit grayscale, row-major
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Image width in pixels
    #[arg(short = 'W', long)]
    width: u32,

    /// Image height in pixels
    #[arg(short = 'H', long)]
    height: u32,

    /// Device memory layout (overrides config)
    #[arg(short, long, value_enum)]
    transfer: Option<TransferArg>,

    /// Driver to run on
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// Platform vendor substring (overrides config)
    #[arg(long)]
    vendor: Option<String>,

    /// YAML filter config
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct DevicesArgs {
    /// Driver to query
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Filter(args) => commands::filter::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        match err.downcast_ref::<ClError>() {
            Some(cl) => {
                error!("{} failed with status {}", cl.stage(), cl.status());
                debug!("{}", cl);
                process::exit(cl.exit_code());
            }
            None => {
                error!("{:#}", err);
                process::exit(1);
            }
        }
    }
}
