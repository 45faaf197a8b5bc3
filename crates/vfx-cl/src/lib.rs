//! Edge detection dispatched onto an accelerator device.
//!
//! Runs a fixed 3x3 gradient-magnitude filter over an 8-bit grayscale
//! image on an OpenCL device, or on the in-process host driver when no
//! device runtime is wanted.
//!
//! # Architecture
//!
//! ```text
//! EdgeFilter<D: Driver> (config: vendor, transfer mode)
//!     └── filter_with::<D, S: TransferStrategy>
//!             ├── device::select_device      (vendor substring match)
//!             ├── context::ExecutionContext  (context + in-order queue)
//!             ├── S::allocate / S::upload    (LinearBuffer | ClampedImage)
//!             ├── program::build             (embedded kernel assets)
//!             ├── dispatch::run              (bind, enqueue, flush, finish)
//!             └── S::download
//! ```
//!
//! # Example
//!
//! ```
//! use vfx_cl::{EdgeFilter, FilterConfig, HostDriver, TransferMode, config::HOST_VENDOR};
//!
//! let config = FilterConfig::default()
//!     .with_vendor(HOST_VENDOR)
//!     .with_transfer(TransferMode::ClampedImage);
//! let filter = EdgeFilter::new(HostDriver::new(), config);
//!
//! let input = vec![64u8; 16 * 16];
//! let mut output = vec![0u8; 16 * 16];
//! filter.apply(&input, &mut output, 16, 16)?;
//! # Ok::<(), vfx_cl::ClError>(())
//! ```
//!
//! # Features
//!
//! - `opencl` - [`OpenClDriver`](driver::OpenClDriver) via `opencl3`.

pub mod config;
pub mod context;
pub mod device;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod pipeline;
pub mod program;
pub mod stencil;
pub mod transfer;

pub use config::{FilterConfig, TransferMode};
pub use device::{describe_platforms, select_device};
pub use driver::{Backend, Driver, HostDriver, describe_backends};
pub use error::{ClError, ClResult};
pub use pipeline::{EdgeFilter, filter_with, sobel};

#[cfg(feature = "opencl")]
pub use driver::OpenClDriver;
