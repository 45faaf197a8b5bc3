//! Top-level filter call.
//!
//! One call runs the whole pipeline from scratch:
//!
//! ```text
//! validate -> select_device -> create_context -> allocate -> upload
//!          -> build -> run (bind, enqueue, flush, finish) -> download
//! ```
//!
//! Handles live in a [`Session`] whose field order is the release order,
//! so teardown is identical on success and on every failure path.

use tracing::debug;

use crate::config::{self, FilterConfig, TransferMode};
use crate::context::{ExecutionContext, create_context};
use crate::device::select_device;
use crate::dispatch;
use crate::driver::{Backend, Driver, HostDriver};
use crate::program;
use crate::transfer::{ClampedImage, DeviceMemory, LinearBuffer, TransferStrategy};
use crate::ClResult;

/// Device handles of one call.
///
/// Drops kernel, program, output memory, input memory, queue, context,
/// device, in that order.
struct Session<D: Driver> {
    kernel: D::Kernel,
    // Held only so it is released between kernel and memory.
    _program: D::Program,
    memory: DeviceMemory<D>,
    exec: ExecutionContext<D>,
}

impl<D: Driver> Drop for Session<D> {
    fn drop(&mut self) {
        debug!("releasing kernel, program, memory, queue, context, device");
    }
}

/// Run one filter call with a build-time selected transfer strategy.
pub fn filter_with<D: Driver, S: TransferStrategy>(
    driver: &D,
    config: &FilterConfig,
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
) -> ClResult<()> {
    let pixels = config::validate(input, output, width, height)?;
    debug!(driver = driver.name(), mode = S::MODE.name(), width, height, pixels, "edge filter");

    let device = select_device(driver, &config.vendor)?;
    let exec = create_context(driver, device)?;

    let mut memory = S::allocate(driver, exec.context(), input, width, height)?;
    S::upload(driver, exec.queue(), &mut memory, input)?;

    let asset = S::asset();
    let program = program::build(driver, exec.context(), exec.device(), asset, config)?;
    let kernel = program::create_kernel(driver, &program, asset)?;

    let mut session = Session { kernel, _program: program, memory, exec };
    dispatch::run::<D, S>(
        driver,
        session.exec.queue(),
        &mut session.kernel,
        &session.memory,
        width,
        height,
        config,
    )?;
    S::download(driver, session.exec.queue(), &session.memory, width, height, output)
}

/// Edge filter bound to a driver and a configuration.
///
/// # Example
///
/// ```
/// use vfx_cl::{EdgeFilter, FilterConfig, HostDriver, config::HOST_VENDOR};
///
/// let filter = EdgeFilter::new(HostDriver::new(), FilterConfig::default().with_vendor(HOST_VENDOR));
/// let input = vec![128u8; 8 * 8];
/// let mut output = vec![0u8; 8 * 8];
/// filter.apply(&input, &mut output, 8, 8)?;
/// assert_eq!(output[3 * 8 + 3], 255);
/// # Ok::<(), vfx_cl::ClError>(())
/// ```
pub struct EdgeFilter<D: Driver> {
    driver: D,
    config: FilterConfig,
}

impl<D: Driver> EdgeFilter<D> {
    pub fn new(driver: D, config: FilterConfig) -> Self {
        Self { driver, config }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Filter `input` into `output`, both `width*height` bytes, row-major.
    pub fn apply(&self, input: &[u8], output: &mut [u8], width: u32, height: u32) -> ClResult<()> {
        match self.config.transfer {
            TransferMode::LinearBuffer => {
                filter_with::<D, LinearBuffer>(&self.driver, &self.config, input, output, width, height)
            }
            TransferMode::ClampedImage => {
                filter_with::<D, ClampedImage>(&self.driver, &self.config, input, output, width, height)
            }
        }
    }
}

/// Filter with the default backend and its default vendor.
pub fn sobel(input: &[u8], output: &mut [u8], width: u32, height: u32) -> ClResult<()> {
    let backend = Backend::default();
    let config = FilterConfig::default().with_vendor(backend.default_vendor());
    match backend {
        #[cfg(feature = "opencl")]
        Backend::OpenCl => {
            EdgeFilter::new(crate::driver::OpenClDriver::new(), config).apply(input, output, width, height)
        }
        _ => EdgeFilter::new(HostDriver::new(), config).apply(input, output, width, height),
    }
}
