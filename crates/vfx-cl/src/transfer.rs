//! Transfer strategies: how host pixels map onto device memory.
//!
//! Both strategies leave border pixels the kernel does not compute equal
//! to the input. The linear strategy seeds the output buffer with the
//! input on upload; the image strategy creates the output surface from
//! the input pixels.

use tracing::{debug, trace};

use crate::config::TransferMode;
use crate::driver::{Driver, MemAccess, WorkPartition};
use crate::program::{IMAGE_KERNEL, KernelAsset, LINEAR_KERNEL};
use crate::ClResult;

/// Input and output memory of one filter call.
///
/// Fields drop in declaration order: output, then input.
pub struct DeviceMemory<D: Driver> {
    pub output: D::Mem,
    pub input: D::Mem,
}

/// Memory layout, argument list and work partition of one kernel variant.
pub trait TransferStrategy {
    /// Configuration value selecting this strategy.
    const MODE: TransferMode;

    /// Kernel compiled for this strategy.
    fn asset() -> &'static KernelAsset;

    /// Create input and output memory. `pixels` is the host image.
    fn allocate<D: Driver>(
        driver: &D,
        context: &D::Context,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> ClResult<DeviceMemory<D>>;

    /// Copy host pixels to device memory.
    fn upload<D: Driver>(driver: &D, queue: &D::Queue, memory: &mut DeviceMemory<D>, pixels: &[u8]) -> ClResult<()>;

    /// Bind kernel arguments positionally.
    fn bind<D: Driver>(
        driver: &D,
        kernel: &mut D::Kernel,
        memory: &DeviceMemory<D>,
        width: u32,
        height: u32,
    ) -> ClResult<()>;

    /// Work partition covering the image.
    fn partition(width: u32, height: u32) -> WorkPartition;

    /// Blocking copy of the result into `out`.
    fn download<D: Driver>(
        driver: &D,
        queue: &D::Queue,
        memory: &DeviceMemory<D>,
        width: u32,
        height: u32,
        out: &mut [u8],
    ) -> ClResult<()>;
}

// =============================================================================
// Linear buffer
// =============================================================================

/// Flat `width*height` byte buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearBuffer;

impl TransferStrategy for LinearBuffer {
    const MODE: TransferMode = TransferMode::LinearBuffer;

    fn asset() -> &'static KernelAsset {
        &LINEAR_KERNEL
    }

    fn allocate<D: Driver>(
        driver: &D,
        context: &D::Context,
        _pixels: &[u8],
        width: u32,
        height: u32,
    ) -> ClResult<DeviceMemory<D>> {
        let len = width as usize * height as usize;
        debug!(len, "allocating linear buffers");
        let input = driver.create_buffer(context, MemAccess::ReadOnly, len)?;
        let output = driver.create_buffer(context, MemAccess::WriteOnly, len)?;
        Ok(DeviceMemory { output, input })
    }

    fn upload<D: Driver>(driver: &D, queue: &D::Queue, memory: &mut DeviceMemory<D>, pixels: &[u8]) -> ClResult<()> {
        driver.write_buffer(queue, &mut memory.input, pixels)?;
        // Border work-items never write, so they read back as input.
        driver.write_buffer(queue, &mut memory.output, pixels)
    }

    fn bind<D: Driver>(
        driver: &D,
        kernel: &mut D::Kernel,
        memory: &DeviceMemory<D>,
        width: u32,
        height: u32,
    ) -> ClResult<()> {
        trace!("arg 0: input buffer");
        driver.set_mem_arg(kernel, 0, &memory.input)?;
        trace!("arg 1: output buffer");
        driver.set_mem_arg(kernel, 1, &memory.output)?;
        trace!("arg 2: width = {}", width);
        driver.set_u32_arg(kernel, 2, width)?;
        trace!("arg 3: height = {}", height);
        driver.set_u32_arg(kernel, 3, height)
    }

    fn partition(width: u32, height: u32) -> WorkPartition {
        WorkPartition::linear(width as usize * height as usize)
    }

    fn download<D: Driver>(
        driver: &D,
        queue: &D::Queue,
        memory: &DeviceMemory<D>,
        _width: u32,
        _height: u32,
        out: &mut [u8],
    ) -> ClResult<()> {
        driver.read_buffer(queue, &memory.output, out)
    }
}

// =============================================================================
// Clamped image
// =============================================================================

/// 2D single-channel UNORM8 surfaces with clamp-to-edge sampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClampedImage;

impl TransferStrategy for ClampedImage {
    const MODE: TransferMode = TransferMode::ClampedImage;

    fn asset() -> &'static KernelAsset {
        &IMAGE_KERNEL
    }

    fn allocate<D: Driver>(
        driver: &D,
        context: &D::Context,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> ClResult<DeviceMemory<D>> {
        let (w, h) = (width as usize, height as usize);
        debug!(width, height, "allocating image surfaces");
        let input = driver.create_image(context, MemAccess::ReadOnly, w, h, pixels)?;
        let output = driver.create_image(context, MemAccess::WriteOnly, w, h, pixels)?;
        Ok(DeviceMemory { output, input })
    }

    fn upload<D: Driver>(_driver: &D, _queue: &D::Queue, _memory: &mut DeviceMemory<D>, _pixels: &[u8]) -> ClResult<()> {
        // Surfaces are populated at creation.
        Ok(())
    }

    fn bind<D: Driver>(
        driver: &D,
        kernel: &mut D::Kernel,
        memory: &DeviceMemory<D>,
        _width: u32,
        _height: u32,
    ) -> ClResult<()> {
        trace!("arg 0: input surface");
        driver.set_mem_arg(kernel, 0, &memory.input)?;
        trace!("arg 1: output surface");
        driver.set_mem_arg(kernel, 1, &memory.output)
    }

    fn partition(width: u32, height: u32) -> WorkPartition {
        WorkPartition::grid(height as usize - 1, width as usize - 1, [1, 1])
    }

    fn download<D: Driver>(
        driver: &D,
        queue: &D::Queue,
        memory: &DeviceMemory<D>,
        width: u32,
        height: u32,
        out: &mut [u8],
    ) -> ClResult<()> {
        driver.read_image(queue, &memory.output, [width as usize, height as usize], out)
    }
}
