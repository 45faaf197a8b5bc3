//! Kernel dispatch: bind, enqueue, block until complete.

use tracing::debug;

use crate::config::FilterConfig;
use crate::driver::Driver;
use crate::transfer::{DeviceMemory, TransferStrategy};
use crate::ClResult;

/// Run the strategy's kernel once over the whole image.
///
/// Returns after the queue has drained; the output memory then holds the
/// result and can be read back.
pub fn run<D: Driver, S: TransferStrategy>(
    driver: &D,
    queue: &D::Queue,
    kernel: &mut D::Kernel,
    memory: &DeviceMemory<D>,
    width: u32,
    height: u32,
    config: &FilterConfig,
) -> ClResult<()> {
    S::bind(driver, kernel, memory, width, height)?;

    let partition = S::partition(width, height);
    debug!(
        mode = S::MODE.name(),
        dims = partition.dims,
        global = ?&partition.global[..partition.dims as usize],
        offset = ?partition.offset,
        work_group_size = config.work_group_size,
        "enqueue"
    );
    driver.enqueue_kernel(queue, kernel, &partition)?;
    driver.flush(queue)?;
    driver.finish(queue)
}
