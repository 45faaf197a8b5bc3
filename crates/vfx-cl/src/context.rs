//! Execution context: one context and one in-order queue for a device.

use tracing::debug;

use crate::driver::Driver;
use crate::ClResult;

/// Device, context and queue of one filter call.
///
/// Fields drop in declaration order: queue, context, device.
pub struct ExecutionContext<D: Driver> {
    queue: D::Queue,
    context: D::Context,
    device: D::Device,
}

impl<D: Driver> ExecutionContext<D> {
    /// Create a context bound to exactly `device` and a queue on it.
    ///
    /// Takes ownership of the device; it is released with the context.
    pub fn create(driver: &D, device: D::Device) -> ClResult<Self> {
        let context = driver.create_context(&device)?;
        let queue = driver.create_queue(&context, &device)?;
        debug!(driver = driver.name(), "execution context ready");
        Ok(Self { queue, context, device })
    }

    pub fn queue(&self) -> &D::Queue {
        &self.queue
    }

    pub fn context(&self) -> &D::Context {
        &self.context
    }

    pub fn device(&self) -> &D::Device {
        &self.device
    }
}

/// Set up the execution context of one filter call on `device`.
pub fn create_context<D: Driver>(driver: &D, device: D::Device) -> ClResult<ExecutionContext<D>> {
    ExecutionContext::create(driver, device)
}
