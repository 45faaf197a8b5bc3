//! Accelerator runtime drivers.
//!
//! # Architecture
//!
//! ```text
//! EdgeFilter<D: Driver>
//!     +-- HostDriver   (in-process emulation, rayon)
//!     +-- OpenClDriver (OpenCL via opencl3)
//! ```
//!
//! The pipeline only talks to the [`Driver`] trait. Every handle type a
//! driver hands out releases its runtime object when dropped, so the owner
//! of a handle decides when it goes away.

mod host;

#[cfg(feature = "opencl")]
mod opencl;

pub use host::{
    Fault, HostContext, HostDevice, HostDriver, HostKernel, HostMem, HostPlatform, HostProgram,
    HostQueue, Journal, Resource,
};

#[cfg(feature = "opencl")]
pub use opencl::{ClMem, OpenClDriver};

use crate::ClResult;

/// Kernel-side access to a memory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemAccess {
    ReadOnly,
    WriteOnly,
}

/// Iteration domain submitted with a kernel.
///
/// `global` and `offset` are indexed by dimension; only the first `dims`
/// entries are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPartition {
    /// Number of dimensions (1 or 2).
    pub dims: u32,
    /// Work-items per dimension.
    pub global: [usize; 2],
    /// First global id per dimension, `None` for zero.
    pub offset: Option<[usize; 2]>,
}

impl WorkPartition {
    /// Flat domain of `len` work-items.
    pub fn linear(len: usize) -> Self {
        Self { dims: 1, global: [len, 1], offset: None }
    }

    /// 2D domain of `rows x cols` work-items starting at `offset`.
    pub fn grid(rows: usize, cols: usize, offset: [usize; 2]) -> Self {
        Self { dims: 2, global: [rows, cols], offset: Some(offset) }
    }

    /// Total number of work-items.
    pub fn work_items(&self) -> usize {
        self.global[..self.dims as usize].iter().product()
    }
}

/// Accelerator runtime operations used by the filter pipeline.
///
/// Methods map one-to-one onto runtime calls. Each returns the
/// [`ClError`](crate::ClError) variant of the stage it belongs to.
pub trait Driver {
    type Platform;
    type Device;
    type Context;
    type Queue;
    type Mem;
    type Program;
    type Kernel;

    /// Driver name.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Enumerate platforms in runtime order.
    fn platforms(&self) -> ClResult<Vec<Self::Platform>>;

    /// Vendor string of a platform.
    fn platform_vendor(&self, platform: &Self::Platform) -> ClResult<String>;

    /// Up to `count` general-purpose compute devices of a platform.
    fn devices(&self, platform: &Self::Platform, count: usize) -> ClResult<Vec<Self::Device>>;

    // =========================================================================
    // Context and queue
    // =========================================================================

    fn create_context(&self, device: &Self::Device) -> ClResult<Self::Context>;

    /// In-order queue bound to `device` within `context`.
    fn create_queue(&self, context: &Self::Context, device: &Self::Device) -> ClResult<Self::Queue>;

    // =========================================================================
    // Memory
    // =========================================================================

    /// Flat byte buffer of `len` bytes.
    fn create_buffer(&self, context: &Self::Context, access: MemAccess, len: usize) -> ClResult<Self::Mem>;

    /// Single-channel UNORM8 2D surface initialized from `host`.
    fn create_image(
        &self,
        context: &Self::Context,
        access: MemAccess,
        width: usize,
        height: usize,
        host: &[u8],
    ) -> ClResult<Self::Mem>;

    /// Blocking host to device copy of the whole buffer.
    fn write_buffer(&self, queue: &Self::Queue, mem: &mut Self::Mem, data: &[u8]) -> ClResult<()>;

    /// Blocking device to host copy of the whole buffer.
    fn read_buffer(&self, queue: &Self::Queue, mem: &Self::Mem, out: &mut [u8]) -> ClResult<()>;

    /// Blocking copy of region `(0,0)-(width,height)` of a surface.
    fn read_image(&self, queue: &Self::Queue, mem: &Self::Mem, region: [usize; 2], out: &mut [u8]) -> ClResult<()>;

    // =========================================================================
    // Program and kernel
    // =========================================================================

    fn build_program(
        &self,
        context: &Self::Context,
        device: &Self::Device,
        source: &str,
        options: &str,
    ) -> ClResult<Self::Program>;

    /// Compiler diagnostics of a built program.
    fn build_log(&self, program: &Self::Program, device: &Self::Device) -> ClResult<String>;

    fn create_kernel(&self, program: &Self::Program, entry: &str) -> ClResult<Self::Kernel>;

    fn set_mem_arg(&self, kernel: &mut Self::Kernel, index: u32, mem: &Self::Mem) -> ClResult<()>;

    fn set_u32_arg(&self, kernel: &mut Self::Kernel, index: u32, value: u32) -> ClResult<()>;

    // =========================================================================
    // Execution
    // =========================================================================

    fn enqueue_kernel(&self, queue: &Self::Queue, kernel: &Self::Kernel, partition: &WorkPartition) -> ClResult<()>;

    fn flush(&self, queue: &Self::Queue) -> ClResult<()>;

    /// Block until every submitted command has completed.
    fn finish(&self, queue: &Self::Queue) -> ClResult<()>;
}

/// Available drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// In-process emulation on the CPU.
    Host,
    /// OpenCL runtime.
    OpenCl,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "opencl") { Self::OpenCl } else { Self::Host }
    }
}

impl Backend {
    /// Check if this backend is available on current system.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Host => true,
            #[cfg(feature = "opencl")]
            Self::OpenCl => OpenClDriver::is_available(),
            #[cfg(not(feature = "opencl"))]
            Self::OpenCl => false,
        }
    }

    /// Get human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::OpenCl => "opencl",
        }
    }

    /// Vendor substring a default config should match on this backend.
    pub fn default_vendor(&self) -> &'static str {
        match self {
            Self::Host => crate::config::HOST_VENDOR,
            Self::OpenCl => crate::config::DEFAULT_VENDOR,
        }
    }
}

/// Get description of available backends.
pub fn describe_backends() -> String {
    let mut desc = String::new();
    for (backend, description) in [
        (Backend::OpenCl, "OpenCL platforms (requires `opencl` feature)"),
        (Backend::Host, "CPU emulation of the filter kernels"),
    ] {
        let status = if backend.is_available() { "+" } else { "-" };
        desc.push_str(&format!("[{}] {}: {}\n", status, backend.name(), description));
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_counts() {
        assert_eq!(WorkPartition::linear(48).work_items(), 48);
        assert_eq!(WorkPartition::grid(5, 7, [1, 1]).work_items(), 35);
    }

    #[test]
    fn test_host_always_available() {
        assert!(Backend::Host.is_available());
        assert!(describe_backends().contains("[+] host"));
    }
}
