//! OpenCL driver.
//!
//! Requires the `opencl` feature and an installed OpenCL ICD loader.
//! Handles are the `opencl3` wrapper types, which release their runtime
//! object on drop.

use std::ffi::c_void;
use std::ptr;

use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::{CL_DEVICE_TYPE_GPU, Device};
use opencl3::kernel::Kernel;
use opencl3::memory::{
    Buffer, CL_MEM_COPY_HOST_PTR, CL_MEM_OBJECT_IMAGE2D, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY, CL_R,
    CL_UNORM_INT8, ClMem as _, Image,
};
use opencl3::platform::{Platform, get_platforms};
use opencl3::program::Program;
use opencl3::types::{CL_BLOCKING, cl_image_desc, cl_image_format, cl_mem, cl_mem_flags};

use super::{Driver, MemAccess, WorkPartition};
use crate::error::status;
use crate::{ClError, ClResult};

/// OpenCL memory object: flat buffer or 2D image.
pub enum ClMem {
    Buffer(Buffer<u8>),
    Image { image: Image, width: usize, height: usize },
}

impl ClMem {
    fn raw(&self) -> cl_mem {
        match self {
            Self::Buffer(b) => b.get(),
            Self::Image { image, .. } => image.get(),
        }
    }
}

fn flags(access: MemAccess) -> cl_mem_flags {
    match access {
        MemAccess::ReadOnly => CL_MEM_READ_ONLY,
        MemAccess::WriteOnly => CL_MEM_WRITE_ONLY,
    }
}

/// OpenCL runtime driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenClDriver;

impl OpenClDriver {
    pub fn new() -> Self {
        Self
    }

    /// Check if at least one OpenCL platform is installed.
    pub fn is_available() -> bool {
        get_platforms().map(|p| !p.is_empty()).unwrap_or(false)
    }
}

impl Driver for OpenClDriver {
    type Platform = Platform;
    type Device = Device;
    type Context = Context;
    type Queue = CommandQueue;
    type Mem = ClMem;
    type Program = Program;
    type Kernel = Kernel;

    fn name(&self) -> &'static str {
        "opencl"
    }

    fn platforms(&self) -> ClResult<Vec<Self::Platform>> {
        get_platforms().map_err(|e| ClError::Enumeration { status: e.0 })
    }

    fn platform_vendor(&self, platform: &Self::Platform) -> ClResult<String> {
        platform
            .vendor()
            .map(|v| v.trim_end_matches('\0').to_string())
            .map_err(|e| ClError::Enumeration { status: e.0 })
    }

    fn devices(&self, platform: &Self::Platform, count: usize) -> ClResult<Vec<Self::Device>> {
        let ids = platform
            .get_devices(CL_DEVICE_TYPE_GPU)
            .map_err(|e| ClError::Enumeration { status: e.0 })?;
        if ids.is_empty() {
            return Err(ClError::Enumeration { status: status::DEVICE_NOT_FOUND });
        }
        Ok(ids.into_iter().take(count).map(Device::new).collect())
    }

    fn create_context(&self, device: &Self::Device) -> ClResult<Self::Context> {
        Context::from_device(device).map_err(|e| ClError::ContextCreation { status: e.0 })
    }

    fn create_queue(&self, context: &Self::Context, _device: &Self::Device) -> ClResult<Self::Queue> {
        // OpenCL 1.2 entry point; the context holds exactly the selected device.
        #[allow(deprecated)]
        CommandQueue::create_default(context, 0).map_err(|e| ClError::QueueCreation { status: e.0 })
    }

    fn create_buffer(&self, context: &Self::Context, access: MemAccess, len: usize) -> ClResult<Self::Mem> {
        let buffer = unsafe { Buffer::<u8>::create(context, flags(access), len, ptr::null_mut()) }
            .map_err(|e| ClError::MemoryAllocation { status: e.0 })?;
        Ok(ClMem::Buffer(buffer))
    }

    fn create_image(
        &self,
        context: &Self::Context,
        access: MemAccess,
        width: usize,
        height: usize,
        host: &[u8],
    ) -> ClResult<Self::Mem> {
        if host.len() != width * height {
            return Err(ClError::MemoryAllocation { status: status::INVALID_VALUE });
        }
        let format = cl_image_format {
            image_channel_order: CL_R,
            image_channel_data_type: CL_UNORM_INT8,
        };
        let desc = cl_image_desc {
            image_type: CL_MEM_OBJECT_IMAGE2D,
            image_width: width,
            image_height: height,
            image_depth: 1,
            image_array_size: 1,
            image_row_pitch: 0,
            image_slice_pitch: 0,
            num_mip_levels: 0,
            num_samples: 0,
            buffer: ptr::null_mut(),
        };
        // COPY_HOST_PTR only reads from host memory during creation.
        let image = unsafe {
            Image::create(
                context,
                flags(access) | CL_MEM_COPY_HOST_PTR,
                &format,
                &desc,
                host.as_ptr() as *mut c_void,
            )
        }
        .map_err(|e| ClError::MemoryAllocation { status: e.0 })?;
        Ok(ClMem::Image { image, width, height })
    }

    fn write_buffer(&self, queue: &Self::Queue, mem: &mut Self::Mem, data: &[u8]) -> ClResult<()> {
        let ClMem::Buffer(buffer) = mem else {
            return Err(ClError::Upload { status: status::INVALID_MEM_OBJECT });
        };
        unsafe { queue.enqueue_write_buffer(buffer, CL_BLOCKING, 0, data, &[]) }
            .map_err(|e| ClError::Upload { status: e.0 })?;
        Ok(())
    }

    fn read_buffer(&self, queue: &Self::Queue, mem: &Self::Mem, out: &mut [u8]) -> ClResult<()> {
        let ClMem::Buffer(buffer) = mem else {
            return Err(ClError::Readback { status: status::INVALID_MEM_OBJECT });
        };
        unsafe { queue.enqueue_read_buffer(buffer, CL_BLOCKING, 0, out, &[]) }
            .map_err(|e| ClError::Readback { status: e.0 })?;
        Ok(())
    }

    fn read_image(&self, queue: &Self::Queue, mem: &Self::Mem, region: [usize; 2], out: &mut [u8]) -> ClResult<()> {
        let ClMem::Image { image, width, height } = mem else {
            return Err(ClError::Readback { status: status::INVALID_MEM_OBJECT });
        };
        let [rw, rh] = region;
        if rw > *width || rh > *height || out.len() != rw * rh {
            return Err(ClError::Readback { status: status::INVALID_VALUE });
        }
        let origin = [0usize; 3];
        let region = [rw, rh, 1];
        unsafe {
            queue.enqueue_read_image(
                image,
                CL_BLOCKING,
                origin.as_ptr(),
                region.as_ptr(),
                0,
                0,
                out.as_mut_ptr() as *mut c_void,
                &[],
            )
        }
        .map_err(|e| ClError::Readback { status: e.0 })?;
        Ok(())
    }

    fn build_program(
        &self,
        context: &Self::Context,
        device: &Self::Device,
        source: &str,
        options: &str,
    ) -> ClResult<Self::Program> {
        let mut program = Program::create_from_source(context, source).map_err(|e| ClError::Build {
            status: e.0,
            log: String::new(),
        })?;
        if let Err(e) = program.build(&[device.id()], options) {
            let log = program
                .get_build_log(device.id())
                .unwrap_or_else(|le| format!("build log unavailable (status {})", le.0));
            return Err(ClError::Build { status: e.0, log });
        }
        Ok(program)
    }

    fn build_log(&self, program: &Self::Program, device: &Self::Device) -> ClResult<String> {
        program
            .get_build_log(device.id())
            .map_err(|e| ClError::Build { status: e.0, log: String::new() })
    }

    fn create_kernel(&self, program: &Self::Program, entry: &str) -> ClResult<Self::Kernel> {
        Kernel::create(program, entry).map_err(|e| ClError::Build {
            status: e.0,
            log: format!("no kernel named `{entry}` in program"),
        })
    }

    fn set_mem_arg(&self, kernel: &mut Self::Kernel, index: u32, mem: &Self::Mem) -> ClResult<()> {
        let raw = mem.raw();
        unsafe { kernel.set_arg(index, &raw) }.map_err(|e| ClError::ArgBind { index, status: e.0 })
    }

    fn set_u32_arg(&self, kernel: &mut Self::Kernel, index: u32, value: u32) -> ClResult<()> {
        unsafe { kernel.set_arg(index, &value) }.map_err(|e| ClError::ArgBind { index, status: e.0 })
    }

    fn enqueue_kernel(&self, queue: &Self::Queue, kernel: &Self::Kernel, partition: &WorkPartition) -> ClResult<()> {
        let offset = partition.offset.as_ref().map_or(ptr::null(), |o| o.as_ptr());
        // The returned event is dropped; completion is observed through finish().
        unsafe {
            queue.enqueue_nd_range_kernel(
                kernel.get(),
                partition.dims,
                offset,
                partition.global.as_ptr(),
                ptr::null(),
                &[],
            )
        }
        .map_err(|e| ClError::Enqueue { status: e.0 })?;
        Ok(())
    }

    fn flush(&self, queue: &Self::Queue) -> ClResult<()> {
        queue.flush().map_err(|e| ClError::Enqueue { status: e.0 })
    }

    fn finish(&self, queue: &Self::Queue) -> ClResult<()> {
        queue.finish().map_err(|e| ClError::Enqueue { status: e.0 })
    }
}
