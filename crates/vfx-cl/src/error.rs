//! Error types for the edge filter pipeline.

use thiserror::Error;

/// Raw runtime status codes used by the drivers.
///
/// Values match the OpenCL status codes so both drivers report the same
/// numbers for the same failure.
pub mod status {
    pub const SUCCESS: i32 = 0;
    pub const DEVICE_NOT_FOUND: i32 = -1;
    pub const DEVICE_NOT_AVAILABLE: i32 = -2;
    pub const MEM_OBJECT_ALLOCATION_FAILURE: i32 = -4;
    pub const OUT_OF_RESOURCES: i32 = -5;
    pub const OUT_OF_HOST_MEMORY: i32 = -6;
    pub const BUILD_PROGRAM_FAILURE: i32 = -11;
    pub const INVALID_VALUE: i32 = -30;
    pub const INVALID_CONTEXT: i32 = -34;
    pub const INVALID_COMMAND_QUEUE: i32 = -36;
    pub const INVALID_MEM_OBJECT: i32 = -38;
    pub const INVALID_IMAGE_SIZE: i32 = -40;
    pub const INVALID_KERNEL_NAME: i32 = -46;
    pub const INVALID_ARG_INDEX: i32 = -49;
    pub const INVALID_ARG_VALUE: i32 = -50;
    pub const INVALID_KERNEL_ARGS: i32 = -52;
    pub const INVALID_WORK_DIMENSION: i32 = -53;
    pub const INVALID_GLOBAL_WORK_SIZE: i32 = -63;
    pub const PLATFORM_NOT_FOUND: i32 = -1001;
}

/// Edge filter pipeline errors.
///
/// One variant per pipeline stage. Runtime failures carry the raw status
/// reported by the driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClError {
    #[error("platform enumeration failed with status {status}")]
    Enumeration { status: i32 },

    #[error("no platform vendor contains {vendor:?}")]
    NoMatchingPlatform { vendor: String },

    #[error("context creation failed with status {status}")]
    ContextCreation { status: i32 },

    #[error("command queue creation failed with status {status}")]
    QueueCreation { status: i32 },

    #[error("device memory allocation failed with status {status}")]
    MemoryAllocation { status: i32 },

    #[error("host to device upload failed with status {status}")]
    Upload { status: i32 },

    #[error("kernel build failed with status {status}:\n{log}")]
    Build { status: i32, log: String },

    #[error("binding kernel argument {index} failed with status {status}")]
    ArgBind { index: u32, status: i32 },

    #[error("kernel enqueue failed with status {status}")]
    Enqueue { status: i32 },

    #[error("device to host readback failed with status {status}")]
    Readback { status: i32 },

    #[error("invalid dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),

    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

impl ClError {
    /// Raw status code for this error.
    ///
    /// Caller-side validation errors report `INVALID_VALUE`, a vendor
    /// mismatch reports `PLATFORM_NOT_FOUND`.
    pub fn status(&self) -> i32 {
        match self {
            Self::Enumeration { status }
            | Self::ContextCreation { status }
            | Self::QueueCreation { status }
            | Self::MemoryAllocation { status }
            | Self::Upload { status }
            | Self::Build { status, .. }
            | Self::ArgBind { status, .. }
            | Self::Enqueue { status }
            | Self::Readback { status } => *status,
            Self::NoMatchingPlatform { .. } => status::PLATFORM_NOT_FOUND,
            Self::InvalidDimensions(..) | Self::BufferSizeMismatch { .. } => status::INVALID_VALUE,
        }
    }

    /// Name of the pipeline operation that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Enumeration { .. } | Self::NoMatchingPlatform { .. } => "select_device",
            Self::ContextCreation { .. } | Self::QueueCreation { .. } => "create_context",
            Self::MemoryAllocation { .. } => "allocate",
            Self::Upload { .. } => "upload",
            Self::Build { .. } => "build",
            Self::ArgBind { .. } | Self::Enqueue { .. } => "run",
            Self::Readback { .. } => "download",
            Self::InvalidDimensions(..) | Self::BufferSizeMismatch { .. } => "validate",
        }
    }

    /// Process exit code for a fail-fast front end.
    ///
    /// The raw status is used as-is; a zero status still maps to a failure.
    pub fn exit_code(&self) -> i32 {
        match self.status() {
            status::SUCCESS => 1,
            code => code,
        }
    }
}

pub type ClResult<T> = Result<T, ClError>;
