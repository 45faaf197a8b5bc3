//! Host driver: in-process emulation of an accelerator runtime.
//!
//! Behaves like a minimal OpenCL implementation with configurable
//! platforms. Programs are "compiled" by locating their `__kernel` entry
//! points; the two filter kernels are executed on the CPU with rayon over
//! the submitted work partition, honoring offsets and clamp-to-edge
//! sampling.
//!
//! Every handle creation and release is written to a [`Journal`], and a
//! [`Fault`] can be injected at any stage, so pipeline ownership and error
//! paths can be tested without device hardware.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use rayon::prelude::*;
use regex::Regex;

use super::{Driver, MemAccess, WorkPartition};
use crate::config::HOST_VENDOR;
use crate::error::status;
use crate::program::{ENTRY_IMAGE, ENTRY_LINEAR};
use crate::stencil;
use crate::{ClError, ClResult};

// =============================================================================
// Journal
// =============================================================================

/// Runtime object kinds recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Device,
    Context,
    Queue,
    Memory,
    Program,
    Kernel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Created(Resource),
    Released(Resource),
}

/// Shared log of handle creations and releases.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl Journal {
    fn push(&self, entry: Entry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    fn collect(&self, created: bool) -> Vec<Resource> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|e| match (e, created) {
                (Entry::Created(r), true) | (Entry::Released(r), false) => Some(*r),
                _ => None,
            })
            .collect()
    }

    /// Resources in creation order.
    pub fn created(&self) -> Vec<Resource> {
        self.collect(true)
    }

    /// Resources in release order.
    pub fn released(&self) -> Vec<Resource> {
        self.collect(false)
    }

    /// Number of handles created but not yet released.
    pub fn live(&self) -> usize {
        self.created().len() - self.released().len()
    }

    /// Forget all recorded entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn track(&self, resource: Resource) -> Tracked {
        self.push(Entry::Created(resource));
        Tracked { resource, journal: self.clone() }
    }
}

/// Release marker owned by every host handle.
#[derive(Debug)]
struct Tracked {
    resource: Resource,
    journal: Journal,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.journal.push(Entry::Released(self.resource));
    }
}

// =============================================================================
// Fault injection
// =============================================================================

/// Stage at which the host driver reports a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Platforms,
    Devices,
    Context,
    Queue,
    Allocation,
    Upload,
    Build,
    ArgBind,
    Enqueue,
    Flush,
    Finish,
    Readback,
}

impl Fault {
    fn error(self) -> ClError {
        match self {
            Self::Platforms => ClError::Enumeration { status: status::PLATFORM_NOT_FOUND },
            Self::Devices => ClError::Enumeration { status: status::DEVICE_NOT_FOUND },
            Self::Context => ClError::ContextCreation { status: status::DEVICE_NOT_AVAILABLE },
            Self::Queue => ClError::QueueCreation { status: status::OUT_OF_HOST_MEMORY },
            Self::Allocation => ClError::MemoryAllocation { status: status::MEM_OBJECT_ALLOCATION_FAILURE },
            Self::Upload => ClError::Upload { status: status::OUT_OF_RESOURCES },
            Self::Build => ClError::Build {
                status: status::BUILD_PROGRAM_FAILURE,
                log: "host: injected build failure".to_string(),
            },
            Self::ArgBind => ClError::ArgBind { index: 0, status: status::INVALID_ARG_VALUE },
            Self::Enqueue | Self::Finish => ClError::Enqueue { status: status::OUT_OF_RESOURCES },
            Self::Flush => ClError::Enqueue { status: status::INVALID_COMMAND_QUEUE },
            Self::Readback => ClError::Readback { status: status::OUT_OF_RESOURCES },
        }
    }
}

// =============================================================================
// Handles
// =============================================================================

/// Platform exposed by the host driver.
#[derive(Debug, Clone)]
pub struct HostPlatform {
    vendor: String,
    devices: usize,
}

/// Device handle.
#[derive(Debug)]
pub struct HostDevice {
    index: usize,
    _tracked: Tracked,
}

/// Context handle.
#[derive(Debug)]
pub struct HostContext {
    _tracked: Tracked,
}

/// In-order queue. Commands complete when enqueued.
#[derive(Debug)]
pub struct HostQueue {
    submitted: AtomicUsize,
    _tracked: Tracked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemKind {
    Buffer,
    Image { width: usize, height: usize },
}

/// Memory object: a flat buffer or a single-channel UNORM8 surface.
#[derive(Debug)]
pub struct HostMem {
    kind: MemKind,
    access: MemAccess,
    data: Arc<RwLock<Vec<u8>>>,
    _tracked: Tracked,
}

impl HostMem {
    /// Kernel-side access flag the object was created with.
    pub fn access(&self) -> MemAccess {
        self.access
    }

    fn snapshot(&self) -> Vec<u8> {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Kernels the host driver knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostEntry {
    FindEdge,
    FindEdgeImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgKind {
    Buffer,
    Image,
    U32,
}

impl HostEntry {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            ENTRY_LINEAR => Some(Self::FindEdge),
            ENTRY_IMAGE => Some(Self::FindEdgeImage),
            _ => None,
        }
    }

    fn signature(self) -> &'static [ArgKind] {
        match self {
            Self::FindEdge => &[ArgKind::Buffer, ArgKind::Buffer, ArgKind::U32, ArgKind::U32],
            Self::FindEdgeImage => &[ArgKind::Image, ArgKind::Image],
        }
    }

    fn dims(self) -> u32 {
        match self {
            Self::FindEdge => 1,
            Self::FindEdgeImage => 2,
        }
    }
}

/// Built program.
#[derive(Debug)]
pub struct HostProgram {
    entries: Vec<String>,
    log: String,
    _tracked: Tracked,
}

#[derive(Debug, Clone)]
enum HostArg {
    Mem { kind: MemKind, data: Arc<RwLock<Vec<u8>>> },
    U32(u32),
}

/// Kernel with its bound arguments.
#[derive(Debug)]
pub struct HostKernel {
    entry: HostEntry,
    args: Vec<Option<HostArg>>,
    _tracked: Tracked,
}

// =============================================================================
// HostDriver
// =============================================================================

/// In-process accelerator emulation.
#[derive(Debug, Clone)]
pub struct HostDriver {
    platforms: Vec<HostPlatform>,
    fault: Option<Fault>,
    journal: Journal,
}

impl Default for HostDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDriver {
    /// Driver with a single one-device platform reporting [`HOST_VENDOR`].
    pub fn new() -> Self {
        Self::empty().with_platform(HOST_VENDOR, 1)
    }

    /// Driver with no platforms at all.
    pub fn empty() -> Self {
        Self { platforms: Vec::new(), fault: None, journal: Journal::default() }
    }

    /// Driver with one single-device platform per vendor string.
    pub fn with_vendors<I, S>(vendors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        vendors.into_iter().fold(Self::empty(), |d, v| d.with_platform(v, 1))
    }

    /// Append a platform with `devices` devices.
    pub fn with_platform(mut self, vendor: impl Into<String>, devices: usize) -> Self {
        self.platforms.push(HostPlatform { vendor: vendor.into(), devices });
        self
    }

    /// Fail every call that reaches `fault`.
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Creation/release log shared by all handles of this driver.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    fn check(&self, stage: Fault) -> ClResult<()> {
        match self.fault {
            Some(f) if f == stage => Err(f.error()),
            _ => Ok(()),
        }
    }

    fn mem(&self, kind: MemKind, access: MemAccess, data: Vec<u8>) -> HostMem {
        HostMem {
            kind,
            access,
            data: Arc::new(RwLock::new(data)),
            _tracked: self.journal.track(Resource::Memory),
        }
    }
}

fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:__kernel\s+void|void\s+__kernel)\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(")
            .expect("entry point pattern is valid")
    })
}

fn bound_mem(arg: &Option<HostArg>) -> ClResult<(MemKind, Arc<RwLock<Vec<u8>>>)> {
    match arg {
        Some(HostArg::Mem { kind, data }) => Ok((*kind, Arc::clone(data))),
        _ => Err(ClError::Enqueue { status: status::INVALID_KERNEL_ARGS }),
    }
}

fn bound_u32(arg: &Option<HostArg>) -> ClResult<u32> {
    match arg {
        Some(HostArg::U32(v)) => Ok(*v),
        _ => Err(ClError::Enqueue { status: status::INVALID_KERNEL_ARGS }),
    }
}

fn read(data: &RwLock<Vec<u8>>) -> Vec<u8> {
    data.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn scatter(data: &RwLock<Vec<u8>>, writes: Vec<(usize, u8)>) {
    let mut out = data.write().unwrap_or_else(PoisonError::into_inner);
    for (i, v) in writes {
        out[i] = v;
    }
}

/// `find_edge`: flat domain, explicit border test, bytes in and out.
fn run_find_edge(kernel: &HostKernel, partition: &WorkPartition) -> ClResult<()> {
    let (_, input) = bound_mem(&kernel.args[0])?;
    let (_, output) = bound_mem(&kernel.args[1])?;
    let w = bound_u32(&kernel.args[2])? as usize;
    let h = bound_u32(&kernel.args[3])? as usize;

    let src = read(&input);
    let total = w * h;
    if total == 0 || src.len() < total || output.read().unwrap_or_else(PoisonError::into_inner).len() < total {
        return Err(ClError::Enqueue { status: status::INVALID_MEM_OBJECT });
    }

    let start = partition.offset.map_or(0, |o| o[0]);
    let writes: Vec<(usize, u8)> = (start..start + partition.global[0])
        .into_par_iter()
        .filter_map(|id| {
            let (x, y) = (id % w, id / w);
            if id >= total || stencil::is_border(x, y, w, h) {
                return None;
            }
            Some((id, stencil::linear_at(&src, w, x, y)))
        })
        .collect();

    scatter(&output, writes);
    Ok(())
}

/// `find_edge_image`: 2D domain (rows, cols), clamp-to-edge sampler.
fn run_find_edge_image(kernel: &HostKernel, partition: &WorkPartition) -> ClResult<()> {
    let (in_kind, input) = bound_mem(&kernel.args[0])?;
    let (out_kind, output) = bound_mem(&kernel.args[1])?;
    let (MemKind::Image { width: w, height: h }, MemKind::Image { width: ow, height: oh }) = (in_kind, out_kind)
    else {
        return Err(ClError::Enqueue { status: status::INVALID_MEM_OBJECT });
    };

    let src = read(&input);
    let [row0, col0] = partition.offset.unwrap_or([0, 0]);
    let [rows, cols] = partition.global;

    let writes: Vec<(usize, u8)> = (row0..row0 + rows)
        .into_par_iter()
        .flat_map_iter(|y| {
            let src = &src;
            (col0..col0 + cols)
                .filter(move |&x| x < ow && y < oh)
                .map(move |x| (y * ow + x, stencil::clamped_at(src, w, h, x, y)))
        })
        .collect();

    scatter(&output, writes);
    Ok(())
}

impl Driver for HostDriver {
    type Platform = HostPlatform;
    type Device = HostDevice;
    type Context = HostContext;
    type Queue = HostQueue;
    type Mem = HostMem;
    type Program = HostProgram;
    type Kernel = HostKernel;

    fn name(&self) -> &'static str {
        "host"
    }

    fn platforms(&self) -> ClResult<Vec<Self::Platform>> {
        self.check(Fault::Platforms)?;
        Ok(self.platforms.clone())
    }

    fn platform_vendor(&self, platform: &Self::Platform) -> ClResult<String> {
        Ok(platform.vendor.clone())
    }

    fn devices(&self, platform: &Self::Platform, count: usize) -> ClResult<Vec<Self::Device>> {
        self.check(Fault::Devices)?;
        if platform.devices == 0 {
            return Err(ClError::Enumeration { status: status::DEVICE_NOT_FOUND });
        }
        Ok((0..platform.devices.min(count))
            .map(|index| HostDevice { index, _tracked: self.journal.track(Resource::Device) })
            .collect())
    }

    fn create_context(&self, _device: &Self::Device) -> ClResult<Self::Context> {
        self.check(Fault::Context)?;
        Ok(HostContext { _tracked: self.journal.track(Resource::Context) })
    }

    fn create_queue(&self, _context: &Self::Context, _device: &Self::Device) -> ClResult<Self::Queue> {
        self.check(Fault::Queue)?;
        Ok(HostQueue {
            submitted: AtomicUsize::new(0),
            _tracked: self.journal.track(Resource::Queue),
        })
    }

    fn create_buffer(&self, _context: &Self::Context, access: MemAccess, len: usize) -> ClResult<Self::Mem> {
        self.check(Fault::Allocation)?;
        if len == 0 {
            return Err(ClError::MemoryAllocation { status: status::INVALID_VALUE });
        }
        Ok(self.mem(MemKind::Buffer, access, vec![0; len]))
    }

    fn create_image(
        &self,
        _context: &Self::Context,
        access: MemAccess,
        width: usize,
        height: usize,
        host: &[u8],
    ) -> ClResult<Self::Mem> {
        self.check(Fault::Allocation)?;
        if width == 0 || height == 0 {
            return Err(ClError::MemoryAllocation { status: status::INVALID_IMAGE_SIZE });
        }
        if host.len() != width * height {
            return Err(ClError::MemoryAllocation { status: status::INVALID_VALUE });
        }
        Ok(self.mem(MemKind::Image { width, height }, access, host.to_vec()))
    }

    fn write_buffer(&self, _queue: &Self::Queue, mem: &mut Self::Mem, data: &[u8]) -> ClResult<()> {
        self.check(Fault::Upload)?;
        if mem.kind != MemKind::Buffer {
            return Err(ClError::Upload { status: status::INVALID_MEM_OBJECT });
        }
        let mut dst = mem.data.write().unwrap_or_else(PoisonError::into_inner);
        if data.len() > dst.len() {
            return Err(ClError::Upload { status: status::INVALID_VALUE });
        }
        dst[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, _queue: &Self::Queue, mem: &Self::Mem, out: &mut [u8]) -> ClResult<()> {
        self.check(Fault::Readback)?;
        if mem.kind != MemKind::Buffer {
            return Err(ClError::Readback { status: status::INVALID_MEM_OBJECT });
        }
        let src = mem.snapshot();
        if out.len() != src.len() {
            return Err(ClError::Readback { status: status::INVALID_VALUE });
        }
        out.copy_from_slice(&src);
        Ok(())
    }

    fn read_image(&self, _queue: &Self::Queue, mem: &Self::Mem, region: [usize; 2], out: &mut [u8]) -> ClResult<()> {
        self.check(Fault::Readback)?;
        let MemKind::Image { width, height } = mem.kind else {
            return Err(ClError::Readback { status: status::INVALID_MEM_OBJECT });
        };
        let [rw, rh] = region;
        if rw == 0 || rh == 0 || rw > width || rh > height || out.len() != rw * rh {
            return Err(ClError::Readback { status: status::INVALID_VALUE });
        }
        let src = mem.snapshot();
        for (y, row) in out.chunks_exact_mut(rw).enumerate() {
            row.copy_from_slice(&src[y * width..y * width + rw]);
        }
        Ok(())
    }

    fn build_program(
        &self,
        _context: &Self::Context,
        _device: &Self::Device,
        source: &str,
        _options: &str,
    ) -> ClResult<Self::Program> {
        self.check(Fault::Build)?;

        let mut log = String::new();
        let mut entries = Vec::new();
        for cap in entry_pattern().captures_iter(source) {
            let name = &cap[1];
            if HostEntry::from_name(name).is_some() {
                log.push_str(&format!("host: compiled entry point `{name}`\n"));
                entries.push(name.to_string());
            } else {
                log.push_str(&format!("host: error: entry point `{name}` has no host implementation\n"));
            }
        }

        if entries.is_empty() || log.contains("error:") {
            if entries.is_empty() {
                log.push_str("host: error: no kernel entry points found\n");
            }
            return Err(ClError::Build { status: status::BUILD_PROGRAM_FAILURE, log });
        }

        Ok(HostProgram { entries, log, _tracked: self.journal.track(Resource::Program) })
    }

    fn build_log(&self, program: &Self::Program, _device: &Self::Device) -> ClResult<String> {
        Ok(program.log.clone())
    }

    fn create_kernel(&self, program: &Self::Program, entry: &str) -> ClResult<Self::Kernel> {
        let host_entry = program
            .entries
            .iter()
            .find(|e| e.as_str() == entry)
            .and_then(|e| HostEntry::from_name(e))
            .ok_or_else(|| ClError::Build {
                status: status::INVALID_KERNEL_NAME,
                log: format!("no kernel named `{entry}` in program"),
            })?;

        Ok(HostKernel {
            entry: host_entry,
            args: vec![None; host_entry.signature().len()],
            _tracked: self.journal.track(Resource::Kernel),
        })
    }

    fn set_mem_arg(&self, kernel: &mut Self::Kernel, index: u32, mem: &Self::Mem) -> ClResult<()> {
        self.check(Fault::ArgBind)?;
        let expected = kernel
            .entry
            .signature()
            .get(index as usize)
            .ok_or(ClError::ArgBind { index, status: status::INVALID_ARG_INDEX })?;
        let matches = matches!(
            (expected, mem.kind),
            (ArgKind::Buffer, MemKind::Buffer) | (ArgKind::Image, MemKind::Image { .. })
        );
        if !matches {
            return Err(ClError::ArgBind { index, status: status::INVALID_MEM_OBJECT });
        }
        kernel.args[index as usize] = Some(HostArg::Mem { kind: mem.kind, data: Arc::clone(&mem.data) });
        Ok(())
    }

    fn set_u32_arg(&self, kernel: &mut Self::Kernel, index: u32, value: u32) -> ClResult<()> {
        self.check(Fault::ArgBind)?;
        match kernel.entry.signature().get(index as usize) {
            Some(ArgKind::U32) => {
                kernel.args[index as usize] = Some(HostArg::U32(value));
                Ok(())
            }
            Some(_) => Err(ClError::ArgBind { index, status: status::INVALID_ARG_VALUE }),
            None => Err(ClError::ArgBind { index, status: status::INVALID_ARG_INDEX }),
        }
    }

    fn enqueue_kernel(&self, queue: &Self::Queue, kernel: &Self::Kernel, partition: &WorkPartition) -> ClResult<()> {
        self.check(Fault::Enqueue)?;
        if kernel.args.iter().any(Option::is_none) {
            return Err(ClError::Enqueue { status: status::INVALID_KERNEL_ARGS });
        }
        if partition.dims != kernel.entry.dims() {
            return Err(ClError::Enqueue { status: status::INVALID_WORK_DIMENSION });
        }
        if partition.work_items() == 0 {
            return Err(ClError::Enqueue { status: status::INVALID_GLOBAL_WORK_SIZE });
        }

        match kernel.entry {
            HostEntry::FindEdge => run_find_edge(kernel, partition)?,
            HostEntry::FindEdgeImage => run_find_edge_image(kernel, partition)?,
        }
        queue.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn flush(&self, _queue: &Self::Queue) -> ClResult<()> {
        self.check(Fault::Flush)
    }

    fn finish(&self, _queue: &Self::Queue) -> ClResult<()> {
        self.check(Fault::Finish)
    }
}

impl HostQueue {
    /// Number of kernels executed on this queue.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }
}

impl HostDevice {
    /// Position of the device within its platform.
    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(driver: &HostDriver) -> (HostDevice, HostContext, HostQueue) {
        let platform = driver.platforms().unwrap().remove(0);
        let device = driver.devices(&platform, 1).unwrap().remove(0);
        let context = driver.create_context(&device).unwrap();
        let queue = driver.create_queue(&context, &device).unwrap();
        (device, context, queue)
    }

    #[test]
    fn test_device_count_capped() {
        let driver = HostDriver::empty().with_platform("Acme", 4);
        let platform = driver.platforms().unwrap().remove(0);
        assert_eq!(driver.devices(&platform, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_platform_without_devices() {
        let driver = HostDriver::empty().with_platform("Acme", 0);
        let platform = driver.platforms().unwrap().remove(0);
        let err = driver.devices(&platform, 1).unwrap_err();
        assert_eq!(err, ClError::Enumeration { status: status::DEVICE_NOT_FOUND });
    }

    #[test]
    fn test_build_rejects_unknown_entry() {
        let driver = HostDriver::new();
        let (device, context, _queue) = setup(&driver);
        let src = "__kernel void blur(global uchar *in) {}";
        let err = driver.build_program(&context, &device, src, "").unwrap_err();
        match err {
            ClError::Build { status: code, log } => {
                assert_eq!(code, status::BUILD_PROGRAM_FAILURE);
                assert!(log.contains("`blur`"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_build_accepts_reversed_qualifier() {
        let driver = HostDriver::new();
        let (device, context, _queue) = setup(&driver);
        let src = "void __kernel find_edge(global unsigned char *in) {}";
        let program = driver.build_program(&context, &device, src, "").unwrap();
        assert!(driver.create_kernel(&program, "find_edge").is_ok());
        assert!(driver.create_kernel(&program, "find_edge_image").is_err());
    }

    #[test]
    fn test_arg_type_checked() {
        let driver = HostDriver::new();
        let (device, context, _queue) = setup(&driver);
        let program = driver
            .build_program(&context, &device, "__kernel void find_edge_image(", "")
            .unwrap();
        let mut kernel = driver.create_kernel(&program, "find_edge_image").unwrap();
        let buf = driver.create_buffer(&context, MemAccess::ReadOnly, 9).unwrap();
        let err = driver.set_mem_arg(&mut kernel, 0, &buf).unwrap_err();
        assert_eq!(err, ClError::ArgBind { index: 0, status: status::INVALID_MEM_OBJECT });
        let err = driver.set_u32_arg(&mut kernel, 2, 7).unwrap_err();
        assert_eq!(err, ClError::ArgBind { index: 2, status: status::INVALID_ARG_INDEX });
    }

    #[test]
    fn test_unbound_args_rejected() {
        let driver = HostDriver::new();
        let (device, context, queue) = setup(&driver);
        let program = driver.build_program(&context, &device, "__kernel void find_edge(", "").unwrap();
        let kernel = driver.create_kernel(&program, "find_edge").unwrap();
        let err = driver.enqueue_kernel(&queue, &kernel, &WorkPartition::linear(9)).unwrap_err();
        assert_eq!(err, ClError::Enqueue { status: status::INVALID_KERNEL_ARGS });
        assert_eq!(queue.submitted(), 0);
    }

    #[test]
    fn test_read_image_region() {
        let driver = HostDriver::new();
        let (_device, context, queue) = setup(&driver);
        let pixels: Vec<u8> = (0..12).collect();
        let img = driver.create_image(&context, MemAccess::ReadOnly, 4, 3, &pixels).unwrap();
        let mut out = vec![0u8; 12];
        driver.read_image(&queue, &img, [4, 3], &mut out).unwrap();
        assert_eq!(out, pixels);
    }

    #[test]
    fn test_read_image_empty_region_rejected() {
        let driver = HostDriver::new();
        let (_device, context, queue) = setup(&driver);
        let img = driver.create_image(&context, MemAccess::ReadOnly, 4, 3, &[0u8; 12]).unwrap();
        let mut out: Vec<u8> = Vec::new();
        for region in [[0, 3], [4, 0], [0, 0]] {
            let err = driver.read_image(&queue, &img, region, &mut out).unwrap_err();
            assert_eq!(err, ClError::Readback { status: status::INVALID_VALUE });
        }
    }

    #[test]
    fn test_journal_tracks_release() {
        let driver = HostDriver::new();
        {
            let _handles = setup(&driver);
            assert_eq!(driver.journal().live(), 3);
        }
        assert_eq!(driver.journal().live(), 0);
        assert_eq!(
            driver.journal().released(),
            vec![Resource::Device, Resource::Context, Resource::Queue]
        );
    }

    #[test]
    fn test_fault_injection() {
        let driver = HostDriver::new().with_fault(Fault::Queue);
        let platform = driver.platforms().unwrap().remove(0);
        let device = driver.devices(&platform, 1).unwrap().remove(0);
        let context = driver.create_context(&device).unwrap();
        let err = driver.create_queue(&context, &device).unwrap_err();
        assert_eq!(err, ClError::QueueCreation { status: status::OUT_OF_HOST_MEMORY });
    }
}
