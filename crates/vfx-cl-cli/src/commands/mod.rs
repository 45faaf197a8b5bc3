//! Subcommand implementations.

pub mod devices;
pub mod filter;

use anyhow::{Result, bail};
use vfx_cl::Backend;

/// Resolve the requested backend, falling back to the build default.
pub fn resolve_backend(requested: Option<crate::BackendArg>) -> Result<Backend> {
    let backend = requested.map(Backend::from).unwrap_or_default();
    if backend == Backend::OpenCl && !cfg!(feature = "opencl") {
        bail!("opencl backend not compiled in (rebuild with --features opencl)");
    }
    Ok(backend)
}
