//! Devices command
//!
//! Lists compiled-in backends and the platform vendors a backend reports.

use anyhow::Result;
use tracing::trace;

use vfx_cl::{Driver, HostDriver, describe_backends, describe_platforms};

use crate::DevicesArgs;

fn list<D: Driver>(driver: &D) -> Result<()> {
    let vendors = describe_platforms(driver)?;
    println!("Platforms ({}):", driver.name());
    if vendors.is_empty() {
        println!("  (none)");
    }
    for (i, vendor) in vendors.iter().enumerate() {
        println!("  [{}] {}", i, vendor);
    }
    Ok(())
}

pub fn run(args: DevicesArgs) -> Result<()> {
    trace!("devices::run");
    print!("{}", describe_backends());

    match super::resolve_backend(args.backend)? {
        #[cfg(feature = "opencl")]
        vfx_cl::Backend::OpenCl => list(&vfx_cl::OpenClDriver::new()),
        _ => list(&HostDriver::new()),
    }
}
