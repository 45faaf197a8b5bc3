//! Device selection by platform vendor.

use tracing::{debug, info};

use crate::config::DEVICE_COUNT;
use crate::driver::Driver;
use crate::error::status;
use crate::{ClError, ClResult};

/// Pick the first device of the first platform whose vendor contains
/// `vendor` (case-sensitive).
///
/// Platforms are visited in runtime order and every vendor string is
/// logged. No device handle is created for platforms that do not match.
pub fn select_device<D: Driver>(driver: &D, vendor: &str) -> ClResult<D::Device> {
    let platforms = driver.platforms()?;
    if platforms.is_empty() {
        return Err(ClError::Enumeration { status: status::PLATFORM_NOT_FOUND });
    }

    for platform in &platforms {
        let name = driver.platform_vendor(platform)?;
        info!("Platform vendor: {}", name);
        if !name.contains(vendor) {
            continue;
        }

        let device = driver
            .devices(platform, DEVICE_COUNT)?
            .into_iter()
            .next()
            .ok_or(ClError::Enumeration { status: status::DEVICE_NOT_FOUND })?;
        debug!(driver = driver.name(), platform = %name, "selected device");
        return Ok(device);
    }

    Err(ClError::NoMatchingPlatform { vendor: vendor.to_string() })
}

/// Vendor strings of all platforms, in runtime order.
pub fn describe_platforms<D: Driver>(driver: &D) -> ClResult<Vec<String>> {
    driver
        .platforms()?
        .iter()
        .map(|p| driver.platform_vendor(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{HostDriver, Resource};

    #[test]
    fn test_first_match_wins() {
        let driver = HostDriver::empty()
            .with_platform("Intel(R) Corporation", 1)
            .with_platform("NVIDIA Corporation", 2)
            .with_platform("NVIDIA Second", 1);
        let device = select_device(&driver, "NVIDIA").unwrap();
        assert_eq!(device.index(), 0);
        assert_eq!(driver.journal().created(), vec![Resource::Device]);
    }

    #[test]
    fn test_case_sensitive() {
        let driver = HostDriver::with_vendors(["nvidia corp"]);
        let err = select_device(&driver, "NVIDIA").unwrap_err();
        assert_eq!(err, ClError::NoMatchingPlatform { vendor: "NVIDIA".into() });
        assert!(driver.journal().created().is_empty());
    }

    #[test]
    fn test_no_platforms() {
        let err = select_device(&HostDriver::empty(), "NVIDIA").unwrap_err();
        assert_eq!(err, ClError::Enumeration { status: status::PLATFORM_NOT_FOUND });
    }

    #[test]
    fn test_describe_platforms() {
        let driver = HostDriver::with_vendors(["A", "B"]);
        assert_eq!(describe_platforms(&driver).unwrap(), vec!["A", "B"]);
    }
}
