//! Filter configuration and dispatch constants.

use serde::Deserialize;

use crate::{ClError, ClResult};

/// Vendor substring matched against platform vendor strings.
pub const DEFAULT_VENDOR: &str = "NVIDIA";

/// Vendor string reported by the host driver's default platform.
pub const HOST_VENDOR: &str = "vfx-cl host";

/// Number of devices requested from the matched platform.
pub const DEVICE_COUNT: usize = 1;

/// Dispatch batching unit. Carried as a tunable; the filter kernels do not
/// use an explicit local size.
pub const WORK_GROUP_SIZE: usize = 512;

/// Smallest width or height the 3x3 stencil is defined for.
pub const MIN_DIMENSION: u32 = 3;

/// Device memory layout used for input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferMode {
    /// Flat `width*height` byte buffers, explicit border test in the kernel.
    #[default]
    LinearBuffer,
    /// 2D normalized surfaces sampled with clamp-to-edge addressing.
    ClampedImage,
}

impl TransferMode {
    /// Get human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LinearBuffer => "linear-buffer",
            Self::ClampedImage => "clamped-image",
        }
    }
}

/// Edge filter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Case-sensitive substring a platform vendor must contain.
    pub vendor: String,
    /// Memory transfer strategy.
    pub transfer: TransferMode,
    /// Options passed to the kernel compiler.
    pub build_options: String,
    /// Emit the kernel build log at debug level after every build.
    pub log_build_output: bool,
    /// Dispatch batching unit (see [`WORK_GROUP_SIZE`]).
    pub work_group_size: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            vendor: DEFAULT_VENDOR.to_string(),
            transfer: TransferMode::default(),
            build_options: String::new(),
            log_build_output: cfg!(debug_assertions),
            work_group_size: WORK_GROUP_SIZE,
        }
    }
}

impl FilterConfig {
    /// Config with a specific vendor substring.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Config with a specific transfer strategy.
    pub fn with_transfer(mut self, transfer: TransferMode) -> Self {
        self.transfer = transfer;
        self
    }

    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        Self::from_yaml_over(text, Self::default())
    }

    /// Parse a YAML document over `base`. Missing keys keep the value from
    /// `base`; unknown keys are rejected.
    pub fn from_yaml_over(text: &str, base: Self) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(base);
        }
        let file: ConfigFile = serde_yaml::from_str(text)?;
        Ok(file.merge(base))
    }
}

/// On-disk config layer: every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    vendor: Option<String>,
    transfer: Option<TransferMode>,
    build_options: Option<String>,
    log_build_output: Option<bool>,
    work_group_size: Option<usize>,
}

impl ConfigFile {
    fn merge(self, base: FilterConfig) -> FilterConfig {
        FilterConfig {
            vendor: self.vendor.unwrap_or(base.vendor),
            transfer: self.transfer.unwrap_or(base.transfer),
            build_options: self.build_options.unwrap_or(base.build_options),
            log_build_output: self.log_build_output.unwrap_or(base.log_build_output),
            work_group_size: self.work_group_size.unwrap_or(base.work_group_size),
        }
    }
}

/// Check caller-supplied image buffers against the stated dimensions.
pub(crate) fn validate(input: &[u8], output: &[u8], width: u32, height: u32) -> ClResult<usize> {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(ClError::InvalidDimensions(width, height));
    }
    let expected = (width as usize)
        .checked_mul(height as usize)
        .ok_or(ClError::InvalidDimensions(width, height))?;
    if input.len() != expected {
        return Err(ClError::BufferSizeMismatch { expected, actual: input.len() });
    }
    if output.len() != expected {
        return Err(ClError::BufferSizeMismatch { expected, actual: output.len() });
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = FilterConfig::default();
        assert_eq!(cfg.vendor, "NVIDIA");
        assert_eq!(cfg.transfer, TransferMode::LinearBuffer);
        assert_eq!(cfg.work_group_size, 512);
    }

    #[test]
    fn test_yaml_partial() {
        let cfg = FilterConfig::from_yaml("vendor: Intel\ntransfer: clamped-image\n").unwrap();
        assert_eq!(cfg.vendor, "Intel");
        assert_eq!(cfg.transfer, TransferMode::ClampedImage);
        assert_eq!(cfg.work_group_size, WORK_GROUP_SIZE);
        assert!(cfg.build_options.is_empty());
    }

    #[test]
    fn test_yaml_unknown_transfer() {
        assert!(FilterConfig::from_yaml("transfer: texture").is_err());
    }

    #[test]
    fn test_yaml_over_base_keeps_vendor() {
        let base = FilterConfig::default().with_vendor(HOST_VENDOR);
        let cfg = FilterConfig::from_yaml_over("transfer: clamped-image\n", base).unwrap();
        assert_eq!(cfg.vendor, HOST_VENDOR);
        assert_eq!(cfg.transfer, TransferMode::ClampedImage);

        let cfg = FilterConfig::from_yaml_over("vendor: AMD\n", FilterConfig::default().with_vendor(HOST_VENDOR)).unwrap();
        assert_eq!(cfg.vendor, "AMD");
    }

    #[test]
    fn test_yaml_unknown_key_rejected() {
        let err = FilterConfig::from_yaml("vendr: Intel\n").unwrap_err();
        assert!(err.to_string().contains("vendr"));
    }

    #[test]
    fn test_yaml_empty_document() {
        assert_eq!(FilterConfig::from_yaml("").unwrap(), FilterConfig::default());
    }

    #[test]
    fn test_validate() {
        let img = vec![0u8; 12];
        let out = vec![0u8; 12];
        assert_eq!(validate(&img, &out, 4, 3).unwrap(), 12);
        assert_eq!(validate(&img, &out, 2, 6), Err(ClError::InvalidDimensions(2, 6)));
        assert_eq!(
            validate(&img, &out[..10], 4, 3),
            Err(ClError::BufferSizeMismatch { expected: 12, actual: 10 })
        );
    }
}
