//! Filter command
//!
//! Raw 8-bit grayscale in, raw 8-bit grayscale out.

use anyhow::{Context, Result, ensure};
use std::fs;
use std::path::Path;
use tracing::{info, trace};

use vfx_cl::{Backend, Driver, EdgeFilter, FilterConfig, HostDriver};

use crate::FilterArgs;

/// Build the effective config: file (or defaults), then flag overrides.
pub fn load_config(args: &FilterArgs, backend: Backend) -> Result<FilterConfig> {
    let base = FilterConfig::default().with_vendor(backend.default_vendor());
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            FilterConfig::from_yaml_over(&text, base)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => base,
    };
    if let Some(vendor) = &args.vendor {
        config.vendor = vendor.clone();
    }
    if let Some(transfer) = args.transfer {
        config.transfer = transfer.into();
    }
    Ok(config)
}

fn read_input(path: &Path, width: u32, height: u32) -> Result<Vec<u8>> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let expected = width as usize * height as usize;
    ensure!(
        data.len() == expected,
        "{} holds {} bytes, expected {}x{} = {}",
        path.display(),
        data.len(),
        width,
        height,
        expected
    );
    Ok(data)
}

fn apply<D: Driver>(driver: D, config: FilterConfig, input: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut output = vec![0u8; input.len()];
    EdgeFilter::new(driver, config).apply(input, &mut output, width, height)?;
    Ok(output)
}

pub fn run(args: FilterArgs) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "filter::run");

    let backend = super::resolve_backend(args.backend)?;
    let config = load_config(&args, backend)?;
    let input = read_input(&args.input, args.width, args.height)?;

    info!(
        backend = backend.name(),
        transfer = config.transfer.name(),
        vendor = %config.vendor,
        w = args.width,
        h = args.height,
        "Filtering"
    );

    let output = match backend {
        #[cfg(feature = "opencl")]
        Backend::OpenCl => apply(vfx_cl::OpenClDriver::new(), config, &input, args.width, args.height)?,
        _ => apply(HostDriver::new(), config, &input, args.width, args.height)?,
    };

    fs::write(&args.output, &output).with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(output = %args.output.display(), "Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackendArg, TransferArg};
    use std::path::PathBuf;
    use vfx_cl::config::HOST_VENDOR;
    use vfx_cl::{ClError, TransferMode};

    fn args(dir: &Path) -> FilterArgs {
        FilterArgs {
            input: dir.join("in.raw"),
            output: dir.join("out.raw"),
            width: 6,
            height: 5,
            transfer: None,
            backend: Some(BackendArg::Host),
            vendor: None,
            config: None,
        }
    }

    #[test]
    fn test_config_file_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.yaml");
        fs::write(&path, "vendor: Intel\ntransfer: clamped-image\nbuild_options: -cl-fast-relaxed-math\n").unwrap();

        let mut a = args(dir.path());
        a.config = Some(path);
        let cfg = load_config(&a, Backend::Host).unwrap();
        assert_eq!(cfg.vendor, "Intel");
        assert_eq!(cfg.transfer, TransferMode::ClampedImage);
        assert_eq!(cfg.build_options, "-cl-fast-relaxed-math");

        a.vendor = Some("Acme".into());
        a.transfer = Some(TransferArg::Linear);
        let cfg = load_config(&a, Backend::Host).unwrap();
        assert_eq!(cfg.vendor, "Acme");
        assert_eq!(cfg.transfer, TransferMode::LinearBuffer);
    }

    #[test]
    fn test_default_vendor_follows_backend() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&args(dir.path()), Backend::Host).unwrap();
        assert_eq!(cfg.vendor, HOST_VENDOR);
    }

    #[test]
    fn test_config_without_vendor_uses_backend_vendor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.yaml");
        fs::write(&path, "transfer: clamped-image\n").unwrap();

        let mut a = args(dir.path());
        a.config = Some(path);
        let cfg = load_config(&a, Backend::Host).unwrap();
        assert_eq!(cfg.vendor, HOST_VENDOR);
        assert_eq!(cfg.transfer, TransferMode::ClampedImage);

        fs::write(&a.input, vec![80u8; 30]).unwrap();
        run(a).unwrap();
    }

    #[test]
    fn test_config_typo_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.yaml");
        fs::write(&path, "vendr: Intel\n").unwrap();

        let mut a = args(dir.path());
        a.config = Some(path);
        let err = load_config(&a, Backend::Host).unwrap_err();
        assert!(format!("{:#}", err).contains("vendr"));
    }

    #[test]
    fn test_filter_roundtrip_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = args(dir.path());
        fs::write(&a.input, vec![50u8; 30]).unwrap();
        let out_path: PathBuf = a.output.clone();

        run(a).unwrap();
        let out = fs::read(out_path).unwrap();
        assert_eq!(out.len(), 30);
        assert_eq!(out[6 + 1], 255);
        assert_eq!(out[0], 50);
    }

    #[test]
    fn test_input_size_checked() {
        let dir = tempfile::tempdir().unwrap();
        let a = args(dir.path());
        fs::write(&a.input, vec![0u8; 29]).unwrap();
        let err = run(a).unwrap_err();
        assert!(err.to_string().contains("expected 6x5 = 30"));
    }

    #[test]
    fn test_pipeline_error_downcasts() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(dir.path());
        a.vendor = Some("NVIDIA".into());
        fs::write(&a.input, vec![0u8; 30]).unwrap();

        let err = run(a).unwrap_err();
        let cl = err.downcast_ref::<ClError>().unwrap();
        assert_eq!(cl.stage(), "select_device");
        assert_eq!(cl.exit_code(), vfx_cl::error::status::PLATFORM_NOT_FOUND);
    }
}
