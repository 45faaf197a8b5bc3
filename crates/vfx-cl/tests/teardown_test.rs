//! Resource ownership and failure-path tests.

use vfx_cl::config::HOST_VENDOR;
use vfx_cl::driver::{Fault, Resource};
use vfx_cl::error::status;
use vfx_cl::{ClError, EdgeFilter, FilterConfig, HostDriver, TransferMode};

use Resource::{Context, Device, Kernel, Memory, Program, Queue};

fn filter(driver: HostDriver, mode: TransferMode) -> EdgeFilter<HostDriver> {
    EdgeFilter::new(driver, FilterConfig::default().with_vendor(HOST_VENDOR).with_transfer(mode))
}

#[test]
fn test_teardown_order() {
    for mode in [TransferMode::LinearBuffer, TransferMode::ClampedImage] {
        let filter = filter(HostDriver::new(), mode);
        let input = vec![90u8; 64];
        let mut out = vec![0u8; 64];
        filter.apply(&input, &mut out, 8, 8).unwrap();

        let journal = filter.driver().journal();
        assert_eq!(journal.created(), vec![Device, Context, Queue, Memory, Memory, Program, Kernel]);
        assert_eq!(journal.released(), vec![Kernel, Program, Memory, Memory, Queue, Context, Device]);
    }
}

#[test]
fn test_failures_release_everything() {
    let cases = [
        (Fault::Platforms, "select_device"),
        (Fault::Devices, "select_device"),
        (Fault::Context, "create_context"),
        (Fault::Queue, "create_context"),
        (Fault::Allocation, "allocate"),
        (Fault::Build, "build"),
        (Fault::ArgBind, "run"),
        (Fault::Enqueue, "run"),
        (Fault::Flush, "run"),
        (Fault::Finish, "run"),
        (Fault::Readback, "download"),
    ];

    for mode in [TransferMode::LinearBuffer, TransferMode::ClampedImage] {
        for (fault, stage) in cases {
            let filter = filter(HostDriver::new().with_fault(fault), mode);
            let input = vec![0u8; 25];
            let mut out = vec![7u8; 25];

            let err = filter.apply(&input, &mut out, 5, 5).unwrap_err();
            assert_eq!(err.stage(), stage, "{:?} {:?}", mode, fault);
            assert_ne!(err.status(), status::SUCCESS);
            assert_eq!(filter.driver().journal().live(), 0, "{:?} {:?} leaked", mode, fault);
            assert_eq!(out, vec![7u8; 25], "{:?} {:?} wrote partial output", mode, fault);
        }
    }
}

#[test]
fn test_build_failure_release_order() {
    let filter = filter(HostDriver::new().with_fault(Fault::Build), TransferMode::LinearBuffer);
    let mut out = vec![0u8; 9];
    let err = filter.apply(&[0u8; 9], &mut out, 3, 3).unwrap_err();

    assert!(matches!(err, ClError::Build { status: status::BUILD_PROGRAM_FAILURE, .. }));
    assert_eq!(
        filter.driver().journal().released(),
        vec![Memory, Memory, Queue, Context, Device]
    );
}

#[test]
fn test_flush_failure() {
    let filter = filter(HostDriver::new().with_fault(Fault::Flush), TransferMode::ClampedImage);
    let mut out = vec![0u8; 16];
    let err = filter.apply(&[0u8; 16], &mut out, 4, 4).unwrap_err();
    assert_eq!(err, ClError::Enqueue { status: status::INVALID_COMMAND_QUEUE });
    assert_eq!(
        filter.driver().journal().released(),
        vec![Kernel, Program, Memory, Memory, Queue, Context, Device]
    );
}

#[test]
fn test_upload_failure() {
    let filter = filter(HostDriver::new().with_fault(Fault::Upload), TransferMode::LinearBuffer);
    let mut out = vec![0u8; 9];
    let err = filter.apply(&[0u8; 9], &mut out, 3, 3).unwrap_err();
    assert_eq!(err, ClError::Upload { status: status::OUT_OF_RESOURCES });
    assert_eq!(filter.driver().journal().live(), 0);
}

#[test]
fn test_image_upload_folded_into_allocation() {
    // No host->device copy is issued for surfaces
    let filter = filter(HostDriver::new().with_fault(Fault::Upload), TransferMode::ClampedImage);
    let mut out = vec![0u8; 9];
    assert!(filter.apply(&[128u8; 9], &mut out, 3, 3).is_ok());
}

#[test]
fn test_exit_code_is_status() {
    let filter = filter(HostDriver::new().with_fault(Fault::Allocation), TransferMode::LinearBuffer);
    let mut out = vec![0u8; 9];
    let err = filter.apply(&[0u8; 9], &mut out, 3, 3).unwrap_err();
    assert_eq!(err.exit_code(), status::MEM_OBJECT_ALLOCATION_FAILURE);
}
