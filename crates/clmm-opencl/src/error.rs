use clmm_runtime::error::DriverError;
use opencl3::error_codes::ClError;

/// Attach what the driver was asked to do to an OpenCL status.
pub(crate) fn driver_error(reason: &'static str) -> impl FnOnce(ClError) -> DriverError {
    move |err| DriverError::new(err.0, format!("{reason}: {err}"))
}
