pub use clmm_runtime::*;

#[cfg(feature = "opencl")]
pub use clmm_opencl as opencl;
