//! OpenCL runtime of the clmm dispatch pipeline, built on the `opencl3` crate.

#[macro_use]
extern crate derive_new;

mod device;
mod error;
mod runtime;

pub use device::*;
pub use runtime::*;

/// Reference source of the `simpleMultiply` compute unit.
///
/// The host only loads precompiled images; this is what they are built from.
pub const MATRIX_MULTI_SOURCE: &str = include_str!("../kernels/matrix_multi.cl");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_defines_the_entry_point() {
        assert!(MATRIX_MULTI_SOURCE.contains("__kernel void simpleMultiply("));
    }
}
