#![warn(missing_docs)]

//! Host-side dispatch pipeline that runs a precompiled matrix multiply compute unit on an
//! accelerator device and brings the result back to host memory.

#[macro_use]
extern crate derive_new;

mod validation;

/// Result collection module.
pub mod collector;
/// Configuration module.
pub mod config;
/// Execution context module.
pub mod context;
/// Device location module.
pub mod device;
/// Kernel dispatch module.
pub mod dispatch;
/// Error module.
pub mod error;
/// Kernel signature module.
pub mod kernel;
/// Logging module.
pub mod logging;
/// Host matrix module.
pub mod matrix;
/// Device memory module.
pub mod memory;
/// Pipeline orchestration module.
pub mod pipeline;
/// Program image module.
pub mod program;
/// Runtime module.
pub mod runtime;

pub use collector::ResultCollector;
pub use config::GlobalConfig;
pub use context::{ContextOptions, ExecutionContext};
pub use device::{
    DeviceLocator, DeviceProperties, DeviceSelection, LocatedDevice, PlatformProperties,
    VectorWidths,
};
pub use dispatch::{Dispatcher, WorkDescriptor, WorkSize};
pub use error::{PipelineError, Stage};
pub use kernel::{KernelArg, KernelSignature, MatmulArgs, MATRIX_MULTI_SIGNATURE};
pub use logging::PipelineLogger;
pub use matrix::{Matrix, MatrixShape};
pub use memory::{AccessMode, BufferHandle, BufferManager};
pub use pipeline::{MatmulInputs, MatmulOutput, MatmulPipeline, MatmulProblem};
pub use program::ProgramImage;
pub use runtime::{ArgValue, Runtime};
