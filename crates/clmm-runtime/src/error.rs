use std::path::PathBuf;

use thiserror::Error;

use crate::{
    dispatch::WorkSize,
    kernel::{ArgKind, SlotKind},
    matrix::{MatrixShape, ShapeError},
    memory::AccessMode,
};

/// A failure reported by the device driver, with its raw status code.
#[derive(new, Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} (status {status})")]
pub struct DriverError {
    /// The status code returned by the driver.
    pub status: i32,
    /// What the driver was asked to do.
    pub reason: String,
}

/// A program build rejected by the driver.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    /// The status code returned by the driver.
    pub status: i32,
    /// The compiler/linker diagnostics for the device.
    pub log: String,
}

/// The stage of the pipeline where an error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Platform and device selection.
    PlatformSelection,
    /// Context and command queue creation.
    ContextCreation,
    /// Program image loading.
    ProgramLoad,
    /// Program build.
    Build,
    /// Entry point resolution.
    EntryPoint,
    /// Device buffer allocation and upload.
    Allocation,
    /// Kernel argument binding.
    ArgumentBinding,
    /// Work descriptor validation.
    WorkSize,
    /// Kernel execution.
    Execution,
    /// Result readback.
    Readback,
    /// Pipeline inputs or lifecycle misuse.
    Setup,
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Stage::PlatformSelection => "platform selection",
            Stage::ContextCreation => "context creation",
            Stage::ProgramLoad => "program load",
            Stage::Build => "program build",
            Stage::EntryPoint => "entry point lookup",
            Stage::Allocation => "buffer allocation",
            Stage::ArgumentBinding => "argument binding",
            Stage::WorkSize => "work size validation",
            Stage::Execution => "kernel execution",
            Stage::Readback => "readback",
            Stage::Setup => "setup",
        };
        f.write_str(name)
    }
}

/// Platform and device selection errors.
#[derive(Error, Debug, Clone)]
pub enum PlatformSelectionError {
    /// No platform name contains the target.
    #[error("No platform matching '{target}' was found\nAvailable platforms: {available:?}")]
    NoPlatformFound {
        /// The searched substring.
        target: String,
        /// The names of every platform that was enumerated.
        available: Vec<String>,
    },
    /// The selected platform has no device.
    #[error("Platform '{platform}' reports no devices")]
    NoDeviceFound {
        /// The selected platform name.
        platform: String,
    },
    /// The driver failed while enumerating.
    #[error("The driver failed during enumeration\nCaused by:\n  {0}")]
    Driver(#[from] DriverError),
}

/// Program image errors.
#[derive(Error, Debug, Clone)]
pub enum ProgramLoadError {
    /// No candidate file exists.
    #[error("No program image found\nSearched: {searched:?}")]
    NotFound {
        /// Every path that was checked.
        searched: Vec<PathBuf>,
    },
    /// The file exists but can't be read.
    #[error("Can't read program image '{path}'\nCaused by:\n  {reason}")]
    Io {
        /// The image path.
        path: PathBuf,
        /// The io error message.
        reason: String,
    },
    /// The driver refused the binary for the selected device.
    #[error("Program image '{path}' was rejected by the device\nCaused by:\n  {source}")]
    Rejected {
        /// The image path.
        path: PathBuf,
        /// The driver error.
        source: DriverError,
    },
}

/// Device buffer allocation errors.
#[derive(Error, Debug, Clone)]
pub enum AllocationError {
    /// Zero sized buffers are invalid.
    #[error("Can't allocate an empty {mode} buffer")]
    Empty {
        /// The requested access mode.
        mode: AccessMode,
    },
    /// The byte size doesn't fit in memory.
    #[error("Buffer size overflows for a matrix of shape {shape}")]
    Overflow {
        /// The matrix shape.
        shape: MatrixShape,
    },
    /// Buffer size exceeds the max allocation of the device.
    #[error("Can't allocate buffer of size {size} bytes, the device maximum is {max} bytes")]
    TooLarge {
        /// The requested size in bytes.
        size: u64,
        /// The device maximum allocation in bytes.
        max: u64,
    },
    /// The driver failed to create or fill the buffer.
    #[error("Can't allocate {size} bytes for a {mode} buffer\nCaused by:\n  {source}")]
    Driver {
        /// The requested size in bytes.
        size: u64,
        /// The requested access mode.
        mode: AccessMode,
        /// The driver error.
        source: DriverError,
    },
}

/// Kernel argument binding errors.
#[derive(Error, Debug, Clone)]
pub enum ArgumentBindError {
    /// The signature describes another compute unit than the one resolved by the context.
    #[error("Signature of '{signature}' can't be bound to entry point '{entry_point}'")]
    SignatureMismatch {
        /// The compute unit described by the signature.
        signature: &'static str,
        /// The compute unit resolved by the context.
        entry_point: String,
    },
    /// Wrong number of arguments.
    #[error("Entry point '{entry_point}' takes {expected} arguments, {got} were given")]
    Arity {
        /// The entry point name.
        entry_point: &'static str,
        /// The number of declared slots.
        expected: usize,
        /// The number of given arguments.
        got: usize,
    },
    /// The argument kind doesn't match the slot.
    #[error("Slot {slot} ('{name}') expects {expected}, got {got}")]
    KindMismatch {
        /// The slot index.
        slot: u32,
        /// The slot name.
        name: &'static str,
        /// The declared kind.
        expected: SlotKind,
        /// The given kind.
        got: ArgKind,
    },
    /// The buffer access mode doesn't match the slot.
    #[error("Slot {slot} ('{name}') expects a {expected} buffer, got a {got} buffer")]
    AccessMismatch {
        /// The slot index.
        slot: u32,
        /// The slot name.
        name: &'static str,
        /// The declared access mode.
        expected: AccessMode,
        /// The access mode of the given buffer.
        got: AccessMode,
    },
    /// The buffer isn't owned by the buffer manager.
    #[error("Slot {slot} ('{name}') references a buffer that was freed or never allocated")]
    UnknownBuffer {
        /// The slot index.
        slot: u32,
        /// The slot name.
        name: &'static str,
    },
    /// The scalar doesn't fit in a 32-bit integer.
    #[error("Slot {slot} ('{name}') value {value} doesn't fit in a 32-bit integer")]
    ScalarOverflow {
        /// The slot index.
        slot: u32,
        /// The slot name.
        name: &'static str,
        /// The given value.
        value: usize,
    },
    /// Operand shapes don't chain.
    #[error("Operand '{name}' has shape {got}, expected {expected}")]
    ShapeMismatch {
        /// The operand name.
        name: &'static str,
        /// The expected shape.
        expected: MatrixShape,
        /// The given shape.
        got: MatrixShape,
    },
    /// A slot was never bound before launch.
    #[error("Slot {slot} ('{name}') is not bound")]
    Unbound {
        /// The slot index.
        slot: u32,
        /// The slot name.
        name: &'static str,
    },
    /// The driver rejected the argument.
    #[error("The driver rejected slot {slot} ('{name}')\nCaused by:\n  {source}")]
    Driver {
        /// The slot index.
        slot: u32,
        /// The slot name.
        name: &'static str,
        /// The driver error.
        source: DriverError,
    },
}

/// Work descriptor errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkSizeError {
    /// An extent has a zero dimension.
    #[error("Work extents must be non-zero, got global {global} and local {local}")]
    Empty {
        /// The global extent.
        global: WorkSize,
        /// The local extent.
        local: WorkSize,
    },
    /// The global extent isn't a multiple of the local extent.
    #[error("Global extent {global} is not divisible by local extent {local}")]
    NotDivisible {
        /// The global extent.
        global: WorkSize,
        /// The local extent.
        local: WorkSize,
    },
    /// The work group is bigger than the device allows.
    #[error("Work group of {requested} units exceeds the device maximum of {max} units")]
    TooManyUnits {
        /// The requested units per work group.
        requested: usize,
        /// The device maximum.
        max: usize,
    },
}

/// Result readback errors.
#[derive(Error, Debug, Clone)]
pub enum ReadbackError {
    /// The destination can't hold the buffer.
    #[error("Destination has shape {destination}, the buffer holds {buffer}")]
    ShapeMismatch {
        /// The buffer shape.
        buffer: MatrixShape,
        /// The destination shape.
        destination: MatrixShape,
    },
    /// The buffer isn't owned by the buffer manager.
    #[error("The buffer was freed or never allocated")]
    UnknownBuffer,
    /// The transfer failed.
    #[error("The transfer failed\nCaused by:\n  {0}")]
    Driver(#[from] DriverError),
}

/// Any error of the dispatch pipeline. All of them are fatal.
#[derive(Error, Clone)]
pub enum PipelineError {
    /// No matching platform or device.
    #[error("Platform selection failed\nCaused by:\n  {0}")]
    PlatformSelection(#[from] PlatformSelectionError),

    /// The driver refused to create the context or its command queue.
    #[error("Context creation failed\nCaused by:\n  {0}")]
    ContextCreation(DriverError),

    /// The program image is absent or incompatible.
    #[error("Program load failed\nCaused by:\n  {0}")]
    ProgramLoad(#[from] ProgramLoadError),

    /// The program didn't build for the device.
    #[error("Program build failed (status {status})\nBuild log:\n{log}")]
    Build {
        /// The driver status.
        status: i32,
        /// The build log.
        log: String,
    },

    /// The program doesn't expose the entry point.
    #[error("Entry point '{name}' not found in program\nCaused by:\n  {source}")]
    EntryPointNotFound {
        /// The entry point name.
        name: String,
        /// The driver error.
        source: DriverError,
    },

    /// A device buffer couldn't be allocated.
    #[error("Buffer allocation failed\nCaused by:\n  {0}")]
    Allocation(#[from] AllocationError),

    /// A kernel argument couldn't be bound.
    #[error("Argument binding failed\nCaused by:\n  {0}")]
    ArgumentBind(#[from] ArgumentBindError),

    /// The work descriptor is invalid.
    #[error("Invalid work size\nCaused by:\n  {0}")]
    InvalidWorkSize(#[from] WorkSizeError),

    /// The device reported a fault while running queued work.
    #[error("Execution failed\nCaused by:\n  {0}")]
    Execution(DriverError),

    /// The output couldn't be copied back.
    #[error("Readback failed\nCaused by:\n  {0}")]
    Readback(#[from] ReadbackError),

    /// The execution context was already released.
    #[error("Can't {operation}, the execution context is closed")]
    ContextClosed {
        /// The attempted operation.
        operation: &'static str,
    },

    /// The problem or its inputs are malformed.
    #[error("Invalid problem\nCaused by:\n  {0}")]
    InvalidProblem(#[from] ShapeError),
}

impl core::fmt::Debug for PipelineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}

impl PipelineError {
    /// The stage where the error happened.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::PlatformSelection(_) => Stage::PlatformSelection,
            PipelineError::ContextCreation(_) => Stage::ContextCreation,
            PipelineError::ProgramLoad(_) => Stage::ProgramLoad,
            PipelineError::Build { .. } => Stage::Build,
            PipelineError::EntryPointNotFound { .. } => Stage::EntryPoint,
            PipelineError::Allocation(_) => Stage::Allocation,
            PipelineError::ArgumentBind(_) => Stage::ArgumentBinding,
            PipelineError::InvalidWorkSize(_) => Stage::WorkSize,
            PipelineError::Execution(_) => Stage::Execution,
            PipelineError::Readback(_) => Stage::Readback,
            PipelineError::ContextClosed { .. } | PipelineError::InvalidProblem(_) => Stage::Setup,
        }
    }

    /// The status code reported by the driver, if the driver caused the error.
    pub fn status(&self) -> Option<i32> {
        match self {
            PipelineError::PlatformSelection(PlatformSelectionError::Driver(err))
            | PipelineError::ContextCreation(err)
            | PipelineError::ProgramLoad(ProgramLoadError::Rejected { source: err, .. })
            | PipelineError::EntryPointNotFound { source: err, .. }
            | PipelineError::Allocation(AllocationError::Driver { source: err, .. })
            | PipelineError::ArgumentBind(ArgumentBindError::Driver { source: err, .. })
            | PipelineError::Execution(err)
            | PipelineError::Readback(ReadbackError::Driver(err)) => Some(err.status),
            PipelineError::Build { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<BuildFailure> for PipelineError {
    fn from(value: BuildFailure) -> Self {
        PipelineError::Build {
            status: value.status,
            log: value.log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn status_is_extracted_from_nested_driver_errors() {
        let err = PipelineError::from(ReadbackError::Driver(DriverError::new(
            -5,
            "read buffer".into(),
        )));

        assert_eq!(err.stage(), Stage::Readback);
        assert_eq!(err.status(), Some(-5));
    }

    #[test_log::test]
    fn validation_errors_have_no_status() {
        let err = PipelineError::from(WorkSizeError::NotDivisible {
            global: WorkSize::new_2d(3, 4),
            local: WorkSize::new_2d(2, 2),
        });

        assert_eq!(err.stage(), Stage::WorkSize);
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("(3, 4)"));
    }

    #[test_log::test]
    fn build_failure_keeps_the_log() {
        let err = PipelineError::from(BuildFailure::new(-11, "undefined symbol".into()));

        assert_eq!(err.stage(), Stage::Build);
        assert_eq!(err.status(), Some(-11));
        assert!(format!("{err:?}").contains("undefined symbol"));
    }
}
