use crate::{
    error::ArgumentBindError,
    matrix::MatrixShape,
    memory::{AccessMode, BufferHandle},
};

/// The declared kind of a kernel argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// A device buffer with the given access mode.
    Buffer(AccessMode),
    /// A 32-bit signed integer.
    Int,
}

impl core::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SlotKind::Buffer(mode) => write!(f, "a {mode} buffer"),
            SlotKind::Int => f.write_str("a 32-bit integer"),
        }
    }
}

/// The kind of a given kernel argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A device buffer.
    Buffer,
    /// An integer scalar.
    Scalar,
}

impl core::fmt::Display for ArgKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ArgKind::Buffer => f.write_str("a buffer"),
            ArgKind::Scalar => f.write_str("a scalar"),
        }
    }
}

/// One positional argument slot of a compute unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// The slot name.
    pub name: &'static str,
    /// The declared kind.
    pub kind: SlotKind,
}

/// The ordered argument slots of a compute unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelSignature {
    /// The compute unit the signature describes.
    pub entry_point: &'static str,
    /// The slots, in positional order.
    pub slots: &'static [Slot],
}

impl KernelSignature {
    /// Number of slots.
    pub fn arity(&self) -> usize {
        self.slots.len()
    }
}

/// Signature of `simpleMultiply`.
pub const MATRIX_MULTI_SIGNATURE: KernelSignature = KernelSignature {
    entry_point: "simpleMultiply",
    slots: &[
        Slot {
            name: "output_d",
            kind: SlotKind::Buffer(AccessMode::WriteOnly),
        },
        Slot {
            name: "width_a",
            kind: SlotKind::Int,
        },
        Slot {
            name: "height_a",
            kind: SlotKind::Int,
        },
        Slot {
            name: "width_b",
            kind: SlotKind::Int,
        },
        Slot {
            name: "height_b",
            kind: SlotKind::Int,
        },
        Slot {
            name: "input_a",
            kind: SlotKind::Buffer(AccessMode::ReadOnly),
        },
        Slot {
            name: "input_b",
            kind: SlotKind::Buffer(AccessMode::ReadOnly),
        },
        Slot {
            name: "input_c",
            kind: SlotKind::Buffer(AccessMode::ReadOnly),
        },
    ],
};

/// A kernel argument before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelArg {
    /// A buffer owned by the buffer manager.
    Buffer(BufferHandle),
    /// An integer, converted to 32 bits when bound.
    Scalar(usize),
}

impl KernelArg {
    /// The kind of the argument.
    pub fn kind(&self) -> ArgKind {
        match self {
            KernelArg::Buffer(_) => ArgKind::Buffer,
            KernelArg::Scalar(_) => ArgKind::Scalar,
        }
    }
}

/// Named operands of `simpleMultiply`, computing `D = A * B + C`.
#[derive(new, Debug, Clone, Copy)]
pub struct MatmulArgs {
    /// Output matrix D.
    pub output: BufferHandle,
    /// Left operand A.
    pub lhs: BufferHandle,
    /// Right operand B.
    pub rhs: BufferHandle,
    /// Addend C.
    pub addend: BufferHandle,
}

impl MatmulArgs {
    /// Ordered arguments of [MATRIX_MULTI_SIGNATURE], after checking the operand shapes chain.
    pub fn to_args(&self) -> Result<[KernelArg; 8], ArgumentBindError> {
        let a = self.lhs.shape;
        let b = self.rhs.shape;

        if a.width != b.height {
            return Err(ArgumentBindError::ShapeMismatch {
                name: "input_b",
                expected: MatrixShape::new(b.width, a.width),
                got: b,
            });
        }

        let out = MatrixShape::new(b.width, a.height);
        for (name, handle) in [("input_c", &self.addend), ("output_d", &self.output)] {
            if handle.shape != out {
                return Err(ArgumentBindError::ShapeMismatch {
                    name,
                    expected: out,
                    got: handle.shape,
                });
            }
        }

        Ok([
            KernelArg::Buffer(self.output),
            KernelArg::Scalar(a.width),
            KernelArg::Scalar(a.height),
            KernelArg::Scalar(b.width),
            KernelArg::Scalar(b.height),
            KernelArg::Buffer(self.lhs),
            KernelArg::Buffer(self.rhs),
            KernelArg::Buffer(self.addend),
        ])
    }
}
