use crate::{
    context::ExecutionContext,
    error::{ArgumentBindError, PipelineError},
    kernel::{KernelArg, KernelSignature, SlotKind},
    matrix::MatrixShape,
    memory::BufferManager,
    runtime::{ArgValue, Runtime},
    validation::validate_work,
};

/// A 2-D extent of work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct WorkSize {
    /// Extent along the first dimension (columns).
    pub x: usize,
    /// Extent along the second dimension (rows).
    pub y: usize,
}

impl WorkSize {
    /// Create a 2-D extent.
    pub const fn new_2d(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Total number of work items, saturating on overflow.
    pub fn num_elems(&self) -> usize {
        self.x.saturating_mul(self.y)
    }

    /// The extent as a driver dimension array.
    pub fn to_array(&self) -> [usize; 2] {
        [self.x, self.y]
    }
}

impl core::fmt::Display for WorkSize {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Global and local extents of one kernel invocation.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkDescriptor {
    /// Total work items, one per output element.
    pub global: WorkSize,
    /// Work group shape.
    pub local: WorkSize,
}

impl WorkDescriptor {
    /// One work item per element of the output, `x` along the columns.
    pub fn for_output(shape: MatrixShape, local: WorkSize) -> Self {
        Self::new(WorkSize::new_2d(shape.width, shape.height), local)
    }
}

/// Binds arguments to the compute unit and submits it.
pub struct Dispatcher<'a, R: Runtime> {
    context: &'a ExecutionContext<R>,
    signature: KernelSignature,
    bound: Vec<bool>,
}

impl<'a, R: Runtime> Dispatcher<'a, R> {
    /// Create a dispatcher for the compute unit of the context.
    pub fn new(context: &'a ExecutionContext<R>, signature: KernelSignature) -> Self {
        Self {
            context,
            bound: vec![false; signature.arity()],
            signature,
        }
    }

    /// Bind every argument to its slot, checking them against the signature first.
    ///
    /// Nothing is bound if the signature describes another compute unit than the one resolved
    /// by the context, or if one argument doesn't match its slot.
    pub fn bind(
        &mut self,
        buffers: &BufferManager<R>,
        args: &[KernelArg],
    ) -> Result<(), PipelineError> {
        let entry_point = self.context.entry_point();
        if entry_point != self.signature.entry_point {
            return Err(ArgumentBindError::SignatureMismatch {
                signature: self.signature.entry_point,
                entry_point: entry_point.to_string(),
            }
            .into());
        }

        if args.len() != self.signature.arity() {
            return Err(ArgumentBindError::Arity {
                entry_point: self.signature.entry_point,
                expected: self.signature.arity(),
                got: args.len(),
            }
            .into());
        }

        let mut values = Vec::with_capacity(args.len());
        for (index, (arg, slot)) in args.iter().zip(self.signature.slots).enumerate() {
            let slot_index = index as u32;

            let value = match (slot.kind, arg) {
                (SlotKind::Buffer(expected), KernelArg::Buffer(handle)) => {
                    if handle.mode != expected {
                        return Err(ArgumentBindError::AccessMismatch {
                            slot: slot_index,
                            name: slot.name,
                            expected,
                            got: handle.mode,
                        }
                        .into());
                    }
                    let buffer =
                        buffers
                            .resource(handle)
                            .ok_or(ArgumentBindError::UnknownBuffer {
                                slot: slot_index,
                                name: slot.name,
                            })?;
                    ArgValue::Buffer(buffer)
                }
                (SlotKind::Int, KernelArg::Scalar(value)) => {
                    let value =
                        i32::try_from(*value).map_err(|_| ArgumentBindError::ScalarOverflow {
                            slot: slot_index,
                            name: slot.name,
                            value: *value,
                        })?;
                    ArgValue::Int(value)
                }
                (expected, arg) => {
                    return Err(ArgumentBindError::KindMismatch {
                        slot: slot_index,
                        name: slot.name,
                        expected,
                        got: arg.kind(),
                    }
                    .into());
                }
            };
            values.push(value);
        }

        let kernel = self.context.kernel("bind kernel arguments")?;
        for (index, value) in values.into_iter().enumerate() {
            let slot = &self.signature.slots[index];
            R::set_arg(kernel, index as u32, value).map_err(|source| {
                ArgumentBindError::Driver {
                    slot: index as u32,
                    name: slot.name,
                    source,
                }
            })?;
            self.bound[index] = true;
        }

        Ok(())
    }

    /// Submit one invocation of the compute unit. Doesn't wait for its completion.
    ///
    /// The work descriptor is validated before anything is submitted, and every slot must be
    /// bound.
    pub fn launch(&self, work: &WorkDescriptor) -> Result<(), PipelineError> {
        validate_work(work, self.context.properties())?;

        if let Some(index) = self.bound.iter().position(|bound| !bound) {
            return Err(ArgumentBindError::Unbound {
                slot: index as u32,
                name: self.signature.slots[index].name,
            }
            .into());
        }

        let queue = self.context.queue("launch the kernel")?;
        let kernel = self.context.kernel("launch the kernel")?;

        R::enqueue_kernel(queue, kernel, work.global.to_array(), work.local.to_array())
            .map_err(PipelineError::Execution)?;

        log::debug!(
            "Submitted '{}' with global {} and local {}",
            self.signature.entry_point,
            work.global,
            work.local
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn output_drives_the_global_extent() {
        let work = WorkDescriptor::for_output(MatrixShape::new(600, 200), WorkSize::new_2d(2, 2));

        assert_eq!(work.global, WorkSize::new_2d(600, 200));
        assert_eq!(work.global.to_array(), [600, 200]);
        assert_eq!(work.local.num_elems(), 4);
    }

    #[test_log::test]
    fn work_size_display() {
        assert_eq!(WorkSize::new_2d(3, 4).to_string(), "(3, 4)");
    }
}
