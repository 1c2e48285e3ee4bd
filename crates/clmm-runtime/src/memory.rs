use hashbrown::HashMap;

use crate::{
    context::ExecutionContext,
    error::{AllocationError, PipelineError, ReadbackError},
    matrix::{Matrix, MatrixShape},
    runtime::Runtime,
};

/// How the compute unit accesses a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// The compute unit only reads the buffer. Filled by the host before launch.
    ReadOnly,
    /// The compute unit only writes the buffer. Read back by the host after completion.
    WriteOnly,
}

impl core::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AccessMode::ReadOnly => f.write_str("read-only"),
            AccessMode::WriteOnly => f.write_str("write-only"),
        }
    }
}

/// Reference to a device buffer owned by a [BufferManager].
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    /// Identifier unique within its manager.
    pub id: u64,
    /// Shape of the matrix stored in the buffer.
    pub shape: MatrixShape,
    /// Declared access mode.
    pub mode: AccessMode,
}

struct ManagedBuffer<R: Runtime> {
    buffer: R::Buffer,
    handle: BufferHandle,
}

/// Owns every device buffer of a dispatch.
///
/// Buffers are sized to one matrix, populated at most once and never resized. Dropping the
/// manager releases whatever is still allocated.
pub struct BufferManager<R: Runtime> {
    buffers: HashMap<u64, ManagedBuffer<R>>,
    next_id: u64,
}

impl<R: Runtime> Default for BufferManager<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Runtime> core::fmt::Debug for BufferManager<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut handles: Vec<_> = self.buffers.values().map(|b| b.handle).collect();
        handles.sort_by_key(|handle| handle.id);

        f.debug_struct("BufferManager")
            .field("buffers", &handles)
            .finish()
    }
}

impl<R: Runtime> BufferManager<R> {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            buffers: HashMap::new(),
            next_id: 0,
        }
    }

    /// Allocate a buffer for a matrix of the given shape, without transfer.
    pub fn allocate(
        &mut self,
        context: &ExecutionContext<R>,
        shape: MatrixShape,
        mode: AccessMode,
    ) -> Result<BufferHandle, PipelineError> {
        let buffer = self.create(context, shape, mode)?;
        Ok(self.register(buffer, shape, mode))
    }

    /// Allocate a buffer for the matrix.
    ///
    /// [AccessMode::ReadOnly] buffers are filled with a blocking write of the whole matrix
    /// before returning. [AccessMode::WriteOnly] buffers are left uninitialized.
    pub fn upload(
        &mut self,
        context: &ExecutionContext<R>,
        matrix: &Matrix,
        mode: AccessMode,
    ) -> Result<BufferHandle, PipelineError> {
        let shape = matrix.shape();
        let mut buffer = self.create(context, shape, mode)?;

        if let AccessMode::ReadOnly = mode {
            let queue = context.queue("upload a matrix")?;
            R::write_buffer(queue, &mut buffer, matrix.data()).map_err(|source| {
                AllocationError::Driver {
                    size: matrix.as_bytes().len() as u64,
                    mode,
                    source,
                }
            })?;
        }

        Ok(self.register(buffer, shape, mode))
    }

    /// Copy the buffer into `destination` once every queued operation has completed.
    pub fn download(
        &self,
        context: &ExecutionContext<R>,
        handle: BufferHandle,
        destination: &mut Matrix,
    ) -> Result<(), PipelineError> {
        let managed = self
            .buffers
            .get(&handle.id)
            .ok_or(ReadbackError::UnknownBuffer)?;

        if managed.handle.shape != destination.shape() {
            return Err(ReadbackError::ShapeMismatch {
                buffer: managed.handle.shape,
                destination: destination.shape(),
            }
            .into());
        }

        let queue = context.queue("read back a buffer")?;
        R::finish(queue).map_err(ReadbackError::from)?;
        R::read_buffer(queue, &managed.buffer, destination.data_mut())
            .map_err(ReadbackError::from)?;

        log::debug!(
            "Read back buffer {} ({} bytes)",
            handle.id,
            destination.as_bytes().len()
        );

        Ok(())
    }

    /// The device buffer behind a handle, if it is still allocated.
    pub fn resource(&self, handle: &BufferHandle) -> Option<&R::Buffer> {
        self.buffers
            .get(&handle.id)
            .filter(|managed| managed.handle == *handle)
            .map(|managed| &managed.buffer)
    }

    /// Release one buffer. Returns false if it was not allocated.
    pub fn free(&mut self, handle: BufferHandle) -> bool {
        let freed = self.buffers.remove(&handle.id).is_some();
        if freed {
            log::debug!("Released buffer {}", handle.id);
        }
        freed
    }

    /// Release every buffer.
    pub fn release_all(&mut self) {
        let mut ids: Vec<_> = self.buffers.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            self.buffers.remove(&id);
        }
    }

    /// Number of allocated buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether no buffer is allocated.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    fn create(
        &self,
        context: &ExecutionContext<R>,
        shape: MatrixShape,
        mode: AccessMode,
    ) -> Result<R::Buffer, PipelineError> {
        if shape.is_empty() {
            return Err(AllocationError::Empty { mode }.into());
        }

        let size = shape
            .size_in_bytes()
            .ok_or(AllocationError::Overflow { shape })?;

        if let Some(properties) = context.properties() {
            let max = properties.max_mem_alloc_size;
            if size > max {
                return Err(AllocationError::TooLarge { size, max }.into());
            }
        }

        let driver_context = context.context("allocate a buffer")?;
        let buffer = R::create_buffer(driver_context, mode, size as usize)
            .map_err(|source| AllocationError::Driver { size, mode, source })?;

        log::debug!("Allocated a {mode} buffer of {size} bytes for a {shape} matrix");

        Ok(buffer)
    }

    fn register(
        &mut self,
        buffer: R::Buffer,
        shape: MatrixShape,
        mode: AccessMode,
    ) -> BufferHandle {
        let handle = BufferHandle::new(self.next_id, shape, mode);
        self.next_id += 1;
        self.buffers.insert(handle.id, ManagedBuffer { buffer, handle });
        handle
    }
}
