use crate::{
    context::ExecutionContext,
    error::PipelineError,
    matrix::Matrix,
    memory::{BufferHandle, BufferManager},
    runtime::Runtime,
};

/// Waits for the submitted work and brings results back to the host.
#[derive(new)]
pub struct ResultCollector<'a, R: Runtime> {
    context: &'a ExecutionContext<R>,
}

impl<R: Runtime> ResultCollector<'_, R> {
    /// Block until every queued operation has completed.
    pub fn wait(&self) -> Result<(), PipelineError> {
        let queue = self.context.queue("wait for the kernel")?;
        R::finish(queue).map_err(PipelineError::Execution)
    }

    /// Copy the output buffer into `destination`.
    pub fn collect(
        &self,
        buffers: &BufferManager<R>,
        handle: BufferHandle,
        destination: &mut Matrix,
    ) -> Result<(), PipelineError> {
        buffers.download(self.context, handle, destination)
    }
}
