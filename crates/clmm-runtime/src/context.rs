use crate::{
    config::GlobalConfig,
    device::DeviceProperties,
    error::{PipelineError, ProgramLoadError},
    program::ProgramImage,
    runtime::Runtime,
};

/// Settings used when opening an [ExecutionContext].
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// Whether the command queue records profiling information.
    pub profiling: bool,
    /// Options passed to the driver when building the program.
    pub build_options: String,
    /// Name of the compute unit to resolve.
    pub entry_point: String,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self::from_config(&GlobalConfig::default())
    }
}

impl ContextOptions {
    /// Options from the program and dispatch configuration.
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            profiling: config.dispatch.profiling,
            build_options: config.program.build_options.clone(),
            entry_point: config.program.entry_point.clone(),
        }
    }
}

/// Everything bound to one device for the duration of a dispatch: the driver context, an
/// in-order command queue, the built program and its compute unit.
///
/// Handles are released in reverse creation order by [close](ExecutionContext::close), which
/// also runs on drop.
pub struct ExecutionContext<R: Runtime> {
    device: R::Device,
    properties: Option<DeviceProperties>,
    context: Option<R::Context>,
    queue: Option<R::Queue>,
    program: Option<R::Program>,
    kernel: Option<R::Kernel>,
    entry_point: String,
}

impl<R: Runtime> core::fmt::Debug for ExecutionContext<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("runtime", &R::name())
            .field("device", &self.properties.as_ref().map(|p| p.name.as_str()))
            .field("entry_point", &self.entry_point)
            .field("open", &self.is_open())
            .finish()
    }
}

impl<R: Runtime> ExecutionContext<R> {
    /// Create the context, the command queue, the program and the compute unit for `device`.
    ///
    /// On failure, whatever was already created is released before returning.
    pub fn open(
        device: R::Device,
        image: &ProgramImage,
        options: &ContextOptions,
    ) -> Result<Self, PipelineError> {
        let properties = match R::device_properties(&device) {
            Ok(properties) => Some(properties),
            Err(err) => {
                log::warn!("Can't query the device properties, limits won't be checked: {err}");
                None
            }
        };

        let mut this = Self {
            device,
            properties,
            context: None,
            queue: None,
            program: None,
            kernel: None,
            entry_point: options.entry_point.clone(),
        };

        let context = this
            .context
            .insert(R::create_context(&this.device).map_err(PipelineError::ContextCreation)?);

        this.queue = Some(
            R::create_queue(context, &this.device, options)
                .map_err(PipelineError::ContextCreation)?,
        );

        let program = this.program.insert(
            R::load_program(context, &this.device, image).map_err(|source| {
                ProgramLoadError::Rejected {
                    path: image.path.clone(),
                    source,
                }
            })?,
        );

        R::build_program(program, &this.device, &options.build_options)?;

        this.kernel = Some(
            R::create_kernel(program, &options.entry_point).map_err(|source| {
                PipelineError::EntryPointNotFound {
                    name: options.entry_point.clone(),
                    source,
                }
            })?,
        );

        log::debug!(
            "Opened an execution context for '{}' from '{}'",
            options.entry_point,
            image.path.display()
        );

        Ok(this)
    }

    /// Release the compute unit, the program, the queue and the context, in that order.
    ///
    /// Calling it again does nothing.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }

        drop(self.kernel.take());
        drop(self.program.take());
        drop(self.queue.take());
        drop(self.context.take());

        log::debug!("Closed the execution context for '{}'", self.entry_point);
    }

    /// Whether the context still holds driver resources.
    pub fn is_open(&self) -> bool {
        self.context.is_some()
    }

    /// The device properties, if they could be queried.
    pub fn properties(&self) -> Option<&DeviceProperties> {
        self.properties.as_ref()
    }

    /// Name of the resolved compute unit.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// The driver context.
    pub fn context(&self, operation: &'static str) -> Result<&R::Context, PipelineError> {
        self.context
            .as_ref()
            .ok_or(PipelineError::ContextClosed { operation })
    }

    /// The command queue.
    pub fn queue(&self, operation: &'static str) -> Result<&R::Queue, PipelineError> {
        self.queue
            .as_ref()
            .ok_or(PipelineError::ContextClosed { operation })
    }

    /// The compute unit.
    pub fn kernel(&self, operation: &'static str) -> Result<&R::Kernel, PipelineError> {
        self.kernel
            .as_ref()
            .ok_or(PipelineError::ContextClosed { operation })
    }
}

impl<R: Runtime> Drop for ExecutionContext<R> {
    fn drop(&mut self) {
        self.close();
    }
}
