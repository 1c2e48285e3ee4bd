use crate::{
    context::ContextOptions,
    device::{DeviceProperties, PlatformProperties},
    error::{BuildFailure, DriverError},
    memory::AccessMode,
    program::ProgramImage,
};

/// A value bound to one kernel argument slot.
#[derive(Debug)]
pub enum ArgValue<'a, B> {
    /// A device buffer.
    Buffer(&'a B),
    /// A 32-bit signed integer.
    Int(i32),
}

/// Driver backend of the dispatch pipeline.
///
/// Every handle type releases its driver resource when dropped, so ownership decides when
/// a resource goes away. The pipeline components never call the driver directly, only
/// through this trait, which keeps them testable with an in-memory runtime.
pub trait Runtime: Sized + 'static {
    /// A driver platform.
    type Platform;
    /// A compute device of a platform.
    type Device: Clone;
    /// A context bound to one device.
    type Context;
    /// An in-order command queue.
    type Queue;
    /// A program loaded from a precompiled image.
    type Program;
    /// A resolved compute unit entry point.
    type Kernel;
    /// A device buffer of `f32`.
    type Buffer;

    /// The runtime name.
    fn name() -> &'static str;

    /// Enumerate the available platforms.
    fn platforms() -> Result<Vec<Self::Platform>, DriverError>;

    /// Describe a platform.
    fn platform_properties(platform: &Self::Platform) -> Result<PlatformProperties, DriverError>;

    /// Enumerate every device of a platform, whatever its type.
    fn devices(platform: &Self::Platform) -> Result<Vec<Self::Device>, DriverError>;

    /// Describe a device.
    fn device_properties(device: &Self::Device) -> Result<DeviceProperties, DriverError>;

    /// Create a context bound to exactly one device.
    fn create_context(device: &Self::Device) -> Result<Self::Context, DriverError>;

    /// Create an in-order command queue.
    fn create_queue(
        context: &Self::Context,
        device: &Self::Device,
        options: &ContextOptions,
    ) -> Result<Self::Queue, DriverError>;

    /// Load a precompiled program image for the device.
    fn load_program(
        context: &Self::Context,
        device: &Self::Device,
        image: &ProgramImage,
    ) -> Result<Self::Program, DriverError>;

    /// Build the loaded program for the device.
    fn build_program(
        program: &mut Self::Program,
        device: &Self::Device,
        options: &str,
    ) -> Result<(), BuildFailure>;

    /// Resolve a named entry point of a built program.
    fn create_kernel(program: &Self::Program, entry_point: &str)
        -> Result<Self::Kernel, DriverError>;

    /// Allocate `size` bytes of device memory without transfer.
    fn create_buffer(
        context: &Self::Context,
        mode: AccessMode,
        size: usize,
    ) -> Result<Self::Buffer, DriverError>;

    /// Blocking copy of `data` into the buffer.
    fn write_buffer(
        queue: &Self::Queue,
        buffer: &mut Self::Buffer,
        data: &[f32],
    ) -> Result<(), DriverError>;

    /// Blocking copy of the buffer into `destination`.
    fn read_buffer(
        queue: &Self::Queue,
        buffer: &Self::Buffer,
        destination: &mut [f32],
    ) -> Result<(), DriverError>;

    /// Bind `value` to argument `slot` of the kernel.
    fn set_arg(
        kernel: &Self::Kernel,
        slot: u32,
        value: ArgValue<'_, Self::Buffer>,
    ) -> Result<(), DriverError>;

    /// Submit one 2-D kernel invocation. Doesn't wait for its completion.
    fn enqueue_kernel(
        queue: &Self::Queue,
        kernel: &Self::Kernel,
        global: [usize; 2],
        local: [usize; 2],
    ) -> Result<(), DriverError>;

    /// Block until every operation submitted to the queue has completed.
    fn finish(queue: &Self::Queue) -> Result<(), DriverError>;
}
