use std::ptr;

use clmm_runtime::{
    device::{DeviceProperties, PlatformProperties},
    error::{BuildFailure, DriverError},
    AccessMode, ArgValue, ContextOptions, ProgramImage, Runtime,
};
use opencl3::{
    command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE},
    context::Context,
    device::{Device, CL_DEVICE_TYPE_ALL},
    kernel::Kernel,
    memory::{Buffer, ClMem, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY},
    platform::{get_platforms, Platform},
    program::Program,
    types::{cl_float, CL_BLOCKING},
};

use crate::{
    device::{self, OpenClDevice},
    error::driver_error,
};

/// Runtime on an OpenCL platform.
#[derive(Debug)]
pub struct OpenClRuntime;

impl Runtime for OpenClRuntime {
    type Platform = Platform;
    type Device = OpenClDevice;
    type Context = Context;
    type Queue = CommandQueue;
    type Program = Program;
    type Kernel = Kernel;
    type Buffer = Buffer<cl_float>;

    fn name() -> &'static str {
        "opencl"
    }

    fn platforms() -> Result<Vec<Self::Platform>, DriverError> {
        get_platforms().map_err(driver_error("get platform ids"))
    }

    fn platform_properties(platform: &Self::Platform) -> Result<PlatformProperties, DriverError> {
        device::platform_properties(platform)
    }

    fn devices(platform: &Self::Platform) -> Result<Vec<Self::Device>, DriverError> {
        let ids = platform
            .get_devices(CL_DEVICE_TYPE_ALL)
            .map_err(driver_error("get device ids"))?;

        Ok(ids
            .into_iter()
            .map(|id| OpenClDevice::new(Device::new(id)))
            .collect())
    }

    fn device_properties(device: &Self::Device) -> Result<DeviceProperties, DriverError> {
        device::device_properties(&device.device)
    }

    fn create_context(device: &Self::Device) -> Result<Self::Context, DriverError> {
        Context::from_device(&device.device).map_err(driver_error("create context"))
    }

    // FPGA platforms only implement the OpenCL 1.x entry point.
    #[allow(deprecated)]
    fn create_queue(
        context: &Self::Context,
        _device: &Self::Device,
        options: &ContextOptions,
    ) -> Result<Self::Queue, DriverError> {
        let properties = if options.profiling {
            CL_QUEUE_PROFILING_ENABLE
        } else {
            0
        };

        CommandQueue::create_default(context, properties)
            .map_err(driver_error("create command queue"))
    }

    fn load_program(
        context: &Self::Context,
        device: &Self::Device,
        image: &ProgramImage,
    ) -> Result<Self::Program, DriverError> {
        let binaries = [image.binary.as_slice()];

        unsafe { Program::create_from_binary(context, &[device.device.id()], &binaries) }
            .map_err(driver_error("create program with binary"))
    }

    fn build_program(
        program: &mut Self::Program,
        device: &Self::Device,
        options: &str,
    ) -> Result<(), BuildFailure> {
        let id = device.device.id();

        program.build(&[id], options).map_err(|err| {
            let log = program
                .get_build_log(id)
                .unwrap_or_else(|log_err| format!("<build log unavailable: {log_err}>"));
            BuildFailure::new(err.0, log)
        })
    }

    fn create_kernel(
        program: &Self::Program,
        entry_point: &str,
    ) -> Result<Self::Kernel, DriverError> {
        Kernel::create(program, entry_point).map_err(driver_error("create kernel"))
    }

    fn create_buffer(
        context: &Self::Context,
        mode: AccessMode,
        size: usize,
    ) -> Result<Self::Buffer, DriverError> {
        let flags = match mode {
            AccessMode::ReadOnly => CL_MEM_READ_ONLY,
            AccessMode::WriteOnly => CL_MEM_WRITE_ONLY,
        };
        let count = size / core::mem::size_of::<cl_float>();

        unsafe { Buffer::<cl_float>::create(context, flags, count, ptr::null_mut()) }
            .map_err(driver_error("create buffer"))
    }

    fn write_buffer(
        queue: &Self::Queue,
        buffer: &mut Self::Buffer,
        data: &[f32],
    ) -> Result<(), DriverError> {
        unsafe { queue.enqueue_write_buffer(buffer, CL_BLOCKING, 0, data, &[]) }
            .map(|_event| ())
            .map_err(driver_error("write buffer"))
    }

    fn read_buffer(
        queue: &Self::Queue,
        buffer: &Self::Buffer,
        destination: &mut [f32],
    ) -> Result<(), DriverError> {
        unsafe { queue.enqueue_read_buffer(buffer, CL_BLOCKING, 0, destination, &[]) }
            .map(|_event| ())
            .map_err(driver_error("read buffer"))
    }

    fn set_arg(
        kernel: &Self::Kernel,
        slot: u32,
        value: ArgValue<'_, Self::Buffer>,
    ) -> Result<(), DriverError> {
        let result = match value {
            ArgValue::Buffer(buffer) => unsafe { kernel.set_arg(slot, &buffer.get()) },
            ArgValue::Int(value) => unsafe { kernel.set_arg(slot, &value) },
        };

        result.map_err(driver_error("set kernel arg"))
    }

    fn enqueue_kernel(
        queue: &Self::Queue,
        kernel: &Self::Kernel,
        global: [usize; 2],
        local: [usize; 2],
    ) -> Result<(), DriverError> {
        unsafe {
            queue.enqueue_nd_range_kernel(
                kernel.get(),
                2,
                ptr::null(),
                global.as_ptr(),
                local.as_ptr(),
                &[],
            )
        }
        .map(|_event| ())
        .map_err(driver_error("enqueue kernel"))
    }

    fn finish(queue: &Self::Queue) -> Result<(), DriverError> {
        queue.finish().map_err(driver_error("finish"))
    }
}
