use std::sync::{Arc, Mutex};

use clmm_runtime::{
    device::{DeviceProperties, PlatformProperties},
    error::{BuildFailure, DriverError},
    AccessMode, ArgValue, ContextOptions, ProgramImage, Runtime,
};

use super::{DummyState, DUMMY_DEVICE_NAME, DUMMY_ENTRY_POINTS, DUMMY_IMAGE_MAGIC};

const INVALID_VALUE: i32 = -30;
const INVALID_ARG_INDEX: i32 = -49;
const INVALID_BINARY: i32 = -42;
const INVALID_KERNEL_NAME: i32 = -46;
const BUILD_PROGRAM_FAILURE: i32 = -11;
const OUT_OF_RESOURCES: i32 = -5;
const OUT_OF_HOST_MEMORY: i32 = -6;
const PLATFORM_NOT_FOUND: i32 = -1001;

/// Runtime executing `simpleMultiply` on the host, used to test the pipeline without a device.
#[derive(Debug)]
pub struct DummyRuntime;

pub struct DummyPlatform {
    name: String,
    devices: usize,
    state: Arc<DummyState>,
}

#[derive(Clone)]
pub struct DummyDevice {
    state: Arc<DummyState>,
}

pub struct DummyContext {
    state: Arc<DummyState>,
}

pub struct DummyQueue {
    pending: Mutex<Vec<Launch>>,
    state: Arc<DummyState>,
}

pub struct DummyProgram {
    built: bool,
    state: Arc<DummyState>,
}

pub struct DummyKernel {
    args: Mutex<Vec<Option<Arg>>>,
    state: Arc<DummyState>,
}

pub struct DummyBuffer {
    data: Arc<Mutex<Vec<f32>>>,
    state: Arc<DummyState>,
}

#[derive(Clone)]
enum Arg {
    Buffer(Arc<Mutex<Vec<f32>>>),
    Int(i32),
}

struct Launch {
    args: Vec<Arg>,
    global: [usize; 2],
}

macro_rules! release_on_drop {
    ($ty:ty, $name:literal) => {
        impl Drop for $ty {
            fn drop(&mut self) {
                self.state.record_release($name);
            }
        }
    };
}

release_on_drop!(DummyContext, "context");
release_on_drop!(DummyQueue, "queue");
release_on_drop!(DummyProgram, "program");
release_on_drop!(DummyKernel, "kernel");
release_on_drop!(DummyBuffer, "buffer");

impl Launch {
    fn int(&self, slot: usize) -> Result<usize, DriverError> {
        match self.args.get(slot) {
            Some(Arg::Int(value)) => Ok(*value as usize),
            _ => Err(DriverError::new(INVALID_VALUE, format!("slot {slot}"))),
        }
    }

    fn buffer(&self, slot: usize) -> Result<Arc<Mutex<Vec<f32>>>, DriverError> {
        match self.args.get(slot) {
            Some(Arg::Buffer(data)) => Ok(data.clone()),
            _ => Err(DriverError::new(INVALID_VALUE, format!("slot {slot}"))),
        }
    }

    // D[row, col] = sum(A[row, i] * B[i, col]) + C[row, col]
    fn run(&self) -> Result<(), DriverError> {
        let (width_a, width_b) = (self.int(1)?, self.int(3)?);
        let a = self.buffer(5)?.lock().unwrap().clone();
        let b = self.buffer(6)?.lock().unwrap().clone();
        let c = self.buffer(7)?.lock().unwrap().clone();
        let output = self.buffer(0)?;
        let mut d = output.lock().unwrap();

        for row in 0..self.global[1] {
            for col in 0..self.global[0] {
                let mut sum = 0.0;
                for i in 0..width_a {
                    sum += a[row * width_a + i] * b[i * width_b + col];
                }
                d[row * width_b + col] = sum + c[row * width_b + col];
            }
        }

        Ok(())
    }
}

impl Runtime for DummyRuntime {
    type Platform = DummyPlatform;
    type Device = DummyDevice;
    type Context = DummyContext;
    type Queue = DummyQueue;
    type Program = DummyProgram;
    type Kernel = DummyKernel;
    type Buffer = DummyBuffer;

    fn name() -> &'static str {
        "dummy"
    }

    fn platforms() -> Result<Vec<Self::Platform>, DriverError> {
        let state = DummyState::installed()
            .ok_or_else(|| DriverError::new(PLATFORM_NOT_FOUND, "get platform ids".into()))?;

        Ok(state
            .platforms
            .iter()
            .map(|(name, devices)| DummyPlatform {
                name: name.clone(),
                devices: *devices,
                state: state.clone(),
            })
            .collect())
    }

    fn platform_properties(platform: &Self::Platform) -> Result<PlatformProperties, DriverError> {
        Ok(PlatformProperties {
            name: platform.name.clone(),
            vendor: "clmm".into(),
            version: "OpenCL 1.0 dummy".into(),
        })
    }

    fn devices(platform: &Self::Platform) -> Result<Vec<Self::Device>, DriverError> {
        Ok((0..platform.devices)
            .map(|_| DummyDevice {
                state: platform.state.clone(),
            })
            .collect())
    }

    fn device_properties(device: &Self::Device) -> Result<DeviceProperties, DriverError> {
        let faults = device.state.faults();
        if faults.device_properties {
            return Err(DriverError::new(OUT_OF_RESOURCES, "get device info".into()));
        }

        Ok(DeviceProperties {
            name: DUMMY_DEVICE_NAME.into(),
            vendor: "clmm".into(),
            available: true,
            little_endian: true,
            max_mem_alloc_size: faults.max_alloc,
            max_work_group_size: faults.max_work_group_size,
            max_work_item_dimensions: 3,
            queue_profiling: true,
            ..Default::default()
        })
    }

    fn create_context(device: &Self::Device) -> Result<Self::Context, DriverError> {
        if device.state.faults().context {
            return Err(DriverError::new(OUT_OF_HOST_MEMORY, "create context".into()));
        }

        Ok(DummyContext {
            state: device.state.clone(),
        })
    }

    fn create_queue(
        context: &Self::Context,
        _device: &Self::Device,
        options: &ContextOptions,
    ) -> Result<Self::Queue, DriverError> {
        if context.state.faults().queue {
            return Err(DriverError::new(OUT_OF_HOST_MEMORY, "create command queue".into()));
        }
        *context.state.profiling.lock().unwrap() = Some(options.profiling);

        Ok(DummyQueue {
            pending: Mutex::new(Vec::new()),
            state: context.state.clone(),
        })
    }

    fn load_program(
        context: &Self::Context,
        _device: &Self::Device,
        image: &ProgramImage,
    ) -> Result<Self::Program, DriverError> {
        if !image.binary.starts_with(DUMMY_IMAGE_MAGIC) {
            return Err(DriverError::new(INVALID_BINARY, "create program with binary".into()));
        }

        Ok(DummyProgram {
            built: false,
            state: context.state.clone(),
        })
    }

    fn build_program(
        program: &mut Self::Program,
        _device: &Self::Device,
        _options: &str,
    ) -> Result<(), BuildFailure> {
        if program.state.faults().build {
            return Err(BuildFailure::new(
                BUILD_PROGRAM_FAILURE,
                "error: undefined reference to 'simpleMultiply'".into(),
            ));
        }
        program.built = true;

        Ok(())
    }

    fn create_kernel(
        program: &Self::Program,
        entry_point: &str,
    ) -> Result<Self::Kernel, DriverError> {
        if !program.built || !DUMMY_ENTRY_POINTS.contains(&entry_point) {
            return Err(DriverError::new(
                INVALID_KERNEL_NAME,
                format!("create kernel '{entry_point}'"),
            ));
        }

        Ok(DummyKernel {
            args: Mutex::new(vec![None; 8]),
            state: program.state.clone(),
        })
    }

    fn create_buffer(
        context: &Self::Context,
        _mode: AccessMode,
        size: usize,
    ) -> Result<Self::Buffer, DriverError> {
        Ok(DummyBuffer {
            data: Arc::new(Mutex::new(vec![0.0; size / core::mem::size_of::<f32>()])),
            state: context.state.clone(),
        })
    }

    fn write_buffer(
        _queue: &Self::Queue,
        buffer: &mut Self::Buffer,
        data: &[f32],
    ) -> Result<(), DriverError> {
        let mut target = buffer.data.lock().unwrap();
        if target.len() != data.len() {
            return Err(DriverError::new(INVALID_VALUE, "write buffer".into()));
        }
        target.copy_from_slice(data);

        Ok(())
    }

    fn read_buffer(
        queue: &Self::Queue,
        buffer: &Self::Buffer,
        destination: &mut [f32],
    ) -> Result<(), DriverError> {
        if queue.state.faults().readback {
            return Err(DriverError::new(OUT_OF_RESOURCES, "read buffer".into()));
        }

        let source = buffer.data.lock().unwrap();
        if source.len() != destination.len() {
            return Err(DriverError::new(INVALID_VALUE, "read buffer".into()));
        }
        destination.copy_from_slice(&source);

        Ok(())
    }

    fn set_arg(
        kernel: &Self::Kernel,
        slot: u32,
        value: ArgValue<'_, Self::Buffer>,
    ) -> Result<(), DriverError> {
        let mut args = kernel.args.lock().unwrap();
        let entry = args
            .get_mut(slot as usize)
            .ok_or_else(|| DriverError::new(INVALID_ARG_INDEX, format!("set arg {slot}")))?;

        *entry = Some(match value {
            ArgValue::Buffer(buffer) => Arg::Buffer(buffer.data.clone()),
            ArgValue::Int(value) => Arg::Int(value),
        });

        Ok(())
    }

    fn enqueue_kernel(
        queue: &Self::Queue,
        kernel: &Self::Kernel,
        global: [usize; 2],
        _local: [usize; 2],
    ) -> Result<(), DriverError> {
        let args = kernel
            .args
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DriverError::new(INVALID_VALUE, "kernel args not set".into()))?;

        queue.pending.lock().unwrap().push(Launch { args, global });
        queue.state.record_launch();

        Ok(())
    }

    fn finish(queue: &Self::Queue) -> Result<(), DriverError> {
        let pending = core::mem::take(&mut *queue.pending.lock().unwrap());

        if !pending.is_empty() && queue.state.faults().execution {
            return Err(DriverError::new(OUT_OF_RESOURCES, "finish".into()));
        }

        for launch in pending {
            launch.run()?;
        }

        Ok(())
    }
}
