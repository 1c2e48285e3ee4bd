use std::{
    cell::RefCell,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

/// Name of the emulator platform the pipeline searches by default.
pub const EMULATOR_PLATFORM: &str = "Intel(R) FPGA Emulation Platform for OpenCL(TM)";

/// Name of the device exposed by every dummy platform.
pub const DUMMY_DEVICE_NAME: &str = "dummy_board : Dummy accelerator (dummy0)";

/// Images whose binary starts with this magic are accepted by the dummy driver.
pub const DUMMY_IMAGE_MAGIC: &[u8] = b"DUMMY";

/// Compute units found in every dummy image. Only `simpleMultiply` runs.
pub const DUMMY_ENTRY_POINTS: &[&str] = &["simpleMultiply", "transposeCopy"];

thread_local! {
    static DRIVER: RefCell<Option<Arc<DummyState>>> = const { RefCell::new(None) };
}

/// Failures injected in the dummy driver.
#[derive(Debug, Clone)]
pub struct Faults {
    pub context: bool,
    pub queue: bool,
    pub build: bool,
    pub execution: bool,
    pub readback: bool,
    pub device_properties: bool,
    pub max_alloc: u64,
    pub max_work_group_size: usize,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            context: false,
            queue: false,
            build: false,
            execution: false,
            readback: false,
            device_properties: false,
            max_alloc: 1 << 30,
            max_work_group_size: 256,
        }
    }
}

/// State of the dummy driver, shared by every handle it creates.
#[derive(Debug)]
pub struct DummyState {
    pub platforms: Vec<(String, usize)>,
    faults: Mutex<Faults>,
    releases: Mutex<Vec<&'static str>>,
    launches: AtomicUsize,
    pub profiling: Mutex<Option<bool>>,
}

impl DummyState {
    /// A driver with the given platforms and their device count.
    pub fn new(platforms: &[(&str, usize)]) -> Self {
        Self {
            platforms: platforms
                .iter()
                .map(|(name, devices)| (name.to_string(), *devices))
                .collect(),
            faults: Mutex::new(Faults::default()),
            releases: Mutex::new(Vec::new()),
            launches: AtomicUsize::new(0),
            profiling: Mutex::new(None),
        }
    }

    /// A driver exposing one emulator device.
    pub fn emulator() -> Self {
        Self::new(&[("NVIDIA CUDA", 1), (EMULATOR_PLATFORM, 1)])
    }

    /// Install the driver for the current test thread.
    pub fn install(self) -> Arc<Self> {
        let state = Arc::new(self);
        DRIVER.with(|driver| *driver.borrow_mut() = Some(state.clone()));
        state
    }

    /// The driver installed for the current test thread.
    pub fn installed() -> Option<Arc<Self>> {
        DRIVER.with(|driver| driver.borrow().clone())
    }

    pub fn inject<F: FnOnce(&mut Faults)>(&self, func: F) {
        func(&mut self.faults.lock().unwrap());
    }

    pub fn faults(&self) -> Faults {
        self.faults.lock().unwrap().clone()
    }

    pub fn record_release(&self, resource: &'static str) {
        self.releases.lock().unwrap().push(resource);
    }

    /// Every released driver resource, in release order.
    pub fn releases(&self) -> Vec<&'static str> {
        self.releases.lock().unwrap().clone()
    }

    /// Released resources other than buffers.
    pub fn handle_releases(&self) -> Vec<&'static str> {
        self.releases()
            .into_iter()
            .filter(|resource| *resource != "buffer")
            .collect()
    }

    pub fn record_launch(&self) {
        self.launches.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of kernel invocations submitted.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}
