use crate::{config::device::DeviceConfig, error::PlatformSelectionError, runtime::Runtime};

/// Which kind of platform the pipeline runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceSelection {
    /// The vendor's software emulator of the accelerator.
    Emulated,
    /// The real accelerator board.
    #[default]
    Native,
}

impl DeviceSelection {
    /// Selection from the command line emulator flag.
    pub fn from_emulator_flag(emulator: bool) -> Self {
        if emulator {
            Self::Emulated
        } else {
            Self::Native
        }
    }

    /// The platform name substring searched for this selection.
    pub fn target<'a>(&self, config: &'a DeviceConfig) -> &'a str {
        match self {
            DeviceSelection::Emulated => &config.emulator_platform,
            DeviceSelection::Native => &config.native_platform,
        }
    }
}

impl core::fmt::Display for DeviceSelection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DeviceSelection::Emulated => f.write_str("emulated"),
            DeviceSelection::Native => f.write_str("native"),
        }
    }
}

/// Index of the first platform whose name contains `target`, ignoring case.
pub fn select_platform<S: AsRef<str>>(names: &[S], target: &str) -> Option<usize> {
    let target = target.to_lowercase();

    names
        .iter()
        .position(|name| name.as_ref().to_lowercase().contains(&target))
}

/// Descriptive properties of a platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformProperties {
    /// Platform name.
    pub name: String,
    /// Platform vendor.
    pub vendor: String,
    /// Supported API version.
    pub version: String,
}

impl core::fmt::Display for PlatformProperties {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:<40} = {}", "CL_PLATFORM_NAME", self.name)?;
        writeln!(f, "{:<40} = {}", "CL_PLATFORM_VENDOR", self.vendor)?;
        writeln!(f, "{:<40} = {}", "CL_PLATFORM_VERSION", self.version)
    }
}

/// Properties and hardware limits of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProperties {
    /// Device name, which includes the board name for accelerator cards.
    pub name: String,
    /// Device vendor.
    pub vendor: String,
    /// Vendor identifier.
    pub vendor_id: u32,
    /// Supported API version.
    pub version: String,
    /// Driver version.
    pub driver_version: String,
    /// Width of device addresses in bits.
    pub address_bits: u32,
    /// Whether the device is available.
    pub available: bool,
    /// Whether the device is little endian.
    pub little_endian: bool,
    /// Global memory size in bytes.
    pub global_mem_size: u64,
    /// Global memory cache size in bytes.
    pub global_mem_cache_size: u64,
    /// Global memory cache line size in bytes.
    pub global_mem_cacheline_size: u32,
    /// Local memory size in bytes.
    pub local_mem_size: u64,
    /// Largest single allocation in bytes.
    pub max_mem_alloc_size: u64,
    /// Maximum clock frequency in MHz.
    pub max_clock_frequency: u32,
    /// Number of compute units.
    pub max_compute_units: u32,
    /// Maximum number of `__constant` arguments of a compute unit.
    pub max_constant_args: u32,
    /// Largest `__constant` buffer in bytes.
    pub max_constant_buffer_size: u64,
    /// Maximum units in a work group.
    pub max_work_group_size: usize,
    /// Maximum number of work item dimensions.
    pub max_work_item_dimensions: u32,
    /// Alignment of buffer base addresses in bits.
    pub mem_base_addr_align: u32,
    /// Smallest alignment in bytes for any data type.
    pub min_data_type_align_size: u32,
    /// Preferred vector widths per scalar type.
    pub preferred_vector_width: VectorWidths,
    /// Whether images are supported.
    pub image_support: bool,
    /// Whether the device can run command queues out of order.
    pub queue_out_of_order: bool,
    /// Whether the device can profile command queues.
    pub queue_profiling: bool,
}

/// Preferred native vector width of each scalar type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorWidths {
    /// Width for `char`.
    pub char: u32,
    /// Width for `short`.
    pub short: u32,
    /// Width for `int`.
    pub int: u32,
    /// Width for `long`.
    pub long: u32,
    /// Width for `float`.
    pub float: u32,
    /// Width for `double`.
    pub double: u32,
}

impl core::fmt::Display for DeviceProperties {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let widths = &self.preferred_vector_width;
        let rows = [
            ("CL_DEVICE_NAME", self.name.clone()),
            ("CL_DEVICE_VENDOR", self.vendor.clone()),
            ("CL_DEVICE_VENDOR_ID", self.vendor_id.to_string()),
            ("CL_DEVICE_VERSION", self.version.clone()),
            ("CL_DRIVER_VERSION", self.driver_version.clone()),
            ("CL_DEVICE_ADDRESS_BITS", self.address_bits.to_string()),
            ("CL_DEVICE_AVAILABLE", yes_no(self.available)),
            ("CL_DEVICE_ENDIAN_LITTLE", yes_no(self.little_endian)),
            ("CL_DEVICE_GLOBAL_MEM_CACHE_SIZE", self.global_mem_cache_size.to_string()),
            (
                "CL_DEVICE_GLOBAL_MEM_CACHELINE_SIZE",
                self.global_mem_cacheline_size.to_string(),
            ),
            ("CL_DEVICE_GLOBAL_MEM_SIZE", self.global_mem_size.to_string()),
            ("CL_DEVICE_IMAGE_SUPPORT", yes_no(self.image_support)),
            ("CL_DEVICE_LOCAL_MEM_SIZE", self.local_mem_size.to_string()),
            ("CL_DEVICE_MAX_CLOCK_FREQUENCY", self.max_clock_frequency.to_string()),
            ("CL_DEVICE_MAX_COMPUTE_UNITS", self.max_compute_units.to_string()),
            ("CL_DEVICE_MAX_CONSTANT_ARGS", self.max_constant_args.to_string()),
            (
                "CL_DEVICE_MAX_CONSTANT_BUFFER_SIZE",
                self.max_constant_buffer_size.to_string(),
            ),
            ("CL_DEVICE_MAX_MEM_ALLOC_SIZE", self.max_mem_alloc_size.to_string()),
            ("CL_DEVICE_MAX_WORK_GROUP_SIZE", self.max_work_group_size.to_string()),
            (
                "CL_DEVICE_MAX_WORK_ITEM_DIMENSIONS",
                self.max_work_item_dimensions.to_string(),
            ),
            ("CL_DEVICE_MEM_BASE_ADDR_ALIGN", self.mem_base_addr_align.to_string()),
            (
                "CL_DEVICE_MIN_DATA_TYPE_ALIGN_SIZE",
                self.min_data_type_align_size.to_string(),
            ),
            ("CL_DEVICE_PREFERRED_VECTOR_WIDTH_CHAR", widths.char.to_string()),
            ("CL_DEVICE_PREFERRED_VECTOR_WIDTH_SHORT", widths.short.to_string()),
            ("CL_DEVICE_PREFERRED_VECTOR_WIDTH_INT", widths.int.to_string()),
            ("CL_DEVICE_PREFERRED_VECTOR_WIDTH_LONG", widths.long.to_string()),
            ("CL_DEVICE_PREFERRED_VECTOR_WIDTH_FLOAT", widths.float.to_string()),
            ("CL_DEVICE_PREFERRED_VECTOR_WIDTH_DOUBLE", widths.double.to_string()),
            ("Command queue out of order?", yes_no(self.queue_out_of_order)),
            ("Command queue profiling enabled?", yes_no(self.queue_profiling)),
        ];

        for (label, value) in rows {
            writeln!(f, "{label:<40} = {value}")?;
        }

        Ok(())
    }
}

fn yes_no(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// A device picked by the [DeviceLocator].
pub struct LocatedDevice<R: Runtime> {
    /// Name of the platform the device belongs to.
    pub platform_name: String,
    /// The platform handle.
    pub platform: R::Platform,
    /// The device handle.
    pub device: R::Device,
}

impl<R: Runtime> core::fmt::Debug for LocatedDevice<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LocatedDevice")
            .field("runtime", &R::name())
            .field("platform_name", &self.platform_name)
            .finish()
    }
}

/// Finds the platform and device matching a [DeviceSelection].
#[derive(new, Debug, Clone)]
pub struct DeviceLocator {
    config: DeviceConfig,
}

impl DeviceLocator {
    /// Pick the first device of the first platform matching the selection.
    pub fn locate<R: Runtime>(
        &self,
        selection: DeviceSelection,
    ) -> Result<LocatedDevice<R>, PlatformSelectionError> {
        let target = selection.target(&self.config);
        let mut platforms = Vec::new();
        for platform in R::platforms()? {
            let name = R::platform_properties(&platform)?.name;
            platforms.push((name, platform));
        }

        let names: Vec<&str> = platforms.iter().map(|(name, _)| name.as_str()).collect();
        let index = select_platform(&names, target).ok_or_else(|| {
            PlatformSelectionError::NoPlatformFound {
                target: target.to_string(),
                available: names.iter().map(|name| name.to_string()).collect(),
            }
        })?;
        let (platform_name, platform) = platforms.swap_remove(index);

        let device = R::devices(&platform)?.into_iter().next().ok_or_else(|| {
            PlatformSelectionError::NoDeviceFound {
                platform: platform_name.clone(),
            }
        })?;

        log::info!("Selected the {selection} platform '{platform_name}' on {}", R::name());

        Ok(LocatedDevice {
            platform_name,
            platform,
            device,
        })
    }
}
