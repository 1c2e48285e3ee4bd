use clmm_runtime::{
    device::{DeviceProperties, PlatformProperties, VectorWidths},
    error::DriverError,
};
use opencl3::{
    command_queue::{CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE, CL_QUEUE_PROFILING_ENABLE},
    device::Device,
    platform::Platform,
};

use crate::error::driver_error;

/// An OpenCL device.
#[derive(new, Debug, Clone, Copy)]
pub struct OpenClDevice {
    pub(crate) device: Device,
}

pub(crate) fn platform_properties(platform: &Platform) -> Result<PlatformProperties, DriverError> {
    Ok(PlatformProperties {
        name: platform.name().map_err(driver_error("platform name"))?,
        vendor: platform.vendor().map_err(driver_error("platform vendor"))?,
        version: platform.version().map_err(driver_error("platform version"))?,
    })
}

// MIN_DATA_TYPE_ALIGN_SIZE is deprecated since OpenCL 1.2 but FPGA runtimes still report it.
#[allow(deprecated)]
pub(crate) fn device_properties(device: &Device) -> Result<DeviceProperties, DriverError> {
    let queue = device
        .queue_on_host_properties()
        .map_err(driver_error("device queue properties"))?;

    Ok(DeviceProperties {
        name: device.name().map_err(driver_error("device name"))?,
        vendor: device.vendor().map_err(driver_error("device vendor"))?,
        vendor_id: device.vendor_id().map_err(driver_error("device vendor id"))?,
        version: device.version().map_err(driver_error("device version"))?,
        driver_version: device
            .driver_version()
            .map_err(driver_error("driver version"))?,
        address_bits: device
            .address_bits()
            .map_err(driver_error("device address bits"))?,
        available: device.available().map_err(driver_error("device available"))?,
        little_endian: device
            .endian_little()
            .map_err(driver_error("device endianness"))?,
        global_mem_size: device
            .global_mem_size()
            .map_err(driver_error("device global memory size"))?,
        global_mem_cache_size: device
            .global_mem_cache_size()
            .map_err(driver_error("device global memory cache size"))?,
        global_mem_cacheline_size: device
            .global_mem_cacheline_size()
            .map_err(driver_error("device global memory cache line size"))?,
        local_mem_size: device
            .local_mem_size()
            .map_err(driver_error("device local memory size"))?,
        max_mem_alloc_size: device
            .max_mem_alloc_size()
            .map_err(driver_error("device max allocation size"))?,
        max_clock_frequency: device
            .max_clock_frequency()
            .map_err(driver_error("device max clock frequency"))?,
        max_compute_units: device
            .max_compute_units()
            .map_err(driver_error("device max compute units"))?,
        max_constant_args: device
            .max_constant_args()
            .map_err(driver_error("device max constant args"))?,
        max_constant_buffer_size: device
            .max_constant_buffer_size()
            .map_err(driver_error("device max constant buffer size"))?,
        max_work_group_size: device
            .max_work_group_size()
            .map_err(driver_error("device max work group size"))?,
        max_work_item_dimensions: device
            .max_work_item_dimensions()
            .map_err(driver_error("device max work item dimensions"))?,
        mem_base_addr_align: device
            .mem_base_addr_align()
            .map_err(driver_error("device base address alignment"))?,
        min_data_type_align_size: device
            .min_data_type_align_size()
            .map_err(driver_error("device min data type alignment"))?,
        preferred_vector_width: vector_widths(device)?,
        image_support: device
            .image_support()
            .map_err(driver_error("device image support"))?,
        queue_out_of_order: (queue & CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE) != 0,
        queue_profiling: (queue & CL_QUEUE_PROFILING_ENABLE) != 0,
    })
}

fn vector_widths(device: &Device) -> Result<VectorWidths, DriverError> {
    Ok(VectorWidths {
        char: device
            .max_preferred_vector_width_char()
            .map_err(driver_error("device preferred vector width"))?,
        short: device
            .max_preferred_vector_width_short()
            .map_err(driver_error("device preferred vector width"))?,
        int: device
            .max_preferred_vector_width_int()
            .map_err(driver_error("device preferred vector width"))?,
        long: device
            .max_preferred_vector_width_long()
            .map_err(driver_error("device preferred vector width"))?,
        float: device
            .max_preferred_vector_width_float()
            .map_err(driver_error("device preferred vector width"))?,
        double: device
            .max_preferred_vector_width_double()
            .map_err(driver_error("device preferred vector width"))?,
    })
}
