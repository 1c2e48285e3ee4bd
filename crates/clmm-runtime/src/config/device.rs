/// Configuration of the platform lookup.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DeviceConfig {
    /// Substring of the platform name used when the emulator is requested.
    #[serde(default = "default_emulator_platform")]
    pub emulator_platform: String,

    /// Substring of the platform name used for real hardware.
    #[serde(default = "default_native_platform")]
    pub native_platform: String,

    /// Whether the binary prints platform and device information before running.
    #[serde(default = "default_print_info")]
    pub print_info: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            emulator_platform: default_emulator_platform(),
            native_platform: default_native_platform(),
            print_info: default_print_info(),
        }
    }
}

fn default_emulator_platform() -> String {
    "Intel(R) FPGA Emulation Platform for OpenCL(TM)".into()
}

fn default_native_platform() -> String {
    "Intel(R) FPGA SDK for OpenCL(TM)".into()
}

fn default_print_info() -> bool {
    true
}
