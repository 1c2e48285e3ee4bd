use crate::dispatch::WorkSize;

/// Configuration of the kernel launch.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DispatchConfig {
    /// The work group shape.
    #[serde(default = "default_local_size")]
    pub local_size: WorkSize,

    /// Whether the command queue records profiling information.
    #[serde(default = "default_profiling")]
    pub profiling: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            local_size: default_local_size(),
            profiling: default_profiling(),
        }
    }
}

fn default_local_size() -> WorkSize {
    WorkSize::new_2d(2, 2)
}

fn default_profiling() -> bool {
    true
}
