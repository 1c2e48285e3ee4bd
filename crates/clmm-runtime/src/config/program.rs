use std::path::PathBuf;

/// Configuration of the precompiled program image and its entry point.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProgramConfig {
    /// Base name of the image file.
    #[serde(default = "default_name")]
    pub name: String,

    /// Extension of the image file.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Directory searched for the image, defaults to the directory of the executable.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Name of the compute unit inside the program.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,

    /// Options passed to the driver when building the program.
    #[serde(default)]
    pub build_options: String,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            extension: default_extension(),
            dir: None,
            entry_point: default_entry_point(),
            build_options: String::new(),
        }
    }
}

fn default_name() -> String {
    "matrix_multi".into()
}

fn default_extension() -> String {
    "aocx".into()
}

fn default_entry_point() -> String {
    "simpleMultiply".into()
}
