use std::path::{Path, PathBuf};

use crate::{config::program::ProgramConfig, error::ProgramLoadError};

/// Bytes of a precompiled program and the file they came from.
#[derive(Clone, PartialEq, Eq)]
pub struct ProgramImage {
    /// The image path.
    pub path: PathBuf,
    /// The precompiled binary.
    pub binary: Vec<u8>,
}

impl core::fmt::Debug for ProgramImage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgramImage")
            .field("path", &self.path)
            .field("size", &self.binary.len())
            .finish()
    }
}

impl ProgramImage {
    /// Wrap an image already in memory.
    pub fn from_bytes<P: Into<PathBuf>>(path: P, binary: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            binary,
        }
    }

    /// Read an image file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ProgramLoadError> {
        let path = path.as_ref();
        let binary = std::fs::read(path).map_err(|err| ProgramLoadError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        log::debug!("Read program image '{}' ({} bytes)", path.display(), binary.len());

        Ok(Self::from_bytes(path, binary))
    }

    /// Find and read the image for a device.
    ///
    /// Looks for `<name>.<ext>` first, then for the board specific `<name>_<board>.<ext>`,
    /// in the configured directory or next to the executable.
    pub fn locate(config: &ProgramConfig, device_name: &str) -> Result<Self, ProgramLoadError> {
        let dir = match &config.dir {
            Some(dir) => dir.clone(),
            None => executable_dir()?,
        };

        let candidates = Self::candidates(&dir, config, device_name);

        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Self::read(path),
            None => Err(ProgramLoadError::NotFound {
                searched: candidates,
            }),
        }
    }

    /// Candidate paths, in lookup order.
    pub fn candidates(dir: &Path, config: &ProgramConfig, device_name: &str) -> Vec<PathBuf> {
        let mut candidates = vec![dir.join(format!("{}.{}", config.name, config.extension))];

        let board = board_name(device_name);
        if !board.is_empty() {
            candidates.push(dir.join(format!("{}_{}.{}", config.name, board, config.extension)));
        }

        candidates
    }
}

/// The board part of a device name, which ends at the first `" :"`.
///
/// Empty when the name has no board part.
pub fn board_name(device_name: &str) -> &str {
    match device_name.find(" :") {
        Some(end) => device_name[..end].trim(),
        None => "",
    }
}

fn executable_dir() -> Result<PathBuf, ProgramLoadError> {
    let exe = std::env::current_exe().map_err(|err| ProgramLoadError::Io {
        path: PathBuf::from("."),
        reason: err.to_string(),
    })?;

    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}
