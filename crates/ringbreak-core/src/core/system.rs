use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const SYSTEM_FILE_EXTENSION: &str = "bss";

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Prepared system file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Prepared system path is not a regular file: {}", path.display())]
    NotAFile { path: PathBuf },
    #[error("Failed to inspect prepared system {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A handle to a serialized molecular system prepared ahead of time.
///
/// The file format is owned by the molecular toolkit; this type only tracks where the
/// stream lives and whether the perturbable molecule should be linked to its reference
/// state when the engine loads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemSnapshot {
    path: PathBuf,
    linked_to_reference: bool,
}

impl SystemSnapshot {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SystemError> {
        let path = path.into();
        let metadata = std::fs::metadata(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SystemError::NotFound { path: path.clone() }
            } else {
                SystemError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        if !metadata.is_file() {
            return Err(SystemError::NotAFile { path });
        }
        debug!("Located prepared system at {:?}", &path);
        Ok(Self {
            path,
            linked_to_reference: false,
        })
    }

    /// Resolves `<input_dir>/<system_name>.bss`.
    pub fn path_for(input_dir: &Path, system_name: &str) -> PathBuf {
        input_dir.join(format!("{system_name}.{SYSTEM_FILE_EXTENSION}"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_linked_to_reference(&self) -> bool {
        self.linked_to_reference
    }

    /// A copy of this snapshot whose perturbable molecule is linked to the reference state.
    pub fn link_to_reference(&self) -> Self {
        Self {
            path: self.path.clone(),
            linked_to_reference: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_existing_stream_and_links_clone() {
        let dir = tempdir().unwrap();
        let path = SystemSnapshot::path_for(dir.path(), "chk1_compound_20_to_17");
        fs::write(&path, b"stream").unwrap();

        let system = SystemSnapshot::load(&path).unwrap();
        assert!(!system.is_linked_to_reference());
        assert_eq!(system.path(), path.as_path());

        let reference = system.link_to_reference();
        assert!(reference.is_linked_to_reference());
        assert!(!system.is_linked_to_reference());
        assert_eq!(reference.path(), system.path());
    }

    #[test]
    fn path_uses_bss_extension() {
        let path = SystemSnapshot::path_for(Path::new("../prepared_rbfe_input_files"), "sys");
        assert_eq!(path, PathBuf::from("../prepared_rbfe_input_files/sys.bss"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let result = SystemSnapshot::load(dir.path().join("absent.bss"));
        assert!(matches!(result, Err(SystemError::NotFound { .. })));
    }

    #[test]
    fn directory_is_not_a_system() {
        let dir = tempdir().unwrap();
        let result = SystemSnapshot::load(dir.path());
        assert!(matches!(result, Err(SystemError::NotAFile { .. })));
    }
}
