//! Thin `libloading` wrapper standing in for the original's `SharedLibrary`
//! class (referenced from `DeviceManager.h`/`.cpp`): load-by-path, resolve a
//! symbol by name, and an explicit `unload`. Kept separate from
//! `DeviceManager` so the manager's maps can hold library handles without
//! knowing about `libloading` directly.

use std::path::{Path, PathBuf};

use libloading::Library;

use crate::errors::{IgnisError, Result};

/// Platform-specific dynamic library suffix, used to filter candidate files
/// the same way `SharedLibrary::isSharedLibrary` does on the C++ side.
#[cfg(target_os = "windows")]
const LIB_EXTENSION: &str = "dll";
#[cfg(target_os = "macos")]
const LIB_EXTENSION: &str = "dylib";
#[cfg(all(unix, not(target_os = "macos")))]
const LIB_EXTENSION: &str = "so";

#[must_use]
pub fn is_shared_library(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(LIB_EXTENSION)
}

pub struct SharedLibrary {
    path: PathBuf,
    library: Option<Library>,
}

impl SharedLibrary {
    pub fn load(path: &Path) -> Result<Self> {
        // SAFETY: the library's only contract requirement, that it not run
        // conflicting initializers, is the same trust boundary the original
        // C++ `dlopen`/`LoadLibrary` wrapper accepts.
        let library = unsafe { Library::new(path) }.map_err(|e| IgnisError::DeviceLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            library: Some(library),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves a symbol's raw address by name, matching
    /// `DeviceManager::getInterface`'s use of `SharedLibrary::symbol`.
    pub fn symbol_raw(&self, name: &str) -> Option<*mut std::ffi::c_void> {
        let library = self.library.as_ref()?;
        // SAFETY: caller is responsible for the symbol's actual type; this
        // mirrors the raw `void*` the original returns from `symbol()`.
        unsafe {
            library
                .get::<*mut std::ffi::c_void>(format!("{name}\0").as_bytes())
                .ok()
                .map(|sym| *sym)
        }
    }

    pub fn unload(&mut self) {
        self.library.take();
    }
}

impl std::fmt::Debug for SharedLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLibrary").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_library_extensions() {
        assert!(!is_shared_library(Path::new("scene.json")));
        assert!(!is_shared_library(Path::new("ig_device_cpu")));
    }

    #[test]
    fn accepts_platform_library_extension() {
        let path = PathBuf::from(format!("ig_device_cpu.{LIB_EXTENSION}"));
        assert!(is_shared_library(&path));
    }
}
