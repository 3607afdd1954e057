//! Device Manager (C5, spec.md §4.4), grounded on
//! `original_source/src/runtime/device/DeviceManager.{h,cpp}`: scans
//! `IG_DEVICE_PATH` plus a system fallback directory for `ig_device_*`
//! modules, version/architecture-checks each, and lazily loads on demand.

use std::env;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::device::interface::{DeviceInterface, RUNTIME_VERSION};
use crate::device::shared_library::{is_shared_library, SharedLibrary};
use crate::device::target::TargetArchitecture;
use crate::errors::{IgnisError, Result};

const DEVICE_ENV_PATH: &str = "IG_DEVICE_PATH";
const DEVICE_ENV_SKIP_SYSTEM_PATH: &str = "IG_DEVICE_SKIP_SYSTEM_PATH";
const DEVICE_LIB_PREFIX: &str = "ig_device_";

/// Function pointer signature every device module exports as
/// `ig_get_interface`, matching `GetInterfaceFunction` in the original.
type GetInterfaceFn = extern "C" fn() -> *const (dyn DeviceInterface + 'static);

fn candidate_modules_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let debug_build = cfg!(debug_assertions);
    entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_shared_library(path))
        .filter(|path| {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let has_debug_suffix = stem.ends_with("_d");
            stem.starts_with(DEVICE_LIB_PREFIX) && has_debug_suffix == debug_build
        })
        .collect()
}

fn split_env_paths(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|s| !s.is_empty())
        .map(|s| std::fs::canonicalize(s).unwrap_or_else(|_| PathBuf::from(s)))
        .collect()
}

struct LoadedModule {
    library: SharedLibrary,
    interface: *const (dyn DeviceInterface + 'static),
}

// The interface pointer is a `'static` vtable the module keeps alive for the
// lifetime of the shared library it came from; we only ever dereference it
// while `library` is still loaded.
unsafe impl Send for LoadedModule {}

/// Per-process device plugin registry (spec.md §4.4). Lazily initialized;
/// `init(force = true)` re-scans from scratch.
#[derive(Default)]
pub struct DeviceManager {
    available: FxHashMap<TargetArchitecture, PathBuf>,
    loaded: FxHashMap<TargetArchitecture, LoadedModule>,
}

impl DeviceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self, dir: Option<&Path>, ignore_env: bool, force: bool) -> Result<()> {
        if !force && !self.available.is_empty() {
            return Ok(());
        }

        let mut search_paths: Vec<PathBuf> = Vec::new();
        let mut skip_system = false;

        if !ignore_env {
            if let Ok(env_paths) = env::var(DEVICE_ENV_PATH) {
                search_paths.extend(split_env_paths(&env_paths));
            }
            if env::var_os(DEVICE_ENV_SKIP_SYSTEM_PATH).is_some() {
                skip_system = true;
            }
        }

        if !skip_system {
            if let Ok(exe) = env::current_exe() {
                if let Some(root) = exe.parent().and_then(Path::parent) {
                    search_paths.push(root.join("lib"));
                }
            }
        }

        if let Some(dir) = dir {
            search_paths.push(std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()));
        }

        for path in &search_paths {
            log::debug!("searching for devices in {}", path.display());
            for module_path in candidate_modules_in(path) {
                log::debug!("adding device {}", module_path.display());
                self.add_module(&module_path);
            }
        }

        if self.available.is_empty() {
            log::error!("no device module could be found");
            return Err(IgnisError::DeviceNotFound(TargetArchitecture::Cpu(
                crate::device::target::CpuArchitecture::Generic,
            )));
        }

        Ok(())
    }

    fn add_module(&mut self, path: &Path) {
        let library = match SharedLibrary::load(path) {
            Ok(lib) => lib,
            Err(e) => {
                log::error!("loading error for module {}: {e}", path.display());
                return;
            }
        };
        let Some(interface) = Self::resolve_interface(&library) else {
            return;
        };
        // SAFETY: `interface` was just produced by the library we hold.
        let target = unsafe { &*interface }.architecture();
        if let Err(reason) = Self::check_version(path, unsafe { &*interface }) {
            log::warn!("{reason}");
            return;
        }
        self.available.insert(target, path.to_path_buf());
    }

    fn check_version(path: &Path, interface: &dyn DeviceInterface) -> std::result::Result<(), String> {
        let found = interface.version();
        if found != RUNTIME_VERSION {
            return Err(format!(
                "skipping module {} as the provided version {:?} does not match the runtime version {:?}",
                path.display(),
                found,
                RUNTIME_VERSION
            ));
        }
        Ok(())
    }

    fn resolve_interface(library: &SharedLibrary) -> Option<*const (dyn DeviceInterface + 'static)> {
        let raw = library.symbol_raw("ig_get_interface")?;
        // SAFETY: `ig_get_interface` is the documented ABI every device
        // module exports; transmuting the raw pointer is how the original
        // does this cast (`(GetInterfaceFunction)lib.symbol(...)`).
        let func: GetInterfaceFn = unsafe { std::mem::transmute(raw) };
        Some(func())
    }

    #[must_use]
    pub fn get_device(&mut self, target: TargetArchitecture) -> Option<&dyn DeviceInterface> {
        self.load(target).ok()?;
        self.loaded.get(&target).map(|m| unsafe { &*m.interface })
    }

    pub fn load(&mut self, target: TargetArchitecture) -> Result<()> {
        if self.loaded.contains_key(&target) {
            return Ok(());
        }
        let path = self
            .available
            .get(&target)
            .ok_or(IgnisError::DeviceNotFound(target))?
            .clone();

        let library = SharedLibrary::load(&path)?;
        let interface = Self::resolve_interface(&library).ok_or_else(|| IgnisError::DeviceLoadFailed {
            path: path.display().to_string(),
            reason: "missing ig_get_interface symbol".to_string(),
        })?;
        if Self::check_version(&path, unsafe { &*interface }).is_err() {
            return Err(IgnisError::DeviceVersionMismatch {
                path: path.display().to_string(),
                found: unsafe { &*interface }.version(),
                expected: RUNTIME_VERSION,
            });
        }
        self.loaded.insert(target, LoadedModule { library, interface });
        Ok(())
    }

    pub fn unload(&mut self, target: TargetArchitecture) -> bool {
        if let Some(mut module) = self.loaded.remove(&target) {
            module.library.unload();
        }
        true
    }

    pub fn unload_all(&mut self) {
        let targets: Vec<_> = self.loaded.keys().copied().collect();
        for target in targets {
            self.unload(target);
        }
    }

    #[must_use]
    pub fn available_devices(&self) -> Vec<TargetArchitecture> {
        self.available.keys().copied().collect()
    }
}

/// Process-wide singleton, replacing the C++ function-local `static` in
/// `DeviceManager::instance()` with an explicit `OnceLock` + `Mutex`
/// (spec.md §5); tests construct their own `DeviceManager` instead.
static INSTANCE: std::sync::OnceLock<Mutex<DeviceManager>> = std::sync::OnceLock::new();

pub fn instance() -> &'static Mutex<DeviceManager> {
    INSTANCE.get_or_init(|| Mutex::new(DeviceManager::new()))
}
