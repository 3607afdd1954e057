//! Compiler Device (C6, spec.md §4.3/§4.9), grounded on
//! `original_source/src/runtime/device/ICompilerDevice.h`: JIT-compiles a
//! `(script, function_name)` pair to an opaque handle. `CompilerCache` adds
//! the script-hash memoization `spec.md` §4.3 calls for ("repeated calls
//! with identical script text return the same handle") on top of a bare
//! `CompilerDevice`, since the original interface leaves caching to callers.

use rustc_hash::FxHashMap;
use std::hash::{Hash, Hasher};

use crate::errors::Result;

#[derive(Debug, Clone, Copy)]
pub struct CompilerSettings {
    pub optimization_level: u8,
    pub verbose: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            optimization_level: 3,
            verbose: false,
        }
    }
}

/// Opaque handle to compiled device code; equality is handle identity, not
/// structural — two compiles of the same source produce the same handle
/// only through `CompilerCache`, never by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompiledFunction(pub u64);

pub trait CompilerDevice: Send {
    /// Compiles `script`, returning a handle to `function_name` within it.
    /// Per spec.md §4.3, a missing symbol is a `SymbolNotFound` error, not a
    /// panic — the script text itself may be syntactically valid DSL while
    /// simply not defining the requested entry point.
    fn compile(&mut self, settings: &CompilerSettings, script: &str, function_name: &str) -> Result<CompiledFunction>;
}

fn script_hash(script: &str, function_name: &str) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    script.hash(&mut hasher);
    function_name.hash(&mut hasher);
    hasher.finish()
}

/// Wraps a `CompilerDevice` with the hash-keyed memoization spec.md §4.9
/// requires: identical `(script, function_name)` byte content returns the
/// same handle without recompiling.
pub struct CompilerCache<D: CompilerDevice> {
    device: D,
    cache: FxHashMap<u64, CompiledFunction>,
}

impl<D: CompilerDevice> CompilerCache<D> {
    #[must_use]
    pub fn new(device: D) -> Self {
        Self {
            device,
            cache: FxHashMap::default(),
        }
    }

    pub fn compile(
        &mut self,
        settings: &CompilerSettings,
        script: &str,
        function_name: &str,
    ) -> Result<CompiledFunction> {
        let key = script_hash(script, function_name);
        if let Some(handle) = self.cache.get(&key) {
            return Ok(*handle);
        }
        let handle = self.device.compile(settings, script, function_name)?;
        self.cache.insert(key, handle);
        Ok(handle)
    }
}

impl<T: CompilerDevice + ?Sized> CompilerDevice for Box<T> {
    fn compile(&mut self, settings: &CompilerSettings, script: &str, function_name: &str) -> Result<CompiledFunction> {
        (**self).compile(settings, script, function_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingDevice {
        compiles: u32,
    }

    impl CompilerDevice for CountingDevice {
        fn compile(&mut self, _settings: &CompilerSettings, script: &str, function_name: &str) -> Result<CompiledFunction> {
            self.compiles += 1;
            Ok(CompiledFunction(script_hash(script, function_name)))
        }
    }

    #[test]
    fn identical_script_returns_cached_handle() {
        let mut cache = CompilerCache::new(CountingDevice { compiles: 0 });
        let settings = CompilerSettings::default();
        let a = cache.compile(&settings, "fn main() {}", "main").unwrap();
        let b = cache.compile(&settings, "fn main() {}", "main").unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.device.compiles, 1);
    }

    #[test]
    fn one_character_edit_recompiles() {
        let mut cache = CompilerCache::new(CountingDevice { compiles: 0 });
        let settings = CompilerSettings::default();
        let a = cache.compile(&settings, "fn main() {}", "main").unwrap();
        let b = cache.compile(&settings, "fn main() { }", "main").unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.device.compiles, 2);
    }
}
