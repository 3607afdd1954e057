//! Typed user-level parameter propagation (spec.md §3 `ParameterSet`, §4.3
//! registry), grounded on the `GlobalRegistry.IntParameters`/`FloatParameters`
//! maps referenced from
//! `original_source/src/runtime/technique/SunGuidedPathTechnique.cpp` and
//! read back at kernel launch via `registry::get_global_parameter_*`.

use rustc_hash::FxHashMap;

/// Four type-segregated parameter maps. Unset keys read as zero-initialized
/// values inside kernels (spec.md §3); this side mirrors that by returning
/// the type's default from the typed getters below.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    pub int: FxHashMap<String, i32>,
    pub float: FxHashMap<String, f32>,
    pub vec3: FxHashMap<String, [f32; 3]>,
    pub vec4: FxHashMap<String, [f32; 4]>,
}

impl ParameterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i32) {
        self.int.insert(key.into(), value);
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.float.insert(key.into(), value);
    }

    pub fn set_vec3(&mut self, key: impl Into<String>, value: [f32; 3]) {
        self.vec3.insert(key.into(), value);
    }

    pub fn set_vec4(&mut self, key: impl Into<String>, value: [f32; 4]) {
        self.vec4.insert(key.into(), value);
    }

    #[must_use]
    pub fn get_int(&self, key: &str) -> i32 {
        self.int.get(key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn get_float(&self, key: &str) -> f32 {
        self.float.get(key).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn get_vec3(&self, key: &str) -> [f32; 3] {
        self.vec3.get(key).copied().unwrap_or([0.0; 3])
    }

    #[must_use]
    pub fn get_vec4(&self, key: &str) -> [f32; 4] {
        self.vec4.get(key).copied().unwrap_or([0.0; 4])
    }

    /// Merges `other` into `self`, with `other`'s entries taking precedence
    /// on key collisions (used to layer per-call overrides onto the
    /// technique's own global registry entries before a `render()` launch).
    pub fn merge_from(&mut self, other: &ParameterSet) {
        self.int.extend(other.int.iter().map(|(k, v)| (k.clone(), *v)));
        self.float.extend(other.float.iter().map(|(k, v)| (k.clone(), *v)));
        self.vec3.extend(other.vec3.iter().map(|(k, v)| (k.clone(), *v)));
        self.vec4.extend(other.vec4.iter().map(|(k, v)| (k.clone(), *v)));
    }
}
