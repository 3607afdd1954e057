//! Global-parameter-registry DSL emission helpers (spec.md §4.3, §4.9).
//!
//! Grounded on the `registry::get_global_parameter_*` call pattern seen in
//! `original_source/src/runtime/technique/SunGuidedPathTechnique.cpp`:
//! technique parameters that must stay runtime-tunable are emitted as a
//! lookup into the global parameter registry (keyed by a `"__tech_*"` name,
//! with a literal default baked into the call); parameters cheap enough to
//! specialize away are instead emitted as a compile-time literal when
//! specialization is enabled. [`crate::params`] is the runtime-side registry
//! these calls read from.

/// Whether a technique parameter should be emitted as a baked-in literal
/// (when specialization is enabled and the value is one of the technique's
/// recognized optimizable special cases) or a registry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specialization {
    Enabled,
    Disabled,
}

/// Emits `let {name} = registry::get_global_parameter_i32("{key}", {default});`
/// or, when `literal` is `Some` and specialization is enabled, a baked-in
/// literal assignment instead.
#[must_use]
pub fn emit_i32(name: &str, key: &str, default: i32, literal: Option<i32>, spec: Specialization) -> String {
    match (literal, spec) {
        (Some(v), Specialization::Enabled) => format!("  let {name} = {v}:i32;"),
        _ => format!("  let {name} = registry::get_global_parameter_i32(\"{key}\", {default});"),
    }
}

#[must_use]
pub fn emit_f32(name: &str, key: &str, default: f32, literal: Option<f32>, spec: Specialization) -> String {
    match (literal, spec) {
        (Some(v), Specialization::Enabled) => format!("  let {name} = {v}:f32;"),
        _ => format!("  let {name} = registry::get_global_parameter_f32(\"{key}\", {default});"),
    }
}

#[must_use]
pub fn emit_bool(name: &str, value: bool) -> String {
    format!("  let {name} = {};", if value { "true" } else { "false" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialization_enabled_bakes_in_the_literal() {
        let line = emit_i32("tech_max_depth", "__tech_max_depth", 8, Some(1), Specialization::Enabled);
        assert_eq!(line, "  let tech_max_depth = 1:i32;");
    }

    #[test]
    fn no_literal_always_emits_a_registry_lookup() {
        let line = emit_i32("tech_max_depth", "__tech_max_depth", 8, None, Specialization::Enabled);
        assert!(line.contains("registry::get_global_parameter_i32"));
    }

    #[test]
    fn specialization_disabled_ignores_the_literal() {
        let line = emit_f32("tech_clamp", "__tech_clamp", 0.0, Some(0.0), Specialization::Disabled);
        assert!(line.contains("registry::get_global_parameter_f32"));
    }
}
