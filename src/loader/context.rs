//! Loader-wide state threaded through shape/technique/shader generation
//! (spec.md §4.1, §4.3), grounded on the various `LoaderContext` accesses
//! seen from `original_source/src/runtime/technique/SunGuidedPathTechnique.cpp`
//! (`context().Options`, `context().GlobalRegistry`, scene bbox inlining).

use crate::database::BoundingBox;
use crate::params::ParameterSet;
use crate::shader::registry::Specialization;

/// Scene-wide values every technique/provider may need while generating
/// code or building geometry: the world bounding box (for sun/env light
/// placement), the global parameter registry technique bodies write their
/// `"__tech_*"` entries into, and whether specialization is enabled (spec.md
/// §9: disabling it forces every tunable parameter through the registry
/// instead of being baked in as a literal, trading compile time for runtime
/// flexibility).
#[derive(Debug, Clone)]
pub struct LoaderContext {
    pub world_bbox: BoundingBox,
    pub scene_diameter: f32,
    pub global_registry: ParameterSet,
    pub specialization: Specialization,
}

impl LoaderContext {
    #[must_use]
    pub fn new(world_bbox: BoundingBox, specialization: Specialization) -> Self {
        Self {
            scene_diameter: if world_bbox.is_empty() { 0.0 } else { world_bbox.diameter() },
            world_bbox,
            global_registry: ParameterSet::new(),
            specialization,
        }
    }

    /// Renders the scene bbox as an inline DSL expression, matching
    /// `LoaderUtils::inlineSceneBBox`'s use in sun-light construction.
    #[must_use]
    pub fn inline_scene_bbox(&self) -> String {
        let min = self.world_bbox.min;
        let max = self.world_bbox.max;
        format!(
            "make_bbox(make_vec3({}, {}, {}), make_vec3({}, {}, {}))",
            min.x, min.y, min.z, max.x, max.y, max.z
        )
    }
}
