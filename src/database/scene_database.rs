//! In-memory binary scene database (C1).
//!
//! Owns every [`DynTable`]/[`FixTable`] produced while loading a scene, plus
//! scene-wide metadata. Built incrementally during loading (spec.md §5: a
//! mutex guards the final serialization step per shape; BVH building itself
//! is parallel and mutation-free), then moved wholesale into the render
//! device and treated as immutable for the lifetime of that scene.

use rustc_hash::FxHashMap;

use crate::database::dyn_table::DynTable;
use crate::database::fix_table::FixTable;
use glam::{Mat4, Vec3};

/// World-space axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    #[must_use]
    pub fn extend(mut self, other: Self) -> Self {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self
    }

    #[must_use]
    pub fn extend_point(mut self, p: Vec3) -> Self {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
        self
    }

    #[must_use]
    pub fn diameter(&self) -> f32 {
        (self.max - self.min).length()
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// World-space AABB of this bbox's eight corners under `transform`, used
    /// when instancing a shape's local bbox into an entity's world bbox.
    #[must_use]
    pub fn transformed(&self, transform: Mat4) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        let mut result = Self::EMPTY;
        for i in 0..8u8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            result = result.extend_point(transform.transform_point3(corner));
        }
        result
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// The binary scene database: dynamic per-type tables, fixed BVH blob pools,
/// and scene-wide metadata (spec.md §3).
#[derive(Debug, Default)]
pub struct SceneDatabase {
    pub tables: FxHashMap<String, DynTable>,
    pub fix_tables: FxHashMap<String, FixTable>,

    pub world_bbox: BoundingBox,
    pub scene_diameter: f32,
    pub material_count: u32,
    /// Maps an entity id to its material id.
    pub entity_to_material: Vec<u32>,
    /// Per-shape `(face_count, vertex_count)`, indexed by shape id; consumed
    /// by area light sampling to weight emitter triangles (spec.md §4.1
    /// "registers per-shape triangle stats").
    pub shape_stats: Vec<(u32, u32)>,
}

impl SceneDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_mut(&mut self, name: &str) -> &mut DynTable {
        self.tables.entry(name.to_string()).or_default()
    }

    pub fn fix_table_mut(&mut self, name: &str) -> &mut FixTable {
        self.fix_tables.entry(name.to_string()).or_default()
    }

    pub fn table(&self, name: &str) -> Option<&DynTable> {
        self.tables.get(name)
    }

    pub fn fix_table(&self, name: &str) -> Option<&FixTable> {
        self.fix_tables.get(name)
    }

    /// Recomputes `scene_diameter` from `world_bbox`. Called once all
    /// entities have been registered.
    pub fn finalize_bounds(&mut self) {
        self.scene_diameter = if self.world_bbox.is_empty() {
            0.0
        } else {
            self.world_bbox.diameter()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bbox_has_zero_diameter_after_finalize() {
        let mut db = SceneDatabase::new();
        db.finalize_bounds();
        assert_eq!(db.scene_diameter, 0.0);
    }

    #[test]
    fn bbox_extend_grows_monotonically() {
        let a = BoundingBox {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        let b = BoundingBox {
            min: Vec3::new(-2.0, 0.0, 0.0),
            max: Vec3::new(0.5, 3.0, 0.5),
        };
        let merged = a.extend(b);
        assert_eq!(merged.min, Vec3::new(-2.0, -1.0, -1.0));
        assert_eq!(merged.max, Vec3::new(1.0, 3.0, 1.0));
    }

    #[test]
    fn transformed_bbox_follows_a_translation() {
        let bbox = BoundingBox {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        let moved = bbox.transformed(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(moved.min, Vec3::new(4.0, -1.0, -1.0));
        assert_eq!(moved.max, Vec3::new(6.0, 1.0, 1.0));
    }

    #[test]
    fn transformed_empty_bbox_stays_empty() {
        let moved = BoundingBox::EMPTY.transformed(Mat4::from_translation(Vec3::ONE));
        assert!(moved.is_empty());
    }
}
