//! Top-level scene node: the leaf type of the scene BVH (spec.md §3).

use glam::Mat4;

use crate::database::BoundingBox;

bitflags::bitflags! {
    /// Per-entity flags (e.g. visibility to camera/shadow rays). The bit
    /// layout is an internal concern of the device kernels; this core only
    /// carries the word through untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntityFlags: u32 {
        const CAMERA_VISIBLE = 1 << 0;
        const SHADOW_CASTER  = 1 << 1;
        const LIGHT_SOURCE   = 1 << 2;
    }
}

/// A scene entity: world-space bbox, shape/material references, optional
/// per-entity user id pair, entity id, transform, and flags.
#[derive(Debug, Clone, Copy)]
pub struct Entity {
    pub bbox: BoundingBox,
    pub shape_id: u32,
    pub material_id: u32,
    pub user_id: Option<(u32, u32)>,
    pub entity_id: u32,
    pub local_to_world: Mat4,
    pub flags: EntityFlags,
}

impl Entity {
    #[must_use]
    pub fn new(
        entity_id: u32,
        shape_id: u32,
        material_id: u32,
        local_to_world: Mat4,
        bbox: BoundingBox,
    ) -> Self {
        Self {
            bbox,
            shape_id,
            material_id,
            user_id: None,
            entity_id,
            local_to_world,
            flags: EntityFlags::CAMERA_VISIBLE | EntityFlags::SHADOW_CASTER,
        }
    }

    #[must_use]
    pub fn center(&self) -> glam::Vec3 {
        self.bbox.center()
    }
}
