//! Top-level scene BVH over entities (spec.md §4.2, §6), grounded on
//! `original_source/src/runtime/bvh/SceneBVHAdapter.h`'s `build_scene_bvh`:
//! one entity per leaf (`max_leaf_size == 1`, unlike the per-mesh BVH), with
//! each leaf record carrying the entity's bbox, ids, local transform, and
//! flags, and the last record of a leaf's run flagged with the sentinel high
//! bit on `entity_id`.

use glam::{Mat4, Vec3};

use crate::bvh::binary::{self, Primitive};
use crate::bvh::nary::{self, LeafWriter, NaryNode};
use crate::database::BoundingBox;
use crate::mesh::entity::{Entity, EntityFlags};

const ENTITY_SENTINEL: u32 = 0x8000_0000;

/// One flattened scene-BVH leaf record, mirroring `EntityLeaf1` from the
/// original adapter.
#[derive(Debug, Clone, Copy)]
pub struct EntityLeafRecord {
    pub bbox: BoundingBox,
    pub entity_id: u32,
    pub shape_id: u32,
    pub material_id: u32,
    pub user_id: Option<(u32, u32)>,
    pub local_to_world: Mat4,
    pub flags: EntityFlags,
}

impl EntityLeafRecord {
    #[must_use]
    pub fn is_leaf_end(&self) -> bool {
        self.entity_id & ENTITY_SENTINEL != 0
    }
}

impl Primitive for Entity {
    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
    fn center(&self) -> Vec3 {
        self.bbox.center()
    }
}

struct EntityLeafWriter<'e> {
    entities: &'e [Entity],
    records: Vec<EntityLeafRecord>,
}

impl LeafWriter for EntityLeafWriter<'_> {
    fn write_leaf(&mut self, order: &[u32], first: u32, count: u32) -> u32 {
        let offset = self.records.len() as u32;
        for i in 0..count {
            let entity = &self.entities[order[(first + i) as usize] as usize];
            self.records.push(EntityLeafRecord {
                bbox: entity.bbox,
                entity_id: entity.entity_id,
                shape_id: entity.shape_id,
                material_id: entity.material_id,
                user_id: entity.user_id,
                local_to_world: entity.local_to_world,
                flags: entity.flags,
            });
        }
        if let Some(last) = self.records.last_mut() {
            last.entity_id |= ENTITY_SENTINEL;
        }
        offset
    }
}

pub struct SceneBvh {
    pub nodes: Vec<NaryNode>,
    pub leaves: Vec<EntityLeafRecord>,
}

/// Builds the scene-wide entity BVH. Always uses a single-entity leaf size,
/// matching the original's `config.max_leaf_size = 1` for the top-level BVH.
#[must_use]
pub fn build(entities: &[Entity], fan_out: usize) -> SceneBvh {
    let (root, order) = binary::build(entities, 1);
    let mut writer = EntityLeafWriter {
        entities,
        records: Vec::new(),
    };
    let nodes = nary::build(&root, &order, fan_out, &mut writer);
    SceneBvh {
        nodes,
        leaves: writer.records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_at(id: u32, x: f32) -> Entity {
        let mut e = Entity::new(
            id,
            0,
            0,
            Mat4::IDENTITY,
            BoundingBox::EMPTY.extend_point(Vec3::new(x, 0.0, 0.0)).extend_point(Vec3::new(x + 1.0, 1.0, 1.0)),
        );
        e.entity_id = id;
        e
    }

    #[test]
    fn every_entity_appears_once_as_a_leaf() {
        let entities: Vec<Entity> = (0..12).map(|i| entity_at(i, i as f32 * 2.0)).collect();
        let bvh = build(&entities, 4);
        assert_eq!(bvh.leaves.len(), entities.len());
        let mut ids: Vec<u32> = bvh
            .leaves
            .iter()
            .map(|l| l.entity_id & !ENTITY_SENTINEL)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn single_entity_leaves_are_always_sentinel_flagged() {
        let entities: Vec<Entity> = (0..3).map(|i| entity_at(i, i as f32)).collect();
        let bvh = build(&entities, 2);
        // max_leaf_size == 1, so every leaf record is its own leaf's last record.
        assert!(bvh.leaves.iter().all(EntityLeafRecord::is_leaf_end));
    }
}
