//! Per-mesh triangle BVH (spec.md §4.2, §6), grounded on
//! `original_source/src/runtime/bvh/TriBVHAdapter.h`'s leaf-packing scheme:
//! each primitive occupies its own record, the records of one collapsed leaf
//! are contiguous, and the last record of a leaf is flagged with the
//! sentinel high bit on its `prim_id` so the traversal kernel knows where a
//! leaf's run ends without needing a separate length field.

use glam::Vec3;

use crate::bvh::binary::{self, Primitive};
use crate::bvh::nary::{self, LeafWriter, NaryNode};
use crate::database::BoundingBox;
use crate::mesh::provider::BvhShape;
use crate::mesh::tri_mesh::TriMesh;

const LEAF_SENTINEL: u32 = 0x8000_0000;

/// One flattened triangle record: a leaf's winding order plus the owning
/// face index, with the top bit of `prim_id` set on a leaf's last record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriLeafRecord {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    pub prim_id: u32,
}

impl TriLeafRecord {
    #[must_use]
    pub fn is_leaf_end(&self) -> bool {
        self.prim_id & LEAF_SENTINEL != 0
    }

    #[must_use]
    pub fn face_index(&self) -> u32 {
        self.prim_id & !LEAF_SENTINEL
    }
}

struct TriProxy {
    bbox: BoundingBox,
    center: Vec3,
}

impl Primitive for TriProxy {
    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
    fn center(&self) -> Vec3 {
        self.center
    }
}

struct TriLeafWriter<'m> {
    mesh: &'m TriMesh,
    records: Vec<TriLeafRecord>,
}

impl LeafWriter for TriLeafWriter<'_> {
    fn write_leaf(&mut self, order: &[u32], first: u32, count: u32) -> u32 {
        let offset = self.records.len() as u32;
        for i in 0..count {
            let face = order[(first + i) as usize] as usize;
            let (p0, p1, p2) = self.mesh.triangle(face);
            self.records.push(TriLeafRecord {
                v0: p0,
                v1: p1,
                v2: p2,
                prim_id: face as u32,
            });
        }
        if let Some(last) = self.records.last_mut() {
            last.prim_id |= LEAF_SENTINEL;
        }
        offset
    }
}

/// The built BVH of one mesh: wide nodes plus its flattened leaf records.
pub struct TriMeshBvh {
    pub nodes: Vec<NaryNode>,
    pub leaves: Vec<TriLeafRecord>,
}

/// Builds the per-triangle BVH of `mesh` for the given target `shape`
/// (spec.md §4.1: `fan_out`/`leaf_width` is chosen per compile target).
#[must_use]
pub fn build(mesh: &TriMesh, shape: BvhShape) -> TriMeshBvh {
    let proxies: Vec<TriProxy> = (0..mesh.face_count())
        .map(|f| {
            let (p0, p1, p2) = mesh.triangle(f);
            let bbox = BoundingBox::EMPTY
                .extend_point(p0)
                .extend_point(p1)
                .extend_point(p2);
            TriProxy {
                bbox,
                center: bbox.center(),
            }
        })
        .collect();

    let (root, order) = binary::build(&proxies, shape.leaf_width as u32);
    let mut writer = TriLeafWriter {
        mesh,
        records: Vec::new(),
    };
    let nodes = nary::build(&root, &order, shape.fan_out, &mut writer);
    TriMeshBvh {
        nodes,
        leaves: writer.records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_fan(n: usize) -> TriMesh {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for i in 0..n {
            let x = i as f32 * 3.0;
            let base = vertices.len() as u32;
            vertices.push(Vec3::new(x, 0.0, 0.0));
            vertices.push(Vec3::new(x + 1.0, 0.0, 0.0));
            vertices.push(Vec3::new(x, 1.0, 0.0));
            indices.extend_from_slice(&[base, base + 1, base + 2, 0]);
        }
        TriMesh::new(vertices, indices)
    }

    #[test]
    fn every_face_appears_exactly_once_across_leaves() {
        let mesh = triangle_fan(17);
        let bvh = build(&mesh, BvhShape::for_target(false, 4));
        assert_eq!(bvh.leaves.len(), mesh.face_count());
        let mut seen: Vec<u32> = bvh.leaves.iter().map(TriLeafRecord::face_index).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..mesh.face_count() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn leaves_end_with_a_sentinel_flagged_record() {
        let mesh = triangle_fan(9);
        let bvh = build(&mesh, BvhShape::for_target(false, 4));

        // Walk the node array, following bit-inverted leaf child slots, and
        // confirm each leaf run's last visited record carries the sentinel.
        let mut leaf_starts = Vec::new();
        for node in &bvh.nodes {
            for &child in &node.child {
                if child < 0 {
                    leaf_starts.push(!child as u32);
                }
            }
        }
        leaf_starts.sort_unstable();
        leaf_starts.push(bvh.leaves.len() as u32);
        for window in leaf_starts.windows(2) {
            let last = &bvh.leaves[(window[1] - 1) as usize];
            assert!(last.is_leaf_end());
        }
    }

    #[test]
    fn gpu_target_uses_binary_single_triangle_leaves() {
        let mesh = triangle_fan(5);
        let shape = BvhShape::for_target(true, 1);
        let bvh = build(&mesh, shape);
        assert_eq!(shape.fan_out, 2);
        assert_eq!(bvh.leaves.len(), mesh.face_count());
    }
}
