//! BVH Builder (C3): binary SAH construction followed by an N-ary collapse,
//! for both per-mesh triangle BVHs and the top-level scene BVH (spec.md §4.2).

pub mod binary;
pub mod nary;
pub mod scene_bvh;
pub mod trimesh_bvh;

pub use nary::{NaryNode, MAX_FAN_OUT};
pub use scene_bvh::{EntityLeafRecord, SceneBvh};
pub use trimesh_bvh::{TriLeafRecord, TriMeshBvh};
