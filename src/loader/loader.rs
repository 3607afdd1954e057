//! Ties the shape-provider registry, BVH builder, and scene database
//! together into the per-shape load contract of spec.md §4.1
//! (`handle(ctx, accessor, name, obj)`): build the mesh and its BVH,
//! serialize both into the `shapes`/`trimesh_primbvh` tables, and record
//! plane/sphere overrides plus area-light triangle stats.

use glam::Vec3;
use rayon::prelude::*;

use crate::bvh::nary::NaryNode;
use crate::bvh::trimesh_bvh::{self, TriLeafRecord, TriMeshBvh};
use crate::database::{BoundingBox, SceneDatabase};
use crate::errors::{IgnisError, Result};
use crate::mesh::plane_shape::PlaneShape;
use crate::mesh::provider::{BvhShape, ShapeObject, ShapeProviderRegistry};
use crate::mesh::sphere_shape::SphereShape;
use crate::mesh::tri_mesh::TriMesh;

const SHAPES_TABLE: &str = "shapes";
const TRIMESH_BVH_TABLE: &str = "trimesh_primbvh";
const VEC4_ALIGN: usize = 16;

fn push_vec3_padded(buf: &mut Vec<u8>, v: Vec3) {
    buf.extend_from_slice(&v.x.to_le_bytes());
    buf.extend_from_slice(&v.y.to_le_bytes());
    buf.extend_from_slice(&v.z.to_le_bytes());
    buf.extend_from_slice(&0f32.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}
fn push_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}
fn push_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn serialize_node(buf: &mut Vec<u8>, node: &NaryNode) {
    for axis_lanes in &node.bounds {
        for &value in axis_lanes {
            push_f32(buf, value);
        }
    }
    for &child in &node.child {
        push_i32(buf, child);
    }
}

fn serialize_leaf(buf: &mut Vec<u8>, leaf: &TriLeafRecord) {
    let e1 = leaf.v2 - leaf.v0;
    let e2 = leaf.v0 - leaf.v1;
    let n = e1.cross(e2).normalize_or_zero();
    push_vec3_padded(buf, leaf.v0);
    push_vec3_padded(buf, e1);
    push_vec3_padded(buf, e2);
    push_vec3_padded(buf, n);
    push_u32(buf, leaf.prim_id);
    buf.extend_from_slice(&[0u8; 12]); // pad the trailing scalar to a full 16 B lane
}

/// Result of the parallelizable, database-independent half of loading one
/// shape (spec.md §5: "one task per shape" worker pool).
pub struct ShapeBuildResult {
    pub name: String,
    pub mesh: TriMesh,
    pub bvh: TriMeshBvh,
    pub plane: Option<PlaneShape>,
    pub sphere: Option<SphereShape>,
    pub world_bbox: BoundingBox,
}

/// Handle returned to the caller after a shape has been appended to the
/// database: its id into the `shapes` table plus the split BVH blob offset.
#[derive(Debug, Clone, Copy)]
pub struct ShapeHandle {
    pub shape_id: u32,
    pub bvh_offset: (i32, i32),
    pub world_bbox: BoundingBox,
}

/// Builds the mesh and BVH for one shape object, without touching the
/// database (the parallel, pure half of the contract).
pub fn build_shape(
    registry: &ShapeProviderRegistry,
    bvh_shape: BvhShape,
    name: &str,
    obj: &ShapeObject,
) -> Result<ShapeBuildResult> {
    let db = SceneDatabase::new();
    let loaded = registry.load(&db, name, obj)?;
    let world_bbox = loaded
        .mesh
        .vertices
        .iter()
        .fold(BoundingBox::EMPTY, |bbox, &v| bbox.extend_point(v));

    if loaded.mesh.vertices.is_empty() || loaded.mesh.indices.is_empty() {
        return Err(IgnisError::EmptyMesh {
            name: name.to_string(),
        });
    }

    let bvh = trimesh_bvh::build(&loaded.mesh, bvh_shape);
    Ok(ShapeBuildResult {
        name: name.to_string(),
        mesh: loaded.mesh,
        bvh,
        plane: loaded.plane,
        sphere: loaded.sphere,
        world_bbox,
    })
}

/// Appends an already-built shape into the database's `shapes`/
/// `trimesh_primbvh` tables (the serialized, ordered half of the contract;
/// spec.md §5's "mutex guards the final serialization step" becomes an
/// ordinary sequential loop here since the caller already holds `&mut
/// SceneDatabase` exclusively by this point).
pub fn append_shape(db: &mut SceneDatabase, result: &ShapeBuildResult) -> ShapeHandle {
    let mesh = &result.mesh;
    let shapes = db.table_mut(SHAPES_TABLE);
    let record = shapes.add_lookup(0, 0, VEC4_ALIGN);

    push_u32(record, mesh.face_count() as u32);
    push_u32(record, mesh.vertex_count() as u32);
    push_u32(record, mesh.normals.len() as u32);
    push_u32(record, mesh.texcoords.len() as u32);
    push_vec3_padded(record, result.world_bbox.min);
    push_vec3_padded(record, result.world_bbox.max);

    for &v in &mesh.vertices {
        push_vec3_padded(record, v);
    }
    for &n in &mesh.normals {
        push_vec3_padded(record, n);
    }
    for &i in &mesh.indices {
        push_u32(record, i);
    }
    for uv in &mesh.texcoords {
        push_f32(record, uv.x);
        push_f32(record, uv.y);
    }

    let shape_id = (db.table(SHAPES_TABLE).unwrap().entry_count() - 1) as u32;

    let bvh_table = db.fix_table_mut(TRIMESH_BVH_TABLE);
    let blob = bvh_table.add_entry(VEC4_ALIGN);
    let offset_start = blob.len() as u64;
    push_u32(blob, result.bvh.nodes.len() as u32);
    push_u32(blob, result.bvh.leaves.len() as u32);
    push_u32(blob, 0);
    push_u32(blob, 0);
    for node in &result.bvh.nodes {
        serialize_node(blob, node);
    }
    for leaf in &result.bvh.leaves {
        serialize_leaf(blob, leaf);
    }
    let bvh_offset = crate::database::fix_table::split_u64_to_u32(offset_start);

    db.shape_stats.push((mesh.face_count() as u32, mesh.vertex_count() as u32));

    ShapeHandle {
        shape_id,
        bvh_offset: (bvh_offset.0 as i32, bvh_offset.1 as i32),
        world_bbox: result.world_bbox,
    }
}

/// Loads every shape object into `db`, building meshes/BVHs in parallel
/// (`rayon::par_iter`, spec.md §5) and then appending them to the database
/// in input order so shape ids are deterministic and match `objects`'
/// index order.
pub fn load_shapes(
    db: &mut SceneDatabase,
    registry: &ShapeProviderRegistry,
    bvh_shape: BvhShape,
    objects: &[(String, ShapeObject)],
) -> Result<Vec<ShapeHandle>> {
    let built: Result<Vec<ShapeBuildResult>> = objects
        .par_iter()
        .map(|(name, obj)| build_shape(registry, bvh_shape, name, obj))
        .collect();
    let built = built?;

    Ok(built.iter().map(|result| append_shape(db, result)).collect())
}

/// One scene-graph instance: a shape placed in the world with a material
/// and transform, prior to entity id assignment.
pub struct EntityInput {
    pub shape_id: u32,
    pub material_id: u32,
    pub local_to_world: glam::Mat4,
    pub user_id: Option<(u32, u32)>,
    pub flags: crate::mesh::entity::EntityFlags,
}

/// Instances every entity, builds the top-level scene BVH over them, and
/// finalizes the database's world bbox (spec.md §4.2: "Scene BVH differs
/// only in leaf record shape ... and uses a non-splitting builder").
/// `shape_bboxes[shape_id]` is the local (pre-instance-transform) bbox
/// returned by [`build_shape`]/[`ShapeHandle::world_bbox`].
pub fn load_entities(
    db: &mut SceneDatabase,
    shape_bboxes: &[BoundingBox],
    entities: &[EntityInput],
    fan_out: usize,
) -> crate::bvh::scene_bvh::SceneBvh {
    let built: Vec<crate::mesh::entity::Entity> = entities
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let local_bbox = shape_bboxes[input.shape_id as usize];
            let world_bbox = local_bbox.transformed(input.local_to_world);
            db.world_bbox = db.world_bbox.extend(world_bbox);
            crate::mesh::entity::Entity {
                bbox: world_bbox,
                shape_id: input.shape_id,
                material_id: input.material_id,
                user_id: input.user_id,
                entity_id: i as u32,
                local_to_world: input.local_to_world,
                flags: input.flags,
            }
        })
        .collect();
    db.entity_to_material = built.iter().map(|e| e.material_id).collect();
    db.finalize_bounds();

    crate::bvh::scene_bvh::build(&built, fan_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::providers::builtin_registry;

    #[test]
    fn load_shapes_assigns_ids_in_input_order() {
        let registry = builtin_registry();
        let mut db = SceneDatabase::new();
        let objects = vec![
            ("cube0".to_string(), ShapeObject::new("cube")),
            ("cube1".to_string(), ShapeObject::new("cube")),
        ];
        let bvh_shape = BvhShape::for_target(false, 4);
        let handles = load_shapes(&mut db, &registry, bvh_shape, &objects).unwrap();
        assert_eq!(handles[0].shape_id, 0);
        assert_eq!(handles[1].shape_id, 1);
        assert_eq!(db.shape_stats.len(), 2);
    }

    #[test]
    fn unknown_plugin_type_fails_the_whole_batch() {
        let registry = builtin_registry();
        let mut db = SceneDatabase::new();
        let objects = vec![("mystery".to_string(), ShapeObject::new("not_a_real_shape"))];
        let bvh_shape = BvhShape::for_target(false, 4);
        assert!(load_shapes(&mut db, &registry, bvh_shape, &objects).is_err());
    }

    #[test]
    fn bvh_offsets_strictly_increase_across_shapes() {
        let registry = builtin_registry();
        let mut db = SceneDatabase::new();
        let objects = vec![
            ("a".to_string(), ShapeObject::new("cube")),
            ("b".to_string(), ShapeObject::new("icosphere")),
        ];
        let bvh_shape = BvhShape::for_target(false, 4);
        let handles = load_shapes(&mut db, &registry, bvh_shape, &objects).unwrap();
        let off0 = crate::database::fix_table::join_u32_to_u64(
            handles[0].bvh_offset.0 as u32,
            handles[0].bvh_offset.1 as u32,
        );
        let off1 = crate::database::fix_table::join_u32_to_u64(
            handles[1].bvh_offset.0 as u32,
            handles[1].bvh_offset.1 as u32,
        );
        assert!(off1 > off0);
    }

    #[test]
    fn load_entities_grows_world_bbox_and_assigns_ids() {
        use crate::mesh::entity::EntityFlags;
        use glam::{Mat4, Vec3};

        let mut db = SceneDatabase::new();
        let shape_bboxes = vec![BoundingBox {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        }];
        let entities = vec![
            EntityInput {
                shape_id: 0,
                material_id: 0,
                local_to_world: Mat4::IDENTITY,
                user_id: None,
                flags: EntityFlags::CAMERA_VISIBLE,
            },
            EntityInput {
                shape_id: 0,
                material_id: 1,
                local_to_world: Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)),
                user_id: None,
                flags: EntityFlags::CAMERA_VISIBLE,
            },
        ];
        let scene_bvh = load_entities(&mut db, &shape_bboxes, &entities, 4);
        assert_eq!(scene_bvh.leaves.len(), 2);
        assert_eq!(db.world_bbox.max.x, 11.0);
        assert_eq!(db.entity_to_material, vec![0, 1]);
    }
}
