//! `ShapeProvider` trait: the open-set capability a scene's shape plugin
//! type dispatches to (spec.md §4.1, §9 design notes).

use glam::Affine3A;

use crate::database::SceneDatabase;
use crate::errors::{IgnisError, Result};
use crate::mesh::plane_shape::{PlaneShape, detect_plane};
use crate::mesh::sphere_shape::{SphereShape, detect_sphere};
use crate::mesh::tri_mesh::TriMesh;

/// A parsed shape object handed to a provider; stands in for the external
/// scene-object parser (spec.md §1: out of scope).
#[derive(Debug, Clone, Default)]
pub struct ShapeObject {
    pub plugin_type: String,
    pub properties: rustc_hash::FxHashMap<String, PropertyValue>,
    pub transform: Option<Affine3A>,
    pub flip_normals: bool,
    pub face_normals: bool,
}

impl ShapeObject {
    #[must_use]
    pub fn new(plugin_type: impl Into<String>) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn number(&self, key: &str, default: f32) -> f32 {
        match self.properties.get(key) {
            Some(PropertyValue::Number(n)) => *n,
            _ => default,
        }
    }

    #[must_use]
    pub fn integer(&self, key: &str, default: i64) -> i64 {
        match self.properties.get(key) {
            Some(PropertyValue::Integer(n)) => *n,
            Some(PropertyValue::Number(n)) => *n as i64,
            _ => default,
        }
    }

    #[must_use]
    pub fn vector3(&self, key: &str, default: glam::Vec3) -> glam::Vec3 {
        match self.properties.get(key) {
            Some(PropertyValue::Vector3(v)) => *v,
            _ => default,
        }
    }

    #[must_use]
    pub fn string(&self, key: &str) -> Option<&str> {
        match self.properties.get(key) {
            Some(PropertyValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f32),
    Integer(i64),
    Vector3(glam::Vec3),
    String(String),
    Bool(bool),
}

/// Result of loading one shape: the generated mesh plus any detected
/// analytic override.
pub struct LoadedShape {
    pub mesh: TriMesh,
    pub plane: Option<PlaneShape>,
    pub sphere: Option<SphereShape>,
}

/// Target-dependent BVH shape tie-break (spec.md §4.1): GPU uses binary BVH
/// with single-triangle leaves, narrow-SIMD CPU uses quaternary BVH with
/// 4-wide leaves, wide-SIMD CPU uses octal BVH with 4-wide leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BvhShape {
    pub fan_out: usize,
    pub leaf_width: usize,
}

impl BvhShape {
    #[must_use]
    pub fn for_target(is_gpu: bool, simd_lanes: usize) -> Self {
        if is_gpu {
            Self {
                fan_out: 2,
                leaf_width: 1,
            }
        } else if simd_lanes < 8 {
            Self {
                fan_out: 4,
                leaf_width: 4,
            }
        } else {
            Self {
                fan_out: 8,
                leaf_width: 4,
            }
        }
    }
}

/// Converts a parsed shape object into a `TriMesh`, runs the common
/// normal/transform/bbox pipeline, and attempts plane/sphere collapse.
///
/// This is the open-set capability trait: closed off providers (the
/// built-ins in [`super::providers`]) all implement it; external readers
/// (OBJ/PLY/Mitsuba/serialized) plug in the same way without needing a
/// change to the loader.
pub trait ShapeProvider: Send + Sync {
    /// The plugin type strings this provider answers to (e.g. `"triangle"`,
    /// `"rectangle"`).
    fn plugin_types(&self) -> &'static [&'static str];

    /// Produces the raw mesh for `obj`, before the common post-processing
    /// pipeline (normals/transform/bbox/plane-sphere) runs.
    fn build_mesh(&self, name: &str, obj: &ShapeObject) -> Result<TriMesh>;
}

/// Runs the common post-processing contract of spec.md §4.1: flip-normals,
/// face-normals-as-vertex-normals, world transform, bbox, plane/sphere
/// detection — then appends to the database (left to the caller, see
/// `loader::loader::load_shape`).
pub fn finish_shape(name: &str, obj: &ShapeObject, mut mesh: TriMesh) -> Result<LoadedShape> {
    if mesh.is_empty() {
        return Err(IgnisError::EmptyMesh {
            name: name.to_string(),
        });
    }

    if obj.flip_normals {
        mesh.flip_normals();
    }
    if obj.face_normals {
        mesh.use_face_normals();
    } else if !mesh.normals.is_empty() {
        mesh.fix_normals();
    }
    if let Some(transform) = obj.transform {
        mesh.transform(transform);
    }

    if mesh.is_empty() {
        return Err(IgnisError::EmptyMesh {
            name: name.to_string(),
        });
    }
    mesh.validate().map_err(|_| IgnisError::EmptyMesh {
        name: name.to_string(),
    })?;

    let plane = detect_plane(&mesh);
    let sphere = if plane.is_none() {
        detect_sphere(&mesh)
    } else {
        None
    };

    Ok(LoadedShape {
        mesh,
        plane,
        sphere,
    })
}

/// A registry of [`ShapeProvider`]s keyed by plugin type string (open set,
/// hence trait objects per spec.md §9).
#[derive(Default)]
pub struct ShapeProviderRegistry {
    providers: rustc_hash::FxHashMap<&'static str, std::sync::Arc<dyn ShapeProvider>>,
}

impl ShapeProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: std::sync::Arc<dyn ShapeProvider>) {
        for &kind in provider.plugin_types() {
            self.providers.insert(kind, provider.clone());
        }
    }

    /// Also writes directly into `_db` in a future extension point; kept as
    /// a parameter so registries can eventually cache per-database state.
    pub fn load(&self, _db: &SceneDatabase, name: &str, obj: &ShapeObject) -> Result<LoadedShape> {
        let provider =
            self.providers
                .get(obj.plugin_type.as_str())
                .ok_or_else(|| IgnisError::UnknownPluginType {
                    category: "shape",
                    name: name.to_string(),
                    kind: obj.plugin_type.clone(),
                })?;
        let mesh = provider.build_mesh(name, obj)?;
        finish_shape(name, obj, mesh)
    }
}
