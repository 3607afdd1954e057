//! Built-in shape providers, grounded on
//! `original_source/src/runtime/shape/TriMeshProvider.cpp`'s `setup_mesh_*`
//! dispatch (spec.md §4.1: `triangle`, `rectangle`, `cube`, `icosphere`,
//! `uvsphere`, `cylinder`, `cone`, `disk`, `external`).

mod basic;
mod revolve;

pub use basic::{CubeProvider, RectangleProvider, TriangleProvider};
pub use revolve::{ConeProvider, CylinderProvider, DiskProvider, IcoSphereProvider, UvSphereProvider};

use std::sync::Arc;

use crate::errors::{IgnisError, Result};
use crate::mesh::provider::{ShapeObject, ShapeProvider, ShapeProviderRegistry};
use crate::mesh::tri_mesh::TriMesh;

/// Registers every built-in provider. External mesh formats (obj/ply/
/// mitsuba/serialized) are out of scope (spec.md §1) — `ExternalProvider`
/// below only performs the extension-based dispatch and error reporting the
/// spec calls for, delegating the actual decode to an injected reader.
#[must_use]
pub fn builtin_registry() -> ShapeProviderRegistry {
    let mut registry = ShapeProviderRegistry::new();
    registry.register(Arc::new(TriangleProvider));
    registry.register(Arc::new(RectangleProvider));
    registry.register(Arc::new(CubeProvider));
    registry.register(Arc::new(IcoSphereProvider));
    registry.register(Arc::new(UvSphereProvider));
    registry.register(Arc::new(CylinderProvider));
    registry.register(Arc::new(ConeProvider));
    registry.register(Arc::new(DiskProvider));
    registry
}

/// A mesh file reader for one of the out-of-scope external formats (OBJ,
/// PLY, Mitsuba serialized). Implementations live outside this core; the
/// provider below only picks the reader by file extension.
pub trait ExternalMeshReader: Send + Sync {
    fn extensions(&self) -> &'static [&'static str];
    fn read(&self, path: &str) -> Result<TriMesh>;
}

/// Dispatches to an [`ExternalMeshReader`] by the `filename` property's
/// extension, matching `setup_mesh_external`.
pub struct ExternalProvider {
    readers: Vec<Arc<dyn ExternalMeshReader>>,
}

impl ExternalProvider {
    #[must_use]
    pub fn new(readers: Vec<Arc<dyn ExternalMeshReader>>) -> Self {
        Self { readers }
    }
}

impl ShapeProvider for ExternalProvider {
    fn plugin_types(&self) -> &'static [&'static str] {
        &["external", "obj", "ply", "mitsuba"]
    }

    fn build_mesh(&self, name: &str, obj: &ShapeObject) -> Result<TriMesh> {
        let filename = obj.string("filename").ok_or_else(|| IgnisError::MissingProperty {
            name: name.to_string(),
            property: "filename".to_string(),
        })?;
        let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
        let reader = self
            .readers
            .iter()
            .find(|r| r.extensions().contains(&ext.as_str()))
            .ok_or_else(|| IgnisError::UnknownPluginType {
                category: "external mesh extension",
                name: name.to_string(),
                kind: ext.clone(),
            })?;
        let mesh = reader.read(filename)?;
        if mesh.is_empty() {
            return Err(IgnisError::EmptyMesh {
                name: name.to_string(),
            });
        }
        Ok(mesh)
    }
}
