//! Scene Loader & Shape Providers (C1/C2, spec.md §4.1): parsed shape
//! objects become `TriMesh`es through a `ShapeProvider` registry, with
//! plane/sphere analytic collapse and LZ4 compressed on-disk encoding.

pub mod compress;
pub mod entity;
pub mod plane_shape;
pub mod provider;
pub mod providers;
pub mod sphere_shape;
pub mod tri_mesh;

pub use entity::{Entity, EntityFlags};
pub use plane_shape::PlaneShape;
pub use provider::{
    finish_shape, BvhShape, LoadedShape, PropertyValue, ShapeObject, ShapeProvider,
    ShapeProviderRegistry,
};
pub use sphere_shape::SphereShape;
pub use tri_mesh::{TriMesh, TriMeshInvariantError};
