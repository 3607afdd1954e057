//! Scene Loader (C1, spec.md §4.1): turns parsed shape/entity objects into a
//! populated `SceneDatabase` plus a scene BVH, threading `LoaderContext`
//! through shape and technique construction along the way.

pub mod context;
pub mod loader;

pub use context::LoaderContext;
pub use loader::{build_shape, append_shape, load_entities, load_shapes, EntityInput, ShapeBuildResult, ShapeHandle};
