//! Scene Database (C1).
//!
//! The in-memory binary region that the loader fills and the render device
//! later owns wholesale. See spec.md §3/§4.1 and §6 for the persisted layout.

pub mod dyn_table;
pub mod fix_table;
pub mod scene_database;

pub use dyn_table::{DynTable, LookupEntry};
pub use fix_table::FixTable;
pub use scene_database::{BoundingBox, SceneDatabase};
