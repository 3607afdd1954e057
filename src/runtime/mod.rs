//! Runtime Orchestrator (C8, spec.md §4.7): the top-level `load -> step ->
//! shutdown` lifecycle tying the loader, shader generator, compiler, and
//! render device together.

pub mod orchestrator;
pub mod settings;

pub use orchestrator::{Runtime, RuntimeState};
pub use settings::{default_spi, RuntimeOptions};
