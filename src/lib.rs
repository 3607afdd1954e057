#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Scene-to-kernel pipeline for a physically based ray tracer: turns parsed
//! scene objects into a `SceneDatabase` plus BVHs (the Loader), abstracts
//! over JIT-compiled render device plugins (the Device layer), and drives
//! the load/step/shutdown lifecycle (the Runtime orchestrator).

pub mod bvh;
pub mod database;
pub mod device;
pub mod errors;
pub mod loader;
pub mod logger;
pub mod mesh;
pub mod params;
pub mod runtime;
pub mod shader;

pub use database::{BoundingBox, SceneDatabase};
pub use device::compiler::{CompilerCache, CompilerDevice, CompilerSettings};
pub use device::manager::DeviceManager;
pub use device::render::RenderDevice;
pub use device::target::TargetArchitecture;
pub use errors::{IgnisError, Result};
pub use loader::{load_entities, load_shapes, LoaderContext};
pub use params::ParameterSet;
pub use runtime::{Runtime, RuntimeOptions, RuntimeState};
pub use shader::{Technique, TechniqueInfo};
