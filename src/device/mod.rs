//! Device abstraction (C5/C6/C7, spec.md §4.4–§4.6): the shared-library
//! boundary between this core and an external compiler/render backend.
//! `original_source/src/runtime/device/` is the grounding for every
//! submodule here.

pub mod compiler;
pub mod denoise;
pub mod interface;
pub mod manager;
pub mod render;
pub mod shared_library;
pub mod target;

pub use compiler::{CompiledFunction, CompilerCache, CompilerDevice, CompilerSettings};
pub use denoise::Denoiser;
pub use interface::{DeviceInterface, Version, RUNTIME_VERSION};
pub use manager::DeviceManager;
pub use render::{
    AovAccessor, GlareOutput, GlareSettings, ImageInfoOutput, ImageInfoSettings, Ray, RenderDevice,
    RenderSettings, SceneSettings, SetupSettings, ShaderOutput, TechniqueVariantShaderSet,
    TonemapSettings,
};
pub use shared_library::SharedLibrary;
pub use target::{CpuArchitecture, GpuArchitecture, TargetArchitecture};
