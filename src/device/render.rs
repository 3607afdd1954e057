//! Render Device (C7, spec.md §4.5), grounded on
//! `original_source/src/runtime/device/IRenderDevice.h`: scene upload,
//! per-(iteration, variant) kernel launch, AOV ownership, and the
//! tonemap/glare/imageinfo/bake post-passes.

use glam::{Vec2, Vec3};
use std::sync::Arc;

use crate::database::SceneDatabase;
use crate::device::denoise::Denoiser;
use crate::device::target::TargetArchitecture;
use crate::params::ParameterSet;
use crate::shader::TechniqueVariantInfo;
use crate::errors::Result;

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub range: Vec2,
}

#[derive(Debug, Clone, Copy)]
pub struct SetupSettings {
    pub target: TargetArchitecture,
    pub acquire_stats: bool,
    pub debug_trace: bool,
    pub is_interactive: bool,
}

/// The compiled kernel set for one technique variant, handed to `render()`
/// alongside the per-launch `RenderSettings`.
#[derive(Debug, Clone, Default)]
pub struct TechniqueVariantShaderSet {
    pub ray_generation: u64,
    pub miss: u64,
    pub hit_shaders: Vec<u64>,
    pub advanced_shadow_hit: Option<u64>,
    pub advanced_shadow_miss: Option<u64>,
    pub callbacks: Vec<u64>,
}

/// Everything `assignScene` needs to upload; owns a shared reference to the
/// scene database (spec.md §5: "Scene DB is owned by the orchestrator until
/// `assignScene`, after which the device holds a shared reference").
#[derive(Clone)]
pub struct SceneSettings {
    pub database: Arc<SceneDatabase>,
    pub aov_map: Vec<String>,
    pub resource_map: Vec<String>,
    pub entity_per_material: Vec<i32>,
}

#[derive(Clone)]
pub struct RenderSettings {
    /// If present, `rays.len()` stands in for `width`, `height = 1`.
    pub rays: Option<Vec<Ray>>,
    pub spi: u32,
    pub width: u32,
    pub height: u32,
    pub iteration: u64,
    pub frame: u64,
    pub user_seed: u64,
    pub info: TechniqueVariantInfo,
    pub denoise: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct AovAccessor<'a> {
    pub data: &'a [f32],
    pub iteration_count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct TonemapSettings {
    pub aov: usize,
    pub method: usize,
    pub use_gamma: bool,
    pub scale: f32,
    pub exposure_factor: f32,
    pub exposure_offset: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct GlareSettings {
    pub aov: usize,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GlareOutput {
    pub glare_value: f32,
}

#[derive(Debug, Clone)]
pub struct ImageInfoSettings {
    pub aov: usize,
    pub bins: usize,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageInfoOutput {
    pub min: f32,
    pub max: f32,
    pub average: f32,
    pub soft_min: f32,
    pub soft_max: f32,
    pub median: f32,
}

/// One-shot shader evaluation input for `bake`, e.g. precomputing a light's
/// importance texture.
pub struct ShaderOutput {
    pub function: u64,
}

/// The C7 contract (spec.md §4.5). All methods run on the orchestrator
/// thread except `get_framebuffer_for_host`/`get_framebuffer_for_device`,
/// which may run on rendering threads under the invariant that no `render`
/// call is concurrently in flight.
pub trait RenderDevice: Send {
    fn assign_scene(&mut self, settings: &SceneSettings) -> Result<()>;

    fn render(
        &mut self,
        shaders: &TechniqueVariantShaderSet,
        settings: &RenderSettings,
        parameters: &mut ParameterSet,
    ) -> Result<()>;

    fn resize(&mut self, width: u32, height: u32);

    fn release_all(&mut self);

    fn target(&self) -> TargetArchitecture;
    fn framebuffer_width(&self) -> u32;
    fn framebuffer_height(&self) -> u32;
    fn is_interactive(&self) -> bool;

    fn get_framebuffer_for_host(&mut self, name: &str) -> Option<AovAccessor<'_>>;
    fn get_framebuffer_for_device(&mut self, name: &str) -> Option<AovAccessor<'_>>;
    fn clear_framebuffer(&mut self, name: &str);
    fn clear_all_framebuffer(&mut self);

    fn tonemap(&mut self, out: &mut [u32], settings: &TonemapSettings);
    fn evaluate_glare(&mut self, out: &mut [u32], settings: &GlareSettings) -> GlareOutput;
    fn imageinfo(&mut self, settings: &ImageInfoSettings) -> ImageInfoOutput;
    fn bake(&mut self, shader: &ShaderOutput, resource_map: &[String], output: &mut [f32]);

    /// Installs a denoiser for this device to delegate to when `denoise`
    /// launches request it (spec.md §4.6). Not part of the original
    /// interface; the original resolves the denoiser backend at device
    /// build time, this core keeps the seam explicit per §9's version-skew
    /// isolation note.
    fn set_denoiser(&mut self, denoiser: Option<Box<dyn Denoiser>>);
}
