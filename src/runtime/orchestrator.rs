//! Runtime Orchestrator (C8, spec.md §4.7): owns the device/compiler pair,
//! drives the load → compile → render lifecycle, and exposes the
//! `step`/`trace`/`reset`/`setParameter` surface the host application calls.

use std::fmt;
use std::sync::Arc;

use glam::Vec3;

use crate::database::{BoundingBox, SceneDatabase};
use crate::device::compiler::{CompilerCache, CompilerDevice, CompilerSettings};
use crate::device::render::{
    AovAccessor, RenderDevice, RenderSettings, SceneSettings, TechniqueVariantShaderSet,
};
use crate::device::target::TargetArchitecture;
use crate::errors::{IgnisError, Result};
use crate::loader::context::LoaderContext;
use crate::params::ParameterSet;
use crate::runtime::settings::{default_spi, RuntimeOptions};
use crate::shader::builder::ShaderBuilder;
use crate::shader::registry::Specialization;
use crate::shader::technique::{SerializationInput, Technique, TechniqueInfo};

/// Lifecycle state (spec.md §4.7): `Uninitialized -> Ready -> Stepping* ->
/// Shutdown`, with `shutdown()` being the required intervening step before a
/// second scene can be loaded (after which the runtime is `Ready` again).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Uninitialized,
    Ready,
    Stepping,
    Shutdown,
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(target_arch = "x86_64")]
fn enable_flush_to_zero() {
    use std::arch::x86_64::{_mm_getcsr, _mm_setcsr, _MM_DENORMALS_ZERO_ON, _MM_FLUSH_ZERO_ON};
    // SAFETY: MXCSR is a per-thread CPU control register; setting FTZ/DAZ
    // only affects how subnormal floats are handled in this thread's SSE
    // math and has no memory-safety implications.
    unsafe {
        let csr = _mm_getcsr();
        _mm_setcsr(csr | _MM_FLUSH_ZERO_ON | _MM_DENORMALS_ZERO_ON);
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn enable_flush_to_zero() {}

/// One technique variant's compiled shader set plus the metadata the
/// orchestrator needs to drive it (sample count, locking, selector input).
struct CompiledVariant {
    shaders: TechniqueVariantShaderSet,
    locked: bool,
    spi: u32,
}

pub struct Runtime {
    state: RuntimeState,
    options: RuntimeOptions,
    device: Box<dyn RenderDevice>,
    compiler: CompilerCache<Box<dyn CompilerDevice>>,
    technique: Box<dyn Technique>,
    technique_info: TechniqueInfo,
    variants: Vec<CompiledVariant>,
    global_parameters: ParameterSet,
    scene_loaded: bool,
    iteration: u64,
    frame: u64,
    sample_count: u64,
}

impl Runtime {
    /// Constructor (spec.md §4.7): the caller already resolved the target
    /// and obtained `device`/`compiler` from a `DeviceManager` (or a test
    /// double); this just wires them together and enables FTZ on x86.
    pub fn new(
        options: RuntimeOptions,
        device: Box<dyn RenderDevice>,
        compiler: Box<dyn CompilerDevice>,
        technique: Box<dyn Technique>,
    ) -> Self {
        if !options.target.is_gpu() {
            enable_flush_to_zero();
        }
        Self {
            state: RuntimeState::Ready,
            options,
            device,
            compiler: CompilerCache::new(compiler),
            technique,
            technique_info: TechniqueInfo::default(),
            variants: Vec::new(),
            global_parameters: ParameterSet::new(),
            scene_loaded: false,
            iteration: 0,
            frame: 0,
            sample_count: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> RuntimeState {
        self.state
    }

    fn require_state_for_load(&self) -> Result<()> {
        if self.scene_loaded {
            return Err(IgnisError::InvalidState {
                expected: "Ready or Shutdown (no scene currently loaded)",
                found: self.state,
            });
        }
        Ok(())
    }

    /// Loads a scene's database plus the active technique's compiled shader
    /// variants (spec.md §4.7 steps 3-5). `world_bbox`/`spi_override` stand
    /// in for the parsed film/camera settings the external scene parser
    /// would otherwise supply.
    pub fn load_scene(
        &mut self,
        database: SceneDatabase,
        aov_map: Vec<String>,
        resource_map: Vec<String>,
        entity_per_material: Vec<i32>,
        world_bbox: BoundingBox,
        spi_override: Option<u32>,
    ) -> Result<()> {
        self.require_state_for_load()?;

        let ctx = LoaderContext::new(world_bbox, Specialization::Enabled);
        self.technique_info = self.technique.info(&ctx);

        let mut compiled = Vec::with_capacity(self.technique_info.variants.len());
        for (idx, variant_info) in self.technique_info.variants.iter().enumerate() {
            let mut input = SerializationInput {
                variant: idx,
                context: &ctx,
                global_parameters: &mut self.global_parameters,
            };
            let mut builder = ShaderBuilder::new();
            self.technique.generate_body(&mut input, &mut builder);
            let source = builder.to_source();

            let settings = CompilerSettings::default();
            let ray_generation = self
                .compiler
                .compile(&settings, &source, "ray_generation")
                .map_err(|e| IgnisError::CompileFailed {
                    function: "ray_generation".to_string(),
                    reason: e.to_string(),
                })?
                .0;
            let miss = self
                .compiler
                .compile(&settings, &source, "miss_shader")
                .map_err(|e| IgnisError::CompileFailed {
                    function: "miss_shader".to_string(),
                    reason: e.to_string(),
                })?
                .0;

            let spi = spi_override.unwrap_or_else(|| {
                variant_info
                    .samples_per_iteration_override
                    .unwrap_or_else(|| default_spi(&self.options.target, self.options.width, self.options.height))
            });

            compiled.push(CompiledVariant {
                shaders: TechniqueVariantShaderSet {
                    ray_generation,
                    miss,
                    hit_shaders: Vec::new(),
                    advanced_shadow_hit: None,
                    advanced_shadow_miss: None,
                    callbacks: Vec::new(),
                },
                locked: variant_info.locked_framebuffer,
                spi,
            });
        }

        self.device.assign_scene(&SceneSettings {
            database: Arc::new(database),
            aov_map,
            resource_map,
            entity_per_material,
        })?;
        self.device.clear_all_framebuffer();

        self.variants = compiled;
        self.scene_loaded = true;
        self.iteration = 0;
        self.frame = 0;
        self.sample_count = 0;
        self.state = RuntimeState::Ready;
        Ok(())
    }

    fn active_variants(&self) -> Vec<usize> {
        self.technique
            .variant_selector()
            .map(|select| select(self.iteration as u32))
            .unwrap_or_else(|| (0..self.variants.len()).collect())
    }

    /// Advances one iteration: runs every active variant's `render()` once
    /// (spec.md §4.7 `step()`). Per-launch failures are logged and drop the
    /// iteration rather than propagating (spec.md §4.5 failure semantics).
    pub fn step(&mut self) -> Result<()> {
        self.trace_or_step(None)
    }

    /// Like [`Runtime::step`] but launches a user-supplied ray stream
    /// instead of the technique's own ray generation pattern.
    pub fn trace(&mut self, rays: Vec<crate::device::render::Ray>) -> Result<()> {
        self.trace_or_step(Some(rays))
    }

    fn trace_or_step(&mut self, rays: Option<Vec<crate::device::render::Ray>>) -> Result<()> {
        if !self.scene_loaded {
            return Err(IgnisError::InvalidState {
                expected: "Ready with a loaded scene",
                found: self.state,
            });
        }

        self.iteration += 1;
        self.frame += 1;
        self.state = RuntimeState::Stepping;

        let (width, height) = if let Some(rays) = &rays {
            (rays.len() as u32, 1)
        } else {
            (self.options.width, self.options.height)
        };

        for idx in self.active_variants() {
            let Some(variant) = self.variants.get(idx) else {
                continue;
            };
            let settings = RenderSettings {
                rays: rays.clone(),
                spi: variant.spi,
                width,
                height,
                iteration: self.iteration,
                frame: self.frame,
                user_seed: 0,
                info: self.technique_info.variants[idx].clone(),
                denoise: false,
            };
            let locked = variant.locked;
            let spi = variant.spi;
            if let Err(e) = self.device.render(&variant.shaders, &settings, &mut self.global_parameters) {
                log::error!("kernel launch failed for variant {idx} on iteration {}: {e}", self.iteration);
                continue;
            }
            if !locked {
                self.sample_count += u64::from(spi);
            }
        }
        Ok(())
    }

    /// Clears every AOV and resets the iteration/frame counters without
    /// releasing the loaded scene or compiled shaders.
    pub fn reset(&mut self) {
        self.device.clear_all_framebuffer();
        self.iteration = 0;
        self.frame = 0;
        self.sample_count = 0;
    }

    /// Changes the framebuffer resolution. Per spec.md §4.7/§8 scenario 3,
    /// a resize always clears every AOV's accumulated samples (a changed
    /// resolution can never reuse the old iteration count).
    pub fn resize(&mut self, width: u32, height: u32) {
        self.options.width = width;
        self.options.height = height;
        self.device.resize(width, height);
        self.reset();
    }

    pub fn set_parameter_int(&mut self, name: &str, value: i32) {
        self.global_parameters.set_int(name, value);
    }

    pub fn set_parameter_float(&mut self, name: &str, value: f32) {
        self.global_parameters.set_float(name, value);
    }

    pub fn set_parameter_vec3(&mut self, name: &str, value: Vec3) {
        self.global_parameters.set_vec3(name, value.to_array());
    }

    /// Unloads the current scene's compiled shaders and returns to the
    /// state a fresh `load_scene` call expects (spec.md §4.7: "No scene may
    /// be loaded twice without an intervening `shutdown()`").
    pub fn shutdown(&mut self) {
        self.device.release_all();
        self.variants.clear();
        self.scene_loaded = false;
        self.state = RuntimeState::Shutdown;
    }

    #[must_use]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    #[must_use]
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    #[must_use]
    pub fn target(&self) -> TargetArchitecture {
        self.options.target
    }

    /// Reads back a named AOV for the host application (spec.md §4.7/§6).
    pub fn get_framebuffer_for_host(&mut self, name: &str) -> Option<AovAccessor<'_>> {
        self.device.get_framebuffer_for_host(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::denoise::Denoiser;
    use crate::device::render::{
        AovAccessor, GlareOutput, GlareSettings, ImageInfoOutput, ImageInfoSettings, ShaderOutput,
        TonemapSettings,
    };
    use crate::device::target::{CpuArchitecture, TargetArchitecture};
    use crate::shader::techniques::PathTechnique;

    struct MockRenderDevice {
        width: u32,
        height: u32,
        render_calls: u32,
        assigned: bool,
    }

    impl RenderDevice for MockRenderDevice {
        fn assign_scene(&mut self, _settings: &SceneSettings) -> Result<()> {
            self.assigned = true;
            Ok(())
        }

        fn render(
            &mut self,
            _shaders: &TechniqueVariantShaderSet,
            _settings: &RenderSettings,
            _parameters: &mut ParameterSet,
        ) -> Result<()> {
            self.render_calls += 1;
            Ok(())
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.width = width;
            self.height = height;
        }

        fn release_all(&mut self) {
            self.assigned = false;
        }

        fn target(&self) -> TargetArchitecture {
            TargetArchitecture::Cpu(CpuArchitecture::Avx2)
        }
        fn framebuffer_width(&self) -> u32 {
            self.width
        }
        fn framebuffer_height(&self) -> u32 {
            self.height
        }
        fn is_interactive(&self) -> bool {
            false
        }

        fn get_framebuffer_for_host(&mut self, _name: &str) -> Option<AovAccessor<'_>> {
            None
        }
        fn get_framebuffer_for_device(&mut self, _name: &str) -> Option<AovAccessor<'_>> {
            None
        }
        fn clear_framebuffer(&mut self, _name: &str) {}
        fn clear_all_framebuffer(&mut self) {}

        fn tonemap(&mut self, _out: &mut [u32], _settings: &TonemapSettings) {}
        fn evaluate_glare(&mut self, _out: &mut [u32], _settings: &GlareSettings) -> GlareOutput {
            GlareOutput::default()
        }
        fn imageinfo(&mut self, _settings: &ImageInfoSettings) -> ImageInfoOutput {
            ImageInfoOutput::default()
        }
        fn bake(&mut self, _shader: &ShaderOutput, _resource_map: &[String], _output: &mut [f32]) {}

        fn set_denoiser(&mut self, _denoiser: Option<Box<dyn Denoiser>>) {}
    }

    struct MockCompilerDevice {
        next_handle: u64,
    }

    impl CompilerDevice for MockCompilerDevice {
        fn compile(&mut self, _settings: &CompilerSettings, _script: &str, _function_name: &str) -> Result<crate::device::compiler::CompiledFunction> {
            self.next_handle += 1;
            Ok(crate::device::compiler::CompiledFunction(self.next_handle))
        }
    }

    fn runtime() -> Runtime {
        let options = RuntimeOptions {
            target: TargetArchitecture::Cpu(CpuArchitecture::Avx2),
            acquire_stats: false,
            debug_trace: false,
            is_interactive: false,
            width: 64,
            height: 64,
        };
        Runtime::new(
            options,
            Box::new(MockRenderDevice {
                width: 64,
                height: 64,
                render_calls: 0,
                assigned: false,
            }),
            Box::new(MockCompilerDevice { next_handle: 0 }),
            Box::new(PathTechnique::new(8, 2, 0.0, true)),
        )
    }

    #[test]
    fn fresh_runtime_starts_ready() {
        assert_eq!(runtime().state(), RuntimeState::Ready);
    }

    #[test]
    fn step_without_a_loaded_scene_errors() {
        let mut rt = runtime();
        assert!(rt.step().is_err());
    }

    #[test]
    fn load_then_step_transitions_to_stepping_and_advances_iteration() {
        let mut rt = runtime();
        rt.load_scene(SceneDatabase::new(), vec![], vec![], vec![], BoundingBox::EMPTY, Some(4))
            .unwrap();
        assert_eq!(rt.state(), RuntimeState::Ready);
        rt.step().unwrap();
        assert_eq!(rt.state(), RuntimeState::Stepping);
        assert_eq!(rt.iteration(), 1);
        rt.step().unwrap();
        assert_eq!(rt.iteration(), 2);
    }

    #[test]
    fn loading_a_second_scene_without_shutdown_fails() {
        let mut rt = runtime();
        rt.load_scene(SceneDatabase::new(), vec![], vec![], vec![], BoundingBox::EMPTY, Some(4))
            .unwrap();
        let err = rt
            .load_scene(SceneDatabase::new(), vec![], vec![], vec![], BoundingBox::EMPTY, Some(4))
            .unwrap_err();
        assert!(matches!(err, IgnisError::InvalidState { .. }));
    }

    #[test]
    fn shutdown_allows_reloading_a_scene() {
        let mut rt = runtime();
        rt.load_scene(SceneDatabase::new(), vec![], vec![], vec![], BoundingBox::EMPTY, Some(4))
            .unwrap();
        rt.shutdown();
        assert_eq!(rt.state(), RuntimeState::Shutdown);
        rt.load_scene(SceneDatabase::new(), vec![], vec![], vec![], BoundingBox::EMPTY, Some(4))
            .unwrap();
        assert_eq!(rt.state(), RuntimeState::Ready);
    }

    #[test]
    fn reset_zeroes_iteration_counter() {
        let mut rt = runtime();
        rt.load_scene(SceneDatabase::new(), vec![], vec![], vec![], BoundingBox::EMPTY, Some(4))
            .unwrap();
        rt.step().unwrap();
        rt.reset();
        assert_eq!(rt.iteration(), 0);
        assert_eq!(rt.sample_count(), 0);
    }

    #[test]
    fn step_advances_sample_count_by_the_variant_spi() {
        let mut rt = runtime();
        rt.load_scene(SceneDatabase::new(), vec![], vec![], vec![], BoundingBox::EMPTY, Some(4))
            .unwrap();
        rt.step().unwrap();
        assert_eq!(rt.sample_count(), 4);
        rt.step().unwrap();
        assert_eq!(rt.sample_count(), 8);
    }
}
