//! Technique abstraction (spec.md §3, §4.3): the rendering algorithm that
//! determines which DSL shaders get generated for a scene.
//!
//! `Technique` is a closed set (`path`, `direct`, `ambient-occlusion`,
//! `sun-guided-path`) dispatched through one capability trait rather than a
//! tagged enum, following spec.md §9's redesign note: these are exactly the
//! "closed but extensible enough to warrant dynamic dispatch" case the
//! original's `Technique` base class exists for.

use crate::loader::context::LoaderContext;
use crate::params::ParameterSet;
use crate::shader::builder::ShaderBuilder;

/// How a variant's hit/miss shaders handle shadow rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowHandlingMode {
    #[default]
    Simple,
    /// Needs a dedicated advanced-shadow hit/miss shader pair, e.g. for MIS
    /// weight bookkeeping across multiple light samples.
    Advanced,
}

/// Per-variant metadata the shader generator and runtime orchestrator both
/// need: framebuffer sizing, payload layout, and AOV wiring.
#[derive(Debug, Clone)]
pub struct TechniqueVariantInfo {
    /// `None` means "use the framebuffer's own width/height".
    pub width_height_override: Option<(u32, u32)>,
    pub samples_per_iteration_override: Option<u32>,
    /// When true, this variant's launches do not advance the framebuffer's
    /// accumulated iteration count (e.g. a warm-up/precompute variant).
    pub locked_framebuffer: bool,
    pub uses_lights: bool,
    pub shadow_handling_mode: ShadowHandlingMode,
    pub primary_payload_count: u32,
    pub emitter_payload_initializer: String,
}

impl Default for TechniqueVariantInfo {
    fn default() -> Self {
        Self {
            width_height_override: None,
            samples_per_iteration_override: None,
            locked_framebuffer: false,
            uses_lights: false,
            shadow_handling_mode: ShadowHandlingMode::Simple,
            primary_payload_count: 0,
            emitter_payload_initializer: "make_simple_payload_initializer(init_raypayload)".to_string(),
        }
    }
}

/// What [`Technique::info`] returns: the AOVs the technique contributes and
/// one [`TechniqueVariantInfo`] per variant index.
#[derive(Debug, Clone, Default)]
pub struct TechniqueInfo {
    pub enabled_aovs: Vec<String>,
    pub variants: Vec<TechniqueVariantInfo>,
}

/// The generated DSL source for one variant, before compilation (spec.md
/// §3's `TechniqueVariant`). `hit_shaders` is indexed by material id.
#[derive(Debug, Clone, Default)]
pub struct TechniqueVariant {
    pub ray_generation: String,
    pub miss: String,
    pub hit_shaders: Vec<String>,
    pub advanced_shadow_hit: Option<String>,
    pub advanced_shadow_miss: Option<String>,
    pub callbacks: Vec<String>,
}

/// Picks the variant indices active in a given iteration; `None` (the
/// default for techniques with a single variant) means "always variant 0".
pub type VariantSelector = Box<dyn Fn(u32) -> Vec<usize> + Send + Sync>;

/// Input to [`Technique::generate_body`]: the variant being generated, the
/// loader context it can pull scene-wide data from (bbox, parameters), and
/// the builder to append ray-generation statements to.
pub struct SerializationInput<'a> {
    pub variant: usize,
    pub context: &'a LoaderContext,
    pub global_parameters: &'a mut ParameterSet,
}

/// The rendering-algorithm capability every concrete technique implements.
pub trait Technique: Send + Sync {
    fn name(&self) -> &'static str;

    /// Enumerates this technique's variants and their metadata. Called once
    /// per load, before any shader source is generated.
    fn info(&self, ctx: &LoaderContext) -> TechniqueInfo;

    /// Appends this technique's ray-generation statements (renderer
    /// construction, light selection, AOV wiring) to `builder`.
    fn generate_body(&self, input: &mut SerializationInput<'_>, builder: &mut ShaderBuilder);

    /// `None` unless the technique switches behavior across iterations
    /// (e.g. a warm-up pass before the main loop).
    fn variant_selector(&self) -> Option<VariantSelector> {
        None
    }
}
