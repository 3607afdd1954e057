//! Shader Generator (C4): composes per-technique DSL source from a
//! deduplicating string builder, and the global-parameter registry
//! conventions that source relies on at kernel launch time (spec.md §4.3).

pub mod builder;
pub mod registry;
pub mod technique;
pub mod techniques;

pub use builder::ShaderBuilder;
pub use technique::{
    SerializationInput, ShadowHandlingMode, Technique, TechniqueInfo, TechniqueVariant,
    TechniqueVariantInfo, VariantSelector,
};
