//! Parameter Set & AOV Registry (C9): typed user-level parameters
//! propagated into kernels, and named AOV storage with per-AOV iteration
//! counts (spec.md §3, §4.6, §4.9).

pub mod aov;
pub mod parameter_set;

pub use aov::{Aov, Framebuffer, CHANNELS_PER_PIXEL, PRIMARY_AOV};
pub use parameter_set::ParameterSet;
