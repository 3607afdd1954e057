//! Error Types
//!
//! This module defines the error types used throughout the ray tracer's
//! scene-to-kernel pipeline.
//!
//! # Overview
//!
//! [`IgnisError`] follows the flat taxonomy of the failure-mode table: each
//! variant group corresponds to exactly one propagation rule (configuration
//! errors fail a scene load, device errors mark the scene unloaded, kernel
//! errors drop the current iteration without advancing sample counts).
//!
//! All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, IgnisError>`.

use thiserror::Error;

/// The error type returned by the loader, BVH builder, device layer and runtime.
#[derive(Error, Debug)]
pub enum IgnisError {
    // ------------------------------------------------------------------
    // Configuration errors
    // ------------------------------------------------------------------
    /// A shape, light, medium or technique plugin type has no registered handler.
    #[error("unknown plugin type '{kind}' for {category} '{name}'")]
    UnknownPluginType {
        category: &'static str,
        name: String,
        kind: String,
    },

    /// A required property was missing from a parsed scene object.
    #[error("missing required property '{property}' on '{name}'")]
    MissingProperty { name: String, property: String },

    // ------------------------------------------------------------------
    // I/O / asset errors
    // ------------------------------------------------------------------
    /// A shape provider produced zero vertices or zero indices.
    #[error("shape '{name}' produced an empty mesh")]
    EmptyMesh { name: String },

    /// An external asset file could not be read or parsed.
    #[error("failed to read asset '{path}': {reason}")]
    AssetIo { path: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // ------------------------------------------------------------------
    // Device errors
    // ------------------------------------------------------------------
    /// No device plugin on `IG_DEVICE_PATH` (or the system fallback) satisfied
    /// the requested target.
    #[error("no device module found for target {0:?}")]
    DeviceNotFound(crate::device::target::TargetArchitecture),

    /// A device module's `(major, minor)` interface version did not match ours.
    #[error("device module '{path}' has version {found:?}, runtime expects {expected:?}")]
    DeviceVersionMismatch {
        path: String,
        found: (u16, u16),
        expected: (u16, u16),
    },

    /// Loading the shared library, or resolving its `ig_get_interface` symbol, failed.
    #[error("failed to load device module '{path}': {reason}")]
    DeviceLoadFailed { path: String, reason: String },

    /// The compiler device could not find the requested kernel entry point.
    #[error("symbol '{function}' not found after compiling script (hash {hash:016x})")]
    SymbolNotFound { function: String, hash: u64 },

    /// Compilation of a generated shader source string failed.
    #[error("shader compilation failed for '{function}': {reason}")]
    CompileFailed { function: String, reason: String },

    // ------------------------------------------------------------------
    // Runtime kernel errors
    // ------------------------------------------------------------------
    /// A render device launch reported a non-zero status; the iteration is
    /// dropped and the sample count is not advanced.
    #[error("kernel launch failed for variant {variant} on iteration {iteration}: {reason}")]
    KernelLaunchFailed {
        variant: usize,
        iteration: usize,
        reason: String,
    },

    // ------------------------------------------------------------------
    // Runtime state machine
    // ------------------------------------------------------------------
    /// An operation was attempted in a state that does not permit it (e.g.
    /// loading a second scene without an intervening `shutdown()`).
    #[error("invalid runtime state: expected {expected}, found {found:?}")]
    InvalidState {
        expected: &'static str,
        found: crate::runtime::orchestrator::RuntimeState,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IgnisError>;
