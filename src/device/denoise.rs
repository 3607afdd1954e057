//! Denoiser delegation (spec.md §4.6/§9), isolating the two incompatible
//! third-party denoiser major versions behind a narrow trait so the render
//! device only ever holds a boxed instance, never a version-specific type.

use crate::device::render::RenderDevice;
use crate::errors::Result;

/// A device-colocated or host-roundtrip denoiser filtering the `Normals`/
/// `Albedo` AOVs into `Denoised`. `filter` is given the render device so a
/// device-device backend can operate without a host copy, while a CPU
/// backend copies the auxiliary AOVs out and the result back in.
pub trait Denoiser: Send {
    fn filter(&mut self, device: &mut dyn RenderDevice) -> Result<()>;
}
