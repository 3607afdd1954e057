//! Framebuffer & AOV storage (spec.md §3, §4.6, §8).
//!
//! An AOV is a named dense float buffer at the framebuffer's resolution
//! plus a per-AOV iteration count; AOV 0 (empty name) is the primary color.
//! `clear()` zeroes the buffer and resets the count; `iteration_count` must
//! increase monotonically between `clear()` calls (spec.md §3 invariant,
//! exercised by the resize/clear testable properties in §8).

use rustc_hash::FxHashMap;

pub const PRIMARY_AOV: &str = "";
pub const CHANNELS_PER_PIXEL: usize = 3;

/// One named, resolution-sized float buffer with its own accumulation
/// counter.
#[derive(Debug, Clone)]
pub struct Aov {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
    pub iteration_count: u32,
}

impl Aov {
    #[must_use]
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * CHANNELS_PER_PIXEL;
        Self {
            name: name.into(),
            width,
            height,
            data: vec![0.0; len],
            iteration_count: 0,
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.iteration_count = 0;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data = vec![0.0; width as usize * height as usize * CHANNELS_PER_PIXEL];
        self.iteration_count = 0;
    }

    /// Accumulates one iteration's worth of samples, matching the
    /// `locked_framebuffer` rule (spec.md §4.3/§4.7): a locked variant
    /// writes without advancing `iteration_count`.
    pub fn accumulate(&mut self, samples: &[f32], locked: bool) {
        debug_assert_eq!(samples.len(), self.data.len());
        for (dst, src) in self.data.iter_mut().zip(samples) {
            *dst += src;
        }
        if !locked {
            self.iteration_count += 1;
        }
    }
}

/// A scene's full set of AOVs, keyed by name (`""` = primary color).
#[derive(Debug, Clone, Default)]
pub struct Framebuffer {
    aovs: FxHashMap<String, Aov>,
    width: u32,
    height: u32,
}

impl Framebuffer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let mut fb = Self {
            aovs: FxHashMap::default(),
            width,
            height,
        };
        fb.aovs.insert(PRIMARY_AOV.to_string(), Aov::new(PRIMARY_AOV, width, height));
        fb
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Registers a non-primary AOV (e.g. `"Normals"`, `"Albedo"`,
    /// `"Denoised"`) if it doesn't already exist.
    pub fn ensure_aov(&mut self, name: &str) {
        self.aovs
            .entry(name.to_string())
            .or_insert_with(|| Aov::new(name, self.width, self.height));
    }

    #[must_use]
    pub fn aov(&self, name: &str) -> Option<&Aov> {
        self.aovs.get(name)
    }

    pub fn aov_mut(&mut self, name: &str) -> Option<&mut Aov> {
        self.aovs.get_mut(name)
    }

    /// Reallocates every AOV at the new resolution and resets all their
    /// iteration counts (spec.md §8 scenario 3: resize is never a memcpy).
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        for aov in self.aovs.values_mut() {
            aov.resize(width, height);
        }
    }

    pub fn clear(&mut self, name: &str) {
        if let Some(aov) = self.aovs.get_mut(name) {
            aov.clear();
        }
    }

    pub fn clear_all(&mut self) {
        for aov in self.aovs.values_mut() {
            aov.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_aov_exists_from_construction() {
        let fb = Framebuffer::new(4, 4);
        assert!(fb.aov(PRIMARY_AOV).is_some());
        assert_eq!(fb.aov(PRIMARY_AOV).unwrap().data.len(), 4 * 4 * 3);
    }

    #[test]
    fn resize_resets_iteration_count_and_reallocates() {
        let mut fb = Framebuffer::new(64, 64);
        fb.aov_mut(PRIMARY_AOV).unwrap().iteration_count = 5;
        fb.resize(128, 128);
        let aov = fb.aov(PRIMARY_AOV).unwrap();
        assert_eq!(aov.iteration_count, 0);
        assert_eq!(aov.data.len(), 128 * 128 * 3);
    }

    #[test]
    fn clear_then_accumulate_tracks_rendered_iterations() {
        let mut fb = Framebuffer::new(2, 2);
        fb.clear(PRIMARY_AOV);
        let samples = vec![1.0; 2 * 2 * 3];
        for _ in 0..3 {
            fb.aov_mut(PRIMARY_AOV).unwrap().accumulate(&samples, false);
        }
        assert_eq!(fb.aov(PRIMARY_AOV).unwrap().iteration_count, 3);
    }

    #[test]
    fn locked_accumulation_does_not_advance_iteration_count() {
        let mut fb = Framebuffer::new(2, 2);
        let samples = vec![1.0; 2 * 2 * 3];
        fb.aov_mut(PRIMARY_AOV).unwrap().accumulate(&samples, true);
        assert_eq!(fb.aov(PRIMARY_AOV).unwrap().iteration_count, 0);
    }
}
