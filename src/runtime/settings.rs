//! Runtime options and the samples-per-iteration heuristic (spec.md §4.7).

use crate::device::target::TargetArchitecture;

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub target: TargetArchitecture,
    pub acquire_stats: bool,
    pub debug_trace: bool,
    pub is_interactive: bool,
    pub width: u32,
    pub height: u32,
}

/// Samples-per-iteration heuristic (spec.md §4.7): CPU defaults to 2, GPU to
/// 8, at a reference 1000x1000 resolution, scaled inversely with pixel
/// count and clamped to `[1, 64]` so a tiny viewport doesn't demand an
/// absurd sample count per launch.
#[must_use]
pub fn default_spi(target: &TargetArchitecture, width: u32, height: u32) -> u32 {
    let base = if target.is_gpu() { 8.0 } else { 2.0 };
    let reference_pixels = 1000.0 * 1000.0;
    let pixels = (width as f64 * height as f64).max(1.0);
    let scaled = base * (reference_pixels / pixels);
    scaled.round().clamp(1.0, 64.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::target::{CpuArchitecture, GpuArchitecture};

    #[test]
    fn reference_resolution_matches_base_values() {
        let cpu = TargetArchitecture::Cpu(CpuArchitecture::Avx2);
        let gpu = TargetArchitecture::Gpu(GpuArchitecture::Nvidia);
        assert_eq!(default_spi(&cpu, 1000, 1000), 2);
        assert_eq!(default_spi(&gpu, 1000, 1000), 8);
    }

    #[test]
    fn smaller_resolution_scales_spi_up_but_clamps() {
        let gpu = TargetArchitecture::Gpu(GpuArchitecture::Nvidia);
        assert_eq!(default_spi(&gpu, 10, 10), 64);
    }

    #[test]
    fn larger_resolution_scales_spi_down_but_never_below_one() {
        let cpu = TargetArchitecture::Cpu(CpuArchitecture::Avx2);
        assert_eq!(default_spi(&cpu, 10000, 10000), 1);
    }
}
