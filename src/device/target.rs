//! Target architecture identifiers (spec.md §4.4), grounded on
//! `original_source/src/device/Interface.cpp`'s `getArchitecture()` switch
//! (CPU builds return a `CPUArchitecture`, GPU builds a `GPUArchitecture`)
//! and `src/backend/runtime/Target.h` / `src/generator/Target.h`'s
//! CPU-SIMD-width and GPU-vendor target lists.

use std::fmt;

/// CPU SIMD width a device module was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuArchitecture {
    Generic,
    Single,
    Sse42,
    Avx,
    Avx2,
    Avx512,
    Asimd,
    X86,
    Arm,
}

/// GPU vendor/backend a device module was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuArchitecture {
    Nvidia,
    AmdHsa,
    AmdPal,
    Intel,
}

/// The architecture a device module advertises through `ig_get_interface()`,
/// matching `DeviceManager::getDevice`'s lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetArchitecture {
    Cpu(CpuArchitecture),
    Gpu(GpuArchitecture),
}

impl TargetArchitecture {
    #[must_use]
    pub fn is_cpu(&self) -> bool {
        matches!(self, Self::Cpu(_))
    }

    #[must_use]
    pub fn is_gpu(&self) -> bool {
        matches!(self, Self::Gpu(_))
    }
}

impl fmt::Display for TargetArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu(arch) => write!(f, "cpu:{arch:?}"),
            Self::Gpu(arch) => write!(f, "gpu:{arch:?}"),
        }
    }
}
