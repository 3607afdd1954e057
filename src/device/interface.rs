//! `IDeviceInterface`-equivalent trait (spec.md §4.4), grounded on
//! `original_source/src/runtime/device/IDeviceInterface.h`: the single
//! object a device module's `ig_get_interface()` symbol hands back, from
//! which the manager obtains version/architecture metadata and vends the
//! compiler/render devices.

use crate::device::compiler::CompilerDevice;
use crate::device::render::{RenderDevice, SetupSettings};
use crate::device::target::TargetArchitecture;

/// `(major, minor)` interface version, compared against the runtime's own
/// for the module-skip check in `DeviceManager::init` (spec.md §4.4).
pub type Version = (u16, u16);

/// The runtime's own interface version; a module whose `Version` doesn't
/// match is skipped with a warning rather than loaded.
pub const RUNTIME_VERSION: Version = (0, 2);

/// Entry point a device plugin exposes through its `ig_get_interface()`
/// export. Implementations are expected to be cheap, stateless singletons —
/// the actual device state lives behind the objects this creates.
pub trait DeviceInterface: Send + Sync {
    fn version(&self) -> Version;
    fn architecture(&self) -> TargetArchitecture;
    fn create_render_device(&self, settings: &SetupSettings) -> Box<dyn RenderDevice>;
    fn create_compiler_device(&self) -> Box<dyn CompilerDevice>;
}
