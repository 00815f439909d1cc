//! Audio module for the default playback device.
//!
//! The device model, change notifications and the state observer are
//! platform neutral. The Core Audio backend (enumeration, the default-device
//! facade, volume control and default switching) is Windows only.

#[cfg(windows)]
pub mod default_device;
pub mod device;
#[cfg(windows)]
pub mod enumerator;
pub mod notifications;
pub mod observer;
#[cfg(windows)]
pub mod policy;
#[cfg(windows)]
pub mod volume;

pub use device::{
    volume_to_percent, AudioDeviceManager, AudioError, DeviceSnapshot, VirtualDefaultDevice,
};
pub use notifications::{Subscribers, Subscription};
pub use observer::DeviceStateObserver;

#[cfg(windows)]
pub use enumerator::{ComGuard, DeviceEnumerator, WindowsDeviceManager};
