//! Audio device data models.
//!
//! Defines the read-only device projection the tray works with, the
//! capabilities it needs from the audio subsystem, and the audio error type.

use super::notifications::Subscription;
use std::rc::Rc;
use thiserror::Error;

/// A render device as seen at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    /// Unique Windows device ID (opaque string from IMMDevice::GetId)
    pub id: String,

    /// Human-readable device name (from device properties)
    pub display_name: String,

    /// Master volume as percentage (0-100)
    pub volume_percent: u8,

    /// Current mute state
    pub is_muted: bool,

    /// Whether the device is currently present
    pub is_present: bool,
}

impl DeviceSnapshot {
    /// Create a present, unmuted device at full volume.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            volume_percent: 100,
            is_muted: false,
            is_present: true,
        }
    }

    pub fn with_volume(mut self, percent: u8) -> Self {
        self.volume_percent = percent.min(100);
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.is_muted = muted;
        self
    }

    /// Snapshot for "no default device".
    pub fn absent() -> Self {
        Self {
            id: String::new(),
            display_name: String::new(),
            volume_percent: 0,
            is_muted: false,
            is_present: false,
        }
    }
}

/// Convert a volume scalar (0.0 to 1.0) to a rounded percentage.
pub fn volume_to_percent(level: f32) -> u8 {
    (level.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Facade over "whatever the default playback device is right now".
///
/// Always available, even when no physical device is present, so observers
/// never have to handle a missing object.
pub trait VirtualDefaultDevice {
    /// ID of the current default device, `None` if there is none.
    fn id(&self) -> Option<String>;

    fn display_name(&self) -> String;

    fn volume_percent(&self) -> u8;

    fn is_muted(&self) -> bool;

    fn set_muted(&self, muted: bool) -> Result<(), AudioError>;

    fn is_present(&self) -> bool;

    /// Register for property-change notifications.
    fn subscribe(&self, listener: Box<dyn Fn()>) -> Subscription;

    /// Returns false if the subscription was unknown.
    fn unsubscribe(&self, subscription: Subscription) -> bool;

    /// Current state as a snapshot.
    fn snapshot(&self) -> DeviceSnapshot {
        if !self.is_present() {
            return DeviceSnapshot::absent();
        }
        DeviceSnapshot {
            id: self.id().unwrap_or_default(),
            display_name: self.display_name(),
            volume_percent: self.volume_percent(),
            is_muted: self.is_muted(),
            is_present: true,
        }
    }
}

/// Device management capability of the audio subsystem.
pub trait AudioDeviceManager {
    /// The default-device facade. Repeated calls return the same facade.
    fn virtual_default_device(&self) -> Rc<dyn VirtualDefaultDevice>;

    /// Fresh list of all active playback devices.
    fn all_devices(&self) -> Result<Vec<DeviceSnapshot>, AudioError>;

    /// Make a device the default for every role.
    fn set_default_device(&self, device_id: &str) -> Result<(), AudioError>;

    /// Re-read endpoint state after an out-of-band change notification.
    fn refresh(&self) -> Result<(), AudioError>;
}

/// Audio service error types.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    #[error("No default device available")]
    NoDefaultDevice,

    #[error("Volume control not available for device")]
    VolumeNotAvailable,

    #[error("String conversion error: {0}")]
    StringConversion(String),

    #[cfg(windows)]
    #[error("COM initialization failed: {0}")]
    ComInitFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Failed to enumerate devices: {0}")]
    EnumerationFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Failed to set default device: {0}")]
    SetDefaultFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsError(#[source] windows::core::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_to_percent_rounds_and_clamps() {
        assert_eq!(volume_to_percent(0.0), 0);
        assert_eq!(volume_to_percent(0.494), 49);
        assert_eq!(volume_to_percent(0.495), 50);
        assert_eq!(volume_to_percent(1.0), 100);
        assert_eq!(volume_to_percent(1.7), 100);
        assert_eq!(volume_to_percent(-0.2), 0);
    }

    #[test]
    fn test_snapshot_builders() {
        let device = DeviceSnapshot::new("id-1", "Speakers")
            .with_volume(140)
            .with_muted(true);
        assert_eq!(device.volume_percent, 100);
        assert!(device.is_muted);
        assert!(device.is_present);

        let absent = DeviceSnapshot::absent();
        assert!(!absent.is_present);
        assert!(absent.id.is_empty());
    }
}
