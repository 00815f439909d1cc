//! The Windows virtual default device.

use super::device::{volume_to_percent, AudioError, VirtualDefaultDevice};
use super::enumerator::DeviceEnumerator;
use super::notifications::{Subscribers, Subscription, VolumeNotificationClient};
use super::volume::VolumeController;
use crate::events::EventSender;
use std::cell::RefCell;
use tracing::{debug, info, warn};
use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolumeCallback;

/// The endpoint currently behind the facade, with its volume callback.
struct Endpoint {
    id: String,
    display_name: String,
    volume: Option<VolumeController>,
    callback: Option<IAudioEndpointVolumeCallback>,
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        if let (Some(volume), Some(callback)) = (&self.volume, &self.callback) {
            unsafe {
                let _ = volume
                    .raw_endpoint_volume()
                    .UnregisterControlChangeNotify(callback);
            }
        }
    }
}

/// Follows whichever render endpoint is the console default.
///
/// Volume and mute are read live from the endpoint. The ID and name are
/// re-resolved on [`refresh`](Self::refresh), which also notifies subscribers.
pub struct WindowsDefaultDevice {
    current: RefCell<Option<Endpoint>>,
    subscribers: Subscribers,
    events: EventSender,
}

impl WindowsDefaultDevice {
    pub fn new(events: EventSender) -> Self {
        Self {
            current: RefCell::new(None),
            subscribers: Subscribers::new(),
            events,
        }
    }

    /// Re-resolve the default endpoint and notify subscribers.
    pub fn refresh(&self, enumerator: &DeviceEnumerator) -> Result<(), AudioError> {
        let result = self.resolve(enumerator);
        // Subscribers hear about it even if resolution failed; the facade
        // then reports no device.
        self.subscribers.notify();
        result
    }

    fn resolve(&self, enumerator: &DeviceEnumerator) -> Result<(), AudioError> {
        let Some(device) = enumerator.default_render_device() else {
            if self.current.borrow_mut().take().is_some() {
                info!("no default playback device");
            }
            return Ok(());
        };

        let id = match DeviceEnumerator::device_id(&device) {
            Ok(id) => id,
            Err(e) => {
                self.current.borrow_mut().take();
                return Err(e);
            }
        };
        let display_name = DeviceEnumerator::friendly_name(&device);

        let mut current = self.current.borrow_mut();
        if let Some(endpoint) = current.as_mut().filter(|endpoint| endpoint.id == id) {
            endpoint.display_name = display_name;
            return Ok(());
        }

        let volume = match VolumeController::new(&device) {
            Ok(volume) => Some(volume),
            Err(e) => {
                warn!(device_id = %id, error = %e, "default device has no volume control");
                None
            }
        };
        let callback = volume.as_ref().and_then(|volume| {
            VolumeNotificationClient::new(self.events.clone())
                .register(volume.raw_endpoint_volume())
                .map_err(|e| warn!(error = %e, "failed to register volume callback"))
                .ok()
        });

        info!(device_id = %id, name = %display_name, "default playback device");
        // Replacing drops the previous endpoint, which unregisters its callback
        *current = Some(Endpoint {
            id,
            display_name,
            volume,
            callback,
        });
        Ok(())
    }

    fn with_volume<T>(&self, read: impl FnOnce(&VolumeController) -> Result<T, AudioError>) -> Option<T> {
        let current = self.current.borrow();
        let volume = current.as_ref()?.volume.as_ref()?;
        match read(volume) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, "endpoint volume read failed");
                None
            }
        }
    }
}

impl VirtualDefaultDevice for WindowsDefaultDevice {
    fn id(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|endpoint| endpoint.id.clone())
    }

    fn display_name(&self) -> String {
        self.current
            .borrow()
            .as_ref()
            .map(|endpoint| endpoint.display_name.clone())
            .unwrap_or_default()
    }

    fn volume_percent(&self) -> u8 {
        self.with_volume(VolumeController::get_volume)
            .map(volume_to_percent)
            .unwrap_or(0)
    }

    fn is_muted(&self) -> bool {
        self.with_volume(VolumeController::get_mute).unwrap_or(false)
    }

    fn set_muted(&self, muted: bool) -> Result<(), AudioError> {
        let current = self.current.borrow();
        let endpoint = current.as_ref().ok_or(AudioError::NoDefaultDevice)?;
        let volume = endpoint
            .volume
            .as_ref()
            .ok_or(AudioError::VolumeNotAvailable)?;
        // The volume callback reports the change back through the event pump
        volume.set_mute(muted)
    }

    fn is_present(&self) -> bool {
        self.current.borrow().is_some()
    }

    fn subscribe(&self, listener: Box<dyn Fn()>) -> Subscription {
        self.subscribers.subscribe(listener)
    }

    fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.subscribers.unsubscribe(subscription)
    }
}
