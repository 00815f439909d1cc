//! Observer attached to the virtual default device.

use super::device::{AudioError, VirtualDefaultDevice};
use super::notifications::Subscription;
use std::rc::Rc;
use tracing::debug;

/// Live view of the default device plus the subscription that feeds it.
///
/// Reads always go to the facade; nothing is cached here.
pub struct DeviceStateObserver {
    device: Rc<dyn VirtualDefaultDevice>,
    subscription: Option<Subscription>,
}

impl DeviceStateObserver {
    /// Subscribe `on_change` to the facade's property notifications.
    pub fn attach(device: Rc<dyn VirtualDefaultDevice>, on_change: impl Fn() + 'static) -> Self {
        let subscription = device.subscribe(Box::new(on_change));
        Self {
            device,
            subscription: Some(subscription),
        }
    }

    pub fn display_name(&self) -> String {
        self.device.display_name()
    }

    pub fn volume_percent(&self) -> u8 {
        self.device.volume_percent()
    }

    pub fn is_muted(&self) -> bool {
        self.device.is_muted()
    }

    pub fn is_present(&self) -> bool {
        self.device.is_present()
    }

    pub fn default_device_id(&self) -> Option<String> {
        self.device.id()
    }

    /// Flip the default device's mute flag. Returns the new state.
    pub fn toggle_mute(&self) -> Result<bool, AudioError> {
        let muted = !self.is_muted();
        self.device.set_muted(muted)?;
        Ok(muted)
    }

    /// Stop receiving notifications. Idempotent.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            let removed = self.device.unsubscribe(subscription);
            debug!(removed, "detached from default device notifications");
        }
    }
}

impl Drop for DeviceStateObserver {
    fn drop(&mut self) {
        self.detach();
    }
}
