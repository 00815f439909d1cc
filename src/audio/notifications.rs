//! Change notifications.
//!
//! [`Subscribers`] is the listener list behind every "property changed"
//! source in the crate. On Windows this module also holds the COM callbacks
//! that forward endpoint and volume changes to the UI thread.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Token returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener = Rc<dyn Fn()>;

/// Listener list for a single-threaded change source.
#[derive(Default)]
pub struct Subscribers {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(Subscription, Listener)>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let subscription = Subscription(id);
        self.listeners
            .borrow_mut()
            .push((subscription, Rc::new(listener)));
        subscription
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(s, _)| *s != subscription);
        listeners.len() != before
    }

    /// Invoke every listener.
    ///
    /// The list is snapshotted first, so a listener may subscribe or
    /// unsubscribe without deadlocking on the borrow.
    pub fn notify(&self) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(windows)]
pub use com::{EndpointNotificationClient, VolumeNotificationClient};

#[cfg(windows)]
mod com {
    use crate::events::{AppEvent, EventSender};
    use windows::core::{implement, PCWSTR};
    use windows::Win32::Media::Audio::Endpoints::{
        IAudioEndpointVolume, IAudioEndpointVolumeCallback, IAudioEndpointVolumeCallback_Impl,
    };
    use windows::Win32::Media::Audio::{
        eRender, EDataFlow, ERole, IMMDeviceEnumerator, IMMNotificationClient,
        IMMNotificationClient_Impl, AUDIO_VOLUME_NOTIFICATION_DATA, DEVICE_STATE,
    };
    use windows::Win32::UI::Shell::PropertiesSystem::PROPERTYKEY;
    // Re-export windows_core so the implement macro can find it
    #[allow(unused_imports)]
    use windows_core;

    /// Endpoint notification client. Runs on a COM worker thread and only
    /// queues [`AppEvent::AudioEndpointsChanged`].
    #[implement(IMMNotificationClient)]
    pub struct EndpointNotificationClient {
        events: EventSender,
    }

    impl EndpointNotificationClient {
        pub fn new(events: EventSender) -> Self {
            Self { events }
        }

        /// Register with an enumerator. The returned interface must be kept
        /// alive and passed to `UnregisterEndpointNotificationCallback`.
        pub fn register(
            self,
            enumerator: &IMMDeviceEnumerator,
        ) -> Result<IMMNotificationClient, windows::core::Error> {
            unsafe {
                let client: IMMNotificationClient = self.into();
                enumerator.RegisterEndpointNotificationCallback(&client)?;
                Ok(client)
            }
        }
    }

    impl IMMNotificationClient_Impl for EndpointNotificationClient_Impl {
        fn OnDeviceStateChanged(
            &self,
            _pwstrdeviceid: &PCWSTR,
            _dwnewstate: DEVICE_STATE,
        ) -> windows::core::Result<()> {
            self.events.send(AppEvent::AudioEndpointsChanged);
            Ok(())
        }

        fn OnDeviceAdded(&self, _pwstrdeviceid: &PCWSTR) -> windows::core::Result<()> {
            self.events.send(AppEvent::AudioEndpointsChanged);
            Ok(())
        }

        fn OnDeviceRemoved(&self, _pwstrdeviceid: &PCWSTR) -> windows::core::Result<()> {
            self.events.send(AppEvent::AudioEndpointsChanged);
            Ok(())
        }

        fn OnDefaultDeviceChanged(
            &self,
            flow: EDataFlow,
            _role: ERole,
            _pwstrdefaultdeviceid: &PCWSTR,
        ) -> windows::core::Result<()> {
            // Only playback endpoints drive the tray
            if flow == eRender {
                self.events.send(AppEvent::AudioEndpointsChanged);
            }
            Ok(())
        }

        fn OnPropertyValueChanged(
            &self,
            _pwstrdeviceid: &PCWSTR,
            _key: &PROPERTYKEY,
        ) -> windows::core::Result<()> {
            // Friendly name edits arrive here
            self.events.send(AppEvent::AudioEndpointsChanged);
            Ok(())
        }
    }

    /// Volume/mute callback for the current default endpoint.
    #[implement(IAudioEndpointVolumeCallback)]
    pub struct VolumeNotificationClient {
        events: EventSender,
    }

    impl VolumeNotificationClient {
        pub fn new(events: EventSender) -> Self {
            Self { events }
        }

        pub fn register(
            self,
            endpoint_volume: &IAudioEndpointVolume,
        ) -> Result<IAudioEndpointVolumeCallback, windows::core::Error> {
            unsafe {
                let callback: IAudioEndpointVolumeCallback = self.into();
                endpoint_volume.RegisterControlChangeNotify(&callback)?;
                Ok(callback)
            }
        }
    }

    impl IAudioEndpointVolumeCallback_Impl for VolumeNotificationClient_Impl {
        fn OnNotify(
            &self,
            _pnotify: *mut AUDIO_VOLUME_NOTIFICATION_DATA,
        ) -> windows::core::Result<()> {
            self.events.send(AppEvent::AudioEndpointsChanged);
            Ok(())
        }
    }
}
