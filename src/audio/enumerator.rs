//! Render endpoint enumeration using the Windows MMDevice API.
//!
//! Provides COM initialization, endpoint enumeration and the
//! [`WindowsDeviceManager`] that the tray talks to.

use super::default_device::WindowsDefaultDevice;
use super::device::{volume_to_percent, AudioDeviceManager, AudioError, DeviceSnapshot, VirtualDefaultDevice};
use super::notifications::EndpointNotificationClient;
use super::policy;
use super::volume::VolumeController;
use crate::events::EventSender;
use std::rc::Rc;
use tracing::{debug, warn};
use windows::core::{Interface, GUID, HSTRING};
use windows::Win32::Media::Audio::{
    eConsole, eRender, IMMDevice, IMMDeviceEnumerator, IMMEndpoint, IMMNotificationClient,
    MMDeviceEnumerator,
    DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL, COINIT_APARTMENTTHREADED, STGM,
};
use windows::Win32::UI::Shell::PropertiesSystem::{IPropertyStore, PROPERTYKEY};

// PKEY_Device_FriendlyName
const PKEY_DEVICE_FRIENDLY_NAME: PROPERTYKEY = PROPERTYKEY {
    fmtid: GUID::from_u128(0xa45c254e_df1c_4efd_8020_67d146a850e0),
    pid: 14,
};

/// COM initialization guard that uninitializes COM on drop.
pub struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    /// Initialize COM for the current thread.
    pub fn new() -> Result<Self, AudioError> {
        unsafe {
            // Apartment-threaded: the tray icon and its callbacks share the UI thread
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .map_err(AudioError::ComInitFailed)?;
        }
        Ok(Self { initialized: true })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

/// Device enumerator for playback endpoints.
pub struct DeviceEnumerator {
    enumerator: IMMDeviceEnumerator,
}

impl DeviceEnumerator {
    /// COM must be initialized on this thread first.
    pub fn new() -> Result<Self, AudioError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                    .map_err(AudioError::EnumerationFailed)?;

            Ok(Self { enumerator })
        }
    }

    /// Snapshots of every active render endpoint.
    pub fn render_devices(&self) -> Result<Vec<DeviceSnapshot>, AudioError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(eRender, DEVICE_STATE_ACTIVE)
                .map_err(AudioError::EnumerationFailed)?;

            let count = collection
                .GetCount()
                .map_err(AudioError::EnumerationFailed)?;

            let mut devices = Vec::with_capacity(count as usize);
            for i in 0..count {
                let device = collection.Item(i).map_err(AudioError::EnumerationFailed)?;
                match self.snapshot(&device) {
                    Ok(snapshot) => devices.push(snapshot),
                    Err(e) => debug!(error = %e, "skipping unreadable endpoint"),
                }
            }

            Ok(devices)
        }
    }

    /// The default console render endpoint, `None` if there is none.
    pub fn default_render_device(&self) -> Option<IMMDevice> {
        unsafe { self.enumerator.GetDefaultAudioEndpoint(eRender, eConsole).ok() }
    }

    pub fn device_id(device: &IMMDevice) -> Result<String, AudioError> {
        unsafe {
            let id = device.GetId().map_err(AudioError::EnumerationFailed)?;
            id.to_string()
                .map_err(|e| AudioError::StringConversion(e.to_string()))
        }
    }

    /// Friendly name from the property store, empty if unavailable.
    pub fn friendly_name(device: &IMMDevice) -> String {
        unsafe {
            let props: IPropertyStore = match device.OpenPropertyStore(STGM(0)) {
                Ok(props) => props,
                Err(_) => return String::new(),
            };

            match props.GetValue(&PKEY_DEVICE_FRIENDLY_NAME) {
                Ok(value) => value.to_string(),
                Err(_) => String::new(),
            }
        }
    }

    fn snapshot(&self, device: &IMMDevice) -> Result<DeviceSnapshot, AudioError> {
        let id = Self::device_id(device)?;
        let mut snapshot = DeviceSnapshot::new(id, Self::friendly_name(device));

        // Volume is informational in the list; an endpoint without it is still listed
        if let Ok(volume) = VolumeController::new(device) {
            snapshot.volume_percent = volume.get_volume().map(volume_to_percent).unwrap_or(0);
            snapshot.is_muted = volume.get_mute().unwrap_or(false);
        }

        Ok(snapshot)
    }

    /// Look up an endpoint by ID, failing unless it is an active render device.
    pub fn active_render_device(&self, device_id: &str) -> Result<IMMDevice, AudioError> {
        let not_found = || AudioError::DeviceNotFound {
            device_id: device_id.to_string(),
        };
        unsafe {
            let device = self
                .enumerator
                .GetDevice(&HSTRING::from(device_id))
                .map_err(|_| not_found())?;
            let state = device.GetState().map_err(AudioError::EnumerationFailed)?;
            let flow = device
                .cast::<IMMEndpoint>()
                .and_then(|endpoint| endpoint.GetDataFlow())
                .map_err(AudioError::EnumerationFailed)?;
            if state != DEVICE_STATE_ACTIVE || flow != eRender {
                return Err(not_found());
            }
            Ok(device)
        }
    }

    /// For notification registration.
    pub fn raw_enumerator(&self) -> &IMMDeviceEnumerator {
        &self.enumerator
    }
}

/// [`AudioDeviceManager`] over Core Audio.
///
/// Endpoint notifications are queued as events; the UI thread answers them
/// by calling [`AudioDeviceManager::refresh`].
pub struct WindowsDeviceManager {
    enumerator: DeviceEnumerator,
    notification_client: IMMNotificationClient,
    default_device: Rc<WindowsDefaultDevice>,
}

impl WindowsDeviceManager {
    pub fn new(events: EventSender) -> Result<Self, AudioError> {
        let enumerator = DeviceEnumerator::new()?;
        let notification_client = EndpointNotificationClient::new(events.clone())
            .register(enumerator.raw_enumerator())
            .map_err(AudioError::WindowsError)?;

        let default_device = Rc::new(WindowsDefaultDevice::new(events));
        default_device.refresh(&enumerator)?;

        Ok(Self {
            enumerator,
            notification_client,
            default_device,
        })
    }
}

impl AudioDeviceManager for WindowsDeviceManager {
    fn virtual_default_device(&self) -> Rc<dyn VirtualDefaultDevice> {
        self.default_device.clone()
    }

    fn all_devices(&self) -> Result<Vec<DeviceSnapshot>, AudioError> {
        self.enumerator.render_devices()
    }

    fn set_default_device(&self, device_id: &str) -> Result<(), AudioError> {
        self.enumerator.active_render_device(device_id)?;
        policy::set_default_device_for_all_roles(device_id).map_err(AudioError::SetDefaultFailed)
    }

    fn refresh(&self) -> Result<(), AudioError> {
        self.default_device.refresh(&self.enumerator)
    }
}

impl Drop for WindowsDeviceManager {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self
                .enumerator
                .raw_enumerator()
                .UnregisterEndpointNotificationCallback(&self.notification_client)
            {
                warn!(error = %e, "failed to unregister endpoint notifications");
            }
        }
    }
}
