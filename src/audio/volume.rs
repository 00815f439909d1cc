//! Volume and mute control using IAudioEndpointVolume.

use super::device::AudioError;
use windows::Win32::Media::Audio::{Endpoints::IAudioEndpointVolume, IMMDevice};
use windows::Win32::System::Com::CLSCTX_ALL;

/// Volume controller for one render endpoint.
pub struct VolumeController {
    endpoint_volume: IAudioEndpointVolume,
}

impl VolumeController {
    pub fn new(device: &IMMDevice) -> Result<Self, AudioError> {
        unsafe {
            let endpoint_volume: IAudioEndpointVolume = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|_| AudioError::VolumeNotAvailable)?;

            Ok(Self { endpoint_volume })
        }
    }

    pub fn get_mute(&self) -> Result<bool, AudioError> {
        unsafe {
            let muted = self
                .endpoint_volume
                .GetMute()
                .map_err(AudioError::WindowsError)?;
            Ok(muted.as_bool())
        }
    }

    pub fn set_mute(&self, muted: bool) -> Result<(), AudioError> {
        unsafe {
            self.endpoint_volume
                .SetMute(muted, std::ptr::null())
                .map_err(AudioError::WindowsError)
        }
    }

    /// Master volume scalar, 0.0 to 1.0.
    pub fn get_volume(&self) -> Result<f32, AudioError> {
        unsafe {
            self.endpoint_volume
                .GetMasterVolumeLevelScalar()
                .map_err(AudioError::WindowsError)
        }
    }

    /// For registering change callbacks.
    pub fn raw_endpoint_volume(&self) -> &IAudioEndpointVolume {
        &self.endpoint_volume
    }
}
