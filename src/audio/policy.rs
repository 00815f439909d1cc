//! Default endpoint switching through the undocumented `IPolicyConfig`.

use windows::core::*;
use windows::Win32::Media::Audio::{eCommunications, eConsole, eMultimedia, ERole};
use windows::Win32::System::Com::{CoCreateInstance, CLSCTX_ALL};

/// Every role the tray switches together.
pub const ALL_ROLES: [ERole; 3] = [eConsole, eMultimedia, eCommunications];

// Stable since Windows 7; the first ten methods are unused here
#[windows::core::interface("F8679F50-850A-41CF-9C72-430F290290C8")]
unsafe trait IPolicyConfig: IUnknown {
    fn reserved1(&self) -> HRESULT;
    fn reserved2(&self) -> HRESULT;
    fn reserved3(&self) -> HRESULT;
    fn reserved4(&self) -> HRESULT;
    fn reserved5(&self) -> HRESULT;
    fn reserved6(&self) -> HRESULT;
    fn reserved7(&self) -> HRESULT;
    fn reserved8(&self) -> HRESULT;
    fn reserved9(&self) -> HRESULT;
    fn reserved10(&self) -> HRESULT;

    fn SetDefaultEndpoint(&self, device_id: PCWSTR, role: u32) -> HRESULT;
}

const CLSID_POLICY_CONFIG_CLIENT: GUID = GUID::from_u128(0x870af99c_171d_4f9e_af0d_e63df40c2bc9);

/// Make `device_id` the default render endpoint for console, multimedia and
/// communications.
pub fn set_default_device_for_all_roles(device_id: &str) -> Result<()> {
    unsafe {
        let policy_config: IPolicyConfig =
            CoCreateInstance(&CLSID_POLICY_CONFIG_CLIENT, None, CLSCTX_ALL)?;

        let device_id_wide: Vec<u16> = device_id.encode_utf16().chain(std::iter::once(0)).collect();
        for role in ALL_ROLES {
            policy_config
                .SetDefaultEndpoint(PCWSTR(device_id_wide.as_ptr()), role.0 as u32)
                .ok()?;
        }
        Ok(())
    }
}
