//! Read-only OS preferences from the Windows Registry.
//!
//! The tray never writes to the registry; it only picks up the user's
//! reading direction and taskbar color scheme at startup.

use super::icons::TaskbarTheme;
use crate::ui::FlowDirection;
use thiserror::Error;

/// Language subtags written right to left.
const RTL_LANGUAGES: &[&str] = &[
    "ar", "ckb", "dv", "fa", "he", "iw", "ps", "sd", "syr", "ug", "ur", "yi",
];

/// Script subtags written right to left.
const RTL_SCRIPTS: &[&str] = &["arab", "hebr", "syrc", "thaa"];

/// Preferences that shape how the tray renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemPreferences {
    /// The user locale reads right to left
    pub is_rtl: bool,

    /// Taskbar color scheme
    pub taskbar_theme: TaskbarTheme,
}

impl SystemPreferences {
    pub fn flow_direction(&self) -> FlowDirection {
        if self.is_rtl {
            FlowDirection::RightToLeft
        } else {
            FlowDirection::LeftToRight
        }
    }
}

/// Preferences service error types.
#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Failed to access registry: {0}")]
    RegistryAccess(String),

    #[error("Failed to read preference: {key}")]
    ReadFailed { key: String },
}

/// Whether a BCP 47 locale name such as `ar-SA` or `az-Arab-IR` reads right to left.
pub fn is_rtl_locale(locale_name: &str) -> bool {
    let mut subtags = locale_name.split(['-', '_']);
    let Some(language) = subtags.next() else {
        return false;
    };

    if RTL_LANGUAGES
        .iter()
        .any(|rtl| rtl.eq_ignore_ascii_case(language))
    {
        return true;
    }

    subtags.any(|tag| {
        tag.len() == 4 && RTL_SCRIPTS.iter().any(|script| script.eq_ignore_ascii_case(tag))
    })
}

/// Map `SystemUsesLightTheme` to a taskbar theme. A missing value means dark.
pub fn taskbar_theme_from_dword(value: Option<u32>) -> TaskbarTheme {
    match value {
        Some(v) if v != 0 => TaskbarTheme::Light,
        _ => TaskbarTheme::Dark,
    }
}

#[cfg(windows)]
pub use win32::RegistryPreferences;

#[cfg(windows)]
mod win32 {
    use super::{is_rtl_locale, taskbar_theme_from_dword, PreferencesError, SystemPreferences};
    use tracing::{debug, warn};
    use windows::core::PCWSTR;
    use windows::Win32::System::Registry::{
        RegCloseKey, RegOpenKeyExW, RegQueryValueExW, HKEY, HKEY_CURRENT_USER, KEY_READ,
    };

    /// Registry-backed preferences reader.
    pub struct RegistryPreferences;

    impl RegistryPreferences {
        const INTERNATIONAL_KEY: &'static str = r"Control Panel\International";
        const LOCALE_VALUE: &'static str = "LocaleName";
        const PERSONALIZE_KEY: &'static str =
            r"Software\Microsoft\Windows\CurrentVersion\Themes\Personalize";
        const LIGHT_THEME_VALUE: &'static str = "SystemUsesLightTheme";

        fn to_wide(s: &str) -> Vec<u16> {
            s.encode_utf16().chain(std::iter::once(0)).collect()
        }

        /// Load preferences, falling back to defaults for anything unreadable.
        pub fn load() -> SystemPreferences {
            let is_rtl = match Self::read_string(Self::INTERNATIONAL_KEY, Self::LOCALE_VALUE) {
                Ok(locale) => is_rtl_locale(&locale),
                Err(e) => {
                    warn!(error = %e, "could not read user locale");
                    false
                }
            };

            let light = Self::read_dword(Self::PERSONALIZE_KEY, Self::LIGHT_THEME_VALUE).ok();
            let preferences = SystemPreferences {
                is_rtl,
                taskbar_theme: taskbar_theme_from_dword(light),
            };
            debug!(?preferences, "loaded system preferences");
            preferences
        }

        fn open(path: &str) -> Result<HKEY, PreferencesError> {
            let path_wide = Self::to_wide(path);
            let mut hkey = HKEY::default();
            unsafe {
                let result = RegOpenKeyExW(
                    HKEY_CURRENT_USER,
                    PCWSTR::from_raw(path_wide.as_ptr()),
                    0,
                    KEY_READ,
                    &mut hkey,
                );
                if result.is_err() {
                    return Err(PreferencesError::RegistryAccess(format!(
                        "Failed to open {path}"
                    )));
                }
            }
            Ok(hkey)
        }

        fn read_dword(path: &str, value: &str) -> Result<u32, PreferencesError> {
            let hkey = Self::open(path)?;
            let value_name = Self::to_wide(value);
            let mut data: u32 = 0;
            let mut data_size = std::mem::size_of::<u32>() as u32;

            unsafe {
                let result = RegQueryValueExW(
                    hkey,
                    PCWSTR::from_raw(value_name.as_ptr()),
                    None,
                    None,
                    Some(&mut data as *mut u32 as *mut u8),
                    Some(&mut data_size),
                );
                let _ = RegCloseKey(hkey);

                if result.is_err() {
                    return Err(PreferencesError::ReadFailed {
                        key: value.to_string(),
                    });
                }
            }
            Ok(data)
        }

        fn read_string(path: &str, value: &str) -> Result<String, PreferencesError> {
            let hkey = Self::open(path)?;
            let value_name = Self::to_wide(value);
            let read_failed = || PreferencesError::ReadFailed {
                key: value.to_string(),
            };

            unsafe {
                let mut data_size = 0u32;
                let result = RegQueryValueExW(
                    hkey,
                    PCWSTR::from_raw(value_name.as_ptr()),
                    None,
                    None,
                    None,
                    Some(&mut data_size),
                );
                if result.is_err() {
                    let _ = RegCloseKey(hkey);
                    return Err(read_failed());
                }

                let mut buffer = vec![0u16; (data_size as usize).div_ceil(2)];
                let result = RegQueryValueExW(
                    hkey,
                    PCWSTR::from_raw(value_name.as_ptr()),
                    None,
                    None,
                    Some(buffer.as_mut_ptr() as *mut u8),
                    Some(&mut data_size),
                );
                let _ = RegCloseKey(hkey);

                if result.is_err() {
                    return Err(read_failed());
                }

                let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
                Ok(String::from_utf16_lossy(&buffer[..len]))
            }
        }
    }
}
