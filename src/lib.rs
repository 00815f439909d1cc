//! EarTrumpet tray controller.
//!
//! A notification-area icon that mirrors the default playback device.
//!
//! ## Features
//!
//! - Tooltip with the default device name and volume
//! - Glyph that follows volume bands, mute and device presence
//! - Context menu for switching the default device and opening the sound
//!   dialogs and settings pages
//! - Middle-click to toggle mute
//! - Automatic refresh on device hot-plug and default changes

pub mod app;
pub mod audio;
pub mod config;
pub mod events;
pub mod logging;
pub mod platform;
pub mod ui;

#[cfg(test)]
mod testing;

pub use app::App;
pub use audio::{AudioDeviceManager, AudioError, DeviceSnapshot, VirtualDefaultDevice};
pub use config::LaunchOptions;
pub use events::{event_channel, AppEvent, EventSender};
pub use platform::{SystemPreferences, TrayGlyph};
pub use ui::{TrayCommand, TrayError, TrayHost, TrayIconController};
