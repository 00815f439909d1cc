//! Tray user interface.
//!
//! The controller and its pure helpers (tooltip, context menu, strings) are
//! platform neutral. The Win32 host that puts them on screen is in [`host`].

#[cfg(windows)]
pub mod host;
pub mod localization;
pub mod menu;
pub mod tooltip;
pub mod tray;
pub mod view_model;

pub use localization::{EnglishLocalizer, FlowDirection, Label, Localizer};
pub use menu::{build_context_menu, MenuAction, MenuDescription, MenuEntry};
pub use tooltip::format_tooltip;
pub use tray::{
    PointerButton, Position, TrayError, TrayHost, TrayIconController, TrayIconState,
};
pub use view_model::{
    DeviceListViewModel, MainViewModel, SystemTrayViewModel, TrayCommand, TrayViewModel,
};
