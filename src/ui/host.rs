//! Win32 tray host.
//!
//! The icon itself is a `tray-icon` handle with no attached menu; the
//! context menu is a native popup tracked against a hidden owner window,
//! which also receives the wake-up messages for the event pump.

use super::localization::FlowDirection;
use super::menu::{MenuDescription, MenuEntry};
use super::tray::{PointerButton, Position, TrayError, TrayHost};
use crate::events::{AppEvent, EventSender};
use crate::platform::icons::TrayGlyph;
use crate::platform::process::{self, ProcessError};
use crate::platform::RegistryPreferences;
use std::cell::RefCell;
use tracing::debug;
use tray_icon::{Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::*;

/// Posted to the owner window whenever an event is queued.
pub const WM_APP_WAKE: u32 = WM_APP + 1;

/// `WM_SETTINGCHANGE` area sent when light/dark colors change.
const COLOR_SET_AREA: &str = "ImmersiveColorSet";

thread_local! {
    // The window procedure is a plain function; this is how it reaches the pump.
    static THEME_EVENTS: RefCell<Option<EventSender>> = const { RefCell::new(None) };
}

/// Hidden top-level window that owns the popup menu.
pub struct MessageWindow {
    hwnd: HWND,
}

impl MessageWindow {
    pub fn create() -> windows::core::Result<Self> {
        unsafe {
            let instance = GetModuleHandleW(None)?;

            let window_class = w!("EarTrumpetTrayWindow");
            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(window_proc),
                hInstance: instance.into(),
                lpszClassName: window_class,
                ..Default::default()
            };
            RegisterClassExW(&wc);

            // Never shown. Message-only windows cannot take foreground.
            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                window_class,
                w!("EarTrumpet"),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                None,
                None,
                instance,
                None,
            )?;

            Ok(Self { hwnd })
        }
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Queue [`AppEvent::TaskbarThemeChanged`] whenever the user switches
    /// between light and dark colors.
    pub fn forward_theme_changes(&self, events: EventSender) {
        THEME_EVENTS.with(|slot| *slot.borrow_mut() = Some(events));
    }

    /// Function that wakes the message loop from any thread.
    pub fn waker(&self) -> impl Fn() + Send + Sync + 'static {
        // HWND is not Send; carry the raw value instead
        let raw = self.hwnd.0 as isize;
        move || unsafe {
            let _ = PostMessageW(HWND(raw as *mut _), WM_APP_WAKE, WPARAM(0), LPARAM(0));
        }
    }
}

impl Drop for MessageWindow {
    fn drop(&mut self) {
        THEME_EVENTS.with(|slot| slot.borrow_mut().take());
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        // The loop drains the event channel after every dispatch
        WM_APP_WAKE => LRESULT(0),
        WM_SETTINGCHANGE => {
            if is_color_set_change(lparam) {
                send_theme_change();
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

unsafe fn is_color_set_change(lparam: LPARAM) -> bool {
    if lparam.0 == 0 {
        return false;
    }
    PCWSTR(lparam.0 as *const u16)
        .to_string()
        .map(|area| area == COLOR_SET_AREA)
        .unwrap_or(false)
}

fn send_theme_change() {
    let theme = RegistryPreferences::load().taskbar_theme;
    THEME_EVENTS.with(|slot| {
        if let Some(events) = slot.borrow().as_ref() {
            events.send(AppEvent::TaskbarThemeChanged(theme));
        }
    });
}

/// Run the Win32 message loop until `WM_QUIT`, calling `after_dispatch`
/// after every message.
pub fn run_message_loop(mut after_dispatch: impl FnMut()) {
    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
            after_dispatch();
        }
    }
}

/// Map a `tray-icon` event to a pointer release, if it is one.
pub fn pointer_event(event: &TrayIconEvent) -> Option<(PointerButton, Position)> {
    match event {
        TrayIconEvent::Click {
            button,
            button_state: MouseButtonState::Up,
            position,
            ..
        } => {
            #[allow(unreachable_patterns)]
            let button = match button {
                MouseButton::Left => PointerButton::Primary,
                MouseButton::Right => PointerButton::Secondary,
                MouseButton::Middle => PointerButton::Middle,
                _ => PointerButton::Other(0),
            };
            Some((button, Position::new(position.x, position.y)))
        }
        _ => None,
    }
}

fn to_icon(glyph: &TrayGlyph) -> Result<Icon, TrayError> {
    let image = glyph.image();
    let (width, height) = image.dimensions();
    Icon::from_rgba(image.as_raw().clone(), width, height).map_err(|_| TrayError::IconLoadFailed)
}

/// [`TrayHost`] on the Windows notification area.
pub struct Win32TrayHost {
    owner: HWND,
    icon: Option<TrayIcon>,
}

impl Win32TrayHost {
    pub fn new(owner: &MessageWindow) -> Self {
        Self {
            owner: owner.hwnd(),
            icon: None,
        }
    }

    fn tray(&self) -> Result<&TrayIcon, TrayError> {
        self.icon.as_ref().ok_or(TrayError::NotInitialized)
    }
}

impl TrayHost for Win32TrayHost {
    fn create_icon(&mut self, glyph: &TrayGlyph, tooltip: &str) -> Result<(), TrayError> {
        let tray = TrayIconBuilder::new()
            .with_icon(to_icon(glyph)?)
            .with_tooltip(tooltip)
            .build()
            .map_err(|e| TrayError::CreateFailed(e.to_string()))?;
        self.icon = Some(tray);
        Ok(())
    }

    fn set_icon(&mut self, glyph: &TrayGlyph) -> Result<(), TrayError> {
        let icon = to_icon(glyph)?;
        self.tray()?
            .set_icon(Some(icon))
            .map_err(|e| TrayError::UpdateFailed(e.to_string()))
    }

    fn set_tooltip(&mut self, text: &str) -> Result<(), TrayError> {
        self.tray()?
            .set_tooltip(Some(text))
            .map_err(|e| TrayError::UpdateFailed(e.to_string()))
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), TrayError> {
        self.tray()?
            .set_visible(visible)
            .map_err(|e| TrayError::UpdateFailed(e.to_string()))
    }

    fn show_context_menu(
        &mut self,
        menu: &MenuDescription,
        position: Position,
        flow_direction: FlowDirection,
    ) -> Result<Option<usize>, TrayError> {
        track_popup(self.owner, menu, position, flow_direction)
    }

    fn terminate_processes(&mut self, name: &str) -> Result<usize, ProcessError> {
        process::terminate_by_name(name)
    }

    fn dispose(&mut self) {
        // Dropping the handle removes the icon from the notification area
        self.icon = None;
    }

    fn request_shutdown(&mut self) {
        unsafe { PostQuitMessage(0) };
    }
}

/// Show `menu` as a native popup and wait for a choice.
///
/// Menu command IDs are entry indices plus one, since zero means "dismissed".
fn track_popup(
    owner: HWND,
    menu: &MenuDescription,
    position: Position,
    flow_direction: FlowDirection,
) -> Result<Option<usize>, TrayError> {
    unsafe {
        let popup = CreatePopupMenu().map_err(|e| TrayError::MenuFailed(e.to_string()))?;

        for (index, entry) in menu.entries.iter().enumerate() {
            let id = index + 1;
            let appended = match entry {
                MenuEntry::Separator => AppendMenuW(popup, MF_SEPARATOR, 0, None),
                MenuEntry::DeviceItem { label, checked, .. } => {
                    let flags = if *checked {
                        MF_STRING | MF_CHECKED
                    } else {
                        MF_STRING
                    };
                    append_item(popup, flags, id, label)
                }
                MenuEntry::StaticCommandItem { label, .. } => {
                    append_item(popup, MF_STRING, id, label)
                }
                MenuEntry::DisabledPlaceholder { label } => {
                    append_item(popup, MF_STRING | MF_GRAYED, id, label)
                }
            };

            if let Err(e) = appended {
                let _ = DestroyMenu(popup);
                return Err(TrayError::MenuFailed(e.to_string()));
            }
        }

        let mut flags = TPM_RETURNCMD | TPM_NONOTIFY | TPM_RIGHTBUTTON;
        if flow_direction == FlowDirection::RightToLeft {
            flags = flags | TPM_LAYOUTRTL | TPM_RIGHTALIGN;
        }

        // The popup only dismisses on outside clicks while the owner is foreground
        let _ = SetForegroundWindow(owner);
        let chosen = TrackPopupMenu(
            popup,
            flags,
            position.x as i32,
            position.y as i32,
            0,
            owner,
            None,
        );
        let _ = PostMessageW(owner, WM_NULL, WPARAM(0), LPARAM(0));
        let _ = DestroyMenu(popup);

        let chosen = usize::try_from(chosen.0).unwrap_or(0);
        debug!(chosen, "context menu closed");
        Ok(chosen.checked_sub(1))
    }
}

unsafe fn append_item(
    popup: HMENU,
    flags: MENU_ITEM_FLAGS,
    id: usize,
    label: &str,
) -> windows::core::Result<()> {
    let label_wide: Vec<u16> = label.encode_utf16().chain(std::iter::once(0)).collect();
    AppendMenuW(popup, flags, id, PCWSTR(label_wide.as_ptr()))
}
