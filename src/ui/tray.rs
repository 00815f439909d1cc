//! System tray icon controller.
//!
//! Owns the tray icon for the life of the process: keeps its glyph and
//! tooltip in step with the default device, turns pointer input into
//! commands and runs the exit sequence. OS calls go through [`TrayHost`].

use super::localization::{FlowDirection, Label, Localizer};
use super::menu::{build_context_menu, MenuAction, MenuDescription};
use super::tooltip::format_tooltip;
use super::view_model::{MainViewModel, TrayCommand, TrayViewModel};
use crate::audio::{AudioDeviceManager, DeviceStateObserver, Subscription};
use crate::config::HELPER_PROCESS_NAME;
use crate::events::{AppEvent, EventSender};
use crate::platform::icons::{TaskbarTheme, TrayGlyph};
use crate::platform::process::ProcessError;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Position in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Mouse button released over the icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other(u8),
}

/// Tray service error types.
#[derive(Debug, Error)]
pub enum TrayError {
    #[error("Failed to create tray icon: {0}")]
    CreateFailed(String),

    #[error("Failed to load icon resource")]
    IconLoadFailed,

    #[error("Tray icon not initialized")]
    NotInitialized,

    #[error("Failed to update tray icon: {0}")]
    UpdateFailed(String),

    #[error("Failed to create menu: {0}")]
    MenuFailed(String),
}

/// What the icon currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct TrayIconState {
    pub glyph: TrayGlyph,

    /// Tooltip text, never longer than the notification area allows
    pub tooltip_text: String,

    pub visible: bool,
}

/// OS side of the tray icon.
pub trait TrayHost {
    /// Create the notification-area icon.
    fn create_icon(&mut self, glyph: &TrayGlyph, tooltip: &str) -> Result<(), TrayError>;

    fn set_icon(&mut self, glyph: &TrayGlyph) -> Result<(), TrayError>;

    fn set_tooltip(&mut self, text: &str) -> Result<(), TrayError>;

    fn set_visible(&mut self, visible: bool) -> Result<(), TrayError>;

    /// Show the popup menu and block until it closes. Returns the index of
    /// the chosen entry, `None` if the menu was dismissed.
    fn show_context_menu(
        &mut self,
        menu: &MenuDescription,
        position: Position,
        flow_direction: FlowDirection,
    ) -> Result<Option<usize>, TrayError>;

    /// Terminate every process with this executable name.
    fn terminate_processes(&mut self, name: &str) -> Result<usize, ProcessError>;

    /// Release the icon resource.
    fn dispose(&mut self);

    /// Ask the message loop to stop.
    fn request_shutdown(&mut self);
}

/// Live part of the controller; gone once exit starts.
struct Running {
    observer: DeviceStateObserver,
    glyph_subscription: Option<Subscription>,
    state: TrayIconState,
}

/// Tray icon controller.
pub struct TrayIconController<H: TrayHost> {
    main_view_model: Rc<dyn MainViewModel>,
    tray_view_model: Rc<dyn TrayViewModel>,
    localizer: Rc<dyn Localizer>,
    host: H,
    running: Option<Running>,
}

impl<H: TrayHost> TrayIconController<H> {
    /// Wire the observers and create the icon.
    ///
    /// Change notifications are forwarded through `events` so that every
    /// refresh runs from the event pump. Fails if the icon cannot be created,
    /// after releasing the subscriptions made so far.
    pub fn new(
        device_manager: &dyn AudioDeviceManager,
        main_view_model: Rc<dyn MainViewModel>,
        tray_view_model: Rc<dyn TrayViewModel>,
        localizer: Rc<dyn Localizer>,
        events: EventSender,
        mut host: H,
    ) -> Result<Self, TrayError> {
        let device_events = events.clone();
        let mut observer = DeviceStateObserver::attach(device_manager.virtual_default_device(), move || {
            device_events.send(AppEvent::DefaultDevicePropertyChanged)
        });

        let glyph_subscription = tray_view_model
            .subscribe_glyph(Box::new(move || events.send(AppEvent::TrayGlyphChanged)));

        let glyph = tray_view_model.tray_glyph();
        let tooltip_text = tooltip_for(&observer, localizer.as_ref());

        let created = host
            .create_icon(&glyph, &tooltip_text)
            .and_then(|()| host.set_visible(true));

        if let Err(e) = created {
            error!(error = %e, "failed to create tray icon");
            observer.detach();
            tray_view_model.unsubscribe_glyph(glyph_subscription);
            host.dispose();
            return Err(e);
        }

        info!(tooltip = %tooltip_text, "tray icon created");

        Ok(Self {
            main_view_model,
            tray_view_model,
            localizer,
            host,
            running: Some(Running {
                observer,
                glyph_subscription: Some(glyph_subscription),
                state: TrayIconState {
                    glyph,
                    tooltip_text,
                    visible: true,
                },
            }),
        })
    }

    /// React to a pointer button released over the icon.
    pub fn handle_pointer(&mut self, button: PointerButton, position: Position) {
        let Some(running) = &self.running else {
            debug!(?button, "pointer event after exit ignored");
            return;
        };

        match button {
            PointerButton::Primary => self.tray_view_model.execute(&TrayCommand::OpenFlyout),
            PointerButton::Secondary => self.show_context_menu(position),
            PointerButton::Middle => match running.observer.toggle_mute() {
                Ok(muted) => info!(muted, "toggled default device mute"),
                Err(e) => warn!(error = %e, "failed to toggle mute"),
            },
            PointerButton::Other(_) => {}
        }
    }

    fn show_context_menu(&mut self, position: Position) {
        let Some(running) = &self.running else {
            return;
        };
        let default_id = running
            .observer
            .is_present()
            .then(|| running.observer.default_device_id())
            .flatten();

        let menu = build_context_menu(
            self.main_view_model.all_devices(),
            default_id.as_deref(),
            self.localizer.as_ref(),
        );
        debug!(entries = menu.len(), "showing context menu");

        let flow_direction = self.localizer.flow_direction();
        match self.host.show_context_menu(&menu, position, flow_direction) {
            Ok(Some(index)) => {
                if let Some(action) = menu.action_at(index).cloned() {
                    self.dispatch(action);
                }
            }
            Ok(None) => debug!("context menu dismissed"),
            Err(e) => warn!(error = %e, "failed to show context menu"),
        }
    }

    /// Run a menu action.
    pub fn dispatch(&mut self, action: MenuAction) {
        if self.running.is_none() {
            debug!(?action, "menu action after exit ignored");
            return;
        }

        match action {
            MenuAction::Invoke(command) => self.tray_view_model.execute(&command),
            MenuAction::Exit => self.exit(),
        }
    }

    /// Recompute the tooltip from the default device.
    pub fn refresh_tooltip(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        let text = tooltip_for(&running.observer, self.localizer.as_ref());
        if let Err(e) = self.host.set_tooltip(&text) {
            warn!(error = %e, "failed to update tooltip");
        }
        running.state.tooltip_text = text;
    }

    /// Copy the view-model's glyph to the icon.
    pub fn refresh_icon(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        let glyph = self.tray_view_model.tray_glyph();
        if let Err(e) = self.host.set_icon(&glyph) {
            warn!(error = %e, "failed to update tray icon");
        }
        running.state.glyph = glyph;
    }

    /// Follow a taskbar theme change. The view-model reports the new glyph
    /// through its usual notification.
    pub fn apply_theme(&mut self, theme: TaskbarTheme) {
        if self.running.is_none() {
            debug!(?theme, "theme change after exit ignored");
            return;
        }
        info!(?theme, "taskbar theme changed");
        self.tray_view_model.set_theme(theme);
    }

    /// Tear everything down and request shutdown. Runs once; later calls
    /// are ignored.
    pub fn exit(&mut self) {
        let Some(mut running) = self.running.take() else {
            debug!("exit already in progress");
            return;
        };
        info!("exiting");

        running.observer.detach();
        if let Some(subscription) = running.glyph_subscription.take() {
            self.tray_view_model.unsubscribe_glyph(subscription);
        }

        match self.host.terminate_processes(HELPER_PROCESS_NAME) {
            Ok(count) => debug!(count, "helper processes terminated"),
            Err(e) => debug!(error = %e, "helper process termination failed"),
        }

        self.tray_view_model.close_app_service();

        running.state.visible = false;
        if let Err(e) = self.host.set_visible(false) {
            warn!(error = %e, "failed to hide tray icon");
        }
        self.host.dispose();
        self.host.request_shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Current icon state, `None` after exit.
    pub fn state(&self) -> Option<&TrayIconState> {
        self.running.as_ref().map(|running| &running.state)
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: TrayHost> Drop for TrayIconController<H> {
    fn drop(&mut self) {
        if let Some(mut running) = self.running.take() {
            if let Some(subscription) = running.glyph_subscription.take() {
                self.tray_view_model.unsubscribe_glyph(subscription);
            }
        }
    }
}

fn tooltip_for(observer: &DeviceStateObserver, localizer: &dyn Localizer) -> String {
    format_tooltip(
        observer.is_present(),
        observer.volume_percent(),
        &observer.display_name(),
        &localizer.label(Label::NoDeviceTooltip),
    )
}
