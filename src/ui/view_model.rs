//! View-models consumed by the tray controller.
//!
//! [`MainViewModel`] supplies the device list for the context menu and
//! [`TrayViewModel`] supplies the icon glyph and executes named commands.
//! The concrete implementations sit on top of an [`AudioDeviceManager`].

use crate::audio::{AudioDeviceManager, DeviceSnapshot, Subscribers, Subscription, VirtualDefaultDevice};
use crate::config;
use crate::platform::icons::{GlyphKind, TaskbarTheme, TrayGlyph};
use crate::platform::shell::{LaunchTarget, Launcher};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

/// Commands the tray can ask the view-model layer to run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrayCommand {
    OpenFlyout,
    OpenMixer,
    OpenLegacyMixer,
    OpenPlaybackDevices,
    OpenRecordingDevices,
    OpenSoundsControlPanel,
    OpenSettings,
    SendFeedback,
    /// Make the device with this ID the default for every role
    SwitchDevice(String),
}

/// Where a command sends the user, `None` for commands handled in-process.
pub fn launch_target_for(command: &TrayCommand) -> Option<LaunchTarget> {
    let target = match command {
        TrayCommand::OpenFlyout => config::FLYOUT_TARGET,
        TrayCommand::OpenMixer => config::MIXER_TARGET,
        TrayCommand::OpenLegacyMixer => config::LEGACY_MIXER_TARGET,
        TrayCommand::OpenPlaybackDevices => config::PLAYBACK_DEVICES_TARGET,
        TrayCommand::OpenRecordingDevices => config::RECORDING_DEVICES_TARGET,
        TrayCommand::OpenSoundsControlPanel => config::SOUNDS_CONTROL_PANEL_TARGET,
        TrayCommand::OpenSettings => config::SETTINGS_TARGET,
        TrayCommand::SendFeedback => config::FEEDBACK_TARGET,
        TrayCommand::SwitchDevice(_) => return None,
    };
    Some(target)
}

/// Device list provider.
pub trait MainViewModel {
    /// Live list of playback devices, fetched fresh on every call.
    fn all_devices(&self) -> Vec<DeviceSnapshot>;
}

/// Icon glyph source and command sink.
pub trait TrayViewModel {
    fn tray_glyph(&self) -> TrayGlyph;

    fn subscribe_glyph(&self, listener: Box<dyn Fn()>) -> Subscription;

    fn unsubscribe_glyph(&self, subscription: Subscription) -> bool;

    /// Run a command. Failures are logged, never returned.
    fn execute(&self, command: &TrayCommand);

    /// Close the background app-service channel, if one is open.
    fn close_app_service(&self);

    /// Switch the glyph palette to match the taskbar.
    fn set_theme(&self, theme: TaskbarTheme);
}

/// [`MainViewModel`] that asks the device manager every time.
pub struct DeviceListViewModel {
    manager: Rc<dyn AudioDeviceManager>,
}

impl DeviceListViewModel {
    pub fn new(manager: Rc<dyn AudioDeviceManager>) -> Self {
        Self { manager }
    }
}

impl MainViewModel for DeviceListViewModel {
    fn all_devices(&self) -> Vec<DeviceSnapshot> {
        match self.manager.all_devices() {
            Ok(devices) => devices,
            Err(e) => {
                warn!(error = %e, "failed to enumerate playback devices");
                Vec::new()
            }
        }
    }
}

/// Tray view-model backed by the default device facade.
///
/// The glyph is recomputed on every facade notification. Glyph subscribers
/// only hear about it when the kind or theme actually changes.
pub struct SystemTrayViewModel {
    manager: Rc<dyn AudioDeviceManager>,
    device: Rc<dyn VirtualDefaultDevice>,
    launcher: Box<dyn Launcher>,
    theme: Cell<TaskbarTheme>,
    glyph: RefCell<TrayGlyph>,
    glyph_subscribers: Subscribers,
    device_subscription: Cell<Option<Subscription>>,
    feedback_session_open: Cell<bool>,
}

impl SystemTrayViewModel {
    pub fn new(
        manager: Rc<dyn AudioDeviceManager>,
        launcher: Box<dyn Launcher>,
        theme: TaskbarTheme,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let device = manager.virtual_default_device();

            let weak = this.clone();
            let subscription = device.subscribe(Box::new(move || {
                if let Some(view_model) = weak.upgrade() {
                    view_model.refresh_glyph();
                }
            }));

            let glyph = TrayGlyph::render(GlyphKind::for_device(&device.snapshot()), theme);

            Self {
                manager,
                device,
                launcher,
                theme: Cell::new(theme),
                glyph: RefCell::new(glyph),
                glyph_subscribers: Subscribers::new(),
                device_subscription: Cell::new(Some(subscription)),
                feedback_session_open: Cell::new(false),
            }
        })
    }

    /// Recompute the glyph from the facade and notify on change.
    pub fn refresh_glyph(&self) {
        let kind = GlyphKind::for_device(&self.device.snapshot());
        let theme = self.theme.get();

        let changed = {
            let current = self.glyph.borrow();
            current.kind != kind || current.theme != theme
        };
        if !changed {
            return;
        }

        debug!(?kind, ?theme, "tray glyph changed");
        *self.glyph.borrow_mut() = TrayGlyph::render(kind, theme);
        self.glyph_subscribers.notify();
    }

    pub fn is_feedback_session_open(&self) -> bool {
        self.feedback_session_open.get()
    }

    fn switch_device(&self, device_id: &str) {
        match self.manager.set_default_device(device_id) {
            Ok(()) => info!(device_id, "default playback device changed"),
            Err(e) => warn!(device_id, error = %e, "failed to change default playback device"),
        }
    }
}

impl TrayViewModel for SystemTrayViewModel {
    fn tray_glyph(&self) -> TrayGlyph {
        self.glyph.borrow().clone()
    }

    fn subscribe_glyph(&self, listener: Box<dyn Fn()>) -> Subscription {
        self.glyph_subscribers.subscribe(listener)
    }

    fn unsubscribe_glyph(&self, subscription: Subscription) -> bool {
        self.glyph_subscribers.unsubscribe(subscription)
    }

    fn execute(&self, command: &TrayCommand) {
        if let TrayCommand::SwitchDevice(device_id) = command {
            self.switch_device(device_id);
            return;
        }

        let Some(target) = launch_target_for(command) else {
            return;
        };

        match self.launcher.launch(&target) {
            Ok(()) => {
                debug!(?command, target = target.name(), "command launched");
                if *command == TrayCommand::SendFeedback {
                    self.feedback_session_open.set(true);
                }
            }
            Err(e) => warn!(?command, error = %e, "command failed"),
        }
    }

    fn close_app_service(&self) {
        if self.feedback_session_open.replace(false) {
            info!("feedback app service closed");
        }
    }

    fn set_theme(&self, theme: TaskbarTheme) {
        self.theme.set(theme);
        self.refresh_glyph();
    }
}

impl Drop for SystemTrayViewModel {
    fn drop(&mut self) {
        if let Some(subscription) = self.device_subscription.take() {
            self.device.unsubscribe(subscription);
        }
    }
}
