//! In-memory doubles for the tray's collaborators.

use crate::audio::{
    AudioDeviceManager, AudioError, DeviceSnapshot, Subscribers, Subscription,
    VirtualDefaultDevice,
};
use crate::platform::icons::{GlyphKind, TaskbarTheme, TrayGlyph};
use crate::platform::process::ProcessError;
use crate::platform::shell::{LaunchError, LaunchTarget, Launcher};
use crate::ui::menu::MenuDescription;
use crate::ui::tray::{Position, TrayError, TrayHost};
use crate::ui::view_model::{TrayCommand, TrayViewModel};
use crate::ui::FlowDirection;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Default device facade whose state tests set directly. Every mutation
/// notifies subscribers, like the real facade does after a refresh.
pub struct FakeDefaultDevice {
    state: RefCell<DeviceSnapshot>,
    subscribers: Subscribers,
    fail_mute: Cell<bool>,
}

impl FakeDefaultDevice {
    pub fn present(id: &str, name: &str, volume: u8) -> Rc<Self> {
        Self::from_snapshot(DeviceSnapshot::new(id, name).with_volume(volume))
    }

    pub fn absent() -> Rc<Self> {
        Self::from_snapshot(DeviceSnapshot::absent())
    }

    fn from_snapshot(snapshot: DeviceSnapshot) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(snapshot),
            subscribers: Subscribers::new(),
            fail_mute: Cell::new(false),
        })
    }

    fn update(&self, change: impl FnOnce(&mut DeviceSnapshot)) {
        change(&mut self.state.borrow_mut());
        self.subscribers.notify();
    }

    pub fn set_volume(&self, volume: u8) {
        self.update(|state| state.volume_percent = volume.min(100));
    }

    pub fn set_absent(&self) {
        self.update(|state| *state = DeviceSnapshot::absent());
    }

    /// Become another device, as after a default switch.
    pub fn become_device(&self, snapshot: DeviceSnapshot) {
        self.update(|state| *state = snapshot);
    }

    pub fn fail_mute(&self) {
        self.fail_mute.set(true);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl VirtualDefaultDevice for FakeDefaultDevice {
    fn id(&self) -> Option<String> {
        let state = self.state.borrow();
        state.is_present.then(|| state.id.clone())
    }

    fn display_name(&self) -> String {
        self.state.borrow().display_name.clone()
    }

    fn volume_percent(&self) -> u8 {
        self.state.borrow().volume_percent
    }

    fn is_muted(&self) -> bool {
        self.state.borrow().is_muted
    }

    fn set_muted(&self, muted: bool) -> Result<(), AudioError> {
        if self.fail_mute.get() {
            return Err(AudioError::VolumeNotAvailable);
        }
        self.update(|state| state.is_muted = muted);
        Ok(())
    }

    fn is_present(&self) -> bool {
        self.state.borrow().is_present
    }

    fn subscribe(&self, listener: Box<dyn Fn()>) -> Subscription {
        self.subscribers.subscribe(listener)
    }

    fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.subscribers.unsubscribe(subscription)
    }
}

/// Device manager over a fixed device list.
pub struct FakeDeviceManager {
    device: Rc<FakeDefaultDevice>,
    devices: RefCell<Vec<DeviceSnapshot>>,
    all_devices_calls: Cell<usize>,
    refreshes: Cell<usize>,
    switched: RefCell<Vec<String>>,
    fail_enumeration: Cell<bool>,
}

impl FakeDeviceManager {
    pub fn new(device: Rc<FakeDefaultDevice>, devices: Vec<DeviceSnapshot>) -> Rc<Self> {
        Rc::new(Self {
            device,
            devices: RefCell::new(devices),
            all_devices_calls: Cell::new(0),
            refreshes: Cell::new(0),
            switched: RefCell::new(Vec::new()),
            fail_enumeration: Cell::new(false),
        })
    }

    pub fn set_devices(&self, devices: Vec<DeviceSnapshot>) {
        *self.devices.borrow_mut() = devices;
    }

    pub fn fail_enumeration(&self) {
        self.fail_enumeration.set(true);
    }

    pub fn all_devices_calls(&self) -> usize {
        self.all_devices_calls.get()
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.get()
    }

    pub fn switched(&self) -> Vec<String> {
        self.switched.borrow().clone()
    }
}

impl AudioDeviceManager for FakeDeviceManager {
    fn virtual_default_device(&self) -> Rc<dyn VirtualDefaultDevice> {
        self.device.clone()
    }

    fn all_devices(&self) -> Result<Vec<DeviceSnapshot>, AudioError> {
        self.all_devices_calls.set(self.all_devices_calls.get() + 1);
        if self.fail_enumeration.get() {
            return Err(AudioError::StringConversion("enumeration failed".into()));
        }
        Ok(self.devices.borrow().clone())
    }

    fn set_default_device(&self, device_id: &str) -> Result<(), AudioError> {
        let target = self
            .devices
            .borrow()
            .iter()
            .find(|d| d.id == device_id)
            .cloned()
            .ok_or_else(|| AudioError::DeviceNotFound {
                device_id: device_id.to_string(),
            })?;

        self.switched.borrow_mut().push(device_id.to_string());
        self.device.become_device(target);
        Ok(())
    }

    fn refresh(&self) -> Result<(), AudioError> {
        self.refreshes.set(self.refreshes.get() + 1);
        self.device.subscribers.notify();
        Ok(())
    }
}

/// Tray view-model that records what it is asked to do.
pub struct FakeTrayViewModel {
    glyph: RefCell<TrayGlyph>,
    subscribers: Subscribers,
    executed: RefCell<Vec<TrayCommand>>,
    closes: Cell<usize>,
    themes: RefCell<Vec<TaskbarTheme>>,
}

impl FakeTrayViewModel {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            glyph: RefCell::new(TrayGlyph::render(
                GlyphKind::SpeakerTwoBars,
                TaskbarTheme::Dark,
            )),
            subscribers: Subscribers::new(),
            executed: RefCell::new(Vec::new()),
            closes: Cell::new(0),
            themes: RefCell::new(Vec::new()),
        })
    }

    pub fn set_glyph(&self, kind: GlyphKind) {
        *self.glyph.borrow_mut() = TrayGlyph::render(kind, TaskbarTheme::Dark);
        self.subscribers.notify();
    }

    pub fn executed(&self) -> Vec<TrayCommand> {
        self.executed.borrow().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.get()
    }

    pub fn themes(&self) -> Vec<TaskbarTheme> {
        self.themes.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl TrayViewModel for FakeTrayViewModel {
    fn tray_glyph(&self) -> TrayGlyph {
        self.glyph.borrow().clone()
    }

    fn subscribe_glyph(&self, listener: Box<dyn Fn()>) -> Subscription {
        self.subscribers.subscribe(listener)
    }

    fn unsubscribe_glyph(&self, subscription: Subscription) -> bool {
        self.subscribers.unsubscribe(subscription)
    }

    fn execute(&self, command: &TrayCommand) {
        self.executed.borrow_mut().push(command.clone());
    }

    fn close_app_service(&self) {
        self.closes.set(self.closes.get() + 1);
    }

    fn set_theme(&self, theme: TaskbarTheme) {
        self.themes.borrow_mut().push(theme);
        let kind = self.glyph.borrow().kind;
        *self.glyph.borrow_mut() = TrayGlyph::render(kind, theme);
        self.subscribers.notify();
    }
}

/// One call made on [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    CreateIcon { kind: GlyphKind, tooltip: String },
    SetIcon(GlyphKind),
    SetTooltip(String),
    SetVisible(bool),
    ShowMenu {
        entries: usize,
        position: Position,
        flow_direction: FlowDirection,
    },
    Terminate(String),
    Dispose,
    RequestShutdown,
}

/// Tray host that records calls and picks a scripted menu entry.
#[derive(Default)]
pub struct RecordingHost {
    calls: Vec<HostCall>,
    last_menu: Option<MenuDescription>,
    menu_choice: Option<usize>,
    fail_create: bool,
    fail_terminate: bool,
    helper_processes: usize,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    /// Pick the entry at `index` whenever a menu is shown.
    pub fn choosing(mut self, index: usize) -> Self {
        self.menu_choice = Some(index);
        self
    }

    pub fn failing_terminate(mut self) -> Self {
        self.fail_terminate = true;
        self
    }

    pub fn with_helper_processes(mut self, count: usize) -> Self {
        self.helper_processes = count;
        self
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn last_menu(&self) -> Option<&MenuDescription> {
        self.last_menu.as_ref()
    }

    pub fn shutdown_requests(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == HostCall::RequestShutdown)
            .count()
    }
}

impl TrayHost for RecordingHost {
    fn create_icon(&mut self, glyph: &TrayGlyph, tooltip: &str) -> Result<(), TrayError> {
        if self.fail_create {
            return Err(TrayError::CreateFailed("notification area unavailable".into()));
        }
        self.calls.push(HostCall::CreateIcon {
            kind: glyph.kind,
            tooltip: tooltip.to_string(),
        });
        Ok(())
    }

    fn set_icon(&mut self, glyph: &TrayGlyph) -> Result<(), TrayError> {
        self.calls.push(HostCall::SetIcon(glyph.kind));
        Ok(())
    }

    fn set_tooltip(&mut self, text: &str) -> Result<(), TrayError> {
        self.calls.push(HostCall::SetTooltip(text.to_string()));
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), TrayError> {
        self.calls.push(HostCall::SetVisible(visible));
        Ok(())
    }

    fn show_context_menu(
        &mut self,
        menu: &MenuDescription,
        position: Position,
        flow_direction: FlowDirection,
    ) -> Result<Option<usize>, TrayError> {
        self.calls.push(HostCall::ShowMenu {
            entries: menu.len(),
            position,
            flow_direction,
        });
        self.last_menu = Some(menu.clone());
        Ok(self.menu_choice)
    }

    fn terminate_processes(&mut self, name: &str) -> Result<usize, ProcessError> {
        self.calls.push(HostCall::Terminate(name.to_string()));
        if self.fail_terminate {
            return Err(ProcessError::Terminate {
                pid: 4242,
                reason: "access denied".into(),
            });
        }
        Ok(self.helper_processes)
    }

    fn dispose(&mut self) {
        self.calls.push(HostCall::Dispose);
    }

    fn request_shutdown(&mut self) {
        self.calls.push(HostCall::RequestShutdown);
    }
}

/// Launcher that records targets, optionally failing every launch.
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    launched: Rc<RefCell<Vec<LaunchTarget>>>,
    fail: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn launched(&self) -> Vec<LaunchTarget> {
        self.launched.borrow().clone()
    }
}

impl Launcher for RecordingLauncher {
    fn launch(&self, target: &LaunchTarget) -> Result<(), LaunchError> {
        if self.fail {
            return Err(LaunchError::SpawnFailed {
                program: target.name().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }
        self.launched.borrow_mut().push(*target);
        Ok(())
    }
}
