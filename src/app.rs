//! Application lifecycle.
//!
//! [`App`] is the single-threaded event pump: it drains the event channel
//! into the tray controller until the controller has exited. On Windows,
//! [`run`] builds the real collaborators and drives the pump from the Win32
//! message loop.

use crate::audio::AudioDeviceManager;
use crate::events::AppEvent;
use crate::ui::{TrayHost, TrayIconController};
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use tracing::{debug, warn};

/// Event pump that owns the tray controller.
pub struct App<H: TrayHost> {
    controller: TrayIconController<H>,
    device_manager: Rc<dyn AudioDeviceManager>,
    events: Receiver<AppEvent>,
}

impl<H: TrayHost> App<H> {
    pub fn new(
        controller: TrayIconController<H>,
        device_manager: Rc<dyn AudioDeviceManager>,
        events: Receiver<AppEvent>,
    ) -> Self {
        Self {
            controller,
            device_manager,
            events,
        }
    }

    /// Handle one event on the UI thread.
    pub fn handle_event(&mut self, event: AppEvent) {
        if !self.controller.is_running() {
            debug!(?event, "event after exit ignored");
            return;
        }

        match event {
            AppEvent::AudioEndpointsChanged => {
                // Notifies the facade's subscribers, which queue the follow-up events
                if let Err(e) = self.device_manager.refresh() {
                    warn!(error = %e, "failed to refresh default device");
                }
            }
            AppEvent::DefaultDevicePropertyChanged => self.controller.refresh_tooltip(),
            AppEvent::TrayGlyphChanged => self.controller.refresh_icon(),
            AppEvent::TaskbarThemeChanged(theme) => self.controller.apply_theme(theme),
            AppEvent::Pointer { button, position } => {
                self.controller.handle_pointer(button, position)
            }
        }
    }

    /// Handle everything queued so far. Returns false once the app has exited.
    pub fn pump(&mut self) -> bool {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
            if !self.controller.is_running() {
                return false;
            }
        }
        self.controller.is_running()
    }

    pub fn controller(&self) -> &TrayIconController<H> {
        &self.controller
    }
}

#[cfg(windows)]
pub use win32::run;

#[cfg(windows)]
mod win32 {
    use super::App;
    use crate::audio::{AudioDeviceManager, ComGuard, WindowsDeviceManager};
    use crate::config::LaunchOptions;
    use crate::events::{event_channel, AppEvent};
    use crate::platform::{RegistryPreferences, ShellLauncher};
    use crate::ui::host::{self, MessageWindow, Win32TrayHost};
    use crate::ui::{
        DeviceListViewModel, EnglishLocalizer, Localizer, SystemTrayViewModel, TrayIconController,
    };
    use anyhow::Context;
    use std::rc::Rc;
    use tracing::info;
    use tray_icon::TrayIconEvent;

    /// Run the tray until the user exits.
    pub fn run(options: LaunchOptions) -> anyhow::Result<()> {
        info!(?options, "starting");

        let _com = ComGuard::new().context("COM initialization failed")?;
        let window = MessageWindow::create().context("failed to create message window")?;

        let (events, receiver) = event_channel();
        let events = events.with_waker(window.waker());
        window.forward_theme_changes(events.clone());

        let preferences = RegistryPreferences::load();
        let localizer: Rc<dyn Localizer> =
            Rc::new(EnglishLocalizer::new(preferences.flow_direction()));

        let device_manager: Rc<dyn AudioDeviceManager> = Rc::new(
            WindowsDeviceManager::new(events.clone())
                .context("failed to initialize audio devices")?,
        );
        let main_view_model = Rc::new(DeviceListViewModel::new(device_manager.clone()));
        let tray_view_model = SystemTrayViewModel::new(
            device_manager.clone(),
            Box::new(ShellLauncher),
            preferences.taskbar_theme,
        );

        let pointer_events = events.clone();
        TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
            if let Some((button, position)) = host::pointer_event(&event) {
                pointer_events.send(AppEvent::Pointer { button, position });
            }
        }));

        let controller = TrayIconController::new(
            device_manager.as_ref(),
            main_view_model,
            tray_view_model,
            localizer,
            events,
            Win32TrayHost::new(&window),
        )
        .context("failed to create tray icon")?;

        let mut app = App::new(controller, device_manager, receiver);
        host::run_message_loop(|| {
            app.pump();
        });

        TrayIconEvent::set_event_handler(None::<fn(TrayIconEvent)>);
        info!("stopped");
        Ok(())
    }
}
