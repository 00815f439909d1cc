//! Events delivered to the UI thread.
//!
//! Everything that can change what the tray shows funnels through one channel
//! so the controller only ever runs on the thread that owns the icon.

use crate::platform::TaskbarTheme;
use crate::ui::{PointerButton, Position};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Work item for the UI thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// Endpoint set, default endpoint or endpoint volume changed (raised off-thread)
    AudioEndpointsChanged,

    /// The virtual default device reported a property change
    DefaultDevicePropertyChanged,

    /// The tray view-model reported a new icon glyph
    TrayGlyphChanged,

    /// The user switched between light and dark taskbar colors
    TaskbarThemeChanged(TaskbarTheme),

    /// Pointer button released over the tray icon
    Pointer {
        button: PointerButton,
        position: Position,
    },
}

/// Cloneable sending half of the UI event channel.
///
/// An optional waker is invoked after every successful send so a blocking
/// message loop gets a chance to drain the channel.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<AppEvent>,
    waker: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl EventSender {
    pub fn new(sender: Sender<AppEvent>) -> Self {
        Self {
            sender,
            waker: None,
        }
    }

    /// Attach a function that wakes the UI thread.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    /// Queue an event. Events sent after the receiver is gone are dropped.
    pub fn send(&self, event: AppEvent) {
        if self.sender.send(event).is_ok() {
            if let Some(wake) = &self.waker {
                wake();
            }
        }
    }
}

/// Create the UI event channel.
pub fn event_channel() -> (EventSender, Receiver<AppEvent>) {
    let (sender, receiver) = channel();
    (EventSender::new(sender), receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_waker_runs_after_send() {
        let (sender, receiver) = event_channel();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let sender = sender.with_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sender.send(AppEvent::TrayGlyphChanged);
        sender.send(AppEvent::AudioEndpointsChanged);

        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert_eq!(receiver.try_recv(), Ok(AppEvent::TrayGlyphChanged));
        assert_eq!(receiver.try_recv(), Ok(AppEvent::AudioEndpointsChanged));
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (sender, receiver) = event_channel();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let sender = sender.with_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(receiver);

        sender.send(AppEvent::DefaultDevicePropertyChanged);
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
    }
}
