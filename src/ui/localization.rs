//! Display strings and reading direction.

use std::borrow::Cow;

/// Symbolic names for every user-visible string the tray shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    NoDevicesMenuItem,
    NoDeviceTooltip,
    FullMixer,
    LegacyMixer,
    PlaybackDevices,
    RecordingDevices,
    SoundsControlPanel,
    Settings,
    SendFeedback,
    Exit,
}

/// Reading direction used when rendering the context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// Resolves labels for the current locale.
pub trait Localizer {
    fn label(&self, label: Label) -> Cow<'static, str>;

    fn flow_direction(&self) -> FlowDirection;
}

/// Built-in English strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLocalizer {
    flow_direction: FlowDirection,
}

impl EnglishLocalizer {
    pub fn new(flow_direction: FlowDirection) -> Self {
        Self { flow_direction }
    }
}

impl Localizer for EnglishLocalizer {
    fn label(&self, label: Label) -> Cow<'static, str> {
        Cow::Borrowed(match label {
            Label::NoDevicesMenuItem => "No audio devices",
            Label::NoDeviceTooltip => "EarTrumpet: No audio devices",
            Label::FullMixer => "Volume mixer",
            Label::LegacyMixer => "Legacy volume mixer",
            Label::PlaybackDevices => "Playback devices",
            Label::RecordingDevices => "Recording devices",
            Label::SoundsControlPanel => "Sounds",
            Label::Settings => "Settings",
            Label::SendFeedback => "Send feedback",
            Label::Exit => "Exit",
        })
    }

    fn flow_direction(&self) -> FlowDirection {
        self.flow_direction
    }
}
