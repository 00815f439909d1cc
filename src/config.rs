//! Application constants.
//!
//! Nothing here is persisted; user-facing OS preferences are read at startup
//! by [`crate::platform::registry`].

use crate::platform::shell::LaunchTarget;

/// Product name shown in the tooltip prefix.
pub const APP_NAME: &str = "EarTrumpet";

/// Companion helper process terminated on exit (name without extension).
pub const HELPER_PROCESS_NAME: &str = "EarTrumpet.UWP";

/// Maximum tooltip length accepted by the notification area.
pub const TOOLTIP_MAX_CHARS: usize = 63;

/// Compact volume popup opened on primary click.
pub const FLYOUT_TARGET: LaunchTarget = LaunchTarget::Program {
    program: "sndvol.exe",
    args: &["-f"],
};

pub const MIXER_TARGET: LaunchTarget = LaunchTarget::Uri("ms-settings:apps-volume");

pub const LEGACY_MIXER_TARGET: LaunchTarget = LaunchTarget::Program {
    program: "sndvol.exe",
    args: &[],
};

// mmsys.cpl tab indices: 0 playback, 1 recording, 2 sounds
pub const PLAYBACK_DEVICES_TARGET: LaunchTarget = LaunchTarget::Program {
    program: "rundll32.exe",
    args: &["shell32.dll,Control_RunDLL", "mmsys.cpl,,0"],
};

pub const RECORDING_DEVICES_TARGET: LaunchTarget = LaunchTarget::Program {
    program: "rundll32.exe",
    args: &["shell32.dll,Control_RunDLL", "mmsys.cpl,,1"],
};

pub const SOUNDS_CONTROL_PANEL_TARGET: LaunchTarget = LaunchTarget::Program {
    program: "rundll32.exe",
    args: &["shell32.dll,Control_RunDLL", "mmsys.cpl,,2"],
};

pub const SETTINGS_TARGET: LaunchTarget = LaunchTarget::Uri("ms-settings:sound");

pub const FEEDBACK_TARGET: LaunchTarget = LaunchTarget::Uri("feedback-hub:");

/// Command line flag that attaches a console and enables log output.
pub const DEBUG_FLAG: &str = "--debug";

/// Runtime options parsed from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Attach a console window and write logs to it
    pub debug: bool,
}

impl LaunchOptions {
    /// Parse options from process arguments (excluding the program name).
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let debug = args
            .into_iter()
            .any(|arg| arg.as_ref() == DEBUG_FLAG || arg.as_ref() == "-d");
        Self { debug }
    }
}
