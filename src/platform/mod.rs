//! Platform services: glyph rendering, OS preferences, shell launching and
//! process management.
//!
//! Pure helpers build on any host; the Win32 parts sit behind `cfg(windows)`.

pub mod icons;
pub mod process;
pub mod registry;
pub mod shell;

pub use icons::{GlyphKind, TaskbarTheme, TrayGlyph};
pub use process::ProcessError;
pub use registry::{PreferencesError, SystemPreferences};
pub use shell::{LaunchError, LaunchTarget, Launcher, ShellLauncher};

#[cfg(windows)]
pub use registry::RegistryPreferences;
