//! Launching system dialogs and settings pages.

use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Something the shell can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchTarget {
    /// Executable on the search path plus fixed arguments
    Program {
        program: &'static str,
        args: &'static [&'static str],
    },
    /// Protocol URI such as `ms-settings:sound`
    Uri(&'static str),
}

impl LaunchTarget {
    /// Program name or URI, for logs and errors.
    pub fn name(&self) -> &'static str {
        match *self {
            LaunchTarget::Program { program, .. } => program,
            LaunchTarget::Uri(uri) => uri,
        }
    }
}

/// Shell launch error types.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to start {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open {uri}: {source}")]
    OpenFailed {
        uri: String,
        #[source]
        source: std::io::Error,
    },
}

/// Starts external programs on behalf of the tray.
pub trait Launcher {
    fn launch(&self, target: &LaunchTarget) -> Result<(), LaunchError>;
}

/// [`Launcher`] for the real shell. Programs are spawned and not awaited;
/// URIs are opened with the `open` crate (ShellExecute on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellLauncher;

impl Launcher for ShellLauncher {
    fn launch(&self, target: &LaunchTarget) -> Result<(), LaunchError> {
        match *target {
            LaunchTarget::Program { program, args } => {
                debug!(program, ?args, "launching");
                Command::new(program)
                    .args(args)
                    .spawn()
                    .map(|_| ())
                    .map_err(|source| LaunchError::SpawnFailed {
                        program: program.to_string(),
                        source,
                    })
            }
            LaunchTarget::Uri(uri) => {
                debug!(uri, "opening");
                open::that(uri).map_err(|source| LaunchError::OpenFailed {
                    uri: uri.to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_names() {
        let program = LaunchTarget::Program {
            program: "sndvol.exe",
            args: &["-f"],
        };
        assert_eq!(program.name(), "sndvol.exe");
        assert_eq!(LaunchTarget::Uri("ms-settings:sound").name(), "ms-settings:sound");
    }

    #[test]
    fn test_open_failure_names_the_uri() {
        let err = LaunchError::OpenFailed {
            uri: "feedback-hub:".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no handler"),
        };
        assert_eq!(err.to_string(), "Failed to open feedback-hub:: no handler");
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let target = LaunchTarget::Program {
            program: "definitely-not-a-real-program-6c1f0e",
            args: &[],
        };
        let err = ShellLauncher.launch(&target).unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-real-program-6c1f0e"));
    }
}
