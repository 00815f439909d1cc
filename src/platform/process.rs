//! Terminating companion processes by executable name.

use thiserror::Error;

/// Process termination error types.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to snapshot running processes: {0}")]
    Snapshot(String),

    #[error("Failed to terminate process {pid}: {reason}")]
    Terminate { pid: u32, reason: String },
}

/// Whether an executable file name refers to the process `name`.
///
/// Comparison ignores ASCII case and an optional `.exe` suffix on either side.
pub fn matches_process_name(exe_file: &str, name: &str) -> bool {
    fn stem(s: &str) -> &str {
        let len = s.len();
        if len > 4 && s.is_char_boundary(len - 4) && s[len - 4..].eq_ignore_ascii_case(".exe") {
            &s[..len - 4]
        } else {
            s
        }
    }
    !name.is_empty() && stem(exe_file).eq_ignore_ascii_case(stem(name))
}

#[cfg(windows)]
pub use win32::terminate_by_name;

#[cfg(windows)]
mod win32 {
    use super::{matches_process_name, ProcessError};
    use tracing::{debug, warn};
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
        TH32CS_SNAPPROCESS,
    };
    use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

    /// Closes a kernel handle on drop.
    struct OwnedHandle(HANDLE);

    impl Drop for OwnedHandle {
        fn drop(&mut self) {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }

    fn exe_name(entry: &PROCESSENTRY32W) -> String {
        let len = entry
            .szExeFile
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(entry.szExeFile.len());
        String::from_utf16_lossy(&entry.szExeFile[..len])
    }

    /// Terminate every running process named `name`. Returns how many were
    /// terminated. Zero matches is not an error.
    pub fn terminate_by_name(name: &str) -> Result<usize, ProcessError> {
        let pids = matching_pids(name)?;
        let mut terminated = 0;
        let mut last_error = None;

        for pid in pids {
            match terminate(pid) {
                Ok(()) => {
                    debug!(pid, name, "terminated process");
                    terminated += 1;
                }
                Err(e) => {
                    warn!(pid, name, error = %e, "failed to terminate process");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if terminated == 0 => Err(e),
            _ => Ok(terminated),
        }
    }

    fn matching_pids(name: &str) -> Result<Vec<u32>, ProcessError> {
        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
                .map_err(|e| ProcessError::Snapshot(e.to_string()))?;
            let snapshot = OwnedHandle(snapshot);

            let mut entry = PROCESSENTRY32W {
                dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
                ..Default::default()
            };

            let mut pids = Vec::new();
            if Process32FirstW(snapshot.0, &mut entry).is_err() {
                return Ok(pids);
            }

            loop {
                if matches_process_name(&exe_name(&entry), name) {
                    pids.push(entry.th32ProcessID);
                }
                if Process32NextW(snapshot.0, &mut entry).is_err() {
                    break;
                }
            }

            Ok(pids)
        }
    }

    fn terminate(pid: u32) -> Result<(), ProcessError> {
        unsafe {
            let handle =
                OpenProcess(PROCESS_TERMINATE, false, pid).map_err(|e| ProcessError::Terminate {
                    pid,
                    reason: e.to_string(),
                })?;
            let handle = OwnedHandle(handle);

            TerminateProcess(handle.0, 1).map_err(|e| ProcessError::Terminate {
                pid,
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_with_or_without_extension() {
        assert!(matches_process_name("EarTrumpet.UWP.exe", "EarTrumpet.UWP"));
        assert!(matches_process_name("eartrumpet.uwp.EXE", "EarTrumpet.UWP"));
        assert!(matches_process_name("EarTrumpet.UWP", "EarTrumpet.UWP.exe"));
        assert!(matches_process_name("EarTrumpet.UWP.exe", "EarTrumpet.UWP.exe"));
    }

    #[test]
    fn test_rejects_other_names() {
        assert!(!matches_process_name("EarTrumpet.exe", "EarTrumpet.UWP"));
        assert!(!matches_process_name("EarTrumpet.UWP.Helper.exe", "EarTrumpet.UWP"));
        assert!(!matches_process_name("explorer.exe", ""));
        assert!(!matches_process_name(".exe", "exe"));
    }
}
