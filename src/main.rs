#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eartrumpet_rs::config::LaunchOptions;
use eartrumpet_rs::logging;

fn main() -> anyhow::Result<()> {
    let options = LaunchOptions::from_args(std::env::args().skip(1));

    if options.debug {
        attach_console();
    }
    logging::init();

    run(options)
}

/// GUI-subsystem builds have no console to log to.
#[cfg(windows)]
fn attach_console() {
    unsafe {
        let _ = windows::Win32::System::Console::AllocConsole();
    }
}

#[cfg(not(windows))]
fn attach_console() {}

#[cfg(windows)]
fn run(options: LaunchOptions) -> anyhow::Result<()> {
    eartrumpet_rs::app::run(options)
}

#[cfg(not(windows))]
fn run(_options: LaunchOptions) -> anyhow::Result<()> {
    anyhow::bail!("the tray controller only runs on Windows")
}
