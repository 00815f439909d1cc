//! Tray tooltip text.

use crate::config::{APP_NAME, TOOLTIP_MAX_CHARS};

/// Widest possible prefix. The name budget is computed against this literal,
/// not the actual digit count, so short volumes leave a few characters unused.
pub const PREFIX_TEMPLATE: &str = "EarTrumpet: 100% - ";

/// Maximum length of the device name portion.
pub const MAX_NAME_LEN: usize = TOOLTIP_MAX_CHARS - PREFIX_TEMPLATE.len();

/// Format the tooltip for the default device.
///
/// Lengths are measured in UTF-16 code units, the unit of the notification
/// area's tooltip buffer; truncation never splits a character.
pub fn format_tooltip(
    is_present: bool,
    volume_percent: u8,
    display_name: &str,
    no_device_text: &str,
) -> String {
    if !is_present {
        return truncate_utf16(no_device_text, TOOLTIP_MAX_CHARS).to_string();
    }

    let name = truncate_utf16(display_name, MAX_NAME_LEN);
    format!("{}: {}% - {}", APP_NAME, volume_percent.min(100), name)
}

/// Longest prefix of `text` that fits in `max_units` UTF-16 code units.
pub fn truncate_utf16(text: &str, max_units: usize) -> &str {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > max_units {
            return &text[..index];
        }
    }
    text
}
