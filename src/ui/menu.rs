//! Context menu model.
//!
//! The menu is rebuilt from live state on every right-click and handed to the
//! tray host for display. Nothing here touches the OS.

use super::localization::{Label, Localizer};
use super::view_model::TrayCommand;
use crate::audio::DeviceSnapshot;
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// What happens when a menu entry is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Forward to the tray view-model
    Invoke(TrayCommand),
    /// Run the controller's exit sequence
    Exit,
}

/// One row of the context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    DeviceItem {
        label: String,
        checked: bool,
        action: MenuAction,
    },
    StaticCommandItem {
        label: String,
        action: MenuAction,
    },
    Separator,
    DisabledPlaceholder {
        label: String,
    },
}

impl MenuEntry {
    pub fn label(&self) -> Option<&str> {
        match self {
            MenuEntry::DeviceItem { label, .. }
            | MenuEntry::StaticCommandItem { label, .. }
            | MenuEntry::DisabledPlaceholder { label } => Some(label),
            MenuEntry::Separator => None,
        }
    }

    /// The action to run, `None` for separators and disabled rows.
    pub fn action(&self) -> Option<&MenuAction> {
        match self {
            MenuEntry::DeviceItem { action, .. } | MenuEntry::StaticCommandItem { action, .. } => {
                Some(action)
            }
            MenuEntry::Separator | MenuEntry::DisabledPlaceholder { .. } => None,
        }
    }

    pub fn is_checked(&self) -> bool {
        matches!(self, MenuEntry::DeviceItem { checked: true, .. })
    }
}

/// Ordered menu contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MenuDescription {
    pub entries: Vec<MenuEntry>,
}

impl MenuDescription {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Action of the entry at `index`, if that entry is actionable.
    pub fn action_at(&self, index: usize) -> Option<&MenuAction> {
        self.entries.get(index).and_then(MenuEntry::action)
    }
}

/// Primary sort key: decomposed, marks stripped, lowercased.
fn base_letters(name: &str) -> impl Iterator<Item = char> + '_ {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Display-name ordering for the device list.
///
/// Letters compare first with accents and case ignored, so "Écouteurs" sorts
/// among the E's. Ties fall back to accent, then to the ordinal order.
pub fn compare_display_names(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| {
            a.chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase))
        })
        .then_with(|| a.cmp(b))
}

/// Build the context menu.
///
/// Devices come first, sorted by display name, with the current default
/// checked. The static entries below them are always present and always in
/// the same order.
pub fn build_context_menu(
    mut devices: Vec<DeviceSnapshot>,
    default_device_id: Option<&str>,
    localizer: &dyn Localizer,
) -> MenuDescription {
    devices.sort_by(|a, b| compare_display_names(&a.display_name, &b.display_name));

    let mut entries = Vec::with_capacity(devices.len() + 11);

    if devices.is_empty() {
        entries.push(MenuEntry::DisabledPlaceholder {
            label: localizer.label(Label::NoDevicesMenuItem).into_owned(),
        });
    } else {
        entries.extend(devices.into_iter().map(|device| MenuEntry::DeviceItem {
            checked: default_device_id == Some(device.id.as_str()),
            label: device.display_name,
            action: MenuAction::Invoke(TrayCommand::SwitchDevice(device.id)),
        }));
    }

    let item = |label: Label, action: MenuAction| MenuEntry::StaticCommandItem {
        label: localizer.label(label).into_owned(),
        action,
    };

    entries.push(MenuEntry::Separator);
    entries.push(item(Label::FullMixer, MenuAction::Invoke(TrayCommand::OpenMixer)));
    entries.push(item(
        Label::LegacyMixer,
        MenuAction::Invoke(TrayCommand::OpenLegacyMixer),
    ));
    entries.push(MenuEntry::Separator);
    entries.push(item(
        Label::PlaybackDevices,
        MenuAction::Invoke(TrayCommand::OpenPlaybackDevices),
    ));
    entries.push(item(
        Label::RecordingDevices,
        MenuAction::Invoke(TrayCommand::OpenRecordingDevices),
    ));
    entries.push(item(
        Label::SoundsControlPanel,
        MenuAction::Invoke(TrayCommand::OpenSoundsControlPanel),
    ));
    entries.push(MenuEntry::Separator);
    entries.push(item(Label::Settings, MenuAction::Invoke(TrayCommand::OpenSettings)));
    entries.push(item(
        Label::SendFeedback,
        MenuAction::Invoke(TrayCommand::SendFeedback),
    ));
    entries.push(item(Label::Exit, MenuAction::Exit));

    MenuDescription { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::localization::EnglishLocalizer;

    /// Number of entries after the device block.
    const STATIC_TAIL: usize = 11;

    fn expected_tail() -> Vec<MenuEntry> {
        let l = EnglishLocalizer::default();
        let item = |label: Label, action: MenuAction| MenuEntry::StaticCommandItem {
            label: l.label(label).into_owned(),
            action,
        };
        vec![
            MenuEntry::Separator,
            item(Label::FullMixer, MenuAction::Invoke(TrayCommand::OpenMixer)),
            item(Label::LegacyMixer, MenuAction::Invoke(TrayCommand::OpenLegacyMixer)),
            MenuEntry::Separator,
            item(
                Label::PlaybackDevices,
                MenuAction::Invoke(TrayCommand::OpenPlaybackDevices),
            ),
            item(
                Label::RecordingDevices,
                MenuAction::Invoke(TrayCommand::OpenRecordingDevices),
            ),
            item(
                Label::SoundsControlPanel,
                MenuAction::Invoke(TrayCommand::OpenSoundsControlPanel),
            ),
            MenuEntry::Separator,
            item(Label::Settings, MenuAction::Invoke(TrayCommand::OpenSettings)),
            item(Label::SendFeedback, MenuAction::Invoke(TrayCommand::SendFeedback)),
            item(Label::Exit, MenuAction::Exit),
        ]
    }

    fn device_item(label: &str, id: &str, checked: bool) -> MenuEntry {
        MenuEntry::DeviceItem {
            label: label.to_string(),
            checked,
            action: MenuAction::Invoke(TrayCommand::SwitchDevice(id.to_string())),
        }
    }

    #[test]
    fn test_speakers_and_headphones_scenario() {
        let devices = vec![
            DeviceSnapshot::new("spk", "Speakers"),
            DeviceSnapshot::new("hp", "Headphones"),
        ];
        let menu = build_context_menu(devices, Some("spk"), &EnglishLocalizer::default());

        assert_eq!(menu.entries[0], device_item("Headphones", "hp", false));
        assert_eq!(menu.entries[1], device_item("Speakers", "spk", true));
        assert_eq!(menu.entries[2..], expected_tail()[..]);
        assert_eq!(menu.len(), 2 + STATIC_TAIL);
    }

    #[test]
    fn test_empty_device_list_shows_placeholder() {
        let menu = build_context_menu(Vec::new(), Some("spk"), &EnglishLocalizer::default());

        assert_eq!(
            menu.entries[0],
            MenuEntry::DisabledPlaceholder {
                label: "No audio devices".to_string()
            }
        );
        assert_eq!(menu.action_at(0), None);
        assert_eq!(menu.entries[1..], expected_tail()[..]);
        assert_eq!(menu.len(), 1 + STATIC_TAIL);
    }

    #[test]
    fn test_static_tail_is_identical_for_any_list() {
        for count in 0..6 {
            let devices: Vec<_> = (0..count)
                .map(|i| DeviceSnapshot::new(format!("id{i}"), format!("Device {i}")))
                .collect();
            let menu = build_context_menu(devices, None, &EnglishLocalizer::default());
            let tail = &menu.entries[menu.len() - STATIC_TAIL..];
            assert_eq!(tail, &expected_tail()[..]);
        }
    }

    #[test]
    fn test_at_most_one_checked() {
        let devices = vec![
            DeviceSnapshot::new("a", "Alpha"),
            DeviceSnapshot::new("b", "Bravo"),
            DeviceSnapshot::new("c", "Charlie"),
        ];
        let l = EnglishLocalizer::default();

        for id in ["a", "b", "c"] {
            let menu = build_context_menu(devices.clone(), Some(id), &l);
            let checked: Vec<_> = menu.entries.iter().filter(|e| e.is_checked()).collect();
            assert_eq!(checked.len(), 1);
            assert_eq!(
                checked[0].action(),
                Some(&MenuAction::Invoke(TrayCommand::SwitchDevice(id.to_string())))
            );
        }

        let unknown = build_context_menu(devices.clone(), Some("zzz"), &l);
        assert_eq!(unknown.entries.iter().filter(|e| e.is_checked()).count(), 0);

        let unset = build_context_menu(devices, None, &l);
        assert_eq!(unset.entries.iter().filter(|e| e.is_checked()).count(), 0);
    }

    #[test]
    fn test_sort_is_case_insensitive_and_stable() {
        let devices = vec![
            DeviceSnapshot::new("1", "speakers"),
            DeviceSnapshot::new("2", "Headset"),
            DeviceSnapshot::new("3", "Monitor"),
            DeviceSnapshot::new("4", "headset"),
            DeviceSnapshot::new("5", "Monitor"),
        ];
        let menu = build_context_menu(devices, None, &EnglishLocalizer::default());
        let ids: Vec<_> = menu
            .entries
            .iter()
            .take(5)
            .map(|e| match e.action() {
                Some(MenuAction::Invoke(TrayCommand::SwitchDevice(id))) => id.as_str(),
                other => panic!("unexpected entry {other:?}"),
            })
            .collect();

        // "Headset" < "headset" ordinally; equal names keep input order
        assert_eq!(ids, ["2", "4", "3", "5", "1"]);
    }

    #[test]
    fn test_compare_display_names() {
        assert_eq!(compare_display_names("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_display_names("Zed", "alpha"), Ordering::Greater);
        assert_eq!(compare_display_names("Same", "Same"), Ordering::Equal);
    }

    #[test]
    fn test_accented_names_sort_with_their_base_letter() {
        let devices = vec![
            DeviceSnapshot::new("hp", "Haut-parleurs (Realtek)"),
            DeviceSnapshot::new("ec", "Écouteurs (USB)"),
            DeviceSnapshot::new("zu", "Zune"),
            DeviceSnapshot::new("ar", "Ärmelmikro"),
        ];
        let menu = build_context_menu(devices, None, &EnglishLocalizer::default());
        let labels: Vec<_> = menu.entries[..4].iter().filter_map(MenuEntry::label).collect();

        assert_eq!(
            labels,
            ["Ärmelmikro", "Écouteurs (USB)", "Haut-parleurs (Realtek)", "Zune"]
        );
    }

    #[test]
    fn test_accent_breaks_ties_before_ordinal() {
        assert_eq!(compare_display_names("Résumé", "Resume"), Ordering::Greater);
        assert_eq!(compare_display_names("resume", "Résumé"), Ordering::Less);
        assert_eq!(compare_display_names("écran", "Ecran"), Ordering::Greater);
    }
}
