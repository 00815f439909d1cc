//! Tray glyph selection and rendering.
//!
//! Glyphs are drawn programmatically into 32x32 RGBA buffers, one per
//! volume band, in the taskbar's foreground color.

use crate::audio::DeviceSnapshot;
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Icon size in pixels.
pub const ICON_SIZE: u32 = 32;

/// Which speaker glyph the tray shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphKind {
    NoDevice,
    Muted,
    SpeakerZeroBars,
    SpeakerOneBar,
    SpeakerTwoBars,
    SpeakerThreeBars,
}

impl GlyphKind {
    /// Pick the glyph for the default device state.
    pub fn for_device(device: &DeviceSnapshot) -> Self {
        if !device.is_present {
            GlyphKind::NoDevice
        } else if device.is_muted {
            GlyphKind::Muted
        } else {
            match device.volume_percent {
                0 => GlyphKind::SpeakerZeroBars,
                1..=32 => GlyphKind::SpeakerOneBar,
                33..=65 => GlyphKind::SpeakerTwoBars,
                _ => GlyphKind::SpeakerThreeBars,
            }
        }
    }

    fn bars(self) -> u32 {
        match self {
            GlyphKind::SpeakerOneBar => 1,
            GlyphKind::SpeakerTwoBars => 2,
            GlyphKind::SpeakerThreeBars => 3,
            _ => 0,
        }
    }
}

/// Taskbar color scheme; decides the glyph foreground color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskbarTheme {
    #[default]
    Dark,
    Light,
}

impl TaskbarTheme {
    fn foreground(self) -> [u8; 3] {
        match self {
            TaskbarTheme::Dark => [255, 255, 255],
            TaskbarTheme::Light => [0, 0, 0],
        }
    }
}

/// A rendered tray glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct TrayGlyph {
    pub kind: GlyphKind,
    pub theme: TaskbarTheme,
    image: Arc<RgbaImage>,
}

impl TrayGlyph {
    pub fn render(kind: GlyphKind, theme: TaskbarTheme) -> Self {
        Self {
            kind,
            theme,
            image: Arc::new(draw_glyph(kind, theme)),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

fn draw_glyph(kind: GlyphKind, theme: TaskbarTheme) -> RgbaImage {
    let mut image = RgbaImage::new(ICON_SIZE, ICON_SIZE);
    let [r, g, b] = theme.foreground();

    // The no-device glyph is a faded speaker
    let alpha = if kind == GlyphKind::NoDevice { 110 } else { 255 };
    let color = Rgba([r, g, b, alpha]);

    draw_speaker(&mut image, color);

    for bar in 1..=kind.bars() {
        draw_arc(&mut image, 6.0 + 4.0 * bar as f32, color);
    }

    if kind == GlyphKind::Muted {
        draw_cross(&mut image, color);
    }

    image
}

/// Speaker body and cone on the left half.
fn draw_speaker(image: &mut RgbaImage, color: Rgba<u8>) {
    for y in 12..20 {
        for x in 4..9 {
            image.put_pixel(x, y, color);
        }
    }

    for x in 9..15u32 {
        let spread = x - 9;
        for y in (12 - spread)..(20 + spread) {
            image.put_pixel(x, y, color);
        }
    }
}

/// Sound wave arc centered on the cone.
fn draw_arc(image: &mut RgbaImage, radius: f32, color: Rgba<u8>) {
    let (cx, cy) = (14.0f32, 16.0f32);
    for y in 0..ICON_SIZE {
        for x in 16..ICON_SIZE {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            // Only the right-facing 90 degree sector
            if (dist - radius).abs() < 1.0 && dy.abs() <= dx {
                image.put_pixel(x, y, color);
            }
        }
    }
}

/// Diagonal cross to the right of the cone.
fn draw_cross(image: &mut RgbaImage, color: Rgba<u8>) {
    let thickness = 2;
    for i in 0..10u32 {
        for t in 0..thickness {
            image.put_pixel(19 + i, 11 + i + t.min(9 - i), color);
            image.put_pixel(28 - i, 11 + i + t.min(9 - i), color);
        }
    }
}
