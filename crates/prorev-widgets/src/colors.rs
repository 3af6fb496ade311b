//! Tailwind shades and pen color swatches.

use egui::{vec2, Color32, CursorIcon, Rect, Sense, Stroke, Ui, Vec2};

use crate::{sizing, theme};

/// Index of the 400 shade in [`TailwindColor::shades`].
pub const SHADE_400: usize = 4;
/// Index of the 500 shade.
pub const SHADE_500: usize = 5;

/// A Tailwind color with all shade variants (50-950).
#[derive(Clone, Copy)]
pub struct TailwindColor {
    pub name: &'static str,
    /// Shades from 50 to 950 (11 total)
    pub shades: [Color32; 11],
}

impl TailwindColor {
    pub const fn new(name: &'static str, shades: [(u8, u8, u8); 11]) -> Self {
        let mut out = [Color32::BLACK; 11];
        let mut i = 0;
        while i < 11 {
            out[i] = Color32::from_rgb(shades[i].0, shades[i].1, shades[i].2);
            i += 1;
        }
        Self { name, shades: out }
    }

    /// The 500 shade.
    pub const fn primary(&self) -> Color32 {
        self.shades[SHADE_500]
    }

    /// Shade by index (0=50, 1=100, ..., 5=500, ..., 10=950)
    pub const fn shade(&self, index: usize) -> Color32 {
        self.shades[index]
    }
}

// https://tailwindcss.com/docs/colors
pub const RED: TailwindColor = TailwindColor::new("Red", [
    (254, 242, 242), (254, 226, 226), (254, 202, 202), (252, 165, 165),
    (248, 113, 113), (239, 68, 68), (220, 38, 38), (185, 28, 28),
    (153, 27, 27), (127, 29, 29), (69, 10, 10),
]);
pub const AMBER: TailwindColor = TailwindColor::new("Amber", [
    (255, 251, 235), (254, 243, 199), (253, 230, 138), (252, 211, 77),
    (251, 191, 36), (245, 158, 11), (217, 119, 6), (180, 83, 9),
    (146, 64, 14), (120, 53, 15), (69, 26, 3),
]);
pub const GREEN: TailwindColor = TailwindColor::new("Green", [
    (240, 253, 244), (220, 252, 231), (187, 247, 208), (134, 239, 172),
    (74, 222, 128), (34, 197, 94), (22, 163, 74), (21, 128, 61),
    (22, 101, 52), (20, 83, 45), (5, 46, 22),
]);
pub const CYAN: TailwindColor = TailwindColor::new("Cyan", [
    (236, 254, 255), (207, 250, 254), (165, 243, 252), (103, 232, 249),
    (34, 211, 238), (6, 182, 212), (8, 145, 178), (14, 116, 144),
    (21, 94, 117), (22, 78, 99), (8, 51, 68),
]);
pub const BLUE: TailwindColor = TailwindColor::new("Blue", [
    (239, 246, 255), (219, 234, 254), (191, 219, 254), (147, 197, 253),
    (96, 165, 250), (59, 130, 246), (37, 99, 235), (29, 78, 216),
    (30, 64, 175), (30, 58, 138), (23, 37, 84),
]);
pub const VIOLET: TailwindColor = TailwindColor::new("Violet", [
    (245, 243, 255), (237, 233, 254), (221, 214, 254), (196, 181, 253),
    (167, 139, 250), (139, 92, 246), (124, 58, 237), (109, 40, 217),
    (91, 33, 182), (76, 29, 149), (46, 16, 101),
]);
pub const GRAY: TailwindColor = TailwindColor::new("Gray", [
    (249, 250, 251), (243, 244, 246), (229, 231, 235), (209, 213, 219),
    (156, 163, 175), (107, 114, 128), (75, 85, 99), (55, 65, 81),
    (31, 41, 55), (17, 24, 39), (3, 7, 18),
]);

/// A pen color offered in the whiteboard toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenColor {
    pub name: &'static str,
    pub rgb: [u8; 3],
}

impl PenColor {
    pub fn color32(&self) -> Color32 {
        Color32::from_rgb(self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

/// Toolbar palette (500 shades, green 600), black first as the default ink.
pub const PEN_COLORS: [PenColor; 7] = [
    PenColor { name: "Black", rgb: [0, 0, 0] },
    PenColor { name: "Gray", rgb: [107, 114, 128] },
    PenColor { name: "Red", rgb: [239, 68, 68] },
    PenColor { name: "Blue", rgb: [59, 130, 246] },
    PenColor { name: "Green", rgb: [22, 163, 74] },
    PenColor { name: "Amber", rgb: [245, 158, 11] },
    PenColor { name: "Violet", rgb: [139, 92, 246] },
];

/// A clickable circular color swatch.
pub struct ColorSwatch<'a> {
    color: Color32,
    tooltip: &'a str,
    selected: bool,
    size: Vec2,
}

impl<'a> ColorSwatch<'a> {
    pub fn new(color: Color32, tooltip: &'a str) -> Self {
        Self {
            color,
            tooltip,
            selected: false,
            size: vec2(sizing::SMALL, sizing::SMALL),
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    /// Show the swatch and return (clicked, rect).
    pub fn show(self, ui: &mut Ui) -> (bool, Rect) {
        let (rect, response) = ui.allocate_exact_size(self.size, Sense::click());

        if ui.is_rect_visible(rect) {
            let center = rect.center();
            let radius = rect.width().min(rect.height()) / 2.0;
            ui.painter().circle_filled(center, radius, self.color);

            if self.selected {
                // Inner offset ring, visible on dark swatches too
                ui.painter()
                    .circle_stroke(center, radius + 1.5, Stroke::new(1.5, theme::ACCENT));
                ui.painter().circle_stroke(
                    center,
                    radius - 3.0,
                    Stroke::new(1.5, Color32::WHITE),
                );
            } else if response.hovered() {
                ui.painter()
                    .circle_stroke(center, radius, Stroke::new(1.0, theme::BORDER));
            }
        }

        let clicked = response.clicked();
        response.on_hover_text(self.tooltip).on_hover_cursor(CursorIcon::PointingHand);
        (clicked, rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_shades() {
        assert_eq!(CYAN.shade(SHADE_400), Color32::from_rgb(34, 211, 238));
        assert_eq!(AMBER.shade(SHADE_400), Color32::from_rgb(251, 191, 36));
        assert_eq!(GREEN.shade(SHADE_400), Color32::from_rgb(74, 222, 128));
        assert_eq!(BLUE.primary(), theme::ACCENT);
    }

    #[test]
    fn test_pen_palette_starts_with_black() {
        assert_eq!(PEN_COLORS[0].rgb, [0, 0, 0]);
        assert_eq!(PEN_COLORS[1].color32(), GRAY.primary());
        assert_eq!(PEN_COLORS[2].color32(), RED.primary());
        assert_eq!(PEN_COLORS[4].color32(), GREEN.shade(6));
        assert_eq!(PEN_COLORS[6].color32(), VIOLET.primary());
        let mut names: Vec<_> = PEN_COLORS.iter().map(|c| c.name).collect();
        names.dedup();
        assert_eq!(names.len(), PEN_COLORS.len());
    }
}
