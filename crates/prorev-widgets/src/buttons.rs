//! Page buttons and the whiteboard toolbar's icon buttons.

use egui::{
    vec2, Align2, Color32, CornerRadius, CursorIcon, FontId, Image, ImageSource, Rect, Sense,
    Stroke, StrokeKind, Ui,
};

use crate::theme;

const ICON_BUTTON: f32 = 32.0;
const ICON: f32 = 18.0;
const DISABLED_ICON: Color32 = Color32::from_gray(190);

/// Square toolbar button showing an SVG icon. A selected button (the active
/// tool, an open sidebar) is filled with the accent color.
pub struct IconButton<'a> {
    icon: ImageSource<'a>,
    tooltip: &'a str,
    shortcut: Option<&'a str>,
    selected: bool,
    enabled: bool,
}

impl<'a> IconButton<'a> {
    pub fn new(icon: ImageSource<'a>, tooltip: &'a str) -> Self {
        Self {
            icon,
            tooltip,
            shortcut: None,
            selected: false,
            enabled: true,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// A disabled button is drawn faded and never reports clicks.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Key shown next to the tooltip.
    pub fn shortcut(mut self, shortcut: &'a str) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    /// Fill and icon tint for the current state.
    fn colors(&self, hovered: bool) -> (Color32, Color32) {
        match (self.enabled, self.selected, hovered) {
            (false, _, _) => (Color32::TRANSPARENT, DISABLED_ICON),
            (true, true, _) => (theme::ACCENT, Color32::WHITE),
            (true, false, true) => (Color32::from_gray(235), Color32::from_gray(40)),
            (true, false, false) => (Color32::TRANSPARENT, Color32::from_gray(80)),
        }
    }

    fn hover_text(&self) -> String {
        match self.shortcut {
            Some(key) => format!("{} ({})", self.tooltip, key),
            None => self.tooltip.to_string(),
        }
    }

    /// Returns true when clicked.
    pub fn show(self, ui: &mut Ui) -> bool {
        let sense = if self.enabled { Sense::click() } else { Sense::hover() };
        let (rect, response) = ui.allocate_exact_size(vec2(ICON_BUTTON, ICON_BUTTON), sense);

        if ui.is_rect_visible(rect) {
            let (fill, tint) = self.colors(self.enabled && response.hovered());
            ui.painter().rect_filled(rect, CornerRadius::same(6), fill);
            let icon_rect = Rect::from_center_size(rect.center(), vec2(ICON, ICON));
            Image::new(self.icon.clone())
                .fit_to_exact_size(icon_rect.size())
                .tint(tint)
                .paint_at(ui, icon_rect);
        }

        let clicked = self.enabled && response.clicked();
        let response = response.on_hover_text(self.hover_text());
        if self.enabled {
            response.on_hover_cursor(CursorIcon::PointingHand);
        }
        clicked
    }
}

/// Visual weight of an [`ActionButton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionKind {
    /// Solid accent fill.
    #[default]
    Primary,
    /// Outlined, for secondary choices like "Cancel".
    Secondary,
    /// Red outline, for destructive actions.
    Danger,
}

/// A labelled page-level button ("Upload", "Extract questions", "Capture").
pub struct ActionButton<'a> {
    label: &'a str,
    kind: ActionKind,
    enabled: bool,
    min_width: f32,
}

impl<'a> ActionButton<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            kind: ActionKind::Primary,
            enabled: true,
            min_width: 0.0,
        }
    }

    pub fn secondary(mut self) -> Self {
        self.kind = ActionKind::Secondary;
        self
    }

    pub fn danger(mut self) -> Self {
        self.kind = ActionKind::Danger;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn min_width(mut self, width: f32) -> Self {
        self.min_width = width;
        self
    }

    /// Background, border and text colors for the current state.
    fn colors(&self, hovered: bool) -> (Color32, Option<Color32>, Color32) {
        if !self.enabled {
            return (Color32::from_gray(235), None, Color32::from_gray(160));
        }
        match self.kind {
            ActionKind::Primary => {
                let fill = if hovered {
                    Color32::from_rgb(37, 99, 235) // Blue-600
                } else {
                    theme::ACCENT
                };
                (fill, None, Color32::WHITE)
            }
            ActionKind::Secondary => {
                let fill = if hovered { theme::HOVER_BG } else { Color32::WHITE };
                (fill, Some(theme::BORDER), theme::TEXT)
            }
            ActionKind::Danger => {
                let fill = if hovered {
                    Color32::from_rgb(254, 242, 242) // Red-50
                } else {
                    Color32::WHITE
                };
                (fill, Some(theme::ERROR), theme::ERROR)
            }
        }
    }

    /// Returns true when clicked.
    pub fn show(self, ui: &mut Ui) -> bool {
        let font_id = FontId::proportional(13.0);
        let galley = ui.painter().layout_no_wrap(
            self.label.to_string(),
            font_id.clone(),
            Color32::PLACEHOLDER,
        );
        let width = self.min_width.max(galley.size().x + 24.0);
        let sense = if self.enabled { Sense::click() } else { Sense::hover() };
        let (rect, response) = ui.allocate_exact_size(vec2(width, 32.0), sense);

        if ui.is_rect_visible(rect) {
            let (fill, border, text) = self.colors(response.hovered());
            let radius = CornerRadius::same(6);
            ui.painter().rect_filled(rect, radius, fill);
            if let Some(border) = border {
                ui.painter()
                    .rect_stroke(rect, radius, Stroke::new(1.0, border), StrokeKind::Inside);
            }
            ui.painter()
                .text(rect.center(), Align2::CENTER_CENTER, self.label, font_id, text);
        }

        let clicked = self.enabled && response.clicked();
        if self.enabled {
            response.on_hover_cursor(CursorIcon::PointingHand);
        }
        clicked
    }
}
