//! Layout helpers: separators, section labels, frames, drop zones.

use egui::{
    vec2, Align2, Color32, CornerRadius, CursorIcon, FontId, Frame, Margin, Pos2, Rect, Sense,
    Shape, Stroke, Ui,
};

use crate::{sizing, theme};

/// Draw a horizontal separator line.
pub fn separator(ui: &mut Ui) {
    let rect = ui.available_rect_before_wrap();
    let y = rect.top() + 4.0;
    ui.painter().line_segment(
        [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
        Stroke::new(1.0, Color32::from_gray(230)),
    );
    ui.add_space(8.0);
}

/// Draw a vertical separator line (small height).
pub fn vertical_separator(ui: &mut Ui) {
    let rect = ui.available_rect_before_wrap();
    let height = 14.0;
    let x = rect.left() + 1.0;
    let top = rect.center().y - height / 2.0;
    ui.painter().line_segment(
        [Pos2::new(x, top), Pos2::new(x, top + height)],
        Stroke::new(1.0, Color32::from_gray(210)),
    );
    ui.add_space(3.0);
}

/// Draw a section label (small, muted text).
pub fn section_label(ui: &mut Ui, text: &str) {
    ui.label(egui::RichText::new(text).size(10.0).color(theme::TEXT_MUTED));
}

/// Standard floating panel frame with shadow.
pub fn panel_frame() -> Frame {
    Frame::new()
        .fill(theme::PANEL_BG)
        .corner_radius(CornerRadius::same(sizing::PANEL_RADIUS))
        .stroke(Stroke::new(1.0, theme::BORDER))
        .shadow(egui::epaint::Shadow {
            spread: 0,
            blur: 8,
            offset: [0, 2],
            color: Color32::from_black_alpha(15),
        })
        .inner_margin(Margin::same(8))
}

/// Toolbar frame (wider horizontal padding).
pub fn toolbar_frame() -> Frame {
    Frame::new()
        .fill(theme::PANEL_BG)
        .corner_radius(CornerRadius::same(sizing::PANEL_RADIUS))
        .stroke(Stroke::new(1.0, theme::BORDER))
        .shadow(egui::epaint::Shadow {
            spread: 0,
            blur: 6,
            offset: [0, 2],
            color: Color32::from_black_alpha(10),
        })
        .inner_margin(Margin::symmetric(12, 6))
}

/// Dark frame for hint cards and the assistant overlay.
pub fn card_frame() -> Frame {
    Frame::new()
        .fill(theme::CARD_BG)
        .corner_radius(CornerRadius::same(sizing::PANEL_RADIUS))
        .inner_margin(Margin {
            left: 14,
            right: 10,
            top: 8,
            bottom: 8,
        })
}

pub struct DropZoneResponse {
    pub clicked: bool,
    pub rect: Rect,
}

/// A dashed area that accepts dropped files and opens a picker when clicked.
///
/// `hovering_files` highlights the zone while files are dragged over the
/// window.
pub fn drop_zone(ui: &mut Ui, hovering_files: bool, title: &str, hint: &str) -> DropZoneResponse {
    let size = vec2(ui.available_width(), 160.0);
    let (rect, response) = ui.allocate_exact_size(size, Sense::click());

    if ui.is_rect_visible(rect) {
        let active = hovering_files || response.hovered();
        let (fill, border) = if active {
            (theme::SELECTED_BG, theme::ACCENT)
        } else {
            (Color32::from_gray(250), Color32::from_gray(200))
        };
        ui.painter()
            .rect_filled(rect, CornerRadius::same(sizing::PANEL_RADIUS), fill);

        let outline = rect.shrink(1.0);
        let path = [
            outline.left_top(),
            outline.right_top(),
            outline.right_bottom(),
            outline.left_bottom(),
            outline.left_top(),
        ];
        ui.painter()
            .extend(Shape::dashed_line(&path, Stroke::new(1.5, border), 8.0, 5.0));

        ui.painter().text(
            rect.center() - vec2(0.0, 12.0),
            Align2::CENTER_CENTER,
            title,
            FontId::proportional(16.0),
            if active { theme::ACCENT } else { theme::TEXT },
        );
        ui.painter().text(
            rect.center() + vec2(0.0, 14.0),
            Align2::CENTER_CENTER,
            hint,
            FontId::proportional(12.0),
            theme::TEXT_MUTED,
        );
    }

    let clicked = response.clicked();
    response.on_hover_cursor(CursorIcon::PointingHand);
    DropZoneResponse { clicked, rect }
}
