//! Question progress and previous/next controls.

use egui::{vec2, Align2, Color32, CornerRadius, FontId, Rect, Sense, Ui};
use prorev_core::Progress;

use crate::buttons::ActionButton;
use crate::theme;

/// "Question X of Y" with a thin bar underneath.
pub struct ProgressBar {
    progress: Progress,
    height: f32,
}

impl ProgressBar {
    pub fn new(progress: Progress) -> Self {
        Self {
            progress,
            height: 6.0,
        }
    }

    pub fn caption(progress: Progress) -> String {
        format!("Question {} of {}", progress.current, progress.total)
    }

    pub fn show(self, ui: &mut Ui) {
        ui.label(
            egui::RichText::new(Self::caption(self.progress))
                .size(12.0)
                .color(theme::TEXT_MUTED),
        );

        let (rect, _) = ui.allocate_exact_size(vec2(ui.available_width(), self.height), Sense::hover());
        if !ui.is_rect_visible(rect) {
            return;
        }
        let radius = CornerRadius::same((self.height / 2.0) as u8);
        ui.painter().rect_filled(rect, radius, Color32::from_gray(229));

        let fraction = self.progress.fraction().clamp(0.0, 1.0);
        if fraction > 0.0 {
            let filled = Rect::from_min_size(rect.min, vec2(rect.width() * fraction, rect.height()));
            ui.painter().rect_filled(filled, radius, theme::ACCENT);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Previous,
    Next,
}

/// Previous / Next buttons around the progress caption. Buttons at the ends
/// of the list are disabled.
pub struct NavigationControls {
    progress: Progress,
}

impl NavigationControls {
    pub fn new(progress: Progress) -> Self {
        Self { progress }
    }

    pub fn can_go_previous(&self) -> bool {
        self.progress.current > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.progress.current < self.progress.total
    }

    pub fn show(self, ui: &mut Ui) -> Option<NavAction> {
        let mut action = None;
        ui.horizontal(|ui| {
            if ActionButton::new("◀ Previous")
                .secondary()
                .enabled(self.can_go_previous())
                .show(ui)
            {
                action = Some(NavAction::Previous);
            }

            let (rect, _) = ui.allocate_exact_size(vec2(120.0, 32.0), Sense::hover());
            ui.painter().text(
                rect.center(),
                Align2::CENTER_CENTER,
                format!("{} / {}", self.progress.current, self.progress.total),
                FontId::proportional(13.0),
                theme::TEXT,
            );

            if ActionButton::new("Next ▶").enabled(self.can_go_next()).show(ui) {
                action = Some(NavAction::Next);
            }
        });
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(current: usize, total: usize) -> Progress {
        Progress { current, total }
    }

    #[test]
    fn test_caption() {
        assert_eq!(ProgressBar::caption(progress(2, 5)), "Question 2 of 5");
    }

    #[test]
    fn test_bounds_disable_buttons() {
        let first = NavigationControls::new(progress(1, 3));
        assert!(!first.can_go_previous());
        assert!(first.can_go_next());

        let last = NavigationControls::new(progress(3, 3));
        assert!(last.can_go_previous());
        assert!(!last.can_go_next());

        let only = NavigationControls::new(progress(1, 1));
        assert!(!only.can_go_previous() && !only.can_go_next());
    }
}
