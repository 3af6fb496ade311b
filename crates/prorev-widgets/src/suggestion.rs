//! Hint cards for the whiteboard sidebar.

use egui::{Color32, CornerRadius, Pos2, Rect, RichText, Ui};
use prorev_core::{Suggestion, SuggestionKind};

use crate::colors::{AMBER, CYAN, GREEN, SHADE_400};
use crate::math::{MathLabel, MathStyle};
use crate::{card_frame, theme};

const ACCENT_BAR_WIDTH: f32 = 4.0;

/// Glyph and accent color for a hint kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestionStyle {
    pub glyph: &'static str,
    pub accent: Color32,
}

pub fn suggestion_style(kind: SuggestionKind) -> SuggestionStyle {
    match kind {
        SuggestionKind::Info => SuggestionStyle {
            glyph: "ℹ",
            accent: CYAN.shade(SHADE_400),
        },
        SuggestionKind::Logic => SuggestionStyle {
            glyph: "💡",
            accent: AMBER.shade(SHADE_400),
        },
        SuggestionKind::Feedback => SuggestionStyle {
            glyph: "✔",
            accent: GREEN.shade(SHADE_400),
        },
    }
}

/// A dark card with a colored bar on the left, a titled header and a
/// math-aware body.
pub struct SuggestionCard<'a> {
    suggestion: &'a Suggestion,
}

impl<'a> SuggestionCard<'a> {
    pub fn new(suggestion: &'a Suggestion) -> Self {
        Self { suggestion }
    }

    pub fn show(self, ui: &mut Ui) {
        let style = suggestion_style(self.suggestion.kind);
        let response = card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(RichText::new(style.glyph).color(style.accent).size(14.0));
                ui.label(
                    RichText::new(&self.suggestion.title)
                        .color(style.accent)
                        .strong()
                        .size(13.0),
                );
            });
            ui.add_space(2.0);
            MathLabel::new(&self.suggestion.content)
                .style(MathStyle {
                    font_size: 13.0,
                    ..MathStyle::on_dark()
                })
                .show(ui);
        });

        let card = response.response.rect;
        let bar = Rect::from_min_max(card.min, Pos2::new(card.min.x + ACCENT_BAR_WIDTH, card.max.y));
        ui.painter().rect_filled(
            bar,
            CornerRadius {
                nw: 8,
                sw: 8,
                ne: 0,
                se: 0,
            },
            style.accent,
        );
    }
}

/// The hint list for the current question, or a placeholder when there are
/// none yet.
pub fn suggestion_list(ui: &mut Ui, suggestions: &[Suggestion]) {
    if suggestions.is_empty() {
        ui.label(RichText::new("No suggestions available.").color(theme::TEXT_MUTED).italics());
        return;
    }
    for suggestion in suggestions {
        SuggestionCard::new(suggestion).show(ui);
        ui.add_space(8.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_styles() {
        let info = suggestion_style(SuggestionKind::Info);
        assert_eq!(info.glyph, "ℹ");
        assert_eq!(info.accent, Color32::from_rgb(34, 211, 238));

        let logic = suggestion_style(SuggestionKind::Logic);
        assert_eq!(logic.glyph, "💡");
        assert_eq!(logic.accent, Color32::from_rgb(251, 191, 36));

        let feedback = suggestion_style(SuggestionKind::Feedback);
        assert_eq!(feedback.glyph, "✔");
        assert_eq!(feedback.accent, Color32::from_rgb(74, 222, 128));
    }

    #[test]
    fn test_unknown_kind_renders_as_info() {
        let suggestion: Suggestion =
            serde_json::from_str(r#"{"type":"warning","title":"Careful","content":"x"}"#).unwrap();
        assert_eq!(suggestion_style(suggestion.kind), suggestion_style(SuggestionKind::Info));
    }
}
