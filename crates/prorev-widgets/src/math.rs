//! Labels for text with embedded `$...$` math.
//!
//! A [`Fragment`] from [`prorev_core::markup::render`] is laid out as a single
//! egui [`LayoutJob`]: prose runs in the body font, variables in italics,
//! scripts smaller and raised or lowered, display math on its own line at a
//! larger size, and untypesettable math verbatim in the error color.

use egui::text::{LayoutJob, TextFormat};
use egui::{Align, Color32, FontId, Response, Ui};
use prorev_core::markup::{self, Fragment, MathLayout, Piece, RunKind, RunStyle, Script};

use crate::{sizing, theme};

const SCRIPT_SCALE: f32 = 0.7;
const DISPLAY_SCALE: f32 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MathStyle {
    pub font_size: f32,
    pub color: Color32,
    /// Color for `\mathbf` runs.
    pub strong_color: Color32,
    pub error_color: Color32,
    /// Wrap width; `f32::INFINITY` disables wrapping.
    pub wrap_width: f32,
}

impl Default for MathStyle {
    fn default() -> Self {
        Self {
            font_size: sizing::BODY,
            color: theme::TEXT,
            strong_color: Color32::BLACK,
            error_color: theme::ERROR,
            wrap_width: f32::INFINITY,
        }
    }
}

impl MathStyle {
    /// Light text for the dark hint cards and assistant overlay.
    pub fn on_dark() -> Self {
        Self {
            color: theme::CARD_TEXT,
            strong_color: Color32::WHITE,
            ..Self::default()
        }
    }

    fn text_format(&self, size: f32, color: Color32) -> TextFormat {
        TextFormat {
            font_id: FontId::proportional(size),
            color,
            ..Default::default()
        }
    }

    fn run_format(&self, style: RunStyle, base_size: f32) -> TextFormat {
        let size = match style.script {
            Script::Normal => base_size,
            Script::Super | Script::Sub => base_size * SCRIPT_SCALE,
        };
        let color = match style.kind {
            RunKind::Variable | RunKind::Upright => self.color,
            RunKind::Bold => self.strong_color,
            RunKind::Error => self.error_color,
        };
        let mut format = self.text_format(size, color);
        format.italics = style.kind == RunKind::Variable;
        format.valign = match style.script {
            Script::Normal => Align::Center,
            Script::Super => Align::TOP,
            Script::Sub => Align::BOTTOM,
        };
        format
    }
}

/// Build the layout job for a rendered fragment.
pub fn layout_job(fragment: &Fragment, style: &MathStyle) -> LayoutJob {
    let mut job = LayoutJob::default();
    job.wrap.max_width = style.wrap_width;

    for piece in &fragment.pieces {
        match piece {
            Piece::Text(text) => {
                job.append(text, 0.0, style.text_format(style.font_size, style.color));
            }
            Piece::Raw(text) => {
                job.append(text, 0.0, style.text_format(style.font_size, style.error_color));
            }
            Piece::Math(layout) => append_math(&mut job, layout, style),
        }
    }
    job
}

fn append_math(job: &mut LayoutJob, layout: &MathLayout, style: &MathStyle) {
    let base_size = if layout.display {
        style.font_size * DISPLAY_SCALE
    } else {
        style.font_size
    };
    let line_format = style.text_format(style.font_size, style.color);

    if layout.display && !job.text.is_empty() && !job.text.ends_with('\n') {
        job.append("\n", 0.0, line_format.clone());
    }
    for run in &layout.runs {
        job.append(&run.text, 0.0, style.run_format(run.style, base_size));
    }
    if layout.display {
        job.append("\n", 0.0, line_format);
    }
}

/// A label that renders markup such as `"Solve $x^2 = 4$"`.
pub struct MathLabel<'a> {
    text: &'a str,
    style: MathStyle,
}

impl<'a> MathLabel<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            style: MathStyle::default(),
        }
    }

    pub fn style(mut self, style: MathStyle) -> Self {
        self.style = style;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.style.font_size = size;
        self
    }

    pub fn color(mut self, color: Color32) -> Self {
        self.style.color = color;
        self
    }

    pub fn show(self, ui: &mut Ui) -> Response {
        let mut style = self.style;
        if !style.wrap_width.is_finite() {
            style.wrap_width = ui.available_width();
        }
        let job = layout_job(&markup::render(self.text), &style);
        ui.label(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(input: &str) -> LayoutJob {
        layout_job(&markup::render(input), &MathStyle::default())
    }

    fn section_text<'a>(job: &'a LayoutJob, index: usize) -> &'a str {
        &job.text[job.sections[index].byte_range.clone()]
    }

    #[test]
    fn test_inline_math_has_no_delimiters() {
        let job = job("Solve $x+1=2$");
        assert_eq!(job.text, "Solve x + 1 = 2");
        assert!(!job.text.contains('$'));
        assert_eq!(section_text(&job, 0), "Solve ");
        assert!(!job.sections[0].format.italics);

        let x = job.sections.iter().find(|s| &job.text[s.byte_range.clone()] == "x");
        assert!(x.is_some_and(|s| s.format.italics));
    }

    #[test]
    fn test_scripts_are_smaller_and_shifted() {
        let job = job("$x^2$");
        let two = job
            .sections
            .iter()
            .find(|s| &job.text[s.byte_range.clone()] == "2")
            .expect("superscript section");
        assert_eq!(two.format.valign, Align::TOP);
        assert!(two.format.font_id.size < sizing::BODY);
    }

    #[test]
    fn test_display_math_on_own_line() {
        let job = job("Area: $$\\pi r^2$$ done");
        assert!(job.text.starts_with("Area: \n"));
        assert!(job.text.contains("\n done"));
        let pi = job
            .sections
            .iter()
            .find(|s| job.text[s.byte_range.clone()].contains('π'))
            .expect("pi section");
        assert!(pi.format.font_id.size > sizing::BODY);
    }

    #[test]
    fn test_raw_fallback_uses_error_color() {
        let job = job("Bad $\\frac{1}$");
        let last = job.sections.last().expect("sections");
        assert_eq!(&job.text[last.byte_range.clone()], "$\\frac{1}$");
        assert_eq!(last.format.color, theme::ERROR);
    }

    #[test]
    fn test_plain_text_single_section() {
        let job = job("Could not get feedback. Please try again.");
        assert_eq!(job.sections.len(), 1);
        assert_eq!(job.sections[0].format.color, theme::TEXT);
    }

    #[test]
    fn test_dark_style() {
        let fragment = markup::render("ok");
        let job = layout_job(&fragment, &MathStyle::on_dark());
        assert_eq!(job.sections[0].format.color, theme::CARD_TEXT);
    }
}
