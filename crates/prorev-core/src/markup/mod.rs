//! Mixed prose and `$...$` math markup.
//!
//! Question titles, hint bodies and tutor feedback are plain strings that may
//! embed LaTeX between dollar delimiters. [`render`] turns such a string into
//! a [`Fragment`]: prose pieces kept verbatim and math pieces typeset into
//! styled runs. A math piece that fails to typeset is kept as raw text with
//! its delimiters, so rendering never fails.

mod latex;

pub use latex::{typeset, MathError, MathLayout, MathRun, RunKind, RunStyle, Script};

use regex::Regex;
use std::sync::OnceLock;

/// A slice of the input string, before typesetting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Math {
        /// LaTeX source without the delimiters.
        latex: &'a str,
        /// The source including its delimiters.
        source: &'a str,
        /// `$$...$$` rather than `$...$`.
        display: bool,
    },
}

/// One rendered piece of a [`Fragment`].
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),
    Math(MathLayout),
    /// Math that could not be typeset, shown as the original delimited text.
    Raw(String),
}

/// Rendered form of a markup string, pieces in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub pieces: Vec<Piece>,
}

impl Fragment {
    /// Flatten to plain text (math runs concatenated without styling).
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) | Piece::Raw(text) => out.push_str(text),
                Piece::Math(layout) => out.push_str(&layout.plain_text()),
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

fn math_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // `.` stops at newlines, so a delimiter pair never spans lines.
    PATTERN.get_or_init(|| Regex::new(r"\$\$.*?\$\$|\$.*?\$").expect("static regex"))
}

/// Split markup into prose and math segments.
///
/// Display delimiters win over inline ones at the same position. An unpaired
/// `$` stays in the surrounding prose.
pub fn split_segments(input: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in math_pattern().find_iter(input) {
        if m.start() > last {
            segments.push(Segment::Text(&input[last..m.start()]));
        }
        let source = m.as_str();
        let display = source.len() >= 4 && source.starts_with("$$") && source.ends_with("$$");
        let latex = if display {
            &source[2..source.len() - 2]
        } else {
            &source[1..source.len() - 1]
        };
        segments.push(Segment::Math { latex, source, display });
        last = m.end();
    }

    if last < input.len() {
        segments.push(Segment::Text(&input[last..]));
    }
    segments
}

/// Render markup into a [`Fragment`].
pub fn render(input: &str) -> Fragment {
    let pieces = split_segments(input)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => Piece::Text(text.to_string()),
            Segment::Math { latex, source, display } => match typeset(latex, display) {
                Ok(layout) => Piece::Math(layout),
                Err(e) => {
                    log::debug!("Falling back to raw math for {source:?}: {e}");
                    Piece::Raw(source.to_string())
                }
            },
        })
        .collect();
    Fragment { pieces }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_inline() {
        let segments = split_segments("Solve $x+1=2$");
        assert_eq!(
            segments,
            vec![
                Segment::Text("Solve "),
                Segment::Math { latex: "x+1=2", source: "$x+1=2$", display: false },
            ]
        );
    }

    #[test]
    fn test_split_display_takes_precedence() {
        let segments = split_segments("$$a^2$$ and $b$.");
        assert!(matches!(segments[0], Segment::Math { latex: "a^2", display: true, .. }));
        assert_eq!(segments[1], Segment::Text(" and "));
        assert!(matches!(segments[2], Segment::Math { latex: "b", display: false, .. }));
        assert_eq!(segments[3], Segment::Text("."));
    }

    #[test]
    fn test_unpaired_dollar_is_text() {
        assert_eq!(split_segments("costs $5"), vec![Segment::Text("costs $5")]);
    }

    #[test]
    fn test_math_does_not_span_lines() {
        assert_eq!(split_segments("$a\nb$"), vec![Segment::Text("$a\nb$")]);
    }

    #[test]
    fn test_render_hides_delimiters() {
        let fragment = render("Solve $x+1=2$");
        assert_eq!(fragment.pieces[0], Piece::Text("Solve ".to_string()));
        let Piece::Math(layout) = &fragment.pieces[1] else {
            panic!("expected math piece");
        };
        assert!(!layout.display);
        assert_eq!(layout.plain_text(), "x + 1 = 2");
        assert!(!fragment.plain_text().contains('$'));
    }

    #[test]
    fn test_render_falls_back_to_raw() {
        let fragment = render("Bad $\\frac{1}$ here");
        assert_eq!(fragment.pieces[1], Piece::Raw("$\\frac{1}$".to_string()));
        assert_eq!(fragment.plain_text(), "Bad $\\frac{1}$ here");
    }

    #[test]
    fn test_deep_nesting_renders_raw() {
        let source = format!("${}x{}$", "{".repeat(3000), "}".repeat(3000));
        let fragment = render(&format!("Before {source} after"));
        assert_eq!(fragment.pieces[0], Piece::Text("Before ".to_string()));
        assert_eq!(fragment.pieces[1], Piece::Raw(source));
        assert_eq!(fragment.pieces[2], Piece::Text(" after".to_string()));
    }

    #[test]
    fn test_render_is_deterministic() {
        let input = "Use $\\int x^n \\, dx = \\frac{x^{n+1}}{n+1} + C$";
        assert_eq!(render(input), render(input));
    }

    #[test]
    fn test_plain_string_is_single_text_piece() {
        let fragment = render("Could not get feedback. Please try again.");
        assert_eq!(fragment.pieces.len(), 1);
        assert_eq!(fragment.plain_text(), "Could not get feedback. Please try again.");
    }
}
