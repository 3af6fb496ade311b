//! Questions and the hints attached to them.

use serde::{Deserialize, Serialize};

/// Category of a hint. Unknown categories coming from the extractor are
/// shown as plain information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Logic,
    Feedback,
    #[default]
    #[serde(other)]
    Info,
}

/// A hint record shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type", default)]
    pub kind: SuggestionKind,
    #[serde(default)]
    pub title: String,
    /// Body text, may embed `$...$` math.
    #[serde(default)]
    pub content: String,
}

impl Suggestion {
    pub fn new(kind: SuggestionKind, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            content: content.into(),
        }
    }
}

/// A single homework question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    /// Display text, may embed `$...$` math.
    pub title: String,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

impl Question {
    pub fn new(id: i64, title: impl Into<String>, suggestions: Vec<Suggestion>) -> Self {
        Self {
            id,
            title: title.into(),
            suggestions,
        }
    }

    /// Build a question from bare `{id, text, type}` data, synthesizing the
    /// standard three hints.
    pub fn with_default_suggestions(id: i64, text: impl Into<String>, question_type: &str) -> Self {
        Self::new(id, text, default_suggestions(question_type))
    }
}

/// The hints attached to a question that came without any.
pub fn default_suggestions(question_type: &str) -> Vec<Suggestion> {
    let question_type = match question_type.trim() {
        "" => "general",
        other => other,
    };
    vec![
        Suggestion::new(
            SuggestionKind::Info,
            "Problem Type",
            format!("This is a {question_type} question."),
        ),
        Suggestion::new(
            SuggestionKind::Logic,
            "Approach",
            "Analyze the problem step by step and show your work clearly.",
        ),
        Suggestion::new(
            SuggestionKind::Feedback,
            "Hint",
            "Use proper mathematical notation and check your final answer.",
        ),
    ]
}

/// Ordered questions extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
    /// Name of the document the questions were extracted from.
    #[serde(default)]
    pub source: Option<String>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Built-in practice set used when the whiteboard is opened without an
    /// extracted document.
    pub fn practice() -> Self {
        let q = |id, title: &str, hints: [(SuggestionKind, &str, &str); 3]| {
            Question::new(
                id,
                title,
                hints
                    .into_iter()
                    .map(|(kind, title, content)| Suggestion::new(kind, title, content))
                    .collect(),
            )
        };
        use SuggestionKind::*;

        Self::new(vec![
            q(1, "Solve for $x$: $x + 5 = 12$", [
                (Info, "Equation Type", "This is a simple linear equation with one variable."),
                (Logic, "Solution Method", "Isolate the variable by performing the same operation on both sides of the equation."),
                (Feedback, "Check Your Work", "Substitute your answer back into the original equation to verify it's correct."),
            ]),
            q(2, "Find the area under the curve $f(x) = x^2$ from $x = 0$ to $x = 2$", [
                (Info, "Integration Problem", "This requires calculating a definite integral to find the area under the curve."),
                (Logic, "Setup", "Set up the definite integral: $\\int_0^2 x^2 \\, dx$"),
                (Feedback, "Power Rule", "Use the power rule: $\\int x^n \\, dx = \\frac{x^{n+1}}{n+1} + C$"),
            ]),
            q(3, "Balance the chemical equation: $\\text{H}_2 + \\text{O}_2 \\rightarrow \\text{H}_2\\text{O}$", [
                (Info, "Chemical Balancing", "Balance the equation by ensuring equal numbers of each type of atom on both sides."),
                (Logic, "Count Atoms", "Count hydrogen and oxygen atoms on both the reactant and product sides."),
                (Feedback, "Coefficients", "The balanced equation is: $2\\text{H}_2 + \\text{O}_2 \\rightarrow 2\\text{H}_2\\text{O}$"),
            ]),
            q(4, "Calculate the derivative: $\\frac{d}{dx}[3x^2 + 2x - 1]$", [
                (Info, "Differentiation", "Apply differentiation rules to find the derivative of this polynomial."),
                (Logic, "Power Rule", "Use the power rule: $\\frac{d}{dx}[x^n] = nx^{n-1}$"),
                (Feedback, "Term by Term", "Differentiate each term separately and combine the results."),
            ]),
        ])
        .with_source("practice")
    }
}
