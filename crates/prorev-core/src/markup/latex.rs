//! A small LaTeX math typesetter producing linear styled runs.

use thiserror::Error;

/// Structural errors that make a math piece unrenderable.
///
/// Unknown commands are not errors; they are kept as [`RunKind::Error`] runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("unbalanced braces")]
    UnbalancedBraces,
    #[error("missing argument for {0}")]
    MissingArgument(String),
    #[error("trailing backslash")]
    TrailingBackslash,
    #[error("groups nested too deeply")]
    TooDeep,
}

/// Deepest group or command nesting the typesetter accepts.
pub const MAX_NESTING: usize = 64;

/// Vertical placement of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Script {
    #[default]
    Normal,
    Super,
    Sub,
}

/// How a run is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunKind {
    /// Letters and lowercase greek, set in italics.
    #[default]
    Variable,
    /// Digits, operators, function names and `\text` content.
    Upright,
    Bold,
    /// An unknown command, shown verbatim.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RunStyle {
    pub kind: RunKind,
    pub script: Script,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathRun {
    pub text: String,
    pub style: RunStyle,
}

/// Typeset math: a sequence of styled runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MathLayout {
    /// Set on its own line at a larger size.
    pub display: bool,
    pub runs: Vec<MathRun>,
}

impl MathLayout {
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

const THIN_SPACE: &str = "\u{2009}";

/// Typeset a LaTeX math expression.
pub fn typeset(latex: &str, display: bool) -> Result<MathLayout, MathError> {
    let mut parser = Parser {
        chars: latex.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let runs = parser.sequence(false, Script::Normal)?;
    Ok(MathLayout {
        display,
        runs: merge(runs),
    })
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Run a nested parse one level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, MathError>,
    ) -> Result<T, MathError> {
        if self.depth >= MAX_NESTING {
            return Err(MathError::TooDeep);
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Parse until end of input, or until the closing brace when `in_group`.
    fn sequence(&mut self, in_group: bool, script: Script) -> Result<Vec<MathRun>, MathError> {
        let mut runs: Vec<MathRun> = Vec::new();
        loop {
            let Some(c) = self.peek() else {
                if in_group {
                    return Err(MathError::UnbalancedBraces);
                }
                break;
            };
            match c {
                '}' => {
                    if !in_group {
                        return Err(MathError::UnbalancedBraces);
                    }
                    self.pos += 1;
                    break;
                }
                '{' => {
                    self.pos += 1;
                    let inner = self.nested(|p| p.sequence(true, script))?;
                    runs.extend(inner);
                }
                '^' | '_' => {
                    self.pos += 1;
                    let level = if c == '^' { Script::Super } else { Script::Sub };
                    let owner = c.to_string();
                    let arg = self.nested(|p| p.argument(level, &owner))?;
                    runs.extend(arg);
                }
                '\\' => {
                    let after_operand = !runs.is_empty();
                    let cmd = self.nested(|p| p.command(script, after_operand))?;
                    runs.extend(cmd);
                }
                c if c.is_whitespace() => self.pos += 1,
                _ => {
                    self.pos += 1;
                    runs.push(char_run(c, script, !runs.is_empty()));
                }
            }
        }
        Ok(runs)
    }

    /// A single-token or braced argument.
    fn argument(&mut self, script: Script, owner: &str) -> Result<Vec<MathRun>, MathError> {
        self.skip_whitespace();
        match self.peek() {
            None | Some('}') | Some('^') | Some('_') => Err(MathError::MissingArgument(owner.to_string())),
            Some('{') => {
                self.pos += 1;
                self.nested(|p| p.sequence(true, script))
            }
            Some('\\') => self.nested(|p| p.command(script, false)),
            Some(c) => {
                self.pos += 1;
                Ok(vec![char_run(c, script, false)])
            }
        }
    }

    /// Braced content taken verbatim, for `\text{...}`.
    fn raw_group(&mut self, owner: &str) -> Result<String, MathError> {
        self.skip_whitespace();
        if self.bump() != Some('{') {
            return Err(MathError::MissingArgument(owner.to_string()));
        }
        let mut depth = 1;
        let mut text = String::new();
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(text);
                    }
                }
                _ => {}
            }
            text.push(c);
        }
        Err(MathError::UnbalancedBraces)
    }

    fn command(&mut self, script: Script, after_operand: bool) -> Result<Vec<MathRun>, MathError> {
        // Consume the backslash.
        self.pos += 1;
        let name: String = match self.peek() {
            None => return Err(MathError::TrailingBackslash),
            Some(c) if c.is_ascii_alphabetic() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                    self.pos += 1;
                }
                self.chars[start..self.pos].iter().collect()
            }
            Some(c) => {
                self.pos += 1;
                c.to_string()
            }
        };
        let owner = format!("\\{name}");
        let run = |text: &str, kind: RunKind| {
            vec![MathRun {
                text: text.to_string(),
                style: RunStyle { kind, script },
            }]
        };

        let runs = match name.as_str() {
            "," | ">" => run(THIN_SPACE, RunKind::Upright),
            ";" | ":" | " " => run(" ", RunKind::Upright),
            "!" | "left" | "right" | "big" | "Big" | "bigg" | "Bigg" | "bigl" | "bigr"
            | "Bigl" | "Bigr" | "displaystyle" | "textstyle" | "limits" | "nolimits" => Vec::new(),
            "quad" => run("\u{2003}", RunKind::Upright),
            "qquad" => run("\u{2003}\u{2003}", RunKind::Upright),
            "\\" => run(" ", RunKind::Upright),
            "{" | "}" | "%" | "$" | "&" | "#" | "_" | "|" => {
                let text = if name == "|" { "‖" } else { name.as_str() };
                run(text, RunKind::Upright)
            }
            "frac" | "dfrac" | "tfrac" => {
                let num = self.argument(script, &owner)?;
                let den = self.argument(script, &owner)?;
                let mut out = wrap(num, script);
                out.extend(run("/", RunKind::Upright));
                out.extend(wrap(den, script));
                out
            }
            "sqrt" => {
                let mut out = Vec::new();
                self.skip_whitespace();
                if self.peek() == Some('[') {
                    self.pos += 1;
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c != ']') {
                        self.pos += 1;
                    }
                    if self.bump() != Some(']') {
                        return Err(MathError::MissingArgument(owner));
                    }
                    let index: String = self.chars[start..self.pos - 1].iter().collect();
                    out.push(MathRun {
                        text: index,
                        style: RunStyle { kind: RunKind::Upright, script: Script::Super },
                    });
                }
                let arg = self.argument(script, &owner)?;
                out.extend(run("√", RunKind::Upright));
                out.extend(wrap(arg, script));
                out
            }
            "text" | "textrm" | "textit" | "mbox" => {
                let text = self.raw_group(&owner)?;
                run(&text, RunKind::Upright)
            }
            "textbf" => {
                let text = self.raw_group(&owner)?;
                run(&text, RunKind::Bold)
            }
            "mathrm" | "operatorname" | "mathbf" => {
                let kind = if name == "mathbf" { RunKind::Bold } else { RunKind::Upright };
                self.argument(script, &owner)?
                    .into_iter()
                    .map(|mut r| {
                        if r.style.kind == RunKind::Variable {
                            r.style.kind = kind;
                        }
                        r
                    })
                    .collect()
            }
            "vec" | "hat" | "bar" | "overline" | "dot" | "ddot" | "tilde" | "underline" => {
                let mark = match name.as_str() {
                    "vec" => '\u{20D7}',
                    "hat" => '\u{0302}',
                    "dot" => '\u{0307}',
                    "ddot" => '\u{0308}',
                    "tilde" => '\u{0303}',
                    "underline" => '\u{0332}',
                    _ => '\u{0304}',
                };
                let mut arg = self.argument(script, &owner)?;
                if let Some(last) = arg.last_mut() {
                    last.text.push(mark);
                }
                arg
            }
            other => {
                if let Some(func) = function_name(other) {
                    let mut out = run(func, RunKind::Upright);
                    out.extend(run(THIN_SPACE, RunKind::Upright));
                    out
                } else if let Some(letter) = greek(other) {
                    let kind = if letter.chars().all(char::is_lowercase) {
                        RunKind::Variable
                    } else {
                        RunKind::Upright
                    };
                    run(letter, kind)
                } else if let Some(op) = binary_symbol(other) {
                    if after_operand {
                        run(&format!(" {op} "), RunKind::Upright)
                    } else {
                        run(op, RunKind::Upright)
                    }
                } else if let Some(sym) = symbol(other) {
                    run(sym, RunKind::Upright)
                } else {
                    run(&owner, RunKind::Error)
                }
            }
        };
        Ok(runs)
    }
}

fn char_run(c: char, script: Script, after_operand: bool) -> MathRun {
    let (text, kind) = match c {
        'a'..='z' | 'A'..='Z' => (c.to_string(), RunKind::Variable),
        '+' | '=' | '<' | '>' if after_operand => (format!(" {c} "), RunKind::Upright),
        '-' if after_operand => (" − ".to_string(), RunKind::Upright),
        '-' => ("−".to_string(), RunKind::Upright),
        '*' => ("∗".to_string(), RunKind::Upright),
        '\'' => ("′".to_string(), RunKind::Upright),
        _ => (c.to_string(), RunKind::Upright),
    };
    MathRun {
        text,
        style: RunStyle { kind, script },
    }
}

/// Parenthesize a multi-token group so a linear fraction stays unambiguous.
fn wrap(runs: Vec<MathRun>, script: Script) -> Vec<MathRun> {
    let visible = runs.iter().map(|r| r.text.trim().chars().count()).sum::<usize>();
    if visible <= 1 {
        return runs;
    }
    let paren = |text: &str| MathRun {
        text: text.to_string(),
        style: RunStyle { kind: RunKind::Upright, script },
    };
    let mut out = Vec::with_capacity(runs.len() + 2);
    out.push(paren("("));
    out.extend(runs);
    out.push(paren(")"));
    out
}

/// Join neighbouring runs that share a style.
fn merge(runs: Vec<MathRun>) -> Vec<MathRun> {
    let mut out: Vec<MathRun> = Vec::with_capacity(runs.len());
    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.style == run.style => last.text.push_str(&run.text),
            _ => out.push(run),
        }
    }
    out
}

fn function_name(name: &str) -> Option<&'static str> {
    const FUNCTIONS: &[&str] = &[
        "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
        "tanh", "log", "ln", "lg", "exp", "lim", "max", "min", "sup", "inf", "det", "gcd", "deg",
        "dim", "ker", "arg",
    ];
    FUNCTIONS.iter().find(|f| **f == name).copied()
}

fn greek(name: &str) -> Option<&'static str> {
    Some(match name {
        "alpha" => "α",
        "beta" => "β",
        "gamma" => "γ",
        "delta" => "δ",
        "epsilon" => "ϵ",
        "varepsilon" => "ε",
        "zeta" => "ζ",
        "eta" => "η",
        "theta" => "θ",
        "vartheta" => "ϑ",
        "iota" => "ι",
        "kappa" => "κ",
        "lambda" => "λ",
        "mu" => "μ",
        "nu" => "ν",
        "xi" => "ξ",
        "pi" => "π",
        "rho" => "ρ",
        "sigma" => "σ",
        "tau" => "τ",
        "upsilon" => "υ",
        "phi" => "ϕ",
        "varphi" => "φ",
        "chi" => "χ",
        "psi" => "ψ",
        "omega" => "ω",
        "Gamma" => "Γ",
        "Delta" => "Δ",
        "Theta" => "Θ",
        "Lambda" => "Λ",
        "Xi" => "Ξ",
        "Pi" => "Π",
        "Sigma" => "Σ",
        "Upsilon" => "Υ",
        "Phi" => "Φ",
        "Psi" => "Ψ",
        "Omega" => "Ω",
        _ => return None,
    })
}

/// Operators and relations, spaced when they follow an operand.
fn binary_symbol(name: &str) -> Option<&'static str> {
    Some(match name {
        "times" => "×",
        "cdot" => "·",
        "div" => "÷",
        "pm" => "±",
        "mp" => "∓",
        "leq" | "le" => "≤",
        "geq" | "ge" => "≥",
        "neq" | "ne" => "≠",
        "approx" => "≈",
        "equiv" => "≡",
        "sim" => "∼",
        "propto" => "∝",
        "rightarrow" | "to" => "→",
        "leftarrow" | "gets" => "←",
        "Rightarrow" | "implies" => "⇒",
        "Leftarrow" => "⇐",
        "leftrightarrow" => "↔",
        "Leftrightarrow" | "iff" => "⇔",
        "longrightarrow" => "⟶",
        "mapsto" => "↦",
        "in" => "∈",
        "notin" => "∉",
        "subset" => "⊂",
        "subseteq" => "⊆",
        "cup" => "∪",
        "cap" => "∩",
        "land" | "wedge" => "∧",
        "lor" | "vee" => "∨",
        "circ" => "∘",
        "perp" => "⊥",
        "parallel" => "∥",
        "mid" => "∣",
        _ => return None,
    })
}

fn symbol(name: &str) -> Option<&'static str> {
    Some(match name {
        "infty" => "∞",
        "partial" => "∂",
        "nabla" => "∇",
        "sum" => "∑",
        "prod" => "∏",
        "int" => "∫",
        "iint" => "∬",
        "oint" => "∮",
        "emptyset" | "varnothing" => "∅",
        "forall" => "∀",
        "exists" => "∃",
        "neg" | "lnot" => "¬",
        "angle" => "∠",
        "degree" => "°",
        "ldots" | "dots" => "…",
        "cdots" => "⋯",
        "prime" => "′",
        "therefore" => "∴",
        "because" => "∵",
        "langle" => "⟨",
        "rangle" => "⟩",
        "lfloor" => "⌊",
        "rfloor" => "⌋",
        "lceil" => "⌈",
        "rceil" => "⌉",
        "vert" => "|",
        "Vert" => "‖",
        "triangle" => "△",
        "hbar" => "ℏ",
        "ell" => "ℓ",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(latex: &str) -> String {
        typeset(latex, false).unwrap().plain_text()
    }

    #[test]
    fn test_letters_are_variables_digits_upright() {
        let layout = typeset("2x", false).unwrap();
        assert_eq!(layout.runs.len(), 2);
        assert_eq!(layout.runs[0].style.kind, RunKind::Upright);
        assert_eq!(layout.runs[1].style.kind, RunKind::Variable);
    }

    #[test]
    fn test_superscript_and_subscript() {
        let layout = typeset("x^2 + a_{n+1}", false).unwrap();
        let sup = layout.runs.iter().find(|r| r.text == "2").unwrap();
        assert_eq!(sup.style.script, Script::Super);
        let sub: String = layout
            .runs
            .iter()
            .filter(|r| r.style.script == Script::Sub)
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(sub, "n + 1");
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}x{}", "{".repeat(depth), "}".repeat(depth));
        assert_eq!(text(&nested(MAX_NESTING)), "x");
        assert_eq!(typeset(&nested(MAX_NESTING + 1), false), Err(MathError::TooDeep));
        assert_eq!(typeset(&nested(5000), false), Err(MathError::TooDeep));

        let fractions = "\\frac{".repeat(4000);
        assert_eq!(typeset(&fractions, false), Err(MathError::TooDeep));
        let scripts = "x^{".repeat(4000);
        assert_eq!(typeset(&scripts, false), Err(MathError::TooDeep));
    }

    #[test]
    fn test_fraction() {
        assert_eq!(text("\\frac{1}{2}"), "1/2");
        assert_eq!(text("\\frac{x+1}{2}"), "(x + 1)/2");
    }

    #[test]
    fn test_text_and_arrows() {
        assert_eq!(
            text("\\text{H}_2 + \\text{O}_2 \\rightarrow \\text{H}_2\\text{O}"),
            "H2 + O2 → H2O"
        );
    }

    #[test]
    fn test_greek_and_symbols() {
        assert_eq!(text("\\alpha + \\beta"), "α + β");
        assert_eq!(text("\\int_0^2 x^2 \\, dx"), "∫02x2\u{2009}dx");
    }

    #[test]
    fn test_left_right_are_stripped() {
        assert_eq!(text("\\left( x \\right)"), "(x)");
    }

    #[test]
    fn test_unknown_command_is_error_run() {
        let layout = typeset("\\foo x", false).unwrap();
        assert_eq!(layout.runs[0].text, "\\foo");
        assert_eq!(layout.runs[0].style.kind, RunKind::Error);
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(typeset("\\frac{1}", false), Err(MathError::MissingArgument("\\frac".into())));
        assert_eq!(typeset("{x", false), Err(MathError::UnbalancedBraces));
        assert_eq!(typeset("x}", false), Err(MathError::UnbalancedBraces));
        assert_eq!(typeset("x^", false), Err(MathError::MissingArgument("^".into())));
        assert_eq!(typeset("x\\", false), Err(MathError::TrailingBackslash));
    }

    #[test]
    fn test_display_flag_and_empty_input() {
        let layout = typeset("", true).unwrap();
        assert!(layout.display);
        assert!(layout.runs.is_empty());
    }

    #[test]
    fn test_function_names_upright() {
        let layout = typeset("\\sin x", false).unwrap();
        assert_eq!(layout.runs[0].text, "sin\u{2009}");
        assert_eq!(layout.runs[0].style.kind, RunKind::Upright);
    }
}
