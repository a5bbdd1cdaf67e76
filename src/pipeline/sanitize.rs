//! Text sanitizer: turn extracted paper text into LaTeX-safe markup.
//!
//! The upstream extractor produces plain text that is *mostly* LaTeX
//! friendly: it may already contain inline commands (`\textbf{..}`), math
//! spans (`$..$`), bare Greek macros outside math, pseudo-math italics
//! (`\textit{c}(\tau)`) and commands whose leading `\t` was eaten by a JSON
//! round-trip (`extbf{..}`).
//!
//! ## Pass order
//!
//! Math spans are hidden behind NUL-delimited placeholders before any
//! rewriting pass runs and restored afterwards, so nothing inside `$..$`,
//! `$$..$$`, `\(..\)` or `\[..\]` is ever touched. Command repair runs first
//! so that the italic and macro passes see real `\textit{` tokens.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// How bullet lists are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStyle {
    /// Plain `itemize`.
    #[default]
    Plain,
    /// `itemize` with tightened `\itemsep` / `\parsep` (baposter boxes).
    Compact,
}

/// Sanitize a section body into LaTeX.
///
/// Passes (applied in order):
/// 1. Repair commands that lost their leading `\t` (`extbf{` → `\textbf{`)
/// 2. Move single-letter `\textit{..}` pseudo-math into math mode
/// 3. Wrap bare math macros (`\alpha`, `\cdot`, …) in `$..$`
/// 4. Render all-bullet input as `itemize`, else join lines with spaces
/// 5. Normalise `•` and escape special characters per item/paragraph
///
/// Empty input yields an empty string.
pub fn sanitize(raw: &str) -> String {
    format_body(raw, ListStyle::Plain)
}

/// [`sanitize`] with an explicit list style.
pub fn format_body(raw: &str, style: ListStyle) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let s = fix_escaped_commands(raw);
    let s = normalize_textit_math(&s);
    let s = wrap_math_macros(&s);

    let lines: Vec<&str> = s.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return String::new();
    }

    let is_list = lines.iter().all(|l| l.starts_with('-') || l.starts_with('•'));
    if !is_list {
        return escape_text(&normalize_bullets(&lines.join(" ")));
    }

    let mut out = vec![r"\begin{itemize}".to_string()];
    if style == ListStyle::Compact {
        out.push(r"\setlength{\itemsep}{2pt}".to_string());
        out.push(r"\setlength{\parsep}{0pt}".to_string());
    }
    for line in lines {
        let item = line.trim_start_matches(['-', '•', ' ']).trim();
        out.push(format!(r"\item {}", escape_text(&normalize_bullets(item))));
    }
    out.push(r"\end{itemize}".to_string());
    out.join("\n")
}

/// Escape LaTeX special characters outside math spans.
///
/// `& % $ # _` gain a backslash, `~` and `^` become `\textasciitilde{}` and
/// `\textasciicircum{}`. A backslash and the character after it are copied
/// as-is, so already-escaped text (`\&`) and inline commands survive and the
/// function is idempotent. Balanced `{..}` groups are kept as markup; a
/// stray `}` or unclosed `{` is escaped.
pub fn escape_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let (hidden, stash) = hide_math(raw);
    let chars: Vec<char> = hidden.chars().collect();

    let mut balanced = vec![false; chars.len()];
    let mut open: Vec<usize> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '{' => open.push(i),
            '}' => {
                if let Some(o) = open.pop() {
                    balanced[o] = true;
                    balanced[i] = true;
                }
            }
            _ => {}
        }
        i += 1;
    }

    let mut out = String::with_capacity(hidden.len() + 16);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
                continue;
            }
            '{' | '}' if balanced[i] => out.push(c),
            '{' | '}' | '&' | '%' | '$' | '#' | '_' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
        i += 1;
    }
    stash.restore(&out)
}

// ── Math span hiding ─────────────────────────────────────────────────────

struct MathStash(Vec<String>);

impl MathStash {
    fn restore(&self, s: &str) -> String {
        let mut out = s.to_string();
        for (i, block) in self.0.iter().enumerate() {
            out = out.replace(&placeholder(i), block);
        }
        out
    }
}

fn placeholder(i: usize) -> String {
    format!("\u{0}M{i}\u{0}")
}

fn hide_math(s: &str) -> (String, MathStash) {
    let spans = math_spans(s);
    if spans.is_empty() {
        return (s.to_string(), MathStash(Vec::new()));
    }
    let mut out = String::with_capacity(s.len());
    let mut stash = Vec::with_capacity(spans.len());
    let mut last = 0;
    for span in spans {
        out.push_str(&s[last..span.start]);
        out.push_str(&placeholder(stash.len()));
        stash.push(s[span.clone()].to_string());
        last = span.end;
    }
    out.push_str(&s[last..]);
    (out, MathStash(stash))
}

/// Byte ranges of `$..$`, `$$..$$`, `\(..\)` and `\[..\]`. `\$` is text.
fn math_spans(s: &str) -> Vec<std::ops::Range<usize>> {
    let b = s.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'\\' => {
                let close = match b.get(i + 1) {
                    Some(b'(') => Some(r"\)"),
                    Some(b'[') => Some(r"\]"),
                    _ => None,
                };
                if let Some(close) = close {
                    if let Some(rel) = s[i + 2..].find(close) {
                        let end = i + 2 + rel + close.len();
                        spans.push(i..end);
                        i = end;
                        continue;
                    }
                }
                i += 2;
            }
            b'$' => {
                let delim: &[u8] = if b.get(i + 1) == Some(&b'$') { b"$$" } else { b"$" };
                match find_unescaped(b, i + delim.len(), delim) {
                    Some(close) => {
                        let end = close + delim.len();
                        spans.push(i..end);
                        i = end;
                    }
                    None => i += delim.len(),
                }
            }
            _ => i += 1,
        }
    }
    spans
}

fn find_unescaped(b: &[u8], from: usize, pat: &[u8]) -> Option<usize> {
    let mut j = from;
    while j < b.len() {
        if b[j] == b'\\' {
            j += 2;
            continue;
        }
        if b[j..].starts_with(pat) {
            return Some(j);
        }
        j += 1;
    }
    None
}

// ── Pass 1: Repair commands that lost their `\t` ─────────────────────────

static RE_BROKEN_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ext(bf|it|color|tt|sc|superscript|subscript)\{").unwrap()
});

fn fix_escaped_commands(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    let mut last = 0;
    for m in RE_BROKEN_COMMAND.find_iter(s) {
        let before = &s[last..m.start()];
        match s[..m.start()].chars().next_back() {
            Some('\t') => {
                out.push_str(&before[..before.len() - 1]);
                out.push('\\');
                out.push('t');
            }
            Some(c) if c.is_ascii_alphabetic() || c == '\\' => {
                out.push_str(before);
            }
            _ => {
                out.push_str(before);
                out.push('\\');
                out.push('t');
            }
        }
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&s[last..]);
    out.replace(r"\}", "}")
}

// ── Pass 2: `\textit{..}` pseudo-math ────────────────────────────────────

const GREEK_MACROS: &str = "alpha|beta|gamma|delta|epsilon|varepsilon|zeta|eta|theta|vartheta|iota|kappa|lambda|\
mu|nu|xi|pi|varpi|rho|varrho|sigma|varsigma|tau|upsilon|phi|varphi|chi|psi|omega|\
Gamma|Delta|Theta|Lambda|Xi|Pi|Sigma|Upsilon|Phi|Psi|Omega";

const OPERATOR_MACROS: &str = "partial|nabla|infty|cdot|times|pm|leq|geq|ldots|dots";

static RE_TEXTIT_MACRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\\textit\{{\s*(\\(?:{GREEK_MACROS})\b[^}}]*)\}}")).unwrap()
});
static RE_TEXTIT_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\textit\{\s*([A-Za-z])\s*\}\s*\(\s*([^()$]+?)\s*\)").unwrap()
});
static RE_TEXTIT_SCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\textit\{\s*([A-Za-z])\s*\}\s*([_^]\s*(?:\{[^{}]*\}|[A-Za-z0-9]))").unwrap()
});
static RE_TEXTIT_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\textit\{\s*([A-Za-z])\s*\}").unwrap());

fn normalize_textit_math(s: &str) -> String {
    if !s.contains(r"\textit") {
        return s.to_string();
    }
    let (hidden, stash) = hide_math(s);
    let t = RE_TEXTIT_MACRO.replace_all(&hidden, |c: &Captures| format!("${}$", c[1].trim_end()));
    let t = RE_TEXTIT_CALL.replace_all(&t, |c: &Captures| format!("${}({})$", &c[1], &c[2]));
    let t = RE_TEXTIT_SCRIPT.replace_all(&t, |c: &Captures| format!("${}{}$", &c[1], &c[2]));
    let t = RE_TEXTIT_LETTER.replace_all(&t, |c: &Captures| format!("${}$", &c[1]));
    stash.restore(&t)
}

// ── Pass 3: Bare math macros ─────────────────────────────────────────────

static RE_BARE_MACRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\\(?:{GREEK_MACROS}|{OPERATOR_MACROS})\b(?:[ \t]*[A-Za-z]\b)?"
    ))
    .unwrap()
});

fn wrap_math_macros(s: &str) -> String {
    let (hidden, stash) = hide_math(s);
    let t = RE_BARE_MACRO.replace_all(&hidden, |c: &Captures| format!("${}$", &c[0]));
    stash.restore(&t)
}

// ── Pass 5: Bullets ──────────────────────────────────────────────────────

fn normalize_bullets(s: &str) -> String {
    if !s.contains('•') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 16);
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '•' {
            out.push(c);
            continue;
        }
        if out.chars().next_back().is_some_and(|p| !p.is_whitespace()) {
            out.push(' ');
        }
        out.push_str(r"\textbullet{}");
        if chars.peek().is_some_and(|n| !n.is_whitespace()) {
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("  \n \n"), "");
        assert_eq!(escape_text(""), "");
    }

    #[test]
    fn escapes_specials() {
        assert_eq!(escape_text("a & b 50% #1 x_y"), r"a \& b 50\% \#1 x\_y");
        assert_eq!(escape_text("a~b^c"), r"a\textasciitilde{}b\textasciicircum{}c");
        assert_eq!(escape_text("costs 5$"), r"costs 5\$");
    }

    #[test]
    fn escape_is_idempotent() {
        let once = sanitize(r"Q\&A and R&D");
        assert_eq!(once, r"Q\&A and R\&D");
        assert_eq!(sanitize(&once), once);
        assert!(!sanitize(&once).contains(r"\\&"));

        let tricky = "50% of a_b ~ c^2 {x} } {";
        let e = escape_text(tricky);
        assert_eq!(escape_text(&e), e);
    }

    #[test]
    fn braces_balanced_kept_stray_escaped() {
        assert_eq!(escape_text(r"\textbf{bold}"), r"\textbf{bold}");
        assert_eq!(escape_text("a } b"), r"a \} b");
        assert_eq!(escape_text("a { b"), r"a \{ b");
        assert_eq!(escape_text("{a} }"), r"{a} \}");
    }

    #[test]
    fn math_spans_preserved() {
        let out = sanitize(r"$\alpha$ and \beta");
        assert_eq!(out.matches(r"$\alpha$").count(), 1);
        assert!(out.contains(r"$\beta$"), "got: {out}");
        assert_eq!(out, r"$\alpha$ and $\beta$");

        assert_eq!(escape_text(r"x $a_b & c$ y_z"), r"x $a_b & c$ y\_z");
        assert_eq!(escape_text(r"$$a^2$$ and \(b_1\) \[c~d\]"), r"$$a^2$$ and \(b_1\) \[c~d\]");
    }

    #[test]
    fn escaped_dollar_does_not_open_math() {
        assert_eq!(escape_text(r"\$5 and 10_000"), r"\$5 and 10\_000");
    }

    #[test]
    fn macro_with_trailing_letter() {
        assert_eq!(sanitize(r"the \delta c term"), r"the $\delta c$ term");
        assert_eq!(sanitize(r"\tau is time"), r"$\tau$ is time");
        assert_eq!(sanitize(r"a \cdot b"), r"a $\cdot b$");
    }

    #[test]
    fn macro_prefixes_untouched() {
        assert_eq!(wrap_math_macros(r"\numberline and \pmod"), r"\numberline and \pmod");
        assert_eq!(wrap_math_macros(r"\etaxyz"), r"\etaxyz");
    }

    #[test]
    fn textit_math() {
        assert_eq!(normalize_textit_math(r"\textit{\tau}"), r"$\tau$");
        assert_eq!(normalize_textit_math(r"\textit{c}(\tau)"), r"$c(\tau)$");
        assert_eq!(normalize_textit_math(r"\textit{c}_0 and \textit{q}^T"), r"$c_0$ and $q^T$");
        assert_eq!(normalize_textit_math(r"\textit{x} is"), r"$x$ is");
        assert_eq!(normalize_textit_math(r"\textit{SST} stays"), r"\textit{SST} stays");
    }

    #[test]
    fn repairs_broken_commands() {
        assert_eq!(fix_escaped_commands("see extbf{this}"), r"see \textbf{this}");
        assert_eq!(fix_escaped_commands("a\textit{b}"), r"a\textit{b}");
        assert_eq!(fix_escaped_commands(r"keep \textbf{x}"), r"keep \textbf{x}");
        assert_eq!(fix_escaped_commands("next text{x}"), "next text{x}");
        assert_eq!(fix_escaped_commands(r"a \} b"), "a } b");
        assert_eq!(
            fix_escaped_commands("extbf{a}extit{b}"),
            r"\textbf{a}\textit{b}"
        );
    }

    #[test]
    fn bullet_lines_become_itemize() {
        let out = sanitize("- first\n• second & more\n\n-  third");
        assert_eq!(
            out,
            "\\begin{itemize}\n\\item first\n\\item second \\& more\n\\item third\n\\end{itemize}"
        );
        let compact = format_body("- a\n- b", ListStyle::Compact);
        assert!(compact.contains(r"\setlength{\itemsep}{2pt}"));
        assert!(compact.contains(r"\setlength{\parsep}{0pt}"));
    }

    #[test]
    fn mixed_lines_join_into_paragraph() {
        assert_eq!(sanitize("  one line\n\n- not a list\ntwo  "), "one line - not a list two");
    }

    #[test]
    fn inline_bullets_get_spacing() {
        assert_eq!(sanitize("a•b • c"), r"a \textbullet{} b \textbullet{} c");
    }
}
