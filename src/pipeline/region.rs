//! Balanced-span scanner and targeted template edits.
//!
//! There is no LaTeX parser here. Every edit locates its anchor by a short
//! regex or substring search and then counts `{`/`}` (or `\begin`/`\end`)
//! depth by hand. Escaped braces (`\{`, `\}`) never change the depth.
//!
//! Per-field edits return the input unchanged when the anchor is missing;
//! callers that *need* an anchor (the columns or poster region) check for it
//! themselves and fail.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use thiserror::Error;

// ── Brace groups ─────────────────────────────────────────────────────────

/// Range of the balanced `{..}` group starting at byte `at`, braces included.
pub fn brace_group_at(tex: &str, at: usize) -> Option<Range<usize>> {
    let b = tex.as_bytes();
    if b.get(at) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = at;
    while i < b.len() {
        match b[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(at..i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Byte offset just past a balanced `[..]` starting at `at`, if there is one.
fn skip_bracket_group(tex: &str, at: usize) -> Option<usize> {
    let b = tex.as_bytes();
    if b.get(at) != Some(&b'[') {
        return None;
    }
    let mut depth = 0usize;
    for (i, &c) in b.iter().enumerate().skip(at) {
        match c {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn skip_whitespace(tex: &str, mut i: usize) -> usize {
    let b = tex.as_bytes();
    while i < b.len() && b[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Find the first `\name` that is not the prefix of a longer command.
fn find_command(tex: &str, name: &str) -> Option<Range<usize>> {
    let token = format!("\\{name}");
    tex.match_indices(&token)
        .map(|(start, m)| start..start + m.len())
        .find(|r| !tex[r.end..].starts_with(|c: char| c.is_ascii_alphabetic()))
}

/// Replace the first `\name[opt]{..}` with `replacement`.
///
/// The optional `[..]` group (nested brackets counted) and whitespace before
/// the brace group are skipped. Returns `tex` unchanged when the command or
/// a balanced brace group is missing.
pub fn replace_command_arg(tex: &str, name: &str, replacement: &str) -> String {
    let Some(cmd) = find_command(tex, name) else {
        return tex.to_string();
    };
    let mut i = skip_whitespace(tex, cmd.end);
    if let Some(after) = skip_bracket_group(tex, i) {
        i = skip_whitespace(tex, after);
    }
    match brace_group_at(tex, i) {
        Some(group) => format!("{}{}{}", &tex[..cmd.start], replacement, &tex[group.end..]),
        None => tex.to_string(),
    }
}

// ── Environments ─────────────────────────────────────────────────────────

fn env_token_regex(env: &str) -> Option<Regex> {
    Regex::new(&format!(r"\\(begin|end)\{{{}\}}", regex::escape(env))).ok()
}

/// Span of the first top-level `\begin{env}..\end{env}` at or after `from`,
/// counting nested occurrences of the same environment.
pub fn find_balanced_environment(tex: &str, env: &str, from: usize) -> Option<Range<usize>> {
    let from = from.min(tex.len());
    let re = env_token_regex(env)?;
    let mut depth = 0usize;
    let mut start = 0usize;
    for caps in re.captures_iter(&tex[from..]) {
        let m = caps.get(0)?;
        if &caps[1] == "begin" {
            if depth == 0 {
                start = from + m.start();
            }
            depth += 1;
        } else if depth > 0 {
            depth -= 1;
            if depth == 0 {
                return Some(start..from + m.end());
            }
        }
    }
    None
}

/// The `\begin{env}[opts]` prefix of a region, or a bare `\begin{env}`.
pub fn begin_token_with_options(region: &str, env: &str) -> String {
    let re = Regex::new(&format!(r"^\\begin\{{{}\}}\s*(?:\[[^\]]*\])?", regex::escape(env)));
    match re.ok().and_then(|re| re.find(region).map(|m| m.as_str().to_string())) {
        Some(tok) => tok,
        None => format!("\\begin{{{env}}}"),
    }
}

// ── baposter `\begin{poster}` arguments ──────────────────────────────────

/// The five brace groups after `\begin{poster}`:
/// options, eye-catcher, title, authors, logo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterArgs {
    pub groups: [Range<usize>; 5],
    /// First byte after the last group; the poster body starts here.
    pub body_start: usize,
}

/// Locate the five `\begin{poster}` argument groups.
pub fn poster_args(tex: &str) -> Option<PosterArgs> {
    let begin = tex.find(r"\begin{poster}")?;
    let mut i = begin + r"\begin{poster}".len();
    let mut groups: Vec<Range<usize>> = Vec::with_capacity(5);
    for _ in 0..5 {
        i += tex[i..].find('{')?;
        let g = brace_group_at(tex, i)?;
        i = g.end;
        groups.push(g);
    }
    let body_start = i;
    let groups: [Range<usize>; 5] = groups.try_into().ok()?;
    Some(PosterArgs { groups, body_start })
}

// ── key=value option lists ───────────────────────────────────────────────

/// Replace `key=..` in a comma-separated option list, or append it.
pub fn set_key_value(opts: &str, key: &str, value: &str) -> String {
    let re = Regex::new(&format!(r"(?:^|[,\s]){}\s*=\s*", regex::escape(key)));
    if let Some(m) = re.ok().and_then(|re| re.find(opts)) {
        let rest = &opts[m.end()..];
        let value_len = rest.find(',').unwrap_or(rest.len());
        let old = rest[..value_len].trim_end();
        return format!("{}{}{}", &opts[..m.end()], value, &rest[old.len()..]);
    }
    let trimmed = opts.trim_end();
    let tail = &opts[trimmed.len()..];
    if trimmed.trim().is_empty() {
        format!("{key}={value}{tail}")
    } else if trimmed.ends_with(',') {
        format!("{trimmed}{key}={value}{tail}")
    } else {
        format!("{trimmed},{key}={value}{tail}")
    }
}

fn set_bracket_option(tex: &str, command: &str, arg: &str, key: &str, value: &str) -> String {
    let pattern = format!(
        r"\\{}\s*(?:\[([^\]]*)\])?\s*\{{{}\}}",
        command,
        regex::escape(arg)
    );
    let Some(caps) = Regex::new(&pattern).ok().and_then(|re| re.captures(tex)) else {
        return tex.to_string();
    };
    let Some(whole) = caps.get(0) else {
        return tex.to_string();
    };
    let opts = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let new_opts = set_key_value(opts, key, value);
    format!(
        "{}\\{}[{}]{{{}}}{}",
        &tex[..whole.start()],
        command,
        new_opts,
        arg,
        &tex[whole.end()..]
    )
}

/// Set `key=value` in `\usepackage[..]{package}`.
pub fn set_package_option(tex: &str, package: &str, key: &str, value: &str) -> String {
    set_bracket_option(tex, "usepackage", package, key, value)
}

/// Set `key=value` in `\documentclass[..]{class}`.
pub fn set_documentclass_option(tex: &str, class: &str, key: &str, value: &str) -> String {
    set_bracket_option(tex, "documentclass", class, key, value)
}

/// Set `key=value` in the first `\begin{poster}` group.
pub fn set_poster_option(tex: &str, key: &str, value: &str) -> String {
    let Some(args) = poster_args(tex) else {
        return tex.to_string();
    };
    let g = &args.groups[0];
    let inner = &tex[g.start + 1..g.end - 1];
    format!(
        "{}{{{}}}{}",
        &tex[..g.start],
        set_key_value(inner, key, value),
        &tex[g.end..]
    )
}

static RE_DOCUMENTCLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\documentclass\s*(?:\[[^\]]*\])?\s*\{([^}]*)\}").unwrap());

/// The class named by `\documentclass`, if any.
pub fn document_class(tex: &str) -> Option<&str> {
    RE_DOCUMENTCLASS
        .captures(tex)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Insert `snippet` right before `\begin{document}`, or append it.
pub fn insert_before_document(tex: &str, snippet: &str) -> String {
    match tex.find(r"\begin{document}") {
        Some(pos) => format!("{}{}{}", &tex[..pos], snippet, &tex[pos..]),
        None => format!("{tex}{snippet}"),
    }
}

// ── Whole-document balance check ─────────────────────────────────────────

/// Why a document failed [`check_balance`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceIssue {
    #[error("unmatched '}}' on line {line}")]
    UnmatchedClose { line: usize },

    #[error("{count} unclosed '{{'")]
    UnclosedBrace { count: usize },

    #[error("\\end{{{found}}} on line {line} closes \\begin{{{expected}}}")]
    MismatchedEnd {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("\\end{{{env}}} on line {line} has no \\begin")]
    UnmatchedEnd { env: String, line: usize },

    #[error("\\begin{{{env}}} is never closed")]
    UnclosedEnvironment { env: String },
}

/// Check brace balance and `\begin`/`\end` pairing over a document.
///
/// Escaped characters and `%` comments are skipped.
pub fn check_balance(tex: &str) -> Result<(), BalanceIssue> {
    let b = tex.as_bytes();
    let mut depth = 0usize;
    let mut envs: Vec<String> = Vec::new();
    let mut line = 1usize;
    let mut i = 0usize;

    while i < b.len() {
        match b[i] {
            b'\n' => line += 1,
            b'%' => {
                while i < b.len() && b[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'\\' => {
                let rest = &tex[i + 1..];
                let (is_begin, skip) = if rest.starts_with("begin{") {
                    (true, "begin{".len())
                } else if rest.starts_with("end{") {
                    (false, "end{".len())
                } else {
                    if b.get(i + 1) == Some(&b'\n') {
                        line += 1;
                    }
                    i += 2;
                    continue;
                };
                let name_start = i + 1 + skip;
                let Some(close) = tex[name_start..].find('}') else {
                    return Err(BalanceIssue::UnclosedBrace { count: depth + 1 });
                };
                let name = tex[name_start..name_start + close].to_string();
                if is_begin {
                    envs.push(name);
                } else {
                    match envs.pop() {
                        Some(open) if open == name => {}
                        Some(open) => {
                            return Err(BalanceIssue::MismatchedEnd {
                                expected: open,
                                found: name,
                                line,
                            })
                        }
                        None => return Err(BalanceIssue::UnmatchedEnd { env: name, line }),
                    }
                }
                i = name_start + close + 1;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    return Err(BalanceIssue::UnmatchedClose { line });
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }

    if let Some(env) = envs.pop() {
        return Err(BalanceIssue::UnclosedEnvironment { env });
    }
    if depth > 0 {
        return Err(BalanceIssue::UnclosedBrace { count: depth });
    }
    Ok(())
}
