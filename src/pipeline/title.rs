//! Soft-wrapping of the poster title and of baposter box titles.
//!
//! Limits count Unicode scalar values, not bytes. A wrapped title has at most
//! three lines joined with ` \\ `; the third line is never wrapped further.

/// Preferred break points for the poster title, tried in order. The break
/// goes *after* the separator.
const TITLE_SEPARATORS: &[&str] = &[": ", " - ", " — ", " – "];

/// Box titles additionally break after a middle dot.
const BOX_SEPARATORS: &[&str] = &[": ", " - ", " — ", " – ", "· "];

/// Line separator inserted between wrapped lines.
pub const LINE_BREAK: &str = r" \\ ";

/// Wrap the poster title so it clears the top-right logo.
///
/// A title of at most `first_limit` characters is returned as-is.
pub fn soft_wrap(title: &str, first_limit: usize, next_limit: usize) -> String {
    if title.chars().count() <= first_limit {
        return title.to_string();
    }
    wrap_lines(title, first_limit, next_limit, TITLE_SEPARATORS)
}

/// Wrap a baposter `\headerbox` title. Surrounding whitespace is trimmed.
pub fn soft_wrap_box(title: &str, first_limit: usize, next_limit: usize) -> String {
    let t = title.trim();
    if t.chars().count() <= first_limit {
        return t.to_string();
    }
    wrap_lines(t, first_limit, next_limit, BOX_SEPARATORS)
}

/// Number of `\\` line breaks in a wrapped title.
pub fn line_breaks(wrapped: &str) -> usize {
    wrapped.matches(r"\\").count()
}

fn wrap_lines(text: &str, first_limit: usize, next_limit: usize, seps: &[&str]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let (head, rest) = break_at(&chars, first_limit, seps);
    let mut parts = vec![head];
    if !rest.is_empty() {
        if rest.chars().count() > next_limit {
            let rest_chars: Vec<char> = rest.chars().collect();
            let (mid, tail) = break_at(&rest_chars, next_limit, seps);
            parts.push(mid);
            if !tail.is_empty() {
                parts.push(tail);
            }
        } else {
            parts.push(rest);
        }
    }
    parts.join(LINE_BREAK)
}

/// Split at the last separator that ends within `limit + 1` characters,
/// else at the last space at or before `limit`, else hard at `limit`.
fn break_at(s: &[char], limit: usize, seps: &[&str]) -> (String, String) {
    let collect = |r: &[char]| r.iter().collect::<String>();
    for sep in seps {
        let sep: Vec<char> = sep.chars().collect();
        if let Some(idx) = rfind_before(s, &sep, limit + 1) {
            let cut = idx + sep.len();
            return (
                collect(&s[..cut]).trim_end().to_string(),
                collect(&s[cut..]).trim_start().to_string(),
            );
        }
    }
    let cut = rfind_before(s, &[' '], limit + 1).unwrap_or(limit.min(s.len()));
    (
        collect(&s[..cut]).trim_end().to_string(),
        collect(&s[cut..]).trim_start().to_string(),
    )
}

/// Last start index of `needle` such that the whole match lies before `end`.
fn rfind_before(hay: &[char], needle: &[char], end: usize) -> Option<usize> {
    let end = end.min(hay.len());
    if needle.len() > end {
        return None;
    }
    (0..=end - needle.len())
        .rev()
        .find(|&i| hay[i..i + needle.len()] == *needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_at_limit_is_unwrapped() {
        let t = "a".repeat(30) + " " + &"b".repeat(37);
        assert_eq!(t.chars().count(), 68);
        assert_eq!(soft_wrap(&t, 68, 72), t);
    }

    #[test]
    fn one_over_limit_breaks_at_space() {
        let t = "a".repeat(30) + " " + &"b".repeat(38);
        assert_eq!(t.chars().count(), 69);
        let w = soft_wrap(&t, 68, 72);
        assert_eq!(w, format!("{} \\\\ {}", "a".repeat(30), "b".repeat(38)));
        assert_eq!(line_breaks(&w), 1);
    }

    #[test]
    fn prefers_separator_over_space() {
        let t = "Deep Nets: Learning Representations for Everything We Could Possibly Want";
        let w = soft_wrap(t, 68, 72);
        assert_eq!(
            w,
            r"Deep Nets: \\ Learning Representations for Everything We Could Possibly Want"
        );
    }

    #[test]
    fn at_most_three_lines() {
        let t = vec!["word"; 60].join(" ");
        let w = soft_wrap(&t, 20, 20);
        assert_eq!(line_breaks(&w), 2);
        let first = w.split(LINE_BREAK).next().unwrap();
        assert!(first.chars().count() <= 20);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let t = "é".repeat(68);
        assert_eq!(soft_wrap(&t, 68, 72), t);
        let long = "é".repeat(70);
        let w = soft_wrap(&long, 68, 72);
        assert_eq!(w, format!("{} \\\\ {}", "é".repeat(68), "éé"));
    }

    #[test]
    fn box_titles_wrap_shorter_and_trim() {
        assert_eq!(soft_wrap_box("  Intro  ", 28, 32), "Intro");
        let w = soft_wrap_box("Experimental Results · Ablations and Analysis", 28, 32);
        assert_eq!(w, r"Experimental Results · \\ Ablations and Analysis");
    }
}
