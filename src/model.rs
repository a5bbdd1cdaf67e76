//! Input data model: poster content, arrangement and captions.
//!
//! All types deserialize leniently: missing fields and JSON `null` read as
//! the empty string or `0.0`, so a partially filled file from the upstream
//! planner still loads.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// The section carrying the poster title and authors; never laid out.
pub const EXCLUDED_SECTION_TITLE: &str = "Poster Title & Author";

/// Lowercase, `&` → `and`, whitespace collapsed to single spaces.
pub fn normalize_title(s: &str) -> String {
    s.to_lowercase()
        .replace('&', "and")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// ── poster_content.json ──────────────────────────────────────────────────

/// `poster_content.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosterContent {
    #[serde(deserialize_with = "null_as_default")]
    pub meta: Meta,
    #[serde(deserialize_with = "null_as_default")]
    pub sections: Vec<Section>,
}

impl PosterContent {
    /// Sections in input order, without the title/author section.
    pub fn layout_sections(&self) -> Vec<Section> {
        let excluded = normalize_title(EXCLUDED_SECTION_TITLE);
        self.sections
            .iter()
            .filter(|s| normalize_title(&s.title) != excluded)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    #[serde(deserialize_with = "null_as_default")]
    pub poster_title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub authors: String,
    #[serde(deserialize_with = "null_as_default")]
    pub affiliations: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

// ── arrangement.json ─────────────────────────────────────────────────────

/// `arrangement.json`. The panel list is read from `panels` or
/// `panel_arrangement`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arrangement {
    #[serde(alias = "panel_arrangement", deserialize_with = "null_as_default")]
    pub panels: Vec<Panel>,
    #[serde(deserialize_with = "null_as_default")]
    pub figure_arrangement: Vec<Figure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Panel {
    #[serde(deserialize_with = "null_as_default")]
    pub panel_id: String,
    #[serde(alias = "panel_name", deserialize_with = "null_as_default")]
    pub section_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub width: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Figure {
    #[serde(deserialize_with = "null_as_default")]
    pub panel_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub figure_path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub width: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub height: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub y: f64,
}

// ── figure_caption.json ──────────────────────────────────────────────────

/// Captions keyed by full image path, with a basename fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptionIndex {
    full: HashMap<String, String>,
    base: HashMap<String, String>,
}

impl CaptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image_path: &str, caption: &str) {
        if image_path.is_empty() {
            return;
        }
        self.full.insert(image_path.to_string(), caption.to_string());
        self.base
            .insert(figure_assets::basename(image_path).to_string(), caption.to_string());
    }

    /// Build from the caption file's JSON: an object whose values carry
    /// `image_path` and `caption`. Anything else is ignored.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut index = Self::new();
        if let Some(obj) = value.as_object() {
            for entry in obj.values() {
                let path = entry.get("image_path").and_then(|v| v.as_str()).unwrap_or("");
                let caption = entry.get("caption").and_then(|v| v.as_str()).unwrap_or("");
                index.insert(path, caption);
            }
        }
        index
    }

    /// Raw caption for a figure path; empty captions count as absent.
    pub fn lookup(&self, figure_path: &str) -> Option<&str> {
        self.full
            .get(figure_path)
            .filter(|c| !c.is_empty())
            .or_else(|| {
                self.base
                    .get(figure_assets::basename(figure_path))
                    .filter(|c| !c.is_empty())
            })
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }
}

// ── Derived layout ───────────────────────────────────────────────────────

/// A figure placed into a section, with its computed width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutFigure {
    /// `figure_path` as given in the arrangement.
    pub src: String,
    /// Caption with any `Figure N:` prefix removed; may be empty.
    pub caption: String,
    /// Width as a fraction of `\linewidth`.
    pub width_frac: f64,
    pub order_y: f64,
    pub arranged_height: f64,
    /// The asset could not be staged; render a placeholder instead.
    #[serde(default)]
    pub missing: bool,
}

/// Figures of one section plus the height of the panel they came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub figures: Vec<LayoutFigure>,
    pub panel_height: f64,
}

impl SectionLayout {
    pub fn arranged_height(&self) -> f64 {
        self.figures.iter().map(|f| f.arranged_height).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_replaces_ampersand() {
        assert_eq!(normalize_title("  Results &  Discussion "), "results and discussion");
        assert_eq!(normalize_title("Poster Title & Author"), "poster title and author");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn content_with_nulls_and_missing_fields() {
        let c: PosterContent = serde_json::from_str(
            r#"{"meta":{"poster_title":null},"sections":[{"title":"Intro"},{"title":"Poster Title & Author","content":"x"}]}"#,
        )
        .unwrap();
        assert_eq!(c.meta.poster_title, "");
        assert_eq!(c.meta.authors, "");
        let secs = c.layout_sections();
        assert_eq!(secs.len(), 1);
        assert_eq!(secs[0].title, "Intro");
        assert_eq!(secs[0].content, "");
    }

    #[test]
    fn arrangement_accepts_both_key_spellings() {
        let a: Arrangement = serde_json::from_str(
            r#"{"panel_arrangement":[{"panel_id":"p1","panel_name":"Intro","width":10,"height":null}],
                "figure_arrangement":[{"panel_id":"p1","figure_path":"a.png"}]}"#,
        )
        .unwrap();
        assert_eq!(a.panels[0].section_name, "Intro");
        assert_eq!(a.panels[0].width, 10.0);
        assert_eq!(a.panels[0].height, 0.0);
        assert_eq!(a.figure_arrangement[0].y, 0.0);

        let b: Arrangement =
            serde_json::from_str(r#"{"panels":[{"panel_id":"p1","section_name":"Method"}]}"#).unwrap();
        assert_eq!(b.panels[0].section_name, "Method");
        assert!(b.figure_arrangement.is_empty());
    }

    #[test]
    fn caption_lookup_falls_back_to_basename() {
        let v: serde_json::Value = serde_json::from_str(
            r#"{"1":{"image_path":"imgs/a/fig1.png","caption":"Figure 1: A"},
                "2":{"image_path":"fig2.png","caption":""},
                "3":"not an object"}"#,
        )
        .unwrap();
        let idx = CaptionIndex::from_json(&v);
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.lookup("imgs/a/fig1.png"), Some("Figure 1: A"));
        assert_eq!(idx.lookup("other/dir/fig1.png"), Some("Figure 1: A"));
        assert_eq!(idx.lookup("fig2.png"), None);
        assert_eq!(idx.lookup("nope.png"), None);
    }
}
