//! Content-to-section mapping: attach arranged figures to poster sections.
//!
//! A figure reaches a section through its panel: `figure.panel_id` → panel →
//! `panel.section_name`, matched against section titles after
//! [`normalize_title`]. Figures whose panel matches nothing are dropped.

use crate::config::FigureBudget;
use crate::model::{
    normalize_title, CaptionIndex, Figure, LayoutFigure, Panel, Section, SectionLayout,
    EXCLUDED_SECTION_TITLE,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Result of [`map_figures`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FigureMap {
    /// One entry per input section, same order.
    pub sections: Vec<SectionLayout>,
    /// `(panel_id, section_name)` of panels that match no section.
    pub unmapped_panels: Vec<(String, String)>,
    /// Normalised titles shared by more than one section.
    pub duplicate_titles: Vec<String>,
    /// Figures dropped because their panel is unknown or unmapped.
    pub dropped_figures: usize,
}

impl FigureMap {
    pub fn figure_count(&self) -> usize {
        self.sections.iter().map(|s| s.figures.len()).sum()
    }
}

/// Attach each arranged figure to its section and compute its width.
///
/// Width rule: `frac = figure.width / panel.width * panel_fill` when both are
/// positive, else `fallback_frac`; then `clamp(frac * enlarge_factor)`.
/// Figures within a section are ordered by ascending `y` (stable).
pub fn map_figures(
    sections: &[Section],
    panels: &[Panel],
    figures: &[Figure],
    captions: &CaptionIndex,
    cfg: &FigureBudget,
) -> FigureMap {
    let excluded = normalize_title(EXCLUDED_SECTION_TITLE);
    let mut map = FigureMap {
        sections: vec![SectionLayout::default(); sections.len()],
        ..FigureMap::default()
    };

    let mut title_to_idx: HashMap<String, usize> = HashMap::new();
    for (i, sec) in sections.iter().enumerate() {
        let key = normalize_title(&sec.title);
        if key == excluded {
            continue;
        }
        if title_to_idx.contains_key(&key) {
            if !map.duplicate_titles.contains(&key) {
                map.duplicate_titles.push(key);
            }
            continue;
        }
        title_to_idx.insert(key, i);
    }

    let mut panel_by_id: HashMap<&str, &Panel> = HashMap::new();
    let mut panel_to_section: HashMap<&str, usize> = HashMap::new();
    for p in panels.iter().filter(|p| !p.panel_id.is_empty()) {
        panel_by_id.insert(&p.panel_id, p);
        match title_to_idx.get(&normalize_title(&p.section_name)) {
            Some(&sidx) => {
                panel_to_section.insert(&p.panel_id, sidx);
                map.sections[sidx].panel_height = p.height;
            }
            None => {
                panel_to_section.remove(p.panel_id.as_str());
                map.unmapped_panels
                    .push((p.panel_id.clone(), p.section_name.clone()));
            }
        }
    }

    for fig in figures {
        let (Some(&sidx), Some(panel)) = (
            panel_to_section.get(fig.panel_id.as_str()),
            panel_by_id.get(fig.panel_id.as_str()),
        ) else {
            map.dropped_figures += 1;
            continue;
        };
        let width_frac = initial_width_frac(fig.width, panel.width, cfg);
        let caption = captions.lookup(&fig.figure_path).map(clean_caption).unwrap_or_default();
        debug!(
            "Figure '{}' → section {} (width {:.2})",
            fig.figure_path, sidx, width_frac
        );
        map.sections[sidx].figures.push(LayoutFigure {
            src: fig.figure_path.clone(),
            caption,
            width_frac,
            order_y: fig.y,
            arranged_height: fig.height,
            missing: false,
        });
    }

    for layout in &mut map.sections {
        layout.figures.sort_by(|a, b| a.order_y.total_cmp(&b.order_y));
    }
    map
}

/// Width fraction from arranged figure and panel widths.
///
/// `figure / panel * panel_fill`, enlarged and clamped. Unlike a plain
/// `figure / max(panel, ε)` division, a zero or negative width on either side
/// takes `fallback_frac` before enlarging.
pub fn initial_width_frac(figure_width: f64, panel_width: f64, cfg: &FigureBudget) -> f64 {
    let frac = if figure_width > 0.0 && panel_width > 0.0 {
        figure_width / panel_width * cfg.panel_fill
    } else {
        cfg.fallback_frac
    };
    cfg.clamp(frac * cfg.enlarge_factor)
}

static RE_CAPTION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:figure|fig\.?)\s*\d+(?:\s*[a-z]\)|\s*[a-z])?\s*[:：.\-–—]\s*").unwrap()
});

/// Strip a leading `Figure 3:` / `Fig. 2a)` / `Figure 1.` label.
pub fn clean_caption(caption: &str) -> String {
    RE_CAPTION_PREFIX.replace(caption, "").trim().to_string()
}
