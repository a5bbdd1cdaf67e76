//! Output types returned by the build entry points.

use crate::config::TemplateFlavor;
use crate::error::BuildWarning;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of [`crate::render_poster`] / [`crate::build_poster`].
#[derive(Debug, Clone)]
pub struct PosterOutput {
    /// The assembled LaTeX document.
    pub tex: String,
    /// The layout decisions behind `tex`.
    pub plan: LayoutPlan,
    pub stats: BuildStats,
    /// Non-fatal problems; the document is still usable.
    pub warnings: Vec<BuildWarning>,
}

/// Counters for one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Flavor actually used (never `auto`).
    pub flavor: TemplateFlavor,
    /// Sections laid out, excluding the title section.
    pub sections: usize,
    /// Number of sections per column.
    pub columns: Vec<usize>,
    /// `\includegraphics` references emitted.
    pub figures_placed: usize,
    /// Figures rendered as placeholders or left out.
    pub figures_missing: usize,
    /// Figures whose width the budget passes reduced.
    pub figures_shrunk: usize,
    /// Figure files copied into the output project.
    pub figures_copied: usize,
    /// Lines of the wrapped poster title.
    pub title_lines: usize,
    /// Size command chosen for the title.
    pub title_size: String,
    pub tex_bytes: usize,
    /// Where the `.tex` was written; `None` for in-memory renders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub total_duration_ms: u64,
}

/// The column plan and figure widths, without any LaTeX.
///
/// Produced by [`crate::plan_layout`] and printed by `--plan-only`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub flavor: TemplateFlavor,
    /// The poster title after soft-wrapping.
    pub title: String,
    pub columns: Vec<PlannedColumn>,
    pub warnings: Vec<BuildWarning>,
}

impl LayoutPlan {
    pub fn section_count(&self) -> usize {
        self.columns.iter().map(|c| c.sections.len()).sum()
    }

    pub fn figure_count(&self) -> usize {
        self.columns
            .iter()
            .flat_map(|c| &c.sections)
            .map(|s| s.figures.len())
            .sum()
    }
}

/// One output column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedColumn {
    /// Share of `\paperwidth`, for the adaptive beamer flavor only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// baposter: the last box is anchored to the bottom edge.
    pub pin_bottom: bool,
    pub sections: Vec<PlannedSection>,
}

/// One section inside a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSection {
    pub title: String,
    pub chars: usize,
    pub figures: Vec<PlannedFigure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedFigure {
    pub src: String,
    pub width_frac: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub missing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> LayoutPlan {
        let fig = |src: &str| PlannedFigure {
            src: src.into(),
            width_frac: 0.85,
            missing: false,
        };
        LayoutPlan {
            flavor: TemplateFlavor::BeamerFixed,
            title: "T".into(),
            columns: vec![
                PlannedColumn {
                    width: None,
                    pin_bottom: false,
                    sections: vec![PlannedSection {
                        title: "Intro".into(),
                        chars: 10,
                        figures: vec![fig("a.png"), fig("b.png")],
                    }],
                },
                PlannedColumn {
                    width: None,
                    pin_bottom: false,
                    sections: vec![PlannedSection {
                        title: "Method".into(),
                        chars: 3,
                        figures: vec![],
                    }],
                },
            ],
            warnings: vec![],
        }
    }

    #[test]
    fn plan_counts() {
        let p = plan();
        assert_eq!(p.section_count(), 2);
        assert_eq!(p.figure_count(), 2);
    }

    #[test]
    fn plan_json_omits_defaults() {
        let json = serde_json::to_string(&plan()).unwrap();
        assert!(json.contains(r#""flavor":"beamer-fixed""#), "got: {json}");
        assert!(!json.contains("\"width\""));
        assert!(!json.contains("\"missing\""));
    }

    #[test]
    fn stats_roundtrip_skips_output_path() {
        let stats = BuildStats {
            flavor: TemplateFlavor::Baposter,
            sections: 4,
            ..BuildStats::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(!json.contains("output_path"));
        let back: BuildStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
