//! Figure budget: shrink figures that would crowd out a section's text.
//!
//! Both passes here only ever *reduce* `width_frac`, and every result stays
//! within `[min_frac, max_frac]`. Degenerate input (no text, zero panel
//! height) leaves the figures alone.

use crate::config::{BaposterConfig, FigureBudget};
use crate::model::{Section, SectionLayout};
use serde::Serialize;
use tracing::debug;

/// Rough size of a section's text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextEstimate {
    pub n_chars: usize,
    pub n_lines: usize,
    /// Share of the panel height the text is expected to take.
    pub text_ratio: f64,
}

/// Estimate text size from character count.
pub fn estimate_text(content: &str, cfg: &FigureBudget) -> TextEstimate {
    let n_chars = content.trim().chars().count();
    let n_lines = n_chars.div_ceil(cfg.chars_per_line.max(1));
    TextEstimate {
        n_chars,
        n_lines,
        text_ratio: n_lines as f64 * cfg.line_height_weight,
    }
}

/// What the allocator decided for one section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetOutcome {
    /// Figure-height share the section may use.
    pub allowed: f64,
    /// Figure-height share as arranged.
    pub current: f64,
    /// Factor applied to every width, when the section was over budget.
    pub scale: Option<f64>,
}

/// Shrink a section's figures when their arranged height exceeds the budget.
///
/// `ratio_limit = max(min_ratio_limit, base − min(max_relief, relief·chars/600))`
/// and `allowed = max(0, ratio_limit − text_ratio − safety_margin)`. When the
/// arranged share exceeds a positive `allowed`, every width is multiplied by
/// `allowed / current` and clamped.
pub fn allocate(content: &str, layout: &mut SectionLayout, cfg: &FigureBudget) -> BudgetOutcome {
    let text = estimate_text(content, cfg);
    let relief = (cfg.relief_per_600_chars * text.n_chars as f64 / 600.0).min(cfg.max_text_relief);
    let ratio_limit = (cfg.base_ratio_limit - relief).max(cfg.min_ratio_limit);
    let allowed = (ratio_limit - text.text_ratio - cfg.safety_margin).max(0.0);
    let current = if layout.panel_height > 0.0 {
        layout.arranged_height() / layout.panel_height
    } else {
        0.0
    };

    let mut outcome = BudgetOutcome {
        allowed,
        current,
        scale: None,
    };
    if layout.figures.is_empty() || allowed <= 0.0 || current <= allowed {
        return outcome;
    }

    let scale = allowed / current;
    for fig in &mut layout.figures {
        fig.width_frac = shrink(fig.width_frac, scale, cfg);
    }
    debug!(
        "Section over budget ({:.3} > {:.3}); widths scaled by {:.3}",
        current, allowed, scale
    );
    outcome.scale = Some(scale);
    outcome
}

fn shrink(width: f64, scale: f64, cfg: &FigureBudget) -> f64 {
    cfg.clamp(width * scale).min(width)
}

/// Estimated share of a column one section occupies: its text plus each
/// figure's width (clamped to the occupancy bounds).
pub fn section_occupancy(
    section: &Section,
    layout: &SectionLayout,
    figures: &FigureBudget,
    bap: &BaposterConfig,
) -> f64 {
    let text = estimate_text(&section.content, figures).text_ratio;
    let figs: f64 = layout
        .figures
        .iter()
        .map(|f| f.width_frac.clamp(bap.occupancy_fig_min, bap.occupancy_fig_max))
        .sum();
    text + figs
}

/// Per-column occupancy pass for baposter.
///
/// `columns` holds section indices per column. Columns over
/// `max_occupancy` get every figure scaled by
/// `clamp(shrink_min, shrink_max, max_occupancy / occupancy)`. Returns, per
/// column, whether its last box may be pinned to the bottom, judged on the
/// occupancy *before* shrinking.
pub fn rebalance_columns(
    sections: &[Section],
    layouts: &mut [SectionLayout],
    columns: &[Vec<usize>],
    figures: &FigureBudget,
    bap: &BaposterConfig,
) -> Vec<bool> {
    columns
        .iter()
        .enumerate()
        .map(|(col, idxs)| {
            let occ: f64 = idxs
                .iter()
                .filter_map(|&i| Some(section_occupancy(sections.get(i)?, layouts.get(i)?, figures, bap)))
                .sum();
            if occ > bap.max_occupancy && occ > 0.0 {
                let scale = (bap.max_occupancy / occ).clamp(bap.shrink_min, bap.shrink_max);
                debug!("Column {} occupancy {:.2}; figure widths scaled by {:.2}", col, occ, scale);
                for &i in idxs {
                    if let Some(layout) = layouts.get_mut(i) {
                        for fig in &mut layout.figures {
                            fig.width_frac = shrink(fig.width_frac, scale, figures);
                        }
                    }
                }
            }
            occ <= bap.max_occupancy
        })
        .collect()
}
