//! Column distribution and adaptive column widths.

use crate::config::ColumnConfig;
use serde::Serialize;

/// Split `items` into `n_columns` contiguous buckets.
///
/// The first `len % n` buckets get one extra item; order is preserved
/// within and across buckets. `n_columns == 0` is treated as 1.
pub fn distribute<T: Clone>(items: &[T], n_columns: usize) -> Vec<Vec<T>> {
    let n = n_columns.max(1);
    let base = items.len() / n;
    let rem = items.len() % n;
    let mut out = Vec::with_capacity(n);
    let mut idx = 0;
    for col in 0..n {
        let take = base + usize::from(col < rem);
        out.push(items[idx..idx + take].to_vec());
        idx += take;
    }
    out
}

/// Widths of the content columns and of each separator column, as shares of
/// `\paperwidth`. There are `columns.len() + 1` separators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnWidths {
    pub columns: Vec<f64>,
    pub separator: f64,
}

impl ColumnWidths {
    /// Columns plus separators; 1.0 up to rounding.
    pub fn total(&self) -> f64 {
        self.columns.iter().sum::<f64>() + (self.columns.len() + 1) as f64 * self.separator
    }
}

/// Weight columns by their longest section title.
///
/// Every column weighs 1; the column holding the longest title overall
/// (first on ties) gets `heavy_boost` more when that title has at least
/// `long_title_threshold` characters. Fractions are clamped to
/// `[frac_min, frac_max]` and then rescaled so they fill the width left
/// after the separators.
pub fn column_fractions<S: AsRef<str>>(titles_by_column: &[Vec<S>], cfg: &ColumnConfig) -> ColumnWidths {
    let n = titles_by_column.len().max(1);
    let mut weights = vec![1.0_f64; n];

    let longest: Vec<usize> = titles_by_column
        .iter()
        .map(|col| col.iter().map(|t| t.as_ref().chars().count()).max().unwrap_or(0))
        .collect();
    let mut heavy = 0;
    for (i, &len) in longest.iter().enumerate() {
        if len > longest[heavy] {
            heavy = i;
        }
    }
    if longest.get(heavy).is_some_and(|&len| len >= cfg.long_title_threshold) {
        weights[heavy] += cfg.heavy_boost;
    }

    let usable = 1.0 - (n + 1) as f64 * cfg.sep_frac;
    let total_w: f64 = weights.iter().sum();
    let mut fracs: Vec<f64> = weights
        .iter()
        .map(|w| (usable * w / total_w).clamp(cfg.frac_min, cfg.frac_max))
        .collect();
    let sum: f64 = fracs.iter().sum();
    if sum > 0.0 {
        for f in &mut fracs {
            *f *= usable / sum;
        }
    }
    ColumnWidths {
        columns: fracs,
        separator: cfg.sep_frac,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_invariant() {
        for n in 0..20usize {
            let items: Vec<usize> = (0..n).collect();
            let cols = distribute(&items, 3);
            assert_eq!(cols.len(), 3);
            let flat: Vec<usize> = cols.iter().flatten().copied().collect();
            assert_eq!(flat, items);
            let max = cols.iter().map(Vec::len).max().unwrap();
            let min = cols.iter().map(Vec::len).min().unwrap();
            assert!(max - min <= 1);
        }
    }

    #[test]
    fn remainder_goes_to_leading_columns() {
        let cols = distribute(&["a", "b", "c", "d", "e"], 3);
        assert_eq!(cols, vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]);
        assert_eq!(distribute(&[1, 2], 0), vec![vec![1, 2]]);
    }

    #[test]
    fn equal_titles_give_equal_columns() {
        let cfg = ColumnConfig::default();
        let w = column_fractions(&[vec!["Intro"], vec!["Method"], vec!["Results"]], &cfg);
        assert!((w.total() - 1.0).abs() < 1e-9);
        let expected = (1.0 - 4.0 * 0.02) / 3.0;
        for f in &w.columns {
            assert!((f - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn long_title_widens_its_column() {
        let cfg = ColumnConfig::default();
        let long = "A Very Long Section Title About Experiments";
        assert!(long.chars().count() >= cfg.long_title_threshold);
        let w = column_fractions(&[vec!["Intro"], vec!["Method", long], vec![]], &cfg);
        assert!((w.total() - 1.0).abs() < 1e-9);
        assert!(w.columns[1] > w.columns[0]);
        assert!((w.columns[0] - w.columns[2]).abs() < 1e-12);
        // 0.92 * 1.5 / 3.5 = 0.394 stays under the 0.42 cap.
        assert!((w.columns[1] - 0.92 * 1.5 / 3.5).abs() < 1e-9);
    }

    #[test]
    fn ties_boost_first_column() {
        let cfg = ColumnConfig {
            long_title_threshold: 3,
            ..ColumnConfig::default()
        };
        let w = column_fractions(&[vec!["abcd"], vec!["wxyz"], vec!["ab"]], &cfg);
        assert!(w.columns[0] > w.columns[1]);
    }
}
