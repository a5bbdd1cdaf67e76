//! Error types for the posterbuilder library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PosterError`] — **Fatal**: the build cannot produce a usable `.tex`
//!   (unreadable input, malformed JSON, a template without the region the
//!   sections must be placed into). Returned as `Err(PosterError)` from the
//!   top-level functions in [`crate::convert`].
//!
//! * [`BuildWarning`] — **Non-fatal**: something was skipped or degraded
//!   (a figure file is missing, a panel matches no section) but the poster
//!   is still valid LaTeX. Collected in [`crate::output::PosterOutput`] so
//!   callers can report them after the build.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the posterbuilder library.
#[derive(Debug, Error)]
pub enum PosterError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading an input failed for another I/O reason.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input file is not the JSON shape the builder expects.
    #[error("Invalid JSON in '{path}': {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Template errors ───────────────────────────────────────────────────
    /// The template lacks a region that content placement depends on.
    #[error("Template ({flavor}) has no {anchor}; cannot place poster sections")]
    MissingAnchor { anchor: String, flavor: String },

    // ── Figure errors ─────────────────────────────────────────────────────
    /// A figure asset is missing and the policy says to abort.
    #[error("Figure asset missing: '{figure}': {reason}")]
    MissingFigure { figure: String, reason: String },

    /// Copying a figure into the output project failed.
    #[error("Failed to stage figure '{figure}': {source}")]
    AssetStaging {
        figure: String,
        #[source]
        source: figure_assets::AssetError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output `.tex` file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PosterError {
    pub(crate) fn missing_anchor(anchor: impl Into<String>, flavor: impl std::fmt::Display) -> Self {
        PosterError::MissingAnchor {
            anchor: anchor.into(),
            flavor: flavor.to_string(),
        }
    }
}

/// A non-fatal problem encountered during a build.
///
/// Stored in [`crate::output::PosterOutput::warnings`]; the build itself
/// still succeeds.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum BuildWarning {
    /// A figure file could not be found or copied.
    #[error("Figure '{figure}': {reason} ({action})")]
    FigureAssetMissing {
        figure: String,
        reason: String,
        action: String,
    },

    /// A panel's name matched no section; its figures were dropped.
    #[error("Panel '{panel_id}' ('{panel_name}') matches no section; its figures are dropped")]
    UnmappedPanel { panel_id: String, panel_name: String },

    /// Two sections normalise to the same title; only the first gets figures.
    #[error("Duplicate section title '{title}'; figures map to the first occurrence")]
    DuplicateSectionTitle { title: String },

    /// The assembled document failed the final brace/environment check.
    #[error("Assembled document is unbalanced: {detail}")]
    UnbalancedOutput { detail: String },

    /// No sections were left after excluding the title section.
    #[error("Poster content has no sections to lay out")]
    EmptySectionList,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_anchor_display() {
        let e = PosterError::missing_anchor("\\begin{columns} region", "beamer");
        let msg = e.to_string();
        assert!(msg.contains("beamer"), "got: {msg}");
        assert!(msg.contains("\\begin{columns}"), "got: {msg}");
    }

    #[test]
    fn missing_figure_display() {
        let e = PosterError::MissingFigure {
            figure: "imgs/fig1.png".into(),
            reason: "not found".into(),
        };
        assert!(e.to_string().contains("imgs/fig1.png"));
    }

    #[test]
    fn warning_display_and_serde() {
        let w = BuildWarning::UnmappedPanel {
            panel_id: "p7".into(),
            panel_name: "Appendix".into(),
        };
        assert!(w.to_string().contains("p7"));
        let json = serde_json::to_string(&w).unwrap();
        let back: BuildWarning = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}
