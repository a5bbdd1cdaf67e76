//! # posterbuilder
//!
//! Turn structured paper content into a compilable LaTeX poster.
//!
//! The inputs are what an upstream extraction step produces: the poster
//! title and sections (`poster_content.json`), a geometric arrangement of
//! panels and figures (`arrangement.json`), optional figure captions
//! (`figure_caption.json`) and a LaTeX template. The output is a single
//! `.tex` file plus a `figures/` directory next to it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! poster_content.json + arrangement.json + figure_caption.json + template
//!  │
//!  ├─ 1. Input     parse the JSON inputs, read or pick a template
//!  ├─ 2. Map       figures → panels → sections, initial width fractions
//!  ├─ 3. Budget    shrink figures that would push text out of a section
//!  ├─ 4. Stage     copy figure files into <out>/figures/
//!  ├─ 5. Columns   split sections into columns (optionally weighted widths)
//!  ├─ 6. Assemble  rewrite header and body for beamerposter or baposter
//!  └─ 7. Output    balance check, atomic write, stats + warnings
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use posterbuilder::{build_poster, BuildRequest, LayoutConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = BuildRequest::new(
//!         "run/poster_content.json",
//!         "run/arrangement.json",
//!         "run/latex_proj",
//!     )
//!     .template("run/template.tex");
//!     let output = build_poster(&request, &LayoutConfig::default())?;
//!     eprintln!(
//!         "{} sections, {} figures, {} warnings",
//!         output.stats.sections,
//!         output.stats.figures_placed,
//!         output.warnings.len()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `posterbuilder` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! posterbuilder = { version = "0.3", default-features = false }
//! ```
//!
//! ## Template Flavors
//!
//! | Flavor | Template | Columns |
//! |--------|----------|---------|
//! | `beamer` | beamerposter with `\separatorcolumn` / `\colwidth` | fixed, from the template |
//! | `beamer-adaptive` | beamerposter | widths weighted by the longest section title |
//! | `baposter` | `\documentclass{baposter}` | `\headerbox` chains, bottom-pinned when there is room |
//!
//! `auto` (the default) picks `baposter` when the template's document class
//! is `baposter` and `beamer` otherwise.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod templates;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{LayoutConfig, LayoutConfigBuilder, MissingFigurePolicy, Preset, TemplateFlavor};
pub use convert::{build_poster, plan_layout, render_poster, BuildRequest, PosterInputs};
pub use error::{BuildWarning, PosterError};
pub use model::{Arrangement, CaptionIndex, Meta, PosterContent, Section};
pub use output::{BuildStats, LayoutPlan, PosterOutput};
pub use pipeline::sanitize::sanitize;
