//! Configuration types for poster generation.
//!
//! Every layout knob lives in [`LayoutConfig`], built via its
//! [`LayoutConfigBuilder`] or taken from one of the [`Preset`]s. The config is
//! immutable for the duration of a build and is passed explicitly to the
//! mapper, the budget allocator and the assembler.
//!
//! All structs derive `Serialize`/`Deserialize` with `#[serde(default)]`, so a
//! JSON preset file only needs the fields it overrides.

use crate::error::PosterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for one poster build.
///
/// # Example
/// ```rust
/// use posterbuilder::{LayoutConfig, TemplateFlavor};
///
/// let config = LayoutConfig::builder()
///     .flavor(TemplateFlavor::BeamerAdaptive)
///     .figure_fracs(0.6, 0.95)
///     .build()
///     .unwrap();
/// assert_eq!(config.figures.max_frac, 0.95);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Which template strategy to use. Default: [`TemplateFlavor::Auto`].
    pub flavor: TemplateFlavor,

    /// New value for `scale=` in `\usepackage[...]{beamerposter}`. Default: 1.0.
    pub beamer_scale: f64,

    /// Figure sizing and the per-section figure budget.
    pub figures: FigureBudget,

    /// Font-size commands injected before `\begin{document}`.
    pub fonts: FontSizes,

    /// Top-right logo.
    pub logo: LogoConfig,

    /// Column count and adaptive-width parameters.
    pub columns: ColumnConfig,

    /// Soft-wrap limits for the poster title and baposter box titles.
    pub title_wrap: TitleWrap,

    /// Parameters only the baposter flavor reads.
    pub baposter: BaposterConfig,

    /// Emit `\caption{}` / `\captionof{figure}{}` under figures. Default: true.
    pub emit_captions: bool,

    /// What to do when a figure file cannot be staged. Default: placeholder.
    pub missing_figures: MissingFigurePolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            flavor: TemplateFlavor::default(),
            beamer_scale: 1.0,
            figures: FigureBudget::default(),
            fonts: FontSizes::default(),
            logo: LogoConfig::default(),
            columns: ColumnConfig::default(),
            title_wrap: TitleWrap::default(),
            baposter: BaposterConfig::default(),
            emit_captions: true,
            missing_figures: MissingFigurePolicy::default(),
        }
    }
}

impl LayoutConfig {
    /// Create a new builder starting from [`LayoutConfig::default()`].
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder {
            config: Self::default(),
        }
    }

    /// The values one of the reference scripts used.
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Standard => Self::default(),
            Preset::Classic => Self {
                beamer_scale: 1.1,
                figures: FigureBudget {
                    enabled: false,
                    enlarge_factor: 1.1,
                    min_frac: 0.60,
                    max_frac: 0.92,
                    ..FigureBudget::default()
                },
                fonts: FontSizes {
                    title_wrap1: r"\Huge".into(),
                    title_wrap2plus: r"\Huge".into(),
                    caption: Some(r"\small".into()),
                    above_caption_skip: "8pt".into(),
                    below_caption_skip: "8pt".into(),
                    ..FontSizes::default()
                },
                ..Self::default()
            },
            Preset::Baposter => Self {
                flavor: TemplateFlavor::Baposter,
                beamer_scale: 1.15,
                figures: FigureBudget {
                    min_frac: 0.60,
                    max_frac: 0.98,
                    ..FigureBudget::default()
                },
                fonts: FontSizes {
                    caption: Some(r"\normalsize".into()),
                    ..FontSizes::default()
                },
                ..Self::default()
            },
        }
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), PosterError> {
        let f = &self.figures;
        if !(f.min_frac > 0.0 && f.min_frac <= f.max_frac && f.max_frac <= 1.0) {
            return Err(PosterError::InvalidConfig(format!(
                "figure fractions must satisfy 0 < min ≤ max ≤ 1, got min={} max={}",
                f.min_frac, f.max_frac
            )));
        }
        if f.chars_per_line == 0 {
            return Err(PosterError::InvalidConfig(
                "chars_per_line must be ≥ 1".into(),
            ));
        }
        let c = &self.columns;
        if c.count == 0 || c.count > MAX_COLUMNS {
            return Err(PosterError::InvalidConfig(format!(
                "column count must be 1–{MAX_COLUMNS}, got {}",
                c.count
            )));
        }
        if c.sep_frac < 0.0 || (c.count + 1) as f64 * c.sep_frac >= 1.0 {
            return Err(PosterError::InvalidConfig(format!(
                "separator fraction {} leaves no room for {} columns",
                c.sep_frac, c.count
            )));
        }
        if !(c.frac_min <= c.frac_max) {
            return Err(PosterError::InvalidConfig(format!(
                "column fraction bounds inverted: min={} max={}",
                c.frac_min, c.frac_max
            )));
        }
        let t = &self.title_wrap;
        if t.first_limit == 0 || t.next_limit == 0 {
            return Err(PosterError::InvalidConfig(
                "title wrap limits must be ≥ 1".into(),
            ));
        }
        if t.box_first_limit == 0 || t.box_next_limit == 0 {
            return Err(PosterError::InvalidConfig(
                "box title wrap limits must be ≥ 1".into(),
            ));
        }
        self.baposter.validate()
    }
}

impl BaposterConfig {
    /// Bounds used by the column occupancy pass; `f64::clamp` requires min ≤ max.
    pub fn validate(&self) -> Result<(), PosterError> {
        if !(self.occupancy_fig_min > 0.0 && self.occupancy_fig_min <= self.occupancy_fig_max) {
            return Err(PosterError::InvalidConfig(format!(
                "baposter occupancy bounds must satisfy 0 < min ≤ max, got min={} max={}",
                self.occupancy_fig_min, self.occupancy_fig_max
            )));
        }
        if !(self.shrink_min > 0.0 && self.shrink_min <= self.shrink_max && self.shrink_max <= 1.0)
        {
            return Err(PosterError::InvalidConfig(format!(
                "baposter shrink bounds must satisfy 0 < min ≤ max ≤ 1, got min={} max={}",
                self.shrink_min, self.shrink_max
            )));
        }
        if !(self.max_occupancy > 0.0) {
            return Err(PosterError::InvalidConfig(format!(
                "baposter max_occupancy must be > 0, got {}",
                self.max_occupancy
            )));
        }
        if !(self.figure_floor > 0.0 && self.figure_floor <= 1.0) {
            return Err(PosterError::InvalidConfig(format!(
                "baposter figure_floor must be in (0, 1], got {}",
                self.figure_floor
            )));
        }
        Ok(())
    }
}

/// Upper bound on [`ColumnConfig::count`]; adaptive column macros are named
/// `\colAwidth` … `\colHwidth`.
pub const MAX_COLUMNS: usize = 8;

/// Builder for [`LayoutConfig`].
#[derive(Debug)]
pub struct LayoutConfigBuilder {
    config: LayoutConfig,
}

impl LayoutConfigBuilder {
    /// Start from a preset instead of the default.
    pub fn preset(mut self, preset: Preset) -> Self {
        self.config = LayoutConfig::preset(preset);
        self
    }

    pub fn flavor(mut self, flavor: TemplateFlavor) -> Self {
        self.config.flavor = flavor;
        self
    }

    pub fn beamer_scale(mut self, scale: f64) -> Self {
        self.config.beamer_scale = scale;
        self
    }

    pub fn figure_fracs(mut self, min: f64, max: f64) -> Self {
        self.config.figures.min_frac = min;
        self.config.figures.max_frac = max;
        self
    }

    pub fn enlarge_factor(mut self, factor: f64) -> Self {
        self.config.figures.enlarge_factor = factor;
        self
    }

    pub fn budget_enabled(mut self, v: bool) -> Self {
        self.config.figures.enabled = v;
        self
    }

    pub fn fonts(mut self, fonts: FontSizes) -> Self {
        self.config.fonts = fonts;
        self
    }

    pub fn logo_enabled(mut self, v: bool) -> Self {
        self.config.logo.enabled = v;
        self
    }

    pub fn logo_available(mut self, v: bool) -> Self {
        self.config.logo.available = v;
        self
    }

    pub fn column_count(mut self, n: usize) -> Self {
        self.config.columns.count = n;
        self
    }

    pub fn title_limits(mut self, first: usize, next: usize) -> Self {
        self.config.title_wrap.first_limit = first;
        self.config.title_wrap.next_limit = next;
        self
    }

    pub fn emit_captions(mut self, v: bool) -> Self {
        self.config.emit_captions = v;
        self
    }

    pub fn missing_figures(mut self, policy: MissingFigurePolicy) -> Self {
        self.config.missing_figures = policy;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<LayoutConfig, PosterError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Sub-configs ──────────────────────────────────────────────────────────

/// Figure sizing constants.
///
/// Widths are fractions of `\linewidth` inside the enclosing column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureBudget {
    /// Run the per-section budget allocator. Default: true.
    pub enabled: bool,
    /// Multiplier applied to the arranged width fraction. Default: 1.18.
    pub enlarge_factor: f64,
    /// Lower clamp for every width fraction. Default: 0.80.
    pub min_frac: f64,
    /// Upper clamp for every width fraction. Default: 0.90.
    pub max_frac: f64,
    /// Fraction used when the arranged widths are degenerate. Default: 0.6.
    pub fallback_frac: f64,
    /// Share of the panel width a figure may fill before enlarging. Default: 0.95.
    pub panel_fill: f64,
    /// Figure-height budget for a section with no text. Default: 0.58.
    pub base_ratio_limit: f64,
    /// The budget never drops below this. Default: 0.30.
    pub min_ratio_limit: f64,
    /// Largest reduction long text can apply to the budget. Default: 0.25.
    pub max_text_relief: f64,
    /// Reduction per 600 characters of section text. Default: 0.12.
    pub relief_per_600_chars: f64,
    /// Rough characters per rendered line. Default: 95.
    pub chars_per_line: usize,
    /// Panel-height share of one text line. Default: 0.015.
    pub line_height_weight: f64,
    /// Reserved for the block title and padding. Default: 0.08.
    pub safety_margin: f64,
}

impl Default for FigureBudget {
    fn default() -> Self {
        Self {
            enabled: true,
            enlarge_factor: 1.18,
            min_frac: 0.80,
            max_frac: 0.90,
            fallback_frac: 0.6,
            panel_fill: 0.95,
            base_ratio_limit: 0.58,
            min_ratio_limit: 0.30,
            max_text_relief: 0.25,
            relief_per_600_chars: 0.12,
            chars_per_line: 95,
            line_height_weight: 0.015,
            safety_margin: 0.08,
        }
    }
}

impl FigureBudget {
    /// Clamp a width fraction into `[min_frac, max_frac]`.
    pub fn clamp(&self, frac: f64) -> f64 {
        frac.max(self.min_frac).min(self.max_frac)
    }
}

/// LaTeX size commands (`\Huge`, `\large`, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    /// Title fits on one line.
    pub title_single: String,
    /// Title wraps once.
    pub title_wrap1: String,
    /// Title wraps twice or more.
    pub title_wrap2plus: String,
    pub author: String,
    pub institute: String,
    pub block_title: String,
    pub block_body: String,
    /// `None` leaves the caption font and caption skips alone.
    pub caption: Option<String>,
    pub above_caption_skip: String,
    pub below_caption_skip: String,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title_single: r"\Huge".into(),
            title_wrap1: r"\huge".into(),
            title_wrap2plus: r"\LARGE".into(),
            author: r"\Large".into(),
            institute: r"\large".into(),
            block_title: r"\Large".into(),
            block_body: r"\large".into(),
            caption: None,
            above_caption_skip: "4pt".into(),
            below_caption_skip: "3pt".into(),
        }
    }
}

impl FontSizes {
    /// The 3-tier title size policy keyed on soft line breaks.
    pub fn title_for_breaks(&self, breaks: usize) -> &str {
        match breaks {
            0 => &self.title_single,
            1 => &self.title_wrap1,
            _ => &self.title_wrap2plus,
        }
    }
}

/// Top-right logo placement (lengths in cm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoConfig {
    /// Inject the logo at all. Default: true.
    pub enabled: bool,
    /// File name relative to the `.tex`. Default: `logo.png`.
    pub filename: String,
    pub height_cm: f64,
    pub inner_sep_cm: f64,
    pub xshift_cm: f64,
    pub yshift_cm: f64,
    /// The logo file exists in the output project. The baposter flavor only
    /// replaces the header logo slot when this is set. Default: false.
    pub available: bool,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filename: "logo.png".into(),
            height_cm: 6.0,
            inner_sep_cm: 2.0,
            xshift_cm: -2.0,
            yshift_cm: 0.0,
            available: false,
        }
    }
}

/// Column layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Number of content columns. Default: 3.
    pub count: usize,
    /// Width of one separator column as a share of `\paperwidth`. Default: 0.02.
    pub sep_frac: f64,
    /// A column whose longest title reaches this many chars gets wider. Default: 38.
    pub long_title_threshold: usize,
    /// Weight added to that column (others weigh 1). Default: 0.5.
    pub heavy_boost: f64,
    /// Lower clamp for an adaptive column fraction. Default: 0.26.
    pub frac_min: f64,
    /// Upper clamp for an adaptive column fraction. Default: 0.42.
    pub frac_max: f64,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            count: 3,
            sep_frac: 0.02,
            long_title_threshold: 38,
            heavy_boost: 0.5,
            frac_min: 0.26,
            frac_max: 0.42,
        }
    }
}

/// Soft-wrap limits, in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleWrap {
    pub first_limit: usize,
    pub next_limit: usize,
    pub box_first_limit: usize,
    pub box_next_limit: usize,
}

impl Default for TitleWrap {
    fn default() -> Self {
        Self {
            first_limit: 68,
            next_limit: 72,
            box_first_limit: 28,
            box_next_limit: 32,
        }
    }
}

/// Settings for baposter templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaposterConfig {
    /// `fontscale=` in `\documentclass[...]{baposter}`. Default: 0.31.
    pub fontscale: f64,
    /// `margin=` in `\documentclass[...]{baposter}`. Default: 7mm.
    pub margin: String,
    /// `colspacing=` in the poster options. Default: 0.6em.
    pub colspacing: String,
    /// Height of the logo in the header slot. Default: 6em.
    pub logo_height: String,
    /// Column occupancy above which figures in the column shrink. Default: 0.98.
    pub max_occupancy: f64,
    /// Per-figure occupancy is its width fraction clamped to these bounds.
    pub occupancy_fig_min: f64,
    pub occupancy_fig_max: f64,
    /// Bounds of the column shrink factor.
    pub shrink_min: f64,
    pub shrink_max: f64,
    /// Rendered figure widths never go below this. Default: 0.90.
    pub figure_floor: f64,
}

impl Default for BaposterConfig {
    fn default() -> Self {
        Self {
            fontscale: 0.31,
            margin: "7mm".into(),
            colspacing: "0.6em".into(),
            logo_height: "6em".into(),
            max_occupancy: 0.98,
            occupancy_fig_min: 0.45,
            occupancy_fig_max: 0.85,
            shrink_min: 0.80,
            shrink_max: 0.97,
            figure_floor: 0.90,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Template family, and for beamer how columns are sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateFlavor {
    /// Detect from `\documentclass`: baposter, else fixed beamer columns.
    #[default]
    Auto,
    /// beamerposter with `\separatorcolumn` / `\colwidth` from the template.
    BeamerFixed,
    /// beamerposter with injected per-column widths weighted by title length.
    BeamerAdaptive,
    /// baposter `\headerbox` layout.
    Baposter,
}

impl fmt::Display for TemplateFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TemplateFlavor::Auto => "auto",
            TemplateFlavor::BeamerFixed => "beamer",
            TemplateFlavor::BeamerAdaptive => "beamer-adaptive",
            TemplateFlavor::Baposter => "baposter",
        };
        f.write_str(s)
    }
}

/// What to do with a figure whose file cannot be staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingFigurePolicy {
    /// Emit the `\includegraphics` reference anyway and warn.
    Keep,
    /// Leave the figure out and warn.
    Skip,
    /// Emit a framed box naming the missing file and warn. (default)
    #[default]
    Placeholder,
    /// Abort the build.
    Fail,
}

impl fmt::Display for MissingFigurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MissingFigurePolicy::Keep => "kept reference",
            MissingFigurePolicy::Skip => "skipped",
            MissingFigurePolicy::Placeholder => "placeholder emitted",
            MissingFigurePolicy::Fail => "build aborted",
        };
        f.write_str(s)
    }
}

/// Named parameter sets taken from the reference layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Beamer, tight figure range (0.80–0.90), budget allocator on. (default)
    #[default]
    Standard,
    /// Beamer, wider figure range (0.60–0.92), no budget, fixed `\Huge` title.
    Classic,
    /// baposter with `fontscale=0.31`, figure range 0.60–0.98.
    Baposter,
}
