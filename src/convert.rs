//! Build entry points.
//!
//! * [`render_poster`]: inputs in memory → `.tex` text. No I/O.
//! * [`plan_layout`]: the column plan and figure widths only. No I/O.
//! * [`build_poster`]: load the inputs from disk, stage figures into
//!   `<out>/figures/`, render, and write `<out>/<name>.tex` atomically.

use crate::config::{LayoutConfig, MissingFigurePolicy, TemplateFlavor};
use crate::error::{BuildWarning, PosterError};
use crate::model::{Arrangement, CaptionIndex, PosterContent, Section, SectionLayout};
use crate::output::{BuildStats, LayoutPlan, PlannedColumn, PlannedFigure, PlannedSection, PosterOutput};
use crate::pipeline::assemble::{assemble, strategy_for, ColumnPlan, TemplateStrategy};
use crate::pipeline::budget::allocate;
use crate::pipeline::input;
use crate::pipeline::mapper::map_figures;
use crate::pipeline::title::soft_wrap;
use crate::templates::builtin_template;
use figure_assets::{resolve_images_root, AssetError, AssetStager, DEFAULT_IMAGES_DIR};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default file name of the generated document.
pub const DEFAULT_TEX_NAME: &str = "poster_output.tex";

/// Default caption file looked up next to the content file.
pub const DEFAULT_CAPTIONS_NAME: &str = "figure_caption.json";

/// Everything a render needs, already parsed.
#[derive(Debug, Clone, Default)]
pub struct PosterInputs {
    pub content: PosterContent,
    pub arrangement: Arrangement,
    pub captions: CaptionIndex,
    /// Template text; empty means the built-in template for the flavor.
    pub template: String,
}

impl PosterInputs {
    pub fn new(content: PosterContent, arrangement: Arrangement) -> Self {
        Self {
            content,
            arrangement,
            ..Self::default()
        }
    }

    pub fn with_captions(mut self, captions: CaptionIndex) -> Self {
        self.captions = captions;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Read the files named by `request`.
    pub fn load(request: &BuildRequest) -> Result<Self, PosterError> {
        let content = input::load_content(&request.content_path)?;
        let arrangement = input::load_arrangement(&request.arrangement_path)?;
        let captions = input::load_captions(&request.captions_path())?;
        let template = match &request.template_path {
            Some(p) => input::read_text(p)?,
            None => String::new(),
        };
        debug!(
            "Loaded {} sections, {} panels, {} figures, {} captions",
            content.sections.len(),
            arrangement.panels.len(),
            arrangement.figure_arrangement.len(),
            captions.len()
        );
        Ok(Self {
            content,
            arrangement,
            captions,
            template,
        })
    }

    fn template_text(&self, flavor: TemplateFlavor) -> &str {
        if self.template.trim().is_empty() {
            builtin_template(flavor)
        } else {
            &self.template
        }
    }
}

/// File locations for [`build_poster`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    pub content_path: PathBuf,
    pub arrangement_path: PathBuf,
    /// Defaults to `figure_caption.json` next to the content file.
    pub captions_path: Option<PathBuf>,
    /// `None` uses the built-in template.
    pub template_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub tex_name: String,
    /// Candidate image roots; empty means `<content dir>/Paper2Poster`,
    /// then `<content dir>`.
    pub image_roots: Vec<PathBuf>,
    pub images_dir_name: String,
}

impl BuildRequest {
    pub fn new(
        content_path: impl Into<PathBuf>,
        arrangement_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            content_path: content_path.into(),
            arrangement_path: arrangement_path.into(),
            captions_path: None,
            template_path: None,
            output_dir: output_dir.into(),
            tex_name: DEFAULT_TEX_NAME.to_string(),
            image_roots: Vec::new(),
            images_dir_name: DEFAULT_IMAGES_DIR.to_string(),
        }
    }

    pub fn captions(mut self, path: impl Into<PathBuf>) -> Self {
        self.captions_path = Some(path.into());
        self
    }

    pub fn template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    pub fn tex_name(mut self, name: impl Into<String>) -> Self {
        self.tex_name = name.into();
        self
    }

    pub fn image_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.image_roots.push(root.into());
        self
    }

    pub fn images_dir_name(mut self, name: impl Into<String>) -> Self {
        self.images_dir_name = name.into();
        self
    }

    /// `<output_dir>/<tex_name>`.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.tex_name)
    }

    fn captions_path(&self) -> PathBuf {
        match &self.captions_path {
            Some(p) => p.clone(),
            None => self
                .content_path
                .with_file_name(DEFAULT_CAPTIONS_NAME),
        }
    }

    fn candidate_roots(&self) -> Vec<PathBuf> {
        if self.image_roots.is_empty() {
            input::default_image_roots(&self.content_path)
        } else {
            self.image_roots.clone()
        }
    }
}

// ── Shared preparation ───────────────────────────────────────────────────

/// Sections and figure layouts after mapping and the per-section budget.
struct Prepared {
    sections: Vec<Section>,
    layouts: Vec<SectionLayout>,
    /// `(src, width)` per section straight from the mapper.
    initial_widths: Vec<Vec<(String, f64)>>,
    strategy: Box<dyn TemplateStrategy>,
    warnings: Vec<BuildWarning>,
}

fn prepare(inputs: &PosterInputs, cfg: &LayoutConfig) -> Prepared {
    let template = inputs.template_text(cfg.flavor);
    let strategy = strategy_for(cfg.flavor, template);
    let mut warnings = Vec::new();

    // ── Step 1: Sections ─────────────────────────────────────────────────
    let sections = inputs.content.layout_sections();
    if sections.is_empty() {
        warn!("Poster content has no sections to lay out");
        warnings.push(BuildWarning::EmptySectionList);
    }

    // ── Step 2: Map figures to sections ──────────────────────────────────
    let map = map_figures(
        &sections,
        &inputs.arrangement.panels,
        &inputs.arrangement.figure_arrangement,
        &inputs.captions,
        &cfg.figures,
    );
    for (panel_id, panel_name) in &map.unmapped_panels {
        warn!("Panel '{}' ('{}') matches no section", panel_id, panel_name);
        warnings.push(BuildWarning::UnmappedPanel {
            panel_id: panel_id.clone(),
            panel_name: panel_name.clone(),
        });
    }
    for title in &map.duplicate_titles {
        warn!("Duplicate section title '{}'", title);
        warnings.push(BuildWarning::DuplicateSectionTitle { title: title.clone() });
    }
    info!(
        "Mapped {} figures onto {} sections ({} dropped)",
        map.figure_count(),
        sections.len(),
        map.dropped_figures
    );

    let initial_widths = map
        .sections
        .iter()
        .map(|l| l.figures.iter().map(|f| (f.src.clone(), f.width_frac)).collect())
        .collect();

    // ── Step 3: Per-section figure budget ────────────────────────────────
    let mut layouts = map.sections;
    if cfg.figures.enabled {
        for (section, layout) in sections.iter().zip(layouts.iter_mut()) {
            let outcome = allocate(&section.content, layout, &cfg.figures);
            if let Some(scale) = outcome.scale {
                debug!("Section '{}' figures scaled by {:.3}", section.title, scale);
            }
        }
    }

    Prepared {
        sections,
        layouts,
        initial_widths,
        strategy,
        warnings,
    }
}

fn count_shrunk(initial: &[Vec<(String, f64)>], layouts: &[SectionLayout]) -> usize {
    layouts
        .iter()
        .zip(initial)
        .map(|(layout, before)| {
            layout
                .figures
                .iter()
                .filter(|f| {
                    before
                        .iter()
                        .any(|(src, w)| *src == f.src && f.width_frac < *w - 1e-12)
                })
                .count()
        })
        .sum()
}

fn layout_plan(
    prepared: &Prepared,
    plan: &ColumnPlan,
    title: String,
    warnings: Vec<BuildWarning>,
) -> LayoutPlan {
    let columns = plan
        .columns
        .iter()
        .enumerate()
        .map(|(c, idxs)| PlannedColumn {
            width: plan.widths.as_ref().and_then(|w| w.columns.get(c).copied()),
            pin_bottom: plan.pin_bottom.get(c).copied().unwrap_or(false),
            sections: idxs
                .iter()
                .filter_map(|&i| {
                    let section = prepared.sections.get(i)?;
                    let layout = prepared.layouts.get(i)?;
                    Some(PlannedSection {
                        title: section.title.clone(),
                        chars: section.content.trim().chars().count(),
                        figures: layout
                            .figures
                            .iter()
                            .map(|f| PlannedFigure {
                                src: f.src.clone(),
                                width_frac: f.width_frac,
                                missing: f.missing,
                            })
                            .collect(),
                    })
                })
                .collect(),
        })
        .collect();
    LayoutPlan {
        flavor: prepared.strategy.flavor(),
        title,
        columns,
        warnings,
    }
}

/// Counts the staging step reports into the stats.
#[derive(Debug, Clone, Copy, Default)]
struct StagingCounts {
    copied: usize,
    missing: usize,
}

fn finish(
    mut prepared: Prepared,
    inputs: &PosterInputs,
    cfg: &LayoutConfig,
    staging: StagingCounts,
    start: Instant,
) -> Result<PosterOutput, PosterError> {
    let template = inputs.template_text(cfg.flavor);
    let assembled = assemble(
        template,
        &inputs.content.meta,
        &prepared.sections,
        &mut prepared.layouts,
        prepared.strategy.as_ref(),
        cfg,
    )?;

    let mut warnings = std::mem::take(&mut prepared.warnings);
    warnings.extend(assembled.warnings.iter().cloned());

    let figures_placed = prepared
        .layouts
        .iter()
        .flat_map(|l| &l.figures)
        .filter(|f| !f.missing)
        .count();

    let stats = BuildStats {
        flavor: assembled.flavor,
        sections: prepared.sections.len(),
        columns: assembled.plan.columns.iter().map(Vec::len).collect(),
        figures_placed,
        figures_missing: staging.missing,
        figures_shrunk: count_shrunk(&prepared.initial_widths, &prepared.layouts),
        figures_copied: staging.copied,
        title_lines: assembled.title_lines,
        title_size: assembled.title_size.clone(),
        tex_bytes: assembled.tex.len(),
        output_path: None,
        total_duration_ms: elapsed_ms(start),
    };
    let plan = layout_plan(&prepared, &assembled.plan, assembled.wrapped_title, warnings.clone());

    Ok(PosterOutput {
        tex: assembled.tex,
        plan,
        stats,
        warnings,
    })
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Render a poster from in-memory inputs.
///
/// Figure files are not touched: every mapped figure is referenced as
/// `figures/<basename>` whether or not it exists.
///
/// # Errors
/// [`PosterError::InvalidConfig`] for a config that fails validation and
/// [`PosterError::MissingAnchor`] for a template without its columns or
/// poster region. Everything else is reported through
/// [`PosterOutput::warnings`].
pub fn render_poster(inputs: &PosterInputs, cfg: &LayoutConfig) -> Result<PosterOutput, PosterError> {
    let start = Instant::now();
    cfg.validate()?;
    let prepared = prepare(inputs, cfg);
    finish(prepared, inputs, cfg, StagingCounts::default(), start)
}

/// Compute the column plan and figure widths without producing LaTeX.
pub fn plan_layout(inputs: &PosterInputs, cfg: &LayoutConfig) -> Result<LayoutPlan, PosterError> {
    cfg.validate()?;
    let mut prepared = prepare(inputs, cfg);
    let plan = prepared
        .strategy
        .plan_columns(&prepared.sections, &mut prepared.layouts, cfg);
    let title = soft_wrap(
        inputs.content.meta.poster_title.trim(),
        cfg.title_wrap.first_limit,
        cfg.title_wrap.next_limit,
    );
    let warnings = prepared.warnings.clone();
    Ok(layout_plan(&prepared, &plan, title, warnings))
}

/// Load inputs from disk, stage figures, render and write the `.tex`.
///
/// The document is written through a temporary file in the output
/// directory and then renamed, so a failed build never leaves a partial
/// `.tex` behind. Figure copies are not rolled back.
pub fn build_poster(request: &BuildRequest, cfg: &LayoutConfig) -> Result<PosterOutput, PosterError> {
    let start = Instant::now();
    info!("Starting poster build: {}", request.content_path.display());
    cfg.validate()?;

    // ── Step 1: Load inputs ──────────────────────────────────────────────
    let inputs = PosterInputs::load(request)?;

    // ── Step 2: Logo availability ────────────────────────────────────────
    let mut cfg = cfg.clone();
    if !cfg.logo.filename.is_empty() && request.output_dir.join(&cfg.logo.filename).is_file() {
        cfg.logo.available = true;
    }

    // ── Step 3: Map and budget ───────────────────────────────────────────
    let mut prepared = prepare(&inputs, &cfg);

    // ── Step 4: Stage figures ────────────────────────────────────────────
    let samples: Vec<&str> = inputs
        .arrangement
        .figure_arrangement
        .iter()
        .map(|f| f.figure_path.as_str())
        .collect();
    let roots = request.candidate_roots();
    let root = resolve_images_root(&roots, &samples).unwrap_or_else(|| PathBuf::from("."));
    info!("Images root: {}", root.display());
    let stager = AssetStager::new(root, request.images_dir_name.clone(), request.output_dir.clone());
    let staging = stage_figures(
        &mut prepared.layouts,
        &stager,
        cfg.missing_figures,
        &mut prepared.warnings,
    )?;
    info!(
        "Staged figures: {} copied, {} missing",
        staging.copied, staging.missing
    );

    // ── Step 5: Assemble ─────────────────────────────────────────────────
    let mut output = finish(prepared, &inputs, &cfg, staging, start)?;

    // ── Step 6: Write ────────────────────────────────────────────────────
    let path = request.output_path();
    write_atomic(&path, &output.tex)?;
    output.stats.output_path = Some(path.clone());
    output.stats.total_duration_ms = elapsed_ms(start);

    info!(
        "Poster written to {} ({} bytes, {} warnings, {}ms)",
        path.display(),
        output.stats.tex_bytes,
        output.warnings.len(),
        output.stats.total_duration_ms
    );
    Ok(output)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Copy every figure into the project, applying the missing-figure policy
/// to the ones that cannot be staged.
fn stage_figures(
    layouts: &mut [SectionLayout],
    stager: &AssetStager,
    policy: MissingFigurePolicy,
    warnings: &mut Vec<BuildWarning>,
) -> Result<StagingCounts, PosterError> {
    let mut counts = StagingCounts::default();
    for layout in layouts.iter_mut() {
        let mut kept = Vec::with_capacity(layout.figures.len());
        for mut fig in std::mem::take(&mut layout.figures) {
            let err = match stager.stage(&fig.src) {
                Ok(staged) => {
                    if staged.copied {
                        counts.copied += 1;
                    }
                    kept.push(fig);
                    continue;
                }
                Err(err) => err,
            };

            let reason = err.to_string();
            match policy {
                MissingFigurePolicy::Fail => {
                    return Err(match err {
                        AssetError::SourceNotFound { .. } => PosterError::MissingFigure {
                            figure: fig.src,
                            reason,
                        },
                        other => PosterError::AssetStaging {
                            figure: fig.src,
                            source: other,
                        },
                    });
                }
                MissingFigurePolicy::Keep => {}
                MissingFigurePolicy::Skip => counts.missing += 1,
                MissingFigurePolicy::Placeholder => {
                    counts.missing += 1;
                    fig.missing = true;
                }
            }
            warn!("Figure '{}': {} ({})", fig.src, reason, policy);
            warnings.push(BuildWarning::FigureAssetMissing {
                figure: fig.src.clone(),
                reason,
                action: policy.to_string(),
            });
            if policy != MissingFigurePolicy::Skip {
                kept.push(fig);
            }
        }
        layout.figures = kept;
    }
    Ok(counts)
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Write `contents` to `path` via a temporary file in the same directory.
fn write_atomic(path: &Path, contents: &str) -> Result<(), PosterError> {
    let write_err = |source: std::io::Error| PosterError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Figure, Meta, Panel};
    use tempfile::TempDir;

    fn inputs() -> PosterInputs {
        let content = PosterContent {
            meta: Meta {
                poster_title: "A Poster".into(),
                authors: "Someone".into(),
                affiliations: String::new(),
            },
            sections: vec![
                Section::new("Poster Title & Author", "ignored"),
                Section::new("Intro", "Hello."),
                Section::new("Method", "We do things."),
            ],
        };
        let arrangement = Arrangement {
            panels: vec![
                Panel {
                    panel_id: "p1".into(),
                    section_name: "Intro".into(),
                    width: 10.0,
                    height: 10.0,
                },
                Panel {
                    panel_id: "p2".into(),
                    section_name: "Method".into(),
                    width: 10.0,
                    height: 40.0,
                },
                Panel {
                    panel_id: "p9".into(),
                    section_name: "Appendix".into(),
                    width: 10.0,
                    height: 10.0,
                },
            ],
            figure_arrangement: vec![Figure {
                panel_id: "p2".into(),
                figure_path: "imgs/arch.png".into(),
                width: 10.0,
                height: 5.0,
                y: 0.0,
            }],
        };
        PosterInputs::new(content, arrangement)
    }

    #[test]
    fn render_reports_warnings_and_stats() {
        let out = render_poster(&inputs(), &LayoutConfig::default()).unwrap();
        assert_eq!(out.stats.sections, 2);
        assert_eq!(out.stats.figures_placed, 1);
        assert_eq!(out.stats.flavor, TemplateFlavor::BeamerFixed);
        assert_eq!(out.stats.columns, vec![1, 1, 0]);
        assert!(out.warnings.contains(&BuildWarning::UnmappedPanel {
            panel_id: "p9".into(),
            panel_name: "Appendix".into(),
        }));
        assert!(!out.tex.contains("ignored"));
        assert_eq!(out.plan.figure_count(), 1);
    }

    #[test]
    fn plan_matches_render() {
        let cfg = LayoutConfig::default();
        let plan = plan_layout(&inputs(), &cfg).unwrap();
        let out = render_poster(&inputs(), &cfg).unwrap();
        assert_eq!(plan, out.plan);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = LayoutConfig::default();
        cfg.columns.count = 0;
        assert!(matches!(
            render_poster(&inputs(), &cfg),
            Err(PosterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn inverted_baposter_bounds_are_rejected() {
        let mut cfg = LayoutConfig::preset(crate::config::Preset::Baposter);
        cfg.baposter.occupancy_fig_min = 0.9;
        cfg.baposter.occupancy_fig_max = 0.5;
        let inputs = inputs().with_template(crate::templates::BAPOSTER_TEMPLATE);
        assert!(matches!(
            render_poster(&inputs, &cfg),
            Err(PosterError::InvalidConfig(_))
        ));
        assert!(matches!(
            plan_layout(&inputs, &cfg),
            Err(PosterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_content_warns() {
        let out = render_poster(&PosterInputs::default(), &LayoutConfig::default()).unwrap();
        assert!(out.warnings.contains(&BuildWarning::EmptySectionList));
        assert_eq!(out.stats.sections, 0);
    }

    #[test]
    fn atomic_write_creates_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/out/poster.tex");
        write_atomic(&path, "hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn request_defaults() {
        let req = BuildRequest::new("run/poster_content.json", "run/arrangement.json", "out");
        assert_eq!(req.output_path(), PathBuf::from("out/poster_output.tex"));
        assert_eq!(req.captions_path(), PathBuf::from("run/figure_caption.json"));
        assert_eq!(req.candidate_roots()[0], PathBuf::from("run/Paper2Poster"));
        let req = req.image_root("imgs").tex_name("p.tex");
        assert_eq!(req.candidate_roots(), vec![PathBuf::from("imgs")]);
        assert_eq!(req.output_path(), PathBuf::from("out/p.tex"));
    }
}
