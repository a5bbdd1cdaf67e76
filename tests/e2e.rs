//! End-to-end tests for posterbuilder.
//!
//! Everything runs against in-memory inputs or a scratch `TempDir`; no TeX
//! engine is invoked. The balance check stands in for "it compiles".
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use posterbuilder::pipeline::region::check_balance;
use posterbuilder::templates::{BAPOSTER_TEMPLATE, BEAMER_TEMPLATE};
use posterbuilder::{
    build_poster, plan_layout, render_poster, BuildRequest, BuildWarning, LayoutConfig,
    MissingFigurePolicy, PosterError, PosterInputs, Preset, TemplateFlavor,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

const CONTENT_JSON: &str = r#"{
  "meta": {
    "poster_title": "Tiny Posters: Layout by Numbers",
    "authors": "Ada Lovelace & Alan Turing",
    "affiliations": "Analytical Engines Ltd."
  },
  "sections": [
    {"title": "Poster Title & Author", "content": "not laid out"},
    {"title": "Intro", "content": "We study 50% of the problem with $x_i^2$ and \\alpha."},
    {"title": "Method", "content": "- collect data\n- fit model\n- report"}
  ]
}"#;

const ARRANGEMENT_JSON: &str = r#"{
  "panel_arrangement": [
    {"panel_id": "p1", "panel_name": "Intro", "width": 40.0, "height": 30.0},
    {"panel_id": "p2", "panel_name": "Method", "width": 40.0, "height": 60.0}
  ],
  "figure_arrangement": [
    {"panel_id": "p2", "figure_path": "figs/method_overview.png", "width": 40.0, "height": 20.0, "y": 12.0}
  ]
}"#;

const CAPTIONS_JSON: &str = r#"{
  "fig1": {"image_path": "figs/method_overview.png", "caption": "Figure 1: Overview of the method"}
}"#;

fn two_section_inputs() -> PosterInputs {
    PosterInputs::new(
        serde_json::from_str(CONTENT_JSON).unwrap(),
        serde_json::from_str(ARRANGEMENT_JSON).unwrap(),
    )
    .with_template(BEAMER_TEMPLATE)
}

/// Write the three JSON inputs into `dir` and return the request.
fn write_run(dir: &Path, with_figure: bool) -> BuildRequest {
    std::fs::write(dir.join("poster_content.json"), CONTENT_JSON).unwrap();
    std::fs::write(dir.join("arrangement.json"), ARRANGEMENT_JSON).unwrap();
    std::fs::write(dir.join("figure_caption.json"), CAPTIONS_JSON).unwrap();
    if with_figure {
        let figs = dir.join("images").join("figs");
        std::fs::create_dir_all(&figs).unwrap();
        std::fs::write(figs.join("method_overview.png"), b"\x89PNG fake").unwrap();
    }
    BuildRequest::new(
        dir.join("poster_content.json"),
        dir.join("arrangement.json"),
        dir.join("latex_proj"),
    )
    .image_root(dir)
    .images_dir_name("images")
}

fn includegraphics_widths(tex: &str) -> Vec<f64> {
    tex.match_indices(r"\includegraphics[width=")
        .map(|(i, m)| {
            let rest = &tex[i + m.len()..];
            let end = rest.find(r"\linewidth").unwrap();
            rest[..end].parse::<f64>().unwrap()
        })
        .collect()
}

// ── In-memory renders ────────────────────────────────────────────────────────

#[test]
fn test_two_section_beamer_poster() {
    let cfg = LayoutConfig::default();
    let out = render_poster(&two_section_inputs(), &cfg).unwrap();
    let tex = &out.tex;

    // (a) both sections as block headers, in column order
    let intro = tex.find(r"\begin{block}{Intro}").expect("Intro block");
    let method = tex.find(r"\begin{block}{Method}").expect("Method block");
    assert!(intro < method);
    assert!(!tex.contains("not laid out"));

    // (b) exactly one figure, within the configured maximum
    let widths = includegraphics_widths(tex);
    assert_eq!(widths.len(), 1, "tex:\n{tex}");
    assert!(widths[0] <= cfg.figures.max_frac + 1e-9);
    assert!(widths[0] >= cfg.figures.min_frac - 1e-9);
    assert!(tex.contains("{figures/method_overview.png}"));

    // (c) balanced braces and environments
    assert_eq!(check_balance(tex), Ok(()));
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);

    // Sanitizer ran: escaped percent, math untouched, list rendered
    assert!(tex.contains(r"50\%"));
    assert!(tex.contains("$x_i^2$"));
    assert!(tex.contains(r"$\alpha$"));
    assert!(tex.contains(r"\item collect data"));
    assert!(tex.contains(r"\author{Ada Lovelace \& Alan Turing}"));
}

#[test]
fn test_title_wraps_and_picks_size() {
    let mut inputs = two_section_inputs();
    inputs.content.meta.poster_title =
        "Tiny Posters: Layout by Numbers, Budgets, Columns and Other Things That Fit".into();
    let out = render_poster(&inputs, &LayoutConfig::default()).unwrap();
    assert_eq!(out.stats.title_lines, 2);
    assert_eq!(out.stats.title_size, r"\huge");
    assert!(out.tex.contains(r"\title{Tiny Posters: \\ Layout by Numbers"));
    assert!(out.tex.contains(r"\setbeamerfont{title}{size=\huge}"));
}

#[test]
fn test_captions_are_cleaned() {
    let captions = serde_json::from_str::<serde_json::Value>(CAPTIONS_JSON).unwrap();
    let inputs = two_section_inputs().with_captions(posterbuilder::CaptionIndex::from_json(&captions));
    let out = render_poster(&inputs, &LayoutConfig::default()).unwrap();
    assert!(out.tex.contains(r"\caption{Overview of the method}"));
}

#[test]
fn test_column_order_preserved_across_many_sections() {
    let mut inputs = two_section_inputs();
    inputs.content.sections = (0..7)
        .map(|i| posterbuilder::Section::new(format!("Part {i}"), format!("text {i}")))
        .collect();
    let out = render_poster(&inputs, &LayoutConfig::default()).unwrap();
    assert_eq!(out.stats.columns, vec![3, 2, 2]);

    let mut last = 0;
    for i in 0..7 {
        let pos = out.tex.find(&format!(r"\begin{{block}}{{Part {i}}}")).unwrap();
        assert!(pos > last, "Part {i} out of order");
        last = pos;
    }
    assert_eq!(check_balance(&out.tex), Ok(()));
}

#[test]
fn test_adaptive_columns_fill_the_page() {
    let mut inputs = two_section_inputs();
    inputs.content.sections.push(posterbuilder::Section::new(
        "Experiments on Very Large Collections of Posters",
        "Lots of results.",
    ));
    let cfg = LayoutConfig::builder()
        .flavor(TemplateFlavor::BeamerAdaptive)
        .build()
        .unwrap();

    let plan = plan_layout(&inputs, &cfg).unwrap();
    let widths: Vec<f64> = plan.columns.iter().map(|c| c.width.unwrap()).collect();
    let sep = cfg.columns.sep_frac * (widths.len() + 1) as f64;
    assert!((widths.iter().sum::<f64>() + sep - 1.0).abs() < 1e-9);
    assert!(widths[2] > widths[0]);

    let out = render_poster(&inputs, &cfg).unwrap();
    assert!(out.tex.contains(r"\begin{column}{\colCwidth}"));
    assert!(out.tex.contains(r"\ifdefined\colCwidth\else\newlength{\colCwidth}\fi"));
    assert_eq!(check_balance(&out.tex), Ok(()));
}

#[test]
fn test_baposter_poster() {
    let inputs = two_section_inputs().with_template(BAPOSTER_TEMPLATE);
    let cfg = LayoutConfig::preset(Preset::Baposter);
    let out = render_poster(&inputs, &cfg).unwrap();
    let tex = &out.tex;

    assert_eq!(out.stats.flavor, TemplateFlavor::Baposter);
    assert!(tex.contains(r"\headerbox{Intro}{name=intro,column=0,row=0,span=1"));
    assert!(tex.contains(r"\headerbox{Method}{name=method,column=1,row=0,span=1"));
    assert!(tex.contains(r"\setlength{\itemsep}{2pt}"));
    assert!(tex.contains(r"\textsc{Tiny Posters: Layout by Numbers}"));
    assert!(tex.contains(r"\graphicspath{{figures/}}"));
    let widths = includegraphics_widths(tex);
    assert_eq!(widths.len(), 1);
    assert!(widths[0] >= cfg.baposter.figure_floor && widths[0] <= cfg.figures.max_frac);
    assert_eq!(check_balance(tex), Ok(()));
}

#[test]
fn test_auto_flavor_follows_documentclass() {
    let inputs = two_section_inputs().with_template(BAPOSTER_TEMPLATE);
    let plan = plan_layout(&inputs, &LayoutConfig::default()).unwrap();
    assert_eq!(plan.flavor, TemplateFlavor::Baposter);
}

#[test]
fn test_missing_anchor_is_fatal() {
    let beamer = two_section_inputs().with_template("\\documentclass{beamer}\n\\begin{document}\n\\end{document}\n");
    let err = render_poster(&beamer, &LayoutConfig::default()).unwrap_err();
    assert!(matches!(err, PosterError::MissingAnchor { .. }), "{err}");

    let baposter = two_section_inputs()
        .with_template("\\documentclass{baposter}\n\\begin{document}\n\\end{document}\n");
    let err = render_poster(&baposter, &LayoutConfig::default()).unwrap_err();
    assert!(matches!(err, PosterError::MissingAnchor { .. }), "{err}");
}

// ── File-based builds ────────────────────────────────────────────────────────

#[test]
fn test_build_poster_writes_project() {
    let tmp = TempDir::new().unwrap();
    let request = write_run(tmp.path(), true);
    let out = build_poster(&request, &LayoutConfig::default()).unwrap();

    let tex_path = tmp.path().join("latex_proj/poster_output.tex");
    assert_eq!(out.stats.output_path.as_deref(), Some(tex_path.as_path()));
    let written = std::fs::read_to_string(&tex_path).unwrap();
    assert_eq!(written, out.tex);
    assert!(tmp.path().join("latex_proj/figures/method_overview.png").is_file());
    assert_eq!(out.stats.figures_copied, 1);
    assert_eq!(out.stats.figures_missing, 0);
    assert!(written.contains(r"\caption{Overview of the method}"));
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);

    // Second build: destination is fresh, nothing copied.
    let again = build_poster(&request, &LayoutConfig::default()).unwrap();
    assert_eq!(again.stats.figures_copied, 0);
}

#[test]
fn test_missing_figure_policies() {
    let run = |policy: MissingFigurePolicy| {
        let tmp = TempDir::new().unwrap();
        let request = write_run(tmp.path(), false);
        let cfg = LayoutConfig::builder().missing_figures(policy).build().unwrap();
        (build_poster(&request, &cfg), tmp)
    };

    let (out, _tmp) = run(MissingFigurePolicy::Placeholder);
    let out = out.unwrap();
    assert!(out.tex.contains(r"Missing figure: \texttt{method\_overview.png}"));
    assert!(!out.tex.contains(r"\includegraphics[width="));
    assert_eq!(out.stats.figures_missing, 1);
    assert!(matches!(
        out.warnings.as_slice(),
        [BuildWarning::FigureAssetMissing { action, .. }] if action == "placeholder emitted"
    ));

    let (out, _tmp) = run(MissingFigurePolicy::Skip);
    let out = out.unwrap();
    assert!(!out.tex.contains("method_overview"));
    assert!(!out.tex.contains(r"\begin{figure}"));

    let (out, _tmp) = run(MissingFigurePolicy::Keep);
    let out = out.unwrap();
    assert_eq!(includegraphics_widths(&out.tex).len(), 1);
    assert_eq!(out.warnings.len(), 1);

    let (out, tmp) = run(MissingFigurePolicy::Fail);
    assert!(matches!(out, Err(PosterError::MissingFigure { .. })));
    assert!(!tmp.path().join("latex_proj/poster_output.tex").exists());
}

#[test]
fn test_missing_input_file() {
    let tmp = TempDir::new().unwrap();
    let request = BuildRequest::new(
        tmp.path().join("nope.json"),
        tmp.path().join("arrangement.json"),
        tmp.path().join("out"),
    );
    let err = build_poster(&request, &LayoutConfig::default()).unwrap_err();
    match err {
        PosterError::FileNotFound { path } => assert_eq!(path, PathBuf::from(tmp.path().join("nope.json"))),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_logo_in_output_dir_enables_baposter_logo() {
    let tmp = TempDir::new().unwrap();
    let request = write_run(tmp.path(), true);
    std::fs::create_dir_all(&request.output_dir).unwrap();
    std::fs::write(request.output_dir.join("logo.png"), b"logo").unwrap();

    let cfg = LayoutConfig::preset(Preset::Baposter);
    let out = build_poster(&request, &cfg).unwrap();
    assert!(out.tex.contains(r"{\includegraphics[height=6em]{logo.png}}"));
}
