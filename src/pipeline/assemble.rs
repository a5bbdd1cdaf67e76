//! Document assembler: fill a template with the laid-out sections.
//!
//! The three template families differ only in how they rewrite the header
//! and where the section bodies go. That variation sits behind
//! [`TemplateStrategy`]; sanitizing, figure mapping and budgeting are shared.
//!
//! ## Assembly steps
//!
//! 1. Header: title, authors, affiliations, package options, fonts, logo
//! 2. Column plan: which sections go in which column (and, for baposter, the
//!    per-column occupancy pass, which may shrink figures)
//! 3. Placement: rewrite the columns / poster region with the sections
//! 4. Final cleanup of doubled escapes
//! 5. Brace and environment balance check (a failure is a warning)

use crate::config::{LayoutConfig, LogoConfig, TemplateFlavor};
use crate::error::{BuildWarning, PosterError};
use crate::model::{normalize_title, LayoutFigure, Meta, Section, SectionLayout};
use crate::pipeline::budget::rebalance_columns;
use crate::pipeline::columns::{column_fractions, distribute, ColumnWidths};
use crate::pipeline::region::{
    begin_token_with_options, check_balance, document_class, find_balanced_environment,
    insert_before_document, poster_args, replace_command_arg, set_documentclass_option,
    set_package_option, set_poster_option,
};
use crate::pipeline::sanitize::{escape_text, format_body, ListStyle};
use crate::pipeline::title::{line_breaks, soft_wrap, soft_wrap_box};
use figure_assets::{basename, tex_relative_path};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

// ── Strategy interface ───────────────────────────────────────────────────

/// Which sections go into which column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnPlan {
    /// Section indices per column, in input order.
    pub columns: Vec<Vec<usize>>,
    /// Column widths, for strategies that size columns themselves.
    pub widths: Option<ColumnWidths>,
    /// Per column: anchor the last box to the bottom edge.
    pub pin_bottom: Vec<bool>,
}

/// The template after the header rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderInfo {
    pub tex: String,
    /// Poster title after soft-wrapping, unescaped.
    pub wrapped_title: String,
    pub title_size: String,
    pub title_lines: usize,
}

/// One template family.
pub trait TemplateStrategy {
    fn flavor(&self) -> TemplateFlavor;

    /// Rewrite title, authors, options and fonts.
    fn apply_header(&self, tex: &str, meta: &Meta, cfg: &LayoutConfig) -> HeaderInfo;

    /// Split sections into columns. May shrink figures in `layouts`.
    fn plan_columns(
        &self,
        sections: &[Section],
        _layouts: &mut [SectionLayout],
        cfg: &LayoutConfig,
    ) -> ColumnPlan {
        let columns = distribute(&(0..sections.len()).collect::<Vec<_>>(), cfg.columns.count);
        let pin_bottom = vec![false; columns.len()];
        ColumnPlan {
            columns,
            widths: None,
            pin_bottom,
        }
    }

    /// Write the sections into the template body.
    fn place_sections(
        &self,
        tex: &str,
        sections: &[Section],
        layouts: &[SectionLayout],
        plan: &ColumnPlan,
        cfg: &LayoutConfig,
    ) -> Result<String, PosterError>;
}

/// Resolve [`TemplateFlavor::Auto`] from the template's `\documentclass`.
pub fn resolve_flavor(flavor: TemplateFlavor, tex: &str) -> TemplateFlavor {
    match flavor {
        TemplateFlavor::Auto if document_class(tex) == Some("baposter") => TemplateFlavor::Baposter,
        TemplateFlavor::Auto => TemplateFlavor::BeamerFixed,
        other => other,
    }
}

/// The strategy for a flavor; `Auto` is resolved against `tex`.
pub fn strategy_for(flavor: TemplateFlavor, tex: &str) -> Box<dyn TemplateStrategy> {
    match resolve_flavor(flavor, tex) {
        TemplateFlavor::Baposter => Box::new(Baposter),
        TemplateFlavor::BeamerAdaptive => Box::new(BeamerAdaptive),
        TemplateFlavor::Auto | TemplateFlavor::BeamerFixed => Box::new(BeamerFixed),
    }
}

// ── Assembly ─────────────────────────────────────────────────────────────

/// A finished document plus the decisions that produced it.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub tex: String,
    pub flavor: TemplateFlavor,
    pub wrapped_title: String,
    pub title_size: String,
    pub title_lines: usize,
    pub plan: ColumnPlan,
    pub warnings: Vec<BuildWarning>,
}

/// Run the assembly steps over `template`.
///
/// `layouts` must have one entry per section; strategies that rebalance
/// columns update the widths in place.
pub fn assemble(
    template: &str,
    meta: &Meta,
    sections: &[Section],
    layouts: &mut [SectionLayout],
    strategy: &dyn TemplateStrategy,
    cfg: &LayoutConfig,
) -> Result<Assembled, PosterError> {
    let flavor = strategy.flavor();
    info!("Assembling {} sections ({} template)", sections.len(), flavor);

    let header = strategy.apply_header(template, meta, cfg);
    debug!(
        "Title wrapped to {} line(s), size {}",
        header.title_lines, header.title_size
    );

    let plan = strategy.plan_columns(sections, layouts, cfg);
    let placed = strategy.place_sections(&header.tex, sections, layouts, &plan, cfg)?;
    let tex = final_cleanup(&placed);

    let mut warnings = Vec::new();
    if let Err(issue) = check_balance(&tex) {
        warn!("Assembled document failed the balance check: {}", issue);
        warnings.push(BuildWarning::UnbalancedOutput {
            detail: issue.to_string(),
        });
    }

    Ok(Assembled {
        tex,
        flavor,
        wrapped_title: header.wrapped_title,
        title_size: header.title_size,
        title_lines: header.title_lines,
        plan,
        warnings,
    })
}

static RE_TAB_BEFORE_DOLLAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[^\\])\\t\$").unwrap());

/// Collapse doubled escapes left by the JSON round-trip and drop a stray
/// `\t` in front of `$`.
///
/// `\\{` and `\\}` become `\{` and `\}` only when they open and close the
/// same group, so a line break at the end of a group (`\textbf{a\\}`) keeps
/// its closing brace.
pub fn final_cleanup(tex: &str) -> String {
    let s = collapse_doubled_braces(tex).replace(r"\\\\", r"\\");
    RE_TAB_BEFORE_DOLLAR.replace_all(&s, "${1}$$").into_owned()
}

/// Byte offsets of the first backslash of every `\\{ … \\}` pair.
fn doubled_brace_pairs(tex: &str) -> Vec<usize> {
    let bytes = tex.as_bytes();
    let mut stack: Vec<Option<usize>> = Vec::new();
    let mut cuts = Vec::new();
    let mut run = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\\' => {
                run += 1;
                continue;
            }
            b'{' | b'}' if run % 2 == 0 => {
                let doubled = (run == 2).then(|| i - 2);
                if b == b'{' {
                    stack.push(doubled);
                } else if let Some(open) = stack.pop() {
                    if let (Some(o), Some(c)) = (open, doubled) {
                        cuts.push(o);
                        cuts.push(c);
                    }
                }
            }
            _ => {}
        }
        run = 0;
    }
    cuts.sort_unstable();
    cuts
}

fn collapse_doubled_braces(tex: &str) -> String {
    let cuts = doubled_brace_pairs(tex);
    if cuts.is_empty() {
        return tex.to_string();
    }
    let mut out = String::with_capacity(tex.len());
    let mut last = 0;
    for at in cuts {
        out.push_str(&tex[last..at]);
        last = at + 1;
    }
    out.push_str(&tex[last..]);
    out
}

// ── Shared pieces ────────────────────────────────────────────────────────

fn wrapped_title(meta: &Meta, cfg: &LayoutConfig) -> (String, String, usize) {
    let wrapped = soft_wrap(
        meta.poster_title.trim(),
        cfg.title_wrap.first_limit,
        cfg.title_wrap.next_limit,
    );
    let breaks = line_breaks(&wrapped);
    let size = cfg.fonts.title_for_breaks(breaks).to_string();
    (wrapped, size, breaks + 1)
}

/// `\fbox` standing in for a figure whose file is missing.
fn placeholder(fig: &LayoutFigure, width: f64) -> String {
    format!(
        "\\fbox{{\\parbox{{{:.2}\\linewidth}}{{\\centering\\small Missing figure: \\texttt{{{}}}}}}}",
        width,
        escape_text(basename(&fig.src))
    )
}

// ── Beamer ───────────────────────────────────────────────────────────────

const COLUMNS_ANCHOR: &str = r"\begin{columns} region after \begin{document}";

fn beamer_header(tex: &str, meta: &Meta, cfg: &LayoutConfig) -> HeaderInfo {
    let (wrapped, size, lines) = wrapped_title(meta, cfg);

    let mut tex = replace_command_arg(tex, "title", &format!("\\title{{{}}}", escape_text(&wrapped)));
    tex = replace_command_arg(&tex, "author", &format!("\\author{{{}}}", escape_text(meta.authors.trim())));
    tex = replace_command_arg(
        &tex,
        "institute",
        &format!("\\institute[shortinst]{{{}}}", escape_text(meta.affiliations.trim())),
    );
    tex = set_package_option(&tex, "beamerposter", "scale", &cfg.beamer_scale.to_string());
    tex = insert_before_document(&tex, &font_directives(cfg, &size));
    tex = inject_logo(&tex, &cfg.logo);

    HeaderInfo {
        tex,
        wrapped_title: wrapped,
        title_size: size,
        title_lines: lines,
    }
}

fn font_directives(cfg: &LayoutConfig, title_size: &str) -> String {
    let f = &cfg.fonts;
    let mut s = String::from("\n% poster font sizes\n");
    s.push_str(&format!("\\setbeamerfont{{title}}{{size={title_size}}}\n"));
    s.push_str(&format!("\\setbeamerfont{{author}}{{size={}}}\n", f.author));
    s.push_str(&format!("\\setbeamerfont{{institute}}{{size={}}}\n", f.institute));
    s.push_str(&format!("\\setbeamerfont{{block title}}{{size={}}}\n", f.block_title));
    s.push_str(&format!("\\setbeamerfont{{block body}}{{size={}}}\n", f.block_body));
    if let Some(caption) = &f.caption {
        s.push_str(&format!("\\setbeamerfont{{caption}}{{size={caption}}}\n"));
        s.push_str(&format!("\\setlength{{\\abovecaptionskip}}{{{}}}\n", f.above_caption_skip));
        s.push_str(&format!("\\setlength{{\\belowcaptionskip}}{{{}}}\n", f.below_caption_skip));
    }
    s.push('\n');
    s
}

/// Put the logo node into the headline tikzpicture, or add one.
fn inject_logo(tex: &str, logo: &LogoConfig) -> String {
    if !logo.enabled || logo.filename.is_empty() || tex.contains(&logo.filename) {
        return tex.to_string();
    }
    let node = format!(
        "\\node[anchor=north east, inner sep={}cm] at ([xshift={}cm,yshift={}cm]current page.north east) {{\\includegraphics[height={}cm]{{{}}}}};",
        logo.inner_sep_cm, logo.xshift_cm, logo.yshift_cm, logo.height_cm, logo.filename
    );

    let doc = tex.find(r"\begin{document}").unwrap_or(tex.len());
    if let Some(anchor) = tex[..doc].find(r"\addtobeamertemplate{headline}") {
        if let Some(env) = find_balanced_environment(tex, "tikzpicture", anchor).filter(|r| r.end <= doc) {
            let at = env.end - r"\end{tikzpicture}".len();
            debug!("Logo node added to the existing headline tikzpicture");
            return format!("{}{}\n{}", &tex[..at], node, &tex[at..]);
        }
    }

    let block = format!(
        "\\addtobeamertemplate{{headline}}{{}}{{\n\\begin{{tikzpicture}}[remember picture,overlay]\n{node}\n\\end{{tikzpicture}}\n}}\n\n"
    );
    insert_before_document(tex, &block)
}

fn beamer_block(section: &Section, layout: &SectionLayout, cfg: &LayoutConfig) -> String {
    let mut s = format!("\\begin{{block}}{{{}}}\n", escape_text(section.title.trim()));
    let body = format_body(&section.content, ListStyle::Plain);
    if !body.is_empty() {
        s.push_str(&body);
        s.push('\n');
    }
    for fig in &layout.figures {
        s.push('\n');
        s.push_str(&beamer_figure(fig, cfg));
    }
    s.push_str("\\end{block}\n");
    s
}

fn beamer_figure(fig: &LayoutFigure, cfg: &LayoutConfig) -> String {
    let mut s = String::from("\\begin{figure}\n\\centering\n");
    if fig.missing {
        s.push_str(&placeholder(fig, fig.width_frac));
    } else {
        s.push_str(&format!(
            "\\includegraphics[width={:.2}\\linewidth]{{{}}}",
            fig.width_frac,
            tex_relative_path(&fig.src)
        ));
    }
    s.push('\n');
    if cfg.emit_captions && !fig.caption.is_empty() {
        s.push_str(&format!("\\caption{{{}}}\n", escape_text(&fig.caption)));
    }
    s.push_str("\\end{figure}\n");
    s
}

/// Replace the `columns` environment after `\begin{document}` with `body`.
fn replace_columns_region(tex: &str, body: &str, flavor: TemplateFlavor) -> Result<String, PosterError> {
    let doc = tex
        .find(r"\begin{document}")
        .ok_or_else(|| PosterError::missing_anchor(r"\begin{document}", flavor))?;
    let region = find_balanced_environment(tex, "columns", doc)
        .ok_or_else(|| PosterError::missing_anchor(COLUMNS_ANCHOR, flavor))?;
    let begin = begin_token_with_options(&tex[region.clone()], "columns");
    Ok(format!(
        "{}{}\n{}\\end{{columns}}{}",
        &tex[..region.start],
        begin,
        body,
        &tex[region.end..]
    ))
}

fn column_blocks(
    idxs: &[usize],
    sections: &[Section],
    layouts: &[SectionLayout],
    cfg: &LayoutConfig,
) -> String {
    let empty = SectionLayout::default();
    idxs.iter()
        .filter_map(|&i| sections.get(i).map(|s| (s, layouts.get(i).unwrap_or(&empty))))
        .map(|(s, l)| beamer_block(s, l, cfg))
        .collect::<Vec<_>>()
        .join("\n")
}

/// beamerposter with the template's `\separatorcolumn` and `\colwidth`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeamerFixed;

impl TemplateStrategy for BeamerFixed {
    fn flavor(&self) -> TemplateFlavor {
        TemplateFlavor::BeamerFixed
    }

    fn apply_header(&self, tex: &str, meta: &Meta, cfg: &LayoutConfig) -> HeaderInfo {
        beamer_header(tex, meta, cfg)
    }

    fn place_sections(
        &self,
        tex: &str,
        sections: &[Section],
        layouts: &[SectionLayout],
        plan: &ColumnPlan,
        cfg: &LayoutConfig,
    ) -> Result<String, PosterError> {
        let mut body = String::new();
        for idxs in &plan.columns {
            body.push_str("\\separatorcolumn\n\\begin{column}{\\colwidth}\n");
            body.push_str(&column_blocks(idxs, sections, layouts, cfg));
            body.push_str("\\end{column}\n");
        }
        body.push_str("\\separatorcolumn\n");
        replace_columns_region(tex, &body, self.flavor())
    }
}

/// beamerposter with injected per-column widths.
///
/// The column holding the longest section title gets more room; see
/// [`column_fractions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BeamerAdaptive;

/// `\colAwidth`, `\colBwidth`, …
fn column_length_name(i: usize) -> String {
    let letter = char::from(b'A' + (i % 26) as u8);
    format!("\\col{letter}width")
}

fn length_definitions(widths: &ColumnWidths) -> String {
    let mut s = String::from("\n% adaptive column widths\n");
    let mut define = |name: &str, frac: f64| {
        s.push_str(&format!("\\ifdefined{name}\\else\\newlength{{{name}}}\\fi\n"));
        s.push_str(&format!("\\setlength{{{name}}}{{{frac:.6}\\paperwidth}}\n"));
    };
    define("\\autosepwidth", widths.separator);
    for (i, frac) in widths.columns.iter().enumerate() {
        define(&column_length_name(i), *frac);
    }
    s.push('\n');
    s
}

impl TemplateStrategy for BeamerAdaptive {
    fn flavor(&self) -> TemplateFlavor {
        TemplateFlavor::BeamerAdaptive
    }

    fn apply_header(&self, tex: &str, meta: &Meta, cfg: &LayoutConfig) -> HeaderInfo {
        beamer_header(tex, meta, cfg)
    }

    fn plan_columns(
        &self,
        sections: &[Section],
        _layouts: &mut [SectionLayout],
        cfg: &LayoutConfig,
    ) -> ColumnPlan {
        let columns = distribute(&(0..sections.len()).collect::<Vec<_>>(), cfg.columns.count);
        let titles: Vec<Vec<&str>> = columns
            .iter()
            .map(|idxs| idxs.iter().map(|&i| sections[i].title.trim()).collect())
            .collect();
        let widths = column_fractions(&titles, &cfg.columns);
        debug!("Adaptive column widths: {:?}", widths.columns);
        ColumnPlan {
            pin_bottom: vec![false; columns.len()],
            columns,
            widths: Some(widths),
        }
    }

    fn place_sections(
        &self,
        tex: &str,
        sections: &[Section],
        layouts: &[SectionLayout],
        plan: &ColumnPlan,
        cfg: &LayoutConfig,
    ) -> Result<String, PosterError> {
        let sep = "\\begin{column}{\\autosepwidth}\\end{column}\n";
        let mut body = String::new();
        for (i, idxs) in plan.columns.iter().enumerate() {
            body.push_str(sep);
            body.push_str(&format!("\\begin{{column}}{{{}}}\n", column_length_name(i)));
            body.push_str(&column_blocks(idxs, sections, layouts, cfg));
            body.push_str("\\end{column}\n");
        }
        body.push_str(sep);

        let tex = replace_columns_region(tex, &body, self.flavor())?;
        let widths = match &plan.widths {
            Some(w) => w.clone(),
            None => column_fractions(&vec![Vec::<&str>::new(); plan.columns.len()], &cfg.columns),
        };
        Ok(insert_before_document(&tex, &length_definitions(&widths)))
    }
}

// ── baposter ─────────────────────────────────────────────────────────────

const POSTER_ANCHOR: &str = r"\begin{poster} region with five header arguments";

/// baposter `\headerbox` layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Baposter;

/// Unique `name=` keys for `\headerbox`: lowercase alphanumerics of the
/// normalised title, numbered from 2 on repeats.
pub fn box_slugs(sections: &[Section]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    sections
        .iter()
        .map(|s| {
            let mut base: String = normalize_title(&s.title)
                .chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                .collect();
            if base.is_empty() {
                base.push('s');
            }
            let mut slug = base.clone();
            let mut n = 2;
            while seen.contains(&slug) {
                slug = format!("{base}{n}");
                n += 1;
            }
            seen.insert(slug.clone());
            slug
        })
        .collect()
}

fn replace_range(tex: &str, range: std::ops::Range<usize>, with: &str) -> String {
    format!("{}{}{}", &tex[..range.start], with, &tex[range.end..])
}

fn baposter_figure(fig: &LayoutFigure, cfg: &LayoutConfig) -> String {
    let width = fig
        .width_frac
        .max(cfg.baposter.figure_floor)
        .min(cfg.figures.max_frac);
    let mut s = String::from("\\begin{center}\n");
    if fig.missing {
        s.push_str(&placeholder(fig, width));
    } else {
        s.push_str(&format!(
            "\\includegraphics[width={:.2}\\linewidth]{{{}}}",
            width,
            basename(&fig.src)
        ));
    }
    s.push('\n');
    if cfg.emit_captions && !fig.caption.is_empty() {
        s.push_str(&format!("\\captionof{{figure}}{{{}}}\n", escape_text(&fig.caption)));
    }
    s.push_str("\\vspace{-0.2em}\n\\end{center}\n");
    s
}

impl TemplateStrategy for Baposter {
    fn flavor(&self) -> TemplateFlavor {
        TemplateFlavor::Baposter
    }

    fn apply_header(&self, tex: &str, meta: &Meta, cfg: &LayoutConfig) -> HeaderInfo {
        let bap = &cfg.baposter;
        let (wrapped, size, lines) = wrapped_title(meta, cfg);

        let mut tex = set_documentclass_option(tex, "baposter", "fontscale", &bap.fontscale.to_string());
        tex = set_documentclass_option(&tex, "baposter", "margin", &bap.margin);

        if let Some(args) = poster_args(&tex) {
            let [_, _, title_g, authors_g, logo_g] = args.groups;
            // Back to front so earlier ranges stay valid.
            if cfg.logo.enabled && cfg.logo.available {
                let logo = format!(
                    "{{\\includegraphics[height={}]{{{}}}}}",
                    bap.logo_height, cfg.logo.filename
                );
                tex = replace_range(&tex, logo_g, &logo);
            }
            let mut authors = format!("\\textsc{{{}}}", escape_text(meta.authors.trim()));
            if !meta.affiliations.trim().is_empty() {
                authors.push_str(&format!("\\\\ \\textsc{{{}}}", escape_text(meta.affiliations.trim())));
            }
            tex = replace_range(&tex, authors_g, &format!("{{{authors}}}"));
            let title = format!("{{\\bfseries {} \\textsc{{{}}}}}", size, escape_text(&wrapped));
            tex = replace_range(&tex, title_g, &title);
        }

        tex = set_poster_option(&tex, "columns", &cfg.columns.count.to_string());
        tex = set_poster_option(&tex, "colspacing", &bap.colspacing);

        HeaderInfo {
            tex,
            wrapped_title: wrapped,
            title_size: size,
            title_lines: lines,
        }
    }

    fn plan_columns(
        &self,
        sections: &[Section],
        layouts: &mut [SectionLayout],
        cfg: &LayoutConfig,
    ) -> ColumnPlan {
        let columns = distribute(&(0..sections.len()).collect::<Vec<_>>(), cfg.columns.count);
        let pin_bottom = rebalance_columns(sections, layouts, &columns, &cfg.figures, &cfg.baposter);
        ColumnPlan {
            columns,
            widths: None,
            pin_bottom,
        }
    }

    fn place_sections(
        &self,
        tex: &str,
        sections: &[Section],
        layouts: &[SectionLayout],
        plan: &ColumnPlan,
        cfg: &LayoutConfig,
    ) -> Result<String, PosterError> {
        let flavor = self.flavor();
        let args = poster_args(tex).ok_or_else(|| PosterError::missing_anchor(POSTER_ANCHOR, flavor))?;
        let region = find_balanced_environment(tex, "poster", 0)
            .filter(|r| r.end >= args.body_start)
            .ok_or_else(|| PosterError::missing_anchor(r"\end{poster}", flavor))?;
        let end_start = region.end - r"\end{poster}".len();

        let slugs = box_slugs(sections);
        let empty = SectionLayout::default();
        let mut body = String::new();
        for (col, idxs) in plan.columns.iter().enumerate() {
            let pin = plan.pin_bottom.get(col).copied().unwrap_or(false);
            let mut prev: Option<&str> = None;
            for (pos, &i) in idxs.iter().enumerate() {
                let Some(section) = sections.get(i) else { continue };
                let layout = layouts.get(i).unwrap_or(&empty);
                let title = if section.title.trim().is_empty() {
                    format!("Section {}", i + 1)
                } else {
                    section.title.clone()
                };
                let wrapped = soft_wrap_box(
                    &title,
                    cfg.title_wrap.box_first_limit,
                    cfg.title_wrap.box_next_limit,
                );

                let mut opts = format!("name={},column={},", slugs[i], col);
                match prev {
                    None => opts.push_str("row=0"),
                    Some(p) => opts.push_str(&format!("below={p}")),
                }
                opts.push_str(",span=1");
                if pin && pos + 1 == idxs.len() {
                    opts.push_str(",above=bottom");
                }

                body.push_str(&format!("\\headerbox{{{}}}{{{}}}{{\n", escape_text(&wrapped), opts));
                let text = format_body(&section.content, ListStyle::Compact);
                if !text.is_empty() {
                    body.push_str(&text);
                    body.push('\n');
                }
                for fig in &layout.figures {
                    body.push_str(&baposter_figure(fig, cfg));
                }
                body.push_str("}\n\n");
                prev = Some(slugs[i].as_str());
            }
        }

        let mut out = format!("{}\n\n{}{}", &tex[..args.body_start], body, &tex[end_start..]);
        if !out.contains(r"\graphicspath") {
            out = insert_before_document(&out, "\\graphicspath{{figures/}}\n");
        }
        Ok(out)
    }
}
