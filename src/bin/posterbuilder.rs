//! CLI binary for posterbuilder.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `LayoutConfig` and a `BuildRequest`, then prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use posterbuilder::pipeline::input::load_config;
use posterbuilder::{
    build_poster, plan_layout, BuildRequest, LayoutConfig, LayoutPlan, MissingFigurePolicy,
    PosterInputs, Preset, TemplateFlavor,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Beamer poster from the built-in template
  posterbuilder run/poster_content.json --arrangement run/arrangement.json -o run/latex_proj

  # Your own template, flavor detected from \documentclass
  posterbuilder content.json --arrangement arr.json --template template.tex -o out

  # baposter preset, fail if any figure file is missing
  posterbuilder content.json --arrangement arr.json --preset baposter --missing-figures fail

  # Only show the column plan and figure widths
  posterbuilder content.json --arrangement arr.json --plan-only --json

FLAVORS:
  auto             baposter if the template's \documentclass is baposter, else beamer
  beamer           beamerposter, template's \separatorcolumn and \colwidth
  beamer-adaptive  beamerposter, column widths weighted by the longest section title
  baposter         \headerbox layout

ENVIRONMENT VARIABLES:
  Every flag has a POSTER_* counterpart (POSTER_ARRANGEMENT, POSTER_FLAVOR, ...).
  RUST_LOG overrides the log level chosen by -v / -q.
"#;

/// Turn structured paper content into a LaTeX poster.
#[derive(Parser, Debug)]
#[command(
    name = "posterbuilder",
    version,
    about = "Turn structured paper content into a compilable LaTeX poster",
    long_about = "Fill a beamerposter or baposter template with the sections of a paper, \
distribute them into columns and size the figures so the text still fits. Figures are \
copied into <OUT_DIR>/figures/ next to the generated .tex.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// poster_content.json (title, authors, sections).
    #[arg(env = "POSTER_CONTENT")]
    content: PathBuf,

    /// arrangement.json (panels and figure placement).
    #[arg(short, long, env = "POSTER_ARRANGEMENT")]
    arrangement: PathBuf,

    /// figure_caption.json. Default: next to the content file; optional.
    #[arg(long, env = "POSTER_CAPTIONS")]
    captions: Option<PathBuf>,

    /// LaTeX template. Default: the built-in template for the flavor.
    #[arg(short, long, env = "POSTER_TEMPLATE")]
    template: Option<PathBuf>,

    /// Output project directory.
    #[arg(short, long, env = "POSTER_OUT_DIR", default_value = "latex_proj")]
    output: PathBuf,

    /// File name of the generated document.
    #[arg(long, env = "POSTER_TEX_NAME", default_value = posterbuilder::convert::DEFAULT_TEX_NAME)]
    tex_name: String,

    /// Candidate images root (repeatable). Default: <content dir>/Paper2Poster, <content dir>.
    #[arg(long = "images-root", env = "POSTER_IMAGES_ROOT", value_delimiter = ',')]
    images_roots: Vec<PathBuf>,

    /// Name of the images directory under the images root.
    #[arg(long, env = "POSTER_IMAGES_DIR_NAME")]
    images_dir_name: Option<String>,

    /// Template flavor.
    #[arg(long, env = "POSTER_FLAVOR", value_enum)]
    flavor: Option<FlavorArg>,

    /// Named parameter set.
    #[arg(long, env = "POSTER_PRESET", value_enum, default_value = "standard")]
    preset: PresetArg,

    /// JSON layout config; replaces --preset.
    #[arg(long, env = "POSTER_CONFIG")]
    config: Option<PathBuf>,

    /// What to do when a figure file cannot be staged.
    #[arg(long, env = "POSTER_MISSING_FIGURES", value_enum)]
    missing_figures: Option<MissingArg>,

    /// Do not emit figure captions.
    #[arg(long, env = "POSTER_NO_CAPTIONS")]
    no_captions: bool,

    /// Do not inject the top-right logo.
    #[arg(long, env = "POSTER_NO_LOGO")]
    no_logo: bool,

    /// Print the column plan and figure widths; write nothing.
    #[arg(long, env = "POSTER_PLAN_ONLY")]
    plan_only: bool,

    /// Print stats (or the plan) as JSON on stdout.
    #[arg(long, env = "POSTER_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "POSTER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "POSTER_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FlavorArg {
    Auto,
    Beamer,
    BeamerAdaptive,
    Baposter,
}

impl From<FlavorArg> for TemplateFlavor {
    fn from(v: FlavorArg) -> Self {
        match v {
            FlavorArg::Auto => TemplateFlavor::Auto,
            FlavorArg::Beamer => TemplateFlavor::BeamerFixed,
            FlavorArg::BeamerAdaptive => TemplateFlavor::BeamerAdaptive,
            FlavorArg::Baposter => TemplateFlavor::Baposter,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PresetArg {
    Standard,
    Classic,
    Baposter,
}

impl From<PresetArg> for Preset {
    fn from(v: PresetArg) -> Self {
        match v {
            PresetArg::Standard => Preset::Standard,
            PresetArg::Classic => Preset::Classic,
            PresetArg::Baposter => Preset::Baposter,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MissingArg {
    Keep,
    Skip,
    Placeholder,
    Fail,
}

impl From<MissingArg> for MissingFigurePolicy {
    fn from(v: MissingArg) -> Self {
        match v {
            MissingArg::Keep => MissingFigurePolicy::Keep,
            MissingArg::Skip => MissingFigurePolicy::Skip,
            MissingArg::Placeholder => MissingFigurePolicy::Placeholder,
            MissingArg::Fail => MissingFigurePolicy::Fail,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let request = build_request(&cli);

    // ── Plan-only mode ───────────────────────────────────────────────────
    if cli.plan_only {
        let inputs = PosterInputs::load(&request).context("Failed to load inputs")?;
        let plan = plan_layout(&inputs, &config).context("Failed to plan layout")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plan).context("Failed to serialise plan")?
            );
        } else {
            print_plan(&plan);
        }
        return Ok(());
    }

    // ── Build ────────────────────────────────────────────────────────────
    let output = build_poster(&request, &config).context("Poster build failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output.stats).context("Failed to serialise stats")?
        );
    }

    if !cli.quiet {
        for w in &output.warnings {
            eprintln!("{} {}", yellow("⚠"), w);
        }
        let stats = &output.stats;
        eprintln!(
            "{}  {} sections  {} figures  {}ms  →  {}",
            if output.warnings.is_empty() {
                green("✔")
            } else {
                yellow("⚠")
            },
            stats.sections,
            stats.figures_placed,
            stats.total_duration_ms,
            bold(&request.output_path().display().to_string()),
        );
        eprintln!(
            "   {}",
            dim(&format!(
                "{} template, title on {} line(s), {} copied, {} shrunk, {} missing",
                stats.flavor,
                stats.title_lines,
                stats.figures_copied,
                stats.figures_shrunk,
                stats.figures_missing
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `LayoutConfig`.
fn build_config(cli: &Cli) -> Result<LayoutConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load layout config from {:?}", path))?,
        None => LayoutConfig::preset(cli.preset.into()),
    };

    if let Some(flavor) = cli.flavor {
        config.flavor = flavor.into();
    }
    if let Some(policy) = cli.missing_figures {
        config.missing_figures = policy.into();
    }
    if cli.no_captions {
        config.emit_captions = false;
    }
    if cli.no_logo {
        config.logo.enabled = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Map CLI args to `BuildRequest`.
fn build_request(cli: &Cli) -> BuildRequest {
    let mut request = BuildRequest::new(&cli.content, &cli.arrangement, &cli.output)
        .tex_name(cli.tex_name.clone());
    if let Some(ref p) = cli.captions {
        request = request.captions(p);
    }
    if let Some(ref p) = cli.template {
        request = request.template(p);
    }
    for root in &cli.images_roots {
        request = request.image_root(root);
    }
    if let Some(ref name) = cli.images_dir_name {
        request = request.images_dir_name(name.clone());
    }
    request
}

fn print_plan(plan: &LayoutPlan) {
    println!("Flavor:  {}", plan.flavor);
    println!("Title:   {}", plan.title);
    for (i, col) in plan.columns.iter().enumerate() {
        let width = col
            .width
            .map(|w| format!("  {:.3}\\paperwidth", w))
            .unwrap_or_default();
        let pin = if col.pin_bottom { "  (pinned)" } else { "" };
        println!("{}{}{}", bold(&format!("Column {}", i + 1)), dim(&width), dim(pin));
        for s in &col.sections {
            println!("  {}  {}", s.title, dim(&format!("{} chars", s.chars)));
            for f in &s.figures {
                let missing = if f.missing { "  missing" } else { "" };
                println!("    {:.2}  {}{}", f.width_frac, f.src, yellow(missing));
            }
        }
    }
    for w in &plan.warnings {
        println!("{} {}", yellow("⚠"), w);
    }
}
