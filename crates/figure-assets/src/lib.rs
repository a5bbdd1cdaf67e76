//! # figure-assets
//!
//! Resolve the figure files referenced by a poster arrangement and stage
//! them into the LaTeX project, so that `\includegraphics{figures/x.png}`
//! in the generated `.tex` points at a real file.
//!
//! ## How it works
//!
//! 1. [`resolve_images_root`] picks the directory that figure paths are
//!    relative to, by probing the first few paths against each candidate.
//! 2. [`AssetStager::resolve_source`] maps one `figure_path` to a file:
//!    absolute paths are used as-is; relative paths are joined under
//!    `<root>/<images_dir>/` unless they already start with `<images_dir>`.
//!    When that file does not exist, the first file with the same basename
//!    anywhere below `<root>/<images_dir>/` is used instead.
//! 3. [`AssetStager::stage`] copies the source into `<out>/figures/` when the
//!    destination is missing or older than the source.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use figure_assets::{resolve_images_root, AssetStager, DEFAULT_IMAGES_DIR};
//! use std::path::PathBuf;
//!
//! let candidates = vec![PathBuf::from("Paper2Poster"), PathBuf::from(".")];
//! let root = resolve_images_root(&candidates, &["fig1.png"]).unwrap();
//! let stager = AssetStager::new(root, DEFAULT_IMAGES_DIR, "latex_proj");
//! let staged = stager.stage("fig1.png").expect("figure should exist");
//! assert_eq!(staged.tex_path, "figures/fig1.png");
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

// ── Public constants ─────────────────────────────────────────────────────────

/// Directory name the paper-parsing stage writes extracted images into.
pub const DEFAULT_IMAGES_DIR: &str = "<gpt-5_gpt-5>_images_and_tables";

/// Sub-directory of the output project that receives copied figures.
pub const FIGURES_DIR: &str = "figures";

/// How many figure paths [`resolve_images_root`] probes per candidate.
const PROBE_LIMIT: usize = 10;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by figure staging.
#[derive(Error, Debug)]
pub enum AssetError {
    /// No file matched the figure path, not even by basename.
    #[error("Figure source not found: '{figure}' (looked under '{root}')")]
    SourceNotFound { figure: String, root: PathBuf },

    /// The `figures/` directory could not be created.
    #[error("Cannot create figures directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The copy itself failed (permissions, disk full, …).
    #[error("Failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ── Staged figure ────────────────────────────────────────────────────────────

/// A figure that now lives inside the output project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFigure {
    /// The file that was found for the figure path.
    pub source: PathBuf,
    /// Where the figure lives inside the output project.
    pub dest: PathBuf,
    /// Path to use from the `.tex` file, always `/`-separated.
    pub tex_path: String,
    /// `false` when the destination was already up to date.
    pub copied: bool,
}

// ── Root resolution ──────────────────────────────────────────────────────────

/// Pick the images root among `candidates`.
///
/// The first candidate under which any of the first ten `samples` exists
/// (joined directly) wins. Falls back to the first candidate; returns `None`
/// only when `candidates` is empty.
pub fn resolve_images_root<S: AsRef<str>>(candidates: &[PathBuf], samples: &[S]) -> Option<PathBuf> {
    for root in candidates {
        let hit = samples
            .iter()
            .map(AsRef::as_ref)
            .filter(|s| !s.is_empty())
            .take(PROBE_LIMIT)
            .any(|s| root.join(s).exists());
        if hit {
            debug!("Images root resolved by probing: {}", root.display());
            return Some(root.clone());
        }
    }
    candidates.first().cloned()
}

/// Final path component of a figure path, accepting both `/` and `\`.
pub fn basename(figure_path: &str) -> &str {
    figure_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(figure_path)
}

/// The path a `.tex` file in the project root uses for a staged figure.
pub fn tex_relative_path(figure_path: &str) -> String {
    format!("{}/{}", FIGURES_DIR, basename(figure_path))
}

// ── Stager ───────────────────────────────────────────────────────────────────

/// Copies figures from an images root into `<out_dir>/figures/`.
#[derive(Debug, Clone)]
pub struct AssetStager {
    root: PathBuf,
    images_dir: String,
    out_dir: PathBuf,
}

impl AssetStager {
    pub fn new(root: impl Into<PathBuf>, images_dir: impl Into<String>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images_dir: images_dir.into(),
            out_dir: out_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<out_dir>/figures`.
    pub fn figures_dir(&self) -> PathBuf {
        self.out_dir.join(FIGURES_DIR)
    }

    /// Find the file a figure path refers to, or `None`.
    pub fn resolve_source(&self, figure_path: &str) -> Option<PathBuf> {
        let candidate = self.primary_candidate(figure_path);
        if candidate.is_file() {
            return Some(candidate);
        }

        let images_root = self.root.join(&self.images_dir);
        let found = find_by_basename(&images_root, basename(figure_path));
        if let Some(ref p) = found {
            debug!("Figure '{}' found by basename at {}", figure_path, p.display());
        }
        found
    }

    /// Copy one figure into the project, skipping the copy when the
    /// destination is already at least as new as the source.
    pub fn stage(&self, figure_path: &str) -> Result<StagedFigure, AssetError> {
        let source = self
            .resolve_source(figure_path)
            .ok_or_else(|| AssetError::SourceNotFound {
                figure: figure_path.to_string(),
                root: self.root.join(&self.images_dir),
            })?;

        let fig_dir = self.figures_dir();
        fs::create_dir_all(&fig_dir).map_err(|e| AssetError::CreateDir {
            path: fig_dir.clone(),
            source: e,
        })?;

        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| basename(figure_path).to_string());
        let dest = fig_dir.join(&name);

        let copied = if is_stale(&source, &dest) {
            fs::copy(&source, &dest).map_err(|e| AssetError::Copy {
                from: source.clone(),
                to: dest.clone(),
                source: e,
            })?;
            true
        } else {
            false
        };

        Ok(StagedFigure {
            source,
            dest,
            tex_path: format!("{FIGURES_DIR}/{name}"),
            copied,
        })
    }

    fn primary_candidate(&self, figure_path: &str) -> PathBuf {
        let p = Path::new(figure_path);
        if p.is_absolute() {
            return p.to_path_buf();
        }
        let starts_with_images_dir = matches!(
            p.components().next(),
            Some(Component::Normal(first)) if first == self.images_dir.as_str()
        );
        if starts_with_images_dir {
            self.root.join(p)
        } else {
            self.root.join(&self.images_dir).join(p)
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Depth-first search for `name` below `dir`; entries are visited in sorted
/// order so repeated runs pick the same file.
fn find_by_basename(dir: &Path, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    let entries = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(_) => return None,
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();

    for path in &paths {
        if path.is_file() && path.file_name().is_some_and(|n| n == name) {
            return Some(path.clone());
        }
    }
    paths
        .iter()
        .filter(|p| p.is_dir())
        .find_map(|p| find_by_basename(p, name))
}

fn is_stale(src: &Path, dst: &Path) -> bool {
    let Ok(dst_meta) = fs::metadata(dst) else {
        return true;
    };
    match (fs::metadata(src).and_then(|m| m.modified()), dst_meta.modified()) {
        (Ok(s), Ok(d)) => s > d,
        _ => {
            warn!("Cannot compare mtimes for {}; copying again", dst.display());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path, bytes: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn basename_handles_both_separators() {
        assert_eq!(basename("a/b/fig.png"), "fig.png");
        assert_eq!(basename("a\\b\\fig.png"), "fig.png");
        assert_eq!(basename("fig.png"), "fig.png");
        assert_eq!(tex_relative_path("x/y/z.pdf"), "figures/z.pdf");
    }

    #[test]
    fn root_probe_prefers_candidate_with_hits() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        touch(&b.join("imgs/f.png"), b"x");
        fs::create_dir_all(&a).unwrap();

        let root = resolve_images_root(&[a.clone(), b.clone()], &["imgs/f.png"]).unwrap();
        assert_eq!(root, b);

        let fallback = resolve_images_root(&[a.clone(), b], &["nothing.png"]).unwrap();
        assert_eq!(fallback, a);

        assert!(resolve_images_root::<&str>(&[], &[]).is_none());
    }

    #[test]
    fn stage_copies_from_images_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        touch(&root.join("imgs/fig1.png"), b"png");
        let out = tmp.path().join("out");

        let stager = AssetStager::new(&root, "imgs", &out);
        let staged = stager.stage("fig1.png").unwrap();
        assert!(staged.copied);
        assert_eq!(staged.tex_path, "figures/fig1.png");
        assert_eq!(fs::read(out.join("figures/fig1.png")).unwrap(), b"png");

        // Prefixed with the images dir name: joined directly under root.
        let again = stager.stage("imgs/fig1.png").unwrap();
        assert_eq!(again.source, root.join("imgs/fig1.png"));
        assert!(!again.copied, "destination is already up to date");
    }

    #[test]
    fn stage_falls_back_to_basename_search() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        touch(&root.join("imgs/deep/nested/plot.png"), b"p");
        let stager = AssetStager::new(&root, "imgs", tmp.path().join("out"));

        let staged = stager.stage("somewhere/else/plot.png").unwrap();
        assert_eq!(staged.source, root.join("imgs/deep/nested/plot.png"));
        assert_eq!(staged.tex_path, "figures/plot.png");
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let stager = AssetStager::new(tmp.path(), "imgs", tmp.path().join("out"));
        let err = stager.stage("ghost.png").unwrap_err();
        assert!(matches!(err, AssetError::SourceNotFound { .. }));
        assert!(err.to_string().contains("ghost.png"));
    }

    #[test]
    fn absolute_paths_are_used_verbatim() {
        let tmp = TempDir::new().unwrap();
        let abs = tmp.path().join("elsewhere/abs.png");
        touch(&abs, b"a");
        let stager = AssetStager::new(tmp.path().join("root"), "imgs", tmp.path().join("out"));
        let staged = stager.stage(abs.to_str().unwrap()).unwrap();
        assert_eq!(staged.source, abs);
    }
}
