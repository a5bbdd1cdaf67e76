//! Input loading: read the JSON inputs and the template from disk.
//!
//! Every reader maps I/O failures the same way: a missing file is
//! [`PosterError::FileNotFound`], an unreadable one
//! [`PosterError::PermissionDenied`], anything else
//! [`PosterError::ReadFailed`]. JSON that does not match the expected shape
//! is [`PosterError::InvalidJson`] with the offending path.

use crate::config::LayoutConfig;
use crate::error::PosterError;
use crate::model::{Arrangement, CaptionIndex, PosterContent};
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read a UTF-8 text file.
pub fn read_text(path: &Path) -> Result<String, PosterError> {
    match std::fs::read_to_string(path) {
        Ok(s) => {
            debug!("Read {} ({} bytes)", path.display(), s.len());
            Ok(s)
        }
        Err(e) => Err(map_read_error(path, e)),
    }
}

fn map_read_error(path: &Path, e: std::io::Error) -> PosterError {
    let path = path.to_path_buf();
    match e.kind() {
        ErrorKind::NotFound => PosterError::FileNotFound { path },
        ErrorKind::PermissionDenied => PosterError::PermissionDenied { path },
        _ => PosterError::ReadFailed { path, source: e },
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PosterError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| PosterError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `poster_content.json`.
pub fn load_content(path: &Path) -> Result<PosterContent, PosterError> {
    read_json(path)
}

/// Load `arrangement.json`.
pub fn load_arrangement(path: &Path) -> Result<Arrangement, PosterError> {
    read_json(path)
}

/// Load `figure_caption.json`. A missing file yields an empty index;
/// captions are optional.
pub fn load_captions(path: &Path) -> Result<CaptionIndex, PosterError> {
    if !path.exists() {
        debug!("No caption file at {}", path.display());
        return Ok(CaptionIndex::new());
    }
    let value: serde_json::Value = read_json(path)?;
    Ok(CaptionIndex::from_json(&value))
}

/// Load a JSON layout preset and validate it.
pub fn load_config(path: &Path) -> Result<LayoutConfig, PosterError> {
    let config: LayoutConfig = read_json(path)?;
    config.validate()?;
    Ok(config)
}

/// Default candidate image roots for a content file:
/// `<content dir>/Paper2Poster`, then `<content dir>`.
pub fn default_image_roots(content_path: &Path) -> Vec<PathBuf> {
    let dir = match content_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    vec![dir.join("Paper2Poster"), dir]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_file_not_found() {
        let err = load_content(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, PosterError::FileNotFound { .. }));
    }

    #[test]
    fn bad_json_names_the_path() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("arrangement.json");
        std::fs::write(&p, "{ not json").unwrap();
        let err = load_arrangement(&p).unwrap_err();
        assert!(matches!(err, PosterError::InvalidJson { .. }));
        assert!(err.to_string().contains("arrangement.json"));
    }

    #[test]
    fn captions_optional() {
        let tmp = TempDir::new().unwrap();
        let idx = load_captions(&tmp.path().join("figure_caption.json")).unwrap();
        assert!(idx.is_empty());

        let p = tmp.path().join("caps.json");
        std::fs::write(&p, r#"{"a":{"image_path":"x/f.png","caption":"Fig. 1: hi"}}"#).unwrap();
        assert_eq!(load_captions(&p).unwrap().lookup("f.png"), Some("Fig. 1: hi"));
    }

    #[test]
    fn config_file_is_validated() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("preset.json");
        std::fs::write(&p, r#"{"figures":{"min_frac":0.95,"max_frac":0.5}}"#).unwrap();
        assert!(matches!(load_config(&p), Err(PosterError::InvalidConfig(_))));

        for bad in [
            r#"{"baposter":{"occupancy_fig_min":0.9,"occupancy_fig_max":0.5}}"#,
            r#"{"baposter":{"shrink_min":0.99,"shrink_max":0.8}}"#,
            r#"{"baposter":{"shrink_max":1.5}}"#,
            r#"{"baposter":{"max_occupancy":0.0}}"#,
            r#"{"baposter":{"figure_floor":0.0}}"#,
            r#"{"title_wrap":{"box_first_limit":0}}"#,
        ] {
            std::fs::write(&p, bad).unwrap();
            assert!(
                matches!(load_config(&p), Err(PosterError::InvalidConfig(_))),
                "accepted {bad}"
            );
        }

        std::fs::write(&p, r#"{"beamer_scale":1.2}"#).unwrap();
        assert_eq!(load_config(&p).unwrap().beamer_scale, 1.2);
    }

    #[test]
    fn image_roots_default_to_content_dir() {
        let roots = default_image_roots(Path::new("run/contents/poster_content.json"));
        assert_eq!(
            roots,
            vec![PathBuf::from("run/contents/Paper2Poster"), PathBuf::from("run/contents")]
        );
        assert_eq!(default_image_roots(Path::new("c.json"))[1], PathBuf::from("."));
    }
}
