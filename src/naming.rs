use crate::config::RunConfig;
use crate::error::{AppError, Result};
use crate::model::VideoReference;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref INVALID_FILENAME_CHARS: Regex = Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap();
}

pub const DEFAULT_EXTENSION: &str = "mp4";

/// Replaces characters that are invalid in filenames on common platforms.
///
/// Trailing dots and spaces are trimmed as well; an empty result yields
/// `None` so callers can fall back to the video id.
pub fn sanitize_title(title: &str) -> Option<String> {
    let replaced = INVALID_FILENAME_CHARS.replace_all(title.trim(), "_");
    let trimmed = replaced.trim_end_matches(['.', ' ']);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Inserts `suffix` verbatim between the file stem and its extension.
pub fn insert_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    path.with_file_name(name)
}

/// The `--output` path with the suffix applied, if one was given.
pub fn explicit_destination(config: &RunConfig) -> Option<PathBuf> {
    config.output.as_ref().map(|output| apply_suffix(output, config))
}

/// Where a candidate's finished file goes.
///
/// `--output` wins; otherwise `<output_dir>/<sanitized title>.mp4`.
pub fn destination(config: &RunConfig, reference: &VideoReference) -> PathBuf {
    if let Some(explicit) = explicit_destination(config) {
        return explicit;
    }

    let stem = sanitize_title(&reference.title)
        .or_else(|| sanitize_title(&reference.id))
        .unwrap_or_else(|| "video".to_string());
    let path = config
        .output_dir
        .join(format!("{}.{}", stem, DEFAULT_EXTENSION));
    apply_suffix(&path, config)
}

/// Fails with `OutputExists` when the destination is taken and `--force` is off.
pub fn ensure_available(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(AppError::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

fn apply_suffix(path: &Path, config: &RunConfig) -> PathBuf {
    match &config.suffix {
        Some(suffix) => insert_suffix(path, suffix),
        None => path.to_path_buf(),
    }
}
