//! Utility helpers shared across modules
//!
//! **Used by**: collector, app UI (file dialogs, output path suggestion)

/// Media file type detection
pub mod media {
    use std::path::Path;

    /// Supported frame image extensions (lowercase)
    pub const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff"];

    /// Check if file has a supported image extension (case-insensitive)
    pub fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|s| IMAGE_EXTS.contains(&s.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

use std::path::{Path, PathBuf};

/// Reduce a name to alphanumerics, underscore and hyphen.
///
/// Empty results (name was all punctuation) become "output".
pub fn sanitize_stem(name: &str) -> String {
    let safe: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if safe.is_empty() {
        "output".to_string()
    } else {
        safe
    }
}

/// Suggest an output path for a given input frame directory.
///
/// `/path/to/run_01` becomes `/path/to/run_01_spritesheet.png`, with the
/// directory name sanitized to filesystem-safe characters.
pub fn suggested_output_path(input_dir: &Path) -> PathBuf {
    let base = input_dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let safe = sanitize_stem(base);
    let parent = input_dir.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}_spritesheet.png", safe))
}
