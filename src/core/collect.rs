//! Frame collection: directory scan, natural sort, first-frame geometry
//!
//! Runs synchronously on the UI thread before a compositing run so every
//! validation error can surface as a blocking dialog before any worker
//! is spawned.

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::core::natural::natural_cmp;
use crate::utils::media;

/// Ordered set of frame filenames inside one directory.
///
/// Built once per run, immutable afterwards. Order is the natural sort of
/// the filenames and is deterministic for a given directory snapshot.
#[derive(Debug, Clone)]
pub struct FrameSet {
    dir: PathBuf,
    files: Vec<String>,
}

impl FrameSet {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Full path of the frame at `index`.
    pub fn path(&self, index: usize) -> PathBuf {
        self.dir.join(&self.files[index])
    }
}

/// Canonical frame size and color, derived from the first frame.
///
/// Every other frame is resized/converted to match, never rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub color: image::ColorType,
}

/// Errors from the collection phase. All of them abort before any worker
/// is spawned.
#[derive(Debug)]
pub enum CollectError {
    /// Input path missing or not a readable directory
    DirectoryNotFound(PathBuf),
    /// Directory exists but holds no supported image files
    NoImagesFound(PathBuf),
    /// First frame could not be opened/decoded
    FrameRead {
        path: PathBuf,
        source: image::ImageError,
    },
    /// First frame decoded to a degenerate size
    InvalidGeometry {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::DirectoryNotFound(dir) => {
                write!(f, "Input directory not found: {}", dir.display())
            }
            CollectError::NoImagesFound(dir) => {
                write!(f, "No supported image files in {}", dir.display())
            }
            CollectError::FrameRead { path, source } => {
                write!(f, "Failed to read first frame {}: {}", path.display(), source)
            }
            CollectError::InvalidGeometry { path, width, height } => {
                write!(
                    f,
                    "Invalid frame size {}x{} from {}",
                    width,
                    height,
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::FrameRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Scan `input_dir` for frames and derive the canonical geometry.
///
/// Filters regular files by supported extension, sorts them naturally, and
/// decodes the first frame for width/height/color. Does not mutate any
/// file.
pub fn collect_frames(input_dir: &Path) -> Result<(FrameSet, FrameGeometry), CollectError> {
    if !input_dir.is_dir() {
        return Err(CollectError::DirectoryNotFound(input_dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(input_dir)
        .map_err(|_| CollectError::DirectoryNotFound(input_dir.to_path_buf()))?;

    let mut files: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && media::is_image(&e.path()))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();

    if files.is_empty() {
        return Err(CollectError::NoImagesFound(input_dir.to_path_buf()));
    }

    files.sort_by(|a, b| natural_cmp(a, b));
    debug!("Collected {} frames from {}", files.len(), input_dir.display());

    let set = FrameSet {
        dir: input_dir.to_path_buf(),
        files,
    };

    let first_path = set.path(0);
    let first = image::open(&first_path).map_err(|e| CollectError::FrameRead {
        path: first_path.clone(),
        source: e,
    })?;

    let (width, height) = (first.width(), first.height());
    if width == 0 || height == 0 {
        return Err(CollectError::InvalidGeometry {
            path: first_path,
            width,
            height,
        });
    }

    let geometry = FrameGeometry {
        width,
        height,
        color: first.color(),
    };
    info!(
        "First frame {}: {}x{} ({:?})",
        first_path.display(),
        width,
        height,
        geometry.color
    );

    Ok((set, geometry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_frame(dir: &Path, name: &str, w: u32, h: u32) {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let err = collect_frames(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, CollectError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_empty_directory_reports_no_images() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "not a frame").unwrap();

        let err = collect_frames(tmp.path()).unwrap_err();
        assert!(matches!(err, CollectError::NoImagesFound(_)));
    }

    #[test]
    fn test_natural_order_and_extension_filter() {
        let tmp = tempfile::tempdir().unwrap();
        write_frame(tmp.path(), "f10.png", 4, 4);
        write_frame(tmp.path(), "f2.png", 4, 4);
        write_frame(tmp.path(), "f1.PNG", 4, 4);
        std::fs::write(tmp.path().join("readme.md"), "skip me").unwrap();

        let (set, geom) = collect_frames(tmp.path()).unwrap();
        assert_eq!(set.files(), &["f1.PNG", "f2.png", "f10.png"]);
        assert_eq!((geom.width, geom.height), (4, 4));
        assert_eq!(geom.color, image::ColorType::Rgba8);
    }

    #[test]
    fn test_unreadable_first_frame() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a0.png"), b"garbage").unwrap();
        write_frame(tmp.path(), "a1.png", 4, 4);

        let err = collect_frames(tmp.path()).unwrap_err();
        assert!(matches!(err, CollectError::FrameRead { .. }));
    }
}
