//! Grid compositor: paste frames row-major into the sheet canvas
//!
//! Per-frame failures (missing file, decode error) are reported through the
//! status sink and skipped; the run continues. Only a save failure is fatal
//! to the run. Panics are caught one level up, at the worker boundary.

use log::{info, warn};
use std::path::PathBuf;

use crate::core::canvas::SheetCanvas;
use crate::core::collect::{FrameGeometry, FrameSet};
use crate::core::grid::GridSpec;

/// Lanczos resampling, matching the deterministic high-quality filter used
/// for both per-frame fitting and the final downscale.
const RESAMPLE: image::imageops::FilterType = image::imageops::FilterType::Lanczos3;

/// Append-only diagnostic sink. All run detail flows through here; the
/// return value of [`compose`] only says whether the sheet was saved.
pub type StatusSink<'a> = &'a (dyn Fn(String) + 'a);

/// Everything one compositing run needs. Immutable for the run's duration.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub frames: FrameSet,
    pub geometry: FrameGeometry,
    pub grid: GridSpec,
    pub output_path: PathBuf,
    /// Downscale the finished sheet back to a single frame's size.
    pub downscale_to_frame: bool,
}

/// Faults that end a run. Everything else is skip-and-continue.
#[derive(Debug)]
enum ComposeError {
    /// Sheet dimensions exceed what a pixel buffer can index
    CanvasTooLarge { width: u64, height: u64 },
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

impl std::fmt::Display for ComposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComposeError::CanvasTooLarge { width, height } => {
                write!(f, "Sheet size {}x{} is too large to allocate", width, height)
            }
            ComposeError::CreateDir { path, source } => {
                write!(
                    f,
                    "Failed to create output directory {}: {}",
                    path.display(),
                    source
                )
            }
            ComposeError::Save { path, source } => {
                write!(f, "Failed to save sheet to {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ComposeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComposeError::CreateDir { source, .. } => Some(source),
            ComposeError::Save { source, .. } => Some(source),
            ComposeError::CanvasTooLarge { .. } => None,
        }
    }
}

/// Composite the frame set into a sheet and save it.
///
/// Returns whether the sheet was written; diagnostics go to `status` only.
pub fn compose(req: &ComposeRequest, status: StatusSink<'_>) -> bool {
    match run(req, status) {
        Ok(()) => true,
        Err(e) => {
            warn!("Compose failed: {}", e);
            status(format!("Error: {}", e));
            false
        }
    }
}

fn run(req: &ComposeRequest, status: StatusSink<'_>) -> Result<(), ComposeError> {
    let geom = &req.geometry;
    let grid = req.grid;
    status(format!(
        "Starting composition: grid {}, frame {}x{}",
        grid, geom.width, geom.height
    ));
    status(format!("Using {} sorted frames", req.frames.len()));

    let (sheet_w, sheet_h) = grid.sheet_size(geom);
    let (width, height) = match (u32::try_from(sheet_w), u32::try_from(sheet_h)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(ComposeError::CanvasTooLarge {
                width: sheet_w,
                height: sheet_h,
            });
        }
    };

    status(format!(
        "Allocating {}x{} canvas ({:?})",
        width, height, geom.color
    ));
    let (mut canvas, fell_back) = SheetCanvas::new(geom.color, width, height);
    if fell_back {
        status(format!(
            "Canvas mode {:?} is not directly supported, using RGBA instead",
            geom.color
        ));
    }
    let canvas_color = canvas.color();

    let max_slots = grid.capacity();
    let mut placed: u64 = 0;

    for (i, name) in req.frames.files().iter().enumerate() {
        if i as u64 >= max_slots {
            let skipped = req.frames.len() as u64 - max_slots;
            status(format!(
                "Frame count ({}) exceeds grid capacity ({}), skipping the last {} frames",
                req.frames.len(),
                max_slots,
                skipped
            ));
            break;
        }

        let column = i as u64 % grid.columns as u64;
        let row = i as u64 / grid.columns as u64;
        let x = (column * geom.width as u64) as u32;
        let y = (row * geom.height as u64) as u32;

        let path = req.frames.path(i);
        let mut frame = match image::open(&path) {
            Ok(img) => img,
            Err(e) => {
                status(format!("Failed to open {}, skipped: {}", name, e));
                continue;
            }
        };

        if frame.width() != geom.width || frame.height() != geom.height {
            status(format!(
                "Resizing {} from {}x{} to {}x{}",
                name,
                frame.width(),
                frame.height(),
                geom.width,
                geom.height
            ));
            frame = frame.resize_exact(geom.width, geom.height, RESAMPLE);
        }

        if frame.color() != canvas_color {
            status(format!(
                "Converting {} from {:?} to {:?}",
                name,
                frame.color(),
                canvas_color
            ));
        }
        canvas.paste(&frame, x, y);
        placed += 1;
    }

    status(format!("Placed {} frames", placed));
    info!("Placed {}/{} frames on {} sheet", placed, req.frames.len(), grid);

    let mut final_image = canvas.into_dynamic();
    if req.downscale_to_frame {
        status(format!(
            "Downscaling sheet from {}x{} to {}x{}",
            width, height, geom.width, geom.height
        ));
        final_image = final_image.resize_exact(geom.width, geom.height, RESAMPLE);
    }

    if let Some(parent) = req.output_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ComposeError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
        status(format!("Created output directory {}", parent.display()));
    }

    final_image
        .save(&req.output_path)
        .map_err(|e| ComposeError::Save {
            path: req.output_path.clone(),
            source: e,
        })?;

    status(format!("Saved sheet to {}", req.output_path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collect::collect_frames;
    use crate::core::grid::GridSpec;
    use image::{Rgba, RgbaImage};
    use std::path::Path;

    fn write_frame(dir: &Path, name: &str, w: u32, h: u32, px: [u8; 4]) {
        RgbaImage::from_pixel(w, h, Rgba(px)).save(dir.join(name)).unwrap();
    }

    fn request(dir: &Path, grid: GridSpec, out: PathBuf, downscale: bool) -> ComposeRequest {
        let (frames, geometry) = collect_frames(dir).unwrap();
        ComposeRequest {
            frames,
            geometry,
            grid,
            output_path: out,
            downscale_to_frame: downscale,
        }
    }

    fn silent() -> impl Fn(String) {
        |_line| {}
    }

    #[test]
    fn test_row_major_placement() {
        let tmp = tempfile::tempdir().unwrap();
        write_frame(tmp.path(), "f1.png", 2, 2, [255, 0, 0, 255]);
        write_frame(tmp.path(), "f2.png", 2, 2, [0, 255, 0, 255]);
        write_frame(tmp.path(), "f3.png", 2, 2, [0, 0, 255, 255]);
        write_frame(tmp.path(), "f4.png", 2, 2, [255, 255, 0, 255]);

        let out = tmp.path().join("sheet.png");
        let req = request(tmp.path(), GridSpec::new(2, 2).unwrap(), out.clone(), false);
        assert!(compose(&req, &silent()));

        let sheet = image::open(&out).unwrap().to_rgba8();
        assert_eq!(sheet.dimensions(), (4, 4));
        assert_eq!(sheet.get_pixel(0, 0), &Rgba([255, 0, 0, 255])); // f1 top-left
        assert_eq!(sheet.get_pixel(2, 0), &Rgba([0, 255, 0, 255])); // f2 top-right
        assert_eq!(sheet.get_pixel(0, 2), &Rgba([0, 0, 255, 255])); // f3 bottom-left
        assert_eq!(sheet.get_pixel(2, 2), &Rgba([255, 255, 0, 255])); // f4 bottom-right
    }

    #[test]
    fn test_corrupt_frame_is_skipped_slot_stays_blank() {
        let tmp = tempfile::tempdir().unwrap();
        for i in [1, 2, 4, 5, 6] {
            write_frame(tmp.path(), &format!("f{}.png", i), 2, 2, [9, 9, 9, 255]);
        }
        // f3 sorts into slot index 2 (row 0, col 2 of a 3x2 grid)
        std::fs::write(tmp.path().join("f3.png"), b"not an image").unwrap();

        let out = tmp.path().join("sheet.png");
        let req = request(tmp.path(), GridSpec::new(3, 2).unwrap(), out.clone(), false);

        let lines = std::sync::Mutex::new(Vec::new());
        let sink = |line: String| lines.lock().unwrap().push(line);
        assert!(compose(&req, &sink));

        let lines = lines.into_inner().unwrap();
        assert!(lines.iter().any(|l| l.contains("skipped")));
        assert!(lines.iter().any(|l| l.contains("Placed 5 frames")));

        let sheet = image::open(&out).unwrap().to_rgba8();
        assert_eq!(sheet.get_pixel(0, 0), &Rgba([9, 9, 9, 255]));
        // Corrupt frame's slot left transparent
        assert_eq!(sheet.get_pixel(4, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(sheet.get_pixel(0, 2), &Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_overflow_stops_at_capacity() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 1..=7 {
            write_frame(tmp.path(), &format!("f{}.png", i), 2, 2, [i as u8, 0, 0, 255]);
        }

        let out = tmp.path().join("sheet.png");
        let req = request(tmp.path(), GridSpec::new(2, 3).unwrap(), out.clone(), false);

        let lines = std::sync::Mutex::new(Vec::new());
        let sink = |line: String| lines.lock().unwrap().push(line);
        assert!(compose(&req, &sink));

        let lines = lines.into_inner().unwrap();
        assert!(lines.iter().any(|l| l.contains("skipping the last 1 frames")));
        assert!(lines.iter().any(|l| l.contains("Placed 6 frames")));

        let sheet = image::open(&out).unwrap().to_rgba8();
        assert_eq!(sheet.dimensions(), (4, 6));
        // Frame 6 landed in the last cell; frame 7 never placed
        assert_eq!(sheet.get_pixel(2, 4), &Rgba([6, 0, 0, 255]));
    }

    #[test]
    fn test_mismatched_frames_are_resized_to_fit() {
        let tmp = tempfile::tempdir().unwrap();
        write_frame(tmp.path(), "f1.png", 4, 4, [50, 50, 50, 255]);
        write_frame(tmp.path(), "f2.png", 8, 2, [80, 80, 80, 255]); // wrong size

        let out = tmp.path().join("sheet.png");
        let req = request(tmp.path(), GridSpec::new(2, 1).unwrap(), out.clone(), false);
        assert!(compose(&req, &silent()));

        let sheet = image::open(&out).unwrap().to_rgba8();
        assert_eq!(sheet.dimensions(), (8, 4));
        // Resized frame fully covers its cell
        assert_eq!(sheet.get_pixel(7, 3).0[3], 255);
    }

    #[test]
    fn test_downscale_to_single_frame_size() {
        let tmp = tempfile::tempdir().unwrap();
        write_frame(tmp.path(), "a1.png", 100, 50, [200, 10, 10, 255]);
        write_frame(tmp.path(), "a2.png", 100, 50, [10, 200, 10, 255]);

        let out = tmp.path().join("sheet.png");
        let req = request(tmp.path(), GridSpec::new(1, 2).unwrap(), out.clone(), true);
        assert!(compose(&req, &silent()));

        let sheet = image::open(&out).unwrap();
        assert_eq!((sheet.width(), sheet.height()), (100, 50));
    }

    #[test]
    fn test_composition_is_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 1..=4 {
            write_frame(tmp.path(), &format!("f{}.png", i), 3, 3, [i as u8 * 40, 7, 7, 255]);
        }

        // Outputs go to a separate dir so the second collect_frames call
        // sees the same input snapshot as the first.
        let out_dir = tempfile::tempdir().unwrap();
        let out_a = out_dir.path().join("a.png");
        let out_b = out_dir.path().join("b.png");
        let grid = GridSpec::new(2, 2).unwrap();
        assert!(compose(&request(tmp.path(), grid, out_a.clone(), false), &silent()));
        assert!(compose(&request(tmp.path(), grid, out_b.clone(), false), &silent()));

        assert_eq!(std::fs::read(&out_a).unwrap(), std::fs::read(&out_b).unwrap());
    }

    #[test]
    fn test_output_parent_directory_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        write_frame(tmp.path(), "f1.png", 2, 2, [1, 2, 3, 255]);

        let out = tmp.path().join("nested/deeper/sheet.png");
        let req = request(tmp.path(), GridSpec::new(1, 1).unwrap(), out.clone(), false);
        assert!(compose(&req, &silent()));
        assert!(out.is_file());
    }

    #[test]
    fn test_save_failure_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_frame(tmp.path(), "f1.png", 2, 2, [1, 2, 3, 255]);

        // Parent "directory" is a plain file, so create_dir_all must fail
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let out = blocker.join("sheet.png");

        let req = request(tmp.path(), GridSpec::new(1, 1).unwrap(), out, false);
        let lines = std::sync::Mutex::new(Vec::new());
        let sink = |line: String| lines.lock().unwrap().push(line);
        assert!(!compose(&req, &sink));
        assert!(lines.into_inner().unwrap().iter().any(|l| l.starts_with("Error:")));
    }
}
