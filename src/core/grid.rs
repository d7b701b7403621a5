//! Grid geometry: validation, capacity reconciliation, size guard
//!
//! The capacity advisor never truncates: the recommended grid is the
//! smallest roughly-square layout whose capacity covers every frame.

use crate::core::collect::FrameGeometry;

/// Advisory ceiling for either sheet dimension, in pixels. The operator can
/// confirm past it; it is not a hard limit.
pub const MAX_DIMENSION: u64 = 16384;

/// Columns x rows arrangement of the output sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
}

impl GridSpec {
    /// Validated constructor; zero columns or rows are rejected.
    pub fn new(columns: u32, rows: u32) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::InvalidSpec { columns, rows });
        }
        Ok(Self { columns, rows })
    }

    /// Total cell count.
    pub fn capacity(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }

    /// Full sheet size in pixels for a given frame geometry.
    pub fn sheet_size(&self, geom: &FrameGeometry) -> (u64, u64) {
        (
            geom.width as u64 * self.columns as u64,
            geom.height as u64 * self.rows as u64,
        )
    }
}

impl std::fmt::Display for GridSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

#[derive(Debug)]
pub enum GridError {
    InvalidSpec { columns: u32, rows: u32 },
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::InvalidSpec { columns, rows } => {
                write!(f, "Columns and rows must be positive: got {}x{}", columns, rows)
            }
        }
    }
}

impl std::error::Error for GridError {}

/// What keeping a mismatched grid would cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityRisk {
    /// Grid too small: the last `dropped` frames (in sorted order) would
    /// never be placed.
    FrameLoss { dropped: u64 },
    /// Grid too large: `blank` trailing cells stay empty.
    BlankPadding { blank: u64 },
}

/// Result of comparing frame count against grid capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityCheck {
    /// Counts match; proceed without prompting.
    Exact,
    /// Counts differ; the operator must pick original vs recommended.
    Mismatch {
        recommended: GridSpec,
        risk: CapacityRisk,
    },
}

/// Smallest roughly-square grid with capacity >= `frame_count`.
///
/// columns = ceil(sqrt(n)), rows = ceil(n / columns).
pub fn recommended_grid(frame_count: usize) -> GridSpec {
    let n = frame_count.max(1) as u64;
    let columns = (n as f64).sqrt().ceil() as u64;
    let rows = n.div_ceil(columns);
    GridSpec {
        columns: columns as u32,
        rows: rows as u32,
    }
}

/// Compare frame count to grid capacity and classify the mismatch.
pub fn check_capacity(frame_count: usize, grid: GridSpec) -> CapacityCheck {
    let count = frame_count as u64;
    let capacity = grid.capacity();

    if count == capacity {
        return CapacityCheck::Exact;
    }

    let risk = if count > capacity {
        CapacityRisk::FrameLoss {
            dropped: count - capacity,
        }
    } else {
        CapacityRisk::BlankPadding {
            blank: capacity - count,
        }
    };

    CapacityCheck::Mismatch {
        recommended: recommended_grid(frame_count),
        risk,
    }
}

/// True when either sheet dimension would exceed [`MAX_DIMENSION`].
///
/// Purely advisory: the caller asks the operator for confirmation before
/// any canvas allocation is attempted.
pub fn exceeds_limit(geom: &FrameGeometry, grid: GridSpec) -> bool {
    let (w, h) = grid.sheet_size(geom);
    w > MAX_DIMENSION || h > MAX_DIMENSION
}
