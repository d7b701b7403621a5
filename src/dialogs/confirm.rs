//! Pre-run confirmation dialogs
//!
//! Both run on the UI thread before the compose worker is spawned;
//! cancelling either aborts the run with no side effects.

use eframe::egui;

use crate::core::grid::{CapacityRisk, GridSpec, MAX_DIMENSION};

/// Operator's answer to the grid-mismatch prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridChoice {
    Recommended,
    Original,
    Cancel,
}

/// "Frame count doesn't match grid capacity" dialog.
///
/// Surfaces both grids and the concrete cost of keeping the original one
/// (lost frames or blank trailing cells).
pub struct GridMismatchDialog {
    pub frame_count: usize,
    pub original: GridSpec,
    pub recommended: GridSpec,
    pub risk: CapacityRisk,
}

impl GridMismatchDialog {
    /// Render the modal window. `Some(choice)` once a button is clicked.
    pub fn render(&self, ctx: &egui::Context) -> Option<GridChoice> {
        let mut choice = None;

        let (title, warning) = match self.risk {
            CapacityRisk::FrameLoss { dropped } => (
                "Warning: frames would be lost",
                format!(
                    "Found {} frames, but the current grid {} only holds {}.\n\
                     Keeping it drops the last {} frames of the sequence.",
                    self.frame_count,
                    self.original,
                    self.original.capacity(),
                    dropped
                ),
            ),
            CapacityRisk::BlankPadding { blank } => (
                "Warning: blank cells",
                format!(
                    "Found {} frames, but the current grid {} holds {}.\n\
                     Keeping it leaves {} blank cells at the end of the sheet.",
                    self.frame_count,
                    self.original,
                    self.original.capacity(),
                    blank
                ),
            ),
        };

        egui::Window::new(title)
            .resizable(false)
            .collapsible(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.set_width(380.0);
                ui.label(warning);
                ui.add_space(4.0);
                ui.label(format!(
                    "The recommended grid {} fits all {} frames.",
                    self.recommended, self.frame_count
                ));
                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    if ui
                        .button(format!("Use recommended ({})", self.recommended))
                        .clicked()
                    {
                        choice = Some(GridChoice::Recommended);
                    }
                    if ui
                        .button(format!("Use current ({})", self.original))
                        .clicked()
                    {
                        choice = Some(GridChoice::Original);
                    }
                    if ui.button("Cancel").clicked() {
                        choice = Some(GridChoice::Cancel);
                    }
                });
            });

        choice
    }
}

/// "Sheet exceeds the advisory size ceiling" dialog.
pub struct OversizeDialog {
    pub sheet_width: u64,
    pub sheet_height: u64,
    /// Approximate size of the recommended grid's sheet, shown for scale.
    pub recommended_size: (u64, u64),
}

impl OversizeDialog {
    /// Render the modal window. `Some(true)` to proceed, `Some(false)` to
    /// cancel.
    pub fn render(&self, ctx: &egui::Context) -> Option<bool> {
        let mut choice = None;

        egui::Window::new("Confirm very large sheet")
            .resizable(false)
            .collapsible(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.set_width(380.0);
                ui.label(format!(
                    "The final sheet would be {}x{} pixels, beyond the {} px \
                     advisory limit. Sheets this large can use a lot of memory \
                     and time.",
                    self.sheet_width, self.sheet_height, MAX_DIMENSION
                ));
                ui.add_space(4.0);
                ui.label(format!(
                    "A roughly-square grid for this frame count would be about \
                     {}x{} pixels.",
                    self.recommended_size.0, self.recommended_size.1
                ));
                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    if ui.button("Proceed anyway").clicked() {
                        choice = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        choice = Some(false);
                    }
                });
            });

        choice
    }
}
