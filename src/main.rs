use spritegrid::cli::Args;
use spritegrid::core::collect::{FrameGeometry, FrameSet, collect_frames};
use spritegrid::core::compose::ComposeRequest;
use spritegrid::core::grid::{
    CapacityCheck, GridSpec, check_capacity, exceeds_limit, recommended_grid,
};
use spritegrid::core::runner::{self, RunEvent, RunHandle};
use spritegrid::dialogs::{GridChoice, GridMismatchDialog, OversizeDialog};
use spritegrid::utils;

use anyhow::{Context, bail};
use clap::Parser;
use eframe::egui;
use log::{info, warn};
use std::path::PathBuf;

/// Persisted UI settings (grid and downscale toggle survive restarts)
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct SheetSettings {
    columns: u32,
    rows: u32,
    downscale: bool,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            columns: 10,
            rows: 1,
            downscale: false,
        }
    }
}

/// A run that passed collection but still needs operator confirmation.
struct PendingRun {
    frames: FrameSet,
    geometry: FrameGeometry,
    grid: GridSpec,
    output_path: PathBuf,
    downscale: bool,
}

/// Which confirmation dialog the pending run is waiting on.
enum PendingStage {
    GridMismatch(GridMismatchDialog),
    Oversize(OversizeDialog),
}

/// Main application state
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct SpriteGridApp {
    settings: SheetSettings,
    #[serde(skip)]
    input_dir: Option<PathBuf>,
    #[serde(skip)]
    output_path: Option<PathBuf>,
    #[serde(skip)]
    status_lines: Vec<String>,
    #[serde(skip)]
    run: Option<RunHandle>,
    #[serde(skip)]
    pending: Option<(PendingRun, PendingStage)>,
    #[serde(skip)]
    error_modal: Option<String>,
    #[serde(skip)]
    run_result_modal: Option<bool>,
}

impl Default for SpriteGridApp {
    fn default() -> Self {
        Self {
            settings: SheetSettings::default(),
            input_dir: None,
            output_path: None,
            status_lines: Vec::new(),
            run: None,
            pending: None,
            error_modal: None,
            run_result_modal: None,
        }
    }
}

impl SpriteGridApp {
    fn push_status(&mut self, line: impl Into<String>) {
        self.status_lines.push(line.into());
    }

    /// True while mutable controls must stay disabled.
    fn busy(&self) -> bool {
        self.run.is_some() || self.pending.is_some()
    }

    /// Directory picker; suggests an output path next to the chosen dir
    /// when none is set yet.
    fn select_input_dir(&mut self) {
        if let Some(dir) = rfd::FileDialog::new()
            .set_title("Select frame directory")
            .pick_folder()
        {
            if self.output_path.is_none() {
                self.output_path = Some(utils::suggested_output_path(&dir));
            }
            self.input_dir = Some(dir);
        }
    }

    fn select_output_file(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Save sprite sheet as")
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"])
            .add_filter("BMP", &["bmp"])
            .set_file_name(
                self.output_path
                    .as_deref()
                    .and_then(|p| p.file_name())
                    .and_then(|n| n.to_str())
                    .unwrap_or("spritesheet.png"),
            );
        if let Some(dir) = self.input_dir.as_deref().and_then(|d| d.parent()) {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.save_file() {
            self.output_path = Some(path);
        }
    }

    /// Validate inputs, collect frames, and either start the run or park it
    /// behind a confirmation dialog.
    fn start_clicked(&mut self) {
        let Some(input_dir) = self.input_dir.clone() else {
            self.error_modal = Some("Select an input frame directory first.".to_string());
            return;
        };
        let Some(output_path) = self.output_path.clone() else {
            self.error_modal = Some("Select an output file path first.".to_string());
            return;
        };
        let grid = match GridSpec::new(self.settings.columns, self.settings.rows) {
            Ok(grid) => grid,
            Err(e) => {
                self.error_modal = Some(e.to_string());
                return;
            }
        };

        self.push_status(format!("Scanning directory: {}", input_dir.display()));
        let (frames, geometry) = match collect_frames(&input_dir) {
            Ok(collected) => collected,
            Err(e) => {
                warn!("Collection failed: {}", e);
                self.push_status(format!("Error: {}", e));
                self.error_modal = Some(e.to_string());
                return;
            }
        };
        self.push_status(format!("Found {} image files, sorted.", frames.len()));

        let pending = PendingRun {
            grid,
            output_path,
            downscale: self.settings.downscale,
            frames,
            geometry,
        };

        match check_capacity(pending.frames.len(), grid) {
            CapacityCheck::Exact => self.advance_to_size_check(pending),
            CapacityCheck::Mismatch { recommended, risk } => {
                let dialog = GridMismatchDialog {
                    frame_count: pending.frames.len(),
                    original: grid,
                    recommended,
                    risk,
                };
                self.pending = Some((pending, PendingStage::GridMismatch(dialog)));
            }
        }
    }

    /// Grid settled; check the advisory size ceiling, then launch.
    fn advance_to_size_check(&mut self, pending: PendingRun) {
        if exceeds_limit(&pending.geometry, pending.grid) {
            let (w, h) = pending.grid.sheet_size(&pending.geometry);
            let rec = recommended_grid(pending.frames.len());
            let dialog = OversizeDialog {
                sheet_width: w,
                sheet_height: h,
                recommended_size: rec.sheet_size(&pending.geometry),
            };
            self.pending = Some((pending, PendingStage::Oversize(dialog)));
            return;
        }
        self.launch(pending);
    }

    /// All confirmations passed: clear the log and hand off to the worker.
    fn launch(&mut self, pending: PendingRun) {
        self.status_lines.clear();
        info!(
            "Starting run: {} frames, grid {}, output {}",
            pending.frames.len(),
            pending.grid,
            pending.output_path.display()
        );
        self.run = Some(runner::spawn(ComposeRequest {
            frames: pending.frames,
            geometry: pending.geometry,
            grid: pending.grid,
            output_path: pending.output_path,
            downscale_to_frame: pending.downscale,
        }));
    }

    /// Drain worker events into the status log; handle the terminal event.
    fn poll_run(&mut self) {
        let Some(run) = &self.run else {
            return;
        };

        let mut finished = None;
        let mut lines = Vec::new();
        while let Some(event) = run.try_recv() {
            match event {
                RunEvent::Log(line) => lines.push(line),
                RunEvent::Finished(success) => {
                    finished = Some(success);
                    break;
                }
            }
        }
        self.status_lines.extend(lines);

        if let Some(success) = finished {
            if let Some(mut run) = self.run.take() {
                run.join();
            }
            self.run_result_modal = Some(success);
        }
    }

    /// Render whichever confirmation dialog is pending and advance the
    /// run state machine on the operator's answer.
    fn render_pending(&mut self, ctx: &egui::Context) {
        let Some((mut pending, stage)) = self.pending.take() else {
            return;
        };

        match stage {
            PendingStage::GridMismatch(dialog) => match dialog.render(ctx) {
                Some(GridChoice::Recommended) => {
                    let recommended = dialog.recommended;
                    self.settings.columns = recommended.columns;
                    self.settings.rows = recommended.rows;
                    self.push_status(format!("Adopted recommended grid: {}", recommended));
                    pending.grid = recommended;
                    self.advance_to_size_check(pending);
                }
                Some(GridChoice::Original) => self.advance_to_size_check(pending),
                Some(GridChoice::Cancel) => self.push_status("Operation cancelled."),
                None => self.pending = Some((pending, PendingStage::GridMismatch(dialog))),
            },
            PendingStage::Oversize(dialog) => match dialog.render(ctx) {
                Some(true) => self.launch(pending),
                Some(false) => self.push_status("Operation cancelled (sheet too large)."),
                None => self.pending = Some((pending, PendingStage::Oversize(dialog))),
            },
        }
    }

    fn render_modals(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.error_modal.clone() {
            egui::Window::new("Error")
                .resizable(false)
                .collapsible(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.set_width(340.0);
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.error_modal = None;
                    }
                });
        }

        if let Some(success) = self.run_result_modal {
            let title = if success { "Done" } else { "Failed" };
            egui::Window::new(title)
                .resizable(false)
                .collapsible(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.set_width(340.0);
                    if success {
                        ui.label("Sprite sheet created.");
                    } else {
                        ui.label("Creating the sprite sheet failed; see the status log.");
                    }
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.run_result_modal = None;
                    }
                });
        }
    }

    fn render_main_panel(&mut self, ctx: &egui::Context) {
        let busy = self.busy();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!busy, |ui| {
                // Input directory row
                ui.horizontal(|ui| {
                    ui.label("Frame directory:");
                    let shown = self
                        .input_dir
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    ui.add(egui::TextEdit::singleline(&mut shown.as_str()).desired_width(380.0));
                    if ui.button("Browse...").clicked() {
                        self.select_input_dir();
                    }
                });

                // Grid options row
                ui.horizontal(|ui| {
                    ui.label("Columns:");
                    ui.add(egui::DragValue::new(&mut self.settings.columns).range(1..=4096));
                    ui.add_space(12.0);
                    ui.label("Rows:");
                    ui.add(egui::DragValue::new(&mut self.settings.rows).range(1..=4096));
                });

                ui.checkbox(
                    &mut self.settings.downscale,
                    "Downscale final sheet to a single frame's size (lossy)",
                );

                // Output path row
                ui.horizontal(|ui| {
                    ui.label("Output file:");
                    let shown = self
                        .output_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    ui.add(egui::TextEdit::singleline(&mut shown.as_str()).desired_width(380.0));
                    if ui.button("Save as...").clicked() {
                        self.select_output_file();
                    }
                });

                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("Create sprite sheet").clicked() {
                        self.start_clicked();
                    }
                });
            });

            ui.add_space(8.0);
            ui.separator();
            ui.label("Status:");
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for line in &self.status_lines {
                        ui.monospace(line);
                    }
                });
        });
    }
}

impl eframe::App for SpriteGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_run();
        self.render_pending(ctx);
        self.render_modals(ctx);
        self.render_main_panel(ctx);

        // Keep draining worker output even without input events
        if self.run.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(json) = serde_json::to_string(self) {
            storage.set_string(eframe::APP_KEY, json);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Print help when launched bare from a terminal (GUI mode)
    let has_any_args = args.input_dir.is_some()
        || args.output.is_some()
        || args.columns.is_some()
        || args.rows.is_some()
        || args.downscale
        || args.log_file.is_some()
        || args.verbosity > 0;
    if !has_any_args {
        use clap::CommandFactory;
        let mut cmd = Args::command();
        let _ = cmd.print_help();
        println!("\n");
    }

    // Determine log level based on verbosity flags
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("spritegrid.log"));
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }

    // Image codec support is compiled in; a build without PNG read/write
    // cannot do anything useful. Report before any window opens.
    let png_ok = image::ImageFormat::Png.reading_enabled()
        && image::ImageFormat::Png.writing_enabled();
    if !png_ok {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title("Missing image support")
            .set_description("This build lacks PNG codec support and cannot process frames.")
            .show();
        bail!("PNG codec support missing");
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("SpriteGrid v{}", env!("CARGO_PKG_VERSION")))
            .with_inner_size([620.0, 480.0])
            .with_min_inner_size([500.0, 420.0])
            .with_resizable(true),
        persist_window: true,
        ..Default::default()
    };

    info!("Starting SpriteGrid");

    eframe::run_native(
        "SpriteGrid",
        native_options,
        Box::new(move |cc| {
            // Load persisted settings if available, otherwise defaults
            let mut app: SpriteGridApp = cc
                .storage
                .and_then(|storage| storage.get_string(eframe::APP_KEY))
                .and_then(|json| serde_json::from_str(&json).ok())
                .unwrap_or_else(|| {
                    info!("No persisted state found, creating default app");
                    SpriteGridApp::default()
                });

            // CLI arguments prefill the UI
            if let Some(dir) = args.input_dir.clone() {
                app.output_path = Some(utils::suggested_output_path(&dir));
                app.input_dir = Some(dir);
            }
            if let Some(output) = args.output.clone() {
                app.output_path = Some(output);
            }
            if let Some(columns) = args.columns {
                app.settings.columns = columns.max(1);
            }
            if let Some(rows) = args.rows {
                app.settings.rows = rows.max(1);
            }
            if args.downscale {
                app.settings.downscale = true;
            }

            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run UI: {}", e))?;

    info!("Application exiting");
    Ok(())
}
