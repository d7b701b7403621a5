//! Background run execution
//!
//! One compositing run at a time on a dedicated thread, reporting back to
//! the UI through an mpsc channel: ordered log lines, then exactly one
//! terminal [`RunEvent::Finished`]. Panics inside the run are caught here
//! and surface as a failed run, never as a dead channel.

use log::info;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::JoinHandle;

use crate::core::compose::{ComposeRequest, compose};

/// Message from the worker to the UI.
#[derive(Debug)]
pub enum RunEvent {
    /// One status-log line, in emit order.
    Log(String),
    /// Terminal message; no further events follow.
    Finished(bool),
}

/// Handle to an in-flight run. Dropped after the terminal event.
pub struct RunHandle {
    rx: Receiver<RunEvent>,
    handle: Option<JoinHandle<()>>,
}

impl RunHandle {
    /// Non-blocking poll; `None` when no event is pending.
    pub fn try_recv(&self) -> Option<RunEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Join the finished worker thread. Call after [`RunEvent::Finished`].
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn a compositing run on its own thread.
pub fn spawn(request: ComposeRequest) -> RunHandle {
    let (tx, rx) = channel();

    let handle = std::thread::Builder::new()
        .name("spritegrid-compose".to_string())
        .spawn(move || {
            info!("Compose worker started: {}", request.output_path.display());
            let success = run_caught(&request, &tx);
            let _ = tx.send(RunEvent::Finished(success));
            info!("Compose worker finished: success={}", success);
        })
        .expect("Failed to spawn compose thread");

    RunHandle {
        rx,
        handle: Some(handle),
    }
}

/// Run the compositor, converting any panic into a reported failure.
fn run_caught(request: &ComposeRequest, tx: &Sender<RunEvent>) -> bool {
    let status = |line: String| {
        let _ = tx.send(RunEvent::Log(line));
    };

    match catch_unwind(AssertUnwindSafe(|| compose(request, &status))) {
        Ok(success) => success,
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            let _ = tx.send(RunEvent::Log(format!("Unexpected fault in run: {}", msg)));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collect::collect_frames;
    use crate::core::grid::GridSpec;
    use image::{Rgba, RgbaImage};
    use std::time::{Duration, Instant};

    fn drain(handle: &mut RunHandle) -> (Vec<String>, Option<bool>) {
        let mut lines = Vec::new();
        let mut finished = None;
        let deadline = Instant::now() + Duration::from_secs(10);

        while finished.is_none() && Instant::now() < deadline {
            match handle.try_recv() {
                Some(RunEvent::Log(line)) => lines.push(line),
                Some(RunEvent::Finished(ok)) => finished = Some(ok),
                None => std::thread::sleep(Duration::from_millis(5)),
            }
        }
        handle.join();
        (lines, finished)
    }

    #[test]
    fn test_run_reports_logs_then_single_terminal_event() {
        let tmp = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]))
            .save(tmp.path().join("f1.png"))
            .unwrap();

        let (frames, geometry) = collect_frames(tmp.path()).unwrap();
        let out = tmp.path().join("sheet.png");
        let mut handle = spawn(ComposeRequest {
            frames,
            geometry,
            grid: GridSpec::new(1, 1).unwrap(),
            output_path: out.clone(),
            downscale_to_frame: false,
        });

        let (lines, finished) = drain(&mut handle);
        assert_eq!(finished, Some(true));
        assert!(!lines.is_empty());
        assert!(out.is_file());
        // Channel closed after terminal event
        assert!(handle.try_recv().is_none());
    }

    #[test]
    fn test_failed_run_still_finishes() {
        let tmp = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]))
            .save(tmp.path().join("f1.png"))
            .unwrap();

        let (frames, geometry) = collect_frames(tmp.path()).unwrap();
        // Unwritable output: extension the encoder doesn't know
        let mut handle = spawn(ComposeRequest {
            frames,
            geometry,
            grid: GridSpec::new(1, 1).unwrap(),
            output_path: tmp.path().join("sheet.unknown_ext"),
            downscale_to_frame: false,
        });

        let (_lines, finished) = drain(&mut handle);
        assert_eq!(finished, Some(false));
    }
}
