use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::types::{short_id, BoardImage};

pub const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Periodic photos of the lecture board.
pub trait BoardCapture: Send + Sync {
    fn start_captures(&self, recording_id: &str, note_id: &str);
    /// Stop the ticker and hand over the images of this capture session,
    /// oldest first. The camera keeps nothing afterwards.
    fn stop_captures(&self) -> Vec<BoardImage>;
    fn is_capturing(&self) -> bool;
}

#[derive(Default)]
struct Target {
    recording_id: String,
    note_id: String,
}

/// Stand-in camera: on every tick records a placeholder image for the current
/// recording.
pub struct SimulatedBoardCamera {
    interval: Duration,
    target: Arc<Mutex<Option<Target>>>,
    images: Arc<Mutex<Vec<BoardImage>>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedBoardCamera {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            target: Arc::new(Mutex::new(None)),
            images: Arc::new(Mutex::new(Vec::new())),
            ticker: Mutex::new(None),
        }
    }

    fn capture(target: &Mutex<Option<Target>>, images: &Mutex<Vec<BoardImage>>) {
        let Some((recording_id, note_id)) = target.lock().as_ref().map(|t| (t.recording_id.clone(), t.note_id.clone())) else {
            return;
        };
        let now = Utc::now();
        let image = BoardImage {
            id: short_id(),
            url: format!("https://placeholder.com/800x600?text=Board_Capture_{}", now.format("%Y%m%dT%H%M%SZ")),
            timestamp: now,
            recording_id,
            note_id,
        };
        info!(target: "studio", id = %image.id, "board image captured");
        images.lock().push(image);
    }
}

impl Default for SimulatedBoardCamera {
    fn default() -> Self { Self::new(DEFAULT_CAPTURE_INTERVAL) }
}

impl BoardCapture for SimulatedBoardCamera {
    fn start_captures(&self, recording_id: &str, note_id: &str) {
        let mut ticker = self.ticker.lock();
        if ticker.is_some() {
            warn!(target: "studio", "board captures already in progress");
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(target: "studio", "board captures need a tokio runtime");
            return;
        };
        *self.target.lock() = Some(Target { recording_id: recording_id.to_string(), note_id: note_id.to_string() });
        let target = self.target.clone();
        let images = self.images.clone();
        let period = self.interval;
        *ticker = Some(handle.spawn(async move {
            let mut every = tokio::time::interval(period);
            every.tick().await; // first tick completes immediately
            loop {
                every.tick().await;
                SimulatedBoardCamera::capture(&target, &images);
            }
        }));
        info!(target: "studio", %recording_id, interval_secs = period.as_secs(), "board captures started");
    }

    fn stop_captures(&self) -> Vec<BoardImage> {
        let Some(task) = self.ticker.lock().take() else { return Vec::new(); };
        task.abort();
        *self.target.lock() = None;
        let images = std::mem::take(&mut *self.images.lock());
        info!(target: "studio", count = images.len(), "board captures stopped");
        images
    }

    fn is_capturing(&self) -> bool { self.ticker.lock().is_some() }
}

impl Drop for SimulatedBoardCamera {
    fn drop(&mut self) {
        if let Some(task) = self.ticker.get_mut().take() { task.abort(); }
    }
}
