use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};

use super::types::{short_id, UploadMetadata};

/// Audio capture and upload.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// False when capture could not start (device busy or unavailable).
    async fn start_recording(&self) -> bool;
    /// The captured audio, or `None` if nothing was recording.
    async fn stop_recording(&self) -> Option<Vec<u8>>;
    fn is_recording(&self) -> bool;
    /// Append audio streamed by the client. False when nothing is recording.
    fn push_chunk(&self, chunk: &[u8]) -> bool;
    /// Store the audio and return its recording id.
    async fn upload_audio(&self, audio: Vec<u8>, metadata: &UploadMetadata) -> Result<String>;
}

/// Stand-in recorder: buffers whatever chunks are fed to it and "uploads"
/// after a fixed delay.
#[derive(Default)]
pub struct SimulatedRecorder {
    buffer: Mutex<Option<Vec<u8>>>,
    upload_latency: Duration,
}

impl SimulatedRecorder {
    pub fn new(upload_latency: Duration) -> Self {
        Self { buffer: Mutex::new(None), upload_latency }
    }
}

#[async_trait]
impl MediaCapture for SimulatedRecorder {
    async fn start_recording(&self) -> bool {
        let mut buf = self.buffer.lock();
        if buf.is_some() {
            warn!(target: "studio", "recording already in progress");
            return false;
        }
        *buf = Some(Vec::new());
        info!(target: "studio", "recording started");
        true
    }

    async fn stop_recording(&self) -> Option<Vec<u8>> {
        let audio = self.buffer.lock().take();
        match &audio {
            Some(a) => info!(target: "studio", bytes = a.len(), "recording stopped"),
            None => warn!(target: "studio", "no active recording to stop"),
        }
        audio
    }

    fn is_recording(&self) -> bool { self.buffer.lock().is_some() }

    fn push_chunk(&self, chunk: &[u8]) -> bool {
        match self.buffer.lock().as_mut() {
            Some(buf) => {
                buf.extend_from_slice(chunk);
                true
            }
            None => false,
        }
    }

    async fn upload_audio(&self, audio: Vec<u8>, metadata: &UploadMetadata) -> Result<String> {
        if audio.is_empty() {
            return Err(anyhow!("empty recording"));
        }
        if !self.upload_latency.is_zero() { tokio::time::sleep(self.upload_latency).await; }
        let recording_id = short_id();
        info!(target: "studio", %recording_id, title = %metadata.title, staff = %metadata.staff_id, bytes = audio.len(), "audio uploaded");
        Ok(recording_id)
    }
}
