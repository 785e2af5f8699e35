use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info};

use super::board::BoardCapture;
use super::generator::StudyAidGenerator;
use super::media::MediaCapture;
use super::types::{short_id, BoardImage, StudyAidBundle, UploadMetadata};
use crate::error::{AppError, AppResult};

fn stage_failed(stage: &str, e: anyhow::Error) -> AppError {
    error!(target: "studio", stage, "pipeline stage failed: {}", e);
    AppError::internal(format!("{}_failed", stage), format!("Failed to {} recording", stage.replace('_', " ")))
}

// A live lecture between `start` and `finish`.
struct LiveCapture {
    // provisional id that board images are tagged with until upload assigns the real one
    id: String,
    metadata: UploadMetadata,
}

/// Chains the study-aid collaborators: upload, transcribe, notes, flashcards,
/// quiz. Live sessions additionally drive the recorder and board camera.
pub struct LecturePipeline {
    media: Arc<dyn MediaCapture>,
    board: Arc<dyn BoardCapture>,
    generator: Arc<dyn StudyAidGenerator>,
    live: Mutex<Option<LiveCapture>>,
}

impl LecturePipeline {
    pub fn new(media: Arc<dyn MediaCapture>, board: Arc<dyn BoardCapture>, generator: Arc<dyn StudyAidGenerator>) -> Self {
        Self { media, board, generator, live: Mutex::new(None) }
    }

    pub fn is_live(&self) -> bool { self.live.lock().is_some() }

    /// Start recording and, if requested, board captures. Returns the
    /// provisional capture id.
    pub async fn start(&self, metadata: &UploadMetadata) -> AppResult<String> {
        if metadata.title.trim().is_empty() {
            return Err(AppError::user("missing_title", "Recording title is required"));
        }
        let capture_id = {
            let mut live = self.live.lock();
            if live.is_some() {
                return Err(AppError::conflict("recording_active", "A recording is already in progress"));
            }
            let id = short_id();
            *live = Some(LiveCapture { id: id.clone(), metadata: metadata.clone() });
            id
        };
        if !self.media.start_recording().await {
            *self.live.lock() = None;
            return Err(AppError::io("microphone_unavailable", "Failed to access microphone"));
        }
        if metadata.capture_board {
            self.board.start_captures(&capture_id, &capture_id);
        }
        info!(target: "studio", %capture_id, title = %metadata.title, board = metadata.capture_board, "live lecture started");
        Ok(capture_id)
    }

    /// Append client-streamed audio to the live recording.
    pub fn push_chunk(&self, chunk: &[u8]) -> AppResult<usize> {
        if !self.is_live() || !self.media.push_chunk(chunk) {
            return Err(AppError::user("no_recording", "No active recording"));
        }
        Ok(chunk.len())
    }

    /// Stop the live session and process what was captured.
    pub async fn finish(&self) -> AppResult<StudyAidBundle> {
        let live = self.live.lock().take();
        let Some(live) = live else {
            return Err(AppError::user("no_recording", "No active recording to stop"));
        };
        let images: Vec<BoardImage> = self.board.stop_captures();
        let Some(audio) = self.media.stop_recording().await else {
            return Err(AppError::user("no_recording", "No active recording to stop"));
        };
        info!(target: "studio", capture_id = %live.id, board_images = images.len(), "live lecture stopped");
        self.process_with_images(audio, &live.metadata, images).await
    }

    pub async fn process(&self, audio: Vec<u8>, metadata: &UploadMetadata) -> AppResult<StudyAidBundle> {
        self.process_with_images(audio, metadata, Vec::new()).await
    }

    async fn process_with_images(&self, audio: Vec<u8>, metadata: &UploadMetadata, images: Vec<BoardImage>) -> AppResult<StudyAidBundle> {
        if metadata.title.trim().is_empty() {
            return Err(AppError::user("missing_title", "Recording title is required"));
        }
        if audio.is_empty() {
            return Err(AppError::user("empty_recording", "Recording contains no audio"));
        }
        let transcribe_input = audio.clone();
        let recording_id = self.media.upload_audio(audio, metadata).await.map_err(|e| stage_failed("upload", e))?;
        let transcription = self
            .generator
            .transcribe_audio(&recording_id, &transcribe_input)
            .await
            .map_err(|e| stage_failed("transcribe", e))?;
        let mut note = self
            .generator
            .generate_notes(&recording_id, &metadata.title, &transcription)
            .await
            .map_err(|e| stage_failed("generate_notes", e))?;
        note.board_images = images
            .into_iter()
            .map(|mut i| {
                i.recording_id = recording_id.clone();
                i.note_id = note.id.clone();
                i
            })
            .collect();
        let flashcards = self
            .generator
            .generate_flashcards(&recording_id, &note.id, &transcription)
            .await
            .map_err(|e| stage_failed("generate_flashcards", e))?;
        let quiz = self
            .generator
            .generate_quiz(&recording_id, &note.id, &metadata.title, &transcription)
            .await
            .map_err(|e| stage_failed("generate_quiz", e))?;
        info!(target: "studio", %recording_id, flashcards = flashcards.len(), questions = quiz.questions.len(), "study aids ready");
        Ok(StudyAidBundle { recording_id, transcription, note, flashcards, quiz })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::{CannedGenerator, SimulatedBoardCamera, SimulatedRecorder};
    use async_trait::async_trait;
    use std::time::Duration;

    fn meta(capture_board: bool) -> UploadMetadata {
        UploadMetadata { title: "Algorithms".into(), staff_id: "2".into(), capture_board }
    }

    fn pipeline(rec: Arc<dyn MediaCapture>, cam: Arc<SimulatedBoardCamera>) -> LecturePipeline {
        LecturePipeline::new(rec, cam, Arc::new(CannedGenerator::default()))
    }

    // Microphone that takes a while to open and may refuse.
    struct SlowMic {
        inner: SimulatedRecorder,
        opens: bool,
    }

    #[async_trait]
    impl MediaCapture for SlowMic {
        async fn start_recording(&self) -> bool {
            tokio::time::sleep(Duration::from_millis(500)).await;
            self.opens && self.inner.start_recording().await
        }
        async fn stop_recording(&self) -> Option<Vec<u8>> { self.inner.stop_recording().await }
        fn is_recording(&self) -> bool { self.inner.is_recording() }
        fn push_chunk(&self, chunk: &[u8]) -> bool { self.inner.push_chunk(chunk) }
        async fn upload_audio(&self, audio: Vec<u8>, metadata: &UploadMetadata) -> anyhow::Result<String> {
            self.inner.upload_audio(audio, metadata).await
        }
    }

    #[tokio::test]
    async fn process_links_every_artifact_to_the_recording() {
        let p = pipeline(Arc::new(SimulatedRecorder::default()), Arc::new(SimulatedBoardCamera::default()));
        let bundle = p.process(vec![0u8; 64], &meta(false)).await.unwrap();
        assert_eq!(bundle.note.recording_id, bundle.recording_id);
        assert!(bundle.flashcards.iter().all(|c| c.note_id == bundle.note.id && c.recording_id == bundle.recording_id));
        assert_eq!(bundle.quiz.note_id.as_deref(), Some(bundle.note.id.as_str()));
        assert!(!bundle.quiz.questions.is_empty());
    }

    #[tokio::test]
    async fn rejects_empty_audio_and_title() {
        let p = pipeline(Arc::new(SimulatedRecorder::default()), Arc::new(SimulatedBoardCamera::default()));
        assert_eq!(p.process(Vec::new(), &meta(false)).await.unwrap_err().http_status(), 400);
        let mut m = meta(false);
        m.title = " ".into();
        assert_eq!(p.process(vec![1], &m).await.unwrap_err().http_status(), 400);
        assert_eq!(p.start(&m).await.unwrap_err().http_status(), 400);
        assert!(!p.is_live());
    }

    #[tokio::test(start_paused = true)]
    async fn live_session_attaches_board_images() {
        let cam = Arc::new(SimulatedBoardCamera::new(Duration::from_secs(60)));
        let p = pipeline(Arc::new(SimulatedRecorder::default()), cam.clone());
        assert!(p.push_chunk(&[1u8; 4]).is_err());
        p.start(&meta(true)).await.unwrap();
        assert_eq!(p.start(&meta(true)).await.unwrap_err().http_status(), 409);
        assert_eq!(p.push_chunk(&[7u8; 32]).unwrap(), 32);
        tokio::time::sleep(Duration::from_secs(121)).await;
        let bundle = p.finish().await.unwrap();
        assert_eq!(bundle.note.title, "Algorithms");
        assert_eq!(bundle.note.board_images.len(), 2);
        assert!(bundle.note.board_images.iter().all(|i| i.note_id == bundle.note.id && i.recording_id == bundle.recording_id));
        assert!(!cam.is_capturing());
        assert!(!p.is_live());
        assert!(p.finish().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_during_slow_open_is_a_conflict() {
        let mic = Arc::new(SlowMic { inner: SimulatedRecorder::default(), opens: true });
        let p = pipeline(mic, Arc::new(SimulatedBoardCamera::default()));
        let (m1, m2) = (meta(false), meta(false));
        let (first, second) = tokio::join!(p.start(&m1), p.start(&m2));
        assert!(first.is_ok());
        assert_eq!(second.unwrap_err().code_str(), "recording_active");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_microphone_releases_the_live_slot() {
        let mic = Arc::new(SlowMic { inner: SimulatedRecorder::default(), opens: false });
        let p = pipeline(mic, Arc::new(SimulatedBoardCamera::default()));
        assert_eq!(p.start(&meta(false)).await.unwrap_err().code_str(), "microphone_unavailable");
        assert!(!p.is_live());
        assert_eq!(p.start(&meta(false)).await.unwrap_err().code_str(), "microphone_unavailable");
    }
}
