//! Lecture capture and study-aid collaborators. Every implementation here is a
//! simulated stand-in; real capture and inference plug in behind the traits.

mod types;
mod media;
mod board;
mod generator;
mod pipeline;

pub use types::{BoardImage, Flashcard, Note, Quiz, QuizOption, QuizQuestion, StudyAidBundle, UploadMetadata};
pub use media::{MediaCapture, SimulatedRecorder};
pub use board::{BoardCapture, SimulatedBoardCamera, DEFAULT_CAPTURE_INTERVAL};
pub use generator::{CannedGenerator, StudyAidGenerator};
pub use pipeline::LecturePipeline;
