use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use super::types::{short_id, Flashcard, Note, Quiz, QuizOption, QuizQuestion};

/// Transcription and study-aid generation.
#[async_trait]
pub trait StudyAidGenerator: Send + Sync {
    async fn transcribe_audio(&self, recording_id: &str, audio: &[u8]) -> Result<String>;
    async fn generate_notes(&self, recording_id: &str, title: &str, transcription: &str) -> Result<Note>;
    async fn generate_flashcards(&self, recording_id: &str, note_id: &str, transcription: &str) -> Result<Vec<Flashcard>>;
    async fn generate_quiz(&self, recording_id: &str, note_id: &str, title: &str, transcription: &str) -> Result<Quiz>;
}

const CANNED_TRANSCRIPT: &str = "Today we covered the basics of algorithm analysis. \
Big O notation describes an upper bound on how running time grows with input size. \
A hash table stores key value pairs and offers constant expected lookup time. \
Binary search finds an item in a sorted array by halving the search range at every step. \
Recursion solves a problem by reducing it to smaller instances of the same problem.";

const GLOSSARY: &[(&str, &str)] = &[
    ("Big O Notation", "An upper bound on how an algorithm's running time or space grows with input size."),
    ("Hash Table", "A structure mapping keys to values with constant expected lookup time."),
    ("Binary Search", "Finding an item in a sorted array by halving the search range at every step."),
    ("Recursion", "Solving a problem by reducing it to smaller instances of the same problem."),
];

const OPTION_IDS: [&str; 4] = ["a", "b", "c", "d"];

/// Returns fixed lecture content after a simulated processing delay. Terms are
/// only used when they actually occur in the transcription.
pub struct CannedGenerator {
    latency: Duration,
}

impl Default for CannedGenerator {
    fn default() -> Self { Self { latency: Duration::ZERO } }
}

impl CannedGenerator {
    pub fn new(latency: Duration) -> Self { Self { latency } }

    async fn think(&self) {
        if !self.latency.is_zero() { tokio::time::sleep(self.latency).await; }
    }

    fn terms_in(transcription: &str) -> Vec<(&'static str, &'static str)> {
        let lower = transcription.to_lowercase();
        GLOSSARY.iter().copied().filter(|(term, _)| lower.contains(&term.to_lowercase())).collect()
    }
}

#[async_trait]
impl StudyAidGenerator for CannedGenerator {
    async fn transcribe_audio(&self, recording_id: &str, audio: &[u8]) -> Result<String> {
        if audio.is_empty() { return Err(anyhow!("nothing to transcribe for recording {}", recording_id)); }
        self.think().await;
        info!(target: "studio", %recording_id, "transcription completed");
        Ok(CANNED_TRANSCRIPT.to_string())
    }

    async fn generate_notes(&self, recording_id: &str, title: &str, transcription: &str) -> Result<Note> {
        self.think().await;
        let mut content = format!("# {}\n\n## Summary\n", title);
        content.push_str(transcription.split(". ").next().unwrap_or("").trim_end_matches('.'));
        content.push_str(".\n\n## Key Topics\n");
        for (term, definition) in Self::terms_in(transcription) {
            content.push_str(&format!("\n### {}\n- {}\n", term, definition));
        }
        info!(target: "studio", %recording_id, "notes generated");
        Ok(Note {
            id: short_id(),
            title: title.to_string(),
            content,
            recording_id: recording_id.to_string(),
            date: Utc::now(),
            course: None,
            board_images: Vec::new(),
        })
    }

    async fn generate_flashcards(&self, recording_id: &str, note_id: &str, transcription: &str) -> Result<Vec<Flashcard>> {
        self.think().await;
        let now = Utc::now();
        let cards: Vec<Flashcard> = Self::terms_in(transcription)
            .into_iter()
            .map(|(term, definition)| Flashcard {
                id: short_id(),
                term: term.to_string(),
                definition: definition.to_string(),
                note_id: note_id.to_string(),
                recording_id: recording_id.to_string(),
                course: None,
                created_at: now,
            })
            .collect();
        info!(target: "studio", %recording_id, count = cards.len(), "flashcards generated");
        Ok(cards)
    }

    async fn generate_quiz(&self, recording_id: &str, note_id: &str, title: &str, transcription: &str) -> Result<Quiz> {
        self.think().await;
        let terms = Self::terms_in(transcription);
        if terms.is_empty() { return Err(anyhow!("no quiz material in transcription")); }
        let questions = terms
            .iter()
            .enumerate()
            .map(|(i, (term, definition))| {
                // correct answer moves through the option slots; the rest are other definitions
                let n = terms.len().min(OPTION_IDS.len());
                let correct_slot = i % n;
                let mut distractors = terms.iter().filter(|(t, _)| t != term).map(|(_, d)| *d);
                let options: Vec<QuizOption> = (0..n)
                    .map(|slot| {
                        let text = if slot == correct_slot { *definition } else { distractors.next().unwrap_or(*definition) };
                        QuizOption { id: OPTION_IDS[slot].to_string(), text: text.to_string() }
                    })
                    .collect();
                QuizQuestion {
                    id: short_id(),
                    question: format!("Which statement best describes {}?", term),
                    options,
                    correct_option_id: OPTION_IDS[correct_slot].to_string(),
                    explanation: Some(format!("{}: {}", term, definition)),
                }
            })
            .collect();
        info!(target: "studio", %recording_id, "quiz generated");
        Ok(Quiz {
            id: short_id(),
            title: format!("Quiz: {}", title),
            description: Some("Test your understanding of the key concepts from this lecture.".into()),
            questions,
            note_id: Some(note_id.to_string()),
            recording_id: Some(recording_id.to_string()),
            course: None,
            created_at: Utc::now(),
            created_by: "system".into(),
            automated: true,
        })
    }
}
