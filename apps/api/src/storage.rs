//! Transcript persistence for consenting candidates.
//!
//! Saving is best-effort: callers log a `StorageError` and carry on.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::conversation::engine::{Answer, Turn};
use crate::intake::profile::CandidateProfile;
use crate::questions::selector::Question;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything persisted for one finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTranscript {
    pub id: Uuid,
    pub ts: i64,
    pub profile: CandidateProfile,
    pub messages: Vec<Turn>,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
}

#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Persists the transcript and returns where it was written.
    async fn save(&self, transcript: &SessionTranscript) -> Result<String, StorageError>;
}

/// Writes one pretty-printed JSON file per transcript:
/// `<base_dir>/<unix_ts>_<session_id>.json`.
#[derive(Debug, Clone)]
pub struct LocalJsonStore {
    base_dir: PathBuf,
}

impl LocalJsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, transcript: &SessionTranscript) -> PathBuf {
        self.base_dir
            .join(format!("{}_{}.json", transcript.ts, transcript.id))
    }
}

#[async_trait]
impl TranscriptStore for LocalJsonStore {
    async fn save(&self, transcript: &SessionTranscript) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let path = self.file_path(transcript);
        let body = serde_json::to_vec_pretty(transcript)?;
        tokio::fs::write(&path, body).await?;

        info!("Saved transcript for session {} to {}", transcript.id, path.display());
        Ok(path.display().to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::engine::Speaker;
    use crate::questions::selector::QuestionSource;
    use crate::sentiment::SentimentLabel;

    fn transcript() -> SessionTranscript {
        SessionTranscript {
            id: Uuid::new_v4(),
            ts: 1_700_000_000,
            profile: CandidateProfile {
                full_name: Some("Jane Doe".to_string()),
                ..Default::default()
            },
            messages: vec![Turn {
                speaker: Speaker::User,
                text: "Jane Doe".to_string(),
            }],
            questions: vec![Question {
                text: "What is a closure?".to_string(),
                source: QuestionSource::Keyword("javascript".to_string()),
            }],
            answers: vec![Answer {
                question_index: 0,
                text: "A function with captured scope".to_string(),
                sentiment: Some(SentimentLabel::Neutral),
            }],
        }
    }

    #[tokio::test]
    async fn test_local_store_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalJsonStore::new(dir.path().join("transcripts"));
        let t = transcript();

        let path = store.save(&t).await.unwrap();
        assert!(path.ends_with(&format!("1700000000_{}.json", t.id)));

        let raw = std::fs::read_to_string(&path).unwrap();
        let loaded: SessionTranscript = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded.id, t.id);
        assert_eq!(loaded.profile.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(loaded.answers[0].sentiment, Some(SentimentLabel::Neutral));
    }

    #[tokio::test]
    async fn test_local_store_reports_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let store = LocalJsonStore::new(&blocker);
        let err = store.save(&transcript()).await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
