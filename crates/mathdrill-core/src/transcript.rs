//! JSON record of a practice session.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::controller::SessionController;
use crate::model::CycleRecord;
use crate::score::ScoreBoard;

/// Everything graded during one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTranscript {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    pub score: ScoreBoard,
    /// Accuracy in percent, absent when nothing was graded.
    pub accuracy: Option<f64>,
    pub cycles: Vec<CycleRecord>,
}

impl SessionTranscript {
    /// Snapshot the controller's session as of now.
    pub fn from_controller(controller: &SessionController) -> Self {
        let score = *controller.score();
        Self {
            session_id: controller.session_id(),
            started_at: controller.started_at(),
            finished_at: Utc::now(),
            provider: controller.provider_name().to_string(),
            model: controller.model().to_string(),
            score,
            accuracy: score.accuracy(),
            cycles: controller.history().to_vec(),
        }
    }

    /// Save the transcript as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize transcript")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create transcript directory {}", parent.display())
            })?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write transcript to {}", path.display()))?;
        Ok(())
    }

    /// Load a transcript from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse transcript JSON")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::controller::ControllerConfig;
    use crate::model::Difficulty;
    use crate::traits::{GenerateRequest, GenerateResponse, LlmProvider, ModelInfo};

    struct NullProvider;

    #[async_trait]
    impl LlmProvider for NullProvider {
        fn name(&self) -> &str {
            "null"
        }

        async fn generate(&self, _request: &GenerateRequest) -> Result<GenerateResponse> {
            anyhow::bail!("offline")
        }

        fn available_models(&self) -> Vec<ModelInfo> {
            vec![]
        }
    }

    #[test]
    fn empty_session_snapshot() {
        let controller = SessionController::new(
            Arc::new(NullProvider),
            ControllerConfig {
                initial_difficulty: Difficulty::Easy,
                ..ControllerConfig::default()
            },
        );
        let transcript = SessionTranscript::from_controller(&controller);

        assert_eq!(transcript.session_id, controller.session_id());
        assert_eq!(transcript.provider, "null");
        assert_eq!(transcript.score.total, 0);
        assert_eq!(transcript.accuracy, None);
        assert!(transcript.cycles.is_empty());
        assert!(transcript.finished_at >= transcript.started_at);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let transcript = SessionTranscript {
            session_id: Uuid::nil(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            provider: "mock".into(),
            model: "mock-model".into(),
            score: ScoreBoard {
                correct: 1,
                total: 2,
            },
            accuracy: Some(50.0),
            cycles: vec![CycleRecord {
                difficulty: Difficulty::Medium,
                problem: "What is 10 / 4?".into(),
                answer: "2.5".into(),
                is_correct: true,
                explanation: "10 / 4 = 2.5".into(),
                graded_at: Utc::now(),
            }],
        };

        transcript.save_json(&path).unwrap();
        let loaded = SessionTranscript::load_json(&path).unwrap();

        assert_eq!(loaded.score.display(), "1 / 2");
        assert_eq!(loaded.cycles.len(), 1);
        assert_eq!(loaded.cycles[0].difficulty, Difficulty::Medium);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"difficulty\": \"medium\""));
    }

    #[test]
    fn save_reports_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, "not a directory").unwrap();

        let controller =
            SessionController::new(Arc::new(NullProvider), ControllerConfig::default());
        let err = SessionTranscript::from_controller(&controller)
            .save_json(&blocker.join("session.json"))
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("failed to create transcript directory"));
        assert!(message.contains("taken"));
    }
}
