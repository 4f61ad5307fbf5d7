use std::sync::Arc;

use lifestory_core::model::{ProjectId, QuestionId};
use lifestory_core::navigation::{ClickOutcome, ClickRejection};
use storage::repository::{AnswerRecord, AnswerRepository};
use tracing::info;

use crate::Clock;
use crate::error::AnswerServiceError;
use crate::progress::ProgressService;

/// Optional metadata captured with an answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerInput {
    pub duration_secs: Option<u32>,
    pub transcript: Option<String>,
}

/// Records answers, applying the same lock policy as a click.
#[derive(Clone)]
pub struct AnswerService {
    clock: Clock,
    progress: Arc<ProgressService>,
    answers: Arc<dyn AnswerRepository>,
}

impl AnswerService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<ProgressService>,
        answers: Arc<dyn AnswerRepository>,
    ) -> Self {
        Self {
            clock,
            progress,
            answers,
        }
    }

    /// Record an answer for a question the user is allowed to act on.
    ///
    /// Completed questions may be answered again; each call appends a record.
    /// The lock check reads one snapshot before the append and is best-effort:
    /// a concurrent answer deletion can relock the node in between.
    ///
    /// # Errors
    ///
    /// Returns `AnswerServiceError::UnknownQuestion` or `AnswerServiceError::Locked`
    /// when the click policy would reject the question, or a storage error.
    pub async fn record_answer(
        &self,
        project_id: ProjectId,
        question_id: &QuestionId,
        input: AnswerInput,
    ) -> Result<AnswerRecord, AnswerServiceError> {
        match self.progress.click(project_id, question_id).await? {
            ClickOutcome::Navigate { .. } => {}
            ClickOutcome::Rejected(ClickRejection::Locked { question_id, .. }) => {
                return Err(AnswerServiceError::Locked(question_id));
            }
            ClickOutcome::Rejected(ClickRejection::UnknownQuestion { question_id }) => {
                return Err(AnswerServiceError::UnknownQuestion(question_id));
            }
        }

        let mut record = AnswerRecord {
            duration_secs: input.duration_secs,
            transcript: input
                .transcript
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty()),
            ..AnswerRecord::new(project_id, question_id.clone(), self.clock.now())
        };
        let id = self.answers.append_answer(&record).await?;
        record.id = Some(id);

        info!(project = %project_id, question = %question_id, answer_id = id, "recorded answer");
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns `AnswerServiceError::Storage` on repository failures.
    pub async fn answers_for(
        &self,
        project_id: ProjectId,
        question_id: &QuestionId,
    ) -> Result<Vec<AnswerRecord>, AnswerServiceError> {
        Ok(self.answers.list_answers(project_id, question_id).await?)
    }

    /// Remove a single answer. The question reverts to not completed once none remain.
    ///
    /// # Errors
    ///
    /// Returns `AnswerServiceError::Storage` if the answer does not exist or
    /// the repository fails.
    pub async fn delete_answer(&self, answer_id: i64) -> Result<(), AnswerServiceError> {
        self.answers.delete_answer(answer_id).await?;
        info!(answer_id, "deleted answer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifestory_core::model::QuestionDraft;
    use lifestory_core::progress::ProgressSettings;
    use lifestory_core::time::{fixed_clock, fixed_now};
    use storage::repository::{QuestionRepository, Storage};

    async fn service() -> AnswerService {
        let storage = Storage::in_memory();
        for i in 1..=6 {
            let q = QuestionDraft::new(format!("c1-{i}"), format!("Q{i}"))
                .in_chapter("Childhood")
                .with_order(i)
                .validate()
                .unwrap();
            storage.questions.upsert_question(&q).await.unwrap();
        }
        let progress = Arc::new(ProgressService::from_storage(
            ProgressSettings::default(),
            &storage,
        ));
        AnswerService::new(fixed_clock(), progress, Arc::clone(&storage.answers))
    }

    fn qid(raw: &str) -> QuestionId {
        QuestionId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn records_available_question_with_clock_time() {
        let svc = service().await;
        let project = ProjectId::new(1);

        let record = svc
            .record_answer(
                project,
                &qid("c1-1"),
                AnswerInput {
                    duration_secs: Some(30),
                    transcript: Some("  ".into()),
                },
            )
            .await
            .unwrap();

        assert!(record.id.is_some());
        assert_eq!(record.recorded_at, fixed_now());
        assert_eq!(record.transcript, None);
        assert_eq!(svc.answers_for(project, &qid("c1-1")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn refuses_locked_and_unknown_questions() {
        let svc = service().await;
        let project = ProjectId::new(1);

        let err = svc
            .record_answer(project, &qid("c1-6"), AnswerInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerServiceError::Locked(_)));

        let err = svc
            .record_answer(project, &qid("missing"), AnswerInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerServiceError::UnknownQuestion(_)));
    }

    #[tokio::test]
    async fn answering_advances_the_window() {
        let svc = service().await;
        let project = ProjectId::new(1);

        svc.record_answer(project, &qid("c1-1"), AnswerInput::default())
            .await
            .unwrap();
        // c1-6 enters the window once c1-1 is done.
        svc.record_answer(project, &qid("c1-6"), AnswerInput::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn deleting_answer_reopens_question() {
        let svc = service().await;
        let project = ProjectId::new(1);
        let record = svc
            .record_answer(project, &qid("c1-1"), AnswerInput::default())
            .await
            .unwrap();

        svc.delete_answer(record.id.unwrap()).await.unwrap();
        assert!(svc.answers_for(project, &qid("c1-1")).await.unwrap().is_empty());
        assert!(matches!(
            svc.delete_answer(record.id.unwrap()).await,
            Err(AnswerServiceError::Storage(_))
        ));
    }
}
