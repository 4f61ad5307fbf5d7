use std::sync::Arc;

use lifestory_core::model::{ChapterName, ProjectId, QuestionId};
use lifestory_core::navigation::{ClickOutcome, resolve_click};
use lifestory_core::progress::{ChapterView, ProgressOverview, ProgressSettings, summarize};
use storage::repository::{AnswerRepository, QuestionRepository, Storage, ViewStateRepository};
use tracing::debug;

use super::snapshot::ProgressSnapshot;
use crate::error::ProgressServiceError;

/// Presentation-facing facade over the chapter progress engine.
///
/// Every call reads a fresh snapshot; nothing is cached between calls.
#[derive(Clone)]
pub struct ProgressService {
    settings: ProgressSettings,
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
    view_state: Arc<dyn ViewStateRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        settings: ProgressSettings,
        questions: Arc<dyn QuestionRepository>,
        answers: Arc<dyn AnswerRepository>,
        view_state: Arc<dyn ViewStateRepository>,
    ) -> Self {
        Self {
            settings,
            questions,
            answers,
            view_state,
        }
    }

    #[must_use]
    pub fn from_storage(settings: ProgressSettings, storage: &Storage) -> Self {
        Self::new(
            settings,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.answers),
            Arc::clone(&storage.view_state),
        )
    }

    #[must_use]
    pub fn settings(&self) -> &ProgressSettings {
        &self.settings
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn snapshot(
        &self,
        project_id: ProjectId,
    ) -> Result<ProgressSnapshot, ProgressServiceError> {
        ProgressSnapshot::load(
            project_id,
            self.questions.as_ref(),
            self.answers.as_ref(),
            self.view_state.as_ref(),
        )
        .await
    }

    /// Compute chapter views for a project.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn chapter_views(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ChapterView>, ProgressServiceError> {
        let snapshot = self.snapshot(project_id).await?;
        let views = snapshot.views(&self.settings);
        debug!(
            project = %project_id,
            chapters = views.len(),
            completed = snapshot.completed.len(),
            rejected_rows = snapshot.rejected_rows,
            "computed chapter views"
        );
        Ok(views)
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn overview(
        &self,
        project_id: ProjectId,
    ) -> Result<ProgressOverview, ProgressServiceError> {
        let views = self.chapter_views(project_id).await?;
        Ok(summarize(&views, &self.settings))
    }

    /// Resolve a click on a question against the current state.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures. A locked
    /// or unknown question is an `Ok(ClickOutcome::Rejected(..))`.
    pub async fn click(
        &self,
        project_id: ProjectId,
        question_id: &QuestionId,
    ) -> Result<ClickOutcome, ProgressServiceError> {
        let views = self.chapter_views(project_id).await?;
        let outcome = resolve_click(&views, question_id);
        debug!(project = %project_id, question = %question_id, ?outcome, "resolved click");
        Ok(outcome)
    }

    /// Persist whether a chapter is manually expanded.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn set_expanded(
        &self,
        project_id: ProjectId,
        chapter: &ChapterName,
        expanded: bool,
    ) -> Result<(), ProgressServiceError> {
        self.view_state
            .save_expanded(project_id, chapter, expanded)
            .await?;
        Ok(())
    }
}
