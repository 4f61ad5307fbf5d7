use std::collections::{BTreeMap, BTreeSet};

use lifestory_core::model::{Chapter, ChapterName, ProjectId, QuestionDraft, QuestionId};
use lifestory_core::progress::{
    ChapterView, ProgressSettings, compute_chapter_views, group_into_chapters,
};
use storage::repository::{AnswerRepository, QuestionRepository, ViewStateRepository};
use tracing::warn;

use crate::error::ProgressServiceError;

/// A consistent read of everything the engine needs for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub project_id: ProjectId,
    pub chapters: Vec<Chapter>,
    pub completed: BTreeSet<QuestionId>,
    pub expanded: BTreeMap<ChapterName, bool>,
    /// Catalog rows dropped at validation.
    pub rejected_rows: usize,
}

impl ProgressSnapshot {
    pub(crate) async fn load(
        project_id: ProjectId,
        questions: &dyn QuestionRepository,
        answers: &dyn AnswerRepository,
        view_state: &dyn ViewStateRepository,
    ) -> Result<Self, ProgressServiceError> {
        let rows = questions.list_questions().await?;
        let (chapters, rejected_rows) = validate_catalog(rows);
        let completed = answers.answered_question_ids(project_id).await?;
        let expanded = view_state.load_expanded(project_id).await?;

        Ok(Self {
            project_id,
            chapters,
            completed,
            expanded,
            rejected_rows,
        })
    }

    #[must_use]
    pub fn views(&self, settings: &ProgressSettings) -> Vec<ChapterView> {
        compute_chapter_views(&self.chapters, &self.completed, &self.expanded, settings)
    }
}

/// Validates raw rows and groups the survivors. Returns the rejected count.
pub(crate) fn validate_catalog(rows: Vec<QuestionDraft>) -> (Vec<Chapter>, usize) {
    let mut rejected = 0;
    let questions = rows.into_iter().filter_map(|row| {
        let raw_id = row.id.clone();
        match row.validate() {
            Ok(question) => Some(question),
            Err(err) => {
                warn!(question_id = ?raw_id, error = %err, "skipping invalid catalog row");
                rejected += 1;
                None
            }
        }
    });
    let chapters = group_into_chapters(questions.collect::<Vec<_>>());
    (chapters, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_rows_are_counted_and_dropped() {
        let rows = vec![
            QuestionDraft::new("ok-1", "Fine").in_chapter("Career"),
            QuestionDraft::new("bad-1", "  "),
            QuestionDraft {
                text: Some("no id".into()),
                ..QuestionDraft::default()
            },
            QuestionDraft::new("ok-2", "Also fine"),
        ];

        let (chapters, rejected) = validate_catalog(rows);
        assert_eq!(rejected, 2);
        let labels: Vec<&str> = chapters.iter().map(|c| c.name.label()).collect();
        assert_eq!(labels, vec!["Career", "Uncategorized"]);
    }
}
