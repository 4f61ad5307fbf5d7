use std::sync::Arc;

use lifestory_core::model::{Question, QuestionDraft, QuestionError, QuestionId};
use serde::Serialize;
use storage::repository::QuestionRepository;
use tracing::{info, warn};

use crate::error::CatalogServiceError;

/// A row refused during import, by its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub position: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub rejected: Vec<RejectedRow>,
}

/// Maintains the question catalog.
#[derive(Clone)]
pub struct CatalogService {
    questions: Arc<dyn QuestionRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    /// Validate and upsert a batch of rows. Invalid rows are reported, not fatal.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if persistence fails.
    pub async fn import(
        &self,
        drafts: Vec<QuestionDraft>,
    ) -> Result<ImportReport, CatalogServiceError> {
        let mut report = ImportReport::default();
        for (position, draft) in drafts.into_iter().enumerate() {
            match draft.validate() {
                Ok(question) => {
                    self.questions.upsert_question(&question).await?;
                    report.imported += 1;
                }
                Err(err) => {
                    warn!(position, error = %err, "rejected catalog row");
                    report.rejected.push(RejectedRow {
                        position,
                        reason: err.to_string(),
                    });
                }
            }
        }
        info!(
            imported = report.imported,
            rejected = report.rejected.len(),
            "imported catalog"
        );
        Ok(report)
    }

    /// Valid questions in the catalog, sorted by chapter then order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` on repository failures.
    pub async fn list(&self) -> Result<Vec<Question>, CatalogServiceError> {
        let rows = self.questions.list_questions().await?;
        let mut questions: Vec<Question> = rows
            .into_iter()
            .filter_map(|row| row.validate().map_err(log_invalid).ok())
            .collect();
        questions.sort_by(|a, b| {
            (a.chapter(), a.order(), a.id()).cmp(&(b.chapter(), b.order(), b.id()))
        });
        Ok(questions)
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if the question does not exist
    /// or the repository fails.
    pub async fn remove(&self, id: &QuestionId) -> Result<(), CatalogServiceError> {
        self.questions.delete_question(id).await?;
        info!(question = %id, "removed question");
        Ok(())
    }
}

fn log_invalid(err: QuestionError) -> QuestionError {
    warn!(error = %err, "skipping invalid catalog row");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{InMemoryRepository, StorageError};

    #[tokio::test]
    async fn import_reports_rejected_positions() {
        let repo = InMemoryRepository::new();
        let svc = CatalogService::new(Arc::new(repo.clone()));

        let report = svc
            .import(vec![
                QuestionDraft::new("a", "First").in_chapter("Career"),
                QuestionDraft::new("b", ""),
                QuestionDraft::new("c", "Third").in_chapter("Childhood"),
            ])
            .await
            .unwrap();

        assert_eq!(report.imported, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].position, 1);

        let listed: Vec<String> = svc
            .list()
            .await
            .unwrap()
            .iter()
            .map(|q| q.id().to_string())
            .collect();
        assert_eq!(listed, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn remove_missing_question_is_not_found() {
        let svc = CatalogService::new(Arc::new(InMemoryRepository::new()));
        let err = svc
            .remove(&QuestionId::new("ghost").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogServiceError::Storage(StorageError::NotFound)
        ));
    }
}
