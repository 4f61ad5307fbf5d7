use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lifestory_core::model::{ChapterName, ProjectId, Question, QuestionDraft, QuestionId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// One recorded answer to a question.
///
/// A question counts as completed for a project once at least one record exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub id: Option<i64>,
    pub project_id: ProjectId,
    pub question_id: QuestionId,
    pub recorded_at: DateTime<Utc>,
    pub duration_secs: Option<u32>,
    pub transcript: Option<String>,
}

impl AnswerRecord {
    #[must_use]
    pub fn new(project_id: ProjectId, question_id: QuestionId, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            project_id,
            question_id,
            recorded_at,
            duration_secs: None,
            transcript: None,
        }
    }
}

/// Question catalog.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert or replace a question by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// All catalog rows, unvalidated. Order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decode failures.
    async fn list_questions(&self) -> Result<Vec<QuestionDraft>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no such question exists.
    async fn delete_question(&self, id: &QuestionId) -> Result<(), StorageError>;
}

/// Recorded answers, scoped per project.
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Append an answer and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_answer(&self, answer: &AnswerRecord) -> Result<i64, StorageError>;

    /// Answers to one question, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decode failures.
    async fn list_answers(
        &self,
        project_id: ProjectId,
        question_id: &QuestionId,
    ) -> Result<Vec<AnswerRecord>, StorageError>;

    /// Ids of every question with at least one answer in the project.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decode failures.
    async fn answered_question_ids(
        &self,
        project_id: ProjectId,
    ) -> Result<BTreeSet<QuestionId>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no such answer exists.
    async fn delete_answer(&self, id: i64) -> Result<(), StorageError>;
}

/// Per-project UI view state (which chapters are manually expanded).
#[async_trait]
pub trait ViewStateRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decode failures.
    async fn load_expanded(
        &self,
        project_id: ProjectId,
    ) -> Result<BTreeMap<ChapterName, bool>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the flag cannot be stored.
    async fn save_expanded(
        &self,
        project_id: ProjectId,
        chapter: &ChapterName,
        expanded: bool,
    ) -> Result<(), StorageError>;
}

#[derive(Default)]
struct AnswerLog {
    next_id: i64,
    rows: Vec<AnswerRecord>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, QuestionDraft>>>,
    answers: Arc<Mutex<AnswerLog>>,
    view_state: Arc<Mutex<BTreeMap<(ProjectId, ChapterName), bool>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw row as-is, bypassing validation. Used to simulate bad imports.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the row has no usable id.
    pub fn insert_raw_question(&self, draft: QuestionDraft) -> Result<(), StorageError> {
        let id = draft
            .id
            .clone()
            .and_then(QuestionId::new)
            .ok_or_else(|| StorageError::Serialization("question row without id".into()))?;
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id, draft);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(question.id().clone(), QuestionDraft::from(question));
        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<QuestionDraft>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().cloned().collect())
    }

    async fn delete_question(&self, id: &QuestionId) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AnswerRepository for InMemoryRepository {
    async fn append_answer(&self, answer: &AnswerRecord) -> Result<i64, StorageError> {
        let mut guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.next_id += 1;
        let id = guard.next_id;
        guard.rows.push(AnswerRecord {
            id: Some(id),
            ..answer.clone()
        });
        Ok(id)
    }

    async fn list_answers(
        &self,
        project_id: ProjectId,
        question_id: &QuestionId,
    ) -> Result<Vec<AnswerRecord>, StorageError> {
        let guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<AnswerRecord> = guard
            .rows
            .iter()
            .filter(|a| a.project_id == project_id && &a.question_id == question_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.recorded_at, a.id));
        Ok(found)
    }

    async fn answered_question_ids(
        &self,
        project_id: ProjectId,
    ) -> Result<BTreeSet<QuestionId>, StorageError> {
        let guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .rows
            .iter()
            .filter(|a| a.project_id == project_id)
            .map(|a| a.question_id.clone())
            .collect())
    }

    async fn delete_answer(&self, id: i64) -> Result<(), StorageError> {
        let mut guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.rows.len();
        guard.rows.retain(|a| a.id != Some(id));
        if guard.rows.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ViewStateRepository for InMemoryRepository {
    async fn load_expanded(
        &self,
        project_id: ProjectId,
    ) -> Result<BTreeMap<ChapterName, bool>, StorageError> {
        let guard = self
            .view_state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|((project, _), _)| *project == project_id)
            .map(|((_, chapter), expanded)| (chapter.clone(), *expanded))
            .collect())
    }

    async fn save_expanded(
        &self,
        project_id: ProjectId,
        chapter: &ChapterName,
        expanded: bool,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .view_state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((project_id, chapter.clone()), expanded);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub view_state: Arc<dyn ViewStateRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let answers: Arc<dyn AnswerRepository> = Arc::new(repo.clone());
        let view_state: Arc<dyn ViewStateRepository> = Arc::new(repo);
        Self {
            questions,
            answers,
            view_state,
        }
    }
}
