use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{chapter::ChapterName, ids::QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    MissingId,

    #[error("question {id} has no text")]
    EmptyText { id: QuestionId },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// An immutable catalog question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    chapter: ChapterName,
    order: i64,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if `text` is blank.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        chapter: ChapterName,
        order: i64,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_owned();
        if text.is_empty() {
            return Err(QuestionError::EmptyText { id });
        }
        Ok(Self {
            id,
            text,
            chapter,
            order,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn chapter(&self) -> &ChapterName {
        &self.chapter
    }

    #[must_use]
    pub fn order(&self) -> i64 {
        self.order
    }

    /// Sort key inside a chapter: `order`, then id.
    #[must_use]
    pub fn sort_key(&self) -> (i64, &QuestionId) {
        (self.order, &self.id)
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// A loosely typed catalog row, as it arrives from storage or an import file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: Option<String>,
    pub text: Option<String>,
    pub chapter: Option<String>,
    pub order: Option<i64>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: Some(text.into()),
            chapter: None,
            order: None,
        }
    }

    #[must_use]
    pub fn in_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Validate the row into a `Question`.
    ///
    /// A missing chapter becomes `Uncategorized` and a missing order becomes
    /// `0`; a missing id or text rejects the row.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id or text is missing or blank.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = self
            .id
            .and_then(QuestionId::new)
            .ok_or(QuestionError::MissingId)?;
        let chapter = ChapterName::parse(self.chapter.as_deref());
        Question::new(id, self.text.unwrap_or_default(), chapter, self.order.unwrap_or(0))
    }
}

impl From<&Question> for QuestionDraft {
    fn from(question: &Question) -> Self {
        Self {
            id: Some(question.id.as_str().to_owned()),
            text: Some(question.text.clone()),
            chapter: Some(question.chapter.label().to_owned()),
            order: Some(question.order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::chapter::CanonicalChapter;

    #[test]
    fn draft_defaults_chapter_and_order() {
        let question = QuestionDraft::new("q1", "Where were you born?")
            .validate()
            .unwrap();
        assert_eq!(question.chapter(), &ChapterName::uncategorized());
        assert_eq!(question.order(), 0);
    }

    #[test]
    fn draft_rejects_missing_id_and_text() {
        let err = QuestionDraft {
            text: Some("hi".into()),
            ..QuestionDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, QuestionError::MissingId);

        let err = QuestionDraft::new("q1", "   ").validate().unwrap_err();
        assert!(matches!(err, QuestionError::EmptyText { .. }));
    }

    #[test]
    fn draft_round_trips_through_question() {
        let question = QuestionDraft::new("q7", "First pet?")
            .in_chapter("Childhood")
            .with_order(3)
            .validate()
            .unwrap();
        assert_eq!(
            question.chapter(),
            &ChapterName::Canonical(CanonicalChapter::Childhood)
        );
        let again = QuestionDraft::from(&question).validate().unwrap();
        assert_eq!(again, question);
    }
}
