use lifestory_core::model::{ProjectId, QuestionDraft, QuestionId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{AnswerRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn project_id_to_i64(id: ProjectId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("project_id overflow".into()))
}

pub(crate) fn project_id_from_i64(v: i64) -> Result<ProjectId, StorageError> {
    u64::try_from(v)
        .map(ProjectId::new)
        .map_err(|_| StorageError::Serialization("project_id sign overflow".into()))
}

pub(crate) fn question_id_from_str(raw: String) -> Result<QuestionId, StorageError> {
    QuestionId::new(raw).ok_or_else(|| StorageError::Serialization("blank question_id".into()))
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<QuestionDraft, StorageError> {
    Ok(QuestionDraft {
        id: Some(row.try_get::<String, _>("id").map_err(ser)?),
        text: row.try_get("text").map_err(ser)?,
        chapter: row.try_get("chapter").map_err(ser)?,
        order: row.try_get("sort_order").map_err(ser)?,
    })
}

pub(crate) fn map_answer_row(row: &SqliteRow) -> Result<AnswerRecord, StorageError> {
    let duration_secs = row
        .try_get::<Option<i64>, _>("duration_secs")
        .map_err(ser)?
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| StorageError::Serialization(format!("invalid duration_secs: {v}")))
        })
        .transpose()?;

    Ok(AnswerRecord {
        id: Some(row.try_get("id").map_err(ser)?),
        project_id: project_id_from_i64(row.try_get("project_id").map_err(ser)?)?,
        question_id: question_id_from_str(row.try_get("question_id").map_err(ser)?)?,
        recorded_at: row.try_get("recorded_at").map_err(ser)?,
        duration_secs,
        transcript: row.try_get("transcript").map_err(ser)?,
    })
}
