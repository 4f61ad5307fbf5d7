use std::collections::BTreeSet;

use lifestory_core::model::{ProjectId, QuestionId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{map_answer_row, project_id_to_i64, question_id_from_str, ser},
};
use crate::repository::{AnswerRecord, AnswerRepository, StorageError};

#[async_trait::async_trait]
impl AnswerRepository for SqliteRepository {
    async fn append_answer(&self, answer: &AnswerRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO answers (project_id, question_id, recorded_at, duration_secs, transcript)
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(project_id_to_i64(answer.project_id)?)
        .bind(answer.question_id.as_str())
        .bind(answer.recorded_at)
        .bind(answer.duration_secs.map(i64::from))
        .bind(answer.transcript.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn list_answers(
        &self,
        project_id: ProjectId,
        question_id: &QuestionId,
    ) -> Result<Vec<AnswerRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, project_id, question_id, recorded_at, duration_secs, transcript
                FROM answers
                WHERE project_id = ?1 AND question_id = ?2
                ORDER BY recorded_at ASC, id ASC
            ",
        )
        .bind(project_id_to_i64(project_id)?)
        .bind(question_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_answer_row).collect()
    }

    async fn answered_question_ids(
        &self,
        project_id: ProjectId,
    ) -> Result<BTreeSet<QuestionId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT DISTINCT question_id
                FROM answers
                WHERE project_id = ?1
            ",
        )
        .bind(project_id_to_i64(project_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| question_id_from_str(row.try_get("question_id").map_err(ser)?))
            .collect()
    }

    async fn delete_answer(&self, id: i64) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM answers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
