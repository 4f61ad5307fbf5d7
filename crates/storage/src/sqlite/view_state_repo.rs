use std::collections::BTreeMap;

use lifestory_core::model::{ChapterName, ProjectId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{project_id_to_i64, ser},
};
use crate::repository::{StorageError, ViewStateRepository};

#[async_trait::async_trait]
impl ViewStateRepository for SqliteRepository {
    async fn load_expanded(
        &self,
        project_id: ProjectId,
    ) -> Result<BTreeMap<ChapterName, bool>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT chapter, expanded
                FROM chapter_view_state
                WHERE project_id = ?1
            ",
        )
        .bind(project_id_to_i64(project_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut state = BTreeMap::new();
        for row in rows {
            let chapter: String = row.try_get("chapter").map_err(ser)?;
            let expanded: i64 = row.try_get("expanded").map_err(ser)?;
            state.insert(ChapterName::parse(Some(&chapter)), expanded != 0);
        }
        Ok(state)
    }

    async fn save_expanded(
        &self,
        project_id: ProjectId,
        chapter: &ChapterName,
        expanded: bool,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO chapter_view_state (project_id, chapter, expanded)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(project_id, chapter) DO UPDATE SET
                    expanded = excluded.expanded
            ",
        )
        .bind(project_id_to_i64(project_id)?)
        .bind(chapter.label())
        .bind(i64::from(expanded))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
