use std::sync::Arc;

use lifestory_core::progress::ProgressSettings;
use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::answer_service::AnswerService;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::progress::ProgressService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    answers: Arc<AnswerService>,
    catalog: Arc<CatalogService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: ProgressSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        info!(db_url, "opened sqlite storage");
        Ok(Self::from_storage(&storage, clock, settings))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, settings: ProgressSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: ProgressSettings) -> Self {
        let progress = Arc::new(ProgressService::from_storage(settings, storage));
        let answers = Arc::new(AnswerService::new(
            clock,
            Arc::clone(&progress),
            Arc::clone(&storage.answers),
        ));
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.questions)));

        Self {
            progress,
            answers,
            catalog,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn answers(&self) -> Arc<AnswerService> {
        Arc::clone(&self.answers)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }
}
