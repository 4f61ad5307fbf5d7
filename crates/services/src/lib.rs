#![forbid(unsafe_code)]

pub mod answer_service;
pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod progress;

pub use lifestory_core::Clock;
pub use lifestory_core::progress::ProgressSettings;

pub use answer_service::{AnswerInput, AnswerService};
pub use app_services::AppServices;
pub use catalog_service::{CatalogService, ImportReport, RejectedRow};
pub use error::{AnswerServiceError, AppServicesError, CatalogServiceError, ProgressServiceError};
pub use progress::{ProgressService, ProgressSnapshot};
