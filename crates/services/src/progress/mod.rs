mod service;
mod snapshot;

// Public API of the progress subsystem.
pub use crate::error::ProgressServiceError;
pub use service::ProgressService;
pub use snapshot::ProgressSnapshot;
