mod chapter;
mod ids;
mod question;

pub use chapter::{CanonicalChapter, Chapter, ChapterName, UNCATEGORIZED};
pub use ids::{ParseIdError, ProjectId, QuestionId};
pub use question::{Question, QuestionDraft, QuestionError};
