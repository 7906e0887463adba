mod ids;
mod module;
mod progress;
mod question;

pub use ids::{CourseId, ModuleId, ParseIdError, QuestionId, UserId};

pub use module::{Module, ModuleError, QuizSettings};
pub use progress::{ModuleProgress, ProgressError};
pub use question::{QuestionError, QuestionPayload, QuizQuestion, SubmittedAnswer};
