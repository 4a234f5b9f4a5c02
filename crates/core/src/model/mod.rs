pub mod course;
mod ids;
pub mod lesson;
pub mod milestone;
mod progress;
pub mod quiz;

pub use course::{AdvancedAccess, CourseError, CourseLayout, SessionSpec};
pub use ids::{IdError, LanguageCode, LessonId, SessionIndex};
pub use lesson::{AudioRef, Flashcard, LessonDefinition, LessonSource};
pub use milestone::{MilestoneKey, MilestoneSpec, MilestoneTrigger};
pub use progress::{CompletionOutcome, ProgressRecord};
pub use quiz::{QuizStep, QuizStepKind};
