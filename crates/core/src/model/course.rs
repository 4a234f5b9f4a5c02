use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, SessionIndex};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course layout needs at least one session")]
    NoSessions,

    #[error("session {0} has no lessons")]
    EmptySession(SessionIndex),

    #[error("session index {0} is used more than once")]
    DuplicateSession(SessionIndex),

    #[error("lesson {0} belongs to more than one session")]
    DuplicateLesson(LessonId),

    #[error("main session lessons must run 1, 2, 3, ... without gaps")]
    NonSequentialMainSession,

    #[error("lesson ids start at 1")]
    ZeroLesson,

    #[error("timing `{0}` must be between 1 ms and 10 minutes")]
    InvalidDelay(&'static str),

    #[error("card repetitions must be between 1 and 10")]
    InvalidRepetitions,

    #[error("milestone narration gates lesson {0}, which is not in the layout")]
    UnknownGatedLesson(LessonId),

    #[error("onboarding funnel must have at least one question followed by a single finish step")]
    InvalidFunnel,

    #[error("track `{0}` is listed more than once")]
    DuplicateTrack(String),
}

//
// ─── LAYOUT ────────────────────────────────────────────────────────────────────
//

/// What happens when the learner opens an advanced lesson that is already unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancedAccess {
    /// Raise the informational "coming soon" interstitial instead of navigating.
    #[default]
    Interstitial,
    /// Navigate straight into the lesson.
    Navigate,
}

/// A top-level grouping of lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSpec {
    pub index: SessionIndex,
    #[serde(default)]
    pub title: String,
    pub lessons: Vec<LessonId>,
}

impl SessionSpec {
    #[must_use]
    pub fn new(index: u32, title: impl Into<String>, lessons: impl IntoIterator<Item = u32>) -> Self {
        Self {
            index: SessionIndex::new(index),
            title: title.into(),
            lessons: lessons.into_iter().map(LessonId::new).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, lesson: LessonId) -> bool {
        self.lessons.contains(&lesson)
    }

    #[must_use]
    pub fn last_lesson(&self) -> Option<LessonId> {
        self.lessons.last().copied()
    }
}

/// Ordered sessions of a course.
///
/// The first session is the main session, unlocked lesson by lesson. Every
/// later session is advanced content, unlocked as one group once the main
/// session's checkpoint is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseLayout {
    pub sessions: Vec<SessionSpec>,
    #[serde(default)]
    pub advanced_access: AdvancedAccess,
}

impl Default for CourseLayout {
    fn default() -> Self {
        Self {
            sessions: vec![
                SessionSpec::new(1, "First session - vocabulary", 1..=5),
                SessionSpec::new(2, "Second session - phrases and dialogues", 6..=10),
                SessionSpec::new(3, "Third session - natural conversation", 11..=15),
                SessionSpec::new(4, "Fourth session - reading and writing", 16..=20),
            ],
            advanced_access: AdvancedAccess::Interstitial,
        }
    }
}

impl CourseLayout {
    /// Checks the structural rules every layout must satisfy.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` describing the first violated rule.
    pub fn validate(&self) -> Result<(), CourseError> {
        let Some(main) = self.sessions.first() else {
            return Err(CourseError::NoSessions);
        };

        let mut seen_sessions = BTreeSet::new();
        let mut seen_lessons = BTreeSet::new();
        for session in &self.sessions {
            if session.lessons.is_empty() {
                return Err(CourseError::EmptySession(session.index));
            }
            if !seen_sessions.insert(session.index) {
                return Err(CourseError::DuplicateSession(session.index));
            }
            for lesson in &session.lessons {
                if lesson.value() == 0 {
                    return Err(CourseError::ZeroLesson);
                }
                if !seen_lessons.insert(*lesson) {
                    return Err(CourseError::DuplicateLesson(*lesson));
                }
            }
        }

        let sequential = main
            .lessons
            .iter()
            .zip(1..)
            .all(|(lesson, expected)| lesson.value() == expected);
        if !sequential {
            return Err(CourseError::NonSequentialMainSession);
        }

        Ok(())
    }

    /// The session whose lessons unlock one at a time.
    ///
    /// `None` only for a layout that fails `validate`.
    #[must_use]
    pub fn main_session(&self) -> Option<&SessionSpec> {
        self.sessions.first()
    }

    /// Sessions gated as a group behind the main session checkpoint.
    #[must_use]
    pub fn advanced_sessions(&self) -> &[SessionSpec] {
        self.sessions.get(1..).unwrap_or(&[])
    }

    #[must_use]
    pub fn session_of(&self, lesson: LessonId) -> Option<&SessionSpec> {
        self.sessions.iter().find(|session| session.contains(lesson))
    }

    #[must_use]
    pub fn is_main_lesson(&self, lesson: LessonId) -> bool {
        self.main_session()
            .is_some_and(|session| session.contains(lesson))
    }

    #[must_use]
    pub fn contains(&self, lesson: LessonId) -> bool {
        self.session_of(lesson).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        let layout = CourseLayout::default();
        layout.validate().unwrap();
        let main = layout.main_session().unwrap();
        assert_eq!(main.index, SessionIndex::new(1));
        assert_eq!(main.last_lesson(), Some(LessonId::new(5)));
        assert_eq!(layout.advanced_sessions().len(), 3);
    }

    #[test]
    fn session_lookup() {
        let layout = CourseLayout::default();
        assert_eq!(
            layout.session_of(LessonId::new(7)).map(|s| s.index),
            Some(SessionIndex::new(2))
        );
        assert!(layout.is_main_lesson(LessonId::new(5)));
        assert!(!layout.is_main_lesson(LessonId::new(6)));
        assert!(!layout.contains(LessonId::new(99)));
    }

    #[test]
    fn rejects_gap_in_main_session() {
        let layout = CourseLayout {
            sessions: vec![SessionSpec::new(1, "main", [1, 2, 4])],
            advanced_access: AdvancedAccess::default(),
        };
        assert_eq!(layout.validate(), Err(CourseError::NonSequentialMainSession));
    }

    #[test]
    fn rejects_shared_lessons_and_sessions() {
        let shared = CourseLayout {
            sessions: vec![
                SessionSpec::new(1, "main", 1..=3),
                SessionSpec::new(2, "extra", [3, 4]),
            ],
            advanced_access: AdvancedAccess::default(),
        };
        assert_eq!(
            shared.validate(),
            Err(CourseError::DuplicateLesson(LessonId::new(3)))
        );

        let twice = CourseLayout {
            sessions: vec![
                SessionSpec::new(1, "main", 1..=3),
                SessionSpec::new(1, "again", [4]),
            ],
            advanced_access: AdvancedAccess::default(),
        };
        assert_eq!(
            twice.validate(),
            Err(CourseError::DuplicateSession(SessionIndex::new(1)))
        );
    }

    #[test]
    fn rejects_empty_layouts() {
        let none = CourseLayout {
            sessions: Vec::new(),
            advanced_access: AdvancedAccess::default(),
        };
        assert_eq!(none.validate(), Err(CourseError::NoSessions));

        let empty = CourseLayout {
            sessions: vec![SessionSpec::new(1, "main", Vec::<u32>::new())],
            advanced_access: AdvancedAccess::default(),
        };
        assert_eq!(
            empty.validate(),
            Err(CourseError::EmptySession(SessionIndex::new(1)))
        );
    }
}
