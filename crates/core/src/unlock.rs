//! Decides which lessons are playable from a progress snapshot.
//!
//! Everything here is a pure function of a [`CourseLayout`] and a
//! [`ProgressRecord`]; nothing is mutated.

use crate::model::{AdvancedAccess, CourseLayout, LessonId, ProgressRecord, SessionIndex};

/// Result of the learner trying to open a lesson tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Navigate into the lesson.
    Open,
    /// Unlocked advanced lesson; show the informational interstitial instead of navigating.
    Interstitial,
    /// Do not navigate. `reason` is shown to the learner when present.
    Blocked { reason: Option<String> },
}

impl AccessDecision {
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, AccessDecision::Open)
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            AccessDecision::Blocked { reason } => reason.as_deref(),
            _ => None,
        }
    }
}

/// Render state of one lesson tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileState {
    pub lesson: LessonId,
    pub accessible: bool,
}

/// Render state of one session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTiles {
    pub session: SessionIndex,
    pub title: String,
    pub tiles: Vec<TileState>,
}

/// Message shown when a locked main-session lesson is clicked.
#[must_use]
pub fn locked_reason(lesson: LessonId) -> Option<String> {
    lesson
        .previous()
        .map(|previous| format!("Complete lesson {previous} to unlock lesson {lesson}."))
}

#[derive(Debug, Clone, Copy)]
pub struct UnlockEngine<'a> {
    layout: &'a CourseLayout,
    record: &'a ProgressRecord,
}

impl<'a> UnlockEngine<'a> {
    #[must_use]
    pub fn new(layout: &'a CourseLayout, record: &'a ProgressRecord) -> Self {
        Self { layout, record }
    }

    /// Advanced sessions open as one group once the main checkpoint is recorded.
    #[must_use]
    pub fn advanced_unlocked(&self) -> bool {
        self.layout
            .main_session()
            .is_some_and(|main| self.record.review_completed(main.index))
    }

    #[must_use]
    pub fn is_accessible(&self, lesson: LessonId) -> bool {
        if self.layout.is_main_lesson(lesson) {
            self.record.is_unlocked(lesson)
        } else if self.layout.contains(lesson) {
            self.advanced_unlocked()
        } else {
            false
        }
    }

    /// Decides what a click on `lesson` does.
    #[must_use]
    pub fn request_open(&self, lesson: LessonId) -> AccessDecision {
        if self.layout.is_main_lesson(lesson) {
            return if self.record.is_unlocked(lesson) {
                AccessDecision::Open
            } else {
                AccessDecision::Blocked {
                    reason: locked_reason(lesson),
                }
            };
        }

        if !self.layout.contains(lesson) || !self.advanced_unlocked() {
            // the surface already renders these controls disabled
            return AccessDecision::Blocked { reason: None };
        }

        match self.layout.advanced_access {
            AdvancedAccess::Interstitial => AccessDecision::Interstitial,
            AdvancedAccess::Navigate => AccessDecision::Open,
        }
    }

    /// Tile states for every session, in layout order.
    #[must_use]
    pub fn tiles(&self) -> Vec<SessionTiles> {
        self.layout
            .sessions
            .iter()
            .map(|session| SessionTiles {
                session: session.index,
                title: session.title.clone(),
                tiles: session
                    .lessons
                    .iter()
                    .map(|lesson| TileState {
                        lesson: *lesson,
                        accessible: self.is_accessible(*lesson),
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_through(layout: &CourseLayout, last: u32) -> ProgressRecord {
        let mut record = ProgressRecord::default();
        for id in 1..=last {
            record.complete_lesson(layout, LessonId::new(id));
        }
        record
    }

    #[test]
    fn fresh_record_opens_only_lesson_one() {
        let layout = CourseLayout::default();
        let record = ProgressRecord::default();
        let engine = UnlockEngine::new(&layout, &record);
        assert_eq!(engine.request_open(LessonId::new(1)), AccessDecision::Open);
        assert!(!engine.is_accessible(LessonId::new(2)));
        assert!(!engine.advanced_unlocked());
    }

    #[test]
    fn locked_main_lesson_names_its_prerequisite() {
        let layout = CourseLayout::default();
        let record = completed_through(&layout, 1);
        let engine = UnlockEngine::new(&layout, &record);
        let decision = engine.request_open(LessonId::new(3));
        assert!(!decision.is_open());
        assert_eq!(decision.reason(), Some("Complete lesson 2 to unlock lesson 3."));
    }

    #[test]
    fn locked_advanced_lesson_is_silently_blocked() {
        let layout = CourseLayout::default();
        let record = completed_through(&layout, 4);
        let engine = UnlockEngine::new(&layout, &record);
        assert_eq!(
            engine.request_open(LessonId::new(6)),
            AccessDecision::Blocked { reason: None }
        );
    }

    #[test]
    fn main_checkpoint_unlocks_advanced_group() {
        let layout = CourseLayout::default();
        let record = completed_through(&layout, 5);
        let engine = UnlockEngine::new(&layout, &record);
        assert!(engine.advanced_unlocked());
        for id in 6..=20 {
            assert!(engine.is_accessible(LessonId::new(id)));
        }
        assert_eq!(engine.request_open(LessonId::new(12)), AccessDecision::Interstitial);
    }

    #[test]
    fn advanced_access_can_navigate_directly() {
        let mut layout = CourseLayout::default();
        layout.advanced_access = AdvancedAccess::Navigate;
        let record = completed_through(&layout, 5);
        let engine = UnlockEngine::new(&layout, &record);
        assert_eq!(engine.request_open(LessonId::new(6)), AccessDecision::Open);
    }

    #[test]
    fn unknown_lesson_is_blocked_without_reason() {
        let layout = CourseLayout::default();
        let record = completed_through(&layout, 5);
        let engine = UnlockEngine::new(&layout, &record);
        assert_eq!(
            engine.request_open(LessonId::new(77)),
            AccessDecision::Blocked { reason: None }
        );
    }

    #[test]
    fn tiles_follow_layout() {
        let layout = CourseLayout::default();
        let record = completed_through(&layout, 2);
        let tiles = UnlockEngine::new(&layout, &record).tiles();
        assert_eq!(tiles.len(), 4);
        let main: Vec<bool> = tiles[0].tiles.iter().map(|t| t.accessible).collect();
        assert_eq!(main, vec![true, true, true, false, false]);
        assert!(tiles[1].tiles.iter().all(|t| !t.accessible));
    }
}
