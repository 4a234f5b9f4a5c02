use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::course::CourseLayout;
use crate::model::ids::{LessonId, SessionIndex};
use crate::model::milestone::MilestoneKey;
use crate::unlock::UnlockEngine;

//
// ─── COMPLETION OUTCOME ────────────────────────────────────────────────────────
//

/// What recording a lesson completion did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The lesson was recorded and the following lesson is now playable.
    NextUnlocked { next: LessonId },
    /// Every lesson of the session is now completed; the session checkpoint is recorded.
    CheckpointReached { session: SessionIndex },
    /// The lesson was recorded; its session still has lessons left and nothing new unlocked.
    Recorded,
    /// The lesson is not playable yet; nothing was recorded.
    Locked,
    /// The lesson is not part of the course layout; nothing was recorded.
    Unknown,
}

impl CompletionOutcome {
    /// Whether the record was (idempotently) updated.
    #[must_use]
    pub fn is_recorded(self) -> bool {
        matches!(
            self,
            CompletionOutcome::NextUnlocked { .. }
                | CompletionOutcome::CheckpointReached { .. }
                | CompletionOutcome::Recorded
        )
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Persisted progression state of one language.
///
/// Invariants:
/// - lesson 1 is always unlocked and the unlocked set never shrinks
/// - `last_lesson_completed` is 0 or a member of the unlocked set
/// - every completed lesson is unlocked
/// - a session checkpoint is set only once all of its lessons are completed
/// - checkpoint and narration flags, once set, stay set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    unlocked_lesson_ids: BTreeSet<LessonId>,
    last_lesson_completed: u32,
    #[serde(default)]
    completed_lesson_ids: BTreeSet<LessonId>,
    #[serde(default)]
    completed_reviews: BTreeMap<SessionIndex, bool>,
    #[serde(default)]
    onboarding_audio_flags: BTreeMap<MilestoneKey, bool>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            unlocked_lesson_ids: BTreeSet::from([LessonId::FIRST]),
            last_lesson_completed: 0,
            completed_lesson_ids: BTreeSet::new(),
            completed_reviews: BTreeMap::new(),
            onboarding_audio_flags: BTreeMap::new(),
        }
    }
}

impl ProgressRecord {
    /// Restores the invariants on a record loaded from storage.
    ///
    /// Hand-edited or truncated records are repaired instead of rejected.
    /// Records written before completed lessons were tracked get them back
    /// from the unlocked set: a lesson up to the highest completed one whose
    /// successor is unlocked counts as completed.
    #[must_use]
    pub fn repaired(mut self) -> Self {
        self.unlocked_lesson_ids.remove(&LessonId::new(0));
        self.completed_lesson_ids.remove(&LessonId::new(0));
        self.unlocked_lesson_ids.insert(LessonId::FIRST);
        if self.last_lesson_completed > 0 {
            let last = LessonId::new(self.last_lesson_completed);
            self.unlocked_lesson_ids.insert(last);
            if self.completed_lesson_ids.is_empty() {
                let inferred: Vec<LessonId> = self
                    .unlocked_lesson_ids
                    .iter()
                    .copied()
                    .filter(|lesson| {
                        *lesson < last && self.unlocked_lesson_ids.contains(&lesson.next())
                    })
                    .collect();
                self.completed_lesson_ids.extend(inferred);
                self.completed_lesson_ids.insert(last);
            }
        }
        let completed = self.completed_lesson_ids.clone();
        self.unlocked_lesson_ids.extend(completed);
        self
    }

    #[must_use]
    pub fn unlocked_lessons(&self) -> &BTreeSet<LessonId> {
        &self.unlocked_lesson_ids
    }

    #[must_use]
    pub fn is_unlocked(&self, lesson: LessonId) -> bool {
        self.unlocked_lesson_ids.contains(&lesson)
    }

    #[must_use]
    pub fn last_lesson_completed(&self) -> u32 {
        self.last_lesson_completed
    }

    #[must_use]
    pub fn has_completed(&self, lesson: LessonId) -> bool {
        self.completed_lesson_ids.contains(&lesson)
    }

    #[must_use]
    pub fn completed_lessons(&self) -> &BTreeSet<LessonId> {
        &self.completed_lesson_ids
    }

    #[must_use]
    pub fn review_completed(&self, session: SessionIndex) -> bool {
        self.completed_reviews.get(&session).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn completed_reviews(&self) -> &BTreeMap<SessionIndex, bool> {
        &self.completed_reviews
    }

    #[must_use]
    pub fn milestone_played(&self, key: MilestoneKey) -> bool {
        self.onboarding_audio_flags.get(&key).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn onboarding_audio_flags(&self) -> &BTreeMap<MilestoneKey, bool> {
        &self.onboarding_audio_flags
    }

    /// Records the completion of `lesson`.
    ///
    /// Every lesson but the last of its session unlocks its successor. The
    /// session checkpoint is set once all of the session's lessons are
    /// completed, whatever order they were completed in; the first lesson of
    /// the next session is never unlocked here. Calling it again for the same
    /// lesson leaves the record unchanged.
    pub fn complete_lesson(&mut self, layout: &CourseLayout, lesson: LessonId) -> CompletionOutcome {
        let Some(session) = layout.session_of(lesson) else {
            return CompletionOutcome::Unknown;
        };
        if !UnlockEngine::new(layout, self).is_accessible(lesson) {
            return CompletionOutcome::Locked;
        }

        self.last_lesson_completed = self.last_lesson_completed.max(lesson.value());
        self.unlocked_lesson_ids.insert(lesson);
        self.completed_lesson_ids.insert(lesson);

        let closes_session = session.last_lesson() == Some(lesson);
        if !closes_session {
            self.unlocked_lesson_ids.insert(lesson.next());
        }

        if session.lessons.iter().all(|l| self.completed_lesson_ids.contains(l)) {
            self.completed_reviews.insert(session.index, true);
            CompletionOutcome::CheckpointReached {
                session: session.index,
            }
        } else if closes_session {
            CompletionOutcome::Recorded
        } else {
            CompletionOutcome::NextUnlocked {
                next: lesson.next(),
            }
        }
    }

    /// Flags a one-time narration as played. Returns `true` the first time.
    pub fn mark_milestone_played(&mut self, key: MilestoneKey) -> bool {
        let previous = self.onboarding_audio_flags.insert(key, true);
        previous != Some(true)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_in_order(record: &mut ProgressRecord, layout: &CourseLayout, upto: u32) {
        for id in 1..=upto {
            assert!(record.complete_lesson(layout, LessonId::new(id)).is_recorded());
        }
    }

    #[test]
    fn default_record_unlocks_only_lesson_one() {
        let record = ProgressRecord::default();
        assert_eq!(
            record.unlocked_lessons().iter().copied().collect::<Vec<_>>(),
            vec![LessonId::FIRST]
        );
        assert_eq!(record.last_lesson_completed(), 0);
        assert!(!record.review_completed(SessionIndex::new(1)));
        assert!(!record.milestone_played(MilestoneKey::Intro));
    }

    #[test]
    fn completing_a_lesson_unlocks_the_next() {
        let layout = CourseLayout::default();
        let mut record = ProgressRecord::default();
        let outcome = record.complete_lesson(&layout, LessonId::new(1));
        assert_eq!(
            outcome,
            CompletionOutcome::NextUnlocked {
                next: LessonId::new(2)
            }
        );
        assert!(record.is_unlocked(LessonId::new(2)));
        assert_eq!(record.last_lesson_completed(), 1);
    }

    #[test]
    fn completion_is_idempotent() {
        let layout = CourseLayout::default();
        let mut once = ProgressRecord::default();
        complete_in_order(&mut once, &layout, 2);
        let mut twice = once.clone();
        twice.complete_lesson(&layout, LessonId::new(2));
        assert_eq!(once, twice);
    }

    #[test]
    fn last_lesson_of_session_sets_checkpoint_without_unlocking_next() {
        let layout = CourseLayout::default();
        let mut record = ProgressRecord::default();
        complete_in_order(&mut record, &layout, 4);
        let outcome = record.complete_lesson(&layout, LessonId::new(5));
        assert_eq!(
            outcome,
            CompletionOutcome::CheckpointReached {
                session: SessionIndex::new(1)
            }
        );
        assert!(record.review_completed(SessionIndex::new(1)));
        assert!(!record.is_unlocked(LessonId::new(6)));
    }

    #[test]
    fn locked_and_unknown_lessons_are_refused() {
        let layout = CourseLayout::default();
        let mut record = ProgressRecord::default();
        let before = record.clone();
        assert_eq!(
            record.complete_lesson(&layout, LessonId::new(3)),
            CompletionOutcome::Locked
        );
        assert_eq!(
            record.complete_lesson(&layout, LessonId::new(7)),
            CompletionOutcome::Locked
        );
        assert_eq!(
            record.complete_lesson(&layout, LessonId::new(400)),
            CompletionOutcome::Unknown
        );
        assert_eq!(record, before);
    }

    #[test]
    fn advanced_lessons_keep_last_completed_inside_unlocked_set() {
        let layout = CourseLayout::default();
        let mut record = ProgressRecord::default();
        complete_in_order(&mut record, &layout, 5);
        record.complete_lesson(&layout, LessonId::new(8));
        assert_eq!(record.last_lesson_completed(), 8);
        assert!(record.is_unlocked(LessonId::new(8)));
    }

    #[test]
    fn session_closing_lesson_alone_does_not_set_checkpoint() {
        let layout = CourseLayout::default();
        let mut record = ProgressRecord::default();
        complete_in_order(&mut record, &layout, 5);
        let outcome = record.complete_lesson(&layout, LessonId::new(10));
        assert_eq!(outcome, CompletionOutcome::Recorded);
        assert!(record.has_completed(LessonId::new(10)));
        assert!(!record.review_completed(SessionIndex::new(2)));
    }

    #[test]
    fn advanced_checkpoint_waits_for_every_lesson_of_the_session() {
        let layout = CourseLayout::default();
        let mut record = ProgressRecord::default();
        complete_in_order(&mut record, &layout, 5);
        for id in [10, 6, 7, 8] {
            record.complete_lesson(&layout, LessonId::new(id));
            assert!(!record.review_completed(SessionIndex::new(2)));
        }
        assert_eq!(
            record.complete_lesson(&layout, LessonId::new(9)),
            CompletionOutcome::CheckpointReached {
                session: SessionIndex::new(2)
            }
        );
        assert!(record.review_completed(SessionIndex::new(2)));
    }

    #[test]
    fn skipped_advanced_lessons_are_not_completed() {
        let layout = CourseLayout::default();
        let mut record = ProgressRecord::default();
        complete_in_order(&mut record, &layout, 5);
        record.complete_lesson(&layout, LessonId::new(8));
        assert!(record.has_completed(LessonId::new(8)));
        assert!(record.has_completed(LessonId::new(5)));
        assert!(!record.has_completed(LessonId::new(6)));
        assert!(!record.has_completed(LessonId::new(7)));
    }

    #[test]
    fn unlocked_set_never_shrinks() {
        let layout = CourseLayout::default();
        let mut record = ProgressRecord::default();
        let mut previous = record.unlocked_lessons().clone();
        for id in [1, 1, 3, 2, 2, 3, 9, 4, 5, 5, 12] {
            record.complete_lesson(&layout, LessonId::new(id));
            assert!(previous.is_subset(record.unlocked_lessons()));
            previous = record.unlocked_lessons().clone();
        }
    }

    #[test]
    fn milestone_flags_are_set_once() {
        let mut record = ProgressRecord::default();
        assert!(record.mark_milestone_played(MilestoneKey::Intro));
        assert!(!record.mark_milestone_played(MilestoneKey::Intro));
        assert!(record.milestone_played(MilestoneKey::Intro));
    }

    #[test]
    fn repaired_restores_invariants() {
        let raw = r#"{"unlockedLessonIds":[3],"lastLessonCompleted":4}"#;
        let record: ProgressRecord = serde_json::from_str(raw).unwrap();
        let record = record.repaired();
        assert!(record.is_unlocked(LessonId::FIRST));
        assert!(record.is_unlocked(LessonId::new(4)));
        assert!(record.has_completed(LessonId::new(4)));
    }

    #[test]
    fn repaired_infers_completed_lessons_from_unlocked_set() {
        let raw = r#"{"unlockedLessonIds":[1,2,3],"lastLessonCompleted":2}"#;
        let record: ProgressRecord = serde_json::from_str(raw).unwrap();
        let record = record.repaired();
        assert!(record.has_completed(LessonId::new(1)));
        assert!(record.has_completed(LessonId::new(2)));
        assert!(!record.has_completed(LessonId::new(3)));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let layout = CourseLayout::default();
        let mut record = ProgressRecord::default();
        complete_in_order(&mut record, &layout, 5);
        record.mark_milestone_played(MilestoneKey::AfterLesson1);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"unlockedLessonIds\":[1,2,3,4,5]"));
        assert!(json.contains("\"completedReviews\":{\"1\":true}"));
        assert!(json.contains("\"afterLesson1\":true"));
        let back: ProgressRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
