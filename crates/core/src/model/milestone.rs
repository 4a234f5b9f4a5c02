use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ids::{LessonId, SessionIndex};
use crate::model::lesson::AudioRef;
use crate::model::progress::ProgressRecord;

/// Named one-time narration on the home screen of a language.
///
/// The `AfterSessionNReview` names are kept for stored records; "session"
/// there means the home-screen module, i.e. lesson `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MilestoneKey {
    Intro,
    AfterLesson1,
    AfterSession2Review,
    AfterSession3Review,
    AfterSession4Review,
}

impl MilestoneKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MilestoneKey::Intro => "intro",
            MilestoneKey::AfterLesson1 => "afterLesson1",
            MilestoneKey::AfterSession2Review => "afterSession2Review",
            MilestoneKey::AfterSession3Review => "afterSession3Review",
            MilestoneKey::AfterSession4Review => "afterSession4Review",
        }
    }
}

impl fmt::Display for MilestoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress condition that makes a milestone narration due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "when", content = "id")]
pub enum MilestoneTrigger {
    /// Due on the very first visit.
    Always,
    /// Due once the given lesson has been completed.
    LessonCompleted(LessonId),
    /// Due once the given session checkpoint is recorded.
    ReviewCompleted(SessionIndex),
}

impl MilestoneTrigger {
    #[must_use]
    pub fn holds_for(self, record: &ProgressRecord) -> bool {
        match self {
            MilestoneTrigger::Always => true,
            MilestoneTrigger::LessonCompleted(lesson) => record.has_completed(lesson),
            MilestoneTrigger::ReviewCompleted(session) => record.review_completed(session),
        }
    }
}

/// A home-screen narration and the lesson tile it locks while playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSpec {
    pub key: MilestoneKey,
    pub trigger: MilestoneTrigger,
    pub narration: AudioRef,
    pub gated_lesson: LessonId,
    pub lock_ms: u64,
}

impl MilestoneSpec {
    /// Due when the trigger holds and the narration has not been played yet.
    #[must_use]
    pub fn is_due(&self, record: &ProgressRecord) -> bool {
        !record.milestone_played(self.key) && self.trigger.holds_for(record)
    }
}

/// Milestones of the default course. After module `N` (lessons 1 to 4) is
/// completed, its narration locks module `N + 1` while it plays.
#[must_use]
pub fn default_milestones() -> Vec<MilestoneSpec> {
    let spec = |key, trigger, file: &str, lesson: u32, lock_ms| MilestoneSpec {
        key,
        trigger,
        narration: AudioRef::new(format!("/audio/narrations/ingles/{file}.mp3")),
        gated_lesson: LessonId::new(lesson),
        lock_ms,
    };
    vec![
        spec(MilestoneKey::Intro, MilestoneTrigger::Always, "audio_01", 1, 14_000),
        spec(
            MilestoneKey::AfterLesson1,
            MilestoneTrigger::LessonCompleted(LessonId::new(1)),
            "audio_03",
            2,
            10_000,
        ),
        spec(
            MilestoneKey::AfterSession2Review,
            MilestoneTrigger::LessonCompleted(LessonId::new(2)),
            "audio_06",
            3,
            6_000,
        ),
        spec(
            MilestoneKey::AfterSession3Review,
            MilestoneTrigger::LessonCompleted(LessonId::new(3)),
            "audio_09",
            4,
            7_000,
        ),
        spec(
            MilestoneKey::AfterSession4Review,
            MilestoneTrigger::LessonCompleted(LessonId::new(4)),
            "audio_13",
            5,
            10_000,
        ),
    ]
}
