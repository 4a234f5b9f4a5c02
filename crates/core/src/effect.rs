//! Side-effect intents emitted by the course state machines.
//!
//! State machines never touch timers, audio or storage themselves. Each
//! transition returns a list of [`Effect`]s; the host executes them and feeds
//! the results (timer elapsed, playback ended) back in as events.

use std::fmt;

use chrono::Duration;

use crate::model::{AudioRef, LessonId, MilestoneKey};

/// Handle of a scheduled countdown.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

/// Handle of one audio playback.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackToken(u64);

impl TimerToken {
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl PlaybackToken {
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimerToken({})", self.0)
    }
}

impl fmt::Debug for PlaybackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlaybackToken({})", self.0)
    }
}

/// Allocates tokens that are unique within one state machine instance.
#[derive(Debug, Clone, Default)]
pub struct TokenSeq {
    last: u64,
}

impl TokenSeq {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer(&mut self) -> TimerToken {
        self.last += 1;
        TimerToken(self.last)
    }

    pub fn playback(&mut self) -> PlaybackToken {
        self.last += 1;
        PlaybackToken(self.last)
    }
}

/// Instruction for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PlayAudio {
        playback: PlaybackToken,
        resource: AudioRef,
    },
    StopAudio {
        playback: PlaybackToken,
    },
    StartTimer {
        timer: TimerToken,
        after: Duration,
    },
    CancelTimer {
        timer: TimerToken,
    },
    /// Persist the completion of a lesson.
    MarkLessonCompleted {
        lesson: LessonId,
    },
    /// Switch to the lesson completion view.
    ShowCompletion,
    /// Persist that a one-time narration has been played.
    MarkMilestonePlayed {
        key: MilestoneKey,
    },
    /// Persist the one-time "funnel completed" flag.
    MarkFunnelCompleted,
    /// Hand control back to navigation (language home view).
    NavigateHome,
}

/// Converts configured milliseconds into a countdown duration.
#[must_use]
pub fn millis(ms: u64) -> Duration {
    Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}
