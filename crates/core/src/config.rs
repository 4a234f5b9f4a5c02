use std::collections::BTreeSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::effect::millis;
use crate::model::milestone::default_milestones;
use crate::model::quiz::default_funnel;
use crate::model::{CourseError, CourseLayout, LanguageCode, MilestoneSpec, QuizStep};

const MAX_DELAY_MS: u64 = 600_000;

//
// ─── RUNNER TIMINGS ────────────────────────────────────────────────────────────
//

/// Timings of the lesson runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerTimings {
    card_repetitions: u32,
    repeat_pause_ms: u64,
    next_delay_ms: u64,
    intro_next_delay_ms: u64,
}

impl Default for RunnerTimings {
    /// Three plays per card with 1.5 s between them; "next" unlocks after
    /// 7 s, or 14 s on the first card of lesson 1 while the intro narration runs.
    fn default() -> Self {
        Self {
            card_repetitions: 3,
            repeat_pause_ms: 1_500,
            next_delay_ms: 7_000,
            intro_next_delay_ms: 14_000,
        }
    }
}

impl RunnerTimings {
    /// Creates custom timings.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if a value is out of range.
    pub fn new(
        card_repetitions: u32,
        repeat_pause_ms: u64,
        next_delay_ms: u64,
        intro_next_delay_ms: u64,
    ) -> Result<Self, CourseError> {
        let timings = Self {
            card_repetitions,
            repeat_pause_ms,
            next_delay_ms,
            intro_next_delay_ms,
        };
        timings.validate()?;
        Ok(timings)
    }

    /// # Errors
    ///
    /// Returns `CourseError` if a value is out of range.
    pub fn validate(&self) -> Result<(), CourseError> {
        if !(1..=10).contains(&self.card_repetitions) {
            return Err(CourseError::InvalidRepetitions);
        }
        check_delay("repeat_pause_ms", self.repeat_pause_ms)?;
        check_delay("next_delay_ms", self.next_delay_ms)?;
        check_delay("intro_next_delay_ms", self.intro_next_delay_ms)?;
        Ok(())
    }

    #[must_use]
    pub fn card_repetitions(&self) -> u32 {
        self.card_repetitions
    }

    #[must_use]
    pub fn repeat_pause(&self) -> Duration {
        millis(self.repeat_pause_ms)
    }

    #[must_use]
    pub fn next_delay(&self) -> Duration {
        millis(self.next_delay_ms)
    }

    #[must_use]
    pub fn intro_next_delay(&self) -> Duration {
        millis(self.intro_next_delay_ms)
    }
}

fn check_delay(name: &'static str, ms: u64) -> Result<(), CourseError> {
    if ms == 0 || ms > MAX_DELAY_MS {
        return Err(CourseError::InvalidDelay(name));
    }
    Ok(())
}

//
// ─── TRACKS ────────────────────────────────────────────────────────────────────
//

/// A language offered on the selection screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSpec {
    pub code: LanguageCode,
    /// Unavailable tracks show a "coming soon" notice instead of a home view.
    #[serde(default = "available_by_default")]
    pub available: bool,
    /// Whether first entry goes through the onboarding funnel.
    #[serde(default)]
    pub funnel: bool,
}

fn available_by_default() -> bool {
    true
}

fn default_tracks() -> Vec<TrackSpec> {
    let mut tracks = Vec::new();
    if let Ok(code) = LanguageCode::new("jp") {
        tracks.push(TrackSpec {
            code,
            available: true,
            funnel: true,
        });
    }
    for raw in ["en", "kr", "fr", "es", "de", "it", "ru", "cn", "tr"] {
        if let Ok(code) = LanguageCode::new(raw) {
            tracks.push(TrackSpec {
                code,
                available: false,
                funnel: false,
            });
        }
    }
    tracks
}

//
// ─── COURSE CONFIG ─────────────────────────────────────────────────────────────
//

/// Everything that shapes a course: layout, timings, narrations, tracks and the funnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseConfig {
    pub layout: CourseLayout,
    pub timings: RunnerTimings,
    pub milestones: Vec<MilestoneSpec>,
    pub tracks: Vec<TrackSpec>,
    pub funnel: Vec<QuizStep>,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            layout: CourseLayout::default(),
            timings: RunnerTimings::default(),
            milestones: default_milestones(),
            tracks: default_tracks(),
            funnel: default_funnel(),
        }
    }
}

impl CourseConfig {
    /// # Errors
    ///
    /// Returns `CourseError` describing the first invalid section.
    pub fn validate(&self) -> Result<(), CourseError> {
        self.layout.validate()?;
        self.timings.validate()?;

        for milestone in &self.milestones {
            if !self.layout.contains(milestone.gated_lesson) {
                return Err(CourseError::UnknownGatedLesson(milestone.gated_lesson));
            }
            check_delay("milestones.lock_ms", milestone.lock_ms)?;
        }

        let mut codes = BTreeSet::new();
        for track in &self.tracks {
            if !codes.insert(track.code.clone()) {
                return Err(CourseError::DuplicateTrack(track.code.to_string()));
            }
        }

        validate_funnel(&self.funnel)
    }

    #[must_use]
    pub fn track(&self, code: &LanguageCode) -> Option<&TrackSpec> {
        self.tracks.iter().find(|track| &track.code == code)
    }
}

fn validate_funnel(steps: &[QuizStep]) -> Result<(), CourseError> {
    let Some((last, questions)) = steps.split_last() else {
        return Err(CourseError::InvalidFunnel);
    };
    if !last.is_finish() || questions.is_empty() {
        return Err(CourseError::InvalidFunnel);
    }
    if questions
        .iter()
        .any(|step| step.is_finish() || step.options().is_empty())
    {
        return Err(CourseError::InvalidFunnel);
    }
    for step in steps {
        check_delay("funnel.delay_ms", step.delay_ms)?;
    }
    Ok(())
}
