//! One-time narrations on a language's home view.
//!
//! Each due milestone plays once, is flagged as played, and keeps its lesson
//! tile locked until its own countdown elapses. Several countdowns may be
//! outstanding at once.

use std::collections::BTreeSet;

use crate::effect::{Effect, PlaybackToken, TimerToken, TokenSeq, millis};
use crate::gate::Gate;
use crate::model::{LessonId, MilestoneSpec, ProgressRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeEvent {
    TimerElapsed(TimerToken),
    AudioEnded(PlaybackToken),
    AudioFailed(PlaybackToken),
    Cancel,
}

/// Milestones whose trigger holds and whose narration has not been played.
#[must_use]
pub fn due_milestones<'a>(
    milestones: &'a [MilestoneSpec],
    record: &ProgressRecord,
) -> Vec<&'a MilestoneSpec> {
    milestones.iter().filter(|m| m.is_due(record)).collect()
}

#[derive(Debug, Clone, Default)]
pub struct HomeNarrations {
    tokens: TokenSeq,
    gates: Vec<Gate<LessonId>>,
    in_flight: BTreeSet<PlaybackToken>,
    cancelled: bool,
}

impl HomeNarrations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts every due narration. Call once when the home view appears.
    pub fn enter(&mut self, milestones: &[MilestoneSpec], record: &ProgressRecord) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.cancelled {
            return effects;
        }
        for milestone in due_milestones(milestones, record) {
            let playback = self.tokens.playback();
            self.in_flight.insert(playback);
            effects.push(Effect::PlayAudio {
                playback,
                resource: milestone.narration.clone(),
            });
            effects.push(Effect::MarkMilestonePlayed { key: milestone.key });

            let (gate, start) =
                Gate::arm(milestone.gated_lesson, millis(milestone.lock_ms), &mut self.tokens);
            self.gates.push(gate);
            effects.extend(start);
        }
        effects
    }

    /// Whether a narration still locks `lesson`.
    #[must_use]
    pub fn is_gated(&self, lesson: LessonId) -> bool {
        !self.cancelled
            && self
                .gates
                .iter()
                .any(|gate| *gate.subject() == lesson && !gate.is_open())
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.cancelled && self.gates.iter().any(|gate| !gate.is_open())
    }

    pub fn handle(&mut self, event: HomeEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.cancelled {
            return effects;
        }
        match event {
            HomeEvent::TimerElapsed(token) => {
                for gate in &mut self.gates {
                    if gate.on_elapsed(token) {
                        break;
                    }
                }
            }
            HomeEvent::AudioEnded(playback) => {
                self.in_flight.remove(&playback);
            }
            HomeEvent::AudioFailed(playback) => {
                if self.in_flight.remove(&playback) {
                    tracing::warn!(?playback, "home narration failed");
                }
            }
            HomeEvent::Cancel => {
                effects.extend(self.gates.iter().filter_map(Gate::cancel));
                effects.extend(
                    std::mem::take(&mut self.in_flight)
                        .into_iter()
                        .map(|playback| Effect::StopAudio { playback }),
                );
                self.cancelled = true;
            }
        }
        effects
    }
}
