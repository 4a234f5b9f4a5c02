//! Card-by-card lesson state machine.
//!
//! `NotStarted → Playing(0) → … → Playing(last) → Completed`, with the
//! terminal states `Empty` (no content) and `Cancelled` (view torn down).
//! Every card gates its "next" control behind a countdown that runs
//! independently of the card's audio.

use std::collections::BTreeSet;

use chrono::Duration;

use crate::config::RunnerTimings;
use crate::effect::{Effect, PlaybackToken, TimerToken, TokenSeq};
use crate::gate::Gate;
use crate::model::{AudioRef, Flashcard, LanguageCode, LessonDefinition, LessonId};

//
// ─── STATES & EVENTS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    NotStarted,
    Playing { card: usize },
    Completed,
    /// No content for this lesson/language; nothing can happen.
    Empty,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerEvent {
    Start,
    Next,
    /// Play the current card once more, on demand.
    Replay,
    TimerElapsed(TimerToken),
    AudioEnded(PlaybackToken),
    AudioFailed(PlaybackToken),
    /// The lesson view is going away.
    Cancel,
}

/// Automatic repeats of the current card's audio.
#[derive(Debug, Clone)]
struct Repetition {
    resource: AudioRef,
    playback: PlaybackToken,
    pause: Option<TimerToken>,
    remaining: u32,
}

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
pub struct LessonRunner {
    language: LanguageCode,
    lesson: LessonId,
    intro_narration: Option<AudioRef>,
    cards: Vec<Flashcard>,
    timings: RunnerTimings,
    state: RunnerState,
    tokens: TokenSeq,
    gate: Option<Gate<usize>>,
    repetition: Option<Repetition>,
    in_flight: BTreeSet<PlaybackToken>,
}

impl LessonRunner {
    /// Builds a runner for `lesson`; missing or card-less content yields the `Empty` state.
    #[must_use]
    pub fn new(
        language: LanguageCode,
        lesson: LessonId,
        definition: Option<LessonDefinition>,
        timings: RunnerTimings,
    ) -> Self {
        let (intro_narration, cards) = definition
            .map(|def| (def.intro_narration, def.cards))
            .unwrap_or_default();
        let state = if cards.is_empty() {
            tracing::warn!(%language, %lesson, "no lesson content");
            RunnerState::Empty
        } else {
            RunnerState::NotStarted
        };

        Self {
            language,
            lesson,
            intro_narration,
            cards,
            timings,
            state,
            tokens: TokenSeq::new(),
            gate: None,
            repetition: None,
            in_flight: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.state
    }

    #[must_use]
    pub fn lesson(&self) -> LessonId {
        self.lesson
    }

    #[must_use]
    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn card_index(&self) -> Option<usize> {
        match self.state {
            RunnerState::Playing { card } => Some(card),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&Flashcard> {
        self.card_index().and_then(|index| self.cards.get(index))
    }

    #[must_use]
    pub fn is_last_card(&self) -> bool {
        self.card_index()
            .is_some_and(|index| index + 1 == self.cards.len())
    }

    /// Whether the "next" (or "finish" on the last card) control is enabled.
    #[must_use]
    pub fn next_enabled(&self) -> bool {
        self.card_index().is_some() && self.gate.as_ref().is_some_and(Gate::is_open)
    }

    /// Countdown guarding the current card's "next" control.
    #[must_use]
    pub fn next_delay(&self) -> Option<Duration> {
        self.gate.as_ref().map(Gate::duration)
    }

    /// Position label such as `03/12`.
    #[must_use]
    pub fn card_position(&self) -> Option<String> {
        self.card_index()
            .map(|index| format!("{:02}/{:02}", index + 1, self.cards.len()))
    }

    /// Applies `event` and returns the effects the host must run.
    pub fn handle(&mut self, event: RunnerEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        match (self.state, event) {
            (RunnerState::NotStarted, RunnerEvent::Start) => self.enter_card(0, &mut effects),
            (RunnerState::NotStarted, RunnerEvent::Cancel) => self.state = RunnerState::Cancelled,
            (RunnerState::Playing { card }, event) => self.on_playing(card, event, &mut effects),
            _ => {}
        }
        effects
    }

    fn on_playing(&mut self, card: usize, event: RunnerEvent, effects: &mut Vec<Effect>) {
        match event {
            RunnerEvent::Start => {}
            RunnerEvent::Next => {
                if !self.next_enabled() {
                    return;
                }
                self.leave_card(effects);
                if card + 1 < self.cards.len() {
                    self.enter_card(card + 1, effects);
                } else {
                    self.state = RunnerState::Completed;
                    effects.push(Effect::MarkLessonCompleted {
                        lesson: self.lesson,
                    });
                    effects.push(Effect::ShowCompletion);
                }
            }
            RunnerEvent::Replay => {
                if let Some(resource) = self.card_audio(card) {
                    self.play(resource, effects);
                }
            }
            RunnerEvent::TimerElapsed(token) => self.on_timer(token, effects),
            RunnerEvent::AudioEnded(playback) => {
                self.in_flight.remove(&playback);
                self.on_audio_ended(playback, effects);
            }
            RunnerEvent::AudioFailed(playback) => {
                self.in_flight.remove(&playback);
                tracing::warn!(lesson = %self.lesson, card, ?playback, "audio playback failed");
                if self
                    .repetition
                    .as_ref()
                    .is_some_and(|rep| rep.playback == playback)
                {
                    self.repetition = None;
                }
            }
            RunnerEvent::Cancel => {
                self.leave_card(effects);
                if let Some(cancel) = self.gate.take().and_then(|gate| gate.cancel()) {
                    effects.push(cancel);
                }
                self.state = RunnerState::Cancelled;
            }
        }
    }

    fn enter_card(&mut self, card: usize, effects: &mut Vec<Effect>) {
        self.state = RunnerState::Playing { card };

        let intro = self.lesson == LessonId::FIRST && card == 0;
        let delay = if intro {
            match self.intro_narration.clone() {
                Some(narration) => {
                    self.play(narration, effects);
                }
                None => tracing::warn!(language = %self.language, "intro narration missing"),
            }
            self.timings.intro_next_delay()
        } else {
            if let Some(resource) = self.card_audio(card) {
                let playback = self.play(resource.clone(), effects);
                self.repetition = Some(Repetition {
                    resource,
                    playback,
                    pause: None,
                    remaining: self.timings.card_repetitions().saturating_sub(1),
                });
            }
            self.timings.next_delay()
        };

        let (gate, start) = Gate::arm(card, delay, &mut self.tokens);
        self.gate = Some(gate);
        effects.extend(start);
    }

    /// Stops whatever the current card still has going, except its gate.
    fn leave_card(&mut self, effects: &mut Vec<Effect>) {
        if let Some(timer) = self.repetition.take().and_then(|rep| rep.pause) {
            effects.push(Effect::CancelTimer { timer });
        }
        for playback in std::mem::take(&mut self.in_flight) {
            effects.push(Effect::StopAudio { playback });
        }
    }

    fn on_timer(&mut self, token: TimerToken, effects: &mut Vec<Effect>) {
        if let Some(gate) = self.gate.as_mut() {
            if gate.on_elapsed(token) {
                return;
            }
        }

        let Some(rep) = self.repetition.as_mut() else {
            return;
        };
        if rep.pause != Some(token) {
            return;
        }
        rep.pause = None;
        rep.remaining -= 1;
        let resource = rep.resource.clone();
        let playback = self.play(resource, effects);
        if let Some(rep) = self.repetition.as_mut() {
            rep.playback = playback;
        }
    }

    fn on_audio_ended(&mut self, playback: PlaybackToken, effects: &mut Vec<Effect>) {
        let Some(rep) = self.repetition.as_mut() else {
            return;
        };
        if rep.playback != playback {
            return;
        }
        if rep.remaining == 0 {
            self.repetition = None;
            return;
        }
        let timer = self.tokens.timer();
        rep.pause = Some(timer);
        effects.push(Effect::StartTimer {
            timer,
            after: self.timings.repeat_pause(),
        });
    }

    fn card_audio(&self, card: usize) -> Option<AudioRef> {
        let resource = self
            .cards
            .get(card)
            .and_then(|flashcard| flashcard.audio_for(&self.language))
            .cloned();
        if resource.is_none() {
            tracing::warn!(language = %self.language, lesson = %self.lesson, card, "card audio missing");
        }
        resource
    }

    fn play(&mut self, resource: AudioRef, effects: &mut Vec<Effect>) -> PlaybackToken {
        let playback = self.tokens.playback();
        self.in_flight.insert(playback);
        effects.push(Effect::PlayAudio { playback, resource });
        playback
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
