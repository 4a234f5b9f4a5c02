//! Linear onboarding quiz that must be completed once before a track's home view.

use thiserror::Error;

use crate::effect::{Effect, PlaybackToken, TimerToken, TokenSeq, millis};
use crate::gate::Gate;
use crate::model::QuizStep;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FunnelError {
    #[error("onboarding funnel has no steps")]
    Empty,
    #[error("onboarding funnel must end with a finish step")]
    MissingFinish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelState {
    Idle,
    Step(usize),
    Finished,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelEvent {
    Enter,
    /// Any answer option; the choice itself does not matter.
    Select(usize),
    Finish,
    TimerElapsed(TimerToken),
    AudioEnded(PlaybackToken),
    AudioFailed(PlaybackToken),
    Cancel,
}

#[derive(Debug, Clone)]
pub struct OnboardingFunnel {
    steps: Vec<QuizStep>,
    state: FunnelState,
    tokens: TokenSeq,
    gate: Option<Gate<usize>>,
    narration: Option<PlaybackToken>,
}

impl OnboardingFunnel {
    /// # Errors
    ///
    /// Returns `FunnelError` if there are no steps or the last one is not a finish step.
    pub fn new(steps: Vec<QuizStep>) -> Result<Self, FunnelError> {
        let Some(last) = steps.last() else {
            return Err(FunnelError::Empty);
        };
        if !last.is_finish() {
            return Err(FunnelError::MissingFinish);
        }
        Ok(Self {
            steps,
            state: FunnelState::Idle,
            tokens: TokenSeq::new(),
            gate: None,
            narration: None,
        })
    }

    #[must_use]
    pub fn state(&self) -> FunnelState {
        self.state
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn current_step(&self) -> Option<&QuizStep> {
        match self.state {
            FunnelState::Step(index) => self.steps.get(index),
            _ => None,
        }
    }

    /// Whether the current step's options (or finish button) are enabled.
    #[must_use]
    pub fn controls_enabled(&self) -> bool {
        matches!(self.state, FunnelState::Step(_)) && self.gate.as_ref().is_some_and(Gate::is_open)
    }

    pub fn handle(&mut self, event: FunnelEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        match (self.state, event) {
            (FunnelState::Idle, FunnelEvent::Enter) => self.enter_step(0, &mut effects),
            (FunnelState::Idle, FunnelEvent::Cancel) => self.state = FunnelState::Cancelled,
            (FunnelState::Step(index), event) => self.on_step(index, event, &mut effects),
            _ => {}
        }
        effects
    }

    fn on_step(&mut self, index: usize, event: FunnelEvent, effects: &mut Vec<Effect>) {
        let Some(step) = self.steps.get(index) else {
            self.state = FunnelState::Finished;
            return;
        };
        match event {
            FunnelEvent::Select(option) => {
                if step.is_finish() || option >= step.options().len() || !self.controls_enabled() {
                    tracing::debug!(step = index, option, "selection ignored");
                    return;
                }
                self.stop_narration(effects);
                self.enter_step(index + 1, effects);
            }
            FunnelEvent::Finish => {
                if !step.is_finish() || !self.controls_enabled() {
                    return;
                }
                self.stop_narration(effects);
                self.state = FunnelState::Finished;
                effects.push(Effect::MarkFunnelCompleted);
                effects.push(Effect::NavigateHome);
            }
            FunnelEvent::TimerElapsed(token) => {
                if let Some(gate) = self.gate.as_mut() {
                    gate.on_elapsed(token);
                }
            }
            FunnelEvent::AudioEnded(playback) => {
                if self.narration == Some(playback) {
                    self.narration = None;
                }
            }
            FunnelEvent::AudioFailed(playback) => {
                if self.narration == Some(playback) {
                    tracing::warn!(step = index, "funnel narration failed");
                    self.narration = None;
                }
            }
            FunnelEvent::Cancel => {
                self.stop_narration(effects);
                if let Some(cancel) = self.gate.take().and_then(|gate| gate.cancel()) {
                    effects.push(cancel);
                }
                self.state = FunnelState::Cancelled;
            }
            FunnelEvent::Enter => {}
        }
    }

    fn enter_step(&mut self, index: usize, effects: &mut Vec<Effect>) {
        let Some(step) = self.steps.get(index) else {
            self.state = FunnelState::Finished;
            return;
        };
        let resource = step.narration.clone();
        let delay = millis(step.delay_ms);
        self.state = FunnelState::Step(index);

        let playback = self.tokens.playback();
        self.narration = Some(playback);
        effects.push(Effect::PlayAudio { playback, resource });

        let (gate, start) = Gate::arm(index, delay, &mut self.tokens);
        self.gate = Some(gate);
        effects.extend(start);
    }

    fn stop_narration(&mut self, effects: &mut Vec<Effect>) {
        if let Some(playback) = self.narration.take() {
            effects.push(Effect::StopAudio { playback });
        }
    }
}
