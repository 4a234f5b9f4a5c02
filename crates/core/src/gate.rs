//! The gating primitive: a control tied to `subject` becomes enabled once
//! `duration` has elapsed, independently of any audio playing meanwhile.

use chrono::Duration;

use crate::effect::{Effect, TimerToken, TokenSeq};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate<S> {
    subject: S,
    timer: TimerToken,
    duration: Duration,
    open: bool,
}

impl<S> Gate<S> {
    /// Arms a gate for `subject`.
    ///
    /// Returns the `StartTimer` effect the host must schedule, or `None` when
    /// the duration is not positive and the gate starts open.
    pub fn arm(subject: S, duration: Duration, tokens: &mut TokenSeq) -> (Self, Option<Effect>) {
        let timer = tokens.timer();
        let open = duration <= Duration::zero();
        let effect = (!open).then_some(Effect::StartTimer {
            timer,
            after: duration,
        });
        (
            Self {
                subject,
                timer,
                duration,
                open,
            },
            effect,
        )
    }

    #[must_use]
    pub fn subject(&self) -> &S {
        &self.subject
    }

    #[must_use]
    pub fn timer(&self) -> TimerToken {
        self.timer
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens the gate if `token` is its own timer. Returns `true` when this call opened it.
    pub fn on_elapsed(&mut self, token: TimerToken) -> bool {
        if self.open || token != self.timer {
            return false;
        }
        self.open = true;
        true
    }

    /// Effect cancelling the pending countdown, if it has not fired yet.
    #[must_use]
    pub fn cancel(&self) -> Option<Effect> {
        (!self.open).then_some(Effect::CancelTimer { timer: self.timer })
    }
}
