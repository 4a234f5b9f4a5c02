//! Event loop shared by the session drivers.
//!
//! A [`Driver`] owns one state machine and the [`Host`] running its timer and
//! audio effects. Host completions are fed back into the machine until none
//! are queued; effects the host does not handle collect in an outbox for the
//! session to apply.

use chrono::Duration;

use course_core::effect::Effect;
use course_core::funnel::{FunnelEvent, OnboardingFunnel};
use course_core::home::{HomeEvent, HomeNarrations};
use course_core::runner::{LessonRunner, RunnerEvent};

use crate::host::{AudioPlayer, Host, HostEvent, ManualScheduler, Scheduler};

/// A state machine that reacts to host completions.
pub trait HostDriven {
    fn on_host_event(&mut self, event: HostEvent) -> Vec<Effect>;
}

impl HostDriven for LessonRunner {
    fn on_host_event(&mut self, event: HostEvent) -> Vec<Effect> {
        self.handle(match event {
            HostEvent::TimerElapsed(timer) => RunnerEvent::TimerElapsed(timer),
            HostEvent::AudioEnded(playback) => RunnerEvent::AudioEnded(playback),
            HostEvent::AudioFailed(playback) => RunnerEvent::AudioFailed(playback),
        })
    }
}

impl HostDriven for OnboardingFunnel {
    fn on_host_event(&mut self, event: HostEvent) -> Vec<Effect> {
        self.handle(match event {
            HostEvent::TimerElapsed(timer) => FunnelEvent::TimerElapsed(timer),
            HostEvent::AudioEnded(playback) => FunnelEvent::AudioEnded(playback),
            HostEvent::AudioFailed(playback) => FunnelEvent::AudioFailed(playback),
        })
    }
}

impl HostDriven for HomeNarrations {
    fn on_host_event(&mut self, event: HostEvent) -> Vec<Effect> {
        self.handle(match event {
            HostEvent::TimerElapsed(timer) => HomeEvent::TimerElapsed(timer),
            HostEvent::AudioEnded(playback) => HomeEvent::AudioEnded(playback),
            HostEvent::AudioFailed(playback) => HomeEvent::AudioFailed(playback),
        })
    }
}

pub struct Driver<M, S, A> {
    machine: M,
    host: Host<S, A>,
    outbox: Vec<Effect>,
}

impl<M: HostDriven, S: Scheduler, A: AudioPlayer> Driver<M, S, A> {
    #[must_use]
    pub fn new(machine: M, host: Host<S, A>) -> Self {
        Self {
            machine,
            host,
            outbox: Vec::new(),
        }
    }

    #[must_use]
    pub fn machine(&self) -> &M {
        &self.machine
    }

    #[must_use]
    pub fn host(&self) -> &Host<S, A> {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host<S, A> {
        &mut self.host
    }

    /// Runs `step` against the machine, then every completion already queued.
    pub fn run<F>(&mut self, step: F)
    where
        F: FnOnce(&mut M) -> Vec<Effect>,
    {
        let effects = step(&mut self.machine);
        self.execute(effects);
        self.pump();
    }

    /// Waits for one host completion and processes it. Returns `false` when the host is gone.
    pub async fn wait_next(&mut self) -> bool {
        let Some(event) = self.host.next().await else {
            return false;
        };
        let effects = self.machine.on_host_event(event);
        self.execute(effects);
        self.pump();
        true
    }

    /// Effects left for the session since the last call.
    #[must_use]
    pub fn take_outbox(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.outbox)
    }

    /// Cancels every outstanding timer.
    pub fn shutdown(&mut self) {
        self.host.shutdown();
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            if let Some(left) = self.host.execute(effect) {
                self.outbox.push(left);
            }
        }
    }

    fn pump(&mut self) {
        while let Some(event) = self.host.try_next() {
            let effects = self.machine.on_host_event(event);
            self.execute(effects);
        }
    }
}

impl<M: HostDriven, A: AudioPlayer> Driver<M, ManualScheduler, A> {
    /// Advances virtual time by `delta`, firing timers in deadline order.
    pub fn advance(&mut self, delta: Duration) {
        let mut remaining = delta;
        while let Some(step) = self.host.scheduler().next_due_in() {
            if step > remaining {
                break;
            }
            self.host.scheduler_mut().advance(step);
            remaining -= step;
            self.pump();
        }
        self.host.scheduler_mut().advance(remaining);
        self.pump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimulatedAudio;
    use course_core::effect::TokenSeq;
    use course_core::time::fixed_clock;

    /// Re-arms its timer once, then asks to be shown as done.
    #[derive(Default)]
    struct TwoLaps {
        tokens: TokenSeq,
        laps: u32,
    }

    impl TwoLaps {
        fn arm(&mut self) -> Vec<Effect> {
            vec![Effect::StartTimer {
                timer: self.tokens.timer(),
                after: Duration::seconds(2),
            }]
        }
    }

    impl HostDriven for TwoLaps {
        fn on_host_event(&mut self, event: HostEvent) -> Vec<Effect> {
            let HostEvent::TimerElapsed(_) = event else {
                return Vec::new();
            };
            self.laps += 1;
            if self.laps < 2 {
                self.arm()
            } else {
                vec![Effect::ShowCompletion]
            }
        }
    }

    fn driver() -> Driver<TwoLaps, ManualScheduler, SimulatedAudio> {
        Driver::new(TwoLaps::default(), Host::simulated(fixed_clock()))
    }

    #[test]
    fn advance_fires_timers_armed_along_the_way() {
        let mut driver = driver();
        driver.run(TwoLaps::arm);
        driver.advance(Duration::seconds(3));
        assert_eq!(driver.machine().laps, 1);
        assert!(driver.take_outbox().is_empty());

        driver.advance(Duration::seconds(1));
        assert_eq!(driver.machine().laps, 2);
        assert_eq!(driver.take_outbox(), vec![Effect::ShowCompletion]);
        assert!(driver.take_outbox().is_empty());
    }

    #[test]
    fn host_effects_never_reach_the_outbox() {
        let mut driver = driver();
        driver.run(|_| {
            vec![
                Effect::CancelTimer {
                    timer: TokenSeq::new().timer(),
                },
                Effect::NavigateHome,
            ]
        });
        assert_eq!(driver.take_outbox(), vec![Effect::NavigateHome]);
    }

    #[test]
    fn shutdown_drops_pending_timers() {
        let mut driver = driver();
        driver.run(TwoLaps::arm);
        driver.shutdown();
        driver.advance(Duration::seconds(10));
        assert_eq!(driver.machine().laps, 0);
    }
}
