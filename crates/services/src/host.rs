//! Host runtime for the course state machines.
//!
//! A [`Host`] executes the timer and audio effects emitted by a state machine
//! and collects their completions as [`HostEvent`]s on an unbounded channel.
//! Persistence and navigation effects are handed back to the session driver.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use course_core::effect::{Effect, PlaybackToken, TimerToken};
use course_core::model::AudioRef;
use course_core::time::Clock;

use crate::error::AudioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    TimerElapsed(TimerToken),
    AudioEnded(PlaybackToken),
    AudioFailed(PlaybackToken),
}

#[must_use]
pub fn host_channel() -> (UnboundedSender<HostEvent>, UnboundedReceiver<HostEvent>) {
    mpsc::unbounded_channel()
}

fn notify(events: &UnboundedSender<HostEvent>, event: HostEvent) {
    if events.send(event).is_err() {
        tracing::debug!(?event, "host event dropped, driver is gone");
    }
}

//
// ─── SCHEDULERS ────────────────────────────────────────────────────────────────
//

pub trait Scheduler: Send {
    fn schedule(&mut self, timer: TimerToken, after: Duration);
    fn cancel(&mut self, timer: TimerToken);
    /// Drops every outstanding timer.
    fn cancel_all(&mut self);
}

/// Virtual-time scheduler; timers fire only when the clock is advanced.
pub struct ManualScheduler {
    clock: Clock,
    pending: BTreeMap<TimerToken, DateTime<Utc>>,
    events: UnboundedSender<HostEvent>,
}

impl ManualScheduler {
    /// `clock` should be `Clock::Fixed`; a system clock never advances here.
    #[must_use]
    pub fn new(clock: Clock, events: UnboundedSender<HostEvent>) -> Self {
        Self {
            clock,
            pending: BTreeMap::new(),
            events,
        }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Time until the earliest pending timer fires.
    #[must_use]
    pub fn next_due_in(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.pending
            .values()
            .min()
            .map(|deadline| (*deadline - now).max(Duration::zero()))
    }

    /// Moves time forward by `delta` and fires every timer that came due, earliest first.
    pub fn advance(&mut self, delta: Duration) -> usize {
        self.clock.advance(delta);
        let now = self.clock.now();
        let mut due: Vec<(DateTime<Utc>, TimerToken)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(timer, deadline)| (*deadline, *timer))
            .collect();
        due.sort();
        for (_, timer) in &due {
            self.pending.remove(timer);
            notify(&self.events, HostEvent::TimerElapsed(*timer));
        }
        due.len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, timer: TimerToken, after: Duration) {
        self.pending.insert(timer, self.clock.deadline_after(after));
    }

    fn cancel(&mut self, timer: TimerToken) {
        self.pending.remove(&timer);
    }

    fn cancel_all(&mut self) {
        self.pending.clear();
    }
}

/// Wall-clock scheduler backed by `tokio::time::sleep` tasks.
///
/// Must be used from within a tokio runtime.
pub struct TokioScheduler {
    tasks: HashMap<TimerToken, JoinHandle<()>>,
    events: UnboundedSender<HostEvent>,
}

impl TokioScheduler {
    #[must_use]
    pub fn new(events: UnboundedSender<HostEvent>) -> Self {
        Self {
            tasks: HashMap::new(),
            events,
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, timer: TimerToken, after: Duration) {
        self.tasks.retain(|_, task| !task.is_finished());
        let sleep = after.to_std().unwrap_or_default();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(sleep).await;
            notify(&events, HostEvent::TimerElapsed(timer));
        });
        if let Some(previous) = self.tasks.insert(timer, task) {
            previous.abort();
        }
    }

    fn cancel(&mut self, timer: TimerToken) {
        if let Some(task) = self.tasks.remove(&timer) {
            task.abort();
        }
    }

    fn cancel_all(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

//
// ─── AUDIO ─────────────────────────────────────────────────────────────────────
//

pub trait AudioPlayer: Send {
    /// Starts playback; completion is reported later as a `HostEvent`.
    ///
    /// # Errors
    ///
    /// Returns `AudioError` if playback cannot start.
    fn play(&mut self, playback: PlaybackToken, resource: &AudioRef) -> Result<(), AudioError>;
    fn stop(&mut self, playback: PlaybackToken);
}

/// Audio stand-in that finishes every playback instantly.
pub struct SimulatedAudio {
    events: UnboundedSender<HostEvent>,
    missing: HashSet<AudioRef>,
    played: Vec<AudioRef>,
    stopped: Vec<PlaybackToken>,
}

impl SimulatedAudio {
    #[must_use]
    pub fn new(events: UnboundedSender<HostEvent>) -> Self {
        Self {
            events,
            missing: HashSet::new(),
            played: Vec::new(),
            stopped: Vec::new(),
        }
    }

    /// Marks `resource` as unavailable; playing it fails.
    pub fn mark_missing(&mut self, resource: AudioRef) {
        self.missing.insert(resource);
    }

    /// Every resource played so far, in order.
    #[must_use]
    pub fn played(&self) -> &[AudioRef] {
        &self.played
    }

    #[must_use]
    pub fn stopped(&self) -> &[PlaybackToken] {
        &self.stopped
    }
}

impl AudioPlayer for SimulatedAudio {
    fn play(&mut self, playback: PlaybackToken, resource: &AudioRef) -> Result<(), AudioError> {
        if self.missing.contains(resource) {
            return Err(AudioError::Missing(resource.clone()));
        }
        self.played.push(resource.clone());
        notify(&self.events, HostEvent::AudioEnded(playback));
        Ok(())
    }

    fn stop(&mut self, playback: PlaybackToken) {
        self.stopped.push(playback);
    }
}

//
// ─── HOST ──────────────────────────────────────────────────────────────────────
//

pub struct Host<S, A> {
    scheduler: S,
    audio: A,
    events: UnboundedSender<HostEvent>,
    inbox: UnboundedReceiver<HostEvent>,
}

impl Host<ManualScheduler, SimulatedAudio> {
    /// Virtual-time host with simulated audio.
    #[must_use]
    pub fn simulated(clock: Clock) -> Self {
        let (tx, rx) = host_channel();
        let scheduler = ManualScheduler::new(clock, tx.clone());
        let audio = SimulatedAudio::new(tx.clone());
        Self::new(scheduler, audio, tx, rx)
    }
}

impl<S: Scheduler, A: AudioPlayer> Host<S, A> {
    /// `scheduler` and `audio` must report to the sender paired with `inbox`.
    #[must_use]
    pub fn new(
        scheduler: S,
        audio: A,
        events: UnboundedSender<HostEvent>,
        inbox: UnboundedReceiver<HostEvent>,
    ) -> Self {
        Self {
            scheduler,
            audio,
            events,
            inbox,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    /// Runs timer and audio effects. Anything else is returned for the driver.
    pub fn execute(&mut self, effect: Effect) -> Option<Effect> {
        match effect {
            Effect::PlayAudio { playback, resource } => {
                tracing::debug!(?playback, %resource, "play");
                if let Err(err) = self.audio.play(playback, &resource) {
                    tracing::warn!(?playback, error = %err, "audio playback failed");
                    notify(&self.events, HostEvent::AudioFailed(playback));
                }
                None
            }
            Effect::StopAudio { playback } => {
                self.audio.stop(playback);
                None
            }
            Effect::StartTimer { timer, after } => {
                tracing::debug!(?timer, ms = after.num_milliseconds(), "start timer");
                self.scheduler.schedule(timer, after);
                None
            }
            Effect::CancelTimer { timer } => {
                self.scheduler.cancel(timer);
                None
            }
            other => Some(other),
        }
    }

    /// Next completion that is already available, without waiting.
    pub fn try_next(&mut self) -> Option<HostEvent> {
        self.inbox.try_recv().ok()
    }

    /// Waits for the next completion.
    pub async fn next(&mut self) -> Option<HostEvent> {
        self.inbox.recv().await
    }

    /// Cancels every outstanding timer of this host.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        while self.inbox.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::TokenSeq;
    use course_core::time::fixed_clock;

    #[test]
    fn manual_scheduler_fires_in_deadline_order() {
        let (tx, mut rx) = host_channel();
        let mut scheduler = ManualScheduler::new(fixed_clock(), tx);
        let mut tokens = TokenSeq::new();
        let late = tokens.timer();
        let early = tokens.timer();
        scheduler.schedule(late, Duration::seconds(7));
        scheduler.schedule(early, Duration::milliseconds(1_500));

        assert_eq!(scheduler.advance(Duration::seconds(1)), 0);
        assert_eq!(scheduler.next_due_in(), Some(Duration::milliseconds(500)));
        assert_eq!(scheduler.advance(Duration::seconds(10)), 2);
        assert_eq!(rx.try_recv().unwrap(), HostEvent::TimerElapsed(early));
        assert_eq!(rx.try_recv().unwrap(), HostEvent::TimerElapsed(late));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let (tx, mut rx) = host_channel();
        let mut scheduler = ManualScheduler::new(fixed_clock(), tx);
        let timer = TokenSeq::new().timer();
        scheduler.schedule(timer, Duration::seconds(1));
        scheduler.cancel(timer);
        assert_eq!(scheduler.advance(Duration::seconds(5)), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn missing_audio_reports_failure() {
        let mut host = Host::simulated(fixed_clock());
        let missing = AudioRef::new("/audio/jp/none.mp3");
        host.audio_mut().mark_missing(missing.clone());
        let playback = TokenSeq::new().playback();

        let rest = host.execute(Effect::PlayAudio {
            playback,
            resource: missing,
        });
        assert!(rest.is_none());
        assert_eq!(host.try_next(), Some(HostEvent::AudioFailed(playback)));
    }

    #[test]
    fn domain_effects_are_returned() {
        let mut host = Host::simulated(fixed_clock());
        assert_eq!(host.execute(Effect::ShowCompletion), Some(Effect::ShowCompletion));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_sleeps_and_aborts() {
        let (tx, mut rx) = host_channel();
        let mut scheduler = TokioScheduler::new(tx);
        let mut tokens = TokenSeq::new();
        let kept = tokens.timer();
        let dropped = tokens.timer();
        scheduler.schedule(kept, Duration::seconds(7));
        scheduler.schedule(dropped, Duration::seconds(1));
        scheduler.cancel(dropped);

        assert_eq!(rx.recv().await, Some(HostEvent::TimerElapsed(kept)));
    }
}
