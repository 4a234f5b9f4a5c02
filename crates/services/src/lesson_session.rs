//! Drives a `LessonRunner` against a host and the progress store.

use std::sync::Arc;

use chrono::Duration;

use course_core::RunnerTimings;
use course_core::effect::Effect;
use course_core::model::{LanguageCode, LessonId, LessonSource};
use course_core::runner::{LessonRunner, RunnerEvent, RunnerState};

use crate::driver::Driver;
use crate::host::{AudioPlayer, Host, ManualScheduler, Scheduler};
use crate::progress::{CompletionReport, ProgressStore};

pub struct LessonSession<S, A> {
    driver: Driver<LessonRunner, S, A>,
    progress: Arc<ProgressStore>,
    completion: Option<CompletionReport>,
    completion_shown: bool,
}

impl<S: Scheduler, A: AudioPlayer> LessonSession<S, A> {
    /// Loads `lesson` from `source`. Missing content yields a session in the `Empty` state.
    #[must_use]
    pub fn open(
        source: &dyn LessonSource,
        timings: RunnerTimings,
        progress: Arc<ProgressStore>,
        language: LanguageCode,
        lesson: LessonId,
        host: Host<S, A>,
    ) -> Self {
        let definition = source.lesson(&language, lesson);
        let runner = LessonRunner::new(language, lesson, definition, timings);
        Self {
            driver: Driver::new(runner, host),
            progress,
            completion: None,
            completion_shown: false,
        }
    }

    #[must_use]
    pub fn runner(&self) -> &LessonRunner {
        self.driver.machine()
    }

    #[must_use]
    pub fn host(&self) -> &Host<S, A> {
        self.driver.host()
    }

    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.runner().state()
    }

    /// Report of the completion write, once the last card has been passed.
    #[must_use]
    pub fn completion(&self) -> Option<&CompletionReport> {
        self.completion.as_ref()
    }

    #[must_use]
    pub fn completion_shown(&self) -> bool {
        self.completion_shown
    }

    pub async fn start(&mut self) {
        self.dispatch(RunnerEvent::Start).await;
    }

    pub async fn next(&mut self) {
        self.dispatch(RunnerEvent::Next).await;
    }

    pub async fn replay(&mut self) {
        self.dispatch(RunnerEvent::Replay).await;
    }

    /// Tears the lesson down; nothing is recorded.
    pub async fn cancel(&mut self) {
        self.dispatch(RunnerEvent::Cancel).await;
        self.driver.shutdown();
    }

    /// Feeds `event` to the runner, then every completion already queued by the host.
    pub async fn dispatch(&mut self, event: RunnerEvent) {
        self.driver.run(|runner| runner.handle(event));
        self.settle().await;
    }

    /// Waits for one host completion and processes it. Returns `false` when the host is gone.
    pub async fn wait_next(&mut self) -> bool {
        let alive = self.driver.wait_next().await;
        self.settle().await;
        alive
    }

    async fn settle(&mut self) {
        for effect in self.driver.take_outbox() {
            match effect {
                Effect::MarkLessonCompleted { lesson } => {
                    let language = self.runner().language().clone();
                    let report = self.progress.mark_lesson_completed(&language, lesson).await;
                    self.completion = Some(report);
                }
                Effect::ShowCompletion => self.completion_shown = true,
                other => tracing::debug!(?other, "effect not handled by lesson session"),
            }
        }
    }
}

impl<A: AudioPlayer> LessonSession<ManualScheduler, A> {
    /// Advances virtual time by `delta`, processing every completion on the way.
    pub async fn advance(&mut self, delta: Duration) {
        self.driver.advance(delta);
        self.settle().await;
    }
}
