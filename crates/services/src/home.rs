//! Language home view: tile states, open requests and one-time narrations.

use std::sync::Arc;

use chrono::Duration;

use course_core::effect::Effect;
use course_core::home::{HomeEvent, HomeNarrations};
use course_core::model::{LanguageCode, LessonId, MilestoneSpec};
use course_core::unlock::{AccessDecision, SessionTiles, UnlockEngine};

use crate::driver::Driver;
use crate::host::{AudioPlayer, Host, ManualScheduler, Scheduler};
use crate::progress::ProgressStore;

pub struct HomeSession<S, A> {
    language: LanguageCode,
    milestones: Vec<MilestoneSpec>,
    driver: Driver<HomeNarrations, S, A>,
    progress: Arc<ProgressStore>,
}

impl<S: Scheduler, A: AudioPlayer> HomeSession<S, A> {
    #[must_use]
    pub fn new(
        progress: Arc<ProgressStore>,
        milestones: Vec<MilestoneSpec>,
        language: LanguageCode,
        host: Host<S, A>,
    ) -> Self {
        Self {
            language,
            milestones,
            driver: Driver::new(HomeNarrations::new(), host),
            progress,
        }
    }

    #[must_use]
    pub fn host(&self) -> &Host<S, A> {
        self.driver.host()
    }

    #[must_use]
    pub fn narrations(&self) -> &HomeNarrations {
        self.driver.machine()
    }

    /// Starts every due narration for the current progress.
    pub async fn enter(&mut self) {
        let record = self.progress.get_progress(&self.language).await;
        let milestones = &self.milestones;
        self.driver.run(|narrations| narrations.enter(milestones, &record));
        self.settle().await;
    }

    pub async fn leave(&mut self) {
        self.driver.run(|narrations| narrations.handle(HomeEvent::Cancel));
        self.settle().await;
        self.driver.shutdown();
    }

    /// What clicking the tile of `lesson` does right now.
    pub async fn request_open(&self, lesson: LessonId) -> AccessDecision {
        if self.narrations().is_gated(lesson) {
            return AccessDecision::Blocked { reason: None };
        }
        let record = self.progress.get_progress(&self.language).await;
        UnlockEngine::new(self.progress.layout(), &record).request_open(lesson)
    }

    /// Tile states; lessons locked by a running narration report inaccessible.
    pub async fn tiles(&self) -> Vec<SessionTiles> {
        let record = self.progress.get_progress(&self.language).await;
        let mut sessions = UnlockEngine::new(self.progress.layout(), &record).tiles();
        for tile in sessions.iter_mut().flat_map(|session| session.tiles.iter_mut()) {
            if self.narrations().is_gated(tile.lesson) {
                tile.accessible = false;
            }
        }
        sessions
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
                Effect::MarkMilestonePlayed { key } => {
                    self.progress
                        .mark_audio_milestone_played(&self.language, key)
                        .await;
                }
                other => tracing::debug!(?other, "effect not handled by home session"),
            }
        }
    }
}

impl<A: AudioPlayer> HomeSession<ManualScheduler, A> {
    /// Advances virtual time by `delta`, processing every completion on the way.
    pub async fn advance(&mut self, delta: Duration) {
        self.driver.advance(delta);
        self.settle().await;
    }
}
