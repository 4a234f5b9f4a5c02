//! Language entry routing and the onboarding funnel driver.

use std::sync::Arc;

use chrono::Duration;

use course_core::CourseConfig;
use course_core::effect::Effect;
use course_core::funnel::{FunnelError, FunnelEvent, FunnelState, OnboardingFunnel};
use course_core::model::{LanguageCode, QuizStep};

use crate::flags::FlagStore;
use crate::driver::Driver;
use crate::host::{AudioPlayer, Host, ManualScheduler, Scheduler};

/// Where selecting a language leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRoute {
    Home,
    /// First visit to a track with an onboarding funnel.
    Funnel,
    /// Track not offered yet, or not configured at all.
    Unavailable,
}

/// Decides where selecting `language` leads.
pub async fn entry_route(
    config: &CourseConfig,
    flags: &FlagStore,
    language: &LanguageCode,
) -> EntryRoute {
    let Some(track) = config.track(language) else {
        return EntryRoute::Unavailable;
    };
    if !track.available {
        return EntryRoute::Unavailable;
    }
    if track.funnel && !flags.is_funnel_completed(language).await {
        return EntryRoute::Funnel;
    }
    EntryRoute::Home
}

pub struct FunnelSession<S, A> {
    language: LanguageCode,
    driver: Driver<OnboardingFunnel, S, A>,
    flags: Arc<FlagStore>,
    navigated_home: bool,
}

impl<S: Scheduler, A: AudioPlayer> FunnelSession<S, A> {
    /// # Errors
    ///
    /// Returns `FunnelError` if `steps` is not a well-formed funnel.
    pub fn new(
        steps: Vec<QuizStep>,
        flags: Arc<FlagStore>,
        language: LanguageCode,
        host: Host<S, A>,
    ) -> Result<Self, FunnelError> {
        Ok(Self {
            language,
            driver: Driver::new(OnboardingFunnel::new(steps)?, host),
            flags,
            navigated_home: false,
        })
    }

    #[must_use]
    pub fn funnel(&self) -> &OnboardingFunnel {
        self.driver.machine()
    }

    #[must_use]
    pub fn state(&self) -> FunnelState {
        self.funnel().state()
    }

    #[must_use]
    pub fn host(&self) -> &Host<S, A> {
        self.driver.host()
    }

    #[must_use]
    pub fn navigated_home(&self) -> bool {
        self.navigated_home
    }

    pub async fn enter(&mut self) {
        self.dispatch(FunnelEvent::Enter).await;
    }

    pub async fn select(&mut self, option: usize) {
        self.dispatch(FunnelEvent::Select(option)).await;
    }

    pub async fn finish(&mut self) {
        self.dispatch(FunnelEvent::Finish).await;
    }

    pub async fn cancel(&mut self) {
        self.dispatch(FunnelEvent::Cancel).await;
        self.driver.shutdown();
    }

    pub async fn dispatch(&mut self, event: FunnelEvent) {
        self.driver.run(|funnel| funnel.handle(event));
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
                Effect::MarkFunnelCompleted => {
                    if !self.flags.mark_funnel_completed(&self.language).await {
                        tracing::debug!(language = %self.language, "funnel already completed");
                    }
                }
                Effect::NavigateHome => self.navigated_home = true,
                other => tracing::debug!(?other, "effect not handled by funnel session"),
            }
        }
    }
}

impl<A: AudioPlayer> FunnelSession<ManualScheduler, A> {
    /// Advances virtual time by `delta`, processing every completion on the way.
    pub async fn advance(&mut self, delta: Duration) {
        self.driver.advance(delta);
        self.settle().await;
    }
}
