use std::sync::Arc;

use course_core::CourseConfig;
use course_core::model::{LanguageCode, LessonId, LessonSource};
use storage::repository::Storage;

use crate::catalog::StaticCatalog;
use crate::error::AppServicesError;
use crate::flags::FlagStore;
use crate::home::HomeSession;
use crate::host::{AudioPlayer, Host, Scheduler};
use crate::kv::FallbackKv;
use crate::lesson_session::LessonSession;
use crate::onboarding::{EntryRoute, FunnelSession, entry_route};
use crate::progress::ProgressStore;

/// Assembles the stores and session factories around one storage backend.
#[derive(Clone)]
pub struct AppServices {
    config: Arc<CourseConfig>,
    progress: Arc<ProgressStore>,
    flags: Arc<FlagStore>,
    catalog: Arc<dyn LessonSource>,
}

impl AppServices {
    /// # Errors
    ///
    /// Returns `AppServicesError` if the configuration is invalid.
    pub fn new(storage: Storage, config: CourseConfig) -> Result<Self, AppServicesError> {
        config.validate().map_err(course_core::Error::from)?;

        let kv = Arc::new(FallbackKv::new(storage.kv));
        Ok(Self {
            progress: Arc::new(ProgressStore::new(Arc::clone(&kv), config.layout.clone())),
            flags: Arc::new(FlagStore::new(kv)),
            config: Arc::new(config),
            catalog: Arc::new(StaticCatalog::empty()),
        })
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the
    /// configuration is invalid.
    pub async fn new_sqlite(db_url: &str, config: CourseConfig) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::new(storage, config)
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn LessonSource>) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub fn config(&self) -> &CourseConfig {
        &self.config
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn flags(&self) -> Arc<FlagStore> {
        Arc::clone(&self.flags)
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.progress.is_degraded()
    }

    pub async fn entry_route(&self, language: &LanguageCode) -> EntryRoute {
        entry_route(&self.config, &self.flags, language).await
    }

    #[must_use]
    pub fn lesson_session<S: Scheduler, A: AudioPlayer>(
        &self,
        language: LanguageCode,
        lesson: LessonId,
        host: Host<S, A>,
    ) -> LessonSession<S, A> {
        LessonSession::open(
            self.catalog.as_ref(),
            self.config.timings,
            self.progress(),
            language,
            lesson,
            host,
        )
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Course` if the configured funnel is malformed.
    pub fn funnel_session<S: Scheduler, A: AudioPlayer>(
        &self,
        language: LanguageCode,
        host: Host<S, A>,
    ) -> Result<FunnelSession<S, A>, AppServicesError> {
        FunnelSession::new(self.config.funnel.clone(), self.flags(), language, host)
            .map_err(|err| AppServicesError::Course(err.into()))
    }

    #[must_use]
    pub fn home_session<S: Scheduler, A: AudioPlayer>(
        &self,
        language: LanguageCode,
        host: Host<S, A>,
    ) -> HomeSession<S, A> {
        HomeSession::new(
            self.progress(),
            self.config.milestones.clone(),
            language,
            host,
        )
    }
}
