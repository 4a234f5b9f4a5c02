//! One-time boolean flags outside the progress record.

use std::sync::Arc;

use course_core::model::LanguageCode;

use crate::kv::{FallbackKv, Persistence};

const SOUND_WARNING_KEY: &str = "flag:sound-warning-seen";
const TRUE: &str = "true";

#[must_use]
pub fn funnel_key(language: &LanguageCode) -> String {
    format!("funnel-completed:{language}")
}

pub struct FlagStore {
    kv: Arc<FallbackKv>,
}

impl FlagStore {
    #[must_use]
    pub fn new(kv: Arc<FallbackKv>) -> Self {
        Self { kv }
    }

    pub async fn is_funnel_completed(&self, language: &LanguageCode) -> bool {
        self.is_set(&funnel_key(language)).await
    }

    /// Sets the funnel flag. Returns `true` only when this call set it.
    pub async fn mark_funnel_completed(&self, language: &LanguageCode) -> bool {
        self.set_once(&funnel_key(language)).await
    }

    pub async fn has_seen_sound_warning(&self) -> bool {
        self.is_set(SOUND_WARNING_KEY).await
    }

    pub async fn mark_sound_warning_seen(&self) -> bool {
        self.set_once(SOUND_WARNING_KEY).await
    }

    #[must_use]
    pub fn persistence(&self) -> Persistence {
        self.kv.persistence()
    }

    async fn is_set(&self, key: &str) -> bool {
        self.kv.read(key).await.is_some_and(|value| value == TRUE)
    }

    async fn set_once(&self, key: &str) -> bool {
        if self.is_set(key).await {
            return false;
        }
        let persistence = self.kv.write(key, TRUE).await;
        tracing::debug!(key, ?persistence, "flag set");
        true
    }
}
