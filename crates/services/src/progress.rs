//! Per-language progress persistence.
//!
//! Records are stored as camelCase JSON under `progress:<lang>`. Every read
//! goes to storage so separate views observe each other's writes.

use std::sync::Arc;

use course_core::model::{
    CompletionOutcome, CourseLayout, LanguageCode, LessonId, MilestoneKey, ProgressRecord,
};
use tokio::sync::Mutex;

use crate::kv::{FallbackKv, Persistence};

/// Result of `ProgressStore::mark_lesson_completed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub outcome: CompletionOutcome,
    /// The record after the call.
    pub record: ProgressRecord,
    pub persistence: Persistence,
}

#[must_use]
pub fn progress_key(language: &LanguageCode) -> String {
    format!("progress:{language}")
}

pub struct ProgressStore {
    kv: Arc<FallbackKv>,
    layout: CourseLayout,
    // serializes read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<FallbackKv>, layout: CourseLayout) -> Self {
        Self {
            kv,
            layout,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn layout(&self) -> &CourseLayout {
        &self.layout
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.kv.is_degraded()
    }

    /// Stored record for `language`, or the default one. Never fails.
    pub async fn get_progress(&self, language: &LanguageCode) -> ProgressRecord {
        let key = progress_key(language);
        let Some(raw) = self.kv.read(&key).await else {
            return ProgressRecord::default();
        };
        match serde_json::from_str::<ProgressRecord>(&raw) {
            Ok(record) => record.repaired(),
            Err(err) => {
                tracing::warn!(%language, error = %err, "unreadable progress record, starting fresh");
                ProgressRecord::default()
            }
        }
    }

    /// Records `lesson` as completed. Repeating the call changes nothing.
    pub async fn mark_lesson_completed(
        &self,
        language: &LanguageCode,
        lesson: LessonId,
    ) -> CompletionReport {
        let _guard = self.write_lock.lock().await;
        let mut record = self.get_progress(language).await;
        let before = record.clone();
        let outcome = record.complete_lesson(&self.layout, lesson);

        let persistence = if record == before {
            self.kv.persistence()
        } else {
            self.save(language, &record).await
        };

        match outcome {
            CompletionOutcome::Locked | CompletionOutcome::Unknown => {
                tracing::info!(%language, %lesson, ?outcome, "completion refused");
            }
            _ => tracing::debug!(%language, %lesson, ?outcome, "lesson completed"),
        }

        CompletionReport {
            outcome,
            record,
            persistence,
        }
    }

    /// Sets the one-time narration flag `key`. No unlock effect.
    pub async fn mark_audio_milestone_played(
        &self,
        language: &LanguageCode,
        key: MilestoneKey,
    ) -> Persistence {
        let _guard = self.write_lock.lock().await;
        let mut record = self.get_progress(language).await;
        if record.mark_milestone_played(key) {
            self.save(language, &record).await
        } else {
            self.kv.persistence()
        }
    }

    async fn save(&self, language: &LanguageCode, record: &ProgressRecord) -> Persistence {
        match serde_json::to_string(record) {
            Ok(raw) => self.kv.write(&progress_key(language), &raw).await,
            Err(err) => {
                tracing::warn!(%language, error = %err, "cannot encode progress record");
                Persistence::MemoryOnly
            }
        }
    }
}
