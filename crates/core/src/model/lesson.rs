use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ids::{LanguageCode, LessonId};

/// Opaque path of an audio resource (card pronunciation or narration).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioRef(String);

impl AudioRef {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AudioRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioRef({})", self.0)
    }
}

impl fmt::Display for AudioRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single flashcard: a source term plus per-language translation and audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub source_term: String,
    #[serde(default)]
    pub translations: BTreeMap<LanguageCode, String>,
    #[serde(default)]
    pub audio: BTreeMap<LanguageCode, AudioRef>,
    #[serde(default)]
    pub image: String,
}

impl Flashcard {
    #[must_use]
    pub fn translation(&self, language: &LanguageCode) -> Option<&str> {
        self.translations.get(language).map(String::as_str)
    }

    #[must_use]
    pub fn audio_for(&self, language: &LanguageCode) -> Option<&AudioRef> {
        self.audio.get(language)
    }
}

/// Static, read-only content of one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDefinition {
    pub id: LessonId,
    /// One-time explainer played instead of the first card's audio of lesson 1.
    #[serde(default)]
    pub intro_narration: Option<AudioRef>,
    #[serde(default)]
    pub cards: Vec<Flashcard>,
}

/// Source of lesson content keyed by language and lesson id.
pub trait LessonSource: Send + Sync {
    /// Returns the lesson, or `None` if no content exists for that language yet.
    fn lesson(&self, language: &LanguageCode, lesson: LessonId) -> Option<LessonDefinition>;
}
