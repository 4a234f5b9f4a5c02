//! Lesson content loaded from a JSON document.
//!
//! ```json
//! {
//!   "lessons": [
//!     {
//!       "id": 1,
//!       "intro_narrations": { "jp": "/audio/narrations/japones/aula1_intro.mp3" },
//!       "cards": [
//!         {
//!           "source_term": "água",
//!           "translations": { "jp": "mizu" },
//!           "audio": { "jp": "/audio/jp/mizu.mp3" },
//!           "image": "/img/agua.png"
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use course_core::model::{AudioRef, Flashcard, LanguageCode, LessonDefinition, LessonId, LessonSource};

use crate::error::CatalogError;

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    lessons: Vec<CatalogLesson>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogLesson {
    id: LessonId,
    #[serde(default)]
    intro_narrations: BTreeMap<LanguageCode, AudioRef>,
    #[serde(default)]
    cards: Vec<Flashcard>,
}

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    lessons: HashMap<LessonId, CatalogLesson>,
}

impl StaticCatalog {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `CatalogError` if the document is malformed or defines a lesson twice.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        let mut lessons = HashMap::with_capacity(document.lessons.len());
        for lesson in document.lessons {
            let id = lesson.id;
            if lessons.insert(id, lesson).is_some() {
                return Err(CatalogError::DuplicateLesson(id));
            }
        }
        Ok(Self { lessons })
    }

    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

impl LessonSource for StaticCatalog {
    /// Only cards translated into `language` are included; a lesson with none
    /// counts as missing for that language.
    fn lesson(&self, language: &LanguageCode, lesson: LessonId) -> Option<LessonDefinition> {
        let entry = self.lessons.get(&lesson)?;
        let cards: Vec<Flashcard> = entry
            .cards
            .iter()
            .filter(|card| card.translation(language).is_some())
            .cloned()
            .collect();
        if cards.is_empty() {
            return None;
        }
        Some(LessonDefinition {
            id: entry.id,
            intro_narration: entry.intro_narrations.get(language).cloned(),
            cards,
        })
    }
}
