use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when building identifiers from raw input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("failed to parse {kind} from {raw:?}")]
    Parse { kind: &'static str, raw: String },

    #[error("invalid language code: {0:?}")]
    InvalidLanguage(String),
}

/// Language track code such as `jp` or `en`.
///
/// Always lowercase ASCII letters, 2 to 8 characters long.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Validates and wraps a language code.
    ///
    /// Surrounding whitespace is trimmed and the code is lowercased.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidLanguage` for empty, too long or non-alphabetic codes.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdError> {
        let code = raw.as_ref().trim().to_ascii_lowercase();
        let valid_len = (2..=8).contains(&code.len());
        if !valid_len || !code.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(IdError::InvalidLanguage(raw.as_ref().to_owned()));
        }
        Ok(Self(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl FromStr for LanguageCode {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Identifier of a lesson (a "module" tile on the home screen).
///
/// Lesson ids form a strict total order starting at 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(u32);

impl LessonId {
    /// The first lesson of every course; always playable.
    pub const FIRST: LessonId = LessonId(1);

    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The lesson that follows this one in the total order.
    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The lesson that must be completed before this one, if any.
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        (self.0 > 1).then(|| Self(self.0 - 1))
    }
}

/// One-based index of a session (a top-level grouping of lessons).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionIndex(u32);

impl SessionIndex {
    #[must_use]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageCode({})", self.0)
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Debug for SessionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionIndex({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SessionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

impl FromStr for LessonId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(LessonId::new).map_err(|_| IdError::Parse {
            kind: "LessonId",
            raw: s.to_owned(),
        })
    }
}

impl FromStr for SessionIndex {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(SessionIndex::new)
            .map_err(|_| IdError::Parse {
                kind: "SessionIndex",
                raw: s.to_owned(),
            })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_code_is_normalized() {
        let code = LanguageCode::new(" JP ").unwrap();
        assert_eq!(code.as_str(), "jp");
        assert_eq!(code.to_string(), "jp");
    }

    #[test]
    fn language_code_rejects_garbage() {
        assert!(LanguageCode::new("").is_err());
        assert!(LanguageCode::new("j").is_err());
        assert!(LanguageCode::new("pt-br").is_err());
        assert!(LanguageCode::new("verylongcode").is_err());
    }

    #[test]
    fn language_code_deserializes_through_validation() {
        let code: LanguageCode = serde_json::from_str("\"kr\"").unwrap();
        assert_eq!(code, LanguageCode::new("kr").unwrap());
        assert!(serde_json::from_str::<LanguageCode>("\"k1\"").is_err());
    }

    #[test]
    fn lesson_id_neighbours() {
        let id = LessonId::new(3);
        assert_eq!(id.next(), LessonId::new(4));
        assert_eq!(id.previous(), Some(LessonId::new(2)));
        assert_eq!(LessonId::FIRST.previous(), None);
    }

    #[test]
    fn lesson_id_from_str() {
        let id: LessonId = "12".parse().unwrap();
        assert_eq!(id, LessonId::new(12));
        assert!("twelve".parse::<LessonId>().is_err());
    }

    #[test]
    fn session_index_display() {
        assert_eq!(SessionIndex::new(2).to_string(), "2");
        let parsed: SessionIndex = "4".parse().unwrap();
        assert_eq!(parsed, SessionIndex::new(4));
    }
}
