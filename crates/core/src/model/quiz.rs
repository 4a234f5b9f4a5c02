use serde::{Deserialize, Serialize};

use crate::model::lesson::AudioRef;

/// What a funnel step offers once its controls unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum QuizStepKind {
    /// Flavor-only answers; any of them moves to the next step.
    Question { options: Vec<String> },
    /// Single terminal action that completes the funnel.
    Finish,
}

/// One narrated step of the onboarding funnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizStep {
    pub prompt: String,
    pub narration: AudioRef,
    pub delay_ms: u64,
    pub kind: QuizStepKind,
}

impl QuizStep {
    #[must_use]
    pub fn question(
        prompt: impl Into<String>,
        narration: impl Into<String>,
        delay_ms: u64,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            narration: AudioRef::new(narration),
            delay_ms,
            kind: QuizStepKind::Question {
                options: options.into_iter().map(Into::into).collect(),
            },
        }
    }

    #[must_use]
    pub fn finish(prompt: impl Into<String>, narration: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            prompt: prompt.into(),
            narration: AudioRef::new(narration),
            delay_ms,
            kind: QuizStepKind::Finish,
        }
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuizStepKind::Question { options } => options,
            QuizStepKind::Finish => &[],
        }
    }

    #[must_use]
    pub fn is_finish(&self) -> bool {
        matches!(self.kind, QuizStepKind::Finish)
    }
}

/// The onboarding quiz of the Japanese track.
#[must_use]
pub fn default_funnel() -> Vec<QuizStep> {
    vec![
        QuizStep::question(
            "Let's personalize your Japanese journey. I'll ask you 3 questions. \
             First: what is your BIGGEST difficulty with Japanese?",
            "/audio/jp/quiz1.mp3",
            11_000,
            [
                "The 3 alphabets - hiragana, katakana and kanji are too much!",
                "Pronunciation - sounds that don't exist in my language.",
                "Inverted grammar - verb at the end, particles...",
                "I'm a complete beginner and don't know any of these terms.",
            ],
        ),
        QuizStep::question(
            "How do you feel most comfortable studying Japanese?",
            "/audio/jp/quiz2.mp3",
            4_000,
            [
                "With Japanese films and series",
                "With anime scenes",
                "Manga in the original language",
                "Varied content (culture, news, daily life)",
            ],
        ),
        QuizStep::question(
            "What is your main initial learning focus?",
            "/audio/jp/quiz3.mp3",
            3_000,
            [
                "Speaking and understanding (conversation).",
                "Reading and writing.",
                "Everything! I have time to focus on both.",
            ],
        ),
        QuizStep::finish(
            "Perfect, I'm building a study schedule for you. If you study every day, \
             in 9 months you'll be watching and even speaking Japanese!",
            "/audio/jp/quiz4.mp3",
            13_000,
        ),
    ]
}
