use std::sync::Arc;

use chrono::Duration;
use course_core::CourseConfig;
use course_core::model::{AudioRef, CompletionOutcome, LanguageCode, LessonId};
use course_core::runner::RunnerState;
use course_core::time::fixed_clock;
use services::{AppServices, Host, LessonSession, ManualScheduler, SimulatedAudio, StaticCatalog};
use storage::repository::Storage;

const CATALOG: &str = r#"{
    "lessons": [
        {
            "id": 1,
            "intro_narrations": { "jp": "/audio/narrations/japones/aula1_intro.mp3" },
            "cards": [
                { "source_term": "água", "translations": { "jp": "mizu" }, "audio": { "jp": "/audio/jp/mizu.mp3" } },
                { "source_term": "casa", "translations": { "jp": "ie" }, "audio": { "jp": "/audio/jp/ie.mp3" } }
            ]
        },
        {
            "id": 2,
            "cards": [
                { "source_term": "gato", "translations": { "jp": "neko" }, "audio": { "jp": "/audio/jp/neko.mp3" } },
                { "source_term": "cão", "translations": { "jp": "inu" }, "audio": { "jp": "/audio/jp/inu.mp3" } }
            ]
        }
    ]
}"#;

type SimSession = LessonSession<ManualScheduler, SimulatedAudio>;

fn jp() -> LanguageCode {
    LanguageCode::new("jp").unwrap()
}

fn services() -> AppServices {
    let catalog = StaticCatalog::from_json(CATALOG).unwrap();
    AppServices::new(Storage::in_memory(), CourseConfig::default())
        .unwrap()
        .with_catalog(Arc::new(catalog))
}

fn open(services: &AppServices, lesson: u32) -> SimSession {
    services.lesson_session(jp(), LessonId::new(lesson), Host::simulated(fixed_clock()))
}

fn plays_of(session: &SimSession, resource: &str) -> usize {
    session
        .host()
        .audio()
        .played()
        .iter()
        .filter(|played| played.as_str() == resource)
        .count()
}

#[tokio::test]
async fn intro_card_is_gated_for_fourteen_seconds() {
    let services = services();
    let mut session = open(&services, 1);
    session.start().await;

    assert_eq!(
        session.host().audio().played(),
        &[AudioRef::new("/audio/narrations/japones/aula1_intro.mp3")]
    );
    assert_eq!(session.runner().next_delay(), Some(Duration::seconds(14)));

    session.advance(Duration::milliseconds(13_999)).await;
    session.next().await;
    assert_eq!(session.runner().card_index(), Some(0));

    session.advance(Duration::milliseconds(1)).await;
    assert!(session.runner().next_enabled());
    session.next().await;
    assert_eq!(session.runner().card_index(), Some(1));
    assert_eq!(session.runner().next_delay(), Some(Duration::seconds(7)));
}

#[tokio::test]
async fn card_audio_repeats_three_times_with_pauses() {
    let services = services();
    services
        .progress()
        .mark_lesson_completed(&jp(), LessonId::new(1))
        .await;
    let mut session = open(&services, 2);
    session.start().await;
    assert_eq!(plays_of(&session, "/audio/jp/neko.mp3"), 1);

    session.advance(Duration::milliseconds(1_499)).await;
    assert_eq!(plays_of(&session, "/audio/jp/neko.mp3"), 1);
    session.advance(Duration::milliseconds(1)).await;
    assert_eq!(plays_of(&session, "/audio/jp/neko.mp3"), 2);
    session.advance(Duration::milliseconds(1_500)).await;
    assert_eq!(plays_of(&session, "/audio/jp/neko.mp3"), 3);

    session.advance(Duration::seconds(10)).await;
    assert_eq!(plays_of(&session, "/audio/jp/neko.mp3"), 3);
    assert!(session.runner().next_enabled());

    session.replay().await;
    assert_eq!(plays_of(&session, "/audio/jp/neko.mp3"), 4);
}

#[tokio::test]
async fn finishing_records_completion_once() {
    let services = services();
    let mut session = open(&services, 1);
    session.start().await;
    session.advance(Duration::seconds(14)).await;
    session.next().await;
    session.advance(Duration::seconds(7)).await;
    assert!(session.runner().is_last_card());
    session.next().await;

    assert_eq!(session.state(), RunnerState::Completed);
    assert!(session.completion_shown());
    let report = session.completion().unwrap();
    assert_eq!(
        report.outcome,
        CompletionOutcome::NextUnlocked {
            next: LessonId::new(2)
        }
    );

    session.next().await;
    let record = services.progress().get_progress(&jp()).await;
    assert_eq!(record.last_lesson_completed(), 1);
    assert_eq!(session.host().scheduler().pending(), 0);
}

#[tokio::test]
async fn cancel_mid_lesson_records_nothing() {
    let services = services();
    let mut session = open(&services, 1);
    session.start().await;
    session.advance(Duration::seconds(3)).await;
    session.cancel().await;

    assert_eq!(session.state(), RunnerState::Cancelled);
    assert_eq!(session.host().scheduler().pending(), 0);
    assert!(session.completion().is_none());
    let record = services.progress().get_progress(&jp()).await;
    assert_eq!(record.last_lesson_completed(), 0);
}

#[tokio::test]
async fn missing_lesson_is_empty() {
    let services = services();
    let mut session = open(&services, 4);
    session.start().await;
    assert_eq!(session.state(), RunnerState::Empty);
    assert!(session.host().audio().played().is_empty());
}

#[tokio::test]
async fn missing_audio_does_not_block_the_gate() {
    let services = services();
    let mut host = Host::simulated(fixed_clock());
    host.audio_mut().mark_missing(AudioRef::new("/audio/jp/neko.mp3"));
    let mut session = services.lesson_session(jp(), LessonId::new(2), host);

    session.start().await;
    assert!(session.host().audio().played().is_empty());
    session.advance(Duration::seconds(7)).await;
    assert!(session.runner().next_enabled());
}
