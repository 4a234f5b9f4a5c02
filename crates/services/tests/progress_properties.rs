use course_core::CourseConfig;
use course_core::model::{CompletionOutcome, LanguageCode, LessonId, SessionIndex};
use course_core::unlock::UnlockEngine;
use services::{AppServices, Persistence};
use storage::repository::Storage;

fn services() -> AppServices {
    AppServices::new(Storage::in_memory(), CourseConfig::default()).unwrap()
}

fn jp() -> LanguageCode {
    LanguageCode::new("jp").unwrap()
}

#[tokio::test]
async fn completing_twice_changes_nothing() {
    let services = services();
    let progress = services.progress();
    let first = progress.mark_lesson_completed(&jp(), LessonId::new(1)).await;
    let second = progress.mark_lesson_completed(&jp(), LessonId::new(1)).await;
    assert_eq!(first.record, second.record);
    assert_eq!(first.outcome, second.outcome);
    assert_eq!(second.persistence, Persistence::Durable);
}

#[tokio::test]
async fn unlocked_set_only_grows() {
    let services = services();
    let progress = services.progress();
    let mut previous = progress.get_progress(&jp()).await.unlocked_lessons().clone();
    for id in [1, 2, 2, 1, 3, 9, 4, 5, 5] {
        let report = progress.mark_lesson_completed(&jp(), LessonId::new(id)).await;
        let current = report.record.unlocked_lessons().clone();
        assert!(previous.is_subset(&current), "lesson {id} shrank the unlocked set");
        previous = current;
    }
}

#[tokio::test]
async fn main_session_checkpoint_unlocks_advanced_group() {
    let services = services();
    let progress = services.progress();
    for id in 1..=4 {
        let report = progress.mark_lesson_completed(&jp(), LessonId::new(id)).await;
        assert_eq!(
            report.outcome,
            CompletionOutcome::NextUnlocked {
                next: LessonId::new(id + 1)
            }
        );
        assert!(!report.record.review_completed(SessionIndex::new(1)));
        assert!(!UnlockEngine::new(progress.layout(), &report.record).advanced_unlocked());
    }

    let report = progress.mark_lesson_completed(&jp(), LessonId::new(5)).await;
    assert_eq!(
        report.outcome,
        CompletionOutcome::CheckpointReached {
            session: SessionIndex::new(1)
        }
    );
    assert!(report.record.review_completed(SessionIndex::new(1)));
    // the checkpoint does not unlock lesson 6 individually
    assert!(!report.record.is_unlocked(LessonId::new(6)));
    assert!(UnlockEngine::new(progress.layout(), &report.record).is_accessible(LessonId::new(6)));
}

#[tokio::test]
async fn lesson_three_names_lesson_two_until_it_is_done() {
    let services = services();
    let progress = services.progress();
    progress.mark_lesson_completed(&jp(), LessonId::new(1)).await;

    let record = progress.get_progress(&jp()).await;
    let decision = UnlockEngine::new(progress.layout(), &record).request_open(LessonId::new(3));
    assert_eq!(decision.reason(), Some("Complete lesson 2 to unlock lesson 3."));
}

#[tokio::test]
async fn locked_lesson_is_refused_without_writing() {
    let services = services();
    let progress = services.progress();
    let report = progress.mark_lesson_completed(&jp(), LessonId::new(3)).await;
    assert_eq!(report.outcome, CompletionOutcome::Locked);
    assert_eq!(report.record.last_lesson_completed(), 0);

    let report = progress.mark_lesson_completed(&jp(), LessonId::new(99)).await;
    assert_eq!(report.outcome, CompletionOutcome::Unknown);
}

#[tokio::test]
async fn reads_observe_previous_writes() {
    let services = services();
    let progress = services.progress();
    let report = progress.mark_lesson_completed(&jp(), LessonId::new(1)).await;
    assert_eq!(progress.get_progress(&jp()).await, report.record);

    // a second handle over the same storage sees the same record
    let other = services.clone().progress();
    assert_eq!(other.get_progress(&jp()).await, report.record);
}

#[tokio::test]
async fn sqlite_backed_progress_survives_reconnect() {
    let url = "sqlite:file:memdb_progress_reconnect?mode=memory&cache=shared";
    let first = AppServices::new_sqlite(url, CourseConfig::default())
        .await
        .unwrap();
    let keep_alive = Storage::sqlite(url).await.unwrap();
    first
        .progress()
        .mark_lesson_completed(&jp(), LessonId::new(1))
        .await;

    let second = AppServices::new(keep_alive, CourseConfig::default()).unwrap();
    let record = second.progress().get_progress(&jp()).await;
    assert_eq!(record.last_lesson_completed(), 1);
    assert!(record.is_unlocked(LessonId::new(2)));
}
