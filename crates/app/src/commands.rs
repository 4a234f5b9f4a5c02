//! Subcommand implementations. Results go to stdout, diagnostics to the log.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use course_core::Clock;
use course_core::funnel::FunnelState;
use course_core::model::{LanguageCode, LessonId, ProgressRecord};
use course_core::runner::RunnerState;
use course_core::unlock::{AccessDecision, UnlockEngine};
use services::{
    AppServices, AudioPlayer, EntryRoute, Host, LessonSession, ManualScheduler, SimulatedAudio,
    StaticCatalog,
};

type CommandResult = Result<(), Box<dyn Error>>;

fn virtual_host() -> Host<ManualScheduler, SimulatedAudio> {
    Host::simulated(Clock::fixed(Clock::System.now()))
}

fn print_record(language: &LanguageCode, record: &ProgressRecord) {
    let unlocked: Vec<String> = record
        .unlocked_lessons()
        .iter()
        .map(ToString::to_string)
        .collect();
    let reviews: Vec<String> = record
        .completed_reviews()
        .iter()
        .filter(|(_, done)| **done)
        .map(|(session, _)| session.to_string())
        .collect();
    println!("language:          {language}");
    println!("last completed:    {}", record.last_lesson_completed());
    println!("unlocked lessons:  {}", unlocked.join(", "));
    println!("session reviews:   {}", if reviews.is_empty() { "-".to_owned() } else { reviews.join(", ") });
}

fn describe(lesson: LessonId, decision: &AccessDecision) -> String {
    match decision {
        AccessDecision::Open => format!("lesson {lesson}: open"),
        AccessDecision::Interstitial => {
            format!("lesson {lesson}: unlocked advanced content (coming soon notice)")
        }
        AccessDecision::Blocked { reason: Some(reason) } => format!("lesson {lesson}: {reason}"),
        AccessDecision::Blocked { reason: None } => format!("lesson {lesson}: locked"),
    }
}

pub async fn status(services: &AppServices, language: &LanguageCode) -> CommandResult {
    let record = services.progress().get_progress(language).await;
    print_record(language, &record);

    let engine = UnlockEngine::new(&services.config().layout, &record);
    for session in engine.tiles() {
        let tiles: Vec<String> = session
            .tiles
            .iter()
            .map(|tile| {
                let mark = if tile.accessible { "+" } else { "." };
                format!("{:02}{mark}", tile.lesson.value())
            })
            .collect();
        println!("session {} ({}): {}", session.session, session.title, tiles.join(" "));
    }
    Ok(())
}

pub async fn open(services: &AppServices, language: &LanguageCode, lesson: LessonId) -> CommandResult {
    let record = services.progress().get_progress(language).await;
    let decision = UnlockEngine::new(&services.config().layout, &record).request_open(lesson);
    println!("{}", describe(lesson, &decision));
    Ok(())
}

pub async fn complete(
    services: &AppServices,
    language: &LanguageCode,
    lesson: LessonId,
) -> CommandResult {
    let report = services
        .progress()
        .mark_lesson_completed(language, lesson)
        .await;
    println!("outcome:           {:?}", report.outcome);
    println!("persistence:       {:?}", report.persistence);
    print_record(language, &report.record);
    Ok(())
}

/// Advances virtual time until "next" is enabled. Returns `false` if nothing is left to wait for.
async fn wait_lesson<A: AudioPlayer>(session: &mut LessonSession<ManualScheduler, A>) -> bool {
    while !session.runner().next_enabled() {
        let Some(step) = session.host().scheduler().next_due_in() else {
            return false;
        };
        session.advance(step).await;
    }
    true
}

pub async fn play(
    services: AppServices,
    language: &LanguageCode,
    lesson: LessonId,
    catalog: &Path,
) -> CommandResult {
    let catalog = StaticCatalog::load(catalog)?;
    let services = services.with_catalog(Arc::new(catalog));

    let record = services.progress().get_progress(language).await;
    let decision = UnlockEngine::new(&services.config().layout, &record).request_open(lesson);
    if !decision.is_open() {
        println!("{}", describe(lesson, &decision));
        return Ok(());
    }

    let mut session = services.lesson_session(language.clone(), lesson, virtual_host());
    session.start().await;
    if session.state() == RunnerState::Empty {
        println!("lesson {lesson}: no lesson content for {language}");
        return Ok(());
    }

    while let Some(card) = session.runner().current_card().cloned() {
        let position = session.runner().card_position().unwrap_or_default();
        let translation = card.translation(language).unwrap_or("?");
        println!("[{position}] {} - {translation}", card.source_term);
        if !wait_lesson(&mut session).await {
            tracing::warn!(%lesson, "next control never enabled");
            break;
        }
        session.next().await;
    }

    for resource in session.host().audio().played() {
        tracing::debug!(%resource, "played");
    }
    match session.completion() {
        Some(report) => println!("completed: {:?} ({:?})", report.outcome, report.persistence),
        None => println!("lesson {lesson} not completed"),
    }
    Ok(())
}

pub async fn enter(services: &AppServices, language: &LanguageCode) -> CommandResult {
    let flags = services.flags();
    if flags.mark_sound_warning_seen().await {
        println!("Lessons are narrated: turn your sound on.");
    }

    match services.entry_route(language).await {
        EntryRoute::Unavailable => println!("{language}: coming soon"),
        EntryRoute::Funnel => {
            println!("{language}: onboarding quiz first (course quiz --lang {language})");
        }
        EntryRoute::Home => {
            let mut home = services.home_session(language.clone(), virtual_host());
            home.enter().await;
            for resource in home.host().audio().played() {
                println!("narration: {resource}");
            }
            while home.narrations().has_pending() {
                let Some(step) = home.host().scheduler().next_due_in() else {
                    break;
                };
                home.advance(step).await;
            }
            home.leave().await;
            status(services, language).await?;
        }
    }
    Ok(())
}

pub async fn quiz(services: &AppServices, language: &LanguageCode, answers: Vec<usize>) -> CommandResult {
    if services.entry_route(language).await != EntryRoute::Funnel {
        println!("{language}: no onboarding quiz pending");
        return Ok(());
    }

    let mut session = services.funnel_session(language.clone(), virtual_host())?;
    session.enter().await;
    let mut answers = answers.into_iter();

    while let FunnelState::Step(index) = session.state() {
        let Some(step) = session.funnel().current_step().cloned() else {
            break;
        };
        println!("[{}/{}] {}", index + 1, session.funnel().step_count(), step.prompt);

        while !session.funnel().controls_enabled() {
            let Some(delay) = session.host().scheduler().next_due_in() else {
                break;
            };
            session.advance(delay).await;
        }

        if step.is_finish() {
            session.finish().await;
            continue;
        }
        let option = answers.next().unwrap_or(0);
        let Some(label) = step.options().get(option) else {
            return Err(format!("option {option} does not exist for question {}", index + 1).into());
        };
        println!("  > {label}");
        session.select(option).await;
        if session.state() == FunnelState::Step(index) {
            return Err(format!("question {} did not accept an answer", index + 1).into());
        }
    }

    if session.navigated_home() {
        println!("{language}: onboarding complete");
    }
    Ok(())
}
