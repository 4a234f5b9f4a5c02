#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod driver;
pub mod error;
pub mod flags;
pub mod home;
pub mod host;
mod kv;
pub mod lesson_session;
pub mod onboarding;
pub mod progress;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use catalog::StaticCatalog;
pub use driver::{Driver, HostDriven};
pub use error::{AppServicesError, AudioError, CatalogError};
pub use flags::FlagStore;
pub use home::HomeSession;
pub use host::{
    AudioPlayer, Host, HostEvent, ManualScheduler, Scheduler, SimulatedAudio, TokioScheduler,
};
pub use kv::{FallbackKv, Persistence};
pub use lesson_session::LessonSession;
pub use onboarding::{EntryRoute, FunnelSession, entry_route};
pub use progress::{CompletionReport, ProgressStore};
