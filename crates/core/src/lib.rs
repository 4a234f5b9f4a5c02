#![forbid(unsafe_code)]

pub mod config;
pub mod effect;
pub mod error;
pub mod funnel;
pub mod gate;
pub mod home;
pub mod model;
pub mod runner;
pub mod time;
pub mod unlock;

pub use config::{CourseConfig, RunnerTimings, TrackSpec};
pub use effect::{Effect, PlaybackToken, TimerToken, TokenSeq};
pub use error::Error;
pub use time::Clock;
pub use unlock::{AccessDecision, UnlockEngine};
