#![forbid(unsafe_code)]

//! Core timers and training log for the trainlog system.
//!
//! This crate provides:
//! - Wall-clock timers (workout count-up, rest and mobility countdowns, intervals)
//! - The weekly training log and its persisted state
//! - Progression suggestions and the completion streak
//! - The engine that owns all of it, plus the poll tick
//! - Workout journal and CSV rollup

pub mod clock;
pub mod config;
pub mod countdown;
pub mod csv_rollup;
pub mod engine;
pub mod error;
pub mod format;
pub mod interval;
pub mod journal;
pub mod log_store;
pub mod logging;
pub mod notify;
pub mod plan;
pub mod poll;
pub mod progression;
pub mod state;
pub mod streak;
pub mod timer;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use config::Config;
pub use engine::{week_number, Engine};
pub use error::{Error, Result};
pub use interval::{IntervalConfig, IntervalPhase};
pub use journal::{JsonlSink, SessionSink};
pub use log_store::{SetField, SetRecord};
pub use notify::{Notifier, TimerEvent};
pub use plan::{default_plan, Mode, Plan};
pub use state::{JsonFileStore, MemoryStore, StateStore};
pub use timer::SessionSnapshot;
pub use types::EngineState;
