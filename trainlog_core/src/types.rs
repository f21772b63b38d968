//! Persisted engine state.
//!
//! `EngineState` is the single record that survives restarts: selections,
//! rest preferences, the workout timer, the weekly log, mobility countdowns and
//! the dates a workout was completed. The interval timer is deliberately not
//! part of it.

use crate::config::EngineConfig;
use crate::countdown::MobilityRecord;
use crate::log_store::WeeklyLog;
use crate::plan::Mode;
use crate::timer::CountUpTimer;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const MIN_REST_SECONDS: u32 = 10;
pub const MAX_REST_SECONDS: u32 = 600;
pub const DEFAULT_REST_SECONDS: u32 = 90;

pub fn clamp_rest_seconds(seconds: u32) -> u32 {
    seconds.clamp(MIN_REST_SECONDS, MAX_REST_SECONDS)
}

/// day key → mobility item id → record
pub type MobilityLog = BTreeMap<String, BTreeMap<String, MobilityRecord>>;

/// Full persisted state
///
/// No field carries `#[serde(default)]`: a record missing any top-level field
/// fails to parse and the store falls back to defaults wholesale instead of
/// merging an old shape into a new one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EngineState {
    pub selected_day_key: String,
    pub mode: Mode,
    pub rest_default_seconds: u32,
    pub auto_start_rest_on_set_done: bool,
    pub workout_session: CountUpTimer,
    pub weekly_log: WeeklyLog,
    pub mobility: MobilityLog,
    pub completed_dates: BTreeSet<NaiveDate>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            selected_day_key: "mon".into(),
            mode: Mode::default(),
            rest_default_seconds: DEFAULT_REST_SECONDS,
            auto_start_rest_on_set_done: true,
            workout_session: CountUpTimer::default(),
            weekly_log: WeeklyLog::default(),
            mobility: MobilityLog::new(),
            completed_dates: BTreeSet::new(),
        }
    }
}

impl EngineState {
    /// Fresh state seeded from configured preferences
    pub fn with_defaults(cfg: &EngineConfig) -> Self {
        Self {
            rest_default_seconds: clamp_rest_seconds(cfg.rest_default_seconds),
            auto_start_rest_on_set_done: cfg.auto_start_rest,
            ..Default::default()
        }
    }

    /// Pull loaded values back into range.
    pub fn normalized(mut self) -> Self {
        self.rest_default_seconds = clamp_rest_seconds(self.rest_default_seconds);
        self
    }

    pub fn mobility_record_mut(&mut self, day: &str, item_id: &str) -> &mut MobilityRecord {
        self.mobility
            .entry(day.to_string())
            .or_default()
            .entry(item_id.to_string())
            .or_default()
    }

    pub fn mobility_record(&self, day: &str, item_id: &str) -> Option<&MobilityRecord> {
        self.mobility.get(day)?.get(item_id)
    }
}
