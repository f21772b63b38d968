//! Week-indexed record of per-set performance.
//!
//! The hierarchy is week → day → exercise → set. Each level has an explicit
//! accessor that default-constructs the branch on first touch, so callers
//! never walk (or fail on) a missing path.

use crate::clock::Millis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which editable field of a set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetField {
    Load,
    Reps,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    pub load_value: Option<f64>,
    pub reps_value: Option<u32>,
    pub done: bool,
    pub rest_expires_at: Option<Millis>,
}

impl SetRecord {
    /// Fresh record for a set prescribed at `target_reps`
    pub fn with_target(target_reps: Option<u32>) -> Self {
        Self {
            reps_value: target_reps,
            ..Default::default()
        }
    }

    pub fn get(&self, field: SetField) -> Option<f64> {
        match field {
            SetField::Load => self.load_value,
            SetField::Reps => self.reps_value.map(f64::from),
        }
    }

    /// Reps are whole and never negative.
    pub fn set(&mut self, field: SetField, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        match field {
            SetField::Load => self.load_value = value,
            SetField::Reps => self.reps_value = value.map(|v| v.max(0.0).round() as u32),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ExerciseLog {
    pub sets: BTreeMap<u32, SetRecord>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DayLog {
    pub exercises: BTreeMap<String, ExerciseLog>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WeekLog {
    pub days: BTreeMap<String, DayLog>,
}

/// All logged weeks. Serialized with the decimal week number as key.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WeeklyLog {
    pub weeks: BTreeMap<u32, WeekLog>,
}

/// Week before `week`, never below week 1.
pub fn prior_week(week: u32) -> u32 {
    week.saturating_sub(1).max(1)
}

impl WeeklyLog {
    pub fn week_mut(&mut self, week: u32) -> &mut WeekLog {
        self.weeks.entry(week.max(1)).or_default()
    }

    pub fn day_mut(&mut self, week: u32, day: &str) -> &mut DayLog {
        self.week_mut(week).days.entry(day.to_string()).or_default()
    }

    pub fn exercise_mut(&mut self, week: u32, day: &str, exercise_id: &str) -> &mut ExerciseLog {
        self.day_mut(week, day)
            .exercises
            .entry(exercise_id.to_string())
            .or_default()
    }

    /// Existing record, or a default one inserted on the spot.
    pub fn set_record_mut(
        &mut self,
        week: u32,
        day: &str,
        exercise_id: &str,
        set_index: u32,
        target_reps: Option<u32>,
    ) -> &mut SetRecord {
        self.exercise_mut(week, day, exercise_id)
            .sets
            .entry(set_index.max(1))
            .or_insert_with(|| SetRecord::with_target(target_reps))
    }

    pub fn exercise(&self, week: u32, day: &str, exercise_id: &str) -> Option<&ExerciseLog> {
        self.weeks
            .get(&week.max(1))?
            .days
            .get(day)?
            .exercises
            .get(exercise_id)
    }

    pub fn set_record(
        &self,
        week: u32,
        day: &str,
        exercise_id: &str,
        set_index: u32,
    ) -> Option<&SetRecord> {
        self.exercise(week, day, exercise_id)?
            .sets
            .get(&set_index.max(1))
    }

    /// The stored record, or what a first touch would create. Does not insert.
    pub fn get_set_record(
        &self,
        week: u32,
        day: &str,
        exercise_id: &str,
        set_index: u32,
        target_reps: Option<u32>,
    ) -> SetRecord {
        self.set_record(week, day, exercise_id, set_index)
            .cloned()
            .unwrap_or_else(|| SetRecord::with_target(target_reps))
    }

    /// Value logged for the same set one week earlier; `None` if never logged.
    pub fn prior_week_value(
        &self,
        week: u32,
        day: &str,
        exercise_id: &str,
        set_index: u32,
        field: SetField,
    ) -> Option<f64> {
        self.set_record(prior_week(week), day, exercise_id, set_index)?
            .get(field)
    }

    /// Drop everything logged for one day of one week.
    pub fn reset_day(&mut self, week: u32, day: &str) -> bool {
        self.weeks
            .get_mut(&week.max(1))
            .map_or(false, |w| w.days.remove(day).is_some())
    }

    pub fn reset_week(&mut self, week: u32) -> bool {
        self.weeks.remove(&week.max(1)).is_some()
    }
}
