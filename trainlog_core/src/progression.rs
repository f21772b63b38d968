//! Progression advisor for next week's training parameters.
//!
//! Every function here is pure: it reads the weekly log and the week number
//! and never writes anything back.
//! - Strength: +increment on the prior week's mean load, only if every set hit
//!   its target reps
//! - Intervals: more rounds across the block, 6 rounds and a speed bump on deload
//! - Tempo: +2 min every second week, capped at 20
//! - Long run: +5 min per week (max +25), back to base on deload

use crate::config::ProgressionConfig;
use crate::log_store::{prior_week, WeeklyLog};
use crate::plan::{DayPlan, ExerciseSpec, MainBlock, RunProgression};
use serde::Serialize;

/// Every 4th training week backs off instead of progressing.
pub fn is_deload_week(week: u32) -> bool {
    week % 4 == 0
}

/// Unilateral work (split squats, lunges, step-ups) jumps in smaller steps.
/// Calf raises always take the full step, single-leg or not.
fn is_unilateral(name: &str) -> bool {
    let name = name.to_lowercase();
    if name.contains("calf") {
        return false;
    }
    ["split", "lunge", "step"].iter().any(|p| name.contains(p))
}

/// Round to the nearest 0.5; an exact tie goes to the lower half step.
pub fn round_to_half(value: f64) -> f64 {
    ((value * 2.0) - 0.5).ceil() / 2.0
}

/// Suggested load for `exercise` on `day` this week
///
/// Returns `None` when last week's log is incomplete or any set fell short of
/// the prescribed reps: no automatic progression is offered then.
pub fn strength_suggestion(
    log: &WeeklyLog,
    week: u32,
    day: &str,
    exercise: &ExerciseSpec,
    cfg: &ProgressionConfig,
) -> Option<f64> {
    if exercise.sets == 0 {
        return None;
    }

    let last = log.exercise(prior_week(week), day, &exercise.id)?;

    let mut total_load = 0.0;
    for set_index in 1..=exercise.sets {
        let record = last.sets.get(&set_index)?;
        if record.reps_value.unwrap_or(0) < exercise.target_reps {
            tracing::debug!(
                "No suggestion for {}: set {} missed target reps",
                exercise.id,
                set_index
            );
            return None;
        }
        total_load += record.load_value.unwrap_or(0.0);
    }

    let mean = total_load / f64::from(exercise.sets);
    let increment = if is_unilateral(&exercise.name) {
        cfg.unilateral_increment
    } else {
        cfg.bilateral_increment
    };

    Some(round_to_half(mean + increment))
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct IntervalSuggestion {
    pub rounds: u32,
    /// Pace increase in km/h on top of last block's speed
    pub speed_bump: f64,
}

pub fn interval_suggestion(week: u32, cfg: &ProgressionConfig) -> IntervalSuggestion {
    if is_deload_week(week) {
        return IntervalSuggestion {
            rounds: 6,
            speed_bump: cfg.deload_speed_bump,
        };
    }

    IntervalSuggestion {
        rounds: (6 + week % 4).min(8),
        speed_bump: 0.0,
    }
}

pub fn tempo_minutes(week: u32, base: u32) -> u32 {
    base.saturating_add((week / 2).saturating_mul(2)).min(20)
}

pub fn long_run_minutes(week: u32, base: u32) -> u32 {
    if is_deload_week(week) {
        return base;
    }
    base.saturating_add(week.saturating_mul(5).min(25))
}

/// Advisories relevant to one day of the plan
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DaySuggestions {
    Strength {
        /// (exercise id, suggested load) in plan order
        loads: Vec<(String, Option<f64>)>,
    },
    Interval(IntervalSuggestion),
    Tempo {
        minutes: u32,
    },
    LongRun {
        minutes: u32,
    },
    None,
}

pub fn day_suggestions(
    day: &DayPlan,
    log: &WeeklyLog,
    week: u32,
    cfg: &ProgressionConfig,
) -> DaySuggestions {
    match &day.main {
        MainBlock::Strength { exercises } => DaySuggestions::Strength {
            loads: exercises
                .iter()
                .map(|ex| (ex.id.clone(), strength_suggestion(log, week, &day.key, ex, cfg)))
                .collect(),
        },
        MainBlock::Run {
            progression: Some(kind),
            ..
        } => match kind {
            RunProgression::Interval => DaySuggestions::Interval(interval_suggestion(week, cfg)),
            RunProgression::Tempo => DaySuggestions::Tempo {
                minutes: tempo_minutes(week, cfg.tempo_base_minutes),
            },
            RunProgression::LongRun => DaySuggestions::LongRun {
                minutes: long_run_minutes(week, cfg.long_run_base_minutes),
            },
        },
        _ => DaySuggestions::None,
    }
}
