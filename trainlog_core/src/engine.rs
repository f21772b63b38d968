//! The engine: one owner for all state, one door for every mutation.
//!
//! `Engine` wraps the persisted `EngineState`, the plan, the clock and the
//! store, plus the ephemeral interval timer. Every mutating operation
//! persists synchronously before returning. Invalid transitions are no-ops,
//! out-of-range inputs are clamped, and a failed save is logged rather than
//! returned; use `flush` when the caller needs the save result.

use crate::clock::{Clock, Millis};
use crate::config::{Config, ProgressionConfig};
use crate::interval::{IntervalConfig, IntervalTimer};
use crate::log_store::{SetField, SetRecord};
use crate::notify::{Notifier, TimerEvent};
use crate::plan::{DayPlan, Mode, Plan};
use crate::progression::{self, DaySuggestions};
use crate::state::StateStore;
use crate::streak::compute_streak;
use crate::timer::SessionSnapshot;
use crate::types::{clamp_rest_seconds, EngineState};
use crate::Result;
use chrono::NaiveDate;

/// Training week containing `today`, counting from 1 at `anchor`.
///
/// Dates before the anchor are still week 1.
pub fn week_number(today: NaiveDate, anchor: NaiveDate) -> u32 {
    let days = (today - anchor).num_days();
    let week = days.div_euclid(7) + 1;
    week.clamp(1, i64::from(u32::MAX)) as u32
}

/// Week key as stored and displayed
pub fn week_key(week: u32) -> String {
    week.max(1).to_string()
}

pub struct Engine<C: Clock, S: StateStore> {
    clock: C,
    store: S,
    plan: Plan,
    epoch_anchor: NaiveDate,
    progression: ProgressionConfig,
    state: EngineState,
    interval: IntervalTimer,
    interval_config: IntervalConfig,
}

impl<C: Clock, S: StateStore> Engine<C, S> {
    /// Load persisted state (or start fresh) and wire up the collaborators.
    pub fn new(clock: C, store: S, plan: Plan, config: &Config) -> Self {
        let state = store
            .load()
            .unwrap_or_else(|| EngineState::with_defaults(&config.engine));

        Self {
            clock,
            store,
            plan,
            epoch_anchor: config.engine.epoch_anchor,
            progression: config.progression.clone(),
            state,
            interval: IntervalTimer::default(),
            interval_config: config.interval.clamped(),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn current_week(&self) -> u32 {
        week_number(self.today(), self.epoch_anchor)
    }

    /// Write the state out, reporting failure.
    pub fn flush(&mut self) -> Result<()> {
        self.store.save(&self.state)
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.state) {
            tracing::warn!("Failed to persist engine state: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Selections and preferences
    // ------------------------------------------------------------------

    /// Currently selected day; unknown keys fall back to the plan's first day.
    pub fn selected_day(&self) -> Option<&DayPlan> {
        self.plan.day_or_first(&self.state.selected_day_key)
    }

    /// Only keys present in the plan are accepted.
    pub fn select_day(&mut self, key: &str) -> bool {
        if self.plan.day(key).is_none() {
            tracing::debug!("Ignoring unknown day key {:?}", key);
            return false;
        }
        self.state.selected_day_key = key.to_string();
        self.persist();
        true
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.state.mode = mode;
        self.persist();
    }

    /// Returns the value actually stored after clamping.
    pub fn set_rest_default_seconds(&mut self, seconds: u32) -> u32 {
        let clamped = clamp_rest_seconds(seconds);
        self.state.rest_default_seconds = clamped;
        self.persist();
        clamped
    }

    pub fn set_auto_start_rest(&mut self, enabled: bool) {
        self.state.auto_start_rest_on_set_done = enabled;
        self.persist();
    }

    // ------------------------------------------------------------------
    // Workout session (count-up)
    // ------------------------------------------------------------------

    pub fn start_session(&mut self) -> bool {
        let now = self.now();
        let started = self.state.workout_session.start(now);
        if started {
            tracing::info!("Workout started");
            self.persist();
        }
        started
    }

    pub fn pause_session(&mut self) -> bool {
        let now = self.now();
        let paused = self.state.workout_session.pause(now);
        if paused {
            tracing::info!("Workout paused");
            self.persist();
        }
        paused
    }

    /// Stop the workout, snapshot it, and count today as completed.
    pub fn end_session(&mut self) -> SessionSnapshot {
        let now = self.now();
        let today = self.today();
        let week = self.current_week();
        let day_key = self
            .selected_day()
            .map(|d| d.key.clone())
            .unwrap_or_else(|| self.state.selected_day_key.clone());

        let snapshot = self
            .state
            .workout_session
            .end_and_snapshot(now, today, &day_key, week);
        self.state.completed_dates.insert(today);

        tracing::info!(
            "Workout ended after {} ms on {} (week {})",
            snapshot.elapsed_ms,
            today,
            week
        );
        self.persist();
        snapshot
    }

    pub fn reset_session(&mut self) {
        self.state.workout_session.reset();
        self.persist();
    }

    pub fn session_elapsed_ms(&self) -> i64 {
        self.state.workout_session.elapsed(self.now())
    }

    pub fn mark_day_complete(&mut self, date: NaiveDate) {
        if self.state.completed_dates.insert(date) {
            self.persist();
        }
    }

    // ------------------------------------------------------------------
    // Weekly log
    // ------------------------------------------------------------------

    fn target_reps(&self, day: &str, exercise_id: &str) -> Option<u32> {
        self.plan
            .day(day)
            .and_then(|d| d.exercise(exercise_id))
            .map(|e| e.target_reps)
    }

    /// Stored record or the default a first touch would create.
    pub fn get_set_record(&self, week: u32, day: &str, exercise_id: &str, set_index: u32) -> SetRecord {
        self.state.weekly_log.get_set_record(
            week,
            day,
            exercise_id,
            set_index,
            self.target_reps(day, exercise_id),
        )
    }

    pub fn set_field(
        &mut self,
        week: u32,
        day: &str,
        exercise_id: &str,
        set_index: u32,
        field: SetField,
        value: Option<f64>,
    ) {
        let target = self.target_reps(day, exercise_id);
        self.state
            .weekly_log
            .set_record_mut(week, day, exercise_id, set_index, target)
            .set(field, value);
        self.persist();
    }

    /// Tick or untick a set.
    ///
    /// Ticking always arms the set's rest countdown for the current rest
    /// default; the auto-start preference only decides whether a front end
    /// surfaces it right away. Unticking clears the countdown.
    pub fn mark_set_done(
        &mut self,
        week: u32,
        day: &str,
        exercise_id: &str,
        set_index: u32,
        done: bool,
    ) {
        let now = self.now();
        let rest_ms = i64::from(self.state.rest_default_seconds) * 1000;
        let target = self.target_reps(day, exercise_id);

        let record = self
            .state
            .weekly_log
            .set_record_mut(week, day, exercise_id, set_index, target);
        record.done = done;
        record.rest_expires_at = done.then_some(now + rest_ms);

        tracing::debug!(
            "Set {}/{} #{} done={} (week {})",
            day,
            exercise_id,
            set_index,
            done,
            week
        );
        self.persist();
    }

    pub fn prior_week_value(
        &self,
        week: u32,
        day: &str,
        exercise_id: &str,
        set_index: u32,
        field: SetField,
    ) -> Option<f64> {
        self.state
            .weekly_log
            .prior_week_value(week, day, exercise_id, set_index, field)
    }

    pub fn rest_remaining_ms(&self, week: u32, day: &str, exercise_id: &str, set_index: u32) -> i64 {
        let now = self.now();
        self.state
            .weekly_log
            .set_record(week, day, exercise_id, set_index)
            .and_then(|r| r.rest_expires_at)
            .map_or(0, |at| (at - now).max(0))
    }

    /// Clear one day's log for `week` along with that day's mobility state.
    pub fn reset_day(&mut self, week: u32, day: &str) {
        self.state.weekly_log.reset_day(week, day);
        self.state.mobility.remove(day);
        tracing::info!("Reset day {} of week {}", day, week);
        self.persist();
    }

    pub fn reset_week(&mut self, week: u32) {
        self.state.weekly_log.reset_week(week);
        tracing::info!("Reset week {}", week);
        self.persist();
    }

    // ------------------------------------------------------------------
    // Mobility countdowns
    // ------------------------------------------------------------------

    /// Arm an item's countdown for its planned duration. Unknown items are
    /// ignored.
    pub fn start_mobility(&mut self, day: &str, item_id: &str) -> bool {
        let Some(seconds) = self
            .plan
            .day(day)
            .and_then(|d| d.mobility_item(item_id))
            .map(|m| m.seconds)
        else {
            tracing::debug!("Ignoring unknown mobility item {}/{}", day, item_id);
            return false;
        };

        let now = self.now();
        self.state.mobility_record_mut(day, item_id).start(now, seconds);
        self.persist();
        true
    }

    pub fn set_mobility_done(&mut self, day: &str, item_id: &str, done: bool) {
        self.state.mobility_record_mut(day, item_id).set_done(done);
        self.persist();
    }

    pub fn mobility_remaining_ms(&self, day: &str, item_id: &str) -> i64 {
        let now = self.now();
        self.state
            .mobility_record(day, item_id)
            .map_or(0, |m| m.countdown.remaining(now))
    }

    pub fn mobility_done(&self, day: &str, item_id: &str) -> bool {
        self.state
            .mobility_record(day, item_id)
            .map_or(false, |m| m.done)
    }

    // ------------------------------------------------------------------
    // Interval timer (not persisted)
    // ------------------------------------------------------------------

    pub fn interval(&self) -> &IntervalTimer {
        &self.interval
    }

    pub fn interval_config(&self) -> &IntervalConfig {
        &self.interval_config
    }

    /// Takes effect from the next phase if the timer is running.
    pub fn set_interval_config(&mut self, cfg: IntervalConfig) {
        self.interval_config = cfg.clamped();
    }

    pub fn start_interval(&mut self) -> bool {
        let now = self.now();
        self.interval.start(&self.interval_config, now)
    }

    pub fn pause_interval(&mut self) -> bool {
        let now = self.now();
        self.interval.pause(now)
    }

    pub fn resume_interval(&mut self) -> bool {
        let now = self.now();
        self.interval.resume(now)
    }

    pub fn stop_interval(&mut self) {
        self.interval.stop();
    }

    pub fn interval_remaining_ms(&self) -> i64 {
        self.interval.remaining(self.now())
    }

    // ------------------------------------------------------------------
    // Advisors
    // ------------------------------------------------------------------

    pub fn strength_suggestion(&self, week: u32, day: &str, exercise_id: &str) -> Option<f64> {
        let exercise = self.plan.day(day)?.exercise(exercise_id)?;
        progression::strength_suggestion(
            &self.state.weekly_log,
            week,
            day,
            exercise,
            &self.progression,
        )
    }

    pub fn suggestions(&self, week: u32, day: &str) -> DaySuggestions {
        match self.plan.day(day) {
            Some(plan_day) => progression::day_suggestions(
                plan_day,
                &self.state.weekly_log,
                week,
                &self.progression,
            ),
            None => DaySuggestions::None,
        }
    }

    pub fn streak(&self) -> u32 {
        compute_streak(&self.state.completed_dates, self.today())
    }

    // ------------------------------------------------------------------
    // Poll tick
    // ------------------------------------------------------------------

    /// True while any countdown or the interval timer still needs polling.
    pub fn has_live_timers(&self) -> bool {
        let week = self.current_week();
        let rest_running = self
            .state
            .weekly_log
            .weeks
            .get(&week)
            .into_iter()
            .flat_map(|w| w.days.values())
            .flat_map(|d| d.exercises.values())
            .flat_map(|e| e.sets.values())
            .any(|r| r.rest_expires_at.is_some());
        let mobility_running = self
            .state
            .mobility
            .values()
            .flat_map(|items| items.values())
            .any(|m| m.countdown.is_running());

        rest_running || mobility_running || (self.interval.is_active() && !self.interval.is_paused())
    }

    /// Observe every live timer once, acknowledge expiries, and fire the
    /// notifier once per expiry in a stable order.
    pub fn poll(&mut self, notifier: &mut dyn Notifier) -> Vec<TimerEvent> {
        let now = self.now();
        let week = self.current_week();

        let state = std::mem::take(&mut self.state);
        let (state, mut events) = crate::poll::poll(state, week, now);
        self.state = state;
        let persisted_changed = !events.is_empty();

        if let Some(ended) = self.interval.tick(&self.interval_config, now) {
            events.push(TimerEvent::IntervalPhaseEnded {
                ended: ended.ended,
                round: ended.round,
                next: ended.next,
            });
        }

        for event in &events {
            tracing::info!("Timer fired: {:?}", event);
            notifier.fire(event);
        }

        if persisted_changed {
            self.persist();
        }
        events
    }
}
