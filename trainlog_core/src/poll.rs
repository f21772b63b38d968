//! The poll tick over persisted countdowns.
//!
//! `poll` is a pure function of `(state, now)`: it returns the new state and
//! the expiries it observed. Each expired countdown is acknowledged in the
//! returned state, so polling the result again at the same instant yields no
//! events. Rest countdowns are visited in (day, exercise, set) order, then
//! mobility countdowns in (day, item) order.

use crate::clock::Millis;
use crate::notify::TimerEvent;
use crate::types::EngineState;

pub fn poll(mut state: EngineState, week: u32, now: Millis) -> (EngineState, Vec<TimerEvent>) {
    let mut events = Vec::new();

    if let Some(week_log) = state.weekly_log.weeks.get_mut(&week.max(1)) {
        for (day, day_log) in week_log.days.iter_mut() {
            for (exercise_id, exercise) in day_log.exercises.iter_mut() {
                for (set_index, record) in exercise.sets.iter_mut() {
                    match record.rest_expires_at {
                        Some(at) if now >= at => {
                            record.rest_expires_at = None;
                            events.push(TimerEvent::RestFinished {
                                week,
                                day: day.clone(),
                                exercise_id: exercise_id.clone(),
                                set_index: *set_index,
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    for (day, items) in state.mobility.iter_mut() {
        for (item_id, record) in items.iter_mut() {
            if record.countdown.is_expired(now) {
                record.countdown.acknowledge_expiry();
                events.push(TimerEvent::MobilityFinished {
                    day: day.clone(),
                    item_id: item_id.clone(),
                });
            }
        }
    }

    (state, events)
}
