//! Count-up workout timer anchored to wall-clock instants.
//!
//! `accumulated_ms` only changes on pause/end; while running, elapsed time is
//! derived from the anchor. Reading the timer never changes it, so elapsed is
//! monotone no matter how often (or how rarely) it is polled.

use crate::clock::Millis;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of one ended workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub date: NaiveDate,
    pub elapsed_ms: i64,
    pub day_key: String,
    pub week: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CountUpTimer {
    pub running: bool,
    pub anchor_start: Option<Millis>,
    pub accumulated_ms: i64,
    pub last_snapshot: Option<SessionSnapshot>,
}

impl CountUpTimer {
    /// Start (or resume) counting. No-op while already running.
    pub fn start(&mut self, now: Millis) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.anchor_start = Some(now);
        true
    }

    /// Freeze elapsed time. No-op unless running.
    pub fn pause(&mut self, now: Millis) -> bool {
        if !self.running {
            return false;
        }
        self.accumulated_ms = self.elapsed(now);
        self.running = false;
        self.anchor_start = None;
        true
    }

    pub fn elapsed(&self, now: Millis) -> i64 {
        match (self.running, self.anchor_start) {
            // A clock stepping backwards must not eat into banked time
            (true, Some(anchor)) => self.accumulated_ms + (now - anchor).max(0),
            _ => self.accumulated_ms,
        }
    }

    /// Pause and record what the workout amounted to.
    pub fn end_and_snapshot(
        &mut self,
        now: Millis,
        date: NaiveDate,
        day_key: &str,
        week: u32,
    ) -> SessionSnapshot {
        self.pause(now);
        let snapshot = SessionSnapshot {
            id: Uuid::new_v4(),
            date,
            elapsed_ms: self.accumulated_ms,
            day_key: day_key.to_string(),
            week,
        };
        self.last_snapshot = Some(snapshot.clone());
        snapshot
    }

    /// Zero the timer for a fresh workout; the last snapshot survives.
    pub fn reset(&mut self) {
        self.running = false;
        self.anchor_start = None;
        self.accumulated_ms = 0;
    }
}
