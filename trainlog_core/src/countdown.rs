//! Countdowns expressed as an absolute expiry instant.
//!
//! Remaining time is recomputed from `now` on every read instead of being
//! decremented per tick, so a countdown reports the right value even after the
//! process was suspended or not polled for a while.

use crate::clock::Millis;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountdownRecord {
    /// `None` means not running
    pub expires_at: Option<Millis>,
}

impl CountdownRecord {
    pub fn start(&mut self, now: Millis, duration_seconds: u32) {
        self.expires_at = Some(now + i64::from(duration_seconds) * 1000);
    }

    pub fn remaining(&self, now: Millis) -> i64 {
        self.expires_at.map_or(0, |at| (at - now).max(0))
    }

    pub fn is_running(&self) -> bool {
        self.expires_at.is_some()
    }

    pub fn is_expired(&self, now: Millis) -> bool {
        self.expires_at.is_some() && self.remaining(now) == 0
    }

    /// Must be called by whoever first observes the expiry; afterwards the
    /// countdown reads as not running and will not fire again.
    pub fn acknowledge_expiry(&mut self) {
        self.expires_at = None;
    }

    pub fn cancel(&mut self) {
        self.expires_at = None;
    }
}

/// Countdown state for one mobility item.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MobilityRecord {
    #[serde(flatten)]
    pub countdown: CountdownRecord,
    pub done: bool,
}

impl MobilityRecord {
    /// Arming an item clears an earlier tick.
    pub fn start(&mut self, now: Millis, seconds: u32) {
        self.countdown.start(now, seconds);
        self.done = false;
    }

    pub fn set_done(&mut self, done: bool) {
        self.done = done;
        if done {
            self.countdown.cancel();
        }
    }
}
