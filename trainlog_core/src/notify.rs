//! Notifier seam: what happens when a timer runs out.
//!
//! Sound and vibration live outside the engine; the engine only promises to
//! call `fire` once per observed expiry.

use crate::interval::IntervalPhase;
use serde::Serialize;

/// Expiry observed by a poll tick
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimerEvent {
    RestFinished {
        week: u32,
        day: String,
        exercise_id: String,
        set_index: u32,
    },
    MobilityFinished {
        day: String,
        item_id: String,
    },
    IntervalPhaseEnded {
        ended: IntervalPhase,
        round: u32,
        next: IntervalPhase,
    },
}

pub trait Notifier {
    fn fire(&mut self, event: &TimerEvent);
}

/// Does nothing; for headless use.
#[derive(Debug, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn fire(&mut self, _event: &TimerEvent) {}
}

/// Keeps every fired event, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub fired: Vec<TimerEvent>,
}

impl Notifier for RecordingNotifier {
    fn fire(&mut self, event: &TimerEvent) {
        self.fired.push(event.clone());
    }
}
