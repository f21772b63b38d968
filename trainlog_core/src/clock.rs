//! Injectable source of the current instant.
//!
//! Every timer in the engine works on plain millisecond instants so that tests
//! (and the CLI `--at` override) can drive time by hand.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Milliseconds since the Unix epoch.
pub type Millis = i64;

/// Something that knows what time it is.
pub trait Clock {
    fn now_ms(&self) -> Millis;

    /// Calendar date (UTC) of the current instant.
    fn today(&self) -> NaiveDate {
        date_of(self.now_ms())
    }
}

/// Calendar date (UTC) of an instant.
pub fn date_of(ms: Millis) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .date_naive()
}

/// Wall clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock. Clones share the same instant, so a test can keep a
/// handle while the engine owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: Millis) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    /// Start at midnight UTC of the given date.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self::new(at.timestamp_millis())
    }

    pub fn advance_ms(&self, delta_ms: Millis) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs * 1000);
    }

    pub fn set_ms(&self, value: Millis) {
        self.now.store(value, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}
