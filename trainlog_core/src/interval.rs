//! Work/rest/rounds interval timer.
//!
//! Unlike rest and mobility countdowns this timer is never persisted; it only
//! lives for an attended session. It can be paused, which converts the
//! absolute expiry back into a frozen duration so paused time never leaks.

use crate::clock::Millis;
use serde::{Deserialize, Serialize};

pub const MIN_PHASE_SECONDS: u32 = 5;
pub const MAX_PHASE_SECONDS: u32 = 3600;
pub const MAX_ROUNDS: u32 = 99;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntervalPhase {
    Work,
    Rest,
    Stopped,
}

/// Interval settings, re-read at every phase transition so edits made while
/// the timer runs apply from the next phase on.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntervalConfig {
    #[serde(default = "default_work_seconds")]
    pub work_seconds: u32,

    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: u32,

    #[serde(default = "default_rounds")]
    pub rounds: u32,

    #[serde(default = "default_auto_advance")]
    pub auto_advance: bool,
}

fn default_work_seconds() -> u32 {
    95
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_rounds() -> u32 {
    6
}

fn default_auto_advance() -> bool {
    true
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            work_seconds: default_work_seconds(),
            rest_seconds: default_rest_seconds(),
            rounds: default_rounds(),
            auto_advance: default_auto_advance(),
        }
    }
}

impl IntervalConfig {
    /// Copy with every field pulled into its valid range.
    pub fn clamped(&self) -> Self {
        Self {
            work_seconds: self.work_seconds.clamp(MIN_PHASE_SECONDS, MAX_PHASE_SECONDS),
            rest_seconds: self.rest_seconds.clamp(MIN_PHASE_SECONDS, MAX_PHASE_SECONDS),
            rounds: self.rounds.clamp(1, MAX_ROUNDS),
            auto_advance: self.auto_advance,
        }
    }

    fn phase_ms(&self, phase: IntervalPhase) -> i64 {
        let cfg = self.clamped();
        let secs = match phase {
            IntervalPhase::Work => cfg.work_seconds,
            IntervalPhase::Rest => cfg.rest_seconds,
            IntervalPhase::Stopped => 0,
        };
        i64::from(secs) * 1000
    }
}

/// One observed phase expiry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseEnded {
    pub ended: IntervalPhase,
    pub round: u32,
    pub next: IntervalPhase,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntervalTimer {
    phase: IntervalPhase,
    round: u32,
    expires_at: Option<Millis>,
    /// Set while paused: what is left of the current phase
    frozen_remaining: Option<i64>,
}

impl Default for IntervalTimer {
    fn default() -> Self {
        Self {
            phase: IntervalPhase::Stopped,
            round: 1,
            expires_at: None,
            frozen_remaining: None,
        }
    }
}

impl IntervalTimer {
    pub fn phase(&self) -> IntervalPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_paused(&self) -> bool {
        self.frozen_remaining.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.phase != IntervalPhase::Stopped
    }

    /// Begin round 1 of work. Only valid from `Stopped`.
    pub fn start(&mut self, cfg: &IntervalConfig, now: Millis) -> bool {
        if self.phase != IntervalPhase::Stopped {
            return false;
        }
        self.round = 1;
        self.enter(IntervalPhase::Work, cfg, now);
        tracing::debug!("Interval timer started");
        true
    }

    pub fn pause(&mut self, now: Millis) -> bool {
        if !self.is_active() || self.is_paused() {
            return false;
        }
        self.frozen_remaining = Some(self.remaining(now));
        self.expires_at = None;
        true
    }

    pub fn resume(&mut self, now: Millis) -> bool {
        match self.frozen_remaining.take() {
            Some(left) => {
                self.expires_at = Some(now + left);
                true
            }
            None => false,
        }
    }

    pub fn stop(&mut self) {
        *self = Self::default();
    }

    pub fn remaining(&self, now: Millis) -> i64 {
        if let Some(left) = self.frozen_remaining {
            return left;
        }
        self.expires_at.map_or(0, |at| (at - now).max(0))
    }

    /// Observe the timer. Returns the phase change if the current phase has
    /// expired; each expiry is reported exactly once.
    pub fn tick(&mut self, cfg: &IntervalConfig, now: Millis) -> Option<PhaseEnded> {
        let expires_at = self.expires_at?;
        if now < expires_at {
            return None;
        }

        let ended = self.phase;
        let round = self.round;
        let cfg = cfg.clamped();

        let next = if !cfg.auto_advance {
            IntervalPhase::Stopped
        } else {
            match ended {
                IntervalPhase::Work => IntervalPhase::Rest,
                IntervalPhase::Rest if round + 1 > cfg.rounds => IntervalPhase::Stopped,
                IntervalPhase::Rest => {
                    self.round += 1;
                    IntervalPhase::Work
                }
                IntervalPhase::Stopped => IntervalPhase::Stopped,
            }
        };

        if next == IntervalPhase::Stopped {
            self.phase = IntervalPhase::Stopped;
            self.expires_at = None;
            self.round = 1;
        } else {
            self.enter(next, &cfg, now);
        }

        tracing::debug!("Interval {:?} ended in round {}, next {:?}", ended, round, next);
        Some(PhaseEnded { ended, round, next })
    }

    fn enter(&mut self, phase: IntervalPhase, cfg: &IntervalConfig, now: Millis) {
        self.phase = phase;
        self.frozen_remaining = None;
        self.expires_at = Some(now + cfg.phase_ms(phase));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(work: u32, rest: u32, rounds: u32, auto_advance: bool) -> IntervalConfig {
        IntervalConfig {
            work_seconds: work,
            rest_seconds: rest,
            rounds,
            auto_advance,
        }
    }

    #[test]
    fn test_start_enters_work_round_one() {
        let mut timer = IntervalTimer::default();
        assert_eq!(timer.phase(), IntervalPhase::Stopped);

        assert!(timer.start(&cfg(95, 90, 6, true), 0));
        assert_eq!(timer.phase(), IntervalPhase::Work);
        assert_eq!(timer.round(), 1);
        assert_eq!(timer.remaining(0), 95_000);
    }

    #[test]
    fn test_start_only_from_stopped() {
        let config = cfg(10, 10, 2, true);
        let mut timer = IntervalTimer::default();
        timer.start(&config, 0);
        assert!(!timer.start(&config, 5_000));
        assert_eq!(timer.remaining(5_000), 5_000);
    }

    #[test]
    fn test_full_auto_advance_cycle() {
        let config = cfg(10, 5, 2, true);
        let mut timer = IntervalTimer::default();
        timer.start(&config, 0);

        assert_eq!(timer.tick(&config, 9_999), None);

        let ended = timer.tick(&config, 10_000).unwrap();
        assert_eq!(ended.ended, IntervalPhase::Work);
        assert_eq!(ended.next, IntervalPhase::Rest);
        assert_eq!(timer.remaining(10_000), 5_000);

        let ended = timer.tick(&config, 15_000).unwrap();
        assert_eq!(ended.next, IntervalPhase::Work);
        assert_eq!(timer.round(), 2);

        timer.tick(&config, 25_000).unwrap();
        let ended = timer.tick(&config, 30_000).unwrap();
        assert_eq!(ended.ended, IntervalPhase::Rest);
        assert_eq!(ended.round, 2);
        assert_eq!(ended.next, IntervalPhase::Stopped);
        assert_eq!(timer.phase(), IntervalPhase::Stopped);
        assert_eq!(timer.tick(&config, 99_000), None);
    }

    #[test]
    fn test_manual_mode_stops_after_each_phase() {
        let config = cfg(10, 5, 6, false);
        let mut timer = IntervalTimer::default();
        timer.start(&config, 0);

        let ended = timer.tick(&config, 12_000).unwrap();
        assert_eq!(ended.next, IntervalPhase::Stopped);
        assert_eq!(timer.remaining(12_000), 0);
        assert!(!timer.is_active());
    }

    #[test]
    fn test_expiry_fires_once() {
        let config = cfg(10, 5, 6, false);
        let mut timer = IntervalTimer::default();
        timer.start(&config, 0);

        assert!(timer.tick(&config, 10_000).is_some());
        assert!(timer.tick(&config, 10_250).is_none());
    }

    #[test]
    fn test_pause_freezes_remaining() {
        let config = cfg(60, 30, 3, true);
        let mut timer = IntervalTimer::default();
        timer.start(&config, 0);

        assert!(timer.pause(20_000));
        assert_eq!(timer.remaining(500_000), 40_000);
        // Paused timers never expire
        assert_eq!(timer.tick(&config, 500_000), None);

        assert!(timer.resume(500_000));
        assert_eq!(timer.remaining(510_000), 30_000);
        assert!(timer.tick(&config, 540_000).is_some());
    }

    #[test]
    fn test_pause_and_resume_are_noops_when_invalid() {
        let mut timer = IntervalTimer::default();
        assert!(!timer.pause(0));
        assert!(!timer.resume(0));

        timer.start(&IntervalConfig::default(), 0);
        assert!(timer.pause(1_000));
        assert!(!timer.pause(2_000));
    }

    #[test]
    fn test_live_config_edits_apply_from_next_phase() {
        let mut config = cfg(10, 5, 4, true);
        let mut timer = IntervalTimer::default();
        timer.start(&config, 0);

        config.rest_seconds = 20;
        timer.tick(&config, 10_000).unwrap();
        assert_eq!(timer.remaining(10_000), 20_000);
    }

    #[test]
    fn test_stop_resets_everything() {
        let config = cfg(10, 5, 4, true);
        let mut timer = IntervalTimer::default();
        timer.start(&config, 0);
        timer.tick(&config, 10_000);
        timer.tick(&config, 15_000);
        assert_eq!(timer.round(), 2);

        timer.stop();
        assert_eq!(timer, IntervalTimer::default());
        assert_eq!(timer.remaining(20_000), 0);
    }

    #[test]
    fn test_config_is_clamped() {
        let config = cfg(0, 10_000, 0, true).clamped();
        assert_eq!(config.work_seconds, MIN_PHASE_SECONDS);
        assert_eq!(config.rest_seconds, MAX_PHASE_SECONDS);
        assert_eq!(config.rounds, 1);
    }
}
