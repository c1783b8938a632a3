// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normal/rapid poll scheduling.
//!
//! A rapid-poll episode has one shared expiry. Every trigger (a command,
//! entering preheating) re-arms it to a full budget. The episode ends when
//! nothing is pending and no transient sub-state is active, or when the
//! expiry passes, whichever comes first.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Current polling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollMode {
    /// Fixed default interval.
    #[default]
    Normal,
    /// Short interval until changes are confirmed or the budget runs out.
    Rapid,
}

impl fmt::Display for PollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Rapid => "rapid",
        })
    }
}

/// A switch between poll modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    /// Mode before the switch.
    pub from: PollMode,
    /// Mode after the switch.
    pub to: PollMode,
}

/// Poll mode state machine. Time is passed in, never read.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    normal: Duration,
    rapid: Duration,
    budget: Duration,
    mode: PollMode,
    expires_at: Option<Instant>,
}

impl PollSchedule {
    /// Creates a schedule in normal mode.
    #[must_use]
    pub fn new(normal: Duration, rapid: Duration, budget: Duration) -> Self {
        Self {
            normal,
            rapid,
            budget,
            mode: PollMode::Normal,
            expires_at: None,
        }
    }

    /// Returns the current mode.
    #[must_use]
    pub fn mode(&self) -> PollMode {
        self.mode
    }

    /// Returns the interval of the current mode.
    #[must_use]
    pub fn interval(&self) -> Duration {
        match self.mode {
            PollMode::Normal => self.normal,
            PollMode::Rapid => self.rapid,
        }
    }

    /// Returns when the current rapid episode expires.
    #[must_use]
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Starts or extends a rapid episode to a full budget from `now`.
    pub fn arm(&mut self, now: Instant) -> Option<ModeChange> {
        self.expires_at = Some(now + self.budget);
        self.switch(PollMode::Rapid)
    }

    /// Returns `true` if a rapid episode has run out at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.mode == PollMode::Rapid && self.expires_at.is_some_and(|at| now >= at)
    }

    /// Ends the rapid episode if it expired or has nothing left to observe.
    pub fn settle(&mut self, now: Instant, pending_empty: bool, transient: bool) -> Option<ModeChange> {
        if self.mode != PollMode::Rapid {
            return None;
        }
        if self.is_expired(now) || (pending_empty && !transient) {
            self.expires_at = None;
            return self.switch(PollMode::Normal);
        }
        None
    }

    fn switch(&mut self, to: PollMode) -> Option<ModeChange> {
        let from = self.mode;
        if from == to {
            return None;
        }
        self.mode = to;
        Some(ModeChange { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> PollSchedule {
        PollSchedule::new(
            Duration::from_secs(60),
            Duration::from_secs(1),
            Duration::from_secs(15),
        )
    }

    #[test]
    fn starts_normal() {
        let s = schedule();
        assert_eq!(s.mode(), PollMode::Normal);
        assert_eq!(s.interval(), Duration::from_secs(60));
        assert!(s.expires_at().is_none());
    }

    #[test]
    fn arm_switches_to_rapid() {
        let mut s = schedule();
        let now = Instant::now();
        assert_eq!(
            s.arm(now),
            Some(ModeChange {
                from: PollMode::Normal,
                to: PollMode::Rapid
            })
        );
        assert_eq!(s.interval(), Duration::from_secs(1));
        assert_eq!(s.expires_at(), Some(now + Duration::from_secs(15)));
    }

    #[test]
    fn rearm_extends_shared_expiry() {
        let mut s = schedule();
        let start = Instant::now();
        s.arm(start);
        let later = start + Duration::from_secs(10);
        assert_eq!(s.arm(later), None);
        assert_eq!(s.expires_at(), Some(later + Duration::from_secs(15)));
        assert!(!s.is_expired(start + Duration::from_secs(20)));
        assert!(s.is_expired(start + Duration::from_secs(25)));
    }

    #[test]
    fn stays_rapid_while_pending() {
        let mut s = schedule();
        let now = Instant::now();
        s.arm(now);
        assert_eq!(s.settle(now + Duration::from_secs(5), false, false), None);
        assert_eq!(s.settle(now + Duration::from_secs(5), true, true), None);
        assert_eq!(s.mode(), PollMode::Rapid);
    }

    #[test]
    fn settles_when_confirmed() {
        let mut s = schedule();
        let now = Instant::now();
        s.arm(now);
        let change = s.settle(now + Duration::from_secs(2), true, false).unwrap();
        assert_eq!(change.to, PollMode::Normal);
        assert!(s.expires_at().is_none());
    }

    #[test]
    fn budget_elapsed_reverts_regardless() {
        let mut s = schedule();
        let now = Instant::now();
        s.arm(now);
        let change = s.settle(now + Duration::from_secs(15), false, true).unwrap();
        assert_eq!(change.to, PollMode::Normal);
        assert_eq!(s.interval(), Duration::from_secs(60));
    }

    #[test]
    fn settle_in_normal_is_noop() {
        let mut s = schedule();
        assert_eq!(s.settle(Instant::now(), false, true), None);
        assert!(!s.is_expired(Instant::now()));
    }
}
