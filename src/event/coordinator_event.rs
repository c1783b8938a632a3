// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator event types.

use crate::command::HotTubCommand;
use crate::coordinator::{DetectionSignal, PollMode, RestoreReport};
use crate::error::Error;
use crate::state::HotTubState;

/// Events emitted by a [`Coordinator`](crate::coordinator::Coordinator).
///
/// # Examples
///
/// ```
/// use mspa_lib::event::CoordinatorEvent;
/// use mspa_lib::coordinator::PollMode;
///
/// let event = CoordinatorEvent::mode_changed(PollMode::Normal, PollMode::Rapid);
/// assert!(event.is_mode_change());
/// assert!(!event.is_state_update());
/// ```
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// A poll produced a new canonical state.
    StateUpdated {
        /// The published state.
        state: Box<HotTubState>,
    },

    /// A poll failed; the previous state stays published.
    PollFailed {
        /// Error message.
        error: String,
        /// Whether the failure is worth retrying.
        transient: bool,
    },

    /// The poll interval switched.
    PollModeChanged {
        /// Previous mode.
        from: PollMode,
        /// New mode.
        to: PollMode,
    },

    /// Pending changes were observed in a snapshot.
    ChangesConfirmed {
        /// Confirmed canonical keys.
        fields: Vec<String>,
    },

    /// Rapid polling ran out before all pending changes were observed.
    ChangesExpired {
        /// Keys dropped without confirmation.
        fields: Vec<String>,
    },

    /// The vendor accepted a command.
    CommandSent {
        /// The command.
        command: HotTubCommand,
        /// Whether the post-command fetch already showed the change.
        confirmed: bool,
    },

    /// The device reported going offline.
    PowerLost,

    /// The device came back after a power loss.
    PowerRestored {
        /// How the restoration was detected.
        signal: DetectionSignal,
    },

    /// A restoration batch finished.
    RestorationFinished {
        /// Per-item outcome.
        report: RestoreReport,
    },
}

impl CoordinatorEvent {
    /// Creates a state update event.
    #[must_use]
    pub fn state_updated(state: &HotTubState) -> Self {
        Self::StateUpdated {
            state: Box::new(state.clone()),
        }
    }

    /// Creates a poll failure event.
    #[must_use]
    pub fn poll_failed(error: &Error) -> Self {
        Self::PollFailed {
            error: error.to_string(),
            transient: error.is_transient(),
        }
    }

    /// Creates a mode change event.
    #[must_use]
    pub fn mode_changed(from: PollMode, to: PollMode) -> Self {
        Self::PollModeChanged { from, to }
    }

    /// Creates a command event.
    #[must_use]
    pub fn command_sent(command: HotTubCommand, confirmed: bool) -> Self {
        Self::CommandSent { command, confirmed }
    }

    /// Returns `true` if this is a state update.
    #[must_use]
    pub fn is_state_update(&self) -> bool {
        matches!(self, Self::StateUpdated { .. })
    }

    /// Returns `true` if this is a poll failure.
    #[must_use]
    pub fn is_poll_failure(&self) -> bool {
        matches!(self, Self::PollFailed { .. })
    }

    /// Returns `true` if this is a mode change.
    #[must_use]
    pub fn is_mode_change(&self) -> bool {
        matches!(self, Self::PollModeChanged { .. })
    }

    /// Returns `true` if this concerns a power cycle.
    #[must_use]
    pub fn is_power_event(&self) -> bool {
        matches!(
            self,
            Self::PowerLost | Self::PowerRestored { .. } | Self::RestorationFinished { .. }
        )
    }

    /// Returns the state carried by a state update.
    #[must_use]
    pub fn state(&self) -> Option<&HotTubState> {
        match self {
            Self::StateUpdated { state } => Some(state.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::state::RawSnapshot;
    use crate::types::{Feature, SwitchState};
    use serde_json::json;

    #[test]
    fn state_update_carries_state() {
        let state = HotTubState::normalize(&RawSnapshot::from_value(json!({"heater_state": 1})).unwrap());
        let event = CoordinatorEvent::state_updated(&state);

        assert!(event.is_state_update());
        assert_eq!(event.state().unwrap().heater, SwitchState::On);
    }

    #[test]
    fn poll_failed_keeps_classification() {
        let event = CoordinatorEvent::poll_failed(&ProtocolError::Timeout(1_000).into());
        match event {
            CoordinatorEvent::PollFailed { error, transient } => {
                assert!(transient);
                assert!(error.contains("timed out"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn predicates() {
        assert!(CoordinatorEvent::PowerLost.is_power_event());
        assert!(
            CoordinatorEvent::PowerRestored {
                signal: DetectionSignal::OnlineFlag
            }
            .is_power_event()
        );
        assert!(!CoordinatorEvent::mode_changed(PollMode::Rapid, PollMode::Normal).is_power_event());

        let command = HotTubCommand::set_feature(Feature::Heater, SwitchState::On).unwrap();
        let event = CoordinatorEvent::command_sent(command, false);
        assert!(!event.is_state_update());
        assert!(event.state().is_none());
    }
}
