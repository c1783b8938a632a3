// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling coordinator.
//!
//! The [`Coordinator`] owns the published [`HotTubState`] and is the only
//! component that issues commands. Each poll cycle:
//!
//! 1. uses the snapshot cached by the last command, or fetches a new one
//! 2. normalizes and publishes it
//! 3. confirms pending changes the snapshot shows
//! 4. detects power loss and restoration, re-applying saved settings
//! 5. switches between normal and rapid polling
//!
//! A failed fetch keeps the previous state published. Poll cycles and
//! commands never overlap.
//!
//! # Examples
//!
//! ```no_run
//! use mspa_lib::coordinator::{Coordinator, CoordinatorConfig};
//! use mspa_lib::protocol::{ClientConfig, Credentials};
//! use mspa_lib::types::Region;
//! use std::sync::Arc;
//!
//! # async fn example() -> mspa_lib::Result<()> {
//! let client = ClientConfig::new(Region::Row)
//!     .into_client(Credentials::from_password("me@example.com", "secret"))?;
//!
//! let coordinator = Arc::new(Coordinator::connect(client, CoordinatorConfig::new()).await?);
//! let poller = Arc::clone(&coordinator).spawn();
//!
//! coordinator.set_feature("heater", "on").await?;
//! coordinator.set_temperature(38.0).await?;
//!
//! poller.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod power_cycle;
mod restore;
mod runner;
mod schedule;

pub use config::{CoordinatorConfig, PollBackoff};
pub use power_cycle::{DetectionSignal, PowerTransition, RESET_THRESHOLD, detect, reset_indicators};
pub use restore::{RestoreFailure, RestoreItem, RestoreReport, plan};
pub use runner::PollerHandle;
pub use schedule::{ModeChange, PollMode, PollSchedule};

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Notify, broadcast, watch};
use tokio::time::Instant;

use crate::command::HotTubCommand;
use crate::error::Result;
use crate::event::{CoordinatorEvent, EventBus};
use crate::protocol::{ApiClient, CommandReceipt, HotTubApi};
use crate::state::{HotTubState, PendingChanges, SavedState};
use crate::types::{BubbleLevel, Feature, SwitchState, Temperature, TemperatureUnit};

/// Mutable bookkeeping shared by poll cycles and commands.
///
/// Only touched under a synchronous lock that is never held across an
/// await point.
#[derive(Debug)]
struct Tracking {
    schedule: PollSchedule,
    pending: PendingChanges,
    previous: Option<HotTubState>,
    saved: Option<SavedState>,
    last_restore: Option<RestoreReport>,
}

/// Polls one hot tub and dispatches commands to it.
pub struct Coordinator<A: HotTubApi> {
    api: A,
    config: CoordinatorConfig,
    flight: tokio::sync::Mutex<()>,
    tracking: Mutex<Tracking>,
    state_tx: watch::Sender<Option<HotTubState>>,
    events: EventBus,
    wake: Notify,
}

impl Coordinator<ApiClient> {
    /// Discovers the device and runs the first poll.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery or the first poll fails. An
    /// authentication failure here means the credentials are wrong.
    pub async fn connect(client: ApiClient, config: CoordinatorConfig) -> Result<Self> {
        let identity = client.discover().await?;
        tracing::info!(
            device_id = %identity.device_id,
            name = %identity.display_name(),
            "Hot tub discovered"
        );

        let coordinator = Self::new(client, config);
        coordinator.poll_once().await?;
        Ok(coordinator)
    }
}

impl<A: HotTubApi> Coordinator<A> {
    /// Creates a coordinator over an API implementation. No state is
    /// published until the first poll.
    #[must_use]
    pub fn new(api: A, config: CoordinatorConfig) -> Self {
        let schedule = PollSchedule::new(
            config.normal_interval(),
            config.rapid_interval(),
            config.rapid_budget(),
        );
        let (state_tx, _) = watch::channel(None);

        Self {
            api,
            config,
            flight: tokio::sync::Mutex::new(()),
            tracking: Mutex::new(Tracking {
                schedule,
                pending: PendingChanges::new(),
                previous: None,
                saved: None,
                last_restore: None,
            }),
            state_tx,
            events: EventBus::new(),
            wake: Notify::new(),
        }
    }

    /// Returns the underlying API.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Returns the last published state.
    #[must_use]
    pub fn state(&self) -> Option<HotTubState> {
        self.state_tx.borrow().clone()
    }

    /// Watches the published state.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<Option<HotTubState>> {
        self.state_tx.subscribe()
    }

    /// Subscribes to coordinator events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Returns the current poll mode.
    #[must_use]
    pub fn poll_mode(&self) -> PollMode {
        self.tracking.lock().schedule.mode()
    }

    /// Returns the interval until the next poll.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.tracking.lock().schedule.interval()
    }

    /// Returns the changes not yet confirmed by a snapshot.
    #[must_use]
    pub fn pending(&self) -> PendingChanges {
        self.tracking.lock().pending.clone()
    }

    /// Returns the settings captured at the last power loss.
    #[must_use]
    pub fn saved_state(&self) -> Option<SavedState> {
        self.tracking.lock().saved
    }

    /// Returns the outcome of the last restoration batch.
    #[must_use]
    pub fn last_restore(&self) -> Option<RestoreReport> {
        self.tracking.lock().last_restore.clone()
    }

    /// Runs one poll cycle and returns the published state.
    ///
    /// # Errors
    ///
    /// Returns the fetch error. The previously published state is kept.
    pub async fn poll_once(&self) -> Result<HotTubState> {
        let _flight = self.flight.lock().await;
        self.poll_locked().await
    }

    /// Switches a feature by name with an `on`/`off` literal.
    ///
    /// # Errors
    ///
    /// Returns a `ValueError` for unknown features, bad literals or
    /// `bubble` (use [`Coordinator::set_bubble`]). Otherwise returns the
    /// vendor error.
    pub async fn set_feature(&self, feature: &str, state: &str) -> Result<CommandReceipt> {
        self.execute(HotTubCommand::feature(feature, state)?).await
    }

    /// Switches a feature.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is invalid or rejected.
    pub async fn set_switch(&self, feature: Feature, state: SwitchState) -> Result<CommandReceipt> {
        self.execute(HotTubCommand::set_feature(feature, state)?).await
    }

    /// Sets the target temperature in °C.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidTemperature` outside 20–40 °C, or the
    /// vendor error.
    pub async fn set_temperature(&self, celsius: f64) -> Result<CommandReceipt> {
        self.execute(HotTubCommand::SetTemperature(Temperature::new(celsius)?))
            .await
    }

    /// Sets the target temperature given in `unit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the converted value is out of range or the
    /// command is rejected.
    pub async fn set_temperature_in(&self, value: f64, unit: TemperatureUnit) -> Result<CommandReceipt> {
        let temperature = match unit {
            TemperatureUnit::Celsius => Temperature::new(value)?,
            TemperatureUnit::Fahrenheit => Temperature::from_fahrenheit(value)?,
        };
        self.execute(HotTubCommand::SetTemperature(temperature)).await
    }

    /// Switches bubbles. Without a level, the last reported level is used.
    ///
    /// # Errors
    ///
    /// Returns the vendor error.
    pub async fn set_bubble(&self, state: SwitchState, level: Option<BubbleLevel>) -> Result<CommandReceipt> {
        let level = level.unwrap_or_else(|| {
            self.state()
                .map(|state| state.bubble_level)
                .unwrap_or_default()
        });
        self.execute(HotTubCommand::bubble(state, level)).await
    }

    /// Changes bubble intensity (1–3).
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` for other levels, or the vendor
    /// error.
    pub async fn set_bubble_level(&self, level: u8) -> Result<CommandReceipt> {
        self.execute(HotTubCommand::SetBubbleLevel(BubbleLevel::new(level)?))
            .await
    }

    /// Changes the panel temperature unit.
    ///
    /// # Errors
    ///
    /// Returns the vendor error.
    pub async fn set_temperature_unit(&self, unit: TemperatureUnit) -> Result<CommandReceipt> {
        self.execute(HotTubCommand::SetTemperatureUnit(unit)).await
    }

    /// Sends a command, then the command the dependency policy pairs with
    /// it. Polling switches to rapid mode until the change is observed.
    ///
    /// Returns the receipt of the primary command.
    ///
    /// # Errors
    ///
    /// Returns the first vendor error. A failed dependent command is
    /// reported even though the primary one was accepted.
    pub async fn execute(&self, command: HotTubCommand) -> Result<CommandReceipt> {
        let _flight = self.flight.lock().await;
        self.dispatch_locked(command).await
    }

    async fn dispatch_locked(&self, command: HotTubCommand) -> Result<CommandReceipt> {
        let receipt = self.send_one(command).await?;

        if let Some(dependent) = command.dependent(self.config.dependency_policy()) {
            tracing::info!(command = %command, dependent = %dependent, "Sending dependent command");
            self.send_one(dependent).await?;
        }

        Ok(receipt)
    }

    async fn send_one(&self, command: HotTubCommand) -> Result<CommandReceipt> {
        let receipt = self
            .api
            .send_command(&command.desired())
            .await
            .inspect_err(|err| tracing::warn!(command = %command, error = %err, "Command failed"))?;

        tracing::info!(
            command = %command,
            confirmed = receipt.confirmed,
            attempts = receipt.attempts,
            "Command accepted"
        );

        let change = {
            let mut tracking = self.tracking.lock();
            tracking.pending.merge(command.expected());
            tracking.schedule.arm(Instant::now())
        };
        if let Some(change) = change {
            self.announce(change);
        }
        self.events
            .publish(CoordinatorEvent::command_sent(command, receipt.confirmed));
        self.wake.notify_one();

        Ok(receipt)
    }

    async fn poll_locked(&self) -> Result<HotTubState> {
        let raw = if let Some(raw) = self.api.take_cached_status() {
            tracing::debug!("Using status fetched during command confirmation");
            raw
        } else {
            match self.api.fetch_status().await {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        transient = err.is_transient(),
                        "Status fetch failed, keeping last state"
                    );
                    self.events.publish(CoordinatorEvent::poll_failed(&err));
                    self.update_schedule(false);
                    return Err(err);
                }
            }
        };

        let state = HotTubState::normalize(&raw);
        self.state_tx.send_replace(Some(state.clone()));
        self.events.publish(CoordinatorEvent::state_updated(&state));

        let (previous, confirmed, transition) = {
            let mut tracking = self.tracking.lock();
            let expected: Vec<String> = tracking.pending.fields().map(str::to_string).collect();
            let confirmed = tracking.pending.reconcile(&state);
            let previous = tracking.previous.replace(state.clone());
            let transition = power_cycle::detect(previous.as_ref(), &state, &expected);
            (previous, confirmed, transition)
        };

        if !confirmed.is_empty() {
            tracing::debug!(fields = ?confirmed, "Pending changes confirmed");
            self.events
                .publish(CoordinatorEvent::ChangesConfirmed { fields: confirmed });
        }

        if let Some(transition) = transition
            && let Some(saved) = self.on_power_transition(transition, previous.as_ref())
        {
            self.restore_locked(&saved, &state).await;
        }

        let entered_transient = state.heat_state.is_transient()
            && previous
                .as_ref()
                .is_none_or(|previous| !previous.heat_state.is_transient());
        self.update_schedule(entered_transient);

        Ok(state)
    }

    /// Records a power transition; returns the settings to restore, if any.
    fn on_power_transition(
        &self,
        transition: PowerTransition,
        previous: Option<&HotTubState>,
    ) -> Option<SavedState> {
        match transition {
            PowerTransition::Lost => {
                if let Some(previous) = previous {
                    self.tracking.lock().saved = Some(SavedState::capture(previous));
                }
                tracing::info!("Hot tub went offline, settings saved");
                self.events.publish(CoordinatorEvent::PowerLost);
                None
            }
            PowerTransition::Restored(signal) => {
                let saved = {
                    let mut tracking = self.tracking.lock();
                    if signal == DetectionSignal::ResetHeuristic
                        && let Some(previous) = previous
                    {
                        tracking.saved = Some(SavedState::capture(previous));
                    }
                    tracking.saved
                };
                tracing::info!(?signal, "Hot tub power restored");
                self.events
                    .publish(CoordinatorEvent::PowerRestored { signal });

                if !self.config.restore_state() {
                    tracing::debug!("State restoration disabled");
                    return None;
                }
                if saved.is_none() {
                    tracing::debug!("No saved settings to restore");
                }
                saved
            }
        }
    }

    async fn restore_locked(&self, saved: &SavedState, current: &HotTubState) {
        let items = restore::plan(saved, current, self.config.host_unit());
        let mut report = RestoreReport::default();

        if items.is_empty() {
            tracing::debug!("Settings already match saved state");
        } else {
            tracing::info!(count = items.len(), "Restoring settings after power loss");
        }

        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.restore_pause()).await;
            }
            // No paired commands during restoration
            match self.send_one(item.command()).await {
                Ok(_) => report.succeeded.push(item.key().to_string()),
                Err(err) => {
                    tracing::warn!(item = %item, error = %err, "Failed to restore setting");
                    report.failed.push(RestoreFailure {
                        key: item.key().to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        if !items.is_empty() {
            tracing::info!(
                succeeded = report.succeeded.len(),
                failed = report.failed.len(),
                "Restoration finished"
            );
        }
        self.tracking.lock().last_restore = Some(report.clone());
        self.events
            .publish(CoordinatorEvent::RestorationFinished { report });
    }

    /// Re-arms on entering a transient sub-state, drops expired pending
    /// changes and settles the poll mode.
    fn update_schedule(&self, entered_transient: bool) {
        let now = Instant::now();
        let mut changes = Vec::new();
        let mut expired = Vec::new();

        {
            let mut guard = self.tracking.lock();
            let tracking = &mut *guard;

            if entered_transient {
                tracing::debug!("Heater preheating, polling rapidly");
                changes.extend(tracking.schedule.arm(now));
            }

            if tracking.schedule.is_expired(now) && !tracking.pending.is_empty() {
                expired = tracking.pending.fields().map(str::to_string).collect();
                tracking.pending.clear();
            }

            let transient = tracking
                .previous
                .as_ref()
                .is_some_and(|state| state.heat_state.is_transient());
            changes.extend(
                tracking
                    .schedule
                    .settle(now, tracking.pending.is_empty(), transient),
            );
        }

        if !expired.is_empty() {
            tracing::warn!(fields = ?expired, "Changes not confirmed before rapid polling ended");
            self.events
                .publish(CoordinatorEvent::ChangesExpired { fields: expired });
        }
        for change in changes {
            self.announce(change);
        }
    }

    fn announce(&self, change: ModeChange) {
        tracing::info!(from = %change.from, to = %change.to, "Poll mode changed");
        self.events
            .publish(CoordinatorEvent::mode_changed(change.from, change.to));
    }
}

impl<A: HotTubApi + std::fmt::Debug> std::fmt::Debug for Coordinator<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("api", &self.api)
            .field("config", &self.config)
            .field("mode", &self.poll_mode())
            .finish_non_exhaustive()
    }
}
