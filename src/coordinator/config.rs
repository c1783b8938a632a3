// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator configuration.

use std::time::Duration;

use crate::command::DependencyPolicy;
use crate::types::TemperatureUnit;

/// Configuration for a [`Coordinator`](super::Coordinator).
///
/// # Examples
///
/// ```
/// use mspa_lib::coordinator::CoordinatorConfig;
/// use mspa_lib::command::DependencyPolicy;
/// use mspa_lib::types::TemperatureUnit;
/// use std::time::Duration;
///
/// let config = CoordinatorConfig::new()
///     .with_normal_interval(Duration::from_secs(30))
///     .with_dependency_policy(DependencyPolicy::FilterOffStopsHeater)
///     .with_state_restoration(true)
///     .with_host_unit(TemperatureUnit::Celsius);
///
/// assert!(config.restore_state());
/// assert_eq!(config.rapid_interval(), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    normal_interval: Duration,
    rapid_interval: Duration,
    rapid_budget: Duration,
    dependency_policy: DependencyPolicy,
    restore_state: bool,
    restore_pause: Duration,
    host_unit: Option<TemperatureUnit>,
    backoff: PollBackoff,
}

impl CoordinatorConfig {
    /// Default interval between polls.
    pub const DEFAULT_NORMAL_INTERVAL: Duration = Duration::from_secs(60);
    /// Default interval while a change awaits confirmation.
    pub const DEFAULT_RAPID_INTERVAL: Duration = Duration::from_secs(1);
    /// Default length of a rapid-poll episode.
    pub const DEFAULT_RAPID_BUDGET: Duration = Duration::from_secs(15);
    /// Default pause between restoration commands.
    pub const DEFAULT_RESTORE_PAUSE: Duration = Duration::from_secs(2);

    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the normal poll interval.
    #[must_use]
    pub fn with_normal_interval(mut self, interval: Duration) -> Self {
        self.normal_interval = interval;
        self
    }

    /// Sets the rapid poll interval.
    #[must_use]
    pub fn with_rapid_interval(mut self, interval: Duration) -> Self {
        self.rapid_interval = interval;
        self
    }

    /// Sets how long rapid polling lasts after the latest trigger.
    #[must_use]
    pub fn with_rapid_budget(mut self, budget: Duration) -> Self {
        self.rapid_budget = budget;
        self
    }

    /// Sets the heater/filter coupling.
    #[must_use]
    pub fn with_dependency_policy(mut self, policy: DependencyPolicy) -> Self {
        self.dependency_policy = policy;
        self
    }

    /// Enables or disables restoring settings after a power loss.
    #[must_use]
    pub fn with_state_restoration(mut self, enabled: bool) -> Self {
        self.restore_state = enabled;
        self
    }

    /// Sets the pause between restoration commands.
    #[must_use]
    pub fn with_restore_pause(mut self, pause: Duration) -> Self {
        self.restore_pause = pause;
        self
    }

    /// Sets the unit the hosting environment displays.
    #[must_use]
    pub fn with_host_unit(mut self, unit: TemperatureUnit) -> Self {
        self.host_unit = Some(unit);
        self
    }

    /// Sets the failure backoff policy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: PollBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns the normal poll interval.
    #[must_use]
    pub fn normal_interval(&self) -> Duration {
        self.normal_interval
    }

    /// Returns the rapid poll interval.
    #[must_use]
    pub fn rapid_interval(&self) -> Duration {
        self.rapid_interval
    }

    /// Returns the rapid-poll budget.
    #[must_use]
    pub fn rapid_budget(&self) -> Duration {
        self.rapid_budget
    }

    /// Returns the dependency policy.
    #[must_use]
    pub fn dependency_policy(&self) -> DependencyPolicy {
        self.dependency_policy
    }

    /// Returns whether settings are restored after a power loss.
    #[must_use]
    pub fn restore_state(&self) -> bool {
        self.restore_state
    }

    /// Returns the pause between restoration commands.
    #[must_use]
    pub fn restore_pause(&self) -> Duration {
        self.restore_pause
    }

    /// Returns the host unit, if configured.
    #[must_use]
    pub fn host_unit(&self) -> Option<TemperatureUnit> {
        self.host_unit
    }

    /// Returns the failure backoff policy.
    #[must_use]
    pub fn backoff(&self) -> &PollBackoff {
        &self.backoff
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            normal_interval: Self::DEFAULT_NORMAL_INTERVAL,
            rapid_interval: Self::DEFAULT_RAPID_INTERVAL,
            rapid_budget: Self::DEFAULT_RAPID_BUDGET,
            dependency_policy: DependencyPolicy::default(),
            restore_state: false,
            restore_pause: Self::DEFAULT_RESTORE_PAUSE,
            host_unit: None,
            backoff: PollBackoff::default(),
        }
    }
}

/// Exponential backoff applied by the background poller after failed polls.
///
/// # Examples
///
/// ```
/// use mspa_lib::coordinator::PollBackoff;
/// use std::time::Duration;
///
/// let backoff = PollBackoff::new()
///     .with_initial_delay(Duration::from_secs(2))
///     .with_max_delay(Duration::from_secs(10));
///
/// assert_eq!(backoff.delay_for_failure(1), Duration::from_secs(2));
/// assert_eq!(backoff.delay_for_failure(2), Duration::from_secs(4));
/// assert_eq!(backoff.delay_for_failure(5), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct PollBackoff {
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Upper bound for the delay.
    pub max_delay: Duration,
    /// Multiplier applied per additional consecutive failure.
    pub backoff_multiplier: f32,
}

impl PollBackoff {
    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay after the first failure.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay after `failures` consecutive failures.
    #[must_use]
    pub fn delay_for_failure(&self, failures: u32) -> Duration {
        if failures <= 1 {
            return self.initial_delay.min(self.max_delay);
        }

        let multiplier = self
            .backoff_multiplier
            .powi(i32::try_from(failures - 1).unwrap_or(i32::MAX));

        #[allow(clippy::cast_precision_loss)]
        let delay_ms = self.initial_delay.as_millis() as f32 * multiplier;

        // Non-negative: both factors are
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            clippy::cast_sign_loss
        )]
        let delay = Duration::from_millis(delay_ms.min(u64::MAX as f32) as u64);

        delay.min(self.max_delay)
    }
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: CoordinatorConfig::DEFAULT_NORMAL_INTERVAL,
            backoff_multiplier: 2.0,
        }
    }
}
