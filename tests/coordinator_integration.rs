// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the polling coordinator against a simulated tub.

use std::future::{Future, ready};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use mspa_lib::command::{DependencyPolicy, DesiredState};
use mspa_lib::coordinator::{Coordinator, CoordinatorConfig, DetectionSignal, PollMode};
use mspa_lib::event::CoordinatorEvent;
use mspa_lib::protocol::{CommandReceipt, HotTubApi};
use mspa_lib::state::RawSnapshot;
use mspa_lib::types::{BubbleLevel, SwitchState, TemperatureUnit};
use mspa_lib::{DeviceError, Error, ProtocolError, Result, ValueError};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use tokio::sync::broadcast;

// ============================================================================
// Simulated tub
// ============================================================================

/// Applies accepted commands to an in-memory snapshot.
#[derive(Debug, Default)]
struct FakeTub {
    device: Mutex<Map<String, Value>>,
    commands: Mutex<Vec<DesiredState>>,
    rejected: Mutex<Vec<&'static str>>,
    failures: Mutex<u32>,
    fetches: AtomicUsize,
    lagging: AtomicBool,
}

impl FakeTub {
    fn new(snapshot: Value) -> Self {
        let tub = Self::default();
        tub.replace(snapshot);
        tub
    }

    /// Replaces the whole snapshot, as after a reboot.
    fn replace(&self, snapshot: Value) {
        let Value::Object(map) = snapshot else {
            panic!("snapshot must be an object");
        };
        *self.device.lock() = map;
    }

    fn update(&self, field: &str, value: Value) {
        self.device.lock().insert(field.to_string(), value);
    }

    fn reject(&self, field: &'static str) {
        self.rejected.lock().push(field);
    }

    fn fail_next(&self, count: u32) {
        *self.failures.lock() = count;
    }

    /// Accepted commands are not reflected in the snapshot.
    fn set_lagging(&self, lagging: bool) {
        self.lagging.store(lagging, Ordering::SeqCst);
    }

    fn sent(&self) -> Vec<Vec<(String, i64)>> {
        self.commands
            .lock()
            .iter()
            .map(|desired| {
                desired
                    .iter()
                    .map(|(field, value)| (field.to_string(), value))
                    .collect()
            })
            .collect()
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> Result<RawSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut failures = self.failures.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(ProtocolError::Timeout(30_000).into());
        }
        Ok(RawSnapshot::new(self.device.lock().clone()))
    }

    fn apply(&self, desired: &DesiredState) -> Result<CommandReceipt> {
        self.commands.lock().push(desired.clone());
        let rejected = desired
            .iter()
            .any(|(field, _)| self.rejected.lock().iter().any(|r| *r == field));
        if rejected {
            return Err(DeviceError::CommandRejected("FAIL".into()).into());
        }
        if !self.lagging.load(Ordering::SeqCst) {
            let mut device = self.device.lock();
            for (field, value) in desired.iter() {
                device.insert(field.to_string(), json!(value));
            }
        }
        Ok(CommandReceipt {
            message: "SUCCESS".into(),
            confirmed: false,
            attempts: 0,
        })
    }
}

impl HotTubApi for FakeTub {
    fn fetch_status(&self) -> impl Future<Output = Result<RawSnapshot>> + Send {
        ready(self.next_status())
    }

    fn send_command(
        &self,
        desired: &DesiredState,
    ) -> impl Future<Output = Result<CommandReceipt>> + Send {
        ready(self.apply(desired))
    }

    fn take_cached_status(&self) -> Option<RawSnapshot> {
        None
    }
}

fn coordinator(snapshot: Value, config: CoordinatorConfig) -> Coordinator<FakeTub> {
    Coordinator::new(FakeTub::new(snapshot), config)
}

fn sent(pairs: &[&[(&str, i64)]]) -> Vec<Vec<(String, i64)>> {
    pairs
        .iter()
        .map(|command| {
            command
                .iter()
                .map(|(field, value)| ((*field).to_string(), *value))
                .collect()
        })
        .collect()
}

fn drain(rx: &mut broadcast::Receiver<CoordinatorEvent>) -> Vec<CoordinatorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn mode_changes(events: &[CoordinatorEvent]) -> Vec<(PollMode, PollMode)> {
    events
        .iter()
        .filter_map(|event| match event {
            CoordinatorEvent::PollModeChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Polling
// ============================================================================

mod polling {
    use super::*;

    #[tokio::test]
    async fn first_poll_publishes_state() {
        let coordinator = coordinator(
            json!({"water_temperature": 74, "heater_state": 1}),
            CoordinatorConfig::new(),
        );
        let mut watch = coordinator.watch_state();
        assert!(coordinator.state().is_none());

        coordinator.poll_once().await.unwrap();

        assert!(watch.has_changed().unwrap());
        let state = watch.borrow_and_update().clone().unwrap();
        assert_eq!(state.water_temperature, Some(37.0));
        assert_eq!(state.heater, SwitchState::On);
        assert_eq!(coordinator.poll_mode(), PollMode::Normal);
        assert_eq!(coordinator.poll_interval(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn fetch_failure_keeps_last_state() {
        let coordinator = coordinator(json!({"heater_state": 1}), CoordinatorConfig::new());
        let mut events = coordinator.subscribe();

        coordinator.poll_once().await.unwrap();
        coordinator.api().update("heater_state", json!(0));
        coordinator.api().fail_next(1);

        let err = coordinator.poll_once().await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(coordinator.state().unwrap().heater, SwitchState::On);

        let events = drain(&mut events);
        assert!(events.iter().any(|event| matches!(
            event,
            CoordinatorEvent::PollFailed { transient: true, .. }
        )));

        let state = coordinator.poll_once().await.unwrap();
        assert_eq!(state.heater, SwitchState::Off);
    }

    #[tokio::test]
    async fn every_poll_publishes_an_update() {
        let coordinator = coordinator(json!({}), CoordinatorConfig::new());
        let mut events = coordinator.subscribe();

        coordinator.poll_once().await.unwrap();
        coordinator.poll_once().await.unwrap();

        let updates = drain(&mut events)
            .iter()
            .filter(|event| event.is_state_update())
            .count();
        assert_eq!(updates, 2);
    }
}

// ============================================================================
// Rapid polling
// ============================================================================

mod rapid {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn command_polls_rapidly_until_confirmed() {
        let coordinator = coordinator(json!({"jet_state": 0}), CoordinatorConfig::new());
        coordinator.poll_once().await.unwrap();
        let mut events = coordinator.subscribe();

        coordinator.api().set_lagging(true);
        coordinator.set_feature("jet", "on").await.unwrap();
        assert_eq!(coordinator.poll_mode(), PollMode::Rapid);
        assert_eq!(coordinator.poll_interval(), Duration::from_secs(1));
        assert_eq!(coordinator.pending().get("jet"), Some(&json!("on")));

        tokio::time::advance(Duration::from_secs(1)).await;
        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.poll_mode(), PollMode::Rapid);

        coordinator.api().update("jet_state", json!(1));
        tokio::time::advance(Duration::from_secs(1)).await;
        coordinator.poll_once().await.unwrap();

        assert_eq!(coordinator.poll_mode(), PollMode::Normal);
        assert!(coordinator.pending().is_empty());

        let events = drain(&mut events);
        assert_eq!(
            mode_changes(&events),
            vec![
                (PollMode::Normal, PollMode::Rapid),
                (PollMode::Rapid, PollMode::Normal)
            ]
        );
        assert!(events.iter().any(|event| matches!(
            event,
            CoordinatorEvent::ChangesConfirmed { fields } if fields == &vec!["jet".to_string()]
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn budget_expiry_reverts_to_normal() {
        let coordinator = coordinator(json!({"ozone_state": 0}), CoordinatorConfig::new());
        coordinator.poll_once().await.unwrap();
        let mut events = coordinator.subscribe();

        coordinator.api().set_lagging(true);
        coordinator.set_feature("ozone", "on").await.unwrap();

        tokio::time::advance(Duration::from_secs(14)).await;
        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.poll_mode(), PollMode::Rapid);

        tokio::time::advance(Duration::from_secs(2)).await;
        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.poll_mode(), PollMode::Normal);
        assert!(coordinator.pending().is_empty());

        assert!(drain(&mut events).iter().any(|event| matches!(
            event,
            CoordinatorEvent::ChangesExpired { fields } if fields == &vec!["ozone".to_string()]
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn budget_expires_even_when_fetches_fail() {
        let coordinator = coordinator(json!({}), CoordinatorConfig::new());
        coordinator.poll_once().await.unwrap();

        coordinator.api().set_lagging(true);
        coordinator.set_feature("uvc", "on").await.unwrap();
        coordinator.api().fail_next(1);

        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(coordinator.poll_once().await.is_err());
        assert_eq!(coordinator.poll_mode(), PollMode::Normal);
        assert!(coordinator.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn new_command_rearms_the_budget() {
        let coordinator = coordinator(json!({}), CoordinatorConfig::new());
        coordinator.poll_once().await.unwrap();
        coordinator.api().set_lagging(true);

        coordinator.set_feature("ozone", "on").await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        coordinator.set_feature("uvc", "on").await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;

        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.poll_mode(), PollMode::Rapid);
        assert_eq!(coordinator.pending().len(), 2);

        tokio::time::advance(Duration::from_secs(5)).await;
        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.poll_mode(), PollMode::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn preheating_polls_rapidly() {
        let coordinator = coordinator(
            json!({"heater_state": 1, "heat_state": 4}),
            CoordinatorConfig::new(),
        );
        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.poll_mode(), PollMode::Normal);

        coordinator.api().update("heat_state", json!(2));
        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.poll_mode(), PollMode::Rapid);

        tokio::time::advance(Duration::from_secs(1)).await;
        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.poll_mode(), PollMode::Rapid);

        coordinator.api().update("heat_state", json!(3));
        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.poll_mode(), PollMode::Normal);
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn heater_off_also_turns_filter_off() {
        let coordinator = coordinator(
            json!({"heater_state": 1, "filter_state": 1}),
            CoordinatorConfig::new(),
        );

        coordinator.set_feature("heater", "off").await.unwrap();

        assert_eq!(
            coordinator.api().sent(),
            sent(&[&[("heater_state", 0)], &[("filter_state", 0)]])
        );
        let pending = coordinator.pending();
        assert_eq!(pending.get("heater"), Some(&json!("off")));
        assert_eq!(pending.get("filter"), Some(&json!("off")));
    }

    #[tokio::test]
    async fn filter_off_stops_heater_when_configured() {
        let coordinator = coordinator(
            json!({}),
            CoordinatorConfig::new().with_dependency_policy(DependencyPolicy::FilterOffStopsHeater),
        );

        coordinator.set_feature("filter", "OFF").await.unwrap();
        coordinator.set_feature("heater", "off").await.unwrap();

        assert_eq!(
            coordinator.api().sent(),
            sent(&[
                &[("filter_state", 0)],
                &[("heater_state", 0)],
                &[("heater_state", 0)]
            ])
        );
    }

    #[tokio::test]
    async fn independent_policy_sends_one_command() {
        let coordinator = coordinator(
            json!({}),
            CoordinatorConfig::new().with_dependency_policy(DependencyPolicy::Independent),
        );
        coordinator.set_feature("heater", "off").await.unwrap();
        assert_eq!(coordinator.api().sent(), sent(&[&[("heater_state", 0)]]));
    }

    #[tokio::test]
    async fn switching_on_has_no_dependent() {
        let coordinator = coordinator(json!({}), CoordinatorConfig::new());
        coordinator.set_feature("heater", "on").await.unwrap();
        assert_eq!(coordinator.api().sent(), sent(&[&[("heater_state", 1)]]));
    }

    #[tokio::test]
    async fn failed_dependent_command_is_reported() {
        let coordinator = coordinator(json!({}), CoordinatorConfig::new());
        coordinator.api().reject("filter_state");

        let err = coordinator.set_feature("heater", "off").await.unwrap_err();
        assert!(err.is_command_rejected());
        assert_eq!(coordinator.api().sent().len(), 2);
    }

    #[tokio::test]
    async fn invalid_requests_send_nothing() {
        let coordinator = coordinator(json!({}), CoordinatorConfig::new());

        let err = coordinator.set_feature("sauna", "on").await.unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::UnknownFeature(_))));

        let err = coordinator.set_feature("heater", "yes").await.unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::InvalidSwitchState(_))));

        let err = coordinator.set_feature("bubble", "on").await.unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::FeatureRequiresLevel(_))));

        let err = coordinator.set_bubble_level(4).await.unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::OutOfRange { .. })));

        let err = coordinator.set_temperature(45.0).await.unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::InvalidTemperature { .. })));

        assert!(coordinator.api().sent().is_empty());
        assert_eq!(coordinator.poll_mode(), PollMode::Normal);
    }

    #[tokio::test]
    async fn rejected_command_leaves_nothing_pending() {
        let coordinator = coordinator(json!({}), CoordinatorConfig::new());
        coordinator.api().reject("jet_state");

        assert!(coordinator.set_feature("jet", "on").await.is_err());
        assert!(coordinator.pending().is_empty());
        assert_eq!(coordinator.poll_mode(), PollMode::Normal);
    }

    #[tokio::test]
    async fn bubble_reuses_last_level() {
        let coordinator = coordinator(json!({"bubble_level": 3}), CoordinatorConfig::new());
        coordinator.poll_once().await.unwrap();

        coordinator.set_bubble(SwitchState::On, None).await.unwrap();
        coordinator
            .set_bubble(SwitchState::On, Some(BubbleLevel::new(1).unwrap()))
            .await
            .unwrap();

        assert_eq!(
            coordinator.api().sent(),
            sent(&[
                &[("bubble_level", 3), ("bubble_state", 1)],
                &[("bubble_level", 1), ("bubble_state", 1)]
            ])
        );
    }

    #[tokio::test]
    async fn temperature_is_sent_doubled() {
        let coordinator = coordinator(json!({}), CoordinatorConfig::new());

        coordinator.set_temperature(38.5).await.unwrap();
        coordinator
            .set_temperature_in(100.0, TemperatureUnit::Fahrenheit)
            .await
            .unwrap();
        coordinator
            .set_temperature_unit(TemperatureUnit::Fahrenheit)
            .await
            .unwrap();

        assert_eq!(
            coordinator.api().sent(),
            sent(&[
                &[("temperature_setting", 77)],
                &[("temperature_setting", 76)],
                &[("temperature_unit", 1)]
            ])
        );

        let state = coordinator.poll_once().await.unwrap();
        assert_eq!(state.target_temperature, Some(38.0));
        assert_eq!(state.temperature_unit, Some(TemperatureUnit::Fahrenheit));
    }
}

// ============================================================================
// Power cycles
// ============================================================================

mod power_cycle {
    use super::*;

    fn running() -> Value {
        json!({
            "is_online": true,
            "heater_state": 1,
            "filter_state": 1,
            "ozone_state": 1,
            "uvc_state": 0,
            "temperature_setting": 76
        })
    }

    fn rebooted() -> Value {
        json!({
            "is_online": true,
            "heater_state": 0,
            "filter_state": 0,
            "ozone_state": 0,
            "uvc_state": 0,
            "temperature_setting": 70
        })
    }

    async fn lose_and_restore_power(coordinator: &Coordinator<FakeTub>) {
        coordinator.poll_once().await.unwrap();

        let mut offline = rebooted();
        offline["is_online"] = json!(false);
        coordinator.api().replace(offline);
        coordinator.poll_once().await.unwrap();

        coordinator.api().replace(rebooted());
        coordinator.poll_once().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn restores_settings_after_power_returns() {
        let coordinator = coordinator(
            running(),
            CoordinatorConfig::new().with_state_restoration(true),
        );
        let mut events = coordinator.subscribe();

        lose_and_restore_power(&coordinator).await;

        assert_eq!(
            coordinator.api().sent(),
            sent(&[
                &[("temperature_setting", 76)],
                &[("heater_state", 1)],
                &[("filter_state", 1)],
                &[("ozone_state", 1)]
            ])
        );

        let saved = coordinator.saved_state().unwrap();
        assert_eq!(saved.heater, SwitchState::On);
        assert_eq!(saved.target_temperature, Some(38.0));

        let report = coordinator.last_restore().unwrap();
        assert!(report.is_complete());
        assert_eq!(
            report.succeeded,
            vec!["target_temperature", "heater", "filter", "ozone"]
        );

        let events = drain(&mut events);
        assert!(events.iter().any(|e| matches!(e, CoordinatorEvent::PowerLost)));
        assert!(events.iter().any(|e| matches!(
            e,
            CoordinatorEvent::PowerRestored {
                signal: DetectionSignal::OnlineFlag
            }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, CoordinatorEvent::RestorationFinished { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn restoration_continues_past_failures() {
        let coordinator = coordinator(
            running(),
            CoordinatorConfig::new().with_state_restoration(true),
        );
        coordinator.api().reject("heater_state");

        lose_and_restore_power(&coordinator).await;

        let commands = coordinator.api().sent();
        assert!(commands.contains(&vec![("heater_state".to_string(), 1)]));
        assert!(commands.contains(&vec![("filter_state".to_string(), 1)]));

        let report = coordinator.last_restore().unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, "heater");
        assert!(report.succeeded.contains(&"filter".to_string()));
        assert!(report.succeeded.contains(&"ozone".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn restoration_pauses_between_items() {
        let coordinator = coordinator(
            running(),
            CoordinatorConfig::new().with_state_restoration(true),
        );
        let start = tokio::time::Instant::now();

        lose_and_restore_power(&coordinator).await;

        // Four items, three pauses of two seconds
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test]
    async fn restoration_is_opt_in() {
        let coordinator = coordinator(running(), CoordinatorConfig::new());
        let mut events = coordinator.subscribe();

        lose_and_restore_power(&coordinator).await;

        assert!(coordinator.api().sent().is_empty());
        assert!(coordinator.saved_state().is_some());
        assert!(coordinator.last_restore().is_none());
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, CoordinatorEvent::PowerRestored { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_heuristic_without_online_flag() {
        let coordinator = coordinator(
            json!({"heater_state": 1, "filter_state": 1, "temperature_unit": 1}),
            CoordinatorConfig::new().with_state_restoration(true),
        );
        let mut events = coordinator.subscribe();
        coordinator.poll_once().await.unwrap();

        coordinator.api().replace(json!({
            "heater_state": 0,
            "filter_state": 0,
            "temperature_unit": 0
        }));
        coordinator.poll_once().await.unwrap();

        assert!(drain(&mut events).iter().any(|e| matches!(
            e,
            CoordinatorEvent::PowerRestored {
                signal: DetectionSignal::ResetHeuristic
            }
        )));
        assert_eq!(
            coordinator.api().sent(),
            sent(&[
                &[("temperature_unit", 1)],
                &[("heater_state", 1)],
                &[("filter_state", 1)]
            ])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn host_unit_wins_during_restoration() {
        let coordinator = coordinator(
            json!({"heater_state": 1, "filter_state": 1, "temperature_unit": 1}),
            CoordinatorConfig::new()
                .with_state_restoration(true)
                .with_host_unit(TemperatureUnit::Celsius),
        );
        coordinator.poll_once().await.unwrap();

        coordinator.api().replace(json!({
            "heater_state": 0,
            "filter_state": 0,
            "temperature_unit": 0
        }));
        coordinator.poll_once().await.unwrap();

        assert_eq!(
            coordinator.api().sent(),
            sent(&[&[("heater_state", 1)], &[("filter_state", 1)]])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn restoring_heater_off_keeps_saved_filter() {
        let coordinator = coordinator(
            json!({"is_online": true, "heater_state": 0, "filter_state": 1}),
            CoordinatorConfig::new().with_state_restoration(true),
        );
        coordinator.poll_once().await.unwrap();

        coordinator
            .api()
            .replace(json!({"is_online": false, "heater_state": 0, "filter_state": 1}));
        coordinator.poll_once().await.unwrap();

        coordinator
            .api()
            .replace(json!({"is_online": true, "heater_state": 1, "filter_state": 1}));
        coordinator.poll_once().await.unwrap();

        assert_eq!(coordinator.api().sent(), sent(&[&[("heater_state", 0)]]));

        let report = coordinator.last_restore().unwrap();
        assert!(report.is_complete());
        assert_eq!(report.succeeded, vec!["heater"]);

        coordinator.poll_once().await.unwrap();
        let saved = coordinator.saved_state().unwrap();
        let state = coordinator.state().unwrap();
        assert_eq!(state.heater, saved.heater);
        assert_eq!(state.filter, saved.filter);
        assert_eq!(state.filter, SwitchState::On);
    }

    #[tokio::test]
    async fn commanded_shutdown_is_not_a_power_cycle() {
        let coordinator = coordinator(
            json!({"heater_state": 1, "filter_state": 1}),
            CoordinatorConfig::new().with_state_restoration(true),
        );
        coordinator.poll_once().await.unwrap();
        let mut events = coordinator.subscribe();

        coordinator.set_feature("heater", "off").await.unwrap();
        coordinator.poll_once().await.unwrap();

        assert!(!drain(&mut events).iter().any(CoordinatorEvent::is_power_event));
        assert_eq!(coordinator.api().sent().len(), 2);
    }
}

// ============================================================================
// Background poller
// ============================================================================

mod poller {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn polls_at_normal_interval_until_shutdown() {
        let coordinator = Arc::new(coordinator(json!({}), CoordinatorConfig::new()));
        let handle = Arc::clone(&coordinator).spawn();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(coordinator.api().fetch_count(), 2);
        assert!(coordinator.state().is_some());

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(coordinator.api().fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_after_failures() {
        let coordinator = Arc::new(coordinator(json!({}), CoordinatorConfig::new()));
        coordinator.api().fail_next(3);
        let handle = Arc::clone(&coordinator).spawn();

        // Failures at 0 s, 5 s and 15 s, success at 35 s
        tokio::time::sleep(Duration::from_secs(34)).await;
        assert_eq!(coordinator.api().fetch_count(), 3);
        assert!(coordinator.state().is_none());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(coordinator.api().fetch_count(), 4);
        assert!(coordinator.state().is_some());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn command_wakes_the_poller() {
        let coordinator = Arc::new(coordinator(json!({}), CoordinatorConfig::new()));
        let handle = Arc::clone(&coordinator).spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(coordinator.api().fetch_count(), 1);

        coordinator.set_feature("jet", "on").await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(coordinator.api().fetch_count(), 2);
        assert_eq!(coordinator.state().unwrap().jet, SwitchState::On);
        assert_eq!(coordinator.poll_mode(), PollMode::Normal);

        handle.shutdown().await;
    }
}
