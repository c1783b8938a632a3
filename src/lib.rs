// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `MSpa` Lib - A Rust library to poll and control `MSpa` hot tubs.
//!
//! This library talks to the vendor cloud API and keeps one consistent
//! view of a hot tub's state while commands are in flight.
//!
//! # Supported Features
//!
//! - **Feature control**: heater, filter, bubbles (with level), jets, ozone, UV-C
//! - **Temperature**: target temperature and panel unit
//! - **Adaptive polling**: rapid polling until a change is observed
//! - **Power cycles**: detection and optional restoration of settings
//! - **Power estimation**: draw per component and accumulated energy
//!
//! # Quick Start
//!
//! ```no_run
//! use mspa_lib::coordinator::{Coordinator, CoordinatorConfig};
//! use mspa_lib::protocol::{ClientConfig, Credentials};
//! use mspa_lib::types::{Region, SwitchState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> mspa_lib::Result<()> {
//!     let client = ClientConfig::new(Region::Row)
//!         .into_client(Credentials::from_password("me@example.com", "secret"))?;
//!
//!     // Discovers the tub and runs the first poll
//!     let coordinator = Arc::new(
//!         Coordinator::connect(client, CoordinatorConfig::new().with_state_restoration(true))
//!             .await?,
//!     );
//!     let poller = Arc::clone(&coordinator).spawn();
//!
//!     coordinator.set_feature("filter", "on").await?;
//!     coordinator.set_bubble(SwitchState::On, None).await?;
//!
//!     let mut state = coordinator.watch_state();
//!     while state.changed().await.is_ok() {
//!         if let Some(state) = state.borrow().as_ref() {
//!             println!("water at {:?} °C", state.water_temperature);
//!         }
//!     }
//!
//!     poller.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Events
//!
//! ```no_run
//! use mspa_lib::event::CoordinatorEvent;
//! # use mspa_lib::coordinator::{Coordinator, CoordinatorConfig};
//! # async fn example(coordinator: Coordinator<mspa_lib::protocol::ApiClient>) {
//! let mut events = coordinator.subscribe();
//! while let Ok(event) = events.recv().await {
//!     if let CoordinatorEvent::RestorationFinished { report } = event {
//!         println!("restored {:?}, failed {:?}", report.succeeded, report.failed);
//!     }
//! }
//! # }
//! ```

pub mod command;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod power;
pub mod protocol;
pub mod state;
pub mod types;

pub use command::{DependencyPolicy, DesiredState, HotTubCommand};
pub use coordinator::{Coordinator, CoordinatorConfig, PollMode, PollerHandle};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{CoordinatorEvent, EventBus};
pub use protocol::{ApiClient, ClientConfig, Credentials, HotTubApi};
pub use state::{HotTubState, RawSnapshot};
pub use types::{BubbleLevel, Feature, Region, SwitchState, Temperature, TemperatureUnit};
