// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for coordinator activity.
//!
//! The canonical state itself is published through a `watch` channel
//! (see [`Coordinator::watch_state`](crate::coordinator::Coordinator::watch_state)).
//! The [`EventBus`] carries everything else a host may want to react to:
//! poll failures, mode switches, confirmations and power cycles.
//!
//! # Examples
//!
//! ```
//! use mspa_lib::event::{CoordinatorEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(CoordinatorEvent::PowerLost);
//! assert!(rx.try_recv().unwrap().is_power_event());
//! ```

mod coordinator_event;
mod event_bus;

pub use coordinator_event::CoordinatorEvent;
pub use event_bus::EventBus;
