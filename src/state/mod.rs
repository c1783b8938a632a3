// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state: raw snapshots and their canonical form.
//!
//! - [`RawSnapshot`]: attributes as the vendor returned them
//! - [`HotTubState`]: the normalized record every caller reads
//! - [`PendingChanges`]: command effects not yet observed
//! - [`SavedState`]: settings captured before a power loss

mod hot_tub_state;
mod pending;
mod saved;
mod snapshot;

pub use hot_tub_state::{DIAGNOSTIC_FIELDS, FilterStatus, HeatState, HotTubState, HvacAction};
pub use pending::PendingChanges;
pub use saved::SavedState;
pub use snapshot::RawSnapshot;
