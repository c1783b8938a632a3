// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background poll loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::Coordinator;
use crate::protocol::HotTubApi;

/// Handle to a running poll loop.
///
/// Dropping the handle stops the loop at its next wait.
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stops the loop and waits for the current cycle to finish.
    pub async fn shutdown(self) {
        let Self { shutdown, task } = self;
        // Err only when the loop already exited
        let _ = shutdown.send(true);
        if let Err(err) = task.await
            && err.is_panic()
        {
            tracing::error!(error = %err, "Poll loop panicked");
        }
    }

    /// Returns `true` if the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<A: HotTubApi + 'static> Coordinator<A> {
    /// Spawns the poll loop on the current runtime.
    ///
    /// The loop polls at the mode's interval, wakes early after a
    /// command and backs off after consecutive failures.
    #[must_use]
    pub fn spawn(self: Arc<Self>) -> PollerHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(run(self, rx));
        PollerHandle { shutdown, task }
    }

    fn failure_delay(&self, failures: u32) -> Duration {
        self.config
            .backoff()
            .delay_for_failure(failures)
            .min(self.config.normal_interval())
    }
}

async fn run<A: HotTubApi + 'static>(coordinator: Arc<Coordinator<A>>, mut shutdown: watch::Receiver<bool>) {
    tracing::debug!("Poll loop started");
    let mut failures: u32 = 0;

    loop {
        let delay = match coordinator.poll_once().await {
            Ok(_) => {
                if failures > 0 {
                    tracing::info!(failures, "Polling recovered");
                }
                failures = 0;
                coordinator.poll_interval()
            }
            Err(err) => {
                if err.is_auth_failure() {
                    tracing::error!(error = %err, "Credentials rejected during polling");
                }
                failures = failures.saturating_add(1);
                let delay = coordinator.failure_delay(failures);
                tracing::debug!(failures, ?delay, "Backing off");
                delay
            }
        };

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = coordinator.wake.notified() => {
                tracing::trace!("Poll loop woken by command");
            }
            _ = shutdown.changed() => break,
        }
    }

    tracing::debug!("Poll loop stopped");
}
