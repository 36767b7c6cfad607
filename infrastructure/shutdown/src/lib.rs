// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

//! Shutdown signalling used by all long-running Polaris services.
//!
//! A [`Shutdown`] is held by the owner of a set of tasks. Each task takes a
//! [`ShutdownSignal`] and completes its `wait()` future once `trigger()` is
//! called, or once the `Shutdown` is dropped.

use tokio::sync::watch;

/// Trigger for shutdowns.
///
/// Use `to_signal` to obtain a signal that resolves when `trigger` is called.
/// All signals resolve. Dropping the `Shutdown` also triggers it, so it
/// should be held as long as the application requires.
#[derive(Debug)]
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn trigger(&self) {
        // send_replace stores the value even when no receiver is subscribed
        // yet, so signals created later still observe the trigger.
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn to_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Shutdown {
    fn drop(&mut self) {
        self.trigger();
    }
}

/// Receiver end of a shutdown signal. Once resolved, the consumer should
/// stop all work and return.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        // A closed channel means the Shutdown was dropped, which triggers.
        *self.receiver.borrow() || self.receiver.has_changed().is_err()
    }

    /// Completes when the shutdown is triggered. Safe to call repeatedly and
    /// from any number of cloned signals.
    pub async fn wait(&mut self) {
        while !*self.receiver.borrow() {
            if self.receiver.changed().await.is_err() {
                // Sender dropped: treat as triggered.
                return;
            }
        }
    }
}
