// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Cross-thread event delivery.
//!
//! Engine threads report state changes through a [`Notifier`]. Each report
//! becomes a [`PendingEvent`] on a channel that is drained by a single
//! dispatcher thread, so listeners run one at a time and strictly in the
//! order the events were posted, whichever thread posted them.
//!
//! # Teardown
//!
//! The notifier never owns the player. It shares a [`Link`] with it, which
//! carries an `alive` flag and the sending end of the queue. Releasing the
//! player severs the link:
//!
//! 1. `alive` is cleared while holding the delivery gate, so it waits for a
//!    delivery already in progress and no later one can start.
//! 2. The sender is dropped, so the dispatcher thread drains what is left
//!    (dropping all of it) and exits.
//!
//! Events posted after that are discarded at the notifier.

use std::{
    fmt,
    io,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, OnceLock, Weak,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
    },
    thread::{self, JoinHandle, ThreadId},
};

use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::player::state::PlaybackState;

/// A notification waiting for delivery on the dispatcher thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingEvent {
    /// Raw engine status code, see [`PlaybackState::code`].
    pub code: i32,
    pub what: i32,
    pub extra: i32,
}

/// State shared between a player, its notifiers and its dispatcher thread.
pub(crate) struct Link {
    alive: AtomicBool,
    gate: Mutex<()>,
    tx: Mutex<Option<Sender<PendingEvent>>>,
    dispatcher: OnceLock<ThreadId>,
}

impl Link {
    pub(crate) fn new() -> (Arc<Self>, Receiver<PendingEvent>) {
        let (tx, rx) = mpsc::channel();

        let link = Arc::new(Self {
            alive: AtomicBool::new(true),
            gate: Mutex::new(()),
            tx: Mutex::new(Some(tx)),
            dispatcher: OnceLock::new(),
        });

        (link, rx)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// `true` when called from this link's dispatcher thread.
    pub(crate) fn on_dispatcher(&self) -> bool {
        self.dispatcher.get() == Some(&thread::current().id())
    }

    fn post(&self, event: PendingEvent) -> bool {
        if !self.is_alive() {
            return false;
        }

        match self.tx.lock().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Marks the link dead and closes the queue.
    ///
    /// Returns `true` only for the call that actually severed it.
    pub(crate) fn sever(&self) -> bool {
        let was_alive = if self.on_dispatcher() {
            // The gate is already held by the delivery that called us.
            self.alive.swap(false, Ordering::AcqRel)
        } else {
            let _gate = self.gate.lock();
            self.alive.swap(false, Ordering::AcqRel)
        };

        self.tx.lock().take();

        was_alive
    }
}

/// The back-reference handed to an engine session.
///
/// Cheap to clone and safe to call from any thread. Once the player is
/// released every call is a silent no-op.
#[derive(Clone)]
pub struct Notifier {
    link: Arc<Link>,
}

impl Notifier {
    pub(crate) fn new(link: Arc<Link>) -> Self {
        Self { link }
    }

    /// Posts a raw engine notification.
    ///
    /// Unknown `code`s are accepted here and discarded by the dispatcher.
    pub fn notify(&self, code: i32, what: i32, extra: i32) {
        let event = PendingEvent { code, what, extra };

        if !self.link.post(event) {
            trace!(?event, "player released, dropping engine event");
        }
    }

    /// Posts a state change.
    pub fn post(&self, state: PlaybackState) {
        self.notify(state.code(), 0, 0);
    }

    /// Posts an engine error with its opaque `(what, extra)` pair.
    pub fn post_error(&self, what: i32, extra: i32) {
        self.notify(PlaybackState::Error.code(), what, extra);
    }

    /// `false` once the player this notifier reports to has been released.
    pub fn is_connected(&self) -> bool {
        self.link.is_alive()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Spawns the dispatcher thread for `link`.
///
/// Each received event is handed to `deliver` together with the target,
/// provided the target still exists and the link is still alive. A panic in
/// `deliver` is logged and the thread carries on with the next event.
pub(crate) fn spawn_dispatcher<T, F>(
    name: &str,
    rx: Receiver<PendingEvent>,
    link: Arc<Link>,
    target: Weak<T>,
    deliver: F,
) -> io::Result<JoinHandle<()>>
where
    T: Send + Sync + 'static,
    F: Fn(&Arc<T>, PendingEvent) + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || run_dispatcher(rx, link, target, deliver))
}

fn run_dispatcher<T, F>(rx: Receiver<PendingEvent>, link: Arc<Link>, target: Weak<T>, deliver: F)
where
    F: Fn(&Arc<T>, PendingEvent),
{
    let _ = link.dispatcher.set(thread::current().id());

    debug!("event dispatcher started");

    while let Ok(event) = rx.recv() {
        let Some(target) = target.upgrade() else {
            trace!(?event, "player dropped, discarding event");
            continue;
        };

        let _gate = link.gate.lock();

        if !link.is_alive() {
            trace!(?event, "player released, discarding event");
            continue;
        }

        if panic::catch_unwind(AssertUnwindSafe(|| deliver(&target, event))).is_err() {
            error!(?event, "listener panicked while handling event");
        }
    }

    debug!("event dispatcher stopped");
}
