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

//! Playback control and state management.
//!
//! This module provides the [`Player`] facade used by application code. It
//! owns one engine session and combines:
//!
//! * the [`state`] machine, the only authority on the current
//!   [`PlaybackState`];
//! * the [`commands`] dispatcher, which validates each command before it is
//!   forwarded to the engine on the caller's thread;
//! * the [`events`] dispatcher, a dedicated thread that applies engine
//!   notifications to the state and runs listeners, one at a time, in order;
//! * the [`listeners`] registry.
//!
//! Listeners always run on the dispatcher thread and receive the player, so
//! they may issue further commands from inside a callback.

pub(crate) mod commands;
pub(crate) mod events;
pub(crate) mod listeners;
pub(crate) mod state;

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::PlayerConfig,
    engine::{self, Engine, EngineBinding},
    error::{EngineError, PlayerError, Result},
    player::{
        commands::Session,
        events::{Link, Notifier, PendingEvent},
        listeners::{Callback, ErrorCallback, ListenerRegistry},
    },
};

pub use commands::{Command, TIME_UNKNOWN};
pub use listeners::ListenerKind;
pub use state::PlaybackState;

/// A playback session exposed to application code.
///
/// Commands are synchronous: they validate the current state, forward the
/// call to the engine and return. `prepare_async` and `seek_to` complete
/// later, reported through the Prepared / SeekCompleted (or Error)
/// listeners.
///
/// Dropping the player releases it.
pub struct Player {
    inner: Arc<Inner>,
}

struct Inner {
    session: Mutex<Session>,
    listeners: Mutex<ListenerRegistry<Player>>,
    link: Arc<Link>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    released: AtomicBool,
}

impl Player {
    /// Creates a player on the process-wide binding installed with
    /// [`engine::install`], using the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::NotLoaded`] if no binding is installed.
    pub fn new() -> Result<Self> {
        Self::with_config(&PlayerConfig::default())
    }

    /// Like [`Player::new`], with an explicit configuration.
    pub fn with_config(config: &PlayerConfig) -> Result<Self> {
        let binding = engine::binding().ok_or(PlayerError::NotLoaded)?;
        Self::with_binding(binding, config)
    }

    /// Creates a player on an explicit engine binding.
    ///
    /// The engine session is created here and the dispatcher thread is
    /// started; both live until [`Player::release`].
    pub fn with_binding(binding: &dyn EngineBinding, config: &PlayerConfig) -> Result<Self> {
        let (link, rx) = Link::new();

        let engine = binding
            .create(Notifier::new(link.clone()))
            .map_err(PlayerError::Create)?;

        let inner = Arc::new(Inner {
            session: Mutex::new(Session::new(engine)),
            listeners: Mutex::new(ListenerRegistry::new()),
            link: link.clone(),
            dispatcher: Mutex::new(None),
            released: AtomicBool::new(false),
        });

        let spawned = events::spawn_dispatcher(
            &config.dispatcher_thread_name,
            rx,
            link,
            Arc::downgrade(&inner),
            deliver,
        );

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                // Dropping `inner` releases the session just created.
                drop(inner);
                return Err(PlayerError::Spawn(e));
            }
        };

        *inner.dispatcher.lock() = Some(handle);

        info!("player created");

        Ok(Self { inner })
    }

    /// Sets the URI to play. Valid from Idle, Stopped, Error and Completed.
    ///
    /// # Arguments
    ///
    /// * `uri` - A local file path or a network URL.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::InvalidState`] from any other state,
    /// [`PlayerError::Engine`] if the engine refused the source and
    /// [`PlayerError::Released`] after [`Player::release`]. Every other
    /// command fails the same way.
    pub fn set_data_source(&self, uri: &str) -> Result<()> {
        self.dispatch(Command::SetDataSource, |engine| engine.set_source(uri))
    }

    /// Starts preparing the source, completion is reported by the Prepared
    /// listener (or Error).
    pub fn prepare_async(&self) -> Result<()> {
        self.dispatch(Command::PrepareAsync, |engine| engine.prepare_async())
    }

    /// Starts playback. Valid from Prepared, Paused and SeekCompleted.
    pub fn start(&self) -> Result<()> {
        self.dispatch(Command::Start, |engine| engine.start())
    }

    /// Pauses playback. Valid from Started.
    pub fn pause(&self) -> Result<()> {
        self.dispatch(Command::Pause, |engine| engine.pause())
    }

    /// Resumes paused playback.
    pub fn resume(&self) -> Result<()> {
        self.dispatch(Command::Resume, |engine| engine.resume())
    }

    /// Starts seeking, completion is reported by the SeekCompleted listener
    /// (or Error). Valid from Started, Paused and Prepared, but not while a
    /// prepare is outstanding.
    ///
    /// # Arguments
    ///
    /// * `msec` - The target position, in milliseconds from the beginning.
    pub fn seek_to(&self, msec: i32) -> Result<()> {
        self.dispatch(Command::SeekTo, |engine| engine.seek_to(msec))
    }

    /// Stops playback. Valid from Started, Paused, Prepared and Completed.
    pub fn stop(&self) -> Result<()> {
        self.dispatch(Command::Stop, |engine| engine.stop())
    }

    /// Returns to Idle from any state.
    pub fn reset(&self) -> Result<()> {
        self.dispatch(Command::Reset, |engine| engine.reset())
    }

    /// Destroys the engine session and stops event delivery.
    ///
    /// Events still in flight are discarded, no listener runs once this
    /// returns. Calling it again is a no-op.
    pub fn release(&self) {
        self.inner.release();
    }

    /// Playback position in milliseconds, [`TIME_UNKNOWN`] if unknown.
    pub fn current_position(&self) -> i32 {
        self.inner.session.lock().position()
    }

    /// Duration of the source in milliseconds, [`TIME_UNKNOWN`] if unknown.
    pub fn duration(&self) -> i32 {
        self.inner.session.lock().duration()
    }

    /// The current playback state.
    ///
    /// Inside a listener this is the state matching the event being handled.
    pub fn state(&self) -> PlaybackState {
        self.inner.session.lock().machine.state()
    }

    /// `true` once [`Player::release`] has been called, or the player was
    /// released from a listener.
    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Registers the listener for the Idle event, replacing any previous one.
    ///
    /// Every listener runs on the dispatcher thread, after the state has been
    /// updated, and receives this player so it can issue further commands.
    pub fn set_on_idle_listener<F>(&self, listener: F)
    where
        F: Fn(&Player) + Send + Sync + 'static,
    {
        self.set_listener(ListenerKind::Idle, Arc::new(listener));
    }

    /// Registers the listener called once an asynchronous prepare completes.
    pub fn set_on_prepared_listener<F>(&self, listener: F)
    where
        F: Fn(&Player) + Send + Sync + 'static,
    {
        self.set_listener(ListenerKind::Prepared, Arc::new(listener));
    }

    /// Registers the listener for the Started event.
    pub fn set_on_started_listener<F>(&self, listener: F)
    where
        F: Fn(&Player) + Send + Sync + 'static,
    {
        self.set_listener(ListenerKind::Started, Arc::new(listener));
    }

    /// Registers the listener for the Paused event.
    pub fn set_on_paused_listener<F>(&self, listener: F)
    where
        F: Fn(&Player) + Send + Sync + 'static,
    {
        self.set_listener(ListenerKind::Paused, Arc::new(listener));
    }

    /// Registers the listener called once a seek completes.
    pub fn set_on_seek_completed_listener<F>(&self, listener: F)
    where
        F: Fn(&Player) + Send + Sync + 'static,
    {
        self.set_listener(ListenerKind::SeekCompleted, Arc::new(listener));
    }

    /// Registers the listener called once the engine has buffered the whole
    /// source. The state is left unchanged.
    pub fn set_on_cache_completed_listener<F>(&self, listener: F)
    where
        F: Fn(&Player) + Send + Sync + 'static,
    {
        self.set_listener(ListenerKind::CacheCompleted, Arc::new(listener));
    }

    /// Registers the listener called when playback nears the end of the
    /// source. The state is left unchanged.
    pub fn set_on_nearly_completed_listener<F>(&self, listener: F)
    where
        F: Fn(&Player) + Send + Sync + 'static,
    {
        self.set_listener(ListenerKind::NearlyCompleted, Arc::new(listener));
    }

    /// Registers the listener called when playback reaches the end.
    pub fn set_on_completed_listener<F>(&self, listener: F)
    where
        F: Fn(&Player) + Send + Sync + 'static,
    {
        self.set_listener(ListenerKind::Completed, Arc::new(listener));
    }

    /// Registers the listener for the Stopped event.
    pub fn set_on_stopped_listener<F>(&self, listener: F)
    where
        F: Fn(&Player) + Send + Sync + 'static,
    {
        self.set_listener(ListenerKind::Stopped, Arc::new(listener));
    }

    /// Registers the listener for engine errors.
    ///
    /// The listener receives the engine's `(what, extra)` codes as is.
    pub fn set_on_error_listener<F>(&self, listener: F)
    where
        F: Fn(&Player, i32, i32) + Send + Sync + 'static,
    {
        let listener: ErrorCallback<Player> = Arc::new(listener);
        if !self.is_released() {
            self.inner.listeners.lock().set_error(listener);
        }
    }

    /// Removes whatever listener is registered for `kind`.
    pub fn remove_listener(&self, kind: ListenerKind) {
        self.inner.listeners.lock().remove(kind);
    }

    fn set_listener(&self, kind: ListenerKind, listener: Callback<Player>) {
        // Registrations after release would only keep closures alive.
        if !self.is_released() {
            self.inner.listeners.lock().set(kind, listener);
        }
    }

    fn dispatch<F>(&self, command: Command, call: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Engine) -> Result<(), EngineError>,
    {
        self.inner.session.lock().dispatch(command, call)
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("state", &self.state())
            .field("released", &self.is_released())
            .finish()
    }
}

impl Inner {
    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        // Stop delivery first: once severed, nothing in flight can reach
        // the session or a listener.
        self.link.sever();

        let engine = self.session.lock().take_engine();
        self.listeners.lock().clear();

        if let Some(mut engine) = engine {
            engine.destroy();
        }

        let handle = self.dispatcher.lock().take();
        if let Some(handle) = handle {
            if self.link.on_dispatcher() {
                // Released from a listener, the thread exits on its own once
                // the queue is drained.
                debug!("released from the dispatcher thread");
            } else if handle.join().is_err() {
                warn!("event dispatcher thread panicked");
            }
        }

        info!("player released");
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.release();
    }
}

/// Applies one engine event on the dispatcher thread.
///
/// The state is updated before the listener runs, so a listener querying
/// [`Player::state`] sees the state matching the event it was handed.
fn deliver(inner: &Arc<Inner>, event: PendingEvent) {
    let Some(reported) = PlaybackState::from_code(event.code) else {
        warn!(code = event.code, "discarding unknown engine event");
        return;
    };

    let state = inner.session.lock().machine.apply_event(reported);

    debug!(event = %reported, %state, what = event.what, extra = event.extra, "engine event");

    let bound = ListenerKind::for_state(reported)
        .and_then(|kind| inner.listeners.lock().bind(kind, event.what, event.extra));

    if let Some(bound) = bound {
        let player = Player {
            inner: inner.clone(),
        };
        bound.invoke(&player);
    }
}
