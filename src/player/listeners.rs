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

//! Listener registration.
//!
//! At most one callback per [`ListenerKind`]. Registering again replaces the
//! previous callback; a kind with nothing registered silently drops its
//! events.

use std::{collections::HashMap, sync::Arc};

use crate::player::state::PlaybackState;

/// Callback for plain state notifications.
pub type Callback<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Callback for engine errors, receives the engine's `(what, extra)` pair.
pub type ErrorCallback<P> = Arc<dyn Fn(&P, i32, i32) + Send + Sync>;

/// The event kinds a listener can be registered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Idle,
    Prepared,
    Started,
    Paused,
    SeekCompleted,
    CacheCompleted,
    NearlyCompleted,
    Completed,
    Stopped,
    Error,
}

impl ListenerKind {
    /// The listener notified for an engine-reported state. `Inited` has none.
    pub fn for_state(state: PlaybackState) -> Option<Self> {
        let kind = match state {
            PlaybackState::Idle => ListenerKind::Idle,
            PlaybackState::Inited => return None,
            PlaybackState::Prepared => ListenerKind::Prepared,
            PlaybackState::Started => ListenerKind::Started,
            PlaybackState::Paused => ListenerKind::Paused,
            PlaybackState::SeekCompleted => ListenerKind::SeekCompleted,
            PlaybackState::CacheCompleted => ListenerKind::CacheCompleted,
            PlaybackState::NearlyCompleted => ListenerKind::NearlyCompleted,
            PlaybackState::Completed => ListenerKind::Completed,
            PlaybackState::Stopped => ListenerKind::Stopped,
            PlaybackState::Error => ListenerKind::Error,
        };
        Some(kind)
    }
}

/// A callback resolved for one event, ready to run outside the registry lock.
pub(crate) enum Bound<P> {
    Plain(Callback<P>),
    Error(ErrorCallback<P>, i32, i32),
}

impl<P> Bound<P> {
    pub(crate) fn invoke(&self, target: &P) {
        match self {
            Bound::Plain(callback) => callback(target),
            Bound::Error(callback, what, extra) => callback(target, *what, *extra),
        }
    }
}

pub(crate) struct ListenerRegistry<P> {
    plain: HashMap<ListenerKind, Callback<P>>,
    error: Option<ErrorCallback<P>>,
}

impl<P> ListenerRegistry<P> {
    pub(crate) fn new() -> Self {
        Self {
            plain: HashMap::new(),
            error: None,
        }
    }

    /// Registers `callback` for `kind`, replacing any previous one.
    ///
    /// `ListenerKind::Error` callbacks go through [`Self::set_error`].
    pub(crate) fn set(&mut self, kind: ListenerKind, callback: Callback<P>) {
        debug_assert_ne!(kind, ListenerKind::Error);
        self.plain.insert(kind, callback);
    }

    pub(crate) fn set_error(&mut self, callback: ErrorCallback<P>) {
        self.error = Some(callback);
    }

    pub(crate) fn remove(&mut self, kind: ListenerKind) {
        match kind {
            ListenerKind::Error => self.error = None,
            _ => {
                self.plain.remove(&kind);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.plain.clear();
        self.error = None;
    }

    /// Resolves the callback for `kind`, if one is registered.
    pub(crate) fn bind(&self, kind: ListenerKind, what: i32, extra: i32) -> Option<Bound<P>> {
        match kind {
            ListenerKind::Error => self
                .error
                .as_ref()
                .map(|callback| Bound::Error(callback.clone(), what, extra)),
            _ => self.plain.get(&kind).cloned().map(Bound::Plain),
        }
    }
}
