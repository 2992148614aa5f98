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

//! Per-file playback tracking for engine workers.
//!
//! A worker turns what its backend reports into [`Signal`]s and feeds them to
//! [`FileState::translate`], which decides which notification, if any, the
//! player should see. Nothing here talks to the backend itself.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::{engine::Notifier, player::PlaybackState};

/// `what` reported when the engine ends a file with an error.
pub const ERROR_PLAYBACK: i32 = 1;
/// `what` reported when the engine worker itself fails.
pub const ERROR_WORKER: i32 = 2;

const UNKNOWN: i32 = -1;

/// Something the backend reported while playing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Signal {
    /// Playback position, in seconds.
    Position(f64),
    /// Duration of the loaded file, in seconds.
    Duration(f64),
    FileLoaded,
    PlaybackRestart,
    EndOfFile,
    EndFileError,
}

/// A notification for the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Report {
    State(PlaybackState),
    Error { what: i32, extra: i32 },
}

impl Report {
    pub(crate) fn send(self, notifier: &Notifier) {
        match self {
            Report::State(state) => notifier.post(state),
            Report::Error { what, extra } => notifier.post_error(what, extra),
        }
    }
}

/// Position and duration in milliseconds, written by the worker and read by
/// the session handle without a round trip.
#[derive(Debug)]
pub(crate) struct Progress {
    position: AtomicI32,
    duration: AtomicI32,
}

impl Progress {
    pub(crate) fn new() -> Self {
        Self {
            position: AtomicI32::new(UNKNOWN),
            duration: AtomicI32::new(UNKNOWN),
        }
    }

    pub(crate) fn position(&self) -> Option<i32> {
        Self::read(&self.position)
    }

    pub(crate) fn duration(&self) -> Option<i32> {
        Self::read(&self.duration)
    }

    pub(crate) fn clear(&self) {
        self.position.store(UNKNOWN, Ordering::Release);
        self.duration.store(UNKNOWN, Ordering::Release);
    }

    fn read(value: &AtomicI32) -> Option<i32> {
        let value = value.load(Ordering::Acquire);
        (value >= 0).then_some(value)
    }
}

fn to_millis(seconds: f64) -> i32 {
    (seconds * 1000.0) as i32
}

/// Flags for the file currently loaded by a worker.
#[derive(Debug, Default)]
pub(crate) struct FileState {
    source: Option<String>,
    preparing: bool,
    seeking: bool,
    nearly_sent: bool,
}

impl FileState {
    pub(crate) fn set_source(&mut self, uri: String) {
        self.source = Some(uri);
    }

    pub(crate) fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// A new load of the source has been requested.
    pub(crate) fn loading(&mut self) {
        self.preparing = true;
        self.seeking = false;
        self.nearly_sent = false;
    }

    /// A seek has been requested.
    pub(crate) fn seeking(&mut self) {
        self.seeking = true;
        self.nearly_sent = false;
    }

    /// Playback stopped, the source is kept.
    pub(crate) fn stopped(&mut self) {
        self.preparing = false;
        self.seeking = false;
    }

    /// Decides what `signal` means for the player.
    ///
    /// # Arguments
    ///
    /// * `progress` - Updated with position and duration signals.
    /// * `signal` - What the backend reported.
    /// * `nearly_completed_ms` - Remaining time at which NearlyCompleted is
    ///   reported, once per load or seek.
    pub(crate) fn translate(
        &mut self,
        progress: &Progress,
        signal: Signal,
        nearly_completed_ms: i32,
    ) -> Option<Report> {
        match signal {
            Signal::Position(seconds) if seconds >= 0.0 => {
                let position = to_millis(seconds);
                progress.position.store(position, Ordering::Release);

                let duration = progress.duration()?;
                if self.nearly_sent || duration == 0 || duration - position > nearly_completed_ms {
                    return None;
                }
                self.nearly_sent = true;
                Some(Report::State(PlaybackState::NearlyCompleted))
            }
            Signal::Duration(seconds) if seconds >= 0.0 => {
                progress.duration.store(to_millis(seconds), Ordering::Release);
                None
            }
            Signal::Position(_) | Signal::Duration(_) => None,
            Signal::FileLoaded => {
                if !self.preparing {
                    return None;
                }
                self.preparing = false;
                Some(Report::State(PlaybackState::Prepared))
            }
            Signal::PlaybackRestart => {
                if !self.seeking {
                    return None;
                }
                self.seeking = false;
                Some(Report::State(PlaybackState::SeekCompleted))
            }
            Signal::EndOfFile => Some(Report::State(PlaybackState::Completed)),
            Signal::EndFileError => {
                self.stopped();
                Some(Report::Error {
                    what: ERROR_PLAYBACK,
                    extra: 0,
                })
            }
        }
    }
}
