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

//! Playback state and the transition table.
//!
//! The [`StateMachine`] is the single authority for the current
//! [`PlaybackState`]. Commands are checked against the table before the
//! engine is touched, and are committed only once the engine accepted them.
//! Engine events are applied as they are delivered, last one wins.
//!
//! Some engines echo every accepted synchronous command back as an event.
//! For those the machine remembers the echoes it expects, in command order,
//! and consumes a matching event without touching the state, so a late echo
//! never rolls back a command issued after it.
//!
//! | Command         | Valid from                              | Result          |
//! |-----------------|-----------------------------------------|-----------------|
//! | `SetDataSource` | Idle, Stopped, Error, Completed         | Inited          |
//! | `PrepareAsync`  | Inited                                  | event driven    |
//! | `Start`         | Prepared, Paused, SeekCompleted         | Started         |
//! | `Pause`         | Started                                 | Paused          |
//! | `Resume`        | Paused                                  | Started         |
//! | `SeekTo`        | Started, Paused, Prepared               | event driven    |
//! | `Stop`          | Started, Paused, Prepared, Completed    | Stopped         |
//! | `Reset`         | any                                     | Idle            |

use std::{collections::VecDeque, fmt};

use crate::{
    error::{PlayerError, Result},
    player::commands::Command,
};

/// Current playback state of a player.
///
/// The discriminants match the status codes used by the native engine when
/// it reports state changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    Idle = 0x00,
    Inited = 0x01,
    Prepared = 0x02,
    Started = 0x03,
    Paused = 0x04,
    SeekCompleted = 0x05,
    CacheCompleted = 0x06,
    NearlyCompleted = 0x07,
    Completed = 0x08,
    Stopped = 0x09,
    Error = 0x0A,
}

impl PlaybackState {
    pub const ALL: [PlaybackState; 11] = [
        PlaybackState::Idle,
        PlaybackState::Inited,
        PlaybackState::Prepared,
        PlaybackState::Started,
        PlaybackState::Paused,
        PlaybackState::SeekCompleted,
        PlaybackState::CacheCompleted,
        PlaybackState::NearlyCompleted,
        PlaybackState::Completed,
        PlaybackState::Stopped,
        PlaybackState::Error,
    ];

    /// Native status code of this state.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Maps a native status code back to a state, `None` for unknown codes.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.code() == code)
    }

    /// Informational states never replace the current playback state.
    pub fn is_overlay(self) -> bool {
        matches!(
            self,
            PlaybackState::CacheCompleted | PlaybackState::NearlyCompleted
        )
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Inited => "Inited",
            PlaybackState::Prepared => "Prepared",
            PlaybackState::Started => "Started",
            PlaybackState::Paused => "Paused",
            PlaybackState::SeekCompleted => "SeekCompleted",
            PlaybackState::CacheCompleted => "CacheCompleted",
            PlaybackState::NearlyCompleted => "NearlyCompleted",
            PlaybackState::Completed => "Completed",
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Error => "Error",
        };
        f.write_str(name)
    }
}

/// States from which `command` may be issued.
pub(crate) fn valid_from(command: Command) -> &'static [PlaybackState] {
    use PlaybackState::*;

    match command {
        Command::SetDataSource => &[Idle, Stopped, Error, Completed],
        Command::PrepareAsync => &[Inited],
        Command::Start => &[Prepared, Paused, SeekCompleted],
        Command::Pause => &[Started],
        Command::Resume => &[Paused],
        Command::SeekTo => &[Started, Paused, Prepared],
        Command::Stop => &[Started, Paused, Prepared, Completed],
        Command::Reset => &PlaybackState::ALL,
    }
}

/// Holds the current state and the outstanding asynchronous command, if any.
#[derive(Debug)]
pub(crate) struct StateMachine {
    state: PlaybackState,
    outstanding: Option<Command>,
    /// Echo events still to come, `None` for engines that do not echo.
    echoes: Option<VecDeque<PlaybackState>>,
}

impl StateMachine {
    /// # Arguments
    ///
    /// * `echoes` - Whether the engine reports each accepted synchronous
    ///   command back as an event.
    pub(crate) fn new(echoes: bool) -> Self {
        Self {
            state: PlaybackState::Idle,
            outstanding: None,
            echoes: echoes.then(VecDeque::new),
        }
    }

    pub(crate) fn state(&self) -> PlaybackState {
        self.state
    }

    pub(crate) fn outstanding(&self) -> Option<Command> {
        self.outstanding
    }

    /// Checks `command` against the table without changing anything.
    ///
    /// An outstanding prepare also forbids a second prepare and any seek
    /// until the engine reports back.
    pub(crate) fn check(&self, command: Command) -> Result<()> {
        let preparing = self.outstanding == Some(Command::PrepareAsync);
        let blocked = preparing && matches!(command, Command::PrepareAsync | Command::SeekTo);

        if blocked || !valid_from(command).contains(&self.state) {
            return Err(PlayerError::InvalidState {
                command,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Records a command the engine has accepted.
    ///
    /// Synchronous commands move to their result state immediately,
    /// asynchronous ones are only marked as outstanding.
    pub(crate) fn commit(&mut self, command: Command) {
        let Some(state) = command.result_state() else {
            self.outstanding = Some(command);
            return;
        };

        self.state = state;
        if matches!(
            command,
            Command::SetDataSource | Command::Stop | Command::Reset
        ) {
            self.outstanding = None;
        }
        if let Some(echoes) = self.echoes.as_mut() {
            echoes.push_back(state);
        }
    }

    /// Applies a state reported by the engine and returns the resulting state.
    ///
    /// An event matching the oldest expected echo only consumes that echo.
    pub(crate) fn apply_event(&mut self, event: PlaybackState) -> PlaybackState {
        if event.is_overlay() {
            return self.state;
        }

        if let Some(echoes) = self.echoes.as_mut() {
            if echoes.front() == Some(&event) {
                echoes.pop_front();
                return self.state;
            }
        }

        self.outstanding = match (self.outstanding, event) {
            (_, PlaybackState::Error | PlaybackState::Idle | PlaybackState::Stopped) => None,
            (Some(Command::PrepareAsync), PlaybackState::Prepared) => None,
            (Some(Command::SeekTo), PlaybackState::SeekCompleted) => None,
            (outstanding, _) => outstanding,
        };
        self.state = event;
        self.state
    }

    /// Number of echo events still expected.
    #[cfg(test)]
    fn pending_echoes(&self) -> usize {
        self.echoes.as_ref().map_or(0, VecDeque::len)
    }
}
