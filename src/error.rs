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

//! Error types for the playback facade.

use thiserror::Error;

use crate::player::{Command, PlaybackState};

/// Failure reported by a native engine session.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The native call returned a non-zero status code.
    #[error("engine returned status {0}")]
    Status(i32),

    /// The engine backend itself failed (worker gone, library error...).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Errors surfaced synchronously by [`crate::Player`] commands.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The command is not permitted from the current playback state. The
    /// engine was not called and the state is unchanged.
    #[error("{command} is not permitted in state {state}")]
    InvalidState {
        command: Command,
        state: PlaybackState,
    },

    /// The command was valid but the engine rejected it.
    #[error("{command} rejected by engine")]
    Engine {
        command: Command,
        #[source]
        source: EngineError,
    },

    /// The player has been released, its engine session no longer exists.
    #[error("player has been released")]
    Released,

    /// No engine binding has been installed for this process.
    #[error("no engine binding installed")]
    NotLoaded,

    /// An engine binding was already installed for this process.
    #[error("engine binding already installed")]
    AlreadyLoaded,

    /// The engine failed to create a playback session.
    #[error("failed to create engine session")]
    Create(#[source] EngineError),

    /// The event dispatcher thread could not be started.
    #[error("failed to spawn event dispatcher")]
    Spawn(#[source] std::io::Error),
}

impl PlayerError {
    /// Returns `true` for [`PlayerError::InvalidState`].
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, PlayerError::InvalidState { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = PlayerError> = std::result::Result<T, E>;
