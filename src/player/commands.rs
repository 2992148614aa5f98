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

//! Command dispatch to the engine session.
//!
//! A [`Session`] pairs the [`StateMachine`] with the engine handle it guards.
//! Every command is validated against the current state first; only a valid
//! command reaches the engine, and only a command the engine accepted is
//! committed to the state machine.

use std::fmt;

use tracing::{debug, warn};

use crate::{
    engine::Engine,
    error::{EngineError, PlayerError, Result},
    player::state::{PlaybackState, StateMachine},
};

/// Reported by position and duration queries when the engine does not know.
pub const TIME_UNKNOWN: i32 = -1;

/// The state-changing commands accepted by a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    SetDataSource,
    PrepareAsync,
    Start,
    Pause,
    Resume,
    SeekTo,
    Stop,
    Reset,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::SetDataSource,
        Command::PrepareAsync,
        Command::Start,
        Command::Pause,
        Command::Resume,
        Command::SeekTo,
        Command::Stop,
        Command::Reset,
    ];

    /// State reached as soon as the engine accepts the command, `None` for
    /// commands whose completion is reported later by an event.
    pub fn result_state(self) -> Option<PlaybackState> {
        match self {
            Command::SetDataSource => Some(PlaybackState::Inited),
            Command::Start | Command::Resume => Some(PlaybackState::Started),
            Command::Pause => Some(PlaybackState::Paused),
            Command::Stop => Some(PlaybackState::Stopped),
            Command::Reset => Some(PlaybackState::Idle),
            Command::PrepareAsync | Command::SeekTo => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::SetDataSource => "setDataSource",
            Command::PrepareAsync => "prepareAsync",
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::SeekTo => "seekTo",
            Command::Stop => "stop",
            Command::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// The engine handle together with the state that guards it.
///
/// `engine` becomes `None` exactly once, when the player is released.
pub(crate) struct Session {
    pub(crate) machine: StateMachine,
    pub(crate) engine: Option<Box<dyn Engine>>,
}

impl Session {
    pub(crate) fn new(engine: Box<dyn Engine>) -> Self {
        Self {
            machine: StateMachine::new(engine.echoes_commands()),
            engine: Some(engine),
        }
    }

    /// Validates `command`, forwards it with `call` and commits it.
    ///
    /// # Errors
    ///
    /// * [`PlayerError::Released`] if the engine has been destroyed.
    /// * [`PlayerError::InvalidState`] if the table forbids the command, in
    ///   which case `call` is never run.
    /// * [`PlayerError::Engine`] if the engine rejected the command, the
    ///   state is left unchanged.
    pub(crate) fn dispatch<F>(&mut self, command: Command, call: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Engine) -> std::result::Result<(), EngineError>,
    {
        let engine = self.engine.as_mut().ok_or(PlayerError::Released)?;

        if let Err(e) = self.machine.check(command) {
            warn!(%command, state = %self.machine.state(), "rejecting command");
            return Err(e);
        }

        debug!(%command, state = %self.machine.state(), "dispatching command");

        call(engine.as_mut()).map_err(|source| PlayerError::Engine { command, source })?;

        self.machine.commit(command);

        Ok(())
    }

    pub(crate) fn position(&self) -> i32 {
        self.engine
            .as_ref()
            .and_then(|engine| engine.position())
            .unwrap_or(TIME_UNKNOWN)
    }

    pub(crate) fn duration(&self) -> i32 {
        self.engine
            .as_ref()
            .and_then(|engine| engine.duration())
            .unwrap_or(TIME_UNKNOWN)
    }

    /// Takes the engine out of the session, `None` if already taken.
    pub(crate) fn take_engine(&mut self) -> Option<Box<dyn Engine>> {
        self.engine.take()
    }
}
