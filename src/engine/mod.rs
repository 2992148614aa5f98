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

//! Native engine contract.
//!
//! The decode, buffering and output pipeline lives behind two traits:
//!
//! * [`EngineBinding`] is the loaded engine library. It is installed once per
//!   process with [`install`] and creates one session per player.
//! * [`Engine`] is one playback session. The player owns it exclusively and
//!   calls it only from the thread issuing commands.
//!
//! Sessions report progress through the [`Notifier`] handed to them at
//! creation. The notifier may be called from any engine thread at any time,
//! including while the session is being destroyed.

#[cfg(feature = "mpv")]
pub mod mpv;
#[cfg_attr(not(feature = "mpv"), allow(dead_code))]
mod tracker;

use std::sync::OnceLock;

use tracing::info;

use crate::error::{EngineError, PlayerError, Result};

pub use crate::player::events::Notifier;

/// One engine-side playback session.
///
/// `prepare_async` and `seek_to` only start the operation; the engine
/// reports completion (or failure) through its [`Notifier`]. Every other
/// command takes effect before it returns.
///
/// A failed command returns an [`EngineError`] and must leave the session
/// as it was.
pub trait Engine: Send {
    /// Sets the file path or URL of the next source to play.
    ///
    /// # Arguments
    ///
    /// * `uri` - A local path or a network URL, passed to the engine as is.
    fn set_source(&mut self, uri: &str) -> Result<(), EngineError>;

    /// Starts opening the current source. Reports Prepared or Error later.
    fn prepare_async(&mut self) -> Result<(), EngineError>;

    /// Starts or restarts playback of a prepared source.
    fn start(&mut self) -> Result<(), EngineError>;

    /// Pauses playback, keeping the current position.
    fn pause(&mut self) -> Result<(), EngineError>;

    /// Continues playback after a pause.
    fn resume(&mut self) -> Result<(), EngineError>;

    /// Starts seeking. Reports SeekCompleted or Error later.
    ///
    /// # Arguments
    ///
    /// * `msec` - The target position, in milliseconds from the beginning.
    fn seek_to(&mut self, msec: i32) -> Result<(), EngineError>;

    /// Stops playback. The source has to be prepared again to play.
    fn stop(&mut self) -> Result<(), EngineError>;

    /// Drops the current source and returns the session to its initial
    /// state.
    fn reset(&mut self) -> Result<(), EngineError>;

    /// Current position in milliseconds, `None` when unknown.
    fn position(&self) -> Option<i32>;

    /// Duration of the current source in milliseconds, `None` when unknown.
    fn duration(&self) -> Option<i32>;

    /// Tears the session down. Called exactly once, after which the session
    /// is dropped without any further calls.
    fn destroy(&mut self);

    /// Whether the session posts the resulting state of every accepted
    /// synchronous command back through its [`Notifier`].
    ///
    /// Such echoes are delivered to listeners but never override a state
    /// set by a later command.
    fn echoes_commands(&self) -> bool {
        false
    }
}

/// A loaded engine library, shared by all players in the process.
pub trait EngineBinding: Send + Sync {
    /// Creates a new playback session that reports through `notifier`.
    fn create(&self, notifier: Notifier) -> Result<Box<dyn Engine>, EngineError>;
}

static BINDING: OnceLock<Box<dyn EngineBinding>> = OnceLock::new();

/// Installs the process-wide engine binding.
///
/// Must be called once, before the first [`crate::Player::new`].
///
/// # Errors
///
/// Returns [`PlayerError::AlreadyLoaded`] if a binding is already installed.
pub fn install<B>(binding: B) -> Result<()>
where
    B: EngineBinding + 'static,
{
    BINDING
        .set(Box::new(binding))
        .map_err(|_| PlayerError::AlreadyLoaded)?;

    info!("engine binding installed");

    Ok(())
}

/// The installed binding, if any.
pub fn binding() -> Option<&'static dyn EngineBinding> {
    BINDING.get().map(|binding| binding.as_ref())
}
