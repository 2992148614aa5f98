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

//! # Liteplayer.
//!
//! A playback-control facade over a native media engine.
//!
//! The engine (decoding, buffering, output) sits behind the
//! [`engine::Engine`] trait. This crate adds what the engine does not give
//! you:
//!
//! * A synchronous command API on [`Player`], checked against an
//!   authoritative [`PlaybackState`] machine before anything reaches the
//!   engine.
//! * Delivery of engine notifications, posted from arbitrary engine threads,
//!   to listeners running one at a time on a single dispatcher thread, in
//!   posting order.
//! * Safe teardown: once [`Player::release`] returns, events still in flight
//!   are dropped instead of touching a destroyed session.
//!
//! ## Usage
//!
//! Install the engine binding once per process, then create players:
//!
//! ```ignore
//! liteplayer::engine::install(binding)?;
//!
//! let player = liteplayer::Player::new()?;
//! player.set_on_prepared_listener(|p| {
//!     let _ = p.start();
//! });
//! player.set_data_source("music.mp3")?;
//! player.prepare_async()?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod player;

pub use config::PlayerConfig;
pub use engine::{Engine, EngineBinding, Notifier};
pub use error::{EngineError, PlayerError, Result};
pub use player::{Command, ListenerKind, PlaybackState, Player, TIME_UNKNOWN};
