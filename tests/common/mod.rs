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

//! Recording fake engine shared by the integration tests.
//!
//! The fake never emits events on its own; tests play the part of the engine
//! threads by posting through the captured [`Notifier`].

#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
    time::Duration,
};

use liteplayer::{Engine, EngineBinding, EngineError, Notifier, PlaybackState, Player, PlayerConfig};
use parking_lot::Mutex;

pub const WAIT: Duration = Duration::from_secs(2);
pub const QUIET: Duration = Duration::from_millis(200);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    SetSource(String),
    Prepare,
    Start,
    Pause,
    Resume,
    Seek(i32),
    Stop,
    Reset,
    Destroy,
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    notifier: Option<Notifier>,
    position: Option<i32>,
    duration: Option<i32>,
    fail_next: Option<i32>,
    echo: bool,
}

/// Creates [`FakeEngine`]s and keeps a window into the last one.
#[derive(Clone, Default)]
pub struct FakeBinding {
    shared: Arc<Mutex<Shared>>,
}

impl FakeBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// A binding whose engines post the resulting state of every accepted
    /// synchronous command, the way the mpv binding does.
    pub fn echoing() -> Self {
        let binding = Self::default();
        binding.shared.lock().echo = true;
        binding
    }

    pub fn player(&self) -> Player {
        Player::with_binding(self, &PlayerConfig::default()).unwrap()
    }

    /// The back-reference the engine was given at creation.
    pub fn notifier(&self) -> Notifier {
        self.shared.lock().notifier.clone().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.shared.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn set_duration(&self, msec: i32) {
        self.shared.lock().duration = Some(msec);
    }

    /// Makes the next engine command fail with `status`.
    pub fn fail_next(&self, status: i32) {
        self.shared.lock().fail_next = Some(status);
    }
}

impl EngineBinding for FakeBinding {
    fn create(&self, notifier: Notifier) -> Result<Box<dyn Engine>, EngineError> {
        self.shared.lock().notifier = Some(notifier);
        Ok(Box::new(FakeEngine {
            shared: self.shared.clone(),
        }))
    }
}

pub struct FakeEngine {
    shared: Arc<Mutex<Shared>>,
}

impl FakeEngine {
    fn record(&self, call: Call) -> Result<(), EngineError> {
        let mut shared = self.shared.lock();
        if let Some(status) = shared.fail_next.take() {
            return Err(EngineError::Status(status));
        }
        shared.calls.push(call);
        Ok(())
    }

    fn echo(&self, state: PlaybackState) -> Result<(), EngineError> {
        let notifier = {
            let shared = self.shared.lock();
            if shared.echo { shared.notifier.clone() } else { None }
        };
        if let Some(notifier) = notifier {
            notifier.post(state);
        }
        Ok(())
    }
}

impl Engine for FakeEngine {
    fn set_source(&mut self, uri: &str) -> Result<(), EngineError> {
        self.record(Call::SetSource(uri.to_string()))?;
        self.echo(PlaybackState::Inited)
    }

    fn prepare_async(&mut self) -> Result<(), EngineError> {
        self.record(Call::Prepare)
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.record(Call::Start)?;
        self.echo(PlaybackState::Started)
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.record(Call::Pause)?;
        self.echo(PlaybackState::Paused)
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        self.record(Call::Resume)?;
        self.echo(PlaybackState::Started)
    }

    fn seek_to(&mut self, msec: i32) -> Result<(), EngineError> {
        self.record(Call::Seek(msec))?;
        self.shared.lock().position = Some(msec);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.record(Call::Stop)?;
        self.echo(PlaybackState::Stopped)
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        self.record(Call::Reset)?;
        self.shared.lock().position = None;
        self.echo(PlaybackState::Idle)
    }

    fn position(&self) -> Option<i32> {
        self.shared.lock().position
    }

    fn duration(&self) -> Option<i32> {
        self.shared.lock().duration
    }

    fn destroy(&mut self) {
        self.shared.lock().calls.push(Call::Destroy);
    }

    fn echoes_commands(&self) -> bool {
        self.shared.lock().echo
    }
}

/// A channel whose sender can be moved into a listener.
pub fn signal<T>() -> (Sender<T>, Receiver<T>) {
    mpsc::channel()
}
