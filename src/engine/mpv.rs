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

//! MPV-backed engine sessions.
//!
//! Each session owns a worker thread holding its own `libmpv` context. The
//! [`MpvEngine`] handle is a command proxy: every call is sent over a channel
//! and the worker replies once mpv accepted (or refused) it.
//!
//! # Architecture
//!
//! The worker alternates between two duties:
//! 1. **Commands**: drains pending [`MpvCommand`]s and replies to each.
//! 2. **Events**: waits briefly for an mpv event and translates it into a
//!    notification (Prepared once the file is loaded, SeekCompleted once
//!    playback restarts after a seek, Completed at end of file, ...).

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender, TryRecvError},
    },
    thread::{self, JoinHandle},
};

use anyhow::{Context, Result, anyhow, bail};
use mpv::Format;
use tracing::{debug, error, warn};

use crate::{
    config::PlayerConfig,
    engine::{
        Engine, EngineBinding, Notifier,
        tracker::{FileState, Progress, Signal},
    },
    error::EngineError,
    player::PlaybackState,
};

pub use crate::engine::tracker::{ERROR_PLAYBACK, ERROR_WORKER};

const EVENT_WAIT_SECS: f64 = 0.02;

/// Creates mpv sessions configured from a [`PlayerConfig`].
#[derive(Debug, Clone)]
pub struct MpvBinding {
    options: BTreeMap<String, String>,
    nearly_completed_ms: i32,
}

impl MpvBinding {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            options: config.engine_options.clone(),
            nearly_completed_ms: config.nearly_completed_ms,
        }
    }
}

impl EngineBinding for MpvBinding {
    fn create(&self, notifier: Notifier) -> Result<Box<dyn Engine>, EngineError> {
        let engine = MpvEngine::spawn(self.clone(), notifier)?;
        Ok(Box::new(engine))
    }
}

#[derive(Debug)]
enum MpvCommand {
    SetSource(String),
    Prepare,
    Play,
    Pause,
    Seek(i32),
    Stop,
    Reset,
    Shutdown,
}

struct Request {
    command: MpvCommand,
    reply: Sender<Result<()>>,
}

/// A handle to one mpv worker thread.
pub struct MpvEngine {
    command_tx: Sender<Request>,
    progress: Arc<Progress>,
    worker: Option<JoinHandle<()>>,
}

impl MpvEngine {
    /// Spawns the worker and waits until its mpv context is ready.
    fn spawn(binding: MpvBinding, notifier: Notifier) -> Result<Self, EngineError> {
        let (command_tx, command_rx) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let progress = Arc::new(Progress::new());
        let worker_progress = progress.clone();

        let worker = thread::Builder::new()
            .name("liteplayer-mpv".to_string())
            .spawn(move || {
                let error_notifier = notifier.clone();
                if let Err(e) = mpv_worker(binding, command_rx, ready_tx, notifier, worker_progress) {
                    error!("mpv worker failure: {:?}", e);
                    error_notifier.post_error(ERROR_WORKER, 0);
                }
            })
            .context("Failed to spawn mpv worker")?;

        ready_rx
            .recv()
            .context("mpv worker exited during start-up")??;

        Ok(Self {
            command_tx,
            progress,
            worker: Some(worker),
        })
    }

    fn call(&self, command: MpvCommand) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = mpsc::channel();

        self.command_tx
            .send(Request {
                command,
                reply: reply_tx,
            })
            .map_err(|_| anyhow!("mpv worker has stopped"))?;

        reply_rx
            .recv()
            .context("mpv worker stopped before replying")??;

        Ok(())
    }
}

impl Engine for MpvEngine {
    fn set_source(&mut self, uri: &str) -> Result<(), EngineError> {
        self.call(MpvCommand::SetSource(uri.to_string()))
    }

    fn prepare_async(&mut self) -> Result<(), EngineError> {
        self.call(MpvCommand::Prepare)
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.call(MpvCommand::Play)
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.call(MpvCommand::Pause)
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        self.call(MpvCommand::Play)
    }

    fn seek_to(&mut self, msec: i32) -> Result<(), EngineError> {
        self.call(MpvCommand::Seek(msec))
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.call(MpvCommand::Stop)
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        self.call(MpvCommand::Reset)
    }

    fn position(&self) -> Option<i32> {
        self.progress.position()
    }

    fn duration(&self) -> Option<i32> {
        self.progress.duration()
    }

    fn destroy(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        if let Err(e) = self.call(MpvCommand::Shutdown) {
            debug!("mpv worker already stopped: {}", e);
        }
        if worker.join().is_err() {
            warn!("mpv worker panicked");
        }
    }

    /// The worker posts Inited, Started, Paused, Stopped or Idle once mpv
    /// has taken each command.
    fn echoes_commands(&self) -> bool {
        true
    }
}

impl Drop for MpvEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// The execution loop for one mpv session.
///
/// # Errors
///
/// Returns an error if the mpv context fails to initialise or if the event
/// loop hits an unrecoverable failure.
fn mpv_worker(
    binding: MpvBinding,
    command_rx: Receiver<Request>,
    ready_tx: Sender<Result<()>>,
    notifier: Notifier,
    progress: Arc<Progress>,
) -> Result<()> {
    let handler = build_handler(&binding);

    let mut handler = match handler {
        Ok(handler) => {
            let _ = ready_tx.send(Ok(()));
            handler
        }
        Err(e) => {
            let _ = ready_tx.send(Err(anyhow!("{:#}", e)));
            return Err(e);
        }
    };

    let mut file = FileState::default();

    while process_commands(&mut handler, &command_rx, &notifier, &progress, &mut file) {
        process_mpv_events(
            &mut handler,
            &notifier,
            &progress,
            &mut file,
            binding.nearly_completed_ms,
        );
    }

    debug!("mpv worker stopped");

    Ok(())
}

/// Creates the mpv context and registers the observed properties.
fn build_handler(binding: &MpvBinding) -> Result<mpv::MpvHandler> {
    let mut builder = mpv::MpvHandlerBuilder::new().context("Failed to create MPV builder")?;
    builder
        .set_option("vo", "null")
        .context("Failed to set no video output")?;
    for (name, value) in &binding.options {
        builder
            .set_option(name.as_str(), value.as_str())
            .with_context(|| format!("Failed to set MPV option {}", name))?;
    }

    let mut handler = builder.build().context("Failed to build MPV handler")?;
    handler
        .observe_property::<f64>("time-pos", 0)
        .context("Failed to observe time-pos")?;
    handler
        .observe_property::<f64>("duration", 0)
        .context("Failed to observe duration")?;

    Ok(handler)
}

/// Drains and executes all pending commands. Returns `false` once the
/// session should shut down.
fn process_commands(
    handler: &mut mpv::MpvHandler,
    command_rx: &Receiver<Request>,
    notifier: &Notifier,
    progress: &Progress,
    file: &mut FileState,
) -> bool {
    loop {
        let request = match command_rx.try_recv() {
            Ok(request) => request,
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        };

        if matches!(request.command, MpvCommand::Shutdown) {
            let _ = request.reply.send(Ok(()));
            return false;
        }

        let result = execute(handler, request.command, notifier, progress, file);
        if let Err(e) = &result {
            warn!("mpv command failed: {:#}", e);
        }
        let _ = request.reply.send(result);
    }
}

fn execute(
    handler: &mut mpv::MpvHandler,
    command: MpvCommand,
    notifier: &Notifier,
    progress: &Progress,
    file: &mut FileState,
) -> Result<()> {
    match command {
        MpvCommand::SetSource(uri) => {
            file.set_source(uri);
            notifier.post(PlaybackState::Inited);
        }
        MpvCommand::Prepare => {
            let Some(source) = file.source().map(str::to_string) else {
                bail!("No source set");
            };
            handler
                .set_property("pause", true)
                .context("Failed to pause before loading")?;
            handler
                .command(&["loadfile", &source, "replace"])
                .context(format!("Failed to load file: {}", &source))?;
            file.loading();
        }
        MpvCommand::Play => {
            handler.set_property("pause", false)?;
            notifier.post(PlaybackState::Started);
        }
        MpvCommand::Pause => {
            handler.set_property("pause", true)?;
            notifier.post(PlaybackState::Paused);
        }
        MpvCommand::Seek(msec) => {
            let seconds = format!("{:.3}", f64::from(msec) / 1000.0);
            handler
                .command(&["seek", &seconds, "absolute"])
                .context("Failed to seek")?;
            file.seeking();
        }
        MpvCommand::Stop => {
            handler.command(&["stop"])?;
            file.stopped();
            progress.clear();
            notifier.post(PlaybackState::Stopped);
        }
        MpvCommand::Reset => {
            handler.command(&["stop"])?;
            *file = FileState::default();
            progress.clear();
            notifier.post(PlaybackState::Idle);
        }
        MpvCommand::Shutdown => {}
    }

    Ok(())
}

/// Waits briefly for an mpv event and reports whatever it means for the
/// session.
fn process_mpv_events(
    handler: &mut mpv::MpvHandler,
    notifier: &Notifier,
    progress: &Progress,
    file: &mut FileState,
    nearly_completed_ms: i32,
) {
    let Some(signal) = handler.wait_event(EVENT_WAIT_SECS).and_then(signal_of) else {
        return;
    };

    if let Some(report) = file.translate(progress, signal, nearly_completed_ms) {
        report.send(notifier);
    }
}

/// Picks out the mpv events the session cares about.
fn signal_of(event: mpv::Event) -> Option<Signal> {
    match event {
        mpv::Event::PropertyChange { name, change, .. } => match (name, change) {
            ("time-pos", Format::Double(seconds)) => Some(Signal::Position(seconds)),
            ("duration", Format::Double(seconds)) => Some(Signal::Duration(seconds)),
            _ => None,
        },
        mpv::Event::FileLoaded => Some(Signal::FileLoaded),
        mpv::Event::PlaybackRestart => Some(Signal::PlaybackRestart),
        mpv::Event::EndFile(result) => match result {
            Ok(mpv::EndFileReason::MPV_END_FILE_REASON_EOF) => Some(Signal::EndOfFile),
            Ok(_) => None,
            Err(e) => {
                error!("mpv playback error: {:?}", e);
                Some(Signal::EndFileError)
            }
        },
        _ => None,
    }
}
