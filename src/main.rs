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

//! # Liteplayer demo.
//!
//! Plays one source through the mpv engine binding, driven entirely by
//! player listeners:
//!
//! * **Prepared** starts playback.
//! * **Started** optionally schedules one relative seek.
//! * **SeekCompleted** restarts playback unless the player was paused.
//! * **Completed** and **Error** reset the player.
//! * **Idle** ends the demo.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use liteplayer::{Player, PlaybackState, config, engine, engine::mpv::MpvBinding};

/// Command-line arguments for the demo player.
#[derive(Parser, Debug)]
#[command(name = "liteplayer")]
#[command(about = "Play a file or URL through the liteplayer facade")]
#[command(version)]
struct Args {
    /// File path or URL to play, defaults to the configured source
    uri: Option<String>,

    /// Seek forward by this many milliseconds once playback has started
    #[arg(short, long)]
    seek: Option<i32>,

    /// Configuration name to load instead of the default one
    #[arg(short, long)]
    config: Option<String>,

    /// Give up waiting for playback to finish after this many seconds
    #[arg(short, long, default_value = "600")]
    timeout: u64,
}

/// The entry point of the demo.
///
/// Loads the configuration, installs the engine binding, and plays the
/// requested source until the player returns to idle.
fn main() -> Result<()> {
    let args = Args::parse();

    let config = config::load_config(args.config.as_deref());

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(uri) = args.uri.clone().or_else(|| config.default_source.clone()) else {
        bail!("No source given and no default_source configured");
    };

    engine::install(MpvBinding::new(&config)).context("Failed to load engine")?;

    let player = Player::with_config(&config).context("Failed to create player")?;

    let (done_tx, done_rx) = mpsc::channel();
    register_listeners(&player, args.seek, done_tx);

    info!("Playing {}", uri);

    player
        .set_data_source(&uri)
        .context("Failed to set data source")?;
    player.prepare_async().context("Failed to prepare")?;

    let res = done_rx.recv_timeout(Duration::from_secs(args.timeout));
    player.release();

    match res {
        Ok(()) => Ok(()),
        Err(_) => bail!("Playback did not finish within {}s", args.timeout),
    }
}

/// Wires the demo behaviour into the player's listeners.
fn register_listeners(player: &Player, seek: Option<i32>, done_tx: mpsc::Sender<()>) {
    let paused = Arc::new(AtomicBool::new(false));
    let seek_pending = Arc::new(AtomicBool::new(seek.is_some()));

    let idle_paused = paused.clone();
    player.set_on_idle_listener(move |_| {
        idle_paused.store(false, Ordering::SeqCst);
        let _ = done_tx.send(());
    });

    player.set_on_prepared_listener(|p| {
        info!("Prepared, duration {}ms", p.duration());
        if let Err(e) = p.start() {
            error!("Failed to start: {}", e);
        }
    });

    let started_paused = paused.clone();
    player.set_on_started_listener(move |p| {
        started_paused.store(false, Ordering::SeqCst);

        let Some(offset) = seek else {
            return;
        };
        if !seek_pending.swap(false, Ordering::SeqCst) {
            return;
        }

        let position = p.current_position();
        let duration = p.duration();
        let target = position.max(0) + offset;
        if target >= duration {
            error!(
                "Failed to seek, position: {}ms, duration: {}ms",
                position, duration
            );
            return;
        }
        if let Err(e) = p.seek_to(target) {
            error!("Failed to seek: {}", e);
        }
    });

    let paused_flag = paused.clone();
    player.set_on_paused_listener(move |_| {
        paused_flag.store(true, Ordering::SeqCst);
    });

    player.set_on_seek_completed_listener(move |p| {
        info!("Seek completed at {}ms", p.current_position());
        if !paused.load(Ordering::SeqCst) {
            if let Err(e) = p.start() {
                error!("Failed to restart after seek: {}", e);
            }
        }
    });

    player.set_on_nearly_completed_listener(|_| info!("Nearly completed"));

    player.set_on_completed_listener(|p| {
        info!("Completed");
        let _ = p.reset();
    });

    player.set_on_error_listener(|p, what, extra| {
        error!("Playback error ({}, {}) in state {}", what, extra, p.state());
        if p.state() == PlaybackState::Error {
            let _ = p.reset();
        }
    });
}
