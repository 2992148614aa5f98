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

//! Engines that post every accepted command back as an event.

mod common;

use common::{FakeBinding, WAIT, signal};
use liteplayer::{PlaybackState, Player};
use parking_lot::Mutex;

fn prepared(binding: &FakeBinding) -> Player {
    let player = binding.player();

    let (tx, rx) = signal();
    player.set_on_prepared_listener(move |p| {
        let _ = tx.send(p.state());
    });

    player.set_data_source("a.mp3").unwrap();
    player.prepare_async().unwrap();
    binding.notifier().post(PlaybackState::Prepared);

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), PlaybackState::Prepared);
    player.remove_listener(liteplayer::ListenerKind::Prepared);
    player
}

#[test]
fn delayed_echoes_do_not_undo_later_commands() {
    let binding = FakeBinding::echoing();
    let player = prepared(&binding);

    // Hold the dispatcher so both echoes are still queued when pause returns.
    let (entered_tx, entered_rx) = signal();
    let (proceed_tx, proceed_rx) = signal::<()>();
    let proceed_rx = Mutex::new(proceed_rx);
    player.set_on_nearly_completed_listener(move |_| {
        let _ = entered_tx.send(());
        let _ = proceed_rx.lock().recv_timeout(WAIT);
    });
    binding.notifier().post(PlaybackState::NearlyCompleted);
    entered_rx.recv_timeout(WAIT).unwrap();

    let (started_tx, started_rx) = signal();
    player.set_on_started_listener(move |p| {
        let _ = started_tx.send(p.state());
    });
    let (paused_tx, paused_rx) = signal();
    player.set_on_paused_listener(move |p| {
        let _ = paused_tx.send(p.state());
    });

    player.start().unwrap();
    player.pause().unwrap();
    assert_eq!(player.state(), PlaybackState::Paused);

    proceed_tx.send(()).unwrap();

    // Echoes still reach their listeners, the state stays where pause put it.
    assert_eq!(started_rx.recv_timeout(WAIT).unwrap(), PlaybackState::Paused);
    assert_eq!(paused_rx.recv_timeout(WAIT).unwrap(), PlaybackState::Paused);
    assert_eq!(player.state(), PlaybackState::Paused);

    player.resume().unwrap();
    assert_eq!(player.state(), PlaybackState::Started);
    assert_eq!(started_rx.recv_timeout(WAIT).unwrap(), PlaybackState::Started);
}

#[test]
fn engine_events_still_apply_between_echoes() {
    let binding = FakeBinding::echoing();
    let player = prepared(&binding);

    let (tx, rx) = signal();
    player.set_on_completed_listener(move |p| {
        let _ = tx.send(p.state());
    });

    player.start().unwrap();
    binding.notifier().post(PlaybackState::Completed);

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), PlaybackState::Completed);
    assert_eq!(player.state(), PlaybackState::Completed);

    player.stop().unwrap();
    player.set_data_source("b.mp3").unwrap();
    assert_eq!(player.state(), PlaybackState::Inited);
}
