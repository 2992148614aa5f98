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

mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use common::{Call, FakeBinding, QUIET, WAIT, signal};
use liteplayer::{PlaybackState, PlayerError, TIME_UNKNOWN};
use parking_lot::Mutex;

#[test]
fn event_after_immediate_release_is_dropped() {
    let binding = FakeBinding::new();
    let player = binding.player();

    let (tx, rx) = signal();
    player.set_on_prepared_listener(move |_| {
        let _ = tx.send(());
    });

    player.release();

    let notifier = binding.notifier();
    thread::spawn(move || notifier.post(PlaybackState::Prepared))
        .join()
        .unwrap();

    assert!(rx.recv_timeout(QUIET).is_err());
    assert_eq!(player.state(), PlaybackState::Idle);
    assert!(!binding.notifier().is_connected());
}

#[test]
fn release_twice_destroys_once() {
    let binding = FakeBinding::new();
    let player = binding.player();

    player.release();
    player.release();
    drop(player);

    assert_eq!(binding.count(&Call::Destroy), 1);
}

#[test]
fn commands_after_release_fail_without_touching_the_engine() {
    let binding = FakeBinding::new();
    let player = binding.player();
    player.release();

    assert!(player.is_released());
    assert!(matches!(
        player.set_data_source("a.mp3"),
        Err(PlayerError::Released)
    ));
    assert!(matches!(player.reset(), Err(PlayerError::Released)));
    assert_eq!(player.current_position(), TIME_UNKNOWN);
    assert_eq!(player.duration(), TIME_UNKNOWN);

    assert_eq!(binding.calls(), vec![Call::Destroy]);
}

#[test]
fn dropping_the_player_releases_it() {
    let binding = FakeBinding::new();
    let player = binding.player();
    let notifier = binding.notifier();

    drop(player);

    assert!(!notifier.is_connected());
    assert_eq!(binding.count(&Call::Destroy), 1);

    // Late engine events are harmless.
    notifier.post(PlaybackState::Completed);
    notifier.post_error(1, 2);
}

#[test]
fn queued_events_are_not_delivered_after_release() {
    let binding = FakeBinding::new();
    let player = binding.player();

    let (entered_tx, entered_rx) = signal();
    let (proceed_tx, proceed_rx) = signal::<()>();
    let proceed_rx = Mutex::new(proceed_rx);
    player.set_on_idle_listener(move |_| {
        let _ = entered_tx.send(());
        let _ = proceed_rx.lock().recv_timeout(WAIT);
    });

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    player.set_on_started_listener(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let notifier = binding.notifier();
    notifier.post(PlaybackState::Idle);
    notifier.post(PlaybackState::Started);
    notifier.post(PlaybackState::Started);

    // The dispatcher is now blocked inside the Idle listener with two
    // Started events queued behind it.
    entered_rx.recv_timeout(WAIT).unwrap();

    // Release waits for the running listener, so let it finish shortly.
    let unblock = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let _ = proceed_tx.send(());
    });

    player.release();
    unblock.join().unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(player.state(), PlaybackState::Idle);
}

#[test]
fn release_racing_engine_threads_never_delivers_late() {
    for _ in 0..20 {
        let binding = FakeBinding::new();
        let player = binding.player();
        player.set_data_source("a.mp3").unwrap();

        let released = Arc::new(AtomicBool::new(false));
        let late = Arc::new(AtomicUsize::new(0));

        for kind in [PlaybackState::Started, PlaybackState::Paused] {
            let released = released.clone();
            let late = late.clone();
            let listener = move |_: &liteplayer::Player| {
                if released.load(Ordering::SeqCst) {
                    late.fetch_add(1, Ordering::SeqCst);
                }
            };
            match kind {
                PlaybackState::Started => player.set_on_started_listener(listener),
                _ => player.set_on_paused_listener(listener),
            }
        }

        let engines: Vec<_> = [PlaybackState::Started, PlaybackState::Paused]
            .into_iter()
            .map(|kind| {
                let notifier = binding.notifier();
                thread::spawn(move || {
                    for _ in 0..500 {
                        notifier.post(kind);
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(1));
        let state_at_release = {
            player.release();
            released.store(true, Ordering::SeqCst);
            player.state()
        };

        for engine in engines {
            engine.join().unwrap();
        }
        thread::sleep(Duration::from_millis(20));

        assert_eq!(late.load(Ordering::SeqCst), 0);
        assert_eq!(player.state(), state_at_release);
        assert_eq!(binding.count(&Call::Destroy), 1);
    }
}

#[test]
fn release_from_a_listener_stops_later_events() {
    let binding = FakeBinding::new();
    let player = binding.player();

    let (released_tx, released_rx) = signal();
    player.set_on_completed_listener(move |p| {
        p.release();
        let _ = released_tx.send(p.is_released());
    });

    let (stopped_tx, stopped_rx) = signal();
    player.set_on_stopped_listener(move |_| {
        let _ = stopped_tx.send(());
    });

    let notifier = binding.notifier();
    notifier.post(PlaybackState::Completed);
    notifier.post(PlaybackState::Stopped);

    assert!(released_rx.recv_timeout(WAIT).unwrap());
    assert!(stopped_rx.recv_timeout(QUIET).is_err());
    assert_eq!(player.state(), PlaybackState::Completed);

    player.release();
    assert_eq!(binding.count(&Call::Destroy), 1);
}

#[test]
fn events_from_many_threads_keep_enqueue_order() {
    const THREADS: i32 = 16;

    let binding = FakeBinding::new();
    let player = binding.player();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = signal();
    let sink = seen.clone();
    player.set_on_error_listener(move |_, what, _| {
        let mut seen = sink.lock();
        seen.push(what);
        if seen.len() == THREADS as usize {
            let _ = done_tx.send(());
        }
    });

    // Each thread posts only after the previous one has, handing a baton
    // along, so enqueue order is 0, 1, 2, ... while every post comes from a
    // different thread.
    let (start_tx, mut baton_rx) = signal::<()>();
    let mut handles = Vec::new();
    for what in 0..THREADS {
        let (next_tx, next_rx) = signal::<()>();
        let notifier = binding.notifier();
        let rx = std::mem::replace(&mut baton_rx, next_rx);
        handles.push(thread::spawn(move || {
            rx.recv().unwrap();
            notifier.post_error(what, 0);
            let _ = next_tx.send(());
        }));
    }
    start_tx.send(()).unwrap();

    for handle in handles {
        handle.join().unwrap();
    }
    done_rx.recv_timeout(WAIT).unwrap();

    assert_eq!(*seen.lock(), (0..THREADS).collect::<Vec<_>>());
}

#[test]
fn listeners_never_run_concurrently() {
    let binding = FakeBinding::new();
    let player = binding.player();

    let active = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let total = Arc::new(AtomicUsize::new(0));

    let (active_l, overlaps_l, total_l) = (active.clone(), overlaps.clone(), total.clone());
    player.set_on_nearly_completed_listener(move |_| {
        if active_l.fetch_add(1, Ordering::SeqCst) != 0 {
            overlaps_l.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_micros(200));
        active_l.fetch_sub(1, Ordering::SeqCst);
        total_l.fetch_add(1, Ordering::SeqCst);
    });

    let engines: Vec<_> = (0..4)
        .map(|_| {
            let notifier = binding.notifier();
            thread::spawn(move || {
                for _ in 0..25 {
                    notifier.post(PlaybackState::NearlyCompleted);
                }
            })
        })
        .collect();
    for engine in engines {
        engine.join().unwrap();
    }

    let (tx, rx) = signal();
    player.set_on_cache_completed_listener(move |_| {
        let _ = tx.send(());
    });
    binding.notifier().post(PlaybackState::CacheCompleted);
    rx.recv_timeout(WAIT).unwrap();

    assert_eq!(total.load(Ordering::SeqCst), 100);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}
