use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use super::{output::test_utils::Recorder, *};

fn shared_with(config: Config) -> (Shared, Recorder) {
    let recorder = Recorder::default();
    let shared = Shared::new(config, Output::new(recorder.clone()));

    (shared, recorder)
}

fn shared() -> (Shared, Recorder) {
    shared_with(Config::default())
}

fn record_all(shared: &Shared) -> Arc<Mutex<Vec<Event>>> {
    let events = Arc::new(Mutex::new(Vec::new()));

    for channel in 0..CHANNELS as u8 {
        for kind in [
            KnobEventKind::Pressed,
            KnobEventKind::Released,
            KnobEventKind::PressAndHold,
            KnobEventKind::DoublePress,
            KnobEventKind::Incremented,
            KnobEventKind::Decremented,
        ] {
            let events = Arc::clone(&events);
            shared.bindings.set_knob(
                channel,
                kind,
                Some(Arc::new(move |event: &Event| events.lock().unwrap().push(*event))),
            );
        }

        for number in 0..BUTTONS as u8 {
            for kind in [
                ButtonEvent::Pressed,
                ButtonEvent::Released,
                ButtonEvent::PressAndHold,
                ButtonEvent::DoublePress,
            ] {
                let events = Arc::clone(&events);
                shared.bindings.set_button(
                    channel,
                    number,
                    kind,
                    Some(Arc::new(move |event: &Event| events.lock().unwrap().push(*event))),
                );
            }
        }

        for kind in [
            FaderEventKind::Touched,
            FaderEventKind::Released,
            FaderEventKind::Level,
        ] {
            let events = Arc::clone(&events);
            shared.bindings.set_fader(
                channel,
                kind,
                Some(Arc::new(move |event: &Event| events.lock().unwrap().push(*event))),
            );
        }
    }

    events
}

fn take(events: &Arc<Mutex<Vec<Event>>>) -> Vec<Event> {
    std::mem::take(&mut *events.lock().unwrap())
}

fn button(channel: u8, number: u8, event: ButtonEvent) -> Event {
    Event::Button {
        channel,
        number,
        event,
    }
}

#[test]
fn knob_rotation_events() {
    let (shared, _) = shared();
    let events = record_all(&shared);
    let start = Instant::now();

    shared.process_frame(&[0xb0, 18, 5], start + Duration::from_secs(1));
    shared.process_frame(&[0xb0, 18, 64], start + Duration::from_secs(2));
    shared.process_frame(&[0xb0, 18, 67], start + Duration::from_secs(3));

    let events = take(&events);
    assert_eq!(events.len(), 2);

    match events[0] {
        Event::Knob {
            channel: 2,
            event: KnobEvent::Incremented(rot),
        } => {
            assert_eq!(rot.magnitude, 5);
            assert_eq!(rot.value, 5);
        }
        other => panic!("unexpected {other:?}"),
    }

    match events[1] {
        Event::Knob {
            channel: 2,
            event: KnobEvent::Decremented(rot),
        } => {
            assert_eq!(rot.magnitude, 3);
            assert_eq!(rot.value, 2);
            // 3 ticks in 2s since the previous valid rotation
            assert!((rot.velocity - 1.5).abs() < 1e-6);
            assert_eq!(rot.speed_range, 1);
        }
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(shared.channel(2).knob.rotary.value(), 2);
    assert_eq!(shared.channel(3).knob.rotary.value(), 0);
}

#[test]
fn double_press_without_hold() {
    let config = Config {
        hold_duration: Duration::from_millis(200),
        ..Config::default()
    };
    let (shared, _) = shared_with(config);
    let events = record_all(&shared);
    let start = Instant::now();

    shared.process_frame(&[0x90, 9, 127], start);
    shared.process_frame(&[0x90, 9, 0], start + Duration::from_millis(100));
    shared.process_frame(&[0x90, 9, 127], start + Duration::from_millis(300));
    shared.process_frame(&[0x90, 9, 0], start + Duration::from_millis(400));

    std::thread::sleep(Duration::from_millis(400));
    shared.dispatch_held();

    assert_eq!(
        take(&events),
        vec![
            button(1, 1, ButtonEvent::Pressed),
            button(1, 1, ButtonEvent::Released),
            button(1, 1, ButtonEvent::Pressed),
            button(1, 1, ButtonEvent::Released),
            button(1, 1, ButtonEvent::DoublePress),
        ]
    );
}

#[test]
fn press_and_hold() {
    let config = Config {
        hold_duration: Duration::from_millis(50),
        ..Config::default()
    };
    let (shared, _) = shared_with(config);
    let events = record_all(&shared);
    let (tx, rx) = channel::unbounded();

    tx.send(midi::Msg::from([0x90, 33, 127])).unwrap();
    assert!(shared.drain(&rx));
    std::thread::sleep(Duration::from_millis(200));

    // Fired, but not dispatched until the input is drained.
    assert_eq!(events.lock().unwrap().len(), 1);

    tx.send(midi::Msg::from([0x90, 33, 0])).unwrap();
    assert!(shared.drain(&rx));

    assert_eq!(
        take(&events),
        vec![
            Event::Knob {
                channel: 1,
                event: KnobEvent::Pressed
            },
            Event::Knob {
                channel: 1,
                event: KnobEvent::PressAndHold
            },
            Event::Knob {
                channel: 1,
                event: KnobEvent::Released
            },
        ]
    );
}

#[test]
fn rotation_cancels_hold() {
    let config = Config {
        hold_duration: Duration::from_millis(50),
        ..Config::default()
    };
    let (shared, _) = shared_with(config);
    let events = record_all(&shared);

    shared.process_frame(&[0x90, 32, 127], Instant::now());
    shared.process_frame(&[0xb0, 16, 1], Instant::now());
    std::thread::sleep(Duration::from_millis(200));
    shared.dispatch_held();

    let events = take(&events);
    assert_eq!(events.len(), 2);
    assert!(!events.iter().any(|event| matches!(
        event,
        Event::Knob {
            event: KnobEvent::PressAndHold,
            ..
        }
    )));
}

#[test]
fn fader_events_update_registry() {
    let (shared, _) = shared();
    let events = record_all(&shared);
    let now = Instant::now();

    shared.process_frame(&[0x90, 109, 127], now);
    assert!(shared.channel(5).fader.is_touched);
    shared.process_frame(&[0xe5, 3, 100], now);
    assert_eq!(shared.channel(5).fader.level, 100 * 127 + 3);
    shared.process_frame(&[0x90, 109, 0], now);
    assert!(!shared.channel(5).fader.is_touched);

    assert_eq!(
        take(&events),
        vec![
            Event::Fader {
                fader: 5,
                event: FaderEvent::Touched
            },
            Event::Fader {
                fader: 5,
                event: FaderEvent::Level(12703)
            },
            Event::Fader {
                fader: 5,
                event: FaderEvent::Released
            },
        ]
    );
}

#[test]
fn unhandled_frames_are_ignored() {
    let (shared, recorder) = shared();
    let events = record_all(&shared);
    let now = Instant::now();

    shared.process_frame(&[0x90, 50, 127], now);
    shared.process_frame(&[0x90, 3, 12], now);
    shared.process_frame(&[0xb0, 16, 64], now);
    shared.process_frame(&[0xc0, 1], now);
    shared.process_frame(&[0x90, 0, 127], now);

    assert_eq!(take(&events), vec![button(0, 0, ButtonEvent::Pressed)]);
    assert!(recorder.take().is_empty());
}

#[test]
fn unbound_dispatch_leaves_others_untouched() {
    let (shared, _) = shared();
    let now = Instant::now();

    shared.channel(4).strip[0].set_text("Keep");
    for frame in [
        [0x90u8, 32, 127],
        [0x90, 32, 0],
        [0xb0, 16, 3],
        [0x90, 7, 127],
        [0x90, 7, 0],
        [0x90, 104, 127],
        [0xe0, 1, 1],
        [0x90, 104, 0],
    ] {
        shared.process_frame(&frame, now);
    }

    assert_eq!(shared.channel(0).knob.rotary.value(), 3);
    for idx in 1..CHANNELS as u8 {
        let chan = shared.channel(idx);
        assert_eq!(chan.knob.rotary.value(), 0);
        assert_eq!(chan.fader.level, 0);
    }
    assert_eq!(shared.channel(4).strip[0].text(), "Keep");
}

#[test]
fn drain_processes_in_arrival_order() {
    let (shared, _) = shared();
    let events = record_all(&shared);
    let (tx, rx) = channel::unbounded();

    for value in [1u8, 2, 3, 65] {
        tx.send(midi::Msg::from([0xb0, 23, value])).unwrap();
    }
    assert!(shared.drain(&rx));
    assert!(rx.is_empty());

    let values: Vec<i64> = take(&events)
        .into_iter()
        .map(|event| match event {
            Event::Knob {
                event: KnobEvent::Incremented(rot) | KnobEvent::Decremented(rot),
                ..
            } => rot.value,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(values, vec![1, 3, 6, 5]);

    drop(tx);
    assert!(!shared.drain(&rx));
}

#[test]
fn blink_led_and_strip() {
    let (shared, recorder) = shared();

    shared.channel(2).strip[1].set_text("Blink");
    shared
        .blink
        .lock()
        .unwrap()
        .set(BlinkTarget::StripLine { channel: 2, line: 1 }, 0b1010_1010_1010_1010);
    shared.blink.lock().unwrap().set(
        BlinkTarget::ButtonLed {
            channel: 0,
            number: 3,
        },
        0xffff,
    );

    for _ in 0..16 {
        shared.tick_blink();
    }

    let sent = recorder.take();
    assert_eq!(sent.len(), 32);

    let (leds, strips): (Vec<_>, Vec<_>) = sent.into_iter().partition(|msg| msg[0] == 0x90);
    assert!(leds.iter().all(|msg| msg == &[0x90, 24, 0x7f]));

    let shown = protocol::strip_msg(2, 1, "Blink", true);
    let blank = protocol::strip_msg(2, 1, "", true);
    let visible: Vec<bool> = strips
        .iter()
        .map(|msg| {
            assert!(msg.as_slice() == shown.inner() || msg.as_slice() == blank.inner());
            msg.as_slice() == shown.inner()
        })
        .collect();

    assert_eq!(visible.iter().filter(|&&v| v).count(), 8);
    assert!(visible.windows(2).all(|w| w[0] != w[1]));

    // The text survives the blank frames.
    assert_eq!(shared.channel(2).strip[1].text(), "Blink");
}

#[test]
fn hold_runs_on_the_draining_thread() {
    let config = Config {
        hold_duration: Duration::from_millis(20),
        ..Config::default()
    };
    let (shared, _) = shared_with(config);
    let threads = Arc::new(Mutex::new(Vec::new()));

    let threads_cb = Arc::clone(&threads);
    shared.bindings.set_button(
        3,
        2,
        ButtonEvent::PressAndHold,
        Some(Arc::new(move |_: &Event| {
            threads_cb
                .lock()
                .unwrap()
                .push(std::thread::current().id())
        })),
    );

    shared.process_frame(&[0x90, 19, 127], Instant::now());
    std::thread::sleep(Duration::from_millis(100));
    assert!(threads.lock().unwrap().is_empty());

    shared.dispatch_held();
    assert_eq!(*threads.lock().unwrap(), vec![std::thread::current().id()]);
}
