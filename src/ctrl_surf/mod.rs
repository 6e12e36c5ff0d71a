use crossbeam_channel as channel;
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

pub mod binding;
pub use binding::{BindingTable, Callback};

pub mod blink;
pub use blink::{BlinkTable, BlinkTarget};

pub mod decoder;
pub use decoder::Input;

mod driver;

pub mod error;
pub use error::Error;

pub mod event;
pub use event::{
    ButtonEvent, ButtonEventKind, Event, FaderEvent, FaderEventKind, KnobEvent, KnobEventKind,
    Rotation,
};

pub mod output;
pub use output::{DeviceOut, Output};

pub mod protocol;
use protocol::{BUTTONS, CHANNELS, STRIP_LINES};

pub mod registry;
use registry::Channel;

pub mod timing;
use timing::Timers;

use crate::{config::Config, midi};

/// State shared by the cycles, the timers and the API.
struct Shared {
    config: Config,
    channels: Vec<Mutex<Channel>>,
    blink: Mutex<BlinkTable>,
    bindings: BindingTable,
    output: Output,
    timers: Timers,
    // Hold timers only post their event here, it is dispatched by the input cycle.
    held_tx: channel::Sender<Event>,
    held_rx: channel::Receiver<Event>,
}

// Lock order: the blink table, a channel, then the output.
// Callbacks are never called with a lock held.

impl Shared {
    fn new(config: Config, output: Output) -> Self {
        let thresholds: Arc<[f64]> = config.speed_thresholds.as_slice().into();
        let now = Instant::now();
        let (held_tx, held_rx) = channel::unbounded();

        Self {
            channels: (0..CHANNELS as u8)
                .map(|idx| Mutex::new(Channel::new(idx, Arc::clone(&thresholds), now)))
                .collect(),
            config,
            blink: Mutex::new(BlinkTable::default()),
            bindings: BindingTable::default(),
            output,
            timers: Timers::new(),
            held_tx,
            held_rx,
        }
    }

    fn channel(&self, idx: u8) -> MutexGuard<'_, Channel> {
        self.channels[idx as usize].lock().unwrap()
    }

    /// Processes all the frames currently available, in arrival order.
    ///
    /// Hold events which fired in the meantime are dispatched before
    /// the next frame. Returns `false` if the input is disconnected.
    fn drain(&self, input_rx: &channel::Receiver<midi::Msg>) -> bool {
        loop {
            self.dispatch_held();

            match input_rx.try_recv() {
                Ok(msg) => self.process_frame(&msg, Instant::now()),
                Err(channel::TryRecvError::Empty) => return true,
                Err(channel::TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn dispatch_held(&self) {
        for event in self.held_rx.try_iter() {
            self.bindings.dispatch(event);
        }
    }

    fn process_frame(&self, frame: &[u8], now: Instant) {
        match decoder::decode(frame) {
            Ok(input) => self.handle_input(input, now),
            Err(err) => log::debug!("{err}"),
        }
    }

    fn handle_input(&self, input: Input, now: Instant) {
        use timing::Direction::*;
        use Input::*;

        match input {
            KnobPressed { channel } => {
                let held_tx = self.held_tx.clone();
                self.channel(channel).knob.press.press(
                    &self.timers,
                    self.config.hold_duration,
                    move || {
                        let _ = held_tx.send(Event::Knob {
                            channel,
                            event: KnobEvent::PressAndHold,
                        });
                    },
                );

                self.dispatch_knob(channel, KnobEvent::Pressed);
            }
            KnobReleased { channel } => {
                let is_double = self
                    .channel(channel)
                    .knob
                    .press
                    .release(now, self.config.double_press_window);

                self.dispatch_knob(channel, KnobEvent::Released);
                if is_double {
                    self.dispatch_knob(channel, KnobEvent::DoublePress);
                }
            }
            KnobIncrement { channel, magnitude } => {
                let rotation = self.rotate(channel, Increment, magnitude, now);
                self.dispatch_knob(channel, KnobEvent::Incremented(rotation));
            }
            KnobDecrement { channel, magnitude } => {
                let rotation = self.rotate(channel, Decrement, magnitude, now);
                self.dispatch_knob(channel, KnobEvent::Decremented(rotation));
            }
            ButtonPressed { channel, number } => {
                let held_tx = self.held_tx.clone();
                self.channel(channel).buttons[number as usize].press.press(
                    &self.timers,
                    self.config.hold_duration,
                    move || {
                        let _ = held_tx.send(Event::Button {
                            channel,
                            number,
                            event: ButtonEvent::PressAndHold,
                        });
                    },
                );

                self.dispatch_button(channel, number, ButtonEvent::Pressed);
            }
            ButtonReleased { channel, number } => {
                let is_double = self.channel(channel).buttons[number as usize]
                    .press
                    .release(now, self.config.double_press_window);

                self.dispatch_button(channel, number, ButtonEvent::Released);
                if is_double {
                    self.dispatch_button(channel, number, ButtonEvent::DoublePress);
                }
            }
            FaderTouched { fader } => {
                self.channel(fader).fader.is_touched = true;
                self.dispatch_fader(fader, FaderEvent::Touched);
            }
            FaderReleased { fader } => {
                self.channel(fader).fader.is_touched = false;
                self.dispatch_fader(fader, FaderEvent::Released);
            }
            FaderLevel { fader, level } => {
                self.channel(fader).fader.level = level;
                self.dispatch_fader(fader, FaderEvent::Level(level));
            }
        }
    }

    fn rotate(
        &self,
        channel: u8,
        direction: timing::Direction,
        magnitude: u8,
        now: Instant,
    ) -> Rotation {
        let mut chan = self.channel(channel);
        // A rotating knob is not being held.
        chan.knob.press.cancel_hold();
        chan.knob.rotary.rotate(direction, magnitude, now)
    }

    fn dispatch_knob(&self, channel: u8, event: KnobEvent) {
        self.bindings.dispatch(Event::Knob { channel, event });
    }

    fn dispatch_button(&self, channel: u8, number: u8, event: ButtonEvent) {
        self.bindings.dispatch(Event::Button {
            channel,
            number,
            event,
        });
    }

    fn dispatch_fader(&self, fader: u8, event: FaderEvent) {
        self.bindings.dispatch(Event::Fader { fader, event });
    }

    /// Advances the blink step and renders every blinking control.
    fn tick_blink(&self) {
        let mut blink = self.blink.lock().unwrap();

        for (target, visible) in blink.advance() {
            let chan = self.channel(target.channel());
            let msg = match target {
                BlinkTarget::ButtonLed { number, .. } => {
                    chan.buttons[number as usize].led.render(visible)
                }
                BlinkTarget::StripLine { line, .. } => chan.strip[line as usize].render(visible),
            };

            self.output.send(&msg);
        }
    }
}

fn check_channel(channel: u8) -> Result<u8, Error> {
    if (channel as usize) < CHANNELS {
        Ok(channel)
    } else {
        Err(Error::InvalidChannel(channel))
    }
}

fn check_button(channel: u8, number: u8) -> Result<(u8, u8), Error> {
    let channel = check_channel(channel)?;
    if (number as usize) < BUTTONS {
        Ok((channel, number))
    } else {
        Err(Error::InvalidButton(number))
    }
}

fn check_line(channel: u8, line: u8) -> Result<(u8, u8), Error> {
    let channel = check_channel(channel)?;
    if (line as usize) < STRIP_LINES {
        Ok((channel, line))
    } else {
        Err(Error::InvalidLine(line))
    }
}

fn check_fader(fader: u8) -> Result<u8, Error> {
    if (fader as usize) < CHANNELS {
        Ok(fader)
    } else {
        Err(Error::InvalidFader(fader))
    }
}

fn check_target(target: BlinkTarget) -> Result<BlinkTarget, Error> {
    match target {
        BlinkTarget::ButtonLed { channel, number } => check_button(channel, number)?,
        BlinkTarget::StripLine { channel, line } => check_line(channel, line)?,
    };

    Ok(target)
}

/// The X-Touch Extender driver.
///
/// Decodes the device input on a fast cycle, dispatches semantic events
/// to the bound callbacks and advances the blink patterns on a slow cycle.
/// Both cycles run until the `ControlSurface` is dropped.
pub struct ControlSurface {
    // Cycles must stop before the rest is released.
    cycles: Vec<driver::Cycle>,
    shared: Arc<Shared>,
    // Held so the input stays connected, never accessed.
    _input_conn: Option<Mutex<midi::InputConnection>>,
}

impl ControlSurface {
    /// Builds the driver on already opened device handles.
    pub fn new(
        config: Config,
        input_rx: channel::Receiver<midi::Msg>,
        output: impl DeviceOut,
    ) -> Result<Self, Error> {
        Self::start(config, input_rx, Output::new(output), None)
    }

    /// Looks up the device ports by name and connects to them.
    pub fn connect(config: Config) -> Result<Self, Error> {
        use midi::Direction;

        let client_name: Arc<str> = config.client_name.as_str().into();
        let device: Arc<str> = config.device_name.as_str().into();

        let ports_in = midi::PortsIn::try_new(Arc::clone(&client_name))?;
        let in_port = ports_in
            .find(&device)
            .ok_or_else(|| Error::DeviceNotFound {
                direction: Direction::In,
                device: Arc::clone(&device),
            })?;

        let ports_out = midi::PortsOut::try_new(client_name)?;
        let out_port = ports_out
            .find(&device)
            .ok_or_else(|| Error::DeviceNotFound {
                direction: Direction::Out,
                device: Arc::clone(&device),
            })?;

        let (msg_tx, msg_rx) = channel::unbounded();
        let input_conn = ports_in
            .connect(Arc::clone(&in_port), msg_tx)
            .map_err(|_| Error::DeviceBusy {
                direction: Direction::In,
                port: in_port,
            })?;
        let output_conn = ports_out
            .connect(Arc::clone(&out_port))
            .map_err(|_| Error::DeviceBusy {
                direction: Direction::Out,
                port: out_port,
            })?;

        Self::start(config, msg_rx, Output::new(output_conn), Some(input_conn))
    }

    fn start(
        config: Config,
        input_rx: channel::Receiver<midi::Msg>,
        output: Output,
        input_conn: Option<midi::InputConnection>,
    ) -> Result<Self, Error> {
        config.validate()?;

        let fast_period = config.fast_period;
        let slow_period = config.slow_period;
        let shared = Arc::new(Shared::new(config, output));

        let fast = {
            let shared = Arc::clone(&shared);
            let mut is_connected = true;
            driver::Cycle::spawn("input", fast_period, move || {
                let was_connected = std::mem::replace(&mut is_connected, shared.drain(&input_rx));
                if was_connected && !is_connected {
                    log::warn!("Device input disconnected");
                }
            })?
        };

        let slow = {
            let shared = Arc::clone(&shared);
            driver::Cycle::spawn("blink", slow_period, move || shared.tick_blink())?
        };

        Ok(Self {
            cycles: vec![fast, slow],
            shared,
            _input_conn: input_conn.map(Mutex::new),
        })
    }
}

/// Bindings.
impl ControlSurface {
    pub fn bind_knob<F>(&self, channel: u8, kind: KnobEventKind, cb: F) -> Result<(), Error>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let channel = check_channel(channel)?;
        log::debug!("Binding knob {channel} {kind:?}");
        self.shared
            .bindings
            .set_knob(channel, kind, Some(Arc::new(cb)));

        Ok(())
    }

    pub fn unbind_knob(&self, channel: u8, kind: KnobEventKind) -> Result<(), Error> {
        let channel = check_channel(channel)?;
        self.shared.bindings.set_knob(channel, kind, None);

        Ok(())
    }

    pub fn bind_button<F>(
        &self,
        channel: u8,
        number: u8,
        kind: ButtonEventKind,
        cb: F,
    ) -> Result<(), Error>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let (channel, number) = check_button(channel, number)?;
        log::debug!("Binding button {channel}/{number} {kind:?}");
        self.shared
            .bindings
            .set_button(channel, number, kind, Some(Arc::new(cb)));

        Ok(())
    }

    pub fn unbind_button(&self, channel: u8, number: u8, kind: ButtonEventKind) -> Result<(), Error> {
        let (channel, number) = check_button(channel, number)?;
        self.shared.bindings.set_button(channel, number, kind, None);

        Ok(())
    }

    pub fn bind_fader<F>(&self, fader: u8, kind: FaderEventKind, cb: F) -> Result<(), Error>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let fader = check_fader(fader)?;
        log::debug!("Binding fader {fader} {kind:?}");
        self.shared
            .bindings
            .set_fader(fader, kind, Some(Arc::new(cb)));

        Ok(())
    }

    pub fn unbind_fader(&self, fader: u8, kind: FaderEventKind) -> Result<(), Error> {
        let fader = check_fader(fader)?;
        self.shared.bindings.set_fader(fader, kind, None);

        Ok(())
    }
}

/// Device output.
impl ControlSurface {
    /// Moves the fader motor, `level` is clamped to `[0, 16256]`.
    pub fn set_fader(&self, fader: u8, level: i32) -> Result<(), Error> {
        let fader = check_fader(fader)?;

        let mut chan = self.shared.channel(fader);
        chan.fader.level = level.clamp(0, protocol::fader::MAX_LEVEL as i32) as u16;
        self.shared
            .output
            .send(&protocol::fader_level_msg(fader, level));

        Ok(())
    }

    pub fn set_knob_ring(&self, channel: u8, position: u8) -> Result<(), Error> {
        let channel = check_channel(channel)?;

        let mut chan = self.shared.channel(channel);
        let msg = chan.knob_ring.set(channel, position);
        self.shared.output.send(&msg);

        Ok(())
    }

    /// Stores and renders `text`: padded with spaces, truncated to 7 characters.
    pub fn set_text(&self, channel: u8, line: u8, text: &str) -> Result<(), Error> {
        let (channel, line) = check_line(channel, line)?;

        let mut chan = self.shared.channel(channel);
        let msg = chan.strip[line as usize].set_text(text);
        self.shared.output.send(&msg);

        Ok(())
    }

    pub fn set_led(&self, channel: u8, number: u8, is_on: bool) -> Result<(), Error> {
        let (channel, number) = check_button(channel, number)?;

        let mut chan = self.shared.channel(channel);
        let msg = chan.buttons[number as usize].led.set(is_on);
        self.shared.output.send(&msg);

        Ok(())
    }

    /// Sets the VU bar level, clamped to `[0, 11]`.
    ///
    /// A non zero level is sent again periodically until the level is set to 0.
    pub fn set_vu(&self, channel: u8, level: u8) -> Result<(), Error> {
        let channel = check_channel(channel)?;

        let mut chan = self.shared.channel(channel);
        let msg = chan.vu_bar.set_level(channel, level);
        self.shared.output.send(&msg);

        if chan.vu_bar.level() > 0 {
            let output = self.shared.output.clone();
            let guard = self
                .shared
                .timers
                .repeating(self.shared.config.vu_refresh_period, move || {
                    output.send(&msg)
                });
            chan.vu_bar.refresh.replace(guard);
        } else {
            chan.vu_bar.refresh.cancel();
        }

        Ok(())
    }

    /// Blinks `target` with `pattern`, replacing any previous pattern.
    pub fn set_blink(&self, target: BlinkTarget, pattern: u16) -> Result<(), Error> {
        let target = check_target(target)?;
        log::debug!("Blinking {target:?} with {pattern:#018b}");
        self.shared.blink.lock().unwrap().set(target, pattern);

        Ok(())
    }

    /// Stops blinking `target` and restores its steady state.
    pub fn clear_blink(&self, target: BlinkTarget) -> Result<(), Error> {
        let target = check_target(target)?;
        let mut blink = self.shared.blink.lock().unwrap();
        if blink.remove(&target).is_none() {
            return Ok(());
        }

        let chan = self.shared.channel(target.channel());
        let msg = match target {
            BlinkTarget::ButtonLed { number, .. } => {
                let led = &chan.buttons[number as usize].led;
                led.render(led.is_on())
            }
            BlinkTarget::StripLine { line, .. } => chan.strip[line as usize].render(true),
        };
        self.shared.output.send(&msg);

        Ok(())
    }
}

/// Control state.
impl ControlSurface {
    pub fn knob_value(&self, channel: u8) -> Result<i64, Error> {
        let channel = check_channel(channel)?;
        Ok(self.shared.channel(channel).knob.rotary.value())
    }

    pub fn knob_ring(&self, channel: u8) -> Result<u8, Error> {
        let channel = check_channel(channel)?;
        Ok(self.shared.channel(channel).knob_ring.position())
    }

    pub fn fader_level(&self, fader: u8) -> Result<u16, Error> {
        let fader = check_fader(fader)?;
        Ok(self.shared.channel(fader).fader.level)
    }

    pub fn is_fader_touched(&self, fader: u8) -> Result<bool, Error> {
        let fader = check_fader(fader)?;
        Ok(self.shared.channel(fader).fader.is_touched)
    }

    pub fn text(&self, channel: u8, line: u8) -> Result<String, Error> {
        let (channel, line) = check_line(channel, line)?;
        Ok(self.shared.channel(channel).strip[line as usize]
            .text()
            .to_string())
    }

    pub fn vu_level(&self, channel: u8) -> Result<u8, Error> {
        let channel = check_channel(channel)?;
        Ok(self.shared.channel(channel).vu_bar.level())
    }

    pub fn is_blinking(&self, target: BlinkTarget) -> bool {
        self.shared.blink.lock().unwrap().contains(&target)
    }
}

impl Drop for ControlSurface {
    fn drop(&mut self) {
        self.cycles.clear();

        // Cancel pending timers.
        for chan in self.shared.channels.iter() {
            let mut chan = chan.lock().unwrap();
            chan.vu_bar.refresh.cancel();
            chan.knob.press.cancel_hold();
            for button in chan.buttons.iter_mut() {
                button.press.cancel_hold();
            }
        }
    }
}

#[cfg(test)]
mod tests;
