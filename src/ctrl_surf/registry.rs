use std::{sync::Arc, time::Instant};

use super::{
    protocol::{self, BUTTONS, STRIP_LINES},
    timing::{PressTracker, Rotary, TimerSlot},
};
use crate::midi::Msg;

#[derive(Debug)]
pub struct Knob {
    pub rotary: Rotary,
    pub press: PressTracker,
}

#[derive(Debug, Default)]
pub struct KnobRing {
    position: u8,
}

impl KnobRing {
    pub fn position(&self) -> u8 {
        self.position
    }

    pub fn set(&mut self, channel: u8, position: u8) -> Msg {
        self.position = position.min(protocol::KNOB_RING_MAX);
        protocol::knob_ring_msg(channel, self.position)
    }
}

/// One line of a scribble strip.
///
/// Blanking doesn't discard the stored text.
#[derive(Debug)]
pub struct ScribbleStripLine {
    channel: u8,
    line: u8,
    text: String,
}

impl ScribbleStripLine {
    fn new(channel: u8, line: u8) -> Self {
        Self {
            channel,
            line,
            text: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) -> Msg {
        self.text = text.to_string();
        self.render(true)
    }

    pub fn render(&self, visible: bool) -> Msg {
        protocol::strip_msg(self.channel, self.line, &self.text, visible)
    }
}

#[derive(Debug)]
pub struct ButtonLed {
    channel: u8,
    number: u8,
    is_on: bool,
}

impl ButtonLed {
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn set(&mut self, is_on: bool) -> Msg {
        self.is_on = is_on;
        self.render(is_on)
    }

    pub fn render(&self, visible: bool) -> Msg {
        protocol::led_msg(self.channel, self.number, visible)
    }
}

#[derive(Debug)]
pub struct Button {
    pub press: PressTracker,
    pub led: ButtonLed,
}

#[derive(Debug, Default)]
pub struct VuBar {
    level: u8,
    pub refresh: TimerSlot,
}

impl VuBar {
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn set_level(&mut self, channel: u8, level: u8) -> Msg {
        self.level = level.min(protocol::vu::MAX_LEVEL);
        protocol::vu_msg(channel, self.level)
    }
}

#[derive(Debug, Default)]
pub struct Fader {
    pub level: u16,
    pub is_touched: bool,
}

/// All the controls sharing one strip index.
#[derive(Debug)]
pub struct Channel {
    pub knob: Knob,
    pub knob_ring: KnobRing,
    pub strip: [ScribbleStripLine; STRIP_LINES],
    pub buttons: [Button; BUTTONS],
    pub vu_bar: VuBar,
    pub fader: Fader,
}

impl Channel {
    pub fn new(idx: u8, speed_thresholds: Arc<[f64]>, now: Instant) -> Self {
        Self {
            knob: Knob {
                rotary: Rotary::new(speed_thresholds, now),
                press: PressTracker::default(),
            },
            knob_ring: KnobRing::default(),
            strip: std::array::from_fn(|line| ScribbleStripLine::new(idx, line as u8)),
            buttons: std::array::from_fn(|number| Button {
                press: PressTracker::default(),
                led: ButtonLed {
                    channel: idx,
                    number: number as u8,
                    is_on: false,
                },
            }),
            vu_bar: VuBar::default(),
            fader: Fader::default(),
        }
    }
}
