//! X-Touch Extender addressing (Mackie Control mode).

use crate::midi::{self, Msg};

pub const CHANNELS: usize = 8;
pub const BUTTONS: usize = 4;
pub const STRIP_LINES: usize = 2;
pub const STRIP_WIDTH: usize = 7;

pub mod note {
    pub const STATUS: u8 = 0x90;

    pub const PRESSED: u8 = 127;
    pub const RELEASED: u8 = 0;
    pub const ON: u8 = 0x7f;
    pub const OFF: u8 = 0x00;

    /// Buttons use `channel + 8 * number` for `number` in `0..4`.
    pub const BUTTON_FIRST: u8 = 0;
    pub const BUTTON_LAST: u8 = 31;
    pub const KNOB_PRESS_FIRST: u8 = 32;
    pub const KNOB_PRESS_LAST: u8 = 39;
    pub const FADER_TOUCH_FIRST: u8 = 104;
    pub const FADER_TOUCH_LAST: u8 = 111;
}

pub mod cc {
    pub const STATUS: u8 = 0xb0;

    pub const KNOB_ROTATION_FIRST: u8 = 16;
    pub const KNOB_ROTATION_LAST: u8 = 23;
    pub const KNOB_RING: u8 = 0x30;

    /// Rotation values below this one are increments.
    pub const INCREMENT_LIMIT: u8 = 64;
    /// Rotation values from this one onwards are decrements by `value - 64`.
    pub const DECREMENT_FIRST: u8 = 65;
    pub const DECREMENT_OFFSET: u8 = 64;
}

pub mod fader {
    use crate::midi::Tag;
    pub const TAG: Tag = Tag::from(0xe0);

    pub const MAX_LEVEL: u16 = 16256;
}

pub mod strip {
    /// Vendor header following the sysex tag.
    pub const HEADER: [u8; 5] = [0x00, 0x00, 0x66, 0x15, 0x12];
    pub const LINE_OFFSET: u8 = 56;
    pub const BLANK: u8 = b' ';
    pub const UNPRINTABLE: u8 = b'?';
}

pub mod vu {
    pub const STATUS: u8 = 0xd0;
    pub const MAX_LEVEL: u8 = 11;
}

pub const KNOB_RING_MAX: u8 = 0x7f;

/// The classic 14 bits composition is not used by the device firmware.
pub fn fader_level_from_device(lsb: u8, msb: u8) -> u16 {
    msb as u16 * 127 + lsb as u16
}

pub fn fader_level_msg(fader: u8, level: i32) -> Msg {
    let level = level.clamp(0, fader::MAX_LEVEL as i32) as u16;

    [
        fader::TAG | midi::Channel::from(fader),
        (level % 128) as u8,
        (level / 128) as u8,
    ]
    .into()
}

pub fn button_address(channel: u8, number: u8) -> u8 {
    channel + 8 * number
}

pub fn led_msg(channel: u8, number: u8, on: bool) -> Msg {
    let velocity = if on { note::ON } else { note::OFF };
    [note::STATUS, button_address(channel, number), velocity].into()
}

pub fn knob_ring_msg(channel: u8, position: u8) -> Msg {
    [cc::STATUS, cc::KNOB_RING + channel, position.min(KNOB_RING_MAX)].into()
}

pub fn strip_offset(channel: u8, line: u8) -> u8 {
    channel * STRIP_WIDTH as u8 + line * strip::LINE_OFFSET
}

/// Renders `text` padded with spaces or truncated to the strip width.
///
/// A blank render keeps the addressing but writes spaces only.
pub fn strip_msg(channel: u8, line: u8, text: &str, visible: bool) -> Msg {
    let mut data = [strip::BLANK; strip::HEADER.len() + 1 + STRIP_WIDTH];
    data[..strip::HEADER.len()].copy_from_slice(&strip::HEADER);
    data[strip::HEADER.len()] = strip_offset(channel, line);

    if visible {
        let slots = &mut data[strip::HEADER.len() + 1..];
        for (slot, c) in slots.iter_mut().zip(text.chars()) {
            *slot = if c.is_ascii() && !c.is_ascii_control() {
                c as u8
            } else {
                strip::UNPRINTABLE
            };
        }
    }

    Msg::new_sysex(&data)
}

pub fn vu_msg(channel: u8, level: u8) -> Msg {
    [vu::STATUS, 16 * channel + level.min(vu::MAX_LEVEL), 0].into()
}
