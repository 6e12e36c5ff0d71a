use super::{
    protocol::{self, cc, fader, note},
    Error,
};
use crate::midi;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Input {
    KnobPressed { channel: u8 },
    KnobReleased { channel: u8 },
    KnobIncrement { channel: u8, magnitude: u8 },
    KnobDecrement { channel: u8, magnitude: u8 },
    ButtonPressed { channel: u8, number: u8 },
    ButtonReleased { channel: u8, number: u8 },
    FaderTouched { fader: u8 },
    FaderReleased { fader: u8 },
    FaderLevel { fader: u8, level: u16 },
}

/// Classifies one raw frame from the device.
///
/// Frames which don't match a known control are `Error::UnhandledEvent`.
pub fn decode(frame: &[u8]) -> Result<Input, Error> {
    use Input::*;

    let (status, data1, data2) = match *frame {
        [status, data1, data2] => (status, data1, data2),
        _ => return Err(Error::unhandled("MIDI", frame)),
    };

    match status {
        note::STATUS => {
            let pressed = match data2 {
                note::PRESSED => Some(true),
                note::RELEASED => Some(false),
                _ => None,
            };

            match data1 {
                note::KNOB_PRESS_FIRST..=note::KNOB_PRESS_LAST => {
                    let channel = data1 - note::KNOB_PRESS_FIRST;
                    match pressed {
                        Some(true) => Ok(KnobPressed { channel }),
                        Some(false) => Ok(KnobReleased { channel }),
                        None => Err(Error::unhandled("knob press", frame)),
                    }
                }
                note::BUTTON_FIRST..=note::BUTTON_LAST => {
                    let number = data1 / 8;
                    let channel = data1 % 8;
                    match pressed {
                        Some(true) => Ok(ButtonPressed { channel, number }),
                        Some(false) => Ok(ButtonReleased { channel, number }),
                        None => Err(Error::unhandled("button", frame)),
                    }
                }
                note::FADER_TOUCH_FIRST..=note::FADER_TOUCH_LAST => {
                    let fader = data1 - note::FADER_TOUCH_FIRST;
                    match pressed {
                        Some(true) => Ok(FaderTouched { fader }),
                        Some(false) => Ok(FaderReleased { fader }),
                        None => Err(Error::unhandled("fader touch", frame)),
                    }
                }
                _ => Err(Error::unhandled("note", frame)),
            }
        }
        cc::STATUS => match data1 {
            cc::KNOB_ROTATION_FIRST..=cc::KNOB_ROTATION_LAST => {
                let channel = data1 - cc::KNOB_ROTATION_FIRST;
                if data2 < cc::INCREMENT_LIMIT {
                    Ok(KnobIncrement {
                        channel,
                        magnitude: data2,
                    })
                } else if data2 >= cc::DECREMENT_FIRST {
                    Ok(KnobDecrement {
                        channel,
                        magnitude: data2 - cc::DECREMENT_OFFSET,
                    })
                } else {
                    Err(Error::unhandled("knob rotation", frame))
                }
            }
            _ => Err(Error::unhandled("control change", frame)),
        },
        _ if midi::Tag::from(status) == fader::TAG => {
            let fader = u8::from(midi::Channel::from(status));
            if fader as usize >= protocol::CHANNELS {
                return Err(Error::unhandled("fader level", frame));
            }

            Ok(FaderLevel {
                fader,
                level: protocol::fader_level_from_device(data1, data2),
            })
        }
        _ => Err(Error::unhandled("MIDI", frame)),
    }
}
