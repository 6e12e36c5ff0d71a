use std::sync::Arc;

use crate::{bytes, config, midi};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Couldn't find {direction} for device {device}")]
    DeviceNotFound {
        direction: midi::Direction,
        device: Arc<str>,
    },

    #[error("{direction} {port} busy")]
    DeviceBusy {
        direction: midi::Direction,
        port: Arc<str>,
    },

    #[error("MIDI error")]
    Midi(#[from] midi::Error),

    #[error("Configuration error")]
    Config(#[from] config::Error),

    #[error("Unhandled {kind} event {frame}")]
    UnhandledEvent {
        kind: &'static str,
        frame: bytes::Displayable<'static>,
    },

    #[error("Invalid channel {}", .0)]
    InvalidChannel(u8),

    #[error("Invalid button number {}", .0)]
    InvalidButton(u8),

    #[error("Invalid scribble strip line {}", .0)]
    InvalidLine(u8),

    #[error("Invalid fader {}", .0)]
    InvalidFader(u8),

    #[error("Couldn't spawn {} cycle", .0)]
    Spawn(&'static str, #[source] std::io::Error),
}

impl Error {
    pub(crate) fn unhandled(kind: &'static str, frame: &[u8]) -> Self {
        Error::UnhandledEvent {
            kind,
            frame: bytes::Displayable::owned(frame),
        }
    }
}
