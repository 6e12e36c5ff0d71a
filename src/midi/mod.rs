mod error;
pub use error::Error;

mod io;

pub mod msg;
pub use msg::Msg;

pub mod port;
pub use port::{Direction, DirectionalPorts, InputConnection, OutputConnection, PortsIn, PortsOut};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Tag(u8);

impl Tag {
    pub const fn from(byte: u8) -> Self {
        Self(byte & 0xf0)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Channel(u8);

impl Channel {
    pub const fn from(byte: u8) -> Self {
        Self(byte & 0x0f)
    }
}

impl From<Channel> for u8 {
    fn from(chan: Channel) -> u8 {
        chan.0
    }
}

impl std::ops::BitOr<Channel> for Tag {
    type Output = u8;

    fn bitor(self, chan: Channel) -> Self::Output {
        self.0 | chan.0
    }
}

pub mod sysex {
    pub const TAG: u8 = 0xf0;
    pub const END_TAG: u8 = 0xf7;
}
