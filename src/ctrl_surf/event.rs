pub use super::timing::Rotation;

/// A semantic event as delivered to bound callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    Knob { channel: u8, event: KnobEvent },
    Button { channel: u8, number: u8, event: ButtonEvent },
    Fader { fader: u8, event: FaderEvent },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KnobEvent {
    Pressed,
    Released,
    PressAndHold,
    DoublePress,
    Incremented(Rotation),
    Decremented(Rotation),
}

impl KnobEvent {
    pub fn kind(&self) -> KnobEventKind {
        use KnobEvent::*;
        match self {
            Pressed => KnobEventKind::Pressed,
            Released => KnobEventKind::Released,
            PressAndHold => KnobEventKind::PressAndHold,
            DoublePress => KnobEventKind::DoublePress,
            Incremented(_) => KnobEventKind::Incremented,
            Decremented(_) => KnobEventKind::Decremented,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KnobEventKind {
    Pressed,
    Released,
    PressAndHold,
    DoublePress,
    Incremented,
    Decremented,
}

impl KnobEventKind {
    pub const COUNT: usize = 6;

    pub fn idx(self) -> usize {
        self as usize
    }
}

/// Button events carry no payload, so they also serve as binding tags.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ButtonEvent {
    Pressed,
    Released,
    PressAndHold,
    DoublePress,
}

pub type ButtonEventKind = ButtonEvent;

impl ButtonEvent {
    pub const COUNT: usize = 4;

    pub fn kind(&self) -> ButtonEventKind {
        *self
    }

    pub fn idx(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FaderEvent {
    Touched,
    Released,
    Level(u16),
}

impl FaderEvent {
    pub fn kind(&self) -> FaderEventKind {
        use FaderEvent::*;
        match self {
            Touched => FaderEventKind::Touched,
            Released => FaderEventKind::Released,
            Level(_) => FaderEventKind::Level,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FaderEventKind {
    Touched,
    Released,
    Level,
}

impl FaderEventKind {
    pub const COUNT: usize = 3;

    pub fn idx(self) -> usize {
        self as usize
    }
}
