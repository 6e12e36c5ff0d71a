use std::sync::{Arc, RwLock};

use super::{
    event::{ButtonEventKind, Event, FaderEventKind, KnobEventKind},
    protocol::{BUTTONS, CHANNELS},
};

pub type Callback = Arc<dyn Fn(&Event) + Send + Sync + 'static>;

struct Slots<const N: usize>([Option<Callback>; N]);

impl<const N: usize> Default for Slots<N> {
    fn default() -> Self {
        Self(std::array::from_fn(|_| None))
    }
}

#[derive(Default)]
struct ChannelBindings {
    knob: Slots<{ KnobEventKind::COUNT }>,
    buttons: [Slots<{ ButtonEventKind::COUNT }>; BUTTONS],
}

#[derive(Default)]
struct Bindings {
    channels: [ChannelBindings; CHANNELS],
    faders: [Slots<{ FaderEventKind::COUNT }>; CHANNELS],
}

impl Bindings {
    fn slot(&self, event: &Event) -> &Option<Callback> {
        match *event {
            Event::Knob { channel, event } => {
                &self.channels[channel as usize].knob.0[event.kind().idx()]
            }
            Event::Button {
                channel,
                number,
                event,
            } => &self.channels[channel as usize].buttons[number as usize].0[event.kind().idx()],
            Event::Fader { fader, event } => &self.faders[fader as usize].0[event.kind().idx()],
        }
    }
}

/// Application callbacks, one optional slot per control and event kind.
///
/// Indices are checked by the caller.
#[derive(Clone, Default)]
pub struct BindingTable(Arc<RwLock<Bindings>>);

impl BindingTable {
    pub fn set_knob(&self, channel: u8, kind: KnobEventKind, cb: Option<Callback>) {
        self.0.write().unwrap().channels[channel as usize].knob.0[kind.idx()] = cb;
    }

    pub fn set_button(&self, channel: u8, number: u8, kind: ButtonEventKind, cb: Option<Callback>) {
        self.0.write().unwrap().channels[channel as usize].buttons[number as usize].0[kind.idx()] =
            cb;
    }

    pub fn set_fader(&self, fader: u8, kind: FaderEventKind, cb: Option<Callback>) {
        self.0.write().unwrap().faders[fader as usize].0[kind.idx()] = cb;
    }

    /// Calls the callback bound to `event`, if any.
    ///
    /// The table is not locked while the callback runs so callbacks
    /// are free to rebind or to drive the device.
    pub fn dispatch(&self, event: Event) {
        let cb = self.0.read().unwrap().slot(&event).clone();

        match cb {
            Some(cb) => {
                log::trace!("Dispatching {event:?}");
                cb(&event);
            }
            None => log::trace!("Unbound {event:?}"),
        }
    }
}
