use crossbeam_channel as channel;
use std::{collections::BTreeMap, fmt, sync::Arc};

pub use super::io::{InputConnection, OutputConnection};
use super::{Error, Msg};

pub type PortsIn = DirectionalPorts<midir::MidiInput>;
pub type PortsOut = DirectionalPorts<midir::MidiOutput>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Direction::In => "In Port",
            Direction::Out => "Out Port",
        }
    }
}

/// The ports available for one direction at the time of the scan.
pub struct DirectionalPorts<IO: midir::MidiIO> {
    map: BTreeMap<Arc<str>, IO::Port>,
    io: IO,
    client_name: Arc<str>,
}

impl<IO: midir::MidiIO> DirectionalPorts<IO> {
    /// Returns the first port whose name contains `device_name`.
    pub fn find(&self, device_name: &str) -> Option<Arc<str>> {
        self.map
            .keys()
            .find(|name| name.contains(device_name))
            .cloned()
    }

    fn scan(io: IO, client_name: Arc<str>) -> Result<Self, Error> {
        let mut map = BTreeMap::new();

        for port in io.ports().iter() {
            let name = io.port_name(port)?;
            // Skip our own ports.
            if !name.starts_with(client_name.as_ref()) {
                map.insert(name.into(), port.clone());
            }
        }

        Ok(Self {
            map,
            io,
            client_name,
        })
    }

    fn take_port(&mut self, port_name: &Arc<str>) -> Result<IO::Port, Error> {
        self.map
            .remove(port_name)
            .ok_or_else(|| Error::PortNotFound(port_name.clone()))
    }
}

impl PortsIn {
    pub fn try_new(client_name: Arc<str>) -> Result<Self, Error> {
        let io = midir::MidiInput::new(&client_name)?;
        Self::scan(io, client_name)
    }

    /// Connects to `port_name`, consuming the scan.
    ///
    /// Incoming messages are sent to `msg_tx` from the MIDI backend thread.
    pub fn connect(
        mut self,
        port_name: Arc<str>,
        msg_tx: channel::Sender<Msg>,
    ) -> Result<InputConnection, Error> {
        let port = self.take_port(&port_name)?;
        InputConnection::try_new(self.io, port_name, &port, &self.client_name, msg_tx)
    }
}

impl PortsOut {
    pub fn try_new(client_name: Arc<str>) -> Result<Self, Error> {
        let io = midir::MidiOutput::new(&client_name)?;
        Self::scan(io, client_name)
    }

    /// Connects to `port_name`, consuming the scan.
    pub fn connect(mut self, port_name: Arc<str>) -> Result<OutputConnection, Error> {
        let port = self.take_port(&port_name)?;
        OutputConnection::try_new(self.io, port_name, &port, &self.client_name)
    }
}
