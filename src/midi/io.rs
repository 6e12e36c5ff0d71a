use crossbeam_channel as channel;
use std::sync::Arc;

use super::{Error, Msg};

/// An open MIDI input.
///
/// Every incoming message is pushed to the channel handed over
/// at connection time. The connection is closed on drop.
pub struct InputConnection {
    port_name: Arc<str>,
    conn: Option<midir::MidiInputConnection<channel::Sender<Msg>>>,
}

impl InputConnection {
    pub(super) fn try_new(
        midi_input: midir::MidiInput,
        port_name: Arc<str>,
        port: &midir::MidiInputPort,
        client_port_name: &str,
        msg_tx: channel::Sender<Msg>,
    ) -> Result<Self, Error> {
        let conn = midi_input
            .connect(
                port,
                client_port_name,
                |_ts, msg, msg_tx| {
                    let _ = msg_tx.send(msg.into());
                },
                msg_tx,
            )
            .map_err(|err| {
                log::error!("Failed to connect Input to {port_name}: {err}");
                Error::Connection(port_name.clone())
            })?;

        log::info!("Connected for Input to {}", port_name);

        Ok(Self {
            port_name,
            conn: Some(conn),
        })
    }

}

impl Drop for InputConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = conn.close();
            log::debug!("Disconnected Input from {}", self.port_name);
        }
    }
}

/// An open MIDI output.
pub struct OutputConnection {
    port_name: Arc<str>,
    conn: Option<midir::MidiOutputConnection>,
}

impl OutputConnection {
    pub(super) fn try_new(
        midi_output: midir::MidiOutput,
        port_name: Arc<str>,
        port: &midir::MidiOutputPort,
        client_port_name: &str,
    ) -> Result<Self, Error> {
        let conn = midi_output
            .connect(port, client_port_name)
            .map_err(|err| {
                log::error!("Failed to connect Output to {port_name}: {err}");
                Error::Connection(port_name.clone())
            })?;

        log::info!("Connected for Output to {}", port_name);

        Ok(Self {
            port_name,
            conn: Some(conn),
        })
    }

    pub fn send(&mut self, msg: &[u8]) -> Result<(), Error> {
        match self.conn {
            Some(ref mut conn) => {
                conn.send(msg).map_err(|err| {
                    log::error!(
                        "Failed to send MIDI msg {}: {err}",
                        crate::bytes::Displayable::from(msg)
                    );
                    err
                })?;
            }
            None => {
                log::warn!("Attempt to send a msg, but MIDI Out is not connected");
                return Err(Error::NotConnected);
            }
        }

        Ok(())
    }
}

impl Drop for OutputConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = conn.close();
            log::debug!("Disconnected Output from {}", self.port_name);
        }
    }
}
