use std::sync::{Arc, Mutex};

use crate::midi::{self, Msg};

/// The device output channel.
pub trait DeviceOut: Send + 'static {
    fn send(&mut self, msg: &[u8]) -> Result<(), midi::Error>;
}

impl DeviceOut for midi::OutputConnection {
    fn send(&mut self, msg: &[u8]) -> Result<(), midi::Error> {
        midi::OutputConnection::send(self, msg)
    }
}

/// Single writer to the device.
///
/// Every producer goes through this handle, which holds the lock
/// for the duration of one message so messages never interleave.
#[derive(Clone)]
pub struct Output(Arc<Mutex<Box<dyn DeviceOut>>>);

impl Output {
    pub fn new(device_out: impl DeviceOut) -> Self {
        Self(Arc::new(Mutex::new(Box::new(device_out))))
    }

    /// Writes `msg` to the device.
    ///
    /// Failures are logged, a lost frame is not fatal to the driver.
    pub fn send(&self, msg: &Msg) {
        if let Err(err) = self.0.lock().unwrap().send(msg) {
            log::error!("Couldn't send {} to device: {err}", msg.display());
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    /// Records every message sent to the device.
    #[derive(Clone, Default)]
    pub struct Recorder(pub Arc<Mutex<Vec<Vec<u8>>>>);

    impl Recorder {
        pub fn take(&self) -> Vec<Vec<u8>> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl DeviceOut for Recorder {
        fn send(&mut self, msg: &[u8]) -> Result<(), midi::Error> {
            self.0.lock().unwrap().push(msg.to_vec());
            Ok(())
        }
    }
}
