use crossbeam_channel as channel;
use std::{
    thread,
    time::{Duration, Instant},
};

use super::Error;

/// Fixed absolute cadence.
///
/// The next deadline is the previous deadline plus the period, so
/// the time spent in a tick doesn't accumulate as drift.
#[derive(Debug)]
pub struct Cadence {
    next: Instant,
    period: Duration,
}

impl Cadence {
    pub fn new(start: Instant, period: Duration) -> Self {
        Self {
            next: start,
            period,
        }
    }

    pub fn advance(&mut self) -> Instant {
        self.next += self.period;
        self.next
    }
}

/// A periodic cycle running on its own thread.
///
/// The cycle stops when its handle is dropped.
pub struct Cycle {
    name: &'static str,
    stop_tx: Option<channel::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Cycle {
    pub fn spawn<F>(name: &'static str, period: Duration, mut tick: F) -> Result<Self, Error>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut cadence = Cadence::new(Instant::now(), period);
                loop {
                    tick();

                    match stop_rx.recv_deadline(cadence.advance()) {
                        Err(channel::RecvTimeoutError::Timeout) => (),
                        Ok(()) | Err(channel::RecvTimeoutError::Disconnected) => break,
                    }
                }

                log::debug!("Shutting down {name} cycle");
            })
            .map_err(|err| Error::Spawn(name, err))?;

        Ok(Self {
            name,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

impl Drop for Cycle {
    fn drop(&mut self) {
        // Disconnecting the stop channel wakes up the cycle.
        self.stop_tx = None;

        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                // Dropped from within a tick: the loop ends on its own.
                return;
            }

            if handle.join().is_err() {
                log::error!("{} cycle panicked", self.name);
            }
        }
    }
}
