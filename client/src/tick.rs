//! Drives the animation clock from a background thread.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::map_updater::MapUpdater;

/// Handle for the tick thread. Ticks are numbered from 1 and delivered every
/// `interval` until [`TickScheduler::stop`] is called or the handle dropped.
pub struct TickScheduler {
    stop_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<u32>>,
}

impl TickScheduler {
    pub fn spawn(updater: Arc<MapUpdater>, interval: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("map-ticks".to_string())
            .spawn(move || {
                let mut tick_no = 0u32;
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            tick_no = tick_no.wrapping_add(1);
                            updater.tick(tick_no);
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::debug!("tick thread stopping after {tick_no} ticks");
                tick_no
            })?;

        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Stops the thread and returns the number of ticks delivered. Later
    /// calls return 0.
    pub fn stop(&mut self) -> u32 {
        let _ = self.stop_tx.send(());
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(ticks)) => ticks,
            Some(Err(e)) => {
                log::error!("tick thread panicked: {e:?}");
                0
            }
            None => 0,
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
