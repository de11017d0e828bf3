use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use crossbeam_channel::{bounded, select, tick, Sender};

/// runs a callback on a background thread every `interval` until stopped or dropped
#[derive(Debug)]
pub struct Ticker {
    running: Arc<AtomicBool>,
    stop: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(interval: Duration, mut on_tick: impl FnMut() + Send + 'static) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let ticks = tick(interval);
        let still_running = Arc::clone(&running);
        let handle = thread::spawn(move || loop {
            select! {
                recv(ticks) -> _ => {
                    // a stop that raced with this tick wins
                    if !still_running.load(Ordering::SeqCst) {
                        break;
                    }
                    on_tick();
                }
                recv(stop_rx) -> _ => break,
            }
        });
        Self {
            running,
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// waits for the thread, so no tick runs after this returns
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // dropping the sender disconnects the channel and wakes the thread
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
