//! Background repaint ticker.
//!
//! The ticker thread does no drawing and never touches the model. It only
//! posts [`HostMessage::Repaint`] into the host's queue at a fixed interval;
//! the host drains that queue on its UI thread (see
//! [`crate::view::GraphView::pump`]).

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMessage {
    Repaint,
    /// The host is tearing the view down.
    Dispose,
}

#[derive(Debug)]
pub struct RenderLoop {
    disposed: Arc<AtomicBool>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RenderLoop {
    /// Start posting repaint requests every `interval`.
    ///
    /// With a bounded host queue, a tick that finds the queue full is
    /// dropped, so a slow UI thread sees one pending repaint rather than a
    /// backlog.
    pub fn spawn(interval: Duration, host: Sender<HostMessage>) -> std::io::Result<Self> {
        let interval = if interval.is_zero() {
            Duration::from_millis(crate::config::DEFAULT_FRAME_INTERVAL_MS)
        } else {
            interval
        };
        let disposed = Arc::new(AtomicBool::new(false));
        let (stop, stopped) = crossbeam_channel::bounded::<()>(0);
        let flag = disposed.clone();
        let handle = std::thread::Builder::new()
            .name("depan-render-loop".to_string())
            .spawn(move || tick(interval, host, stopped, flag))?;
        tracing::debug!(?interval, "Render loop started");
        Ok(Self {
            disposed,
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        !self.disposed.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the ticker and wait for its thread.
    pub fn dispose(&mut self) {
        self.disposed.store(true, Ordering::Release);
        // Dropping the sender wakes the ticker out of its wait.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Render loop thread panicked");
            }
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn tick(interval: Duration, host: Sender<HostMessage>, stopped: Receiver<()>, disposed: Arc<AtomicBool>) {
    loop {
        match stopped.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        if disposed.load(Ordering::Acquire) {
            break;
        }
        match host.try_send(HostMessage::Repaint) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("Host queue closed; render loop exiting");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_posts_repaints_until_disposed() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut ticker = RenderLoop::spawn(Duration::from_millis(2), tx).unwrap();
        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first, HostMessage::Repaint);
        assert!(ticker.is_running());

        ticker.dispose();
        assert!(!ticker.is_running());
        while rx.try_recv().is_ok() {}
        std::thread::sleep(Duration::from_millis(20));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_exits_when_host_queue_closes() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let ticker = RenderLoop::spawn(Duration::from_millis(1), tx).unwrap();
        drop(rx);
        let deadline = Instant::now() + Duration::from_secs(2);
        while ticker.is_running() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!ticker.is_running());
    }

    #[test]
    fn test_full_queue_coalesces() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let ticker = RenderLoop::spawn(Duration::from_millis(1), tx).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(rx.len(), 1);
        drop(ticker);
    }
}
