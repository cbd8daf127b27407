//! Delivery of completion callbacks.
//!
//! A finished run hands its callback to a [`CompletionDispatcher`]. Hosts
//! with a main-thread scheduler implement the trait on top of it; others
//! use [`InlineDispatcher`] (callback runs on the worker) or
//! [`QueueDispatcher`] (callback runs wherever the host drains the
//! [`CallbackQueue`]).

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::warn;

/// A unit of work scheduled by a finished run.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Schedules completion callbacks onto the host's preferred thread.
pub trait CompletionDispatcher: Send + Sync {
    /// Schedule `job`. Implementations must run it at most once.
    fn dispatch(&self, job: Job);
}

/// Runs callbacks immediately on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl CompletionDispatcher for InlineDispatcher {
    fn dispatch(&self, job: Job) {
        job();
    }
}

/// Sends callbacks to a [`CallbackQueue`].
#[derive(Debug, Clone)]
pub struct QueueDispatcher {
    sender: Sender<Job>,
}

/// Receiving end of a [`QueueDispatcher`], drained by the host thread.
pub struct CallbackQueue {
    receiver: Receiver<Job>,
}

/// Create a connected dispatcher and queue.
pub fn queue() -> (QueueDispatcher, CallbackQueue) {
    let (sender, receiver) = mpsc::channel();
    (QueueDispatcher { sender }, CallbackQueue { receiver })
}

impl CompletionDispatcher for QueueDispatcher {
    fn dispatch(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!("Callback queue is closed; dropping completion callback");
        }
    }
}

impl CallbackQueue {
    /// Run every callback queued so far. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one callback and run it.
    ///
    /// Returns `false` on timeout or when every dispatcher is gone.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(job) => {
                job();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}
