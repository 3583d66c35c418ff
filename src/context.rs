//! The primary execution context: the one thread that owns cache mutation and runs callbacks.

use std::thread::ThreadId;

use tokio::sync::mpsc;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait ExecutionContext: Send + Sync {
    fn is_on_primary_context(&self) -> bool;

    /// Queues `task` to run on the primary context. Never runs it inline.
    fn run_on_primary_context(&self, task: Task);
}

/// Handle to a primary thread, usable from any thread.
#[derive(Debug, Clone)]
pub struct PrimaryThread {
    thread: ThreadId,
    sender: mpsc::UnboundedSender<Task>,
}

/// Tasks waiting for the primary thread. Only that thread should drain it.
#[derive(Debug)]
pub struct PrimaryQueue {
    receiver: mpsc::UnboundedReceiver<Task>,
}

impl PrimaryThread {
    /// Makes the calling thread the primary thread.
    pub fn for_current_thread() -> (Self, PrimaryQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let thread = Self {
            thread: std::thread::current().id(),
            sender,
        };
        (thread, PrimaryQueue { receiver })
    }
}

impl ExecutionContext for PrimaryThread {
    fn is_on_primary_context(&self) -> bool {
        std::thread::current().id() == self.thread
    }

    fn run_on_primary_context(&self, task: Task) {
        if self.sender.send(task).is_err() {
            tracing::warn!("Primary thread queue is gone, dropping task.");
        }
    }
}

impl PrimaryQueue {
    /// Runs every task queued so far, e.g. once per server tick. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!("Ran {} queued tasks.", ran);
        }
        ran
    }

    /// Waits for the next task and runs it. Returns `false` once every sender is gone.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }
}
