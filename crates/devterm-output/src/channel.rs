use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::{LogLevel, OutputMessage, OutputSink, DEFAULT_POLL_INTERVAL_MS};

/// FIFO bridge between the asynchronous process reader threads and the
/// blocking completion monitor.
///
/// `write` never blocks and is safe from any thread. `wait_and_read`
/// polls the queue at a fixed interval until a message shows up, which
/// bounds worst-case detection latency to roughly one interval; tests
/// tighten it through `set_poll_interval`.
pub struct ChannelOutput {
    queue: Mutex<VecDeque<OutputMessage>>,
    poll_interval_ms: AtomicU64,
}

impl ChannelOutput {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            poll_interval_ms: AtomicU64::new(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Interval at which `wait_and_read` re-checks an empty queue.
    pub fn set_poll_interval(&self, interval: Duration) {
        self.poll_interval_ms
            .store(interval.as_millis() as u64, Ordering::Relaxed);
    }

    /// Block the calling thread until at least one message is queued,
    /// then pop the oldest. Strict FIFO: no reordering, loss or
    /// duplication.
    pub fn wait_and_read(&self) -> OutputMessage {
        loop {
            if let Some(message) = self.queue.lock().unwrap().pop_front() {
                return message;
            }
            let interval = self.poll_interval_ms.load(Ordering::Relaxed);
            thread::sleep(Duration::from_millis(interval.max(1)));
        }
    }

    /// Number of messages currently queued.
    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard all queued state. Only valid while no reader is blocked
    /// inside `wait_and_read`.
    pub fn reset(&self) {
        self.queue.lock().unwrap().clear();
    }
}

impl Default for ChannelOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for ChannelOutput {
    fn write(&self, message: &str, level: LogLevel) {
        self.queue
            .lock()
            .unwrap()
            .push_back(OutputMessage::new(message, level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_channel_is_fifo() {
        let channel = ChannelOutput::new();

        channel.write("Test Write", LogLevel::Info);
        channel.write_line("Test WriteLine", LogLevel::Info);

        assert_eq!(channel.wait_and_read().message, "Test Write");
        assert_eq!(channel.wait_and_read().message, "Test WriteLine\n");
    }

    #[test]
    fn test_channel_preserves_order_without_loss() {
        let channel = ChannelOutput::new();
        for i in 0..100 {
            channel.write_line(&format!("line {i}"), LogLevel::Message);
        }
        for i in 0..100 {
            assert_eq!(channel.wait_and_read().message, format!("line {i}\n"));
        }
        assert!(channel.is_empty());
    }

    #[test]
    fn test_wait_and_read_blocks_until_write() {
        let channel = Arc::new(ChannelOutput::new());
        channel.set_poll_interval(Duration::from_millis(1));

        let writer = Arc::clone(&channel);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.write("delayed", LogLevel::Info);
        });

        let message = channel.wait_and_read();
        assert_eq!(message.message, "delayed");
        handle.join().unwrap();
    }

    #[test]
    fn test_reset_discards_queue() {
        let channel = ChannelOutput::new();
        channel.write("stale", LogLevel::Info);
        channel.reset();
        assert!(channel.is_empty());
    }
}
