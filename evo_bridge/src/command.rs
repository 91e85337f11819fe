//! Command channel to the control process.
//!
//! Observers submit commands from async tasks while the control process
//! reads them from a blocking pipe. The two sides are decoupled by an
//! unbounded queue: [`CommandChannel`] is the sending half held by the
//! bridge, [`CommandQueue`] the receiving half drained by a
//! [`CommandPump`] on a blocking thread.
//!
//! Each queued entry is one complete line, newline included, and is
//! written with a single `write_all` so that lines from concurrent
//! observers never interleave.

use crate::error::BridgeResult;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Sending half of the command channel.
#[derive(Debug, Clone)]
pub struct CommandChannel {
    tx: mpsc::UnboundedSender<String>,
}

/// Receiving half of the command channel.
#[derive(Debug)]
pub struct CommandQueue {
    rx: mpsc::UnboundedReceiver<String>,
}

impl CommandChannel {
    /// Create a connected channel/queue pair.
    pub fn new() -> (CommandChannel, CommandQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CommandChannel { tx }, CommandQueue { rx })
    }

    /// Queue one line. Returns `false` if the pump has stopped.
    pub fn send(&self, line: String) -> bool {
        self.tx.send(line).is_ok()
    }
}

impl CommandQueue {
    /// Next queued line without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Next queued line, blocking the current thread.
    ///
    /// Must not be called from an async context.
    pub fn blocking_recv(&mut self) -> Option<String> {
        self.rx.blocking_recv()
    }
}

/// Writes queued commands to the control process.
#[derive(Debug)]
pub struct CommandPump<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> CommandPump<W> {
    /// Wrap the write end of the command pipe.
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Drain `queue` until every [`CommandChannel`] is dropped.
    ///
    /// Each line is flushed before the next is taken. A write failure ends
    /// the pump with the error; the pipe is not reopened.
    pub fn run(mut self, mut queue: CommandQueue) -> BridgeResult<W> {
        info!("Command pump started");
        while let Some(line) = queue.blocking_recv() {
            self.writer.write_all(line.as_bytes())?;
            self.writer.flush()?;
            self.written += 1;
            debug!(command = line.trim_end(), total = self.written, "Command forwarded");
        }
        info!(total = self.written, "Command channel closed");
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use std::io;

    #[test]
    fn pump_writes_lines_in_order() {
        let (channel, queue) = CommandChannel::new();
        assert!(channel.send("start\n".to_string()));
        assert!(channel.send("speed 10\n".to_string()));
        drop(channel);

        let out = CommandPump::new(Vec::new()).run(queue).unwrap();
        assert_eq!(out, b"start\nspeed 10\n");
    }

    #[test]
    fn pump_on_thread_sees_late_commands() {
        let (channel, queue) = CommandChannel::new();
        let handle = std::thread::spawn(move || CommandPump::new(Vec::new()).run(queue));

        for i in 0..10 {
            channel.send(format!("cmd {i}\n"));
        }
        drop(channel);

        let out = handle.join().unwrap().unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 10);
        assert!(text.starts_with("cmd 0\ncmd 1\n"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_returned() {
        let (channel, queue) = CommandChannel::new();
        channel.send("stop\n".to_string());

        let result = CommandPump::new(BrokenPipe).run(queue);
        assert!(matches!(result, Err(BridgeError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn send_after_pump_exit_reports_false() {
        let (channel, queue) = CommandChannel::new();
        drop(queue);
        assert!(!channel.send("late\n".to_string()));
    }
}
