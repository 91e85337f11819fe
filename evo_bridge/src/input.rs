//! Control process output pump.
//!
//! Reads the control process's stdout in fixed-size chunks on a blocking
//! thread and hands the text to [`Bridge::handle_input`]. Chunk boundaries
//! are arbitrary, so a multi-byte UTF-8 sequence split across two reads is
//! held back until it is complete.

use crate::bridge::Bridge;
use crate::error::BridgeResult;
use evo::bridge::consts::INPUT_CHUNK_SIZE;
use std::io::{ErrorKind, Read};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Back-off when the pipe is still non-blocking and empty.
const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(10);

/// Incremental UTF-8 decoder.
///
/// Invalid sequences become U+FFFD; an incomplete trailing sequence is
/// carried into the next call.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, prefixed by whatever was carried from the last call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.pending.len());

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush a dangling partial sequence at end of stream.
    pub fn finish(&mut self) -> String {
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }

    /// Bytes held back for the next call.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Feeds control process output into a [`Bridge`].
#[derive(Debug)]
pub struct InputPump<R: Read> {
    reader: R,
    decoder: Utf8Decoder,
    chunk_size: usize,
}

impl<R: Read> InputPump<R> {
    /// Pump reading `reader` in chunks of the default size.
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, INPUT_CHUNK_SIZE)
    }

    /// Pump with a custom read size.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            decoder: Utf8Decoder::new(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Read until end of stream. Returns the number of bytes read.
    ///
    /// End of stream is not an error: the control process exited and the
    /// bridge keeps serving what it has.
    pub fn run(mut self, bridge: &Bridge) -> BridgeResult<u64> {
        info!("Input pump started");
        let mut buf = vec![0u8; self.chunk_size];
        let mut total = 0u64;

        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    total += n as u64;
                    let text = self.decoder.decode(&buf[..n]);
                    bridge.handle_input(&text);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    debug!("Input not ready, backing off");
                    std::thread::sleep(WOULD_BLOCK_BACKOFF);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let tail = self.decoder.finish();
        if !tail.is_empty() {
            warn!(bytes = tail.len(), "Input ended inside a UTF-8 sequence");
            bridge.handle_input(&tail);
        }
        info!(bytes = total, "Control process output closed");
        Ok(total)
    }
}
