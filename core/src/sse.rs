//! Line-oriented decoding of the analysis event stream.
//!
//! Every meaningful line has the shape `data: <json>`; anything else (comments,
//! `event:` lines, blank separators, keep-alives) is skipped. Network reads
//! never line up with line boundaries, so bytes are buffered until a newline
//! arrives.

use std::time::Duration;

use bytes::Bytes;
use bytes::BytesMut;
use futures::Stream;
use futures::StreamExt;
use rentlens_protocol::StreamEvent;
use tokio::time::timeout;
use tracing::debug;
use tracing::trace;

use crate::error::RentlensErr;
use crate::error::Result;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";
/// Upper bound on how much of a bad payload ends up in the logs.
const MAX_EXCERPT: usize = 600;
/// Longest line the decoder buffers. Longer lines are dropped.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Incremental decoder. Feed it raw bytes with [`SseDecoder::push`] and call
/// [`SseDecoder::finish`] once the transport is exhausted.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    /// Prefix of `buf` already known to hold no newline.
    scanned: usize,
    /// Set while skipping the rest of an overlong line.
    discarding: bool,
    closed: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a terminal event or the `[DONE]` sentinel has been seen.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Append `chunk` and return every event completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.closed {
            return events;
        }
        self.buf.extend_from_slice(chunk);
        loop {
            let Some(pos) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') else {
                self.scanned = self.buf.len();
                if self.buf.len() > MAX_LINE_BYTES {
                    self.drop_overlong_line();
                }
                break;
            };
            let line = self.buf.split_to(self.scanned + pos + 1);
            self.scanned = 0;
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if line.len() > MAX_LINE_BYTES {
                debug!("dropping SSE line of {} bytes", line.len());
                continue;
            }
            if let Some(event) = self.decode_line(&line) {
                events.push(event);
            }
            if self.closed {
                self.buf.clear();
                break;
            }
        }
        events
    }

    /// Flush a final line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        self.scanned = 0;
        if self.closed || self.discarding || self.buf.is_empty() {
            self.buf.clear();
            return None;
        }
        let line = self.buf.split();
        self.decode_line(&line)
    }

    fn drop_overlong_line(&mut self) {
        if !self.discarding {
            debug!("dropping SSE line longer than {MAX_LINE_BYTES} bytes");
        }
        self.buf.clear();
        self.scanned = 0;
        self.discarding = true;
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<StreamEvent> {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches(['\n', '\r']);
        let payload = line.strip_prefix(DATA_PREFIX)?;
        let payload = payload.strip_prefix(' ').unwrap_or(payload).trim_end();
        if payload.is_empty() {
            return None;
        }
        trace!("SSE data: {payload}");

        if payload == DONE_SENTINEL {
            self.closed = true;
            return None;
        }

        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => {
                if event.is_terminal() {
                    self.closed = true;
                }
                Some(event)
            }
            Err(e) => {
                let mut excerpt = payload.to_string();
                if excerpt.len() > MAX_EXCERPT {
                    let mut cut = MAX_EXCERPT;
                    while !excerpt.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    excerpt.truncate(cut);
                }
                debug!("dropping malformed SSE line: {e}, data: {excerpt}");
                None
            }
        }
    }
}

/// Lift [`SseDecoder`] over an async byte stream.
///
/// The returned stream ends after a terminal event, the `[DONE]` sentinel, or
/// the end of the transport. A transport error or `idle_timeout` of silence
/// yields one `Err` and ends the stream.
pub fn decode_stream<S, E>(
    mut bytes: S,
    idle_timeout: Duration,
) -> impl Stream<Item = Result<StreamEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    async_stream::stream! {
        let mut decoder = SseDecoder::new();
        loop {
            let chunk = match timeout(idle_timeout, bytes.next()).await {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => {
                    debug!("SSE transport error: {e}");
                    yield Err(RentlensErr::Stream(e.to_string()));
                    return;
                }
                Ok(None) => {
                    if let Some(event) = decoder.finish() {
                        yield Ok(event);
                    }
                    return;
                }
                Err(_) => {
                    yield Err(RentlensErr::IdleTimeout(idle_timeout));
                    return;
                }
            };
            for event in decoder.push(&chunk) {
                yield Ok(event);
            }
            if decoder.is_closed() {
                return;
            }
        }
    }
}
