// src/llm/sse.rs
//! Server-sent event framing for streamed completions.
//!
//! Only `data:` lines matter to either backend. Bytes are buffered until a
//! full line arrives, so a multi-byte character split across network chunks
//! is decoded intact.

use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Feed one network chunk; returns the data payloads it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            out.extend(data_payload(&line));
        }
        out
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buf);
        data_payload(&line)
    }
}

/// `[DONE]` and empty payloads are dropped; comments and other fields too.
fn data_payload(line: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(line);
    let data = text.trim_end().strip_prefix("data:")?.trim_start();
    if data.is_empty() || data == "[DONE]" {
        None
    } else {
        Some(data.to_string())
    }
}

struct EventState<S> {
    inner: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

/// Turn a byte stream into its SSE data payloads. A transport error is
/// yielded once and ends the stream.
pub fn data_events<S, B, E>(bytes: S) -> BoxStream<'static, Result<String, String>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = EventState {
        inner: bytes.boxed(),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        done: false,
    };
    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.pending.pop_front() {
                return Some((Ok(event), st));
            }
            if st.done {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(chunk)) => st.pending.extend(st.decoder.push(chunk.as_ref())),
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(e.to_string()), st));
                }
                None => {
                    st.done = true;
                    st.pending.extend(st.decoder.finish());
                }
            }
        }
    })
    .boxed()
}
