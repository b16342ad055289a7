//! Server-sent event decoding for streamed chat completions
//!
//! Parses the OpenAI chat completions streaming format:
//! ```text
//! data: {"id":"chatcmpl-xxx","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"token"},"finish_reason":null}]}
//!
//! data: [DONE]
//! ```
//!
//! [`SseTokenStream`] turns a raw byte stream into a lazy, finite stream of
//! content tokens. Frames may be split arbitrarily across network reads.

use crate::{Error, Result};
use bytes::Bytes;
use futures::Stream;
use pin_project::pin_project;
use serde::Deserialize;
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tracing::debug;

/// Boxed stream of plain-text chunks
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Literal sentinel terminating a completion stream
pub const DONE_MARKER: &str = "[DONE]";

/// Represents one decoded SSE line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedChunk {
    /// Content token extracted from the stream
    Content(String),

    /// Stream completion signal
    Done,

    /// Nothing to emit (comments, other fields, empty deltas)
    Empty,

    /// The data payload could not be decoded
    Error(String),
}

impl ParsedChunk {
    /// Check if this is a done signal
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Get the text content if this is a content chunk
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Content(text) => Some(text),
            _ => None,
        }
    }
}

/// Parse a single SSE line
pub fn parse_sse_line(line: &str) -> ParsedChunk {
    let line = line.trim_end_matches(['\r', '\n']);

    let Some(payload) = line.strip_prefix("data:") else {
        return ParsedChunk::Empty;
    };
    let payload = payload.trim_start();

    if payload == DONE_MARKER {
        return ParsedChunk::Done;
    }

    if payload.is_empty() {
        return ParsedChunk::Empty;
    }

    match serde_json::from_str::<CompletionChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map_or(ParsedChunk::Empty, ParsedChunk::Content),
        Err(e) => ParsedChunk::Error(format!("Failed to parse completion chunk: {}", e)),
    }
}

/// Lazy stream of content tokens decoded from an SSE byte stream.
///
/// Ends at the `[DONE]` sentinel or when the body is exhausted, whichever
/// comes first. Undecodable event lines are skipped. A transport error is
/// yielded once as [`Error::Transport`] and ends the stream.
#[pin_project]
pub struct SseTokenStream<S> {
    #[pin]
    inner: S,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    finished: bool,
}

impl<S> SseTokenStream<S> {
    /// Wrap a byte stream
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

/// Decode one complete line into `pending`, returning true on `[DONE]`
fn decode_line(line: &[u8], pending: &mut VecDeque<String>) -> bool {
    let line = String::from_utf8_lossy(line);
    match parse_sse_line(&line) {
        ParsedChunk::Content(text) => {
            pending.push_back(text);
            false
        }
        ParsedChunk::Done => true,
        ParsedChunk::Empty => false,
        ParsedChunk::Error(e) => {
            debug!("Skipping malformed event line: {}", e);
            false
        }
    }
}

impl<S, E> Stream for SseTokenStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
{
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(token) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(token)));
            }

            if *this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => {
                    this.buffer.extend_from_slice(&bytes);

                    while let Some(pos) = this.buffer.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = this.buffer.drain(..=pos).collect();
                        if decode_line(&line, this.pending) {
                            *this.finished = true;
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(Error::Transport(e.to_string()))));
                }
                None => {
                    // Body ended without a trailing newline
                    if !this.buffer.is_empty() {
                        let line = std::mem::take(this.buffer);
                        decode_line(&line, this.pending);
                    }
                    *this.finished = true;
                }
            }
        }
    }
}

// =============================================================================
// Chat completion chunk structures
// =============================================================================

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    delta: CompletionDelta,
}

#[derive(Debug, Deserialize, Default)]
struct CompletionDelta {
    content: Option<String>,
}
