// Copyright 2025 The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Decoding of response bodies.
//!
//! A body is consumed in one of two ways:
//!
//! - as a single JSON value ([`decode_value`]), for ordinary endpoints;
//! - as an open-ended sequence of concatenated JSON values ([`JsonStream`]),
//!   for monitoring endpoints that keep the connection open and emit a value
//!   whenever something happens.
//!
//! Streams are pull-based. Each call to [`JsonStream::next`] races the next
//! chunk of the body against a [`CancellationToken`]; cancellation always
//! wins a tie and ends the stream at the next value boundary.

use std::marker::PhantomData;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use log::{debug, trace};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::{DecodeError, RpcError};

/// Body chunks as delivered by the transport.
pub type ByteStream = BoxStream<'static, Result<Bytes, RpcError>>;

/// Decodes exactly one JSON value. Empty input and trailing data are errors.
pub fn decode_value<T: DeserializeOwned>(body: &[u8]) -> Result<T, RpcError> {
    Ok(serde_json::from_slice(body).map_err(DecodeError::Json)?)
}

/// How a stream finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The node closed the connection after the last complete value.
    Completed,
    /// The cancellation token fired, or the receiving side went away.
    Cancelled,
}

/// A sequence of JSON values decoded incrementally from a response body.
///
/// The body is dropped, closing the connection, as soon as the stream ends
/// for any reason: end of body, cancellation, or a decode failure. Values
/// delivered before a failure stay delivered.
pub struct JsonStream<T> {
    /// `None` once the node has closed the connection, or the stream ended.
    body: Option<ByteStream>,
    buffer: Vec<u8>,
    framer: ValueFramer,
    cancel: CancellationToken,
    finished: bool,
    end: Option<StreamEnd>,
    delivered: usize,
    _item: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> JsonStream<T> {
    pub fn new(body: ByteStream, cancel: CancellationToken) -> Self {
        Self {
            body: Some(body),
            buffer: Vec::new(),
            framer: ValueFramer::default(),
            cancel,
            finished: false,
            end: None,
            delivered: 0,
            _item: PhantomData,
        }
    }

    pub fn from_response(response: reqwest::Response, cancel: CancellationToken) -> Self {
        let body = response.bytes_stream().map(|chunk| chunk.map_err(RpcError::from)).boxed();
        Self::new(body, cancel)
    }

    /// `None` while the stream is live or after it failed.
    pub fn outcome(&self) -> Option<StreamEnd> {
        self.end
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Returns the next decoded value.
    ///
    /// `None` means the stream is over; check [`outcome`](Self::outcome) to
    /// tell a closed connection from a cancellation. After an error has been
    /// returned, further calls return `None`.
    pub async fn next(&mut self) -> Option<Result<T, RpcError>> {
        loop {
            if self.finished {
                return None;
            }
            if self.cancel.is_cancelled() {
                self.finish(StreamEnd::Cancelled);
                return None;
            }

            let at_eof = self.body.is_none();
            match self.take_value(at_eof) {
                Ok(Some(value)) => {
                    self.delivered += 1;
                    return Some(Ok(value));
                },
                Ok(None) if at_eof => {
                    self.finish(StreamEnd::Completed);
                    return None;
                },
                Ok(None) => {},
                Err(e) => return Some(Err(self.fail(e))),
            }

            let Some(body) = self.body.as_mut() else {
                continue;
            };
            let cancel = &self.cancel;
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                chunk = body.next() => Some(chunk),
            };

            match chunk {
                None => {
                    self.finish(StreamEnd::Cancelled);
                    return None;
                },
                Some(Some(Ok(bytes))) => {
                    trace!(len = bytes.len(); "RPC: stream chunk");
                    self.buffer.extend_from_slice(&bytes);
                },
                Some(Some(Err(e))) => return Some(Err(self.fail(e))),
                // The node closed the connection; whatever is buffered is
                // decoded on the next pass.
                Some(None) => self.body = None,
            }
        }
    }

    /// Pushes every value into `sink` until the stream ends.
    ///
    /// The sink belongs to the caller and is never closed here. A dropped
    /// receiver ends the stream like a cancellation.
    pub async fn forward(mut self, sink: &mpsc::Sender<T>) -> Result<StreamEnd, RpcError> {
        while let Some(item) = self.next().await {
            let value = item?;
            let cancel = &self.cancel;
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                sent = sink.send(value) => sent.is_ok(),
            };
            if !sent {
                self.finish(StreamEnd::Cancelled);
                break;
            }
        }
        Ok(self.end.unwrap_or(StreamEnd::Completed))
    }

    /// Adapts this stream to [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<T, RpcError>> + Send
    where
        T: Send,
    {
        stream::unfold(self, |mut values| async move { values.next().await.map(|item| (item, values)) })
    }

    /// Decodes one value from the front of the buffer once its end is known.
    /// Only the bytes received since the previous call are scanned; the
    /// value itself is parsed exactly once.
    fn take_value(&mut self, at_eof: bool) -> Result<Option<T>, DecodeError> {
        if self.framer.is_idle() {
            let start = self
                .buffer
                .iter()
                .position(|b| !b.is_ascii_whitespace())
                .unwrap_or(self.buffer.len());
            self.buffer.drain(..start);
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let Some(end) = self.framer.value_end(&self.buffer, at_eof) else {
            return if at_eof {
                Err(DecodeError::TruncatedStream {
                    pending: self.buffer.len(),
                })
            } else {
                Ok(None)
            };
        };
        self.framer = ValueFramer::default();

        let value = serde_json::from_slice(&self.buffer[..end]);
        self.buffer.drain(..end);
        match value {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_eof() => Err(DecodeError::TruncatedStream { pending: end }),
            Err(e) => Err(DecodeError::Json(e)),
        }
    }

    fn finish(&mut self, end: StreamEnd) {
        debug!(delivered = self.delivered, end:? = end; "RPC: stream finished");
        self.finished = true;
        self.body = None;
        self.buffer.clear();
        self.framer = ValueFramer::default();
        self.end = Some(end);
    }

    fn fail(&mut self, err: impl Into<RpcError>) -> RpcError {
        let err = err.into();
        debug!(delivered = self.delivered, error:% = err; "RPC: stream aborted");
        self.finished = true;
        self.body = None;
        self.buffer.clear();
        self.framer = ValueFramer::default();
        self.end = None;
        err
    }
}

/// Finds where the first top-level JSON value in a growing buffer ends.
///
/// Objects, arrays and strings end at their closing byte, tracked through
/// nesting depth and string/escape state that carry over between calls.
/// Numbers and literals have no closing byte: they end at the next
/// whitespace or structural byte, or at the end of the body. Malformed
/// input is not rejected here; it is framed as best it can be and left
/// for serde_json to report.
#[derive(Debug, Default)]
struct ValueFramer {
    /// Bytes at the front of the buffer already examined.
    scanned: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ValueFramer {
    fn is_idle(&self) -> bool {
        self.scanned == 0
    }

    /// Length of the value at the front of `buffer`, which must begin with
    /// the value's first byte, or `None` if more input is needed.
    fn value_end(&mut self, buffer: &[u8], at_eof: bool) -> Option<usize> {
        let first = *buffer.first()?;
        if !matches!(first, b'{' | b'[' | b'"') {
            let from = self.scanned.max(1);
            let end = buffer[from..]
                .iter()
                .position(|&b| b.is_ascii_whitespace() || matches!(b, b'{' | b'}' | b'[' | b']' | b'"' | b','))
                .map(|i| from + i);
            self.scanned = buffer.len();
            return end.or(at_eof.then_some(buffer.len()));
        }

        for (i, &b) in buffer.iter().enumerate().skip(self.scanned) {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        return Some(i + 1);
                    }
                }
                continue;
            }
            match b {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return Some(i + 1);
                    }
                },
                _ => {},
            }
        }
        self.scanned = buffer.len();
        None
    }
}
