// Copyright 2025 The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for RPC client operations.
//!
//! This module defines the [`RpcError`] enum which encompasses all possible
//! failure modes of a call against a Tezos node, and [`DecodeError`] for
//! bodies that do not have the shape a caller asked for.

use std::borrow::Cow;

use bytes::Bytes;
use reqwest::StatusCode;
use thiserror::Error;

use crate::models::{ErrorKind, ProtocolError};

/// Errors that can occur while executing an RPC call.
///
/// The variants are ordered from the outermost layer inwards. A caller can
/// always tell a transport failure apart from a response the node produced,
/// and a structured failure reported by the node apart from a malformed one.
///
/// # Error Categories
///
/// - **Transport errors**: [`Transport`](RpcError::Transport),
///   [`Middleware`](RpcError::Middleware)
/// - **Status errors**: [`HttpStatus`](RpcError::HttpStatus)
/// - **Node-reported errors**: [`Protocol`](RpcError::Protocol),
///   [`EmptyProtocolError`](RpcError::EmptyProtocolError)
/// - **Body errors**: [`Decode`](RpcError::Decode)
/// - **Request construction**: [`Url`](RpcError::Url), [`Encode`](RpcError::Encode)
///
/// # Example
///
/// ```rust,no_run
/// use tezos_rpc::http::RpcError;
///
/// fn handle_error(err: RpcError) {
///     match err {
///         RpcError::Protocol { errors, .. } => {
///             for e in errors {
///                 eprintln!("node reported {} error {}", e.kind, e.id);
///             }
///         }
///         RpcError::HttpStatus { status, body } => {
///             eprintln!("Node returned {}: {}", status, String::from_utf8_lossy(&body));
///         }
///         other => eprintln!("Other error: {}", other),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum RpcError {
    /// The request never produced a response, or the body could not be read.
    ///
    /// This covers connection refused, DNS and TLS failures and timeouts
    /// configured on the transport. It is surfaced exactly as reqwest
    /// reported it.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A failure raised by the middleware stack rather than the underlying
    /// client.
    #[error("Middleware error: {0}")]
    Middleware(reqwest_middleware::Error),

    /// The node answered with a non-success status whose body is not a
    /// structured error list.
    ///
    /// `status` displays with its canonical reason (`404 Not Found`) and
    /// `body` is kept verbatim.
    #[error("HTTP status {status}")]
    HttpStatus {
        /// The HTTP status code returned by the node.
        status: StatusCode,
        /// The raw response body.
        body: Bytes,
    },

    /// The node reported one or more protocol-level errors inside a 5xx
    /// response.
    #[error("{}", describe_protocol_errors(.errors))]
    Protocol {
        status: StatusCode,
        body: Bytes,
        /// Never empty.
        errors: Vec<ProtocolError>,
    },

    /// A 5xx response carried a well-formed but empty error list.
    #[error("empty error response (HTTP status {status})")]
    EmptyProtocolError { status: StatusCode, body: Bytes },

    /// A body was present but did not decode into the expected shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Resolving a request path against the base URL failed.
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Serializing a request body failed.
    #[error("JSON encoding error: {0}")]
    Encode(#[source] serde_json::Error),
}

impl From<reqwest_middleware::Error> for RpcError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => RpcError::Transport(e),
            other => RpcError::Middleware(other),
        }
    }
}

impl RpcError {
    /// The HTTP status the node answered with, if the call got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RpcError::HttpStatus { status, .. }
            | RpcError::Protocol { status, .. }
            | RpcError::EmptyProtocolError { status, .. } => Some(*status),
            RpcError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// The raw response body for status-derived errors.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            RpcError::HttpStatus { body, .. }
            | RpcError::Protocol { body, .. }
            | RpcError::EmptyProtocolError { body, .. } => Some(&body[..]),
            _ => None,
        }
    }

    /// [`RpcError::body`] as text, with invalid UTF-8 replaced.
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        self.body().map(String::from_utf8_lossy)
    }

    /// Whether repeating the same call may succeed. Protocol errors count as
    /// retryable only when every entry is `temporary`.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            RpcError::Middleware(_) => true,
            RpcError::HttpStatus { status, .. } => status.is_server_error(),
            RpcError::Protocol { errors, .. } => errors.iter().all(|e| e.kind == ErrorKind::Temporary),
            RpcError::EmptyProtocolError { .. } => true,
            RpcError::Decode(_) | RpcError::Url(_) | RpcError::Encode(_) => false,
        }
    }
}

fn describe_protocol_errors(errors: &[ProtocolError]) -> String {
    match errors {
        [] => "RPC error (no details)".to_string(),
        [first] => format!("RPC error (kind = {:?}, id = {:?})", first.kind.as_str(), first.id),
        [first, rest @ ..] => format!(
            "RPC error (kind = {:?}, id = {:?}) and {} more",
            first.kind.as_str(),
            first.id,
            rest.len()
        ),
    }
}

/// A body that does not decode into the shape the caller expected.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not valid JSON, or the JSON does not match the target type.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON array is too short, expected {expected}, got {got}")]
    ShortTuple { expected: usize, got: usize },

    #[error("tuple element {index}: {source}")]
    TupleElement {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The discriminator of an element could not be read. Raised when the
    /// element is not an object or the discriminator is not a string.
    #[error("{family}{}: cannot read discriminator: {source}", at(.index))]
    Discriminator {
        family: &'static str,
        index: Option<usize>,
        #[source]
        source: serde_json::Error,
    },

    /// An element with a registered discriminator did not match its type.
    #[error("{family}{} (discriminator {discriminator:?}): {source}", at(.index))]
    Variant {
        family: &'static str,
        index: Option<usize>,
        discriminator: String,
        #[source]
        source: serde_json::Error,
    },

    /// A 5xx body announced as JSON is not a list of protocol errors.
    #[error("error decoding RPC error: {0}")]
    ProtocolErrorBody(#[source] serde_json::Error),

    /// The connection closed while a JSON value was still incomplete.
    #[error("stream ended inside a JSON value ({pending} bytes pending)")]
    TruncatedStream { pending: usize },
}

fn at(index: &Option<usize>) -> String {
    index.map(|i| format!(" element {i}")).unwrap_or_default()
}
