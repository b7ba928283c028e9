// Copyright 2025 The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Mapping of non-success responses onto [`RpcError`].

use bytes::Bytes;
use log::debug;
use reqwest::StatusCode;

use super::error::{DecodeError, RpcError};
use crate::models::ProtocolError;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Classifies a response the node answered with a non-success status.
///
/// - 4xx: [`RpcError::HttpStatus`], the body is not interpreted.
/// - 5xx with a JSON content type: the body is decoded as a list of
///   [`ProtocolError`]s, giving [`RpcError::Protocol`],
///   [`RpcError::EmptyProtocolError`] for `[]`, or [`RpcError::Decode`] when
///   the body is malformed.
/// - 5xx with any other content type, and every other status class:
///   [`RpcError::HttpStatus`].
///
/// Success responses are never passed here; the dispatcher consumes them.
pub fn classify(status: StatusCode, content_type: Option<&str>, body: &[u8]) -> RpcError {
    if !status.is_server_error() || !is_json(content_type) {
        return RpcError::HttpStatus {
            status,
            body: Bytes::copy_from_slice(body),
        };
    }

    let errors: Vec<ProtocolError> = match serde_json::from_slice(body) {
        Ok(errors) => errors,
        Err(e) => {
            debug!(status:% = status, error:% = e; "RPC: undecodable error body");
            return DecodeError::ProtocolErrorBody(e).into();
        },
    };

    if errors.is_empty() {
        RpcError::EmptyProtocolError {
            status,
            body: Bytes::copy_from_slice(body),
        }
    } else {
        RpcError::Protocol {
            status,
            body: Bytes::copy_from_slice(body),
            errors,
        }
    }
}

/// Whether a `Content-Type` value names JSON, ignoring parameters such as
/// `charset`.
fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}
