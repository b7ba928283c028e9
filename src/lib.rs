//! Client for the JSON/HTTP RPC interface of a Tezos node.
//!
//! - [`decode`]: tuple and discriminated-variant decoding of JSON fragments.
//! - [`http`]: the RPC client, response classification and streaming.
//! - [`models`]: typed records returned by the node.
//! - [`Service`]: one method per supported endpoint.

pub mod cli;
pub mod config;
pub mod decode;
pub mod http;
pub mod log;
pub mod models;
pub mod service;

pub use crate::http::{RpcClient, RpcError};
pub use crate::service::Service;
