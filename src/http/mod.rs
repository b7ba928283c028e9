//! HTTP access to a Tezos node's RPC interface.
//!
//! # Architecture
//!
//! - [`RpcClient`] builds requests, executes them through a retrying
//!   middleware stack and hands the response to one of two destinations:
//!   a single decoded value ([`RpcClient::get`]) or a [`JsonStream`] of
//!   values ([`RpcClient::stream`]).
//! - [`classify`] turns every non-success response into an [`RpcError`],
//!   decoding the node's structured error list when a 5xx carries one.
//! - [`RpcError`] and [`DecodeError`] describe every failure mode.
//!
//! # Example
//!
//! ```rust,no_run
//! use reqwest::Method;
//! use tezos_rpc::http::RpcClient;
//! use url::Url;
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let client = RpcClient::new(Url::parse("http://localhost:8732")?)?;
//! let request = client.new_request(Method::GET, "/chains/main/blocks/head/hash", None::<&()>)?;
//! let hash: String = client.get(request).await?;
//! println!("head is {hash}");
//! # Ok(())
//! # }
//! ```

mod classify;
mod error;
mod http_client;
mod stream;

pub use classify::classify;
pub use error::{DecodeError, RpcError};
pub use http_client::{DEFAULT_USER_AGENT, RpcClient};
pub use stream::{ByteStream, JsonStream, StreamEnd, decode_value};
