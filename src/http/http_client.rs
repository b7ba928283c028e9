// Copyright 2025 The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Method, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::classify::classify;
use super::error::RpcError;
use super::stream::{JsonStream, decode_value};
use crate::config::ClientConfig;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 0;
const MEDIA_TYPE: &str = "application/json";

pub const DEFAULT_USER_AGENT: &str = concat!("tezos-rpc/", env!("CARGO_PKG_VERSION"));

/// Client for the JSON/HTTP RPC interface of a Tezos node.
///
/// Requests are built with [`new_request`](Self::new_request) and executed
/// with either [`get`](Self::get), which decodes exactly one JSON value, or
/// [`stream`](Self::stream), which decodes a sequence of values from a body
/// the node keeps open.
///
/// The `timeout` applies to single-value calls only. Monitoring endpoints
/// stay open indefinitely, so streams are bounded by the connect timeout and
/// their cancellation token.
pub struct RpcClient {
    base_url: Url,
    user_agent: String,
    timeout: Duration,
    client: reqwest_middleware::ClientWithMiddleware,
    last_latency: RwLock<Option<(Duration, Instant)>>,
}

impl RpcClient {
    pub fn new(base_url: Url) -> Result<Self, RpcError> {
        Self::with_config(base_url, DEFAULT_MAX_RETRIES, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_config(base_url: Url, max_retries: u32, timeout: Duration) -> Result<Self, RpcError> {
        let retry_policy = reqwest_retry::policies::ExponentialBackoff::builder().build_with_max_retries(max_retries);

        let inner_client = reqwest::Client::builder().connect_timeout(timeout).build()?;

        let client = reqwest_middleware::ClientBuilder::new(inner_client)
            .with(reqwest_retry::RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout,
            client,
            last_latency: RwLock::new(None),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, RpcError> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Self::with_config(base_url, config.max_retries, Duration::from_secs(config.timeout_secs))?;
        Ok(match &config.user_agent {
            Some(user_agent) => client.with_user_agent(user_agent.clone()),
            None => client,
        })
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds a request for `path`, which may carry a query string, resolved
    /// against the base URL. A present `body` is sent as JSON.
    pub fn new_request<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Request, RpcError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.base_url.join(path)?;
        let mut request = Request::new(method, url);

        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(RpcError::Encode)?;
            *request.body_mut() = Some(encoded.into());
        }

        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        // A user agent with bytes not allowed in a header is left out.
        if let Ok(user_agent) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, user_agent);
        }

        Ok(request)
    }

    /// Executes `request` and decodes the body as exactly one JSON value.
    pub async fn get<T: DeserializeOwned>(&self, mut request: Request) -> Result<T, RpcError> {
        if request.timeout().is_none() {
            *request.timeout_mut() = Some(self.timeout);
        }

        let response = self.execute(request).await?;
        let body = response.bytes().await?;
        decode_value(&body)
    }

    /// Executes `request` and returns the body as a stream of JSON values.
    ///
    /// Failures before the body starts, a non-success status included, are
    /// returned here. Failures inside the body are yielded by the stream.
    pub async fn stream<T: DeserializeOwned>(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> Result<JsonStream<T>, RpcError> {
        let response = self.execute(request).await?;
        Ok(JsonStream::from_response(response, cancel))
    }

    /// Round-trip time to the response headers of the most recent call.
    pub async fn latency(&self) -> Option<Duration> {
        self.last_latency.read().await.map(|(d, _)| d)
    }

    async fn execute(&self, request: Request) -> Result<Response, RpcError> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(method:% = method, path = &*path; "RPC: request");

        let start = Instant::now();
        let response = self.client.execute(request).await?;
        self.update_latency(start.elapsed()).await;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;
        let err = classify(status, content_type.as_deref(), &body);
        warn!(path = &*path, status = status.as_u16(), error:% = err; "RPC: request failed");
        Err(err)
    }

    async fn update_latency(&self, duration: Duration) {
        *self.last_latency.write().await = Some((duration, Instant::now()));
    }
}
