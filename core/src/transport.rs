//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! `Transport` is the only place where I/O happens. Non-2xx statuses are
//! returned as data, never as errors, so `TodoClient::parse_*` stays the single
//! authority on status interpretation. A transport error means no response
//! was received and maps to `ApiError::NetworkError`.

use std::future::Future;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Asynchronous executor for plain-data HTTP requests.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

/// Production transport backed by a blocking `ureq` agent.
///
/// Each request runs on tokio's blocking pool so callers can await it from
/// the async store without stalling the runtime.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send {
        let agent = self.agent.clone();
        async move {
            tokio::task::spawn_blocking(move || execute_blocking(&agent, request))
                .await
                .map_err(|e| ApiError::NetworkError(e.to_string()))?
                .map_err(|e| ApiError::NetworkError(e.to_string()))
        }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn execute_blocking(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, ureq::Error> {
    tracing::trace!(method = req.method.as_str(), path = %req.path, "sending request");
    let headers = &req.headers;
    let mut response = match (req.method, req.body.as_deref()) {
        (HttpMethod::Get, _) => with_headers(agent.get(&req.path), headers).call(),
        (HttpMethod::Delete, _) => with_headers(agent.delete(&req.path), headers).call(),
        (HttpMethod::Post, Some(body)) => with_headers(agent.post(&req.path), headers).send(body.as_bytes()),
        (HttpMethod::Post, None) => with_headers(agent.post(&req.path), headers).send_empty(),
        (HttpMethod::Put, Some(body)) => with_headers(agent.put(&req.path), headers).send(body.as_bytes()),
        (HttpMethod::Put, None) => with_headers(agent.put(&req.path), headers).send_empty(),
        (HttpMethod::Patch, Some(body)) => with_headers(agent.patch(&req.path), headers).send(body.as_bytes()),
        (HttpMethod::Patch, None) => with_headers(agent.patch(&req.path), headers).send_empty(),
    }?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let body = response.body_mut().read_to_string()?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
