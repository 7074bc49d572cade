//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the only seam between the deterministic request mapping
//! and real I/O. `UreqTransport` is the blocking implementation; tests and
//! front-ends can substitute any closure with the same signature.
//!
//! ureq reports 4xx/5xx as data rather than `Err` here
//! (`http_status_as_error(false)`), so status interpretation stays in
//! `RequestMapper`.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::context::{CallContext, CancelToken};
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Runs one request/response round trip.
pub trait Transport: Send + Sync {
    fn execute(&self, ctx: &CallContext, request: HttpRequest) -> Result<HttpResponse>;
}

impl<F> Transport for F
where
    F: Fn(&CallContext, HttpRequest) -> Result<HttpResponse> + Send + Sync,
{
    fn execute(&self, ctx: &CallContext, request: HttpRequest) -> Result<HttpResponse> {
        self(ctx, request)
    }
}

/// How often a cancellable call checks its token while waiting.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Blocking transport backed by a shared `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl UreqTransport {
    /// `timeout` bounds every request; a call's own deadline can only
    /// shorten it.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent, timeout }
    }

    fn wait_cancellable(
        &self,
        token: &CancelToken,
        request: HttpRequest,
        timeout: Duration,
    ) -> Result<std::result::Result<HttpResponse, ureq::Error>> {
        let (tx, rx) = mpsc::channel();
        let agent = self.agent.clone();
        thread::spawn(move || {
            // The receiver is gone if the caller cancelled; nothing to report.
            let _ = tx.send(send(&agent, request, timeout));
        });

        loop {
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => return Ok(result),
                Err(RecvTimeoutError::Timeout) if token.is_cancelled() => {
                    debug!("request cancelled while in flight");
                    return Err(Error::Cancelled);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::transport("request thread exited without a response"));
                }
            }
        }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, ctx: &CallContext, request: HttpRequest) -> Result<HttpResponse> {
        ctx.check()?;
        let timeout = ctx
            .remaining()
            .map_or(self.timeout, |remaining| remaining.min(self.timeout));

        let result = match ctx.cancel_token() {
            Some(token) => self.wait_cancellable(token, request, timeout)?,
            None => send(&self.agent, request, timeout),
        };

        result.map_err(|e| {
            if ctx.is_expired() {
                Error::DeadlineExceeded
            } else {
                Error::transport(e)
            }
        })
    }
}

fn send(
    agent: &ureq::Agent,
    request: HttpRequest,
    timeout: Duration,
) -> std::result::Result<HttpResponse, ureq::Error> {
    let uri = request.path.as_str();
    let mut response = match (request.method, request.body.as_deref()) {
        (HttpMethod::Get, _) => prepare(agent.get(uri), &request, timeout).call(),
        (HttpMethod::Delete, _) => prepare(agent.delete(uri), &request, timeout).call(),
        (HttpMethod::Post, Some(body)) => {
            prepare(agent.post(uri), &request, timeout).send(body.as_bytes())
        }
        (HttpMethod::Post, None) => prepare(agent.post(uri), &request, timeout).send_empty(),
        (HttpMethod::Patch, Some(body)) => {
            prepare(agent.patch(uri), &request, timeout).send(body.as_bytes())
        }
        (HttpMethod::Patch, None) => prepare(agent.patch(uri), &request, timeout).send_empty(),
    }?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response.body_mut().read_to_string()?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn prepare<B>(
    builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
    timeout: Duration,
) -> ureq::RequestBuilder<B> {
    let mut builder = builder.config().timeout_global(Some(timeout)).build();
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (name, value) in &request.query {
        builder = builder.query(name, value);
    }
    builder
}
