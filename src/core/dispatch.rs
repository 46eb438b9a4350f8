//! Resilient request dispatcher.
//!
//! [`Dispatcher::dispatch`] runs one bounded attempt loop per call. Every
//! physical call produces exactly one [`AttemptOutcome`]; the loop stops on
//! the first success or fatal outcome and sleeps between retryable ones.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, Url};
use tracing::{debug, warn};

use crate::core::retry::{JitterSource, RetryPolicy, Sleeper};

/// Immutable description of one outbound HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub url: Url,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl RequestDescriptor {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn post_json(url: Url, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            url,
            method: Method::POST,
            headers,
            body: Some(body),
        }
    }

    /// Target without query string or fragment, safe to log.
    pub fn redacted_target(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.to_string()
    }
}

/// Raw response handed back by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A call that produced no readable reply. `status` is set when the status
/// line arrived but reading the body failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
    pub status: Option<u16>,
}

impl TransportError {
    /// Failure before any status was received.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn after_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error: {}", self.message)
    }
}

impl StdError for TransportError {}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpReply, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpReply, TransportError> {
        let mut builder = self.client.request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::new(err.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::after_status(status, err.without_url().to_string()))?;
        Ok(HttpReply { status, body })
    }
}

/// Why an attempt may be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryCause {
    Transport(TransportError),
    Throttled { status: u16 },
    Server { status: u16 },
}

impl fmt::Display for RetryCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryCause::Transport(err) => write!(f, "{err}"),
            RetryCause::Throttled { status } => write!(f, "rate limited (status {status})"),
            RetryCause::Server { status } => write!(f, "server error (status {status})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(HttpReply),
    RetryableFailure(RetryCause),
    FatalFailure { status: u16, body: String },
    /// 2xx status whose body could not be read. Never retried.
    UnreadableSuccess { status: u16, message: String },
}

impl AttemptOutcome {
    /// The status decides first; a body-read failure only matters once the
    /// status says the call succeeded.
    pub fn classify(result: Result<HttpReply, TransportError>) -> Self {
        let (status, body) = match result {
            Ok(reply) => (reply.status, Ok(reply.body)),
            Err(err) => match err.status {
                Some(status) => (status, Err(err)),
                None => return AttemptOutcome::RetryableFailure(RetryCause::Transport(err)),
            },
        };

        match status {
            200..=299 => match body {
                Ok(body) => AttemptOutcome::Success(HttpReply { status, body }),
                Err(err) => AttemptOutcome::UnreadableSuccess {
                    status,
                    message: err.message,
                },
            },
            429 => AttemptOutcome::RetryableFailure(RetryCause::Throttled { status }),
            500..=599 => AttemptOutcome::RetryableFailure(RetryCause::Server { status }),
            _ => AttemptOutcome::FatalFailure {
                status,
                body: body.unwrap_or_default(),
            },
        }
    }
}

/// Failures that cross the dispatcher boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The remote answered with a non-retryable status.
    Rejected { status: u16, body: String },
    /// Every attempt in the budget ended in a retryable failure.
    ExhaustedRetries { attempts: u32, last: RetryCause },
    /// The request body could not be serialized.
    Encode(String),
    /// A success payload could not be decoded.
    Decode(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Rejected { status, body } => {
                write!(f, "API failed with status {status}: {}", body.trim())
            }
            DispatchError::ExhaustedRetries { attempts, last } => {
                write!(f, "max retries exceeded after {attempts} attempts: {last}")
            }
            DispatchError::Encode(message) => write!(f, "invalid request body: {message}"),
            DispatchError::Decode(message) => write!(f, "invalid API payload: {message}"),
        }
    }
}

impl StdError for DispatchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DispatchError::ExhaustedRetries {
                last: RetryCause::Transport(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn JitterSource>,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
        jitter: Arc<dyn JitterSource>,
    ) -> Self {
        Self {
            transport,
            sleeper,
            jitter,
        }
    }

    pub async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        policy: &RetryPolicy,
    ) -> Result<HttpReply, DispatchError> {
        let target = descriptor.redacted_target();
        let attempts = policy.attempts();
        let mut last_cause = None;

        for attempt in 0..attempts {
            let result = self.transport.execute(descriptor).await;
            match AttemptOutcome::classify(result) {
                AttemptOutcome::Success(reply) => {
                    debug!(%target, attempt, status = reply.status, "request succeeded");
                    return Ok(reply);
                }
                AttemptOutcome::FatalFailure { status, body } => {
                    warn!(%target, status, body = %body, "API rejected request");
                    return Err(DispatchError::Rejected { status, body });
                }
                AttemptOutcome::UnreadableSuccess { status, message } => {
                    warn!(%target, status, error = %message, "unreadable response body");
                    return Err(DispatchError::Decode(format!("status {status}: {message}")));
                }
                AttemptOutcome::RetryableFailure(cause) => {
                    let is_final = policy.is_final_attempt(attempt);
                    match &cause {
                        RetryCause::Transport(_) => {
                            debug!(%target, attempt, %cause, "transport failure");
                        }
                        _ if !is_final => {
                            let delay = policy.delay_for(attempt, self.jitter.as_ref());
                            debug!(
                                %target,
                                attempt,
                                %cause,
                                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                                "retrying after backoff"
                            );
                            self.sleeper.sleep(delay).await;
                        }
                        _ => {
                            debug!(%target, attempt, %cause, "final attempt failed");
                        }
                    }
                    last_cause = Some(cause);
                }
            }
        }

        let last = last_cause.unwrap_or_else(|| {
            RetryCause::Transport(TransportError::new("no attempt was made"))
        });
        warn!(%target, attempts, %last, "max retries reached");
        Err(DispatchError::ExhaustedRetries { attempts, last })
    }
}

#[cfg(test)]
mod tests;
