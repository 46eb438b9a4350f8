use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::dispatch::{
    Dispatcher, HttpReply, HttpTransport, RequestDescriptor, TransportError,
};
use crate::core::retry::{JitterSource, NoJitter, Sleeper};

pub type ScriptedResult = Result<HttpReply, TransportError>;

/// Transport that replays a fixed script and records every request it sees.
///
/// Once the script runs dry it keeps answering with `fallback`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ScriptedResult>>,
    fallback: Option<HttpReply>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<ScriptedResult>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn statuses(statuses: &[u16]) -> Arc<Self> {
        Self::new(
            statuses
                .iter()
                .map(|status| Ok(HttpReply::new(*status, format!("status {status}"))))
                .collect(),
        )
    }

    pub fn always(reply: HttpReply) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(reply),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => match &self.fallback {
                Some(reply) => Ok(reply.clone()),
                None => Err(TransportError::new("script exhausted")),
            },
        }
    }
}

/// Sleeper that returns immediately and remembers what it was asked to wait.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.recorded().into_iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Jitter that always yields the same amount, capped at the requested max.
pub struct FixedJitter(pub Duration);

impl JitterSource for FixedJitter {
    fn jitter(&self, max: Duration) -> Duration {
        self.0.min(max)
    }
}

pub fn test_dispatcher(
    transport: Arc<ScriptedTransport>,
    sleeper: Arc<RecordingSleeper>,
) -> Dispatcher {
    Dispatcher::new(transport, sleeper, Arc::new(NoJitter))
}

pub fn generation_payload(text: Option<&str>, attributions: serde_json::Value) -> String {
    let mut candidate = serde_json::json!({
        "groundingMetadata": { "groundingAttributions": attributions }
    });
    if let Some(text) = text {
        candidate["content"] = serde_json::json!({ "parts": [{ "text": text }] });
    }
    serde_json::json!({ "candidates": [candidate] }).to_string()
}
