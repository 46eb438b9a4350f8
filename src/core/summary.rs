//! Encyclopedia summary lookups.
//!
//! One GET per lookup and no retry: a failed lookup simply reports nothing.

use std::error::Error;
use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, warn};

use crate::api::SummaryResponse;
use crate::core::constants::{SUMMARY_MAX_CHARS, SUMMARY_TRUNCATION_MARKER};
use crate::core::dispatch::{HttpTransport, RequestDescriptor};

/// Keeps at most [`SUMMARY_MAX_CHARS`] characters, marking the cut.
pub fn truncate_extract(extract: &str) -> String {
    match extract.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &extract[..cut], SUMMARY_TRUNCATION_MARKER),
        None => extract.to_string(),
    }
}

pub struct SummaryClient {
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
}

impl SummaryClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str) -> Result<Self, Box<dyn Error>> {
        let base_url =
            Url::parse(base_url).map_err(|err| format!("invalid summary URL {base_url}: {err}"))?;
        if base_url.cannot_be_a_base() {
            return Err(format!("summary URL {base_url} cannot carry a path").into());
        }
        Ok(Self {
            transport,
            base_url,
        })
    }

    /// `{base}/page/summary/{term}` with `term` encoded as a single segment.
    pub fn summary_url(&self, term: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["page", "summary", term]);
        }
        url
    }

    pub async fn lookup(&self, term: &str) -> Option<String> {
        let descriptor = RequestDescriptor::get(self.summary_url(term));
        let reply = match self.transport.execute(&descriptor).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(term, error = %err, "summary lookup failed");
                return None;
            }
        };

        if !reply.is_success() {
            debug!(term, status = reply.status, "no summary page");
            return None;
        }

        match serde_json::from_str::<SummaryResponse>(&reply.body) {
            Ok(summary) => summary
                .extract
                .filter(|extract| !extract.is_empty())
                .map(|extract| truncate_extract(&extract)),
            Err(err) => {
                warn!(term, error = %err, "unreadable summary payload");
                None
            }
        }
    }
}
