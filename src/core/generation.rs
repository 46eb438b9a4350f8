//! Generation requests and the parsing of their results.

use std::error::Error;

use reqwest::Url;
use tracing::warn;

use crate::api::{
    Content, GenerateContentRequest, GenerateContentResponse, GoogleSearch, GroundingAttribution,
    Tool,
};
use crate::core::constants::SEARCH_HINT;
use crate::core::dispatch::{DispatchError, Dispatcher, RequestDescriptor};
use crate::core::retry::RetryPolicy;
use crate::utils::url::construct_api_url;

/// The whitespace class of ECMAScript regular expressions: Unicode space
/// separators plus tab, line terminators and BOM. Unlike
/// [`char::is_whitespace`] it excludes U+0085 and includes U+FEFF.
fn is_pattern_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | ' ' | '\u{A0}' | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Returns true when `text` contains anything besides ASCII letters, digits,
/// whitespace and `. , ? ! ' "`. Empty text also qualifies.
///
/// This is a presence check, not language detection.
pub fn needs_search_hints(text: &str) -> bool {
    text.is_empty()
        || !text.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || is_pattern_whitespace(c)
                || matches!(c, '.' | ',' | '?' | '!' | '\'' | '"')
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub user_text: String,
    pub system_instruction: String,
    pub grounding_queries: Option<Vec<String>>,
}

impl GenerationRequest {
    pub fn new(user_text: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        let user_text = user_text.into();
        let grounding_queries = needs_search_hints(&user_text)
            .then(|| vec![user_text.clone(), SEARCH_HINT.to_string()]);
        Self {
            user_text,
            system_instruction: system_instruction.into(),
            grounding_queries,
        }
    }

    pub fn to_body(&self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::text(self.user_text.as_str())],
            tools: vec![Tool {
                google_search: GoogleSearch {
                    queries: self.grounding_queries.clone(),
                },
            }],
            system_instruction: Content::text(self.system_instruction.as_str()),
        }
    }

    pub fn to_descriptor(
        &self,
        endpoint: &GenerationEndpoint,
    ) -> Result<RequestDescriptor, DispatchError> {
        let body = serde_json::to_string(&self.to_body())
            .map_err(|err| DispatchError::Encode(err.to_string()))?;
        Ok(RequestDescriptor::post_json(endpoint.url.clone(), body))
    }
}

/// Fully resolved `generateContent` URL, credential included.
#[derive(Debug, Clone)]
pub struct GenerationEndpoint {
    url: Url,
}

impl GenerationEndpoint {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Result<Self, Box<dyn Error>> {
        let raw = construct_api_url(base_url, &format!("models/{model}:generateContent"));
        let mut url =
            Url::parse(&raw).map_err(|err| format!("invalid generation URL {raw}: {err}"))?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(Self { url })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: Option<String>,
    /// Usable labels only; may be empty even when `attributed` is set.
    pub sources: Vec<String>,
    /// The candidate carried at least one grounding attribution.
    pub attributed: bool,
}

/// Label for one attribution: the web title, else the raw uri, else nothing.
fn source_label(attribution: &GroundingAttribution) -> Option<String> {
    attribution
        .web
        .as_ref()
        .and_then(|web| web.title.as_deref())
        .filter(|title| !title.is_empty())
        .or_else(|| attribution.uri.as_deref().filter(|uri| !uri.is_empty()))
        .map(str::to_owned)
}

impl GenerationResult {
    pub fn from_response(response: GenerateContentResponse) -> Self {
        let Some(candidate) = response.candidates.into_iter().next() else {
            return Self::default();
        };

        let text = candidate
            .content
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.is_empty());
        let attributions = candidate
            .grounding_metadata
            .map(|metadata| metadata.grounding_attributions)
            .unwrap_or_default();

        Self {
            text,
            sources: attributions.iter().filter_map(source_label).collect(),
            attributed: !attributions.is_empty(),
        }
    }

    pub fn from_payload(payload: &str) -> Result<Self, DispatchError> {
        serde_json::from_str::<GenerateContentResponse>(payload)
            .map(Self::from_response)
            .map_err(|err| DispatchError::Decode(err.to_string()))
    }

    /// Generated text with the sources suffix, or `None` when nothing usable
    /// was generated. The suffix follows any attribution, labelled or not.
    pub fn reply_text(&self) -> Option<String> {
        let text = self.text.as_ref()?;
        if !self.attributed {
            Some(text.clone())
        } else {
            Some(format!("{text}\n\n(Sources: {})", self.sources.join(", ")))
        }
    }
}

pub struct GenerationClient {
    dispatcher: Dispatcher,
    endpoint: GenerationEndpoint,
    policy: RetryPolicy,
}

impl GenerationClient {
    pub fn new(dispatcher: Dispatcher, endpoint: GenerationEndpoint, policy: RetryPolicy) -> Self {
        Self {
            dispatcher,
            endpoint,
            policy,
        }
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, DispatchError> {
        let descriptor = request.to_descriptor(&self.endpoint)?;
        let reply = self.dispatcher.dispatch(&descriptor, &self.policy).await?;
        let result = GenerationResult::from_payload(&reply.body)?;
        if result.text.is_none() {
            warn!(body = %reply.body, "API returned no text");
        }
        Ok(result)
    }
}
