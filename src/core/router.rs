//! Turns one line of user input into the text shown back to the user.

use std::error::Error;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::commands::{process_input, CommandResult};
use crate::core::config::Config;
use crate::core::constants::{
    not_found_text, COMMUNICATION_ERROR_TEXT, EMPTY_RESULT_TEXT, HELP_TEXT,
};
use crate::core::dispatch::{Dispatcher, HttpTransport};
use crate::core::generation::{GenerationClient, GenerationEndpoint, GenerationRequest};
use crate::core::retry::{RandomJitter, TokioSleeper};
use crate::core::summary::SummaryClient;

pub struct ResponseRouter {
    generation: GenerationClient,
    summary: SummaryClient,
    system_instruction: String,
}

impl ResponseRouter {
    pub fn new(
        generation: GenerationClient,
        summary: SummaryClient,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            generation,
            summary,
            system_instruction: system_instruction.into(),
        }
    }

    /// Wires both clients to `transport` using the configured endpoints,
    /// model and retry budget. `model` overrides the configured model.
    pub fn from_config(
        config: &Config,
        model: Option<&str>,
        api_key: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, Box<dyn Error>> {
        let model = model.unwrap_or_else(|| config.model());
        let endpoint = GenerationEndpoint::new(config.generation_base_url(), model, api_key)?;
        let dispatcher = Dispatcher::new(
            Arc::clone(&transport),
            Arc::new(TokioSleeper),
            Arc::new(RandomJitter),
        );
        let generation = GenerationClient::new(dispatcher, endpoint, config.retry_policy());
        let summary = SummaryClient::new(transport, config.summary_base_url())?;
        debug!(model, "response router ready");
        Ok(Self::new(generation, summary, config.system_instruction()))
    }

    /// Never fails: every error path resolves to a fixed chat message.
    pub async fn route(&self, user_text: &str) -> String {
        match process_input(user_text) {
            CommandResult::ShowHelp => HELP_TEXT.to_string(),
            CommandResult::Lookup(term) => match self.summary.lookup(&term).await {
                Some(extract) => extract,
                None => not_found_text(&term),
            },
            CommandResult::ProcessAsMessage(text) => self.generate(&text).await,
        }
    }

    async fn generate(&self, text: &str) -> String {
        let request = GenerationRequest::new(text, self.system_instruction.as_str());
        if request.grounding_queries.is_some() {
            debug!("adding search hints to grounding");
        }

        match self.generation.generate(&request).await {
            Ok(result) => result
                .reply_text()
                .unwrap_or_else(|| EMPTY_RESULT_TEXT.to_string()),
            Err(err) => {
                warn!(error = %err, "generation failed");
                COMMUNICATION_ERROR_TEXT.to_string()
            }
        }
    }
}
