//! One chat session: the per-turn ordering between transcript and router.

use std::io;

use tracing::warn;

use crate::core::constants::{ASSISTANT_PREFIX, USER_PREFIX, WELCOME_TEXT};
use crate::core::message::TranscriptRole;
use crate::core::router::ResponseRouter;
use crate::ui::PresentationSink;
use crate::utils::logging::LoggingState;

pub struct ChatSession<S: PresentationSink> {
    router: ResponseRouter,
    sink: S,
    logging: LoggingState,
}

impl<S: PresentationSink> ChatSession<S> {
    pub fn new(router: ResponseRouter, sink: S, logging: LoggingState) -> Self {
        Self {
            router,
            sink,
            logging,
        }
    }

    pub fn welcome(&mut self) -> io::Result<()> {
        self.sink
            .append_message(WELCOME_TEXT, TranscriptRole::Assistant)
    }

    /// Runs one turn. Returns `false` when the input was blank and ignored.
    ///
    /// The user message is in the transcript before the reply is requested,
    /// and the reply is fully resolved before its reveal starts.
    pub async fn send_message(&mut self, input: &str) -> io::Result<bool> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(false);
        }

        let user_line = format!("{USER_PREFIX} {input}");
        self.sink.append_message(&user_line, TranscriptRole::User)?;
        self.log(&user_line);

        self.sink.show_pending()?;
        let reply = self.router.route(input).await;
        self.sink.clear_pending()?;

        let reply_line = format!("{ASSISTANT_PREFIX} {reply}");
        self.sink
            .begin_typewriter(&reply_line, TranscriptRole::Assistant)
            .await?;
        self.log(&reply_line);
        Ok(true)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn log(&self, line: &str) {
        if let Err(err) = self.logging.log_message(line) {
            warn!(error = %err, "failed to write transcript log");
        }
    }
}
