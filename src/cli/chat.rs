//! Interactive line-oriented chat on stdin/stdout.

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::commands::all_commands;
use crate::core::retry::TokioSleeper;
use crate::core::router::ResponseRouter;
use crate::core::session::ChatSession;
use crate::ui::{TerminalSink, TypewriterTiming};
use crate::utils::logging::LoggingState;

const INPUT_PROMPT: &str = "› ";

/// One-line reminder of the local commands shown under the greeting.
pub fn command_hint() -> String {
    let usages: Vec<&str> = all_commands().iter().map(|cmd| cmd.usage).collect();
    format!("Commandes : {}, /quit", usages.join(", "))
}

pub fn is_quit(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "/quit" | "/exit")
}

pub async fn run_chat(
    router: ResponseRouter,
    timing: TypewriterTiming,
    log: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut logging = LoggingState::new(None);
    if let Some(path) = log {
        let status = logging.set_log_file(path)?;
        eprintln!("{status}");
        logging.start_session()?;
    }

    let sink = TerminalSink::new(io::stdout(), Arc::new(TokioSleeper), timing);
    let mut session = ChatSession::new(router, sink, logging);
    session.welcome()?;
    println!("{}", command_hint());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{INPUT_PROMPT}");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            debug!("stdin closed, leaving chat");
            println!();
            break;
        };
        if is_quit(&line) {
            break;
        }
        session.send_message(&line).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_lists_every_command_usage() {
        assert_eq!(command_hint(), "Commandes : /help, /wiki <terme>, /quit");
    }

    #[test]
    fn quit_is_case_insensitive() {
        assert!(is_quit("/quit"));
        assert!(is_quit("  /QUIT "));
        assert!(is_quit("/exit"));
        assert!(!is_quit("/quitter"));
        assert!(!is_quit("quit"));
    }
}
