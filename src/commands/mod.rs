//! Slash-command interception.
//!
//! Input is trimmed and lower-cased before matching. Anything that is not an
//! exact `/help` or a `/wiki <term>` with a non-empty term falls through to
//! the generation path unchanged.

mod registry;

pub use registry::{all_commands, find_command, Command, CommandInvocation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    ShowHelp,
    Lookup(String),
    ProcessAsMessage(String),
}

pub fn process_input(input: &str) -> CommandResult {
    let normalized = input.trim().to_lowercase();

    let Some(rest) = normalized.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    match find_command(command_name) {
        Some(command) => (command.handler)(CommandInvocation { input, args }),
        None => CommandResult::ProcessAsMessage(input.to_string()),
    }
}

pub(super) fn handle_help(invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        CommandResult::ShowHelp
    } else {
        CommandResult::ProcessAsMessage(invocation.input.to_string())
    }
}

pub(super) fn handle_wiki(invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        CommandResult::ProcessAsMessage(invocation.input.to_string())
    } else {
        CommandResult::Lookup(invocation.args.to_string())
    }
}
