use std::fmt;
use std::io::{self, BufRead, Write};

const TOKEN_PROMPT: &str = "Enter your Gemini API key: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationChoice {
    Yes,
    No,
}

#[derive(Debug, Clone)]
pub struct UiError {
    message: String,
}

impl UiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UiError {}

fn read_line(prompt: &str) -> Result<String, UiError> {
    print!("{prompt}");
    io::stdout()
        .flush()
        .map_err(|err| UiError::new(err.to_string()))?;
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| UiError::new(err.to_string()))?;
    if read == 0 {
        return Err(UiError::new("Input closed"));
    }
    Ok(line.trim().to_string())
}

pub fn prompt_token() -> Result<String, UiError> {
    println!("🔐 Bavard Authentication Setup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("Keys can be created at https://aistudio.google.com/apikey");
    read_line(TOKEN_PROMPT)
}

pub fn prompt_confirmation(question: &str) -> Result<ConfirmationChoice, UiError> {
    let answer = read_line(&format!("{question} [y/N]: "))?;
    parse_confirmation(&answer)
}

pub fn parse_confirmation(input: &str) -> Result<ConfirmationChoice, UiError> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return Ok(ConfirmationChoice::No);
    }
    match trimmed.as_str() {
        "y" | "yes" | "o" | "oui" => Ok(ConfirmationChoice::Yes),
        "n" | "no" | "non" => Ok(ConfirmationChoice::No),
        _ => Err(UiError::new("Invalid confirmation response")),
    }
}
