use chrono::Local;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};

/// Plain-text transcript log enabled with `--log <file>`. Without a file
/// every write is a no-op.
pub struct LoggingState {
    file_path: Option<String>,
}

impl LoggingState {
    pub fn new(log_file: Option<String>) -> Self {
        LoggingState {
            file_path: log_file,
        }
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        // Test if we can create/write to the file
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.flush()?;

        let status = format!("Logging enabled to: {path}");
        self.file_path = Some(path);
        Ok(status)
    }

    /// Writes a `## Session started ...` marker.
    pub fn start_session(&self) -> Result<(), Box<dyn std::error::Error>> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.log_message(&format!("## Session started {stamp}"))
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        match &self.file_path {
            Some(path) => Self::write_to_log(path, content),
            None => Ok(()),
        }
    }

    fn write_to_log(file_path: &str, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        let mut writer = BufWriter::new(file);

        // Write each line of content, preserving the exact formatting
        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }

        // Empty line after each message, matching the screen
        writeln!(writer)?;

        writer.flush()?;
        Ok(())
    }
}
