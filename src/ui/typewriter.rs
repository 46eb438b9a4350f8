use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::message::{Message, TranscriptRole};
use crate::core::retry::Sleeper;

/// Receives the final text of each turn. Owns the transcript, which only
/// ever grows.
#[async_trait]
pub trait PresentationSink: Send {
    fn append_message(&mut self, text: &str, role: TranscriptRole) -> io::Result<()>;

    /// Returns once the whole text has been revealed.
    async fn begin_typewriter(&mut self, text: &str, role: TranscriptRole) -> io::Result<()>;

    /// Shown while a reply is being resolved.
    fn show_pending(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn clear_pending(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn transcript(&self) -> &[Message];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterTiming {
    pub char_delay: Duration,
    /// Used after a `.` instead of `char_delay`.
    pub pause_delay: Duration,
}

impl TypewriterTiming {
    pub fn instant() -> Self {
        Self {
            char_delay: Duration::ZERO,
            pause_delay: Duration::ZERO,
        }
    }

    pub fn delay_after(&self, ch: char) -> Duration {
        if ch == '.' {
            self.pause_delay
        } else {
            self.char_delay
        }
    }
}

const PENDING_INDICATOR: &str = "🤖 …";

/// Writes the transcript to a terminal-like writer.
pub struct TerminalSink<W: Write + Send> {
    out: W,
    sleeper: Arc<dyn Sleeper>,
    timing: TypewriterTiming,
    transcript: Vec<Message>,
    pending: bool,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W, sleeper: Arc<dyn Sleeper>, timing: TypewriterTiming) -> Self {
        Self {
            out,
            sleeper,
            timing,
            transcript: Vec::new(),
            pending: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> PresentationSink for TerminalSink<W> {
    fn append_message(&mut self, text: &str, role: TranscriptRole) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        writeln!(self.out)?;
        self.out.flush()?;
        self.transcript.push(Message::new(role, text));
        Ok(())
    }

    async fn begin_typewriter(&mut self, text: &str, role: TranscriptRole) -> io::Result<()> {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.out.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
            self.out.flush()?;
            self.sleeper.sleep(self.timing.delay_after(ch)).await;
        }
        writeln!(self.out)?;
        writeln!(self.out)?;
        self.out.flush()?;
        self.transcript.push(Message::new(role, text));
        Ok(())
    }

    fn show_pending(&mut self) -> io::Result<()> {
        write!(self.out, "{PENDING_INDICATOR}")?;
        self.out.flush()?;
        self.pending = true;
        Ok(())
    }

    fn clear_pending(&mut self) -> io::Result<()> {
        if self.pending {
            // Return to column 0 and erase the indicator line.
            write!(self.out, "\r\x1b[2K")?;
            self.out.flush()?;
            self.pending = false;
        }
        Ok(())
    }

    fn transcript(&self) -> &[Message] {
        &self.transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::RecordingSleeper;

    fn timing() -> TypewriterTiming {
        TypewriterTiming {
            char_delay: Duration::from_millis(25),
            pause_delay: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn typewriter_pauses_longer_after_periods() {
        let sleeper = RecordingSleeper::new();
        let mut sink = TerminalSink::new(Vec::new(), sleeper.clone(), timing());

        sink.begin_typewriter("Oui.", TranscriptRole::Assistant)
            .await
            .unwrap();

        assert_eq!(
            sleeper.recorded(),
            vec![
                Duration::from_millis(25),
                Duration::from_millis(25),
                Duration::from_millis(25),
                Duration::from_millis(100)
            ]
        );
        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "Oui.\n\n");
    }

    #[tokio::test]
    async fn typewriter_counts_characters_not_bytes() {
        let sleeper = RecordingSleeper::new();
        let mut sink = TerminalSink::new(Vec::new(), sleeper.clone(), timing());

        sink.begin_typewriter("🤖 é", TranscriptRole::Assistant)
            .await
            .unwrap();

        assert_eq!(sleeper.recorded().len(), 3);
        assert_eq!(sink.transcript()[0].content, "🤖 é");
    }

    #[tokio::test]
    async fn transcript_keeps_append_order() {
        let mut sink = TerminalSink::new(
            Vec::new(),
            RecordingSleeper::new(),
            TypewriterTiming::instant(),
        );

        sink.append_message("👤 salut", TranscriptRole::User).unwrap();
        sink.show_pending().unwrap();
        sink.clear_pending().unwrap();
        sink.begin_typewriter("🤖 bonjour", TranscriptRole::Assistant)
            .await
            .unwrap();

        let roles: Vec<_> = sink.transcript().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![TranscriptRole::User, TranscriptRole::Assistant]);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("👤 salut\n\n🤖 …\r\x1b[2K🤖 bonjour"));
    }

    #[test]
    fn clearing_without_pending_writes_nothing() {
        let mut sink = TerminalSink::new(
            Vec::new(),
            RecordingSleeper::new(),
            TypewriterTiming::instant(),
        );
        sink.clear_pending().unwrap();
        assert!(sink.into_inner().is_empty());
    }
}
