mod typewriter;

pub use typewriter::{PresentationSink, TerminalSink, TypewriterTiming};
