//! Progress reporting for long extractions

use tokio::sync::mpsc;
use tracing::debug;

/// A stage of an extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Sources are being normalized
    Normalizing,
    /// A request is on its way to the backend
    SendingToModel {
        /// Model attempt, from 1
        attempt: u32,
    },
    /// A call or attempt failed and will be repeated
    Retrying {
        /// Why
        reason: String,
    },
    /// Model output is being parsed
    Parsing,
    /// A document is being validated
    Validating,
    /// Candidates from several sources are being merged
    Merging,
    /// Extraction finished
    Done,
}

impl ProgressEvent {
    /// Short stage label
    pub fn stage(&self) -> &'static str {
        match self {
            ProgressEvent::Normalizing => "normalizing",
            ProgressEvent::SendingToModel { .. } => "sending",
            ProgressEvent::Retrying { .. } => "retrying",
            ProgressEvent::Parsing => "parsing",
            ProgressEvent::Validating => "validating",
            ProgressEvent::Merging => "merging",
            ProgressEvent::Done => "done",
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    /// Handle one event; must not block
    fn emit(&self, event: ProgressEvent);
}

/// Discards events
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, event: ProgressEvent) {
        debug!(stage = event.stage(), "Extraction progress");
    }
}

/// Forwards events to a channel
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    /// Create a sink and the receiving end
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&self, event: ProgressEvent) {
        debug!(stage = event.stage(), "Extraction progress");
        // a dropped receiver means nobody is listening any more
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_progress_delivers_in_order() {
        let (sink, mut receiver) = ChannelProgress::new();
        sink.emit(ProgressEvent::Normalizing);
        sink.emit(ProgressEvent::SendingToModel { attempt: 1 });
        sink.emit(ProgressEvent::Done);

        assert_eq!(receiver.try_recv().unwrap(), ProgressEvent::Normalizing);
        assert_eq!(receiver.try_recv().unwrap().stage(), "sending");
        assert_eq!(receiver.try_recv().unwrap(), ProgressEvent::Done);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (sink, receiver) = ChannelProgress::new();
        drop(receiver);
        sink.emit(ProgressEvent::Parsing);
    }
}
