//! Channel-based data source.
//!
//! Receives updates pushed by background tasks, such as the pending
//! refresh loop, through a tokio mpsc channel.

use tokio::sync::mpsc::{self, error::TryRecvError};

use super::{DataSource, SourceUpdate};

/// A data source that drains updates sent through a channel.
///
/// # Example
///
/// ```
/// use checkwatch::source::{ChannelSource, DataSource, SourceUpdate};
///
/// let (tx, mut source) = ChannelSource::create("test", 4);
/// tx.try_send(SourceUpdate::Configs(Vec::new())).unwrap();
/// assert!(source.poll().is_some());
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<SourceUpdate>,
    description: String,
    closed: bool,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of an mpsc channel
    /// * `source_description` - Where the updates come from
    pub fn new(receiver: mpsc::Receiver<SourceUpdate>, source_description: &str) -> Self {
        let description = format!("channel: {}", source_description);
        Self {
            receiver,
            description,
            closed: false,
        }
    }

    /// Create a channel pair holding up to `capacity` unread updates.
    pub fn create(source_description: &str, capacity: usize) -> (mpsc::Sender<SourceUpdate>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx, source_description))
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<SourceUpdate> {
        match self.receiver.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.closed.then_some("channel closed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkwatch_types::CheckConfig;

    #[test]
    fn test_channel_source_poll() {
        let (tx, mut source) = ChannelSource::create("test", 4);
        assert_eq!(source.description(), "channel: test");
        assert!(source.poll().is_none());

        tx.try_send(SourceUpdate::Configs(vec![CheckConfig::new(1_000, 0)])).unwrap();
        assert_eq!(
            source.poll(),
            Some(SourceUpdate::Configs(vec![CheckConfig::new(1_000, 0)]))
        );
        assert!(source.poll().is_none());
        assert!(source.error().is_none());

        drop(tx);
        assert!(source.poll().is_none());
        assert_eq!(source.error(), Some("channel closed"));
    }
}
