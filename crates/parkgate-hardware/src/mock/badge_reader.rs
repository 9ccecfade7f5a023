//! Mock RFID badge reader for testing and development.
//!
//! Cards are presented through a [`MockBadgeReaderHandle`] and delivered to
//! the reader over a bounded channel, one card per poll.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use crate::{BadgeReader, CardRead, HardwareError, Result};

/// Pending presentations buffered between handle and reader.
const CHANNEL_CAPACITY: usize = 32;

/// Mock badge reader.
///
/// # Examples
///
/// ```
/// use parkgate_hardware::BadgeReader;
/// use parkgate_hardware::mock::MockBadgeReader;
///
/// let (mut reader, handle) = MockBadgeReader::new();
/// assert!(reader.poll_badge().unwrap().is_none());
///
/// handle.present(vec![0x1C, 0x21, 0x09, 0x49]).unwrap();
/// let card = reader.poll_badge().unwrap().unwrap();
/// assert_eq!(card.uid_hex(), "1C:21:09:49");
/// ```
#[derive(Debug)]
pub struct MockBadgeReader {
    event_rx: mpsc::Receiver<CardRead>,
}

impl MockBadgeReader {
    /// Create a reader and the handle used to present cards to it.
    pub fn new() -> (Self, MockBadgeReaderHandle) {
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        (Self { event_rx }, MockBadgeReaderHandle { event_tx })
    }
}

impl BadgeReader for MockBadgeReader {
    fn poll_badge(&mut self) -> Result<Option<CardRead>> {
        match self.event_rx.try_recv() {
            Ok(card) => Ok(Some(card)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected("mock badge reader"))
            }
        }
    }
}

/// Handle for presenting cards to a [`MockBadgeReader`].
#[derive(Debug, Clone)]
pub struct MockBadgeReaderHandle {
    event_tx: mpsc::Sender<CardRead>,
}

impl MockBadgeReaderHandle {
    /// Present a card; it is reported by the next poll.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID is malformed, the reader was dropped, or
    /// too many presentations are pending.
    pub fn present(&self, uid: Vec<u8>) -> Result<()> {
        let card = CardRead::new(uid)?;
        self.event_tx.try_send(card).map_err(|e| match e {
            TrySendError::Full(_) => HardwareError::bus("badge queue full"),
            TrySendError::Closed(_) => HardwareError::disconnected("mock badge reader"),
        })
    }

    /// Whether the reader side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.event_tx.is_closed()
    }
}
