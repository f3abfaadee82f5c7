//! # Tag Reader
//!
//! Abstraction over the NFC hardware (or whatever stands in for it).
//!
//! ## Subscription Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One scan, one subscription                          │
//! │                                                                         │
//! │  reader.scan() ──► TagSubscription ──► next_event() ──► ReaderEvent     │
//! │                          │                                              │
//! │                          │ dropped (tag read, cancel, timeout, error)   │
//! │                          ▼                                              │
//! │                    teardown runs once, receiver closed                  │
//! │                    later tag events are never observed                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use estoque_core::{NdefMessage, NdefRecord};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{ScanError, ScanResult};

/// Buffer size for a single subscription's event channel.
const SUBSCRIPTION_BUFFER: usize = 8;

// =============================================================================
// Reader Events
// =============================================================================

/// What the reader delivers to a waiting session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// A tag was read.
    Reading(NdefMessage),
    /// The reader failed while scanning.
    Error(String),
}

// =============================================================================
// Tag Subscription
// =============================================================================

type Teardown = Box<dyn FnOnce() + Send>;

/// A live read subscription.
///
/// Dropping it stops the read: the teardown hook runs exactly once and the
/// event channel is closed, so a producer sees `send` fail afterwards.
pub struct TagSubscription {
    events: mpsc::Receiver<ReaderEvent>,
    teardown: Option<Teardown>,
}

impl TagSubscription {
    pub fn new(events: mpsc::Receiver<ReaderEvent>) -> Self {
        TagSubscription {
            events,
            teardown: None,
        }
    }

    /// Attaches a hook that releases the underlying reader.
    pub fn with_teardown(mut self, teardown: impl FnOnce() + Send + 'static) -> Self {
        self.teardown = Some(Box::new(teardown));
        self
    }

    /// Waits for the next reader event. `None` means the reader went away.
    pub async fn next_event(&mut self) -> Option<ReaderEvent> {
        self.events.recv().await
    }
}

impl Drop for TagSubscription {
    fn drop(&mut self) {
        self.events.close();
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
        debug!("Tag subscription released");
    }
}

impl std::fmt::Debug for TagSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagSubscription")
            .field("has_teardown", &self.teardown.is_some())
            .finish()
    }
}

// =============================================================================
// Tag Reader Trait
// =============================================================================

/// Source of NFC tag reads.
#[async_trait]
pub trait TagReader: Send + Sync {
    /// Whether this device can read NFC at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Starts listening for the next tag.
    async fn scan(&self) -> ScanResult<TagSubscription>;
}

// =============================================================================
// Channel Reader
// =============================================================================

/// In-memory reader driven by `tap` and `emit`.
///
/// Used by tests and by anything that feeds tag reads from software.
#[derive(Debug, Default)]
pub struct ChannelTagReader {
    unsupported: bool,
    current: Arc<Mutex<Option<mpsc::Sender<ReaderEvent>>>>,
    scans_started: AtomicUsize,
    teardowns: Arc<AtomicUsize>,
}

impl ChannelTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader on a device without NFC.
    pub fn unsupported() -> Self {
        ChannelTagReader {
            unsupported: true,
            ..Self::default()
        }
    }

    /// Presents a tag carrying `text` as a single text record.
    ///
    /// Returns false when nobody is listening.
    pub fn tap(&self, text: &str) -> bool {
        self.emit(ReaderEvent::Reading(NdefMessage::new(vec![
            NdefRecord::text(text),
        ])))
    }

    /// Delivers a raw event to the active subscription, if any.
    pub fn emit(&self, event: ReaderEvent) -> bool {
        let sender = self
            .current
            .lock()
            .expect("reader mutex poisoned")
            .clone();
        match sender {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }

    /// Whether a subscription is currently open.
    pub fn is_listening(&self) -> bool {
        self.current
            .lock()
            .expect("reader mutex poisoned")
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Number of subscriptions handed out.
    pub fn scans_started(&self) -> usize {
        self.scans_started.load(Ordering::SeqCst)
    }

    /// Number of subscriptions torn down.
    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TagReader for ChannelTagReader {
    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    async fn scan(&self) -> ScanResult<TagSubscription> {
        if self.unsupported {
            return Err(ScanError::NfcUnsupported);
        }

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        *self.current.lock().expect("reader mutex poisoned") = Some(tx.clone());
        self.scans_started.fetch_add(1, Ordering::SeqCst);

        let current = Arc::clone(&self.current);
        let teardowns = Arc::clone(&self.teardowns);
        Ok(TagSubscription::new(rx).with_teardown(move || {
            let mut current = current.lock().expect("reader mutex poisoned");
            // A newer subscription may already own the slot.
            if current.as_ref().is_some_and(|c| c.same_channel(&tx)) {
                current.take();
            }
            teardowns.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_receives_tap() {
        let reader = ChannelTagReader::new();
        let mut subscription = reader.scan().await.unwrap();

        assert!(reader.is_listening());
        assert!(reader.tap(r#"{"produto_id": 1}"#));

        match subscription.next_event().await {
            Some(ReaderEvent::Reading(message)) => {
                assert!(message.first_text_record().is_some());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_drop_tears_down_once() {
        let reader = ChannelTagReader::new();
        let subscription = reader.scan().await.unwrap();
        drop(subscription);

        assert_eq!(reader.teardowns(), 1);
        assert!(!reader.is_listening());
        assert!(!reader.tap(r#"{"produto_id": 1}"#));
    }

    #[tokio::test]
    async fn test_tap_without_subscription_is_dropped() {
        let reader = ChannelTagReader::new();
        assert!(!reader.tap("{}"));
        assert_eq!(reader.scans_started(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_reader() {
        let reader = ChannelTagReader::unsupported();
        assert!(!reader.is_supported());
        assert!(matches!(reader.scan().await, Err(ScanError::NfcUnsupported)));
    }

    #[tokio::test]
    async fn test_teardown_hook_runs_on_drop() {
        let (_tx, rx) = mpsc::channel(1);
        let fired = Arc::new(AtomicUsize::new(0));
        let hook = Arc::clone(&fired);

        let subscription = TagSubscription::new(rx).with_teardown(move || {
            hook.fetch_add(1, Ordering::SeqCst);
        });
        drop(subscription);

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
