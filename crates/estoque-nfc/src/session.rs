//! # Scan Session Controller
//!
//! Owns the read lifecycle: one session at a time, from "waiting for a tag"
//! to a terminal outcome.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────┐   scan(mode)   ┌──────────┐   tag read   ┌────────────┐     │
//! │   │ Idle │ ─────────────► │ Scanning │ ───────────► │ Processing │     │
//! │   └──────┘                └────┬─────┘              └─────┬──────┘     │
//! │      ▲                         │                          │            │
//! │      │     cancel / timeout /  │                          │ outcome    │
//! │      │     reader error        │                          │ or error   │
//! │      └─────────────────────────┴──────────────────────────┘            │
//! │                                                                         │
//! │  • scan() while not Idle  → SessionAlreadyActive, active one untouched  │
//! │  • cancel() while Idle    → no-op                                       │
//! │  • cancel() in Processing → API call completes, result discarded        │
//! │  • the tag subscription is dropped before Processing starts             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Events
//! Every scan emits `WaitingForTag` and, once the wait ends, `WaitingCleared`.
//! Terminal results become a `Notice` (none for cancellation) plus any
//! `RefreshRequested` events the outcome calls for.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use estoque_core::{MovementDraft, NdefMessage, NewProduct};
use serde::Serialize;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::InventoryApi;
use crate::config::NfcConfig;
use crate::error::{ConcurrencyError, ScanError, ScanResult};
use crate::events::{Notice, ScanEvent};
use crate::reader::{ReaderEvent, TagReader};
use crate::workflow::{ScanMode, ScanOutcome, ScanWorkflow};

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Session State
// =============================================================================

/// Where the controller is in the read lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Scanning,
    Processing,
}

struct ActiveSession {
    id: Uuid,
    state: SessionState,
    cancel_tx: Option<oneshot::Sender<()>>,
    cancelled: bool,
}

type Slot = Mutex<Option<ActiveSession>>;

/// Clears the slot when a session ends, including when its future is dropped.
struct SessionGuard<'a> {
    slot: &'a Slot,
    id: Uuid,
}

impl SessionGuard<'_> {
    /// Ends the session, returning whether it was cancelled.
    fn release(self) -> bool {
        let session = self
            .slot
            .lock()
            .expect("session mutex poisoned")
            .take_if(|s| s.id == self.id);
        session.is_some_and(|s| s.cancelled)
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            let _ = slot.take_if(|s| s.id == self.id);
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Runs scan sessions against a tag reader and the inventory API.
pub struct ScanSessionController {
    reader: Arc<dyn TagReader>,
    workflow: ScanWorkflow,
    events: broadcast::Sender<ScanEvent>,
    slot: Slot,
    scan_timeout: Duration,
}

impl ScanSessionController {
    pub fn new(
        reader: Arc<dyn TagReader>,
        api: Arc<dyn InventoryApi>,
        scan_timeout: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        ScanSessionController {
            reader,
            workflow: ScanWorkflow::new(api),
            events,
            slot: Mutex::new(None),
            scan_timeout,
        }
    }

    /// Creates a controller using the configured scan deadline.
    pub fn from_config(
        reader: Arc<dyn TagReader>,
        api: Arc<dyn InventoryApi>,
        config: &NfcConfig,
    ) -> Self {
        Self::new(reader, api, config.scan_timeout())
    }

    /// Subscribes to scan events.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.slot
            .lock()
            .expect("session mutex poisoned")
            .as_ref()
            .map_or(SessionState::Idle, |s| s.state)
    }

    pub fn scan_timeout(&self) -> Duration {
        self.scan_timeout
    }

    /// Cancels the active session.
    ///
    /// Returns true if a session was signalled. Safe to call in any state.
    pub fn cancel(&self) -> bool {
        let mut slot = self.slot.lock().expect("session mutex poisoned");
        let Some(session) = slot.as_mut() else {
            debug!("Cancel requested with no active session");
            return false;
        };
        if session.cancelled {
            return false;
        }

        session.cancelled = true;
        if let Some(tx) = session.cancel_tx.take() {
            let _ = tx.send(());
        }
        info!(session_id = %session.id, state = ?session.state, "Scan session cancelled");
        true
    }

    /// Runs one scan session for `mode`.
    pub async fn scan(&self, mode: ScanMode) -> ScanResult<ScanOutcome> {
        if !self.reader.is_supported() {
            return self.report(Err(ScanError::NfcUnsupported));
        }

        let (guard, cancel_rx) = match self.begin() {
            Ok(started) => started,
            Err(e) => {
                warn!("Scan requested while a session is active");
                return self.report(Err(e));
            }
        };
        let session_id = guard.id;
        info!(%session_id, %mode, "Scan session started");

        let result = self.run(session_id, mode, cancel_rx).await;

        let result = if guard.release() {
            if result.is_ok() {
                info!(%session_id, "Discarding result of cancelled session");
            }
            Err(ScanError::Cancelled)
        } else {
            result
        };

        debug!(%session_id, ok = result.is_ok(), "Scan session ended");
        self.report(result)
    }

    /// Confirms a movement drafted by an earlier scan.
    pub async fn confirm_movement(&self, draft: &MovementDraft) -> ScanResult<ScanOutcome> {
        let result = self.workflow.confirm_movement(draft).await;
        self.report(result)
    }

    /// Registers a product read by an earlier scan.
    pub async fn confirm_product(&self, product: NewProduct) -> ScanResult<ScanOutcome> {
        let result = self.workflow.confirm_product(product).await;
        self.report(result)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn begin(&self) -> ScanResult<(SessionGuard<'_>, oneshot::Receiver<()>)> {
        let mut slot = self.slot.lock().expect("session mutex poisoned");
        if slot.is_some() {
            return Err(ConcurrencyError::SessionAlreadyActive.into());
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let id = Uuid::new_v4();
        *slot = Some(ActiveSession {
            id,
            state: SessionState::Scanning,
            cancel_tx: Some(cancel_tx),
            cancelled: false,
        });

        Ok((
            SessionGuard {
                slot: &self.slot,
                id,
            },
            cancel_rx,
        ))
    }

    async fn run(
        &self,
        session_id: Uuid,
        mode: ScanMode,
        cancel_rx: oneshot::Receiver<()>,
    ) -> ScanResult<ScanOutcome> {
        let message = self.await_tag(session_id, mode, cancel_rx).await?;

        if !self.enter_processing(session_id) {
            return Err(ScanError::Cancelled);
        }
        debug!(%session_id, "Processing tag");

        self.workflow.process(mode, &message).await
    }

    /// Waits for one tag, a cancel signal or the deadline, whichever is first.
    async fn await_tag(
        &self,
        session_id: Uuid,
        mode: ScanMode,
        mut cancel_rx: oneshot::Receiver<()>,
    ) -> ScanResult<NdefMessage> {
        let deadline = tokio::time::sleep(self.scan_timeout);
        tokio::pin!(deadline);

        self.emit(ScanEvent::WaitingForTag {
            session_id,
            prompt: mode.prompt().to_string(),
        });

        // Starting the reader counts against the deadline and can be cancelled.
        // The subscription lives inside this future and is torn down with it.
        let read_tag = async {
            let mut subscription = self.reader.scan().await?;
            match subscription.next_event().await {
                Some(ReaderEvent::Reading(message)) => Ok(message),
                Some(ReaderEvent::Error(reason)) => Err(ScanError::Reader(reason)),
                None => Err(ScanError::Reader("tag reader closed".to_string())),
            }
        };

        let read = tokio::select! {
            read = read_tag => read,
            _ = &mut cancel_rx => Err(ScanError::Cancelled),
            _ = &mut deadline => {
                warn!(%session_id, timeout = ?self.scan_timeout, "No tag read before deadline");
                Err(ScanError::Timeout(self.scan_timeout))
            }
        };

        self.emit(ScanEvent::WaitingCleared { session_id });
        read
    }

    fn enter_processing(&self, session_id: Uuid) -> bool {
        let mut slot = self.slot.lock().expect("session mutex poisoned");
        match slot.as_mut() {
            Some(session) if session.id == session_id && !session.cancelled => {
                session.state = SessionState::Processing;
                true
            }
            _ => false,
        }
    }

    /// Turns a terminal result into events and hands it back.
    fn report(&self, result: ScanResult<ScanOutcome>) -> ScanResult<ScanOutcome> {
        match &result {
            Ok(outcome) => {
                self.emit(ScanEvent::Notice(outcome.notice()));
                for view in outcome.refreshes() {
                    self.emit(ScanEvent::RefreshRequested { view: *view });
                }
            }
            Err(err) => {
                if !err.is_benign() {
                    warn!(error = %err, "Scan failed");
                }
                if let Some(notice) = Notice::from_error(err) {
                    self.emit(ScanEvent::Notice(notice));
                }
            }
        }
        result
    }

    fn emit(&self, event: ScanEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
