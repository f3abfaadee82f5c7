//! `TagReader` fed by lines of text, one tag payload per line.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use estoque_core::{NdefMessage, NdefRecord};
use estoque_nfc::{ReaderEvent, ScanResult, TagReader, TagSubscription};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Reported to a waiting session once input has ended.
pub const INPUT_CLOSED: &str = "input closed";

pub struct LineTagReader {
    lines: Arc<Mutex<LineSource>>,
    exhausted: Arc<AtomicBool>,
}

/// Input lines plus one line a closed scan could not take.
struct LineSource {
    rx: mpsc::Receiver<String>,
    held_back: Option<String>,
}

impl LineSource {
    async fn next(&mut self) -> Option<String> {
        match self.held_back.take() {
            Some(line) => Some(line),
            None => self.rx.recv().await,
        }
    }

    /// Hands the next tag line to a scan.
    ///
    /// A line that arrives after the scan was torn down is kept for the next
    /// reader of the source.
    async fn forward(&mut self, tx: &mpsc::Sender<ReaderEvent>, exhausted: &AtomicBool) {
        loop {
            let line = tokio::select! {
                line = self.next() => line,
                _ = tx.closed() => return,
            };
            let event = match &line {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    ReaderEvent::Reading(NdefMessage::new(vec![NdefRecord::text(line.trim())]))
                }
                None => {
                    exhausted.store(true, Ordering::SeqCst);
                    ReaderEvent::Error(INPUT_CLOSED.to_string())
                }
            };
            if tx.try_send(event).is_err() {
                if let Some(line) = line {
                    warn!(%line, "Scan ended before the line was read, keeping it");
                    self.held_back = Some(line);
                }
            }
            return;
        }
    }
}

impl LineTagReader {
    /// Reads lines from standard input on a background task.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read standard input");
                        break;
                    }
                }
            }
            debug!("Standard input closed");
        });
        Self::from_channel(rx)
    }

    pub fn from_channel(lines: mpsc::Receiver<String>) -> Self {
        LineTagReader {
            lines: Arc::new(Mutex::new(LineSource {
                rx: lines,
                held_back: None,
            })),
            exhausted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Next non-tag line, used for confirmation prompts.
    pub async fn next_line(&self) -> Option<String> {
        let line = self.lines.lock().await.next().await;
        if line.is_none() {
            self.exhausted.store(true, Ordering::SeqCst);
        }
        line
    }

    /// Whether input has ended.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TagReader for LineTagReader {
    async fn scan(&self) -> ScanResult<TagSubscription> {
        let (tx, rx) = mpsc::channel(1);
        let lines = Arc::clone(&self.lines);
        let exhausted = Arc::clone(&self.exhausted);

        let forwarder = tokio::spawn(async move {
            lines.lock().await.forward(&tx, &exhausted).await;
        });

        Ok(TagSubscription::new(rx).with_teardown(move || forwarder.abort()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_line_becomes_text_record() {
        let (tx, rx) = mpsc::channel(4);
        let reader = LineTagReader::from_channel(rx);

        tx.send("   ".to_string()).await.unwrap();
        tx.send(r#"  {"produto_id": 7}  "#.to_string()).await.unwrap();

        let mut subscription = reader.scan().await.unwrap();
        let Some(ReaderEvent::Reading(message)) = subscription.next_event().await else {
            panic!("expected a tag reading");
        };
        let record = message.first_text_record().unwrap();
        assert_eq!(record.data, br#"{"produto_id": 7}"#.to_vec());
    }

    #[tokio::test]
    async fn test_end_of_input_is_reported() {
        let (tx, rx) = mpsc::channel::<String>(1);
        let reader = LineTagReader::from_channel(rx);
        drop(tx);

        let mut subscription = reader.scan().await.unwrap();
        assert_eq!(
            subscription.next_event().await,
            Some(ReaderEvent::Error(INPUT_CLOSED.to_string()))
        );
        assert!(reader.is_exhausted());
    }

    #[tokio::test]
    async fn test_lines_left_for_prompts_after_teardown() {
        let (tx, rx) = mpsc::channel(4);
        let reader = LineTagReader::from_channel(rx);

        let subscription = reader.scan().await.unwrap();
        drop(subscription);

        tx.send("s".to_string()).await.unwrap();
        assert_eq!(reader.next_line().await.as_deref(), Some("s"));
    }

    #[tokio::test]
    async fn test_line_read_after_scan_closed_is_kept() {
        let (tx, rx) = mpsc::channel(4);
        let reader = LineTagReader::from_channel(rx);
        tx.send(r#"{"produto_id": 7}"#.to_string()).await.unwrap();
        tx.send("s".to_string()).await.unwrap();

        let (events_tx, events_rx) = mpsc::channel(1);
        events_tx.try_send(ReaderEvent::Error("busy".into())).unwrap();
        {
            let mut source = reader.lines.lock().await;
            source.forward(&events_tx, &reader.exhausted).await;
        }
        drop(events_rx);

        assert_eq!(
            reader.next_line().await.as_deref(),
            Some(r#"{"produto_id": 7}"#)
        );
        assert_eq!(reader.next_line().await.as_deref(), Some("s"));
    }

    #[tokio::test]
    async fn test_closed_scan_keeps_line() {
        let (tx, rx) = mpsc::channel(4);
        let reader = LineTagReader::from_channel(rx);
        tx.send("s".to_string()).await.unwrap();

        let (events_tx, events_rx) = mpsc::channel(1);
        drop(events_rx);
        reader
            .lines
            .lock()
            .await
            .forward(&events_tx, &reader.exhausted)
            .await;

        assert_eq!(reader.next_line().await.as_deref(), Some("s"));
        assert!(!reader.is_exhausted());
    }
}
