//! # Scan Station
//!
//! Runs NFC scan sessions one after another, reading tag payloads from
//! standard input and recording stock movements through the inventory API.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scan Station Startup                             │
//! │                                                                         │
//! │  1. Initialize Logging  (RUST_LOG, default info,estoque=debug)          │
//! │  2. Load NfcConfig      (defaults → nfc.toml → ESTOQUE_* env)           │
//! │  3. Build HTTP client   (base URL + request timeout)                    │
//! │  4. Start stdin reader and event printer                                │
//! │  5. Scan loop           (Ctrl+C cancels the running scan and exits)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```text
//! scan-station [--config <path>] [--mode movement|lookup|register]
//! ```

mod line_reader;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use estoque_nfc::{
    HttpInventoryApi, NfcConfig, NoticeLevel, ScanError, ScanEvent, ScanMode, ScanOutcome,
    ScanSessionController,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::line_reader::LineTagReader;

/// Command line options.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    mode: Option<ScanMode>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Args::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().context("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--mode" => {
                    let mode = args.next().context("--mode needs a value")?;
                    parsed.mode = Some(mode.parse()?);
                }
                other => bail!("unknown argument: {}", other),
            }
        }
        Ok(parsed)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse(std::env::args().skip(1))?;
    let mut config = NfcConfig::load_or_default(args.config);
    if let Some(mode) = args.mode {
        config.scan.mode = mode;
    }
    let mode = config.scan.mode;

    let api = Arc::new(HttpInventoryApi::new(&config.api).context("invalid API settings")?);
    let reader = Arc::new(LineTagReader::stdin());
    let controller = ScanSessionController::from_config(reader.clone(), api.clone(), &config);

    info!(
        api = %api.base_url(),
        %mode,
        timeout = ?controller.scan_timeout(),
        "Starting scan station"
    );

    let printer = tokio::spawn(print_events(controller.subscribe(), std::io::stdout()));

    loop {
        let scan = controller.scan(mode);
        tokio::pin!(scan);

        let finished = tokio::select! {
            result = &mut scan => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        let result = match finished {
            Some(result) => result,
            None => {
                controller.cancel();
                let _ = scan.await;
                info!("Interrupted, shutting down");
                break;
            }
        };

        match result {
            Ok(ScanOutcome::MovementPending(draft)) => {
                if confirm(&reader, "Record this movement? [s/N]").await {
                    if let Err(e) = controller.confirm_movement(&draft).await {
                        debug!(error = %e, "Movement not recorded");
                    }
                }
            }
            Ok(ScanOutcome::ProductPending(product)) => {
                if confirm(&reader, "Register this product? [s/N]").await {
                    if let Err(e) = controller.confirm_product(product).await {
                        debug!(error = %e, "Product not registered");
                    }
                }
            }
            Ok(_) => {}
            Err(ScanError::Reader(_)) if reader.is_exhausted() => break,
            Err(e) => debug!(error = %e, "Scan ended without an outcome"),
        }

        if reader.is_exhausted() {
            break;
        }
    }

    // Closing the event channel lets the printer drain what is left and exit.
    drop(controller);
    if let Err(e) = printer.await {
        debug!(error = %e, "Event printer failed");
    }
    info!("Scan station stopped");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=estoque_nfc=trace` - Trace the scan workflow only
/// - Default: `info,estoque=debug`
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,estoque=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Asks a yes/no question on the terminal. Only "s"/"sim"/"y"/"yes" confirm.
async fn confirm(reader: &LineTagReader, question: &str) -> bool {
    println!("{}", question);
    match reader.next_line().await {
        Some(answer) => matches!(
            answer.trim().to_lowercase().as_str(),
            "s" | "sim" | "y" | "yes"
        ),
        None => false,
    }
}

/// Operator-facing line for an event, if it has one.
fn render(event: &ScanEvent) -> Option<String> {
    match event {
        ScanEvent::WaitingForTag { prompt, .. } => Some(format!("... {}", prompt)),
        ScanEvent::WaitingCleared { .. } => None,
        ScanEvent::Notice(notice) => {
            let tag = match notice.level {
                NoticeLevel::Success => "OK",
                NoticeLevel::Info => "INFO",
                NoticeLevel::Warning => "WARN",
                NoticeLevel::Error => "ERROR",
            };
            Some(format!("[{}] {}", tag, notice.message))
        }
        ScanEvent::RefreshRequested { view } => {
            debug!(?view, "Refresh requested");
            None
        }
    }
}

/// Prints scan events until every sender is gone.
async fn print_events<W: Write>(mut events: broadcast::Receiver<ScanEvent>, mut out: W) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let Some(line) = render(&event) else { continue };
                if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
                    warn!(error = %e, "Failed to print scan event");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estoque_nfc::{Notice, View};

    fn args(list: &[&str]) -> anyhow::Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["--config", "/tmp/nfc.toml", "--mode", "lookup"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("/tmp/nfc.toml")));
        assert_eq!(parsed.mode, Some(ScanMode::Lookup));

        assert!(args(&[]).unwrap().mode.is_none());
        assert!(args(&["--mode"]).is_err());
        assert!(args(&["--mode", "inventario"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }

    #[tokio::test]
    async fn test_printer_drains_events_sent_before_close() {
        let (events, rx) = broadcast::channel(16);
        events
            .send(ScanEvent::Notice(Notice::success("Entrada registrada")))
            .unwrap();
        events
            .send(ScanEvent::RefreshRequested { view: View::Stock })
            .unwrap();
        events
            .send(ScanEvent::Notice(Notice::error("Estoque insuficiente")))
            .unwrap();
        drop(events);

        let mut out = Vec::new();
        print_events(rx, &mut out).await;

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(
            printed,
            "[OK] Entrada registrada\n[ERROR] Estoque insuficiente\n"
        );
    }
}
