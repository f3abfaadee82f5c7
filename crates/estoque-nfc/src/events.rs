//! # Scan Events
//!
//! Everything a front end needs to reflect a scan: the waiting indicator,
//! user notices and which views to reload.
//!
//! Events go out on a `tokio::sync::broadcast` channel owned by the session
//! controller. A lagging or absent subscriber never blocks a scan.

use serde::Serialize;
use uuid::Uuid;

use crate::error::ScanError;

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// The notice shown for a failed scan, if any.
    ///
    /// Cancellation is user-initiated and stays silent; a timeout is a
    /// warning; everything else is an error carrying the error's message.
    pub fn from_error(err: &ScanError) -> Option<Self> {
        match err {
            ScanError::Cancelled => None,
            ScanError::Timeout(_) => Some(Notice::warning(err.to_string())),
            other => Some(Notice::error(other.to_string())),
        }
    }
}

/// Views a front end keeps in sync with the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Catalog,
    Stock,
}

/// Event emitted by the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    /// Show the waiting indicator.
    WaitingForTag { session_id: Uuid, prompt: String },
    /// Hide the waiting indicator.
    WaitingCleared { session_id: Uuid },
    Notice(Notice),
    RefreshRequested { view: View },
}
