//! Outbound player notifications.
//!
//! Engine operations never talk to the transport while holding the world
//! lock. They push [`Notice`]s into an [`Outbox`] during the mutation, and
//! the engine hands the collected batch to a [`Notifier`] after the lock is
//! released.
//!
//! # Error Handling
//!
//! Delivery is fire-and-forget. A failed send is logged at `warn` and the
//! remaining notices are still delivered; errors never reach the caller of
//! the engine operation.

use crate::state::PlayerId;
use thiserror::Error;

/// Rendering hint for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub recipient: PlayerId,
    pub text: String,
    pub format: TextFormat,
}

/// Errors a transport may report.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The recipient blocked the bot or no longer exists
    #[error("Recipient {0} unreachable")]
    Unreachable(PlayerId),
    /// Anything else the transport failed at
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Delivers text to a player.
///
/// Implementations must be `Send + Sync`; the engine calls them from whatever
/// thread finished the operation.
pub trait Notifier: Send + Sync {
    fn send(&self, recipient: PlayerId, text: &str, format: TextFormat)
        -> Result<(), NotifyError>;
}

/// Notifier that only writes to the log. Used by the headless driver.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, recipient: PlayerId, text: &str, _format: TextFormat) -> Result<(), NotifyError> {
        log::debug!("-> {}: {}", recipient, text);
        Ok(())
    }
}

/// Notices collected during one locked mutation.
#[derive(Debug, Default)]
pub struct Outbox {
    notices: Vec<Notice>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, recipient: PlayerId, text: impl Into<String>) {
        self.notices.push(Notice {
            recipient,
            text: text.into(),
            format: TextFormat::Plain,
        });
    }

    pub fn push_markdown(&mut self, recipient: PlayerId, text: impl Into<String>) {
        self.notices.push(Notice {
            recipient,
            text: text.into(),
            format: TextFormat::Markdown,
        });
    }

    pub fn broadcast<I>(&mut self, recipients: I, text: &str)
    where
        I: IntoIterator<Item = PlayerId>,
    {
        for recipient in recipients {
            self.push(recipient, text);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn into_notices(self) -> Vec<Notice> {
        self.notices
    }
}

/// Sends every notice, logging failures. Returns how many were delivered.
pub fn deliver(notifier: &dyn Notifier, notices: Vec<Notice>) -> usize {
    let mut delivered = 0;
    for notice in notices {
        match notifier.send(notice.recipient, &notice.text, notice.format) {
            Ok(()) => delivered += 1,
            Err(e) => log::warn!("Notification to {} failed: {}", notice.recipient, e),
        }
    }
    delivered
}
