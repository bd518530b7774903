//! Transient status messages
//!
//! A message is shown until its clear timer fires, it is overwritten, or
//! [`MessageStore::clear`] is called. How a new message treats the clear
//! timer of the previous one is decided by [`ClearPolicy`].

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::debug;

/// Auto-clear delay when the caller does not pick one
pub const DEFAULT_MESSAGE_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Success,
    Error,
    #[default]
    Info,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user currently sees. Empty text means nothing is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub kind: MessageKind,
}

impl Message {
    pub fn is_visible(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Fate of a pending clear when a newer message is shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearPolicy {
    /// Abort the earlier clear; each message lives for its own duration
    #[default]
    CancelPrevious,
    /// Leave earlier clears running. A short-lived message shown before a
    /// long-lived one will wipe the long-lived one early.
    Legacy,
}

impl ClearPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CancelPrevious => "cancel_previous",
            Self::Legacy => "legacy",
        }
    }
}

impl FromStr for ClearPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cancel_previous" => Ok(Self::CancelPrevious),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!(
                "Invalid clear policy: {}. Valid options: cancel_previous, legacy",
                other
            )),
        }
    }
}

/// Convert a configured millisecond value; zero or negative means "persist"
pub fn duration_from_millis(ms: i64) -> Duration {
    u64::try_from(ms).map(Duration::from_millis).unwrap_or(Duration::ZERO)
}

/// Observable message holder. Timers run as tokio tasks, so showing a
/// message with a non-zero duration must happen inside a runtime.
#[derive(Clone)]
pub struct MessageStore {
    state: Arc<watch::Sender<Message>>,
    /// Bumped under the state lock each time a message is shown
    shown: Arc<AtomicU64>,
    pending_clear: Arc<Mutex<Option<AbortHandle>>>,
    policy: ClearPolicy,
    default_duration: Duration,
}

impl fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStore")
            .field("message", &*self.state.borrow())
            .field("policy", &self.policy)
            .field("default_duration", &self.default_duration)
            .finish()
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(ClearPolicy::default(), DEFAULT_MESSAGE_DURATION)
    }
}

impl MessageStore {
    pub fn new(policy: ClearPolicy, default_duration: Duration) -> Self {
        let (state, _) = watch::channel(Message::default());
        Self {
            state: Arc::new(state),
            shown: Arc::new(AtomicU64::new(0)),
            pending_clear: Arc::new(Mutex::new(None)),
            policy,
            default_duration,
        }
    }

    pub fn from_config(config: &crate::config::MessageConfig) -> Self {
        Self::new(config.clear_policy, duration_from_millis(config.duration_ms))
    }

    pub fn policy(&self) -> ClearPolicy {
        self.policy
    }

    pub fn subscribe(&self) -> watch::Receiver<Message> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Message {
        self.state.borrow().clone()
    }

    /// Show `text` now and clear it after `duration`.
    ///
    /// A zero duration schedules nothing: the message stays until it is
    /// overwritten or cleared.
    pub fn show_message(&self, text: impl Into<String>, kind: MessageKind, duration: Duration) {
        let text = text.into();
        debug!(kind = %kind, duration_ms = duration.as_millis() as u64, "Showing message");

        if self.policy == ClearPolicy::CancelPrevious {
            self.cancel_pending();
        }

        let mut seq = 0;
        self.state.send_modify(|m| {
            seq = self.shown.fetch_add(1, Ordering::SeqCst) + 1;
            m.text = text;
            m.kind = kind;
        });

        if duration.is_zero() {
            return;
        }

        // Legacy timers clear whatever is showing when they fire
        let expected = (self.policy == ClearPolicy::CancelPrevious).then_some(seq);
        let state = Arc::clone(&self.state);
        let shown = Arc::clone(&self.shown);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            expire(&state, &shown, expected);
        });

        if let Ok(mut pending) = self.pending_clear.lock() {
            *pending = Some(handle.abort_handle());
        }
    }

    /// Show with the configured default duration
    pub fn show(&self, text: impl Into<String>, kind: MessageKind) {
        self.show_message(text, kind, self.default_duration);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.show(text, MessageKind::Success);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.show(text, MessageKind::Error);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.show(text, MessageKind::Info);
    }

    /// Hide the current message and drop any pending clear
    pub fn clear(&self) {
        self.cancel_pending();
        self.state.send_if_modified(|m| {
            let visible = m.is_visible();
            m.text.clear();
            visible
        });
    }

    fn cancel_pending(&self) {
        let previous = self.pending_clear.lock().ok().and_then(|mut p| p.take());
        if let Some(handle) = previous {
            debug!("Cancelling pending message clear");
            handle.abort();
        }
    }
}

/// Clear the message, but only if `expected` is still the latest shown
/// sequence (or unconditionally when it is `None`). Returns whether a
/// visible message was hidden.
fn expire(state: &watch::Sender<Message>, shown: &AtomicU64, expected: Option<u64>) -> bool {
    state.send_if_modified(|m| {
        if expected.is_some_and(|seq| shown.load(Ordering::SeqCst) != seq) {
            debug!("Skipping clear for a replaced message");
            return false;
        }
        let visible = m.is_visible();
        m.text.clear();
        visible
    })
}
