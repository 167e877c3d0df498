use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::NotifyError;

/// Seconds a fresh notification stays on screen before auto-dismissal.
pub const DISMISS_SECONDS: u32 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

/// Order snapshot carried in a notification payload. Event data can arrive
/// partial or malformed, so the order id is optional and must be checked
/// before acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub items: Vec<SnapshotItem>,
}

/// Ephemeral notification delivered to staff/vendor clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub data: OrderSnapshot,
}

/// Lifecycle event fanned out to connected clients of the owning vendor.
#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub vendor_id: i64,
    pub notification: Notification,
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still counting down; remaining seconds.
    Running(u32),
    /// Pinned, processing or suspended; the countdown does not move.
    Held,
    /// Reached zero; the notification should be dismissed.
    Dismiss,
}

/// Per-notification countdown record. Mutated only through the transitions
/// below; the owning [`crate::center::NotificationCenter`] never touches the
/// fields directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationState {
    pub countdown_remaining: u32,
    /// User-controlled; halts the countdown indefinitely.
    pub pinned: bool,
    /// An accept/reject action is in flight; blocks re-submission and
    /// freezes the countdown.
    pub processing: bool,
    /// Set after a failed action: the countdown stays frozen at its last
    /// value instead of resuming, so the user can retry without the
    /// notification vanishing underneath them.
    pub suspended: bool,
}

impl NotificationState {
    pub fn new() -> Self {
        Self {
            countdown_remaining: DISMISS_SECONDS,
            pinned: false,
            processing: false,
            suspended: false,
        }
    }

    /// One-second tick. Decrements only while unpinned, idle and not
    /// suspended; signals dismissal when the countdown reaches zero.
    pub fn tick(&mut self) -> Tick {
        if self.pinned || self.processing || self.suspended {
            return Tick::Held;
        }
        if self.countdown_remaining > 0 {
            self.countdown_remaining -= 1;
        }
        if self.countdown_remaining == 0 {
            Tick::Dismiss
        } else {
            Tick::Running(self.countdown_remaining)
        }
    }

    pub fn pin(&mut self) {
        self.pinned = true;
    }

    /// Claim the notification for an in-flight action. Guarantees the
    /// action cannot be issued twice concurrently.
    pub fn start_processing(&mut self) -> Result<(), NotifyError> {
        if self.processing {
            return Err(NotifyError::AlreadyProcessing);
        }
        self.processing = true;
        Ok(())
    }

    /// Release the processing claim. On failure the countdown is left
    /// frozen so the user can retry without the notification vanishing.
    pub fn finish_processing(&mut self, success: bool) {
        self.processing = false;
        if !success {
            self.suspended = true;
        }
    }
}

impl Default for NotificationState {
    fn default() -> Self {
        Self::new()
    }
}
