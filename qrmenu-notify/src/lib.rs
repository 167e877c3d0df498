pub mod action;
pub mod center;
pub mod models;

pub use action::{submit_action, OrderAction, OrderActionClient};
pub use center::{audience, notification_for_order, spawn_countdown, NotificationCenter};
pub use models::{Notification, NotificationState, OrderEvent, OrderSnapshot, Tick};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification not found: {0}")]
    NotFound(uuid::Uuid),

    /// Malformed event data; the action is aborted before any request.
    #[error("Notification payload has no order id")]
    MissingOrderId,

    #[error("An action is already in flight for this notification")]
    AlreadyProcessing,

    #[error("Order action failed: {0}")]
    ActionFailed(String),
}
