use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use qrmenu_order::models::{Order, OrderStatus};
use qrmenu_order::repository::RepositoryError;

use crate::center::NotificationCenter;
use crate::NotifyError;

/// Accept/reject choice presented on a new-order notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Accept,
    Reject,
}

impl OrderAction {
    pub fn target_status(self) -> OrderStatus {
        match self {
            OrderAction::Accept => OrderStatus::Accepted,
            OrderAction::Reject => OrderStatus::Rejected,
        }
    }
}

/// The status-update request a client issues against the backend. The
/// server side validates the transition atomically; the losing request of a
/// race gets a conflict error back.
#[async_trait]
pub trait OrderActionClient: Send + Sync {
    async fn update_status(
        &self,
        order_id: i64,
        target: OrderStatus,
    ) -> Result<Order, RepositoryError>;
}

/// Run the accept/reject protocol for one notification.
///
/// A missing order id in the payload is a hard stop: no request is issued
/// and the notification stays open. The processing flag taken under the
/// center lock excludes a concurrent second submission. On success the
/// notification is dismissed and `on_done(order_id, action)` fires; on
/// failure the processing flag is cleared for retry and the countdown stays
/// frozen. A result arriving after the notification was dismissed is
/// ignored.
pub async fn submit_action<F>(
    center: &Mutex<NotificationCenter>,
    id: Uuid,
    action: OrderAction,
    client: &dyn OrderActionClient,
    mut on_done: F,
) -> Result<(), NotifyError>
where
    F: FnMut(i64, OrderAction),
{
    let order_id = {
        let mut center = center.lock().await;
        let notification = center.get(id).ok_or(NotifyError::NotFound(id))?;
        let Some(order_id) = notification.data.order_id else {
            return Err(NotifyError::MissingOrderId);
        };
        center.start_processing(id)?;
        order_id
    };

    match client.update_status(order_id, action.target_status()).await {
        Ok(_) => {
            let mut center = center.lock().await;
            if center.dismiss(id).is_some() {
                on_done(order_id, action);
            }
            Ok(())
        }
        Err(err) => {
            tracing::warn!(order_id, ?action, "order action failed: {err}");
            center.lock().await.finish_processing(id, false);
            Err(NotifyError::ActionFailed(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::center::notification_for_order;
    use crate::models::{Notification, NotificationKind, OrderSnapshot};
    use chrono::Utc;
    use qrmenu_order::memory::MemoryOrderRepository;
    use qrmenu_order::models::{NewOrder, OrderItem};
    use qrmenu_order::repository::OrderRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts requests and answers with a canned result.
    struct CountingClient {
        calls: AtomicUsize,
        repo: MemoryOrderRepository,
    }

    impl CountingClient {
        fn new(repo: MemoryOrderRepository) -> Self {
            Self { calls: AtomicUsize::new(0), repo }
        }
    }

    #[async_trait]
    impl OrderActionClient for CountingClient {
        async fn update_status(
            &self,
            order_id: i64,
            target: OrderStatus,
        ) -> Result<Order, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.repo.transition_status(order_id, target).await
        }
    }

    /// Fails every request, as a downed network would.
    struct FailingClient;

    #[async_trait]
    impl OrderActionClient for FailingClient {
        async fn update_status(
            &self,
            _order_id: i64,
            _target: OrderStatus,
        ) -> Result<Order, RepositoryError> {
            Err(RepositoryError::Database("connection refused".to_string()))
        }
    }

    async fn seeded() -> (Mutex<NotificationCenter>, MemoryOrderRepository, Uuid, i64) {
        let repo = MemoryOrderRepository::new();
        let order = repo
            .create_order(NewOrder {
                vendor_id: 7,
                table_name: Some("Table 4".to_string()),
                items: vec![OrderItem { id: 0, name: "Ramen".into(), quantity: 1, price: 11.0 }],
                payment_method: "cash".to_string(),
            })
            .await
            .unwrap();
        let notification = notification_for_order(&order);
        let nid = notification.id;
        let center = Mutex::new(NotificationCenter::new());
        center.lock().await.deliver(notification);
        (center, repo, nid, order.id)
    }

    #[tokio::test]
    async fn accept_updates_order_dismisses_and_reports() {
        let (center, repo, nid, order_id) = seeded().await;
        let client = CountingClient::new(repo);
        let mut done: Option<(i64, OrderAction)> = None;

        submit_action(&center, nid, OrderAction::Accept, &client, |id, action| {
            done = Some((id, action));
        })
        .await
        .unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(done, Some((order_id, OrderAction::Accept)));
        assert!(center.lock().await.get(nid).is_none());
        let order = client.repo.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Accepted);
    }

    #[tokio::test]
    async fn missing_order_id_aborts_before_any_request() {
        let center = Mutex::new(NotificationCenter::new());
        let nid = center.lock().await.deliver(Notification {
            id: Uuid::new_v4(),
            kind: NotificationKind::NewOrder,
            title: "New order".to_string(),
            message: "malformed event".to_string(),
            created_at: Utc::now(),
            read: false,
            data: OrderSnapshot {
                order_id: None,
                table_name: None,
                total_amount: 0.0,
                items: vec![],
            },
        });
        let client = CountingClient::new(MemoryOrderRepository::new());

        let err = submit_action(&center, nid, OrderAction::Accept, &client, |_, _| {
            panic!("callback must not fire");
        })
        .await
        .unwrap_err();

        assert!(matches!(err, NotifyError::MissingOrderId));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        // The notification stays open, not even marked processing.
        let center = center.lock().await;
        assert!(center.get(nid).is_some());
        assert!(!center.state(nid).unwrap().processing);
    }

    #[tokio::test]
    async fn failed_request_clears_processing_and_keeps_notification() {
        let (center, _repo, nid, _) = seeded().await;

        let err = submit_action(&center, nid, OrderAction::Reject, &FailingClient, |_, _| {
            panic!("callback must not fire");
        })
        .await
        .unwrap_err();

        assert!(matches!(err, NotifyError::ActionFailed(_)));
        let center = center.lock().await;
        let state = center.state(nid).unwrap();
        assert!(!state.processing);
        assert!(state.suspended);
        assert!(center.get(nid).is_some());
    }

    #[tokio::test]
    async fn in_flight_action_blocks_a_second_submission() {
        let (center, repo, nid, _) = seeded().await;
        center.lock().await.start_processing(nid).unwrap();

        let client = CountingClient::new(repo);
        let err = submit_action(&center, nid, OrderAction::Accept, &client, |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::AlreadyProcessing));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn losing_session_gets_a_conflict_style_error() {
        let (center, repo, nid, order_id) = seeded().await;
        // Another staff session accepted first.
        repo.transition_status(order_id, OrderStatus::Accepted).await.unwrap();

        let client = CountingClient::new(repo);
        let err = submit_action(&center, nid, OrderAction::Reject, &client, |_, _| {
            panic!("callback must not fire");
        })
        .await
        .unwrap_err();

        assert!(matches!(err, NotifyError::ActionFailed(_)));
        assert!(center.lock().await.get(nid).is_some());
    }
}
