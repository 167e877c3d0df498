use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use qrmenu_core::access::can_access_vendor;
use qrmenu_core::identity::User;
use qrmenu_order::models::Order;

use crate::models::{
    Notification, NotificationKind, NotificationState, OrderSnapshot, SnapshotItem, Tick,
};
use crate::NotifyError;

/// Owns the live notifications of one client together with their countdown
/// state. Each notification owns exactly one countdown task; there is no
/// shared timer registry.
pub struct NotificationCenter {
    live: HashMap<Uuid, (Notification, NotificationState)>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self { live: HashMap::new() }
    }

    pub fn deliver(&mut self, notification: Notification) -> Uuid {
        let id = notification.id;
        self.live.insert(id, (notification, NotificationState::new()));
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&Notification> {
        self.live.get(&id).map(|(n, _)| n)
    }

    pub fn state(&self, id: Uuid) -> Option<&NotificationState> {
        self.live.get(&id).map(|(_, s)| s)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Remove a notification; returns it if it was still live.
    pub fn dismiss(&mut self, id: Uuid) -> Option<Notification> {
        self.live.remove(&id).map(|(n, _)| n)
    }

    pub fn pin(&mut self, id: Uuid) -> Result<(), NotifyError> {
        let (_, state) = self.live.get_mut(&id).ok_or(NotifyError::NotFound(id))?;
        state.pin();
        Ok(())
    }

    pub fn mark_read(&mut self, id: Uuid) -> Result<(), NotifyError> {
        let (notification, _) = self.live.get_mut(&id).ok_or(NotifyError::NotFound(id))?;
        notification.read = true;
        Ok(())
    }

    /// Advance the countdown of one notification. `None` means it is no
    /// longer live (dismissed elsewhere).
    pub fn tick(&mut self, id: Uuid) -> Option<Tick> {
        let (_, state) = self.live.get_mut(&id)?;
        Some(state.tick())
    }

    pub fn start_processing(&mut self, id: Uuid) -> Result<(), NotifyError> {
        let (_, state) = self.live.get_mut(&id).ok_or(NotifyError::NotFound(id))?;
        state.start_processing()
    }

    /// No-op if the notification was dismissed while the action was in
    /// flight; its result is ignored in that case.
    pub fn finish_processing(&mut self, id: Uuid, success: bool) {
        if let Some((_, state)) = self.live.get_mut(&id) {
            state.finish_processing(success);
        }
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the `new_order` notification for a freshly created order.
pub fn notification_for_order(order: &Order) -> Notification {
    let table = order.table_name.as_deref().unwrap_or("takeaway");
    Notification {
        id: Uuid::new_v4(),
        kind: NotificationKind::NewOrder,
        title: "New order".to_string(),
        message: format!("Order {} from {}", order.invoice_no, table),
        created_at: Utc::now(),
        read: false,
        data: OrderSnapshot {
            order_id: Some(order.id),
            table_name: order.table_name.clone(),
            total_amount: order.total_amount,
            items: order
                .items
                .iter()
                .map(|i| SnapshotItem { name: i.name.clone(), quantity: i.quantity, price: i.price })
                .collect(),
        },
    }
}

/// Everyone entitled to events for this vendor: the vendor owner, its
/// staff, and globally subscribed admins.
pub fn audience<'a, I>(users: I, vendor_id: i64) -> Vec<&'a User>
where
    I: IntoIterator<Item = &'a User>,
{
    users
        .into_iter()
        .filter(|user| can_access_vendor(Some(user), vendor_id))
        .collect()
}

/// Spawn the countdown task for one delivered notification, ticking once
/// per second. Auto-dismisses at zero and reports the id on `dismissed`.
/// The task tears itself down when the notification is dismissed elsewhere;
/// component teardown aborts the returned handle.
pub fn spawn_countdown(
    center: Arc<Mutex<NotificationCenter>>,
    id: Uuid,
    dismissed: mpsc::UnboundedSender<Uuid>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // The first tick of a tokio interval fires immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            // The guard must drop before the dismiss arm takes the lock
            // again, so bind the tick result outside the match.
            let tick = center.lock().await.tick(id);
            match tick {
                Some(Tick::Dismiss) => {
                    center.lock().await.dismiss(id);
                    let _ = dismissed.send(id);
                    break;
                }
                Some(Tick::Running(_)) | Some(Tick::Held) => {}
                None => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrmenu_core::identity::Role;
    use qrmenu_order::models::{OrderItem, OrderStatus, PaymentStatus};

    fn sample_order() -> Order {
        let now = Utc::now();
        Order {
            id: 42,
            invoice_no: "INV-20260823-00042".to_string(),
            vendor_id: 7,
            table_name: Some("Table 4".to_string()),
            items: vec![OrderItem { id: 1, name: "Green Curry".into(), quantity: 2, price: 8.95 }],
            total_amount: 17.9,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: "cash".to_string(),
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(id: i64, role: Role, vendor_id: Option<i64>) -> User {
        User {
            id,
            role,
            vendor_id,
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
        }
    }

    #[test]
    fn new_order_notification_carries_the_snapshot() {
        let order = sample_order();
        let n = notification_for_order(&order);

        assert_eq!(n.kind, NotificationKind::NewOrder);
        assert_eq!(n.data.order_id, Some(42));
        assert_eq!(n.data.table_name.as_deref(), Some("Table 4"));
        assert_eq!(n.data.total_amount, 17.9);
        assert_eq!(n.data.items.len(), 1);
        assert!(n.message.contains("INV-20260823-00042"));
        assert!(!n.read);
    }

    #[test]
    fn audience_is_owner_staff_and_admin() {
        let users = vec![
            user(1, Role::Admin, None),
            user(7, Role::Vendor, None),
            user(20, Role::Staff, Some(7)),
            user(21, Role::Staff, Some(8)),
            user(9, Role::Vendor, None),
        ];
        let ids: Vec<i64> = audience(&users, 7).into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 7, 20]);
    }

    #[test]
    fn deliver_dismiss_and_read() {
        let mut center = NotificationCenter::new();
        let id = center.deliver(notification_for_order(&sample_order()));

        assert_eq!(center.live_count(), 1);
        center.mark_read(id).unwrap();
        assert!(center.get(id).unwrap().read);

        assert!(center.dismiss(id).is_some());
        assert_eq!(center.live_count(), 0);
        assert!(center.dismiss(id).is_none());
        assert!(matches!(center.pin(id), Err(NotifyError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn unattended_notification_auto_dismisses_after_countdown() {
        let center = Arc::new(Mutex::new(NotificationCenter::new()));
        let id = center.lock().await.deliver(notification_for_order(&sample_order()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_countdown(center.clone(), id, tx);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(rx.recv().await, Some(id));
        assert!(center.lock().await.get(id).is_none());
        handle.await.unwrap();

        // The center lock is free again after the auto-dismiss; it keeps
        // serving deliveries.
        let next = center.lock().await.deliver(notification_for_order(&sample_order()));
        assert!(center.lock().await.get(next).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn pinned_notification_never_auto_dismisses() {
        let center = Arc::new(Mutex::new(NotificationCenter::new()));
        let id = center.lock().await.deliver(notification_for_order(&sample_order()));
        center.lock().await.pin(id).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_countdown(center.clone(), id, tx);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(rx.try_recv().is_err());
        assert!(center.lock().await.get(id).is_some());

        // Teardown cancels the timer explicitly.
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_task_stops_when_dismissed_elsewhere() {
        let center = Arc::new(Mutex::new(NotificationCenter::new()));
        let id = center.lock().await.deliver(notification_for_order(&sample_order()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_countdown(center.clone(), id, tx);
        tokio::time::sleep(Duration::from_secs(3)).await;
        center.lock().await.dismiss(id);

        // The task notices on its next tick and exits without reporting.
        handle.await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
