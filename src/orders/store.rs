//! Order Store
//!
//! The authoritative in-memory list of orders and users for a session, with
//! change notification. One store is built at start-up and shared by `Arc`.

use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use jiff::Timestamp;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::{
    fixtures::SeedData,
    orders::models::{Order, OrderId, OrderStatus, OrderUpdate},
    users::{User, UserId},
};

/// Change published to subscribers after a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// An order was added.
    OrderAdded(Order),

    /// An order was changed; carries the order as it is now.
    OrderUpdated(Order),

    /// An order was deleted.
    OrderDeleted(OrderId),

    /// All orders and users were replaced.
    Reseeded,
}

type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener)>>,
}

impl Listeners {
    fn snapshot(&self) -> Vec<Listener> {
        self.entries
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();

        entries.retain(|(entry_id, _)| *entry_id != id);

        entries.len() != before
    }
}

/// Handle returned by [`OrderStore::subscribe`].
///
/// The listener stays registered until [`Subscription::unsubscribe`] is called
/// or the handle is dropped.
#[must_use = "dropping a subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Remove the listener. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        self.detach()
    }

    fn detach(&self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|listeners| listeners.remove(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    orders: Vec<Order>,
    users: Vec<User>,
    next_order_number: u64,
}

impl StoreState {
    fn from_seed(seed: &SeedData) -> Self {
        let mut orders = seed.orders.clone();

        // Newest first, matching `add_order`.
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let highest = orders
            .iter()
            .filter_map(|order| order.order_number.strip_prefix("SU-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        Self {
            next_order_number: highest.saturating_add(1),
            orders,
            users: seed.users.clone(),
        }
    }

    fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.iter_mut().find(|order| order.id == id)
    }
}

/// In-memory order and user repository.
#[derive(Default)]
pub struct OrderStore {
    state: RwLock<StoreState>,
    listeners: Arc<Listeners>,
}

impl fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();

        f.debug_struct("OrderStore")
            .field("orders", &state.orders.len())
            .field("users", &state.users.len())
            .field("listeners", &self.listeners.entries.lock().len())
            .finish()
    }
}

impl OrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the seed's users and orders.
    #[must_use]
    pub fn from_seed(seed: &SeedData) -> Self {
        Self {
            state: RwLock::new(StoreState::from_seed(seed)),
            listeners: Arc::default(),
        }
    }

    /// Register a listener, called synchronously after every mutation in
    /// registration order.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);

        self.listeners
            .entries
            .lock()
            .push((id, Arc::new(listener)));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    fn notify(&self, event: &StoreEvent) {
        // Listeners may query the store, so no lock is held while they run.
        for listener in self.listeners.snapshot() {
            listener(event);
        }
    }

    /// All orders, newest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.state.read().orders.clone()
    }

    /// Orders placed by `user`, newest first.
    #[must_use]
    pub fn user_orders(&self, user: &UserId) -> Vec<Order> {
        self.filter_orders(|order| order.user_id == *user)
    }

    /// A single order.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.state
            .read()
            .orders
            .iter()
            .find(|order| order.id == id)
            .cloned()
    }

    /// Orders in the given status, newest first.
    #[must_use]
    pub fn orders_by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.filter_orders(|order| order.status == status)
    }

    /// Orders out for delivery.
    #[must_use]
    pub fn orders_for_delivery(&self) -> Vec<Order> {
        self.orders_by_status(OrderStatus::Shipped)
    }

    fn filter_orders(&self, predicate: impl Fn(&Order) -> bool) -> Vec<Order> {
        self.state
            .read()
            .orders
            .iter()
            .filter(|order| predicate(order))
            .cloned()
            .collect()
    }

    /// Reserve the next human-readable order number.
    pub fn next_order_number(&self) -> String {
        let mut state = self.state.write();
        let number = state.next_order_number.max(1);

        state.next_order_number = number + 1;

        format!("SU-{number:06}")
    }

    /// Add an order ahead of all existing ones.
    pub fn add_order(&self, order: Order) {
        info!(order = %order.id, number = %order.order_number, "order added");

        self.state.write().orders.insert(0, order.clone());

        self.notify(&StoreEvent::OrderAdded(order));
    }

    /// Merge `update` into an order and stamp its `updated_at`.
    ///
    /// Returns `false`, without notifying anyone, if the order does not exist.
    pub fn update_order(&self, id: OrderId, update: OrderUpdate) -> bool {
        let updated = {
            let mut state = self.state.write();

            state.order_mut(id).map(|order| {
                order.apply(update, Timestamp::now());
                order.clone()
            })
        };

        match updated {
            Some(order) => {
                debug!(order = %id, status = %order.status, "order updated");
                self.notify(&StoreEvent::OrderUpdated(order));
                true
            }
            None => {
                debug!(order = %id, "update skipped, order not found");
                false
            }
        }
    }

    /// Change an order's status.
    pub fn update_order_status(&self, id: OrderId, status: OrderStatus) -> bool {
        self.update_order(id, OrderUpdate::status(status))
    }

    /// Mark an order delivered, recording any driver notes.
    pub fn mark_order_as_delivered(&self, id: OrderId, notes: Option<String>) -> bool {
        self.update_order(
            id,
            OrderUpdate {
                status: Some(OrderStatus::Delivered),
                notes,
                ..OrderUpdate::default()
            },
        )
    }

    /// Remove an order. Returns `false` if it does not exist.
    pub fn delete_order(&self, id: OrderId) -> bool {
        let removed = {
            let mut state = self.state.write();
            let before = state.orders.len();

            state.orders.retain(|order| order.id != id);

            state.orders.len() != before
        };

        if removed {
            info!(order = %id, "order deleted");
            self.notify(&StoreEvent::OrderDeleted(id));
        }

        removed
    }

    /// All users.
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.state.read().users.clone()
    }

    /// A single user.
    #[must_use]
    pub fn user(&self, id: &UserId) -> Option<User> {
        self.state
            .read()
            .users
            .iter()
            .find(|user| user.id == *id)
            .cloned()
    }

    /// The user registered under `email`, ignoring case.
    #[must_use]
    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.state
            .read()
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// Replace every user and order with the seed's.
    pub fn reseed(&self, seed: &SeedData) {
        *self.state.write() = StoreState::from_seed(seed);

        info!(
            orders = seed.orders.len(),
            users = seed.users.len(),
            "store reseeded"
        );

        self.notify(&StoreEvent::Reseeded);
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::orders::models::{PaymentStatus, test_support::order};

    use super::*;

    fn recorder(
        store: &OrderStore,
        tag: &'static str,
        log: &Arc<Mutex<Vec<String>>>,
    ) -> Subscription {
        let log = Arc::clone(log);

        store.subscribe(move |event| {
            let kind = match event {
                StoreEvent::OrderAdded(_) => "added",
                StoreEvent::OrderUpdated(_) => "updated",
                StoreEvent::OrderDeleted(_) => "deleted",
                StoreEvent::Reseeded => "reseeded",
            };

            log.lock().push(format!("{tag}:{kind}"));
        })
    }

    #[test]
    fn add_order_prepends() {
        let store = OrderStore::new();
        let first = order("user-1", OrderStatus::Pending);
        let second = order("user-1", OrderStatus::Pending);

        store.add_order(first.clone());
        store.add_order(second.clone());

        let ids: Vec<OrderId> = store.orders().iter().map(|o| o.id).collect();

        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn add_order_notifies_every_subscriber_once_in_order() {
        let store = OrderStore::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let _a = recorder(&store, "a", &log);
        let _b = recorder(&store, "b", &log);

        store.add_order(order("user-1", OrderStatus::Pending));

        assert_eq!(*log.lock(), vec!["a:added", "b:added"]);
    }

    #[test]
    fn update_of_missing_order_returns_false_and_is_silent() {
        let store = OrderStore::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _sub = recorder(&store, "a", &log);

        let updated = store.update_order(OrderId::new(), OrderUpdate::status(OrderStatus::Shipped));

        assert!(!updated);
        assert!(log.lock().is_empty());
        assert!(!store.delete_order(OrderId::new()));
        assert!(!store.mark_order_as_delivered(OrderId::new(), None));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn update_order_merges_and_publishes_new_state() -> TestResult {
        let store = OrderStore::new();
        let placed = order("user-1", OrderStatus::Pending);
        store.add_order(placed.clone());

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |event| {
            if let StoreEvent::OrderUpdated(order) = event {
                *sink.lock() = Some(order.clone());
            }
        });

        assert!(store.update_order(
            placed.id,
            OrderUpdate {
                payment_status: Some(PaymentStatus::Refunded),
                ..OrderUpdate::default()
            }
        ));

        let stored = store.order(placed.id).ok_or("order missing")?;

        assert_eq!(stored.payment_status, PaymentStatus::Refunded);
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.updated_at > placed.updated_at);
        assert_eq!(seen.lock().as_ref(), Some(&stored));

        Ok(())
    }

    #[test]
    fn queries_filter_by_user_and_status() {
        let store = OrderStore::new();

        store.add_order(order("user-1", OrderStatus::Shipped));
        store.add_order(order("user-2", OrderStatus::Shipped));
        store.add_order(order("user-1", OrderStatus::Delivered));

        assert_eq!(store.user_orders(&UserId::from("user-1")).len(), 2);
        assert_eq!(store.user_orders(&UserId::from("user-3")).len(), 0);
        assert_eq!(store.orders_by_status(OrderStatus::Delivered).len(), 1);
        assert_eq!(store.orders_for_delivery().len(), 2);
    }

    #[test]
    fn mark_order_as_delivered_sets_status_and_notes() -> TestResult {
        let store = OrderStore::new();
        let shipped = order("user-1", OrderStatus::Shipped);
        store.add_order(shipped.clone());

        assert!(store.mark_order_as_delivered(shipped.id, Some("left with neighbour".to_string())));

        let delivered = store.order(shipped.id).ok_or("order missing")?;

        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.notes.as_deref(), Some("left with neighbour"));
        assert!(store.orders_for_delivery().is_empty());

        Ok(())
    }

    #[test]
    fn delete_order_removes_and_notifies() {
        let store = OrderStore::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let placed = order("user-1", OrderStatus::Cancelled);
        store.add_order(placed.clone());
        let _sub = recorder(&store, "a", &log);

        assert!(store.delete_order(placed.id));
        assert!(store.order(placed.id).is_none());
        assert_eq!(*log.lock(), vec!["a:deleted"]);
    }

    #[test]
    fn unsubscribed_listeners_are_not_called() {
        let store = OrderStore::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let a = recorder(&store, "a", &log);
        let b = recorder(&store, "b", &log);

        assert!(a.unsubscribe());
        drop(b);

        store.add_order(order("user-1", OrderStatus::Pending));

        assert!(log.lock().is_empty());
    }

    #[test]
    fn listeners_can_query_the_store() {
        let store = Arc::new(OrderStore::new());
        let counts = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&store);
        let sink = Arc::clone(&counts);
        let _sub = store.subscribe(move |_| {
            if let Some(store) = weak.upgrade() {
                sink.lock().push(store.orders().len());
            }
        });

        store.add_order(order("user-1", OrderStatus::Pending));
        store.add_order(order("user-1", OrderStatus::Pending));

        assert_eq!(*counts.lock(), vec![1, 2]);
    }

    #[test]
    fn order_numbers_are_sequential() {
        let store = OrderStore::new();

        assert_eq!(store.next_order_number(), "SU-000001");
        assert_eq!(store.next_order_number(), "SU-000002");
    }

    #[test]
    fn order_numbers_continue_past_highest_seeded_number() {
        let mut low = order("user-1", OrderStatus::Delivered);
        low.order_number = "SU-000002".to_string();

        let mut high = order("user-2", OrderStatus::Shipped);
        high.order_number = "SU-000007".to_string();

        let mut legacy = order("user-2", OrderStatus::Pending);
        legacy.order_number = "WALK-IN".to_string();

        let store = OrderStore::from_seed(&SeedData {
            orders: vec![high, legacy, low],
            ..SeedData::default()
        });

        assert_eq!(store.next_order_number(), "SU-000008");
        assert_eq!(store.next_order_number(), "SU-000009");
    }

    #[test]
    fn reseed_replaces_state_and_notifies() -> TestResult {
        let seed = SeedData::bundled()?;
        let store = OrderStore::new();
        let stray = order("user-9", OrderStatus::Pending);

        store.add_order(stray.clone());

        let log = Arc::new(Mutex::new(Vec::new()));
        let _sub = recorder(&store, "a", &log);

        store.reseed(&seed);

        let mut ids: Vec<OrderId> = store.orders().iter().map(|o| o.id).collect();
        let mut seeded: Vec<OrderId> = seed.orders.iter().map(|o| o.id).collect();
        ids.sort_by_key(ToString::to_string);
        seeded.sort_by_key(ToString::to_string);

        assert_eq!(ids, seeded);
        assert!(store.order(stray.id).is_none());
        assert_eq!(store.users().len(), seed.users.len());
        assert_eq!(store.next_order_number(), "SU-000005");
        assert_eq!(*log.lock(), vec!["a:reseeded"]);

        Ok(())
    }
}
