//! Mutation notifications
//!
//! Subscribers register a callback for an [`Interest`], an (action, entity
//! type) pair. The engine delivers notifications synchronously, after the
//! transaction that caused them has committed.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;
use trellis_core::{Entity, EntityType, Update};

/// Kind of mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Entity or relationship created
    Created,
    /// Entity or relationship updated
    Updated,
    /// Entity or relationship deleted
    Deleted,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// What a subscriber wants to hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interest {
    /// Mutation kind
    pub action: Action,
    /// Kind of the mutated entity
    pub entity_type: EntityType,
}

impl Interest {
    /// Interest in `action` on entities of `entity_type`
    pub fn new(action: Action, entity_type: EntityType) -> Self {
        Interest {
            action,
            entity_type,
        }
    }

    /// True if `notification` falls under this interest
    pub fn matches(&self, notification: &Notification) -> bool {
        self.action == notification.action
            && self.entity_type == notification.entity.entity_type()
    }
}

/// Extra data attached to a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionContext {
    /// Nothing beyond the created entity
    Created,
    /// The entity as it was before, and the applied update
    Updated {
        /// State before the update
        original: Entity,
        /// The update that was applied
        update: Update,
    },
    /// Nothing beyond the deleted entity
    Deleted,
}

/// One delivered event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Mutation kind
    pub action: Action,
    /// The entity after creation or update, or as it was before deletion
    pub entity: Entity,
    /// Action-specific details
    pub context: ActionContext,
}

impl Notification {
    /// `entity` was created
    pub fn created(entity: Entity) -> Self {
        Notification {
            action: Action::Created,
            entity,
            context: ActionContext::Created,
        }
    }

    /// `original` was changed to `entity` by `update`
    pub fn updated(entity: Entity, original: Entity, update: Update) -> Self {
        Notification {
            action: Action::Updated,
            entity,
            context: ActionContext::Updated { original, update },
        }
    }

    /// `entity` was deleted
    pub fn deleted(entity: Entity) -> Self {
        Notification {
            action: Action::Deleted,
            entity,
            context: ActionContext::Deleted,
        }
    }

    /// The interest this notification falls under
    pub fn interest(&self) -> Interest {
        Interest::new(self.action, self.entity.entity_type())
    }
}

type Callback = Arc<dyn Fn(&Notification) + Send + Sync>;

struct Subscriber {
    id: u64,
    interest: Interest,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Subscriber registry of one inventory
#[derive(Clone, Default)]
pub struct Observers {
    registry: Arc<RwLock<Registry>>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.registry.read().subscribers.len())
            .finish()
    }
}

impl Observers {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `callback` for every notification matching `interest`
    ///
    /// Delivery stops once the returned subscription is cancelled. Dropping
    /// the handle without cancelling keeps the callback registered.
    pub fn subscribe<F>(&self, interest: Interest, callback: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let mut registry = self.registry.write();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscribers.push(Subscriber {
            id,
            interest,
            callback: Arc::new(callback),
        });
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// True if anyone listens for `interest`
    pub fn is_observed(&self, interest: &Interest) -> bool {
        self.registry
            .read()
            .subscribers
            .iter()
            .any(|s| &s.interest == interest)
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.registry.read().subscribers.len()
    }

    /// True if nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `notification` to every matching subscriber, returning how
    /// many were called
    pub(crate) fn notify(&self, notification: &Notification) -> usize {
        // callbacks run without the lock so that they may subscribe or cancel
        let callbacks: Vec<Callback> = self
            .registry
            .read()
            .subscribers
            .iter()
            .filter(|s| s.interest.matches(notification))
            .map(|s| Arc::clone(&s.callback))
            .collect();
        for callback in &callbacks {
            callback(notification);
        }
        callbacks.len()
    }

    /// Deliver all `notifications` in order
    pub(crate) fn notify_all(&self, notifications: &[Notification]) {
        let delivered: usize = notifications.iter().map(|n| self.notify(n)).sum();
        debug!(
            target: "trellis::notify",
            notifications = notifications.len(),
            delivered,
            "notifications delivered"
        );
    }
}

/// Handle of one registered callback
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<RwLock<Registry>>,
}

impl Subscription {
    /// Stop delivery to this subscription's callback
    pub fn cancel(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.write().subscribers.retain(|s| s.id != self.id);
        }
    }

    /// True while the callback is registered
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|r| r.read().subscribers.iter().any(|s| s.id == self.id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use trellis_core::Tenant;

    fn tenant(id: &str) -> Entity {
        Tenant::new(trellis_core::CanonicalPath::of_tenant(id)).into()
    }

    #[test]
    fn test_only_matching_interest_is_called() {
        let observers = Observers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = observers.subscribe(
            Interest::new(Action::Created, EntityType::Tenant),
            move |n| sink.lock().push(n.entity.id().to_string()),
        );

        assert_eq!(observers.notify(&Notification::created(tenant("a"))), 1);
        assert_eq!(observers.notify(&Notification::deleted(tenant("b"))), 0);
        assert_eq!(*seen.lock(), vec!["a".to_string()]);
    }

    #[test]
    fn test_cancel_stops_delivery() {
        let observers = Observers::new();
        let interest = Interest::new(Action::Deleted, EntityType::Tenant);
        let sub = observers.subscribe(interest, |_| {});
        assert!(sub.is_active());
        assert!(observers.is_observed(&interest));
        sub.cancel();
        assert!(observers.is_empty());
        assert_eq!(observers.notify(&Notification::deleted(tenant("a"))), 0);
    }

    #[test]
    fn test_callback_may_subscribe() {
        let observers = Observers::new();
        let inner = observers.clone();
        let _sub = observers.subscribe(
            Interest::new(Action::Created, EntityType::Tenant),
            move |_| {
                let _ = inner.subscribe(Interest::new(Action::Updated, EntityType::Tenant), |_| {});
            },
        );
        observers.notify(&Notification::created(tenant("a")));
        assert_eq!(observers.len(), 2);
    }
}
