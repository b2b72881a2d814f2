//=========================================================================
// Event Bus
//=========================================================================
//
// Synchronous publish/subscribe over a closed set of event kinds.
//
// Architecture:
//   publishers → publish(&Event) → HashMap<EventKind, Vec<Subscriber>>
//                                      ↓ (snapshot, then invoke in order)
//   handlers: Rc<dyn Fn(&Event)>, owner-scoped for bulk removal
//
// Every kind is pre-registered at construction, so a missing subscriber
// list at publish time is an invariant violation rather than a silent
// skip. No queuing, no priority: publishing from inside a handler runs
// inline against the snapshot taken when the outer publish began.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::scene::SceneId;

//=== Event Kinds =========================================================

/// Closed enumeration of everything the shell can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Blended resource-loading progress for a named stage.
    LoadingProgress,
    /// The loading display should animate toward completion on its own.
    LoadingAutoProgress,
    /// A loading sequence ended (the loading display may hide).
    LoadingFinished,
    /// The active scene is being replaced.
    SceneSwitch,
    /// A scene transition finished, successfully or not.
    SceneSwitchEnded,
    /// Input should be blocked for the given reason (ref-counted by the
    /// subscriber).
    BlockInputShow,
    /// A previously published block reason was lifted.
    BlockInputHide,
    /// The last stacked UI instance was destroyed.
    LastUiDestroyed,
}

impl EventKind {
    /// Every kind, in declaration order. Used to seed the subscriber table.
    pub const ALL: [EventKind; 8] = [
        EventKind::LoadingProgress,
        EventKind::LoadingAutoProgress,
        EventKind::LoadingFinished,
        EventKind::SceneSwitch,
        EventKind::SceneSwitchEnded,
        EventKind::BlockInputShow,
        EventKind::BlockInputHide,
        EventKind::LastUiDestroyed,
    ];
}

//=== Event Payloads ======================================================

/// A published event together with its payload.
#[derive(Debug, Clone)]
pub enum Event {
    LoadingProgress { stage: String, fraction: f32 },
    LoadingAutoProgress,
    LoadingFinished,
    SceneSwitch { from: Option<SceneId>, to: SceneId },
    SceneSwitchEnded,
    BlockInputShow { reason: String },
    BlockInputHide { reason: String },
    LastUiDestroyed,
}

impl Event {
    /// The kind this payload publishes under. Keeping the mapping here
    /// makes publishing to the wrong subscriber list unrepresentable.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::LoadingProgress { .. } => EventKind::LoadingProgress,
            Event::LoadingAutoProgress => EventKind::LoadingAutoProgress,
            Event::LoadingFinished => EventKind::LoadingFinished,
            Event::SceneSwitch { .. } => EventKind::SceneSwitch,
            Event::SceneSwitchEnded => EventKind::SceneSwitchEnded,
            Event::BlockInputShow { .. } => EventKind::BlockInputShow,
            Event::BlockInputHide { .. } => EventKind::BlockInputHide,
            Event::LastUiDestroyed => EventKind::LastUiDestroyed,
        }
    }
}

//=== Subscription Tokens =================================================

/// Identifies the owner of a group of subscriptions, for bulk removal.
///
/// Closures are not comparable, so removal goes by token rather than by
/// handler identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(pub u64);

/// Identifies a single subscription for exact-match removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

//=== Event Bus ===========================================================

struct Subscriber {
    id: SubscriptionId,
    owner: OwnerId,
    handler: Rc<dyn Fn(&Event)>,
}

struct BusInner {
    subscribers: HashMap<EventKind, Vec<Subscriber>>,
    next_subscription: u64,
    next_owner: u64,
}

/// Synchronous event bus shared across the shell.
///
/// The bus is a cheap handle: cloning it yields another reference to the
/// same subscriber table, which is how content hooks and the shell share
/// one instance on the single logical thread.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    /// Creates a bus with every [`EventKind`] pre-registered.
    pub fn new() -> Self {
        let mut subscribers = HashMap::with_capacity(EventKind::ALL.len());
        for kind in EventKind::ALL {
            subscribers.insert(kind, Vec::new());
        }
        EventBus {
            inner: Rc::new(RefCell::new(BusInner {
                subscribers,
                next_subscription: 0,
                next_owner: 0,
            })),
        }
    }

    /// Allocates a fresh owner token for grouping subscriptions.
    pub fn allocate_owner(&self) -> OwnerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_owner += 1;
        OwnerId(inner.next_owner)
    }

    //--- Subscription -----------------------------------------------------

    /// Subscribes `handler` to `kind` on behalf of `owner`.
    pub fn subscribe<F>(&self, kind: EventKind, owner: OwnerId, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.next_subscription += 1;
        let id = SubscriptionId(inner.next_subscription);
        inner
            .subscribers
            .get_mut(&kind)
            .expect("event kind not pre-registered")
            .push(Subscriber { id, owner, handler: Rc::new(handler) });
        id
    }

    /// Removes one subscription by exact token match.
    ///
    /// Removing an already-removed subscription is a no-op.
    pub fn unsubscribe(&self, kind: EventKind, subscription: SubscriptionId) {
        let mut inner = self.inner.borrow_mut();
        let list = inner
            .subscribers
            .get_mut(&kind)
            .expect("event kind not pre-registered");
        list.retain(|s| s.id != subscription);
    }

    /// Removes every subscription held by `owner`, across all kinds.
    pub fn unsubscribe_all(&self, owner: OwnerId) {
        let mut inner = self.inner.borrow_mut();
        for list in inner.subscribers.values_mut() {
            list.retain(|s| s.owner != owner);
        }
    }

    //--- Publishing -------------------------------------------------------

    /// Publishes `event` to every subscriber of its kind, in subscription
    /// order, inline on the caller's stack.
    ///
    /// The subscriber list is snapshotted before any handler runs, so a
    /// handler may subscribe, unsubscribe, or publish again without
    /// corrupting the iteration; late mutations take effect on the next
    /// publish.
    pub fn publish(&self, event: &Event) {
        let handlers: Vec<Rc<dyn Fn(&Event)>> = {
            let inner = self.inner.borrow();
            inner
                .subscribers
                .get(&event.kind())
                .expect("event kind not pre-registered")
                .iter()
                .map(|s| Rc::clone(&s.handler))
                .collect()
        };
        debug!("publish {:?} to {} subscriber(s)", event.kind(), handlers.len());
        for handler in handlers {
            handler(event);
        }
    }

    /// Number of live subscriptions for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .subscribers
            .get(&kind)
            .map(|l| l.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
