use crate::collision::Contact;
use crate::core::CollidableHandle;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Types of collision events raised by pair handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionEventType {
    /// A pair handler has been created between two collidables
    PairCreated,

    /// A pair handler ran its per-step update
    PairUpdated,

    /// The pair has at least one contact this step
    PairTouching,

    /// The pair went from zero contacts to at least one
    InitialCollisionDetected,

    /// The pair went from at least one contact to zero
    CollisionEnded,

    /// The pair handler has been cleaned up
    PairRemoved,

    /// A contact has been added to a manifold
    ContactCreated,

    /// A contact has been removed from a manifold
    ContactRemoved,
}

/// Receives collision lifecycle callbacks for a collidable
///
/// Every callback is raised once on each side of the pair, with `sender` set to
/// the collidable that owns the listener.
pub trait CollisionEventListener: Send + Sync {
    fn on_pair_created(&self, _sender: CollidableHandle, _other: CollidableHandle) {}

    fn on_pair_updated(&self, _sender: CollidableHandle, _other: CollidableHandle) {}

    fn on_pair_touching(&self, _sender: CollidableHandle, _other: CollidableHandle) {}

    fn on_initial_collision_detected(&self, _sender: CollidableHandle, _other: CollidableHandle) {}

    fn on_collision_ended(&self, _sender: CollidableHandle, _other: CollidableHandle) {}

    fn on_pair_removed(&self, _sender: CollidableHandle, _other: CollidableHandle) {}

    fn on_contact_created(&self, _sender: CollidableHandle, _other: CollidableHandle, _contact: &Contact) {}

    fn on_contact_removed(&self, _sender: CollidableHandle, _other: CollidableHandle, _contact: &Contact) {}
}

/// The set of listeners attached to a single collidable
#[derive(Clone, Default)]
pub struct CollidableEvents {
    listeners: Vec<Arc<dyn CollisionEventListener>>,
}

impl CollidableEvents {
    /// Creates an empty listener set
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a listener
    pub fn add_listener(&mut self, listener: Arc<dyn CollisionEventListener>) {
        self.listeners.push(listener);
    }

    /// Detaches a listener, returning whether it was attached
    pub fn remove_listener(&mut self, listener: &Arc<dyn CollisionEventListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        self.listeners.len() != before
    }

    /// Returns whether any listener is attached
    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Raises an event on every attached listener
    pub fn dispatch(
        &self,
        sender: CollidableHandle,
        other: CollidableHandle,
        event_type: CollisionEventType,
        contact: Option<&Contact>,
    ) {
        for listener in &self.listeners {
            match (event_type, contact) {
                (CollisionEventType::PairCreated, _) => listener.on_pair_created(sender, other),
                (CollisionEventType::PairUpdated, _) => listener.on_pair_updated(sender, other),
                (CollisionEventType::PairTouching, _) => listener.on_pair_touching(sender, other),
                (CollisionEventType::InitialCollisionDetected, _) => {
                    listener.on_initial_collision_detected(sender, other)
                }
                (CollisionEventType::CollisionEnded, _) => listener.on_collision_ended(sender, other),
                (CollisionEventType::PairRemoved, _) => listener.on_pair_removed(sender, other),
                (CollisionEventType::ContactCreated, Some(contact)) => {
                    listener.on_contact_created(sender, other, contact)
                }
                (CollisionEventType::ContactRemoved, Some(contact)) => {
                    listener.on_contact_removed(sender, other, contact)
                }
                (CollisionEventType::ContactCreated | CollisionEventType::ContactRemoved, None) => {}
            }
        }
    }
}

impl fmt::Debug for CollidableEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollidableEvents")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A recorded collision event
#[derive(Debug, Clone)]
pub struct CollisionEvent {
    /// The type of collision event
    pub event_type: CollisionEventType,

    /// The collidable whose listener received the event
    pub sender: CollidableHandle,

    /// The other collidable in the pair
    pub other: CollidableHandle,

    /// The contact, for contact events
    pub contact: Option<Contact>,
}

/// A listener that records every event it receives
#[derive(Debug, Default)]
pub struct EventQueue {
    collision_events: Mutex<VecDeque<CollisionEvent>>,
}

impl EventQueue {
    /// Creates a new empty event queue
    pub fn new() -> Self {
        Self {
            collision_events: Mutex::new(VecDeque::new()),
        }
    }

    /// Creates a new shared event queue, ready to attach to collidables
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Adds a collision event to the queue
    pub fn add_collision_event(&self, event: CollisionEvent) {
        self.collision_events.lock().push_back(event);
    }

    /// Gets the next collision event from the queue
    pub fn next_collision_event(&self) -> Option<CollisionEvent> {
        self.collision_events.lock().pop_front()
    }

    /// Returns the number of recorded events
    pub fn len(&self) -> usize {
        self.collision_events.lock().len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.collision_events.lock().is_empty()
    }

    /// Clears all events from the queue
    pub fn clear(&self) {
        self.collision_events.lock().clear();
    }

    /// Returns a copy of every recorded event, oldest first
    pub fn events(&self) -> Vec<CollisionEvent> {
        self.collision_events.lock().iter().cloned().collect()
    }

    /// Gets all collision events of a specific type
    pub fn get_collision_events_of_type(&self, event_type: CollisionEventType) -> Vec<CollisionEvent> {
        self.collision_events
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Gets all collision events received by a specific collidable
    pub fn get_collision_events_for_collidable(&self, sender: CollidableHandle) -> Vec<CollisionEvent> {
        self.collision_events
            .lock()
            .iter()
            .filter(|e| e.sender == sender)
            .cloned()
            .collect()
    }

    /// Counts the events of a type received by a collidable
    pub fn count(&self, sender: CollidableHandle, event_type: CollisionEventType) -> usize {
        self.collision_events
            .lock()
            .iter()
            .filter(|e| e.sender == sender && e.event_type == event_type)
            .count()
    }

    fn record(&self, event_type: CollisionEventType, sender: CollidableHandle, other: CollidableHandle, contact: Option<&Contact>) {
        self.add_collision_event(CollisionEvent {
            event_type,
            sender,
            other,
            contact: contact.copied(),
        });
    }
}

impl CollisionEventListener for EventQueue {
    fn on_pair_created(&self, sender: CollidableHandle, other: CollidableHandle) {
        self.record(CollisionEventType::PairCreated, sender, other, None);
    }

    fn on_pair_updated(&self, sender: CollidableHandle, other: CollidableHandle) {
        self.record(CollisionEventType::PairUpdated, sender, other, None);
    }

    fn on_pair_touching(&self, sender: CollidableHandle, other: CollidableHandle) {
        self.record(CollisionEventType::PairTouching, sender, other, None);
    }

    fn on_initial_collision_detected(&self, sender: CollidableHandle, other: CollidableHandle) {
        self.record(CollisionEventType::InitialCollisionDetected, sender, other, None);
    }

    fn on_collision_ended(&self, sender: CollidableHandle, other: CollidableHandle) {
        self.record(CollisionEventType::CollisionEnded, sender, other, None);
    }

    fn on_pair_removed(&self, sender: CollidableHandle, other: CollidableHandle) {
        self.record(CollisionEventType::PairRemoved, sender, other, None);
    }

    fn on_contact_created(&self, sender: CollidableHandle, other: CollidableHandle, contact: &Contact) {
        self.record(CollisionEventType::ContactCreated, sender, other, Some(contact));
    }

    fn on_contact_removed(&self, sender: CollidableHandle, other: CollidableHandle, contact: &Contact) {
        self.record(CollisionEventType::ContactRemoved, sender, other, Some(contact));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_reaches_every_listener() {
        let first = EventQueue::shared();
        let second = EventQueue::shared();
        let mut events = CollidableEvents::new();
        events.add_listener(first.clone());
        events.add_listener(second.clone());

        let (a, b) = (CollidableHandle(1), CollidableHandle(2));
        events.dispatch(a, b, CollisionEventType::PairCreated, None);
        events.dispatch(a, b, CollisionEventType::PairTouching, None);

        assert_eq!(first.len(), 2);
        assert_eq!(second.count(a, CollisionEventType::PairTouching), 1);
        assert_eq!(first.events()[0].other, b);
    }

    #[test]
    fn contact_events_need_a_contact() {
        let queue = EventQueue::shared();
        let mut events = CollidableEvents::new();
        events.add_listener(queue.clone());

        events.dispatch(CollidableHandle(1), CollidableHandle(2), CollisionEventType::ContactCreated, None);
        assert!(queue.is_empty());
    }

    #[test]
    fn removed_listener_stops_recording() {
        let queue = EventQueue::shared();
        let listener: Arc<dyn CollisionEventListener> = queue.clone();
        let mut events = CollidableEvents::new();
        events.add_listener(listener.clone());
        assert!(events.remove_listener(&listener));
        assert!(!events.has_listeners());

        events.dispatch(CollidableHandle(1), CollidableHandle(2), CollisionEventType::PairRemoved, None);
        assert!(queue.is_empty());
    }
}
