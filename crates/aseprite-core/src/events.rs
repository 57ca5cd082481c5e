//! Playback events and their listeners.
//!
//! The two built-in events are enum variants, so listeners for them are
//! checked at compile time; caller-defined trigger names travel as
//! [`SpriteEvent::Custom`] and are matched by string.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteEvent {
    /// Playback wrapped past the boundary of the active range.
    AnimationComplete { tag: Option<String> },
    /// The active tag changed.
    TagSwitched {
        previous: Option<String>,
        current: Option<String>,
    },
    /// A registered trigger fired on entering `frame`.
    Custom {
        name: String,
        frame: usize,
        tag: Option<String>,
    },
}

impl SpriteEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SpriteEvent::AnimationComplete { .. } => EventKind::AnimationComplete,
            SpriteEvent::TagSwitched { .. } => EventKind::TagSwitched,
            SpriteEvent::Custom { name, .. } => EventKind::Custom(name.clone()),
        }
    }
}

/// What a listener subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    AnimationComplete,
    TagSwitched,
    Custom(String),
}

impl EventKind {
    pub fn custom(name: impl Into<String>) -> Self {
        EventKind::Custom(name.into())
    }

    pub fn matches(&self, event: &SpriteEvent) -> bool {
        match (self, event) {
            (EventKind::AnimationComplete, SpriteEvent::AnimationComplete { .. }) => true,
            (EventKind::TagSwitched, SpriteEvent::TagSwitched { .. }) => true,
            (EventKind::Custom(wanted), SpriteEvent::Custom { name, .. }) => wanted == name,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&SpriteEvent)>;

/// Listener table. Listeners run in registration order.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Vec<(ListenerId, EventKind, Listener)>,
    next_id: u64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&SpriteEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, Box::new(listener)));
        id
    }

    /// Returns `false` if the listener was already removed.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Delivers `events` in order; each event reaches every matching listener
    /// before the next event is delivered.
    pub fn dispatch(&mut self, events: &[SpriteEvent]) {
        for event in events {
            for (_, kind, listener) in &mut self.listeners {
                if kind.matches(event) {
                    listener(event);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
