//! Territory notifications and their observer registry

use std::fmt;

/// Something that changed in the territory overlay
#[derive(Debug, Clone, PartialEq)]
pub enum TerritoryEvent {
    /// A capital city was founded
    CapitalPlaced { cell: usize, name: String },
    /// A time-gated claim was opened
    ConquestStarted { cell: usize, required: f32 },
    /// A cell became owned
    CellCaptured { cell: usize, territory_size: usize },
    /// A time-gated claim finished
    ConquestCompleted { cell: usize, elapsed: f32 },
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Boxed observer callback
pub type Observer = Box<dyn FnMut(&TerritoryEvent) + Send>;

/// Ordered list of observers
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Observer)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    /// Remove an observer; false if `id` was not registered
    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Deliver `event` to every observer in subscription order
    pub(crate) fn emit(&mut self, event: &TerritoryEvent) {
        log::trace!("territory event {:?}", event);
        for (_, observer) in &mut self.entries {
            observer(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::default();

        let sink = Arc::clone(&seen);
        let first = observers.subscribe(Box::new(move |event: &TerritoryEvent| {
            sink.lock().unwrap().push(event.clone());
        }));
        let second = observers.subscribe(Box::new(|_: &TerritoryEvent| {}));
        assert_ne!(first, second);
        assert_eq!(observers.len(), 2);

        let event = TerritoryEvent::CellCaptured {
            cell: 3,
            territory_size: 1,
        };
        observers.emit(&event);
        assert!(observers.unsubscribe(first));
        assert!(!observers.unsubscribe(first));
        observers.emit(&event);

        assert_eq!(*seen.lock().unwrap(), vec![event]);
        assert_eq!(observers.len(), 1);
    }
}
