//! Change notification for containers.

use crossbeam::channel::Sender;
use stockpile_registry::ItemStack;

/// A structural or content change of a container, emitted before the
/// mutating call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerEvent {
    /// A slot was inserted at `index`; later slots moved up by one.
    Added {
        /// Position of the new slot.
        index: usize,
        /// Its initial content.
        stack: ItemStack,
    },
    /// The slot at `index` was removed; later slots moved down by one.
    Removed {
        /// Position the slot had.
        index: usize,
        /// What it held.
        old: ItemStack,
    },
    /// The content of the slot at `index` changed.
    ValueChanged {
        /// Position of the slot.
        index: usize,
        /// Content before the change.
        old: ItemStack,
        /// Content after the change.
        new: ItemStack,
    },
    /// Every slot was removed.
    Cleared,
    /// The whole container should be re-read.
    FullResync {
        /// Every slot content, in index order.
        stacks: Vec<ItemStack>,
    },
}

impl ContainerEvent {
    /// The slot index this event concerns, if it concerns a single slot.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::Added { index, .. }
            | Self::Removed { index, .. }
            | Self::ValueChanged { index, .. } => Some(*index),
            Self::Cleared | Self::FullResync { .. } => None,
        }
    }
}

/// Receives container changes synchronously, inside the mutating call.
///
/// Replication layers and presentation layers implement this and register
/// with [`crate::Container::subscribe`]. Only [`ContainerObserver::on_event`]
/// is required.
pub trait ContainerObserver: Send {
    /// A change happened.
    fn on_event(&mut self, event: &ContainerEvent);

    /// The container finished initializing and accepts transfers.
    fn on_started(&mut self) {}

    /// The container stopped; no further mutation will happen.
    fn on_stopped(&mut self) {}

    /// The slot at `index` reached its capacity after a write.
    fn on_slot_overflow(&mut self, _index: usize) {}

    /// The slot at `index` became empty. For flexible containers this is
    /// reported before the slot is removed.
    fn on_slot_empty(&mut self, _index: usize) {}

    /// The slot at `index` should be redrawn even though nothing changed.
    fn on_refresh(&mut self, _index: usize) {}
}

impl ContainerObserver for Sender<ContainerEvent> {
    fn on_event(&mut self, event: &ContainerEvent) {
        if self.send(event.clone()).is_err() {
            log::debug!("Container event receiver dropped, discarding {event:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use crossbeam::channel;

    use super::*;

    #[test]
    fn test_index() {
        let event = ContainerEvent::Removed {
            index: 3,
            old: ItemStack::empty(),
        };
        assert_eq!(event.index(), Some(3));
        assert_eq!(ContainerEvent::Cleared.index(), None);
    }

    #[test]
    fn test_channel_observer() {
        let (mut tx, rx) = channel::unbounded();
        let resync = ContainerEvent::FullResync { stacks: Vec::new() };
        tx.on_event(&resync);
        tx.on_started();
        assert_eq!(rx.try_recv(), Ok(resync));
        assert!(rx.try_recv().is_err());

        drop(rx);
        tx.on_event(&ContainerEvent::Cleared);
    }
}
