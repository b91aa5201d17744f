//! Mirroring a container on another peer.
//!
//! The owning side subscribes a [`ReplicationObserver`] to its container.
//! Every event becomes one encoded [`ContainerDelta`] packet on a channel the
//! host drains into its transport. The receiving side feeds those packets to
//! a [`ReplicaStore`].

use crossbeam::channel::{self, Receiver, Sender};
use stockpile_core::{ContainerEvent, ContainerObserver};
use stockpile_registry::{ItemStack, KindRegistry};

use crate::{delta::ContainerDelta, errors::ReadError, snapshot::ContainerSnapshot};

/// Encodes container events into delta packets.
#[derive(Debug)]
pub struct ReplicationObserver {
    outgoing: Sender<Vec<u8>>,
}

impl ReplicationObserver {
    /// Sends packets to `outgoing`.
    #[must_use]
    pub const fn new(outgoing: Sender<Vec<u8>>) -> Self {
        Self { outgoing }
    }

    /// Creates an observer together with the receiving end of its packets.
    #[must_use]
    pub fn channel() -> (Self, Receiver<Vec<u8>>) {
        let (tx, rx) = channel::unbounded();
        (Self::new(tx), rx)
    }
}

impl ContainerObserver for ReplicationObserver {
    fn on_event(&mut self, event: &ContainerEvent) {
        let packet = match ContainerDelta::from_event(event).encode() {
            Ok(packet) => packet,
            Err(err) => {
                log::error!("Failed to encode container delta: {err}");
                return;
            }
        };
        if self.outgoing.send(packet).is_err() {
            log::debug!("Replication receiver dropped, discarding delta");
        }
    }
}

/// The receiving side's copy of a container's stacks.
#[derive(Debug, Clone, Default)]
pub struct ReplicaStore {
    stacks: Vec<ItemStack>,
}

impl ReplicaStore {
    /// An empty replica, waiting for a resync.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The mirrored stacks in slot order.
    #[must_use]
    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    /// The mirrored stack at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ItemStack> {
        self.stacks.get(index)
    }

    /// Number of mirrored slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Returns whether no slots are mirrored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Replaces the contents with a snapshot.
    ///
    /// On error the replica is left unchanged.
    pub fn load(
        &mut self,
        snapshot: &ContainerSnapshot,
        registry: &KindRegistry,
    ) -> Result<(), ReadError> {
        self.stacks = snapshot.to_item_stacks(registry)?;
        Ok(())
    }

    /// Decodes a packet and applies it.
    pub fn receive(&mut self, packet: &[u8], registry: &KindRegistry) -> Result<(), ReadError> {
        let delta = ContainerDelta::decode(packet)?;
        self.apply(&delta, registry)
    }

    /// Applies one delta.
    ///
    /// On error the replica is left unchanged; the caller should ask the
    /// owner for a resync.
    pub fn apply(&mut self, delta: &ContainerDelta, registry: &KindRegistry) -> Result<(), ReadError> {
        match delta {
            ContainerDelta::Added { index, stack } => {
                self.check_index(*index, self.stacks.len() + 1)?;
                let stack = stack.to_item_stack(registry)?;
                self.stacks.insert(*index, stack);
            }
            ContainerDelta::Removed { index } => {
                self.check_index(*index, self.stacks.len())?;
                self.stacks.remove(*index);
            }
            ContainerDelta::Changed { index, stack } => {
                self.check_index(*index, self.stacks.len())?;
                self.stacks[*index] = stack.to_item_stack(registry)?;
            }
            ContainerDelta::Cleared => self.stacks.clear(),
            ContainerDelta::Resync(snapshot) => self.load(snapshot, registry)?,
        }
        Ok(())
    }

    fn check_index(&self, index: usize, bound: usize) -> Result<(), ReadError> {
        if index < bound {
            Ok(())
        } else {
            Err(ReadError::IndexOutOfRange {
                index,
                len: self.stacks.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use stockpile_core::{Container, ContainerConfig, MAX_SLOTS};
    use stockpile_registry::KindKey;

    use super::*;
    use crate::stack_data::StackData;

    const MANIFEST: &str = r#"{
        kinds: [
            { key: "stockpile:wood", max_stack_size: 64 },
            { key: "stockpile:stone", max_stack_size: 16 },
        ],
    }"#;

    fn drain(rx: &Receiver<Vec<u8>>, replica: &mut ReplicaStore, registry: &KindRegistry) {
        for packet in rx.try_iter() {
            replica.receive(&packet, registry).unwrap();
        }
    }

    #[test]
    fn test_fixed_container_mirrors() {
        let server = KindRegistry::from_json5(MANIFEST).unwrap();
        let client = KindRegistry::from_json5(MANIFEST).unwrap();
        let wood = server.get("stockpile:wood").unwrap().clone();
        let stone = server.get("stockpile:stone").unwrap().clone();

        let (observer, rx) = ReplicationObserver::channel();
        let mut container = Container::new(&ContainerConfig::fixed(4)).unwrap();
        container.subscribe(Box::new(observer));
        let mut replica = ReplicaStore::new();

        container.initialize().unwrap();
        drain(&rx, &mut replica, &client);
        assert_eq!(replica.len(), 4);
        assert!(replica.stacks().iter().all(ItemStack::is_empty));

        let mut stack = ItemStack::new(wood.clone(), 100);
        container.give(&mut stack).unwrap();
        container.set_slot(3, ItemStack::new(stone, 5)).unwrap();
        drain(&rx, &mut replica, &client);
        assert_eq!(replica.stacks(), container.snapshot().as_slice());
        assert_eq!(replica.get(1), Some(&ItemStack::new(wood.clone(), 36)));

        let mut stack = ItemStack::new(wood, 70);
        container.take(&mut stack).unwrap();
        container.swap_slots(1, 3).unwrap();
        drain(&rx, &mut replica, &client);
        assert_eq!(replica.stacks(), container.snapshot().as_slice());

        container.stop().unwrap();
        drain(&rx, &mut replica, &client);
        assert!(replica.is_empty());
    }

    #[test]
    fn test_flexible_container_mirrors() {
        let server = KindRegistry::from_json5(MANIFEST).unwrap();
        let client = KindRegistry::from_json5(MANIFEST).unwrap();
        let stone = server.get("stockpile:stone").unwrap().clone();

        let (observer, rx) = ReplicationObserver::channel();
        let mut container = Container::new(&ContainerConfig::flexible()).unwrap();
        container.subscribe(Box::new(observer));
        let mut replica = ReplicaStore::new();
        container.initialize().unwrap();

        let mut stack = ItemStack::new(stone.clone(), 40);
        container.give(&mut stack).unwrap();
        drain(&rx, &mut replica, &client);
        assert_eq!(replica.len(), 3);
        assert_eq!(replica.stacks(), container.snapshot().as_slice());

        let mut stack = ItemStack::new(stone, 20);
        container.take(&mut stack).unwrap();
        drain(&rx, &mut replica, &client);
        assert_eq!(replica.stacks(), container.snapshot().as_slice());

        container.clear().unwrap();
        drain(&rx, &mut replica, &client);
        assert!(replica.is_empty());
    }

    #[test]
    fn test_replicates_container_at_slot_limit() {
        let manifest = r#"{ kinds: [{ key: "stockpile:pebble", max_stack_size: 1 }] }"#;
        let server = KindRegistry::from_json5(manifest).unwrap();
        let client = KindRegistry::from_json5(manifest).unwrap();
        let pebble = server.get("stockpile:pebble").unwrap().clone();

        let (observer, rx) = ReplicationObserver::channel();
        let mut container = Container::flexible();
        container.subscribe(Box::new(observer));
        container.initialize().unwrap();

        let mut stack = ItemStack::new(pebble, 70_000);
        container.give(&mut stack).unwrap();
        assert_eq!(container.slot_count(), MAX_SLOTS);
        assert!(!stack.is_empty());
        container.resync().unwrap();

        let mut replica = ReplicaStore::new();
        drain(&rx, &mut replica, &client);
        assert_eq!(replica.len(), MAX_SLOTS);
        assert_eq!(replica.stacks(), container.snapshot().as_slice());

        let mut fixed = Container::fixed(MAX_SLOTS).unwrap();
        let (observer, rx) = ReplicationObserver::channel();
        fixed.subscribe(Box::new(observer));
        fixed.initialize().unwrap();
        let mut replica = ReplicaStore::new();
        drain(&rx, &mut replica, &client);
        assert_eq!(replica.len(), MAX_SLOTS);
    }

    #[test]
    fn test_unknown_kind_leaves_replica_unchanged() {
        let client = KindRegistry::from_json5(MANIFEST).unwrap();
        let mut replica = ReplicaStore::new();
        replica
            .apply(
                &ContainerDelta::Resync(ContainerSnapshot {
                    stacks: vec![StackData::empty()],
                }),
                &client,
            )
            .unwrap();

        let hashed = KindKey::hash_name("stockpile:ruby");
        let result = replica.apply(
            &ContainerDelta::Changed {
                index: 0,
                stack: StackData::new(hashed, 1),
            },
            &client,
        );
        assert!(matches!(
            result,
            Err(ReadError::UnknownKind { hashed: h }) if h == hashed
        ));
        assert_eq!(replica.stacks(), [ItemStack::empty()]);
    }

    #[test]
    fn test_index_out_of_range() {
        let client = KindRegistry::new();
        let mut replica = ReplicaStore::new();
        assert!(matches!(
            replica.apply(&ContainerDelta::Removed { index: 0 }, &client),
            Err(ReadError::IndexOutOfRange { index: 0, len: 0 })
        ));
        replica
            .apply(
                &ContainerDelta::Added {
                    index: 0,
                    stack: StackData::empty(),
                },
                &client,
            )
            .unwrap();
        assert_eq!(replica.len(), 1);
    }

    #[test]
    fn test_dropped_receiver() {
        let (mut observer, rx) = ReplicationObserver::channel();
        drop(rx);
        observer.on_event(&ContainerEvent::Cleared);
    }
}
