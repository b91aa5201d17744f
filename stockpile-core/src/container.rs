//! An ordered collection of slots with aggregate transfer semantics.

use std::{
    fmt::{self, Display},
    num::NonZeroU32,
};

use smallvec::SmallVec;
use stockpile_registry::ItemStack;
use thiserror::Error;

use crate::{
    ConfigError, ContainerConfig, ContainerEvent, ContainerObserver, MAX_SLOTS, Sizing, Slot,
    SlotFilter, TakeOrder,
};

/// Lifecycle of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// Created, no slots yet.
    Uninitialized,
    /// Slots are being created.
    Initializing,
    /// Transfers are allowed.
    Ready,
    /// Cleared and closed for good.
    Stopped,
}

impl Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Stopped => "stopped",
        })
    }
}

/// Misuse of a container. Capacity and filter rejections are not errors;
/// they show up as leftover in the caller's stack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// No slot at this index.
    #[error("slot index {index} out of range for container of {len} slots")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The slot count at the time.
        len: usize,
    },
    /// Slots were added or removed on a fixed container.
    #[error("a fixed container cannot add or remove slots")]
    FixedSize,
    /// A slot was added to a container already holding [`MAX_SLOTS`].
    #[error("container already has the maximum of {max} slots")]
    SlotLimit {
        /// [`MAX_SLOTS`].
        max: usize,
    },
    /// [`Container::initialize`] was called twice.
    #[error("container is already initialized")]
    AlreadyInitialized,
    /// The operation needs a ready container.
    #[error("container is {state}, not ready")]
    NotReady {
        /// The state at the time.
        state: ContainerState,
    },
}

/// A fixed or flexible list of slots.
///
/// Give visits slots in ascending index order and stops as soon as the
/// incoming stack is used up. Whatever is left afterwards stays in the
/// caller's stack, except in flexible containers, which append fresh slots
/// until everything fits. Take visits slots in the configured
/// [`TakeOrder`]; flexible containers drop a slot as soon as it empties.
/// Flexible growth stops at [`MAX_SLOTS`], leaving the rest in the caller's
/// stack.
///
/// Container-wide give and take predicates are checked before any slot is
/// touched.
///
/// `slots[i].index == i` holds after every call.
pub struct Container {
    slots: Vec<Slot>,
    sizing: Sizing,
    take_order: TakeOrder,
    slot_capacity: Option<NonZeroU32>,
    state: ContainerState,
    give_filter: Option<SlotFilter>,
    take_filter: Option<SlotFilter>,
    observers: SmallVec<[Box<dyn ContainerObserver>; 2]>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("slots", &self.slots)
            .field("sizing", &self.sizing)
            .field("take_order", &self.take_order)
            .field("slot_capacity", &self.slot_capacity)
            .field("state", &self.state)
            .field("give_filtered", &self.give_filter.is_some())
            .field("take_filtered", &self.take_filter.is_some())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Container {
    /// Creates an uninitialized container from a config, validating it first.
    pub fn new(config: &ContainerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            slots: Vec::new(),
            sizing: config.sizing,
            take_order: config.take_order,
            slot_capacity: config.capacity_override(),
            state: ContainerState::Uninitialized,
            give_filter: None,
            take_filter: None,
            observers: SmallVec::new(),
        })
    }

    /// Creates an uninitialized fixed container of `slots` default slots.
    pub fn fixed(slots: usize) -> Result<Self, ConfigError> {
        Self::new(&ContainerConfig::fixed(slots))
    }

    /// Creates an uninitialized flexible container.
    #[must_use]
    pub fn flexible() -> Self {
        Self {
            slots: Vec::new(),
            sizing: Sizing::Flexible,
            take_order: TakeOrder::default(),
            slot_capacity: None,
            state: ContainerState::Uninitialized,
            give_filter: None,
            take_filter: None,
            observers: SmallVec::new(),
        }
    }

    /// Only lets stacks matching `filter` be given.
    #[must_use]
    pub fn with_give_filter(
        mut self,
        filter: impl Fn(&ItemStack) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.give_filter = Some(Box::new(filter));
        self
    }

    /// Only lets stacks matching `filter` be taken.
    #[must_use]
    pub fn with_take_filter(
        mut self,
        filter: impl Fn(&ItemStack) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.take_filter = Some(Box::new(filter));
        self
    }

    /// Replaces the container-wide give predicate. `None` allows everything.
    pub fn set_give_filter(&mut self, filter: Option<SlotFilter>) {
        self.give_filter = filter;
    }

    /// Replaces the container-wide take predicate. `None` allows everything.
    pub fn set_take_filter(&mut self, filter: Option<SlotFilter>) {
        self.take_filter = filter;
    }

    /// Returns whether the container as a whole lets `stack` in.
    #[must_use]
    pub fn can_be_given(&self, stack: &ItemStack) -> bool {
        self.give_filter.as_ref().is_none_or(|filter| filter(stack))
    }

    /// Returns whether the container as a whole lets `stack` out.
    #[must_use]
    pub fn can_be_taken(&self, stack: &ItemStack) -> bool {
        self.take_filter.as_ref().is_none_or(|filter| filter(stack))
    }

    /// Registers an observer. Observers are notified in registration order.
    pub fn subscribe(&mut self, observer: Box<dyn ContainerObserver>) {
        self.observers.push(observer);
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// Returns the sizing policy.
    #[must_use]
    pub fn sizing(&self) -> Sizing {
        self.sizing
    }

    /// Returns whether transfers are currently allowed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ContainerState::Ready
    }

    /// Creates the initial slots and opens the container for transfers.
    pub fn initialize(&mut self) -> Result<(), ContainerError> {
        let capacity = self.slot_capacity;
        self.initialize_with(|index| Slot::new(index).with_capacity(capacity))
    }

    /// Like [`Container::initialize`], building each initial slot with `make`.
    ///
    /// The index passed to `make` is the one the slot ends up at.
    pub fn initialize_with(
        &mut self,
        mut make: impl FnMut(usize) -> Slot,
    ) -> Result<(), ContainerError> {
        if self.state != ContainerState::Uninitialized {
            return Err(ContainerError::AlreadyInitialized);
        }
        self.state = ContainerState::Initializing;

        let count = match self.sizing {
            Sizing::Fixed(count) => count,
            Sizing::Flexible => 0,
        };
        self.slots.reserve_exact(count);
        for index in 0..count {
            let mut slot = make(index);
            slot.index = index;
            self.slots.push(slot);
        }

        self.state = ContainerState::Ready;
        log::debug!("Container initialized with {count} slots ({:?})", self.sizing);
        for observer in &mut self.observers {
            observer.on_started();
        }
        let stacks = self.snapshot();
        self.emit(ContainerEvent::FullResync { stacks });
        Ok(())
    }

    /// Removes every slot and closes the container. Later transfers fail with
    /// [`ContainerError::NotReady`].
    pub fn stop(&mut self) -> Result<(), ContainerError> {
        self.ensure_ready()?;
        self.slots.clear();
        self.state = ContainerState::Stopped;
        log::debug!("Container stopped");
        for observer in &mut self.observers {
            observer.on_stopped();
        }
        self.emit(ContainerEvent::Cleared);
        Ok(())
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slot at `index`.
    pub fn get_slot(&self, index: usize) -> Result<&Slot, ContainerError> {
        self.slots.get(index).ok_or(ContainerError::IndexOutOfRange {
            index,
            len: self.slots.len(),
        })
    }

    /// Iterates the slots in index order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Iterates the slot contents in index order.
    pub fn stacks(&self) -> impl Iterator<Item = &ItemStack> {
        self.slots.iter().map(Slot::content)
    }

    /// Copies every slot content, in index order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ItemStack> {
        self.stacks().cloned().collect()
    }

    /// Returns whether every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Slot::is_empty)
    }

    /// Total amount of `stack`'s kind that could be taken. `stack` only
    /// selects the kind and must be non-empty.
    #[must_use]
    pub fn count_of(&self, stack: &ItemStack) -> u64 {
        if !self.can_be_taken(stack) {
            return 0;
        }
        self.slots
            .iter()
            .map(|slot| u64::from(slot.available_count(stack)))
            .sum()
    }

    /// Total amount of `stack`'s kind that could be given.
    ///
    /// Flexible containers also count the slots they could still grow by.
    #[must_use]
    pub fn space_for(&self, stack: &ItemStack) -> u64 {
        if stack.is_empty() || !self.can_be_given(stack) {
            return 0;
        }
        let existing: u64 = self
            .slots
            .iter()
            .map(|slot| u64::from(slot.available_space(stack)))
            .sum();
        if !self.sizing.is_flexible() {
            return existing;
        }

        let per_slot = self
            .slot_capacity
            .map_or_else(|| stack.max_stack_size(), NonZeroU32::get);
        let growable = MAX_SLOTS.saturating_sub(self.slots.len()) as u64;
        existing + growable * u64::from(per_slot)
    }

    /// Deposits `stack` into the slots.
    ///
    /// `stack` is decremented in place by what was stored and keeps the
    /// leftover. Returns the amount stored.
    pub fn give(&mut self, stack: &mut ItemStack) -> Result<u32, ContainerError> {
        self.ensure_ready()?;
        if stack.is_empty() || !self.can_be_given(stack) {
            return Ok(0);
        }

        let before = stack.count();
        let mut index = 0;
        while index < self.slots.len() && !stack.is_empty() {
            self.give_to_slot(index, stack);
            index += 1;
        }

        if !stack.is_empty() && self.sizing.is_flexible() {
            self.grow_for(stack);
        }

        let given = before - stack.count();
        log::trace!("Gave {given} of {before}, {} left over", stack.count());
        Ok(given)
    }

    /// Withdraws `stack` from the slots.
    ///
    /// `stack` is decremented in place by what was withdrawn and keeps the
    /// unfulfilled remainder. Returns the amount withdrawn.
    pub fn take(&mut self, stack: &mut ItemStack) -> Result<u32, ContainerError> {
        self.ensure_ready()?;
        if stack.is_empty() || !self.can_be_taken(stack) {
            return Ok(0);
        }

        let before = stack.count();
        match self.take_order {
            TakeOrder::Forward => {
                let mut index = 0;
                while index < self.slots.len() && !stack.is_empty() {
                    // A removed slot shifts its successor into `index`.
                    if !self.take_from_slot(index, stack) {
                        index += 1;
                    }
                }
            }
            TakeOrder::Reverse => {
                let mut index = self.slots.len();
                while index > 0 && !stack.is_empty() {
                    index -= 1;
                    self.take_from_slot(index, stack);
                }
            }
        }

        let taken = before - stack.count();
        log::trace!("Took {taken} of {before}, {} unfulfilled", stack.count());
        Ok(taken)
    }

    /// Gives a copy of `stack`, leaving the caller's stack untouched.
    /// Returns the amount stored.
    pub fn give_unchanged(&mut self, stack: &ItemStack) -> Result<u32, ContainerError> {
        let mut copy = stack.clone();
        self.give(&mut copy)
    }

    /// Takes a copy of `stack`, leaving the caller's stack untouched.
    /// Returns the amount withdrawn.
    pub fn take_unchanged(&mut self, stack: &ItemStack) -> Result<u32, ContainerError> {
        let mut copy = stack.clone();
        self.take(&mut copy)
    }

    /// Overwrites the content of one slot. Returns the surplus that did not
    /// fit, or the whole stack if the slot's filter rejected it.
    pub fn set_slot(
        &mut self,
        index: usize,
        stack: ItemStack,
    ) -> Result<ItemStack, ContainerError> {
        self.ensure_ready()?;
        self.check_index(index)?;

        let slot = &mut self.slots[index];
        let old = slot.content().clone();
        let surplus = slot.set(stack);
        let new = slot.content().clone();
        let full = slot.is_full();
        if old == new {
            return Ok(surplus);
        }

        let emptied = new.is_empty();
        self.emit(ContainerEvent::ValueChanged { index, old, new });
        if full {
            self.notify_overflow(index);
        }
        if emptied {
            self.slot_emptied(index);
        }
        Ok(surplus)
    }

    /// Empties one slot and returns what it held.
    pub fn clear_slot(&mut self, index: usize) -> Result<ItemStack, ContainerError> {
        self.ensure_ready()?;
        self.check_index(index)?;

        let old = self.slots[index].clear();
        if !old.is_empty() {
            self.emit(ContainerEvent::ValueChanged {
                index,
                old: old.clone(),
                new: ItemStack::empty(),
            });
            self.slot_emptied(index);
        }
        Ok(old)
    }

    /// Empties the container: every slot of a fixed container, every slot
    /// entirely for a flexible one.
    pub fn clear(&mut self) -> Result<(), ContainerError> {
        match self.sizing {
            Sizing::Fixed(_) => {
                self.ensure_ready()?;
                for index in 0..self.slots.len() {
                    self.clear_slot(index)?;
                }
                Ok(())
            }
            Sizing::Flexible => self.clear_slots(),
        }
    }

    /// Inserts `slot` at `slot.index`, shifting later slots up, and stores
    /// as much of `initial` in it as fits. Returns the surplus.
    ///
    /// Only flexible containers change their slot count.
    pub fn add_slot(
        &mut self,
        mut slot: Slot,
        initial: ItemStack,
    ) -> Result<ItemStack, ContainerError> {
        self.ensure_flexible()?;
        if self.slots.len() >= MAX_SLOTS {
            return Err(ContainerError::SlotLimit { max: MAX_SLOTS });
        }
        let index = slot.index;
        if index > self.slots.len() {
            return Err(ContainerError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            });
        }

        let surplus = slot.set(initial);
        let stack = slot.content().clone();
        let full = slot.is_full();
        self.slots.insert(index, slot);
        self.reindex_from(index);
        self.emit(ContainerEvent::Added { index, stack });
        if full {
            self.notify_overflow(index);
        }
        Ok(surplus)
    }

    /// Removes the slot at `index`, shifting later slots down. Returns what
    /// it held.
    pub fn remove_slot(&mut self, index: usize) -> Result<ItemStack, ContainerError> {
        self.ensure_flexible()?;
        self.check_index(index)?;
        Ok(self.remove_slot_unchecked(index))
    }

    /// Removes every slot.
    pub fn clear_slots(&mut self) -> Result<(), ContainerError> {
        self.ensure_flexible()?;
        self.slots.clear();
        self.emit(ContainerEvent::Cleared);
        Ok(())
    }

    /// Replaces the accept filter of one slot.
    pub fn set_slot_filter(
        &mut self,
        index: usize,
        filter: Option<SlotFilter>,
    ) -> Result<(), ContainerError> {
        self.ensure_ready()?;
        self.check_index(index)?;
        self.slots[index].set_filter(filter);
        Ok(())
    }

    /// Allows or forbids withdrawing from one slot.
    pub fn set_slot_can_be_taken(
        &mut self,
        index: usize,
        can_be_taken: bool,
    ) -> Result<(), ContainerError> {
        self.ensure_ready()?;
        self.check_index(index)?;
        self.slots[index].set_can_be_taken(can_be_taken);
        Ok(())
    }

    /// Swaps the contents of two slots if both allow it. Returns whether the
    /// swap happened.
    pub fn swap_slots(&mut self, a: usize, b: usize) -> Result<bool, ContainerError> {
        self.ensure_ready()?;
        self.check_index(a)?;
        self.check_index(b)?;
        if a == b {
            return Ok(true);
        }

        let (low, high) = (a.min(b), a.max(b));
        let (head, tail) = self.slots.split_at_mut(high);
        let (first, second) = (&mut head[low], &mut tail[0]);
        let old_first = first.content().clone();
        let old_second = second.content().clone();
        if !first.swap_with(second) {
            return Ok(false);
        }

        self.emit(ContainerEvent::ValueChanged {
            index: low,
            old: old_first.clone(),
            new: old_second.clone(),
        });
        self.emit(ContainerEvent::ValueChanged {
            index: high,
            old: old_second,
            new: old_first,
        });
        Ok(true)
    }

    /// Asks observers to redraw the slot at `index`.
    pub fn refresh(&mut self, index: usize) -> Result<(), ContainerError> {
        self.ensure_ready()?;
        self.check_index(index)?;
        for observer in &mut self.observers {
            observer.on_refresh(index);
        }
        Ok(())
    }

    /// Sends observers the whole container.
    pub fn resync(&mut self) -> Result<(), ContainerError> {
        self.ensure_ready()?;
        let stacks = self.snapshot();
        self.emit(ContainerEvent::FullResync { stacks });
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), ContainerError> {
        if self.state == ContainerState::Ready {
            Ok(())
        } else {
            Err(ContainerError::NotReady { state: self.state })
        }
    }

    fn ensure_flexible(&self) -> Result<(), ContainerError> {
        self.ensure_ready()?;
        if self.sizing.is_flexible() {
            Ok(())
        } else {
            Err(ContainerError::FixedSize)
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ContainerError> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(ContainerError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            })
        }
    }

    fn emit(&mut self, event: ContainerEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }

    fn notify_overflow(&mut self, index: usize) {
        for observer in &mut self.observers {
            observer.on_slot_overflow(index);
        }
    }

    fn reindex_from(&mut self, start: usize) {
        for (index, slot) in self.slots.iter_mut().enumerate().skip(start) {
            slot.index = index;
        }
    }

    fn remove_slot_unchecked(&mut self, index: usize) -> ItemStack {
        let mut slot = self.slots.remove(index);
        self.reindex_from(index);
        let old = slot.clear();
        self.emit(ContainerEvent::Removed {
            index,
            old: old.clone(),
        });
        old
    }

    /// Reports an emptied slot and, for flexible containers, removes it.
    /// Returns whether the slot was removed.
    fn slot_emptied(&mut self, index: usize) -> bool {
        for observer in &mut self.observers {
            observer.on_slot_empty(index);
        }
        if self.sizing.is_flexible() {
            log::debug!("Removing emptied slot {index}");
            self.remove_slot_unchecked(index);
            return true;
        }
        false
    }

    fn give_to_slot(&mut self, index: usize, stack: &mut ItemStack) -> u32 {
        let slot = &mut self.slots[index];
        if slot.available_space(stack) == 0 {
            return 0;
        }

        let old = slot.content().clone();
        let moved = slot.give(stack);
        let new = slot.content().clone();
        let full = slot.is_full();
        log::trace!("Slot {index}: {old} -> {new}");

        self.emit(ContainerEvent::ValueChanged { index, old, new });
        if full {
            self.notify_overflow(index);
        }
        moved
    }

    /// Returns whether the slot was removed because it emptied.
    fn take_from_slot(&mut self, index: usize, stack: &mut ItemStack) -> bool {
        let slot = &mut self.slots[index];
        if slot.available_count(stack) == 0 {
            return false;
        }

        let old = slot.content().clone();
        slot.take(stack);
        let new = slot.content().clone();
        log::trace!("Slot {index}: {old} -> {new}");

        let emptied = new.is_empty();
        self.emit(ContainerEvent::ValueChanged { index, old, new });
        emptied && self.slot_emptied(index)
    }

    /// Appends default slots until `stack` is used up or the container holds
    /// [`MAX_SLOTS`].
    fn grow_for(&mut self, stack: &mut ItemStack) {
        while !stack.is_empty() {
            let index = self.slots.len();
            if index >= MAX_SLOTS {
                log::debug!(
                    "Flexible container hit {MAX_SLOTS} slots, leaving {} over",
                    stack.count()
                );
                break;
            }
            let capacity = self.slot_capacity;
            self.slots.push(Slot::new(index).with_capacity(capacity));
            log::debug!("Growing flexible container to {} slots", index + 1);
            self.emit(ContainerEvent::Added {
                index,
                stack: ItemStack::empty(),
            });

            if self.give_to_slot(index, stack) == 0 {
                self.remove_slot_unchecked(index);
                break;
            }
        }
    }
}
