//! A single bounded storage location.

use std::{fmt, num::NonZeroU32};

use stockpile_registry::ItemStack;

/// Predicate deciding which stacks a slot accepts.
pub type SlotFilter = Box<dyn Fn(&ItemStack) -> bool + Send + Sync>;

/// Holds at most one stack, bounded by the kind's max stack size or by a
/// per-slot capacity override.
///
/// A slot owns its content; stacks handed to [`Slot::give`] and [`Slot::set`]
/// are copied, never aliased. Give and take mutate the caller's stack in place
/// and report how much moved, so the caller reads the leftover straight from
/// its own stack.
pub struct Slot {
    /// The position within the owning container.
    pub index: usize,
    content: ItemStack,
    capacity: Option<NonZeroU32>,
    filter: Option<SlotFilter>,
    can_be_taken: bool,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("index", &self.index)
            .field("content", &self.content)
            .field("capacity", &self.capacity)
            .field("filtered", &self.filter.is_some())
            .field("can_be_taken", &self.can_be_taken)
            .finish()
    }
}

impl Slot {
    /// Creates an empty, unfiltered slot using the kind's max stack size.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            content: ItemStack::empty(),
            capacity: None,
            filter: None,
            can_be_taken: true,
        }
    }

    /// Overrides the capacity. `None` defers to the kind's max stack size.
    #[must_use]
    pub fn with_capacity(mut self, capacity: Option<NonZeroU32>) -> Self {
        self.capacity = capacity;
        self
    }

    /// Restricts which stacks this slot accepts.
    #[must_use]
    pub fn with_filter(
        mut self,
        filter: impl Fn(&ItemStack) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Replaces the accept filter. `None` accepts everything.
    pub fn set_filter(&mut self, filter: Option<SlotFilter>) {
        self.filter = filter;
    }

    /// Returns whether stacks may be withdrawn from this slot.
    #[must_use]
    pub fn can_be_taken(&self) -> bool {
        self.can_be_taken
    }

    /// Allows or forbids withdrawing from this slot.
    pub fn set_can_be_taken(&mut self, can_be_taken: bool) {
        self.can_be_taken = can_be_taken;
    }

    /// Returns the capacity override.
    #[must_use]
    pub fn capacity(&self) -> Option<NonZeroU32> {
        self.capacity
    }

    /// Returns the current content.
    #[must_use]
    pub fn content(&self) -> &ItemStack {
        &self.content
    }

    /// Returns whether the slot holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns whether the content has reached its capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        !self.content.is_empty() && self.content.count() >= self.max_capacity(&self.content)
    }

    /// Returns whether the accept filter lets `candidate` in.
    #[must_use]
    pub fn accepts(&self, candidate: &ItemStack) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(candidate))
    }

    /// How many of `candidate`'s kind this slot can hold in total.
    #[must_use]
    pub fn max_capacity(&self, candidate: &ItemStack) -> u32 {
        match self.capacity {
            Some(capacity) => capacity.get(),
            None => candidate.max_stack_size(),
        }
    }

    /// How many more of `candidate` this slot would take right now.
    #[must_use]
    pub fn available_space(&self, candidate: &ItemStack) -> u32 {
        if !self.accepts(candidate) {
            return 0;
        }
        if self.content.is_empty() {
            self.max_capacity(candidate)
        } else if self.content.is_same_kind(candidate) {
            self.max_capacity(candidate)
                .saturating_sub(self.content.count())
        } else {
            0
        }
    }

    /// How many of `candidate` could be withdrawn right now.
    ///
    /// The accept filter does not apply; only the take gate does.
    #[must_use]
    pub fn available_count(&self, candidate: &ItemStack) -> u32 {
        if !self.can_be_taken || !self.content.is_same_kind(candidate) {
            return 0;
        }
        self.content.count()
    }

    /// Moves as much of `incoming` as fits into this slot.
    ///
    /// Returns the amount moved; `incoming` keeps the leftover.
    pub fn give(&mut self, incoming: &mut ItemStack) -> u32 {
        if incoming.is_empty() {
            return 0;
        }
        let moved = self.available_space(incoming).min(incoming.count());
        if moved == 0 {
            return 0;
        }

        if self.content.is_empty() {
            self.content = incoming.copy_with_count(moved);
        } else {
            self.content.grow(moved);
        }
        incoming.shrink(moved);
        moved
    }

    /// Withdraws as much of `requested` as this slot holds.
    ///
    /// Returns the amount moved; `requested` keeps what is still wanted.
    pub fn take(&mut self, requested: &mut ItemStack) -> u32 {
        if requested.is_empty() {
            return 0;
        }
        let moved = self.available_count(requested).min(requested.count());
        if moved == 0 {
            return 0;
        }

        self.content.shrink(moved);
        requested.shrink(moved);
        if self.content.is_empty() {
            self.content = ItemStack::empty();
        }
        moved
    }

    /// Overwrites the content with as much of `stack` as fits.
    ///
    /// Returns the surplus that was not stored. A stack the filter rejects is
    /// returned whole and the slot is left untouched; an empty stack clears
    /// the slot.
    pub fn set(&mut self, mut stack: ItemStack) -> ItemStack {
        if stack.is_empty() {
            self.content = ItemStack::empty();
            return stack;
        }
        if !self.accepts(&stack) {
            return stack;
        }

        let capacity = self.max_capacity(&stack);
        self.content = stack.split(capacity);
        stack
    }

    /// Empties the slot, returning what it held.
    pub fn clear(&mut self) -> ItemStack {
        self.content.take_all()
    }

    /// Exchanges contents with `other` when both sides allow it.
    ///
    /// Each slot must let its content be taken and accept the other's content
    /// within capacity. Returns whether the swap happened.
    pub fn swap_with(&mut self, other: &mut Slot) -> bool {
        let fits = |slot: &Slot, stack: &ItemStack| {
            stack.is_empty() || (slot.accepts(stack) && stack.count() <= slot.max_capacity(stack))
        };

        if !self.can_be_taken
            || !other.can_be_taken
            || !fits(&*self, &other.content)
            || !fits(&*other, &self.content)
        {
            return false;
        }
        std::mem::swap(&mut self.content, &mut other.content);
        true
    }
}
