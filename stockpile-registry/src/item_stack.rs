//! The item stack value type.

use std::{
    fmt::{self, Display},
    sync::Arc,
};

use smallvec::SmallVec;

use crate::ItemKind;

/// Opaque per-stack data such as durability. Stacks only merge when their
/// extra data is byte-for-byte equal.
pub type StackExtra = SmallVec<[u8; 8]>;

/// A quantity of one item kind.
///
/// A stack is empty when it has no kind or its count is zero. Empty stacks all
/// compare equal, whatever kind they still remember.
#[derive(Debug, Clone, Default)]
pub struct ItemStack {
    kind: Option<Arc<ItemKind>>,
    count: u32,
    extra: StackExtra,
}

impl ItemStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a stack of `count` items of `kind`.
    #[must_use]
    pub fn new(kind: Arc<ItemKind>, count: u32) -> Self {
        Self {
            kind: Some(kind),
            count,
            extra: StackExtra::new(),
        }
    }

    /// Attaches extra data to this stack.
    #[must_use]
    pub fn with_extra(mut self, extra: &[u8]) -> Self {
        self.extra = StackExtra::from_slice(extra);
        self
    }

    /// Returns the extra data, empty if there is none.
    #[must_use]
    pub fn extra(&self) -> &[u8] {
        &self.extra
    }

    /// Replaces the extra data.
    pub fn set_extra(&mut self, extra: &[u8]) {
        self.extra = StackExtra::from_slice(extra);
    }

    /// Creates a stack holding one full slot's worth of `kind`.
    #[must_use]
    pub fn full(kind: Arc<ItemKind>) -> Self {
        let count = kind.max_stack_size();
        Self::new(kind, count)
    }

    /// Returns the kind, if any.
    #[must_use]
    pub fn kind(&self) -> Option<&Arc<ItemKind>> {
        self.kind.as_ref()
    }

    /// Returns the item count.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Overwrites the item count.
    pub fn set_count(&mut self, count: u32) {
        self.count = count;
    }

    /// Returns whether this stack holds nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.kind.is_none() || self.count == 0
    }

    /// Returns whether both stacks are non-empty, of the same kind and carry
    /// the same extra data, i.e. whether they may merge.
    #[must_use]
    pub fn is_same_kind(&self, other: &ItemStack) -> bool {
        if self.is_empty() || other.is_empty() || self.extra != other.extra {
            return false;
        }
        match (&self.kind, &other.kind) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }

    /// Returns whether `other` is empty or of the same kind as this stack.
    #[must_use]
    pub fn is_same_or_empty(&self, other: &ItemStack) -> bool {
        other.is_empty() || self.is_same_kind(other)
    }

    /// The intrinsic max stack size of the kind, or 0 for an empty stack.
    #[must_use]
    pub fn max_stack_size(&self) -> u32 {
        if self.is_empty() {
            return 0;
        }
        self.kind.as_ref().map_or(0, |kind| kind.max_stack_size())
    }

    /// Returns a copy of this stack with a different count.
    #[must_use]
    pub fn copy_with_count(&self, count: u32) -> Self {
        Self {
            kind: self.kind.clone(),
            count,
            extra: self.extra.clone(),
        }
    }

    /// Adds `amount` to the count.
    ///
    /// # Panics
    /// Panics on `u32` overflow, which no slot capacity can reach.
    pub fn grow(&mut self, amount: u32) {
        let Some(count) = self.count.checked_add(amount) else {
            panic!("stack count overflow growing {self} by {amount}");
        };
        self.count = count;
    }

    /// Removes up to `amount` from the count.
    pub fn shrink(&mut self, amount: u32) {
        self.count = self.count.saturating_sub(amount);
    }

    /// Moves up to `amount` items out of this stack into a new one.
    pub fn split(&mut self, amount: u32) -> ItemStack {
        let moved = amount.min(self.count);
        self.count -= moved;
        self.copy_with_count(moved)
    }

    /// Moves everything out of this stack, leaving it empty.
    pub fn take_all(&mut self) -> ItemStack {
        std::mem::take(self)
    }
}

impl PartialEq for ItemStack {
    fn eq(&self, other: &Self) -> bool {
        if self.is_empty() && other.is_empty() {
            return true;
        }
        self.count == other.count && self.is_same_kind(other)
    }
}

impl Eq for ItemStack {}

impl Display for ItemStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) if self.count > 0 => write!(f, "{}x {kind}", self.count),
            _ => f.write_str("empty"),
        }
    }
}
