//! Wire form of a single stack.

use std::io::{Read, Write};

use stockpile_registry::{ItemStack, KindRegistry, StackExtra};

use crate::{
    codec::VarUint,
    errors::{ReadError, WriteError},
    serial::{ReadFrom, WriteTo},
};

/// A stack as it travels between peers.
///
/// Encoded as:
/// - is_empty: bool
/// - if not empty:
///   - kind: u64, the hashed kind key
///   - count: VarUint
///   - extra length: VarUint, at most [`MAX_EXTRA_LEN`]
///   - extra: that many bytes
///
/// Kinds are resolved against the receiver's [`KindRegistry`] in
/// [`StackData::to_item_stack`], so decoding itself needs no registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackData {
    /// The hashed kind key, `None` for an empty stack.
    pub kind: Option<u64>,
    /// The item count.
    pub count: u32,
    /// Opaque per-stack data.
    pub extra: StackExtra,
}

/// The most extra bytes a single stack may carry on the wire.
pub const MAX_EXTRA_LEN: usize = 1024;

impl StackData {
    /// The empty stack.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A stack of `count` items of the kind hashed to `kind`.
    #[must_use]
    pub fn new(kind: u64, count: u32) -> Self {
        Self {
            kind: Some(kind),
            count,
            extra: StackExtra::new(),
        }
    }

    /// Attaches extra data.
    #[must_use]
    pub fn with_extra(mut self, extra: &[u8]) -> Self {
        self.extra = StackExtra::from_slice(extra);
        self
    }

    /// Returns whether this is the empty stack.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0 || self.kind.is_none()
    }

    /// Captures a stack for sending.
    #[must_use]
    pub fn from_item_stack(stack: &ItemStack) -> Self {
        match stack.kind() {
            Some(kind) if !stack.is_empty() => {
                Self::new(kind.key().hashed(), stack.count()).with_extra(stack.extra())
            }
            _ => Self::empty(),
        }
    }

    /// Resolves the kind against `registry`.
    ///
    /// An unknown kind is an error rather than an empty stack; it means the
    /// two peers were built from different manifests.
    pub fn to_item_stack(&self, registry: &KindRegistry) -> Result<ItemStack, ReadError> {
        let Some(hashed) = self.kind.filter(|_| self.count > 0) else {
            return Ok(ItemStack::empty());
        };
        let Some(kind) = registry.get_hashed(hashed) else {
            log::warn!(
                "Received stack of unknown kind {hashed:#018x}, peers may have mismatched registries"
            );
            return Err(ReadError::UnknownKind { hashed });
        };
        Ok(ItemStack::new(kind.clone(), self.count).with_extra(&self.extra))
    }
}

impl WriteTo for StackData {
    fn write(&self, writer: &mut impl Write) -> Result<(), WriteError> {
        match self.kind {
            Some(kind) if !self.is_empty() => {
                false.write(writer)?;
                kind.write(writer)?;
                VarUint(self.count).write(writer)?;
                if self.extra.len() > MAX_EXTRA_LEN {
                    return Err(WriteError::TooLarge {
                        what: "stack extra data",
                        value: self.extra.len(),
                    });
                }
                VarUint::write_usize(self.extra.len(), "stack extra data", writer)?;
                writer.write_all(&self.extra)?;
                Ok(())
            }
            _ => true.write(writer),
        }
    }
}

impl ReadFrom for StackData {
    fn read(data: &mut impl Read) -> Result<Self, ReadError> {
        if bool::read(data)? {
            return Ok(Self::empty());
        }
        let kind = u64::read(data)?;
        let count = VarUint::read(data)?.0;
        let len = VarUint::read_usize(data)?;
        if len > MAX_EXTRA_LEN {
            return Err(ReadError::TooLarge("stack extra data"));
        }
        let mut extra = StackExtra::from_elem(0, len);
        data.read_exact(&mut extra)?;
        Ok(Self {
            kind: Some(kind),
            count,
            extra,
        })
    }
}
