use std::io::{Read, Write};

use stockpile_core::{Container, MAX_SLOTS};
use stockpile_registry::{ItemStack, KindRegistry};

use crate::{
    codec::VarUint,
    errors::{ReadError, WriteError},
    serial::{ReadFrom, WriteTo},
    stack_data::StackData,
};

/// Every slot of a container, in index order.
///
/// Encoded as a VarUint slot count followed by that many [`StackData`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSnapshot {
    /// One entry per slot.
    pub stacks: Vec<StackData>,
}

impl ContainerSnapshot {
    /// Captures a list of stacks.
    pub fn from_stacks<'a>(stacks: impl IntoIterator<Item = &'a ItemStack>) -> Self {
        Self {
            stacks: stacks.into_iter().map(StackData::from_item_stack).collect(),
        }
    }

    /// Captures the current contents of `container`.
    #[must_use]
    pub fn from_container(container: &Container) -> Self {
        Self::from_stacks(container.stacks())
    }

    /// Resolves every stack, failing on the first unknown kind.
    pub fn to_item_stacks(&self, registry: &KindRegistry) -> Result<Vec<ItemStack>, ReadError> {
        self.stacks
            .iter()
            .map(|stack| stack.to_item_stack(registry))
            .collect()
    }
}

impl WriteTo for ContainerSnapshot {
    fn write(&self, writer: &mut impl Write) -> Result<(), WriteError> {
        VarUint::write_usize(self.stacks.len(), "slot count", writer)?;
        for stack in &self.stacks {
            stack.write(writer)?;
        }
        Ok(())
    }
}

impl ReadFrom for ContainerSnapshot {
    fn read(data: &mut impl Read) -> Result<Self, ReadError> {
        let len = VarUint::read_usize(data)?;
        if len > MAX_SLOTS {
            return Err(ReadError::TooLarge("slot count"));
        }
        let mut stacks = Vec::with_capacity(len);
        for _ in 0..len {
            stacks.push(StackData::read(data)?);
        }
        Ok(Self { stacks })
    }
}
