//! Incremental container updates.

use std::io::{Cursor, Read, Write};

use stockpile_core::ContainerEvent;

use crate::{
    codec::VarUint,
    errors::{ReadError, WriteError},
    serial::{ReadFrom, WriteTo},
    snapshot::ContainerSnapshot,
    stack_data::StackData,
};

/// One container change as sent to a replica.
///
/// Each delta starts with a tag byte, followed by the variant's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerDelta {
    /// A slot was inserted at `index`.
    Added {
        /// Position of the new slot.
        index: usize,
        /// Its content.
        stack: StackData,
    },
    /// The slot at `index` was removed.
    Removed {
        /// Position the slot had.
        index: usize,
    },
    /// The slot at `index` now holds `stack`.
    Changed {
        /// Position of the slot.
        index: usize,
        /// The new content.
        stack: StackData,
    },
    /// Every slot was removed.
    Cleared,
    /// The replica should replace its contents.
    Resync(ContainerSnapshot),
}

impl ContainerDelta {
    const ADDED: u8 = 0;
    const REMOVED: u8 = 1;
    const CHANGED: u8 = 2;
    const CLEARED: u8 = 3;
    const RESYNC: u8 = 4;

    /// Converts a container event into the delta a replica needs.
    #[must_use]
    pub fn from_event(event: &ContainerEvent) -> Self {
        match event {
            ContainerEvent::Added { index, stack } => Self::Added {
                index: *index,
                stack: StackData::from_item_stack(stack),
            },
            ContainerEvent::Removed { index, .. } => Self::Removed { index: *index },
            ContainerEvent::ValueChanged { index, new, .. } => Self::Changed {
                index: *index,
                stack: StackData::from_item_stack(new),
            },
            ContainerEvent::Cleared => Self::Cleared,
            ContainerEvent::FullResync { stacks } => {
                Self::Resync(ContainerSnapshot::from_stacks(stacks))
            }
        }
    }

    /// Encodes into a fresh buffer.
    pub fn encode(&self) -> Result<Vec<u8>, WriteError> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(buf)
    }

    /// Decodes a whole packet.
    pub fn decode(packet: &[u8]) -> Result<Self, ReadError> {
        let mut data = Cursor::new(packet);
        let delta = Self::read(&mut data)?;
        let trailing = packet.len() as u64 - data.position();
        if trailing > 0 {
            log::warn!("Ignoring {trailing} trailing bytes after container delta");
        }
        Ok(delta)
    }
}

impl WriteTo for ContainerDelta {
    fn write(&self, writer: &mut impl Write) -> Result<(), WriteError> {
        match self {
            Self::Added { index, stack } => {
                Self::ADDED.write(writer)?;
                VarUint::write_usize(*index, "slot index", writer)?;
                stack.write(writer)
            }
            Self::Removed { index } => {
                Self::REMOVED.write(writer)?;
                VarUint::write_usize(*index, "slot index", writer)
            }
            Self::Changed { index, stack } => {
                Self::CHANGED.write(writer)?;
                VarUint::write_usize(*index, "slot index", writer)?;
                stack.write(writer)
            }
            Self::Cleared => Self::CLEARED.write(writer),
            Self::Resync(snapshot) => {
                Self::RESYNC.write(writer)?;
                snapshot.write(writer)
            }
        }
    }
}

impl ReadFrom for ContainerDelta {
    fn read(data: &mut impl Read) -> Result<Self, ReadError> {
        match u8::read(data)? {
            Self::ADDED => Ok(Self::Added {
                index: VarUint::read_usize(data)?,
                stack: StackData::read(data)?,
            }),
            Self::REMOVED => Ok(Self::Removed {
                index: VarUint::read_usize(data)?,
            }),
            Self::CHANGED => Ok(Self::Changed {
                index: VarUint::read_usize(data)?,
                stack: StackData::read(data)?,
            }),
            Self::CLEARED => Ok(Self::Cleared),
            Self::RESYNC => Ok(Self::Resync(ContainerSnapshot::read(data)?)),
            tag => Err(ReadError::UnknownTag(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use stockpile_registry::ItemStack;

    use super::*;

    #[test]
    fn test_changed_carries_new_value() {
        let delta = ContainerDelta::from_event(&ContainerEvent::ValueChanged {
            index: 4,
            old: ItemStack::empty(),
            new: ItemStack::empty(),
        });
        assert_eq!(
            delta,
            ContainerDelta::Changed {
                index: 4,
                stack: StackData::empty(),
            }
        );
        assert_eq!(delta.encode().unwrap(), [2, 4, 1]);
    }

    #[test]
    fn test_tags() {
        assert_eq!(ContainerDelta::Removed { index: 1 }.encode().unwrap(), [1, 1]);
        assert_eq!(ContainerDelta::Cleared.encode().unwrap(), [3]);
        assert_eq!(
            ContainerDelta::Resync(ContainerSnapshot::default())
                .encode()
                .unwrap(),
            [4, 0]
        );
    }

    #[test]
    fn test_decode() {
        let delta = ContainerDelta::Added {
            index: 200,
            stack: StackData::new(0xDEAD_BEEF, 12),
        };
        let packet = delta.encode().unwrap();
        assert_eq!(ContainerDelta::decode(&packet).unwrap(), delta);
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            ContainerDelta::decode(&[9]),
            Err(ReadError::UnknownTag(9))
        ));
        assert!(matches!(
            ContainerDelta::decode(&[]),
            Err(ReadError::Io(_))
        ));
    }
}
