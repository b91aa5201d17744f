use std::{fs, num::NonZeroU32, path::Path};

use serde::Deserialize;
use thiserror::Error;

/// The most slots a configured container may declare.
pub const MAX_SLOTS: usize = u16::MAX as usize;

/// How a container decides its slot count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sizing {
    /// Exactly this many slots, created on initialization.
    Fixed(usize),
    /// Starts empty, grows on overflow and drops slots that become empty.
    #[default]
    Flexible,
}

impl Sizing {
    /// Returns whether slots are added and removed automatically.
    #[must_use]
    pub const fn is_flexible(self) -> bool {
        matches!(self, Self::Flexible)
    }
}

/// The order slots are visited in when taking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakeOrder {
    /// Ascending slot index, the same order give uses.
    #[default]
    Forward,
    /// Descending slot index, draining the most recently added slots first.
    Reverse,
}

/// Errors raised while loading a [`ContainerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read container config: {0}")]
    Io(#[from] std::io::Error),
    /// The JSON5 could not be parsed.
    #[error("invalid container config: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A fixed container was declared without slots.
    #[error("a fixed container needs at least one slot")]
    ZeroSlots,
    /// A fixed container was declared with too many slots.
    #[error("a fixed container may have at most {max} slots, got {count}")]
    TooManySlots {
        /// The declared slot count.
        count: usize,
        /// [`MAX_SLOTS`].
        max: usize,
    },
}

/// Settings a [`crate::Container`] is built from.
///
/// ```json5
/// {
///     sizing: { fixed: 27 },
///     slot_capacity: 0,
///     take_order: "forward",
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Fixed or flexible slot count.
    pub sizing: Sizing,
    /// Capacity of every slot the container creates itself, 0 to use each
    /// kind's max stack size.
    pub slot_capacity: u32,
    /// The order [`crate::Container::take`] visits slots in.
    pub take_order: TakeOrder,
}

impl ContainerConfig {
    /// A fixed container with `slots` slots and default capacities.
    #[must_use]
    pub fn fixed(slots: usize) -> Self {
        Self {
            sizing: Sizing::Fixed(slots),
            ..Self::default()
        }
    }

    /// A flexible container with default capacities.
    #[must_use]
    pub fn flexible() -> Self {
        Self::default()
    }

    /// Sets the capacity of container created slots.
    #[must_use]
    pub const fn with_slot_capacity(mut self, slot_capacity: u32) -> Self {
        self.slot_capacity = slot_capacity;
        self
    }

    /// Sets the take order.
    #[must_use]
    pub const fn with_take_order(mut self, take_order: TakeOrder) -> Self {
        self.take_order = take_order;
        self
    }

    /// The slot capacity override, if one is configured.
    #[must_use]
    pub const fn capacity_override(&self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.slot_capacity)
    }

    /// Parses and validates a JSON5 config.
    pub fn from_json5(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json5::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON5 config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_json5(&source)
    }

    /// Checks the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Sizing::Fixed(count) = self.sizing {
            if count == 0 {
                return Err(ConfigError::ZeroSlots);
            }
            if count > MAX_SLOTS {
                return Err(ConfigError::TooManySlots {
                    count,
                    max: MAX_SLOTS,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContainerConfig::from_json5("{}").unwrap();
        assert_eq!(config.sizing, Sizing::Flexible);
        assert_eq!(config.slot_capacity, 0);
        assert_eq!(config.take_order, TakeOrder::Forward);
        assert_eq!(config.capacity_override(), None);
    }

    #[test]
    fn test_fixed_from_json5() {
        let config = ContainerConfig::from_json5(
            r#"{
                sizing: { fixed: 27 },
                slot_capacity: 64,
                take_order: "reverse",
            }"#,
        )
        .unwrap();
        assert_eq!(config.sizing, Sizing::Fixed(27));
        assert_eq!(config.capacity_override().map(NonZeroU32::get), Some(64));
        assert_eq!(config.take_order, TakeOrder::Reverse);
    }

    #[test]
    fn test_flexible_from_json5() {
        let config = ContainerConfig::from_json5(r#"{ sizing: "flexible" }"#).unwrap();
        assert!(config.sizing.is_flexible());
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            ContainerConfig::from_json5("{ sizing: { fixed: 0 } }"),
            Err(ConfigError::ZeroSlots)
        ));
        assert!(matches!(
            ContainerConfig::fixed(MAX_SLOTS + 1).validate(),
            Err(ConfigError::TooManySlots { .. })
        ));
        assert!(ContainerConfig::fixed(MAX_SLOTS).validate().is_ok());
        assert!(matches!(
            ContainerConfig::from_json5("{ sizing: 3 }"),
            Err(ConfigError::Parse(_))
        ));
    }
}
