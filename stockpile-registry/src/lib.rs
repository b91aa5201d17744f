//! Item kinds, the kind registry and the item stack value type.
//!
//! Nothing in here is global: a [`KindRegistry`] is built and owned by whoever
//! hosts the containers, and stacks hold shared references to the kinds they
//! were created from.

mod item_kind;
pub mod item_stack;
mod registry;

pub use item_kind::{ItemKind, KindKey};
pub use item_stack::{ItemStack, StackExtra};
pub use registry::{KindManifest, KindRegistry, ManifestEntry, RegistryError};

/// Shared behaviour of registries that can be locked after startup.
pub trait RegistryExt {
    /// Stops accepting new entries.
    fn freeze(&mut self);

    /// Returns whether new entries are still accepted.
    fn is_frozen(&self) -> bool;
}
