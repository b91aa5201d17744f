//! Slots, containers and the transfer rules between them.
//!
//! # Architecture
//!
//! - [`Slot`] - One bounded storage location holding at most one stack
//! - [`Container`] - An ordered list of slots with aggregate give/take
//! - [`ContainerEvent`] / [`ContainerObserver`] - Synchronous change notification
//! - [`ContainerConfig`] - Sizing policy and slot defaults, loadable from JSON5
//!
//! All mutation goes through a single owner. Nothing here locks; a host that
//! shares a container between threads has to serialize access itself.

mod config;
mod container;
mod event;
mod slot;

pub use config::{ConfigError, ContainerConfig, MAX_SLOTS, Sizing, TakeOrder};
pub use container::{Container, ContainerError, ContainerState};
pub use event::{ContainerEvent, ContainerObserver};
pub use slot::{Slot, SlotFilter};

pub use stockpile_registry::{ItemKind, ItemStack, KindKey, KindRegistry};
