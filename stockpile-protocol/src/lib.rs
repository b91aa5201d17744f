//! Encoding of stacks and container changes for replication between peers.
//!
//! Kinds travel as their hashed key and are resolved against the receiver's
//! own [`stockpile_registry::KindRegistry`]. Both sides must register the
//! same kinds; a kind the receiver does not know is reported as
//! [`ReadError::UnknownKind`].

pub mod codec;
mod delta;
mod errors;
pub mod replication;
pub mod serial;
mod snapshot;
mod stack_data;

pub use delta::ContainerDelta;
pub use errors::{ReadError, WriteError};
pub use replication::{ReplicaStore, ReplicationObserver};
pub use snapshot::ContainerSnapshot;
pub use stack_data::{MAX_EXTRA_LEN, StackData};
