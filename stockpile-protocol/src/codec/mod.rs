//! Variable length integer encoding.

mod var_uint;

pub use var_uint::VarUint;
