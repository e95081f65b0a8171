//! Small helpers shared by the protocol modules.

mod rand_compat;
pub(crate) mod serde;

pub(crate) use rand_compat::RngCompat;
pub use serde::{deserialize, serialize};
