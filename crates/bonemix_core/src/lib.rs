//! Bonemix Core
//!
//! Foundational types shared by every bonemix crate:
//!
//! - [`BoneHash`]: stable identifier of a bone, derived from its name
//! - [`BonemixError`] / [`Result`]: the error type used by fallible APIs

pub mod errors;
pub mod hash;

pub use errors::{BonemixError, Result};
pub use hash::BoneHash;
