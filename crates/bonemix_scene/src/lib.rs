//! Bonemix Scene
//!
//! The consumer side of the animation controller: an arena-indexed
//! [`Skeleton`] that owns the bone matrices the controller writes into.

pub mod skeleton;

pub use skeleton::{Bone, BoneId, Skeleton};
