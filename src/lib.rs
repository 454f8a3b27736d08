//! # Bonemix
//!
//! Skeletal animation sets and a multi-track blending controller.
//!
//! This umbrella crate re-exports the workspace members:
//!
//! - [`errors`] and [`hash`]: the shared error type and bone name hashing
//! - [`animation`]: keyframe data, persistence and the [`AnimationController`]
//! - [`scene`]: the [`Skeleton`] that receives blended bone matrices
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bonemix::prelude::*;
//!
//! let mut skeleton = Skeleton::new();
//! let root = skeleton.add_bone(BoneHash::from_name("root"), None, Mat4::IDENTITY);
//! skeleton.add_bone(BoneHash::from_name("spine"), Some(root), Mat4::IDENTITY);
//!
//! let mut controller = AnimationController::new(2);
//! skeleton.register_outputs(&mut controller);
//!
//! let walk = Arc::new(AnimationSet::load(&mut file)?);
//! controller.register_animation_set(Arc::clone(&walk));
//! controller.set_track_animation_set(0, Some(walk));
//!
//! controller.advance_time(1.0 / 60.0, &mut skeleton);
//! skeleton.update_world_matrices();
//! ```

pub use bonemix_animation as animation;
pub use bonemix_core::{errors, hash};
pub use bonemix_scene as scene;

pub use bonemix_animation::{
    AnimationCatalog, AnimationController, AnimationSet, BoneOutputTrack, BonePose,
    ControllerSettings, EventKind, InterpolationMode, KeyframeCurve, OutputHandle, OutputSink,
    Track, load_bundle, save_bundle,
};
pub use bonemix_core::{BoneHash, BonemixError, Result};
pub use bonemix_scene::{Bone, BoneId, Skeleton};

/// Common imports for applications driving a controller.
pub mod prelude {
    pub use crate::{
        AnimationController, AnimationSet, BoneHash, BonemixError, ControllerSettings,
        OutputSink, Skeleton,
    };
    pub use glam::{Mat4, Quat, Vec3};
}
