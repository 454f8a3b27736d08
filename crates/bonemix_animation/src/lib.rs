//! Bonemix Animation
//!
//! Skeletal keyframe data and the runtime that plays it:
//!
//! - [`AnimationSet`]: immutable per-bone scale / rotation / translation
//!   curves, loaded once and shared through `Arc`
//! - [`AnimationController`]: fixed set of [`Track`]s with scheduled
//!   enable / speed / weight transitions, blended into bone matrices
//! - [`OutputSink`]: consumer-owned destination of the blended matrices
//!
//! # Example
//!
//! ```rust,ignore
//! let set = Arc::new(AnimationSet::load(&mut file)?);
//!
//! let mut controller = AnimationController::new(2);
//! let handle = controller.register_animation_output(BoneHash::from_name("spine"));
//! controller.register_animation_set(Arc::clone(&set));
//! controller.set_track_animation_set(0, Some(set));
//!
//! let mut matrices = vec![Mat4::IDENTITY; controller.output_count()];
//! controller.advance_time(dt, &mut matrices);
//! ```

mod blend;
mod values;

pub mod controller;
pub mod curve;
pub mod event;
pub mod output;
pub mod persist;
pub mod set;
pub mod track;

pub use blend::{Contribution, blend_contributions};
pub use controller::{AnimationCatalog, AnimationController, ControllerSettings};
pub use curve::{InterpolationMode, KeyframeCurve, KeyframeCursor};
pub use event::{Event, EventKind, EventQueue, TrackParams};
pub use output::{OutputHandle, OutputRegistry, OutputSink};
pub use persist::{load_bundle, save_bundle};
pub use set::{AnimationSet, BoneCursors, BoneOutputTrack, BonePose};
pub use track::Track;
pub use values::{Interpolatable, slerp_shortest};
