use std::sync::Arc;

use bonemix_core::BoneHash;

use crate::blend::{BlendBuffer, Contribution};
use crate::curve::InterpolationMode;
use crate::event::{EventQueue, TrackParams};
use crate::output::{OutputHandle, OutputRegistry};
use crate::set::{AnimationSet, BoneCursors};

/// A bone output of the bound set resolved to a registered output slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrackBinding {
    pub bone_output: usize,
    pub bone: BoneHash,
    pub output: OutputHandle,
    pub cursors: BoneCursors,
}

/// One playback channel of an [`AnimationController`](crate::AnimationController).
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub(crate) params: TrackParams,
    /// Local time in seconds.
    pub(crate) position: f32,
    pub(crate) set: Option<Arc<AnimationSet>>,
    pub(crate) bindings: Vec<TrackBinding>,
    pub(crate) events: EventQueue,
}

impl Track {
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.params.enabled
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.params.speed
    }

    #[inline]
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.params.weight
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> f32 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn animation_set(&self) -> Option<&Arc<AnimationSet>> {
        self.set.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Number of bone outputs of the bound set that found an output slot.
    #[inline]
    #[must_use]
    pub fn bound_bone_count(&self) -> usize {
        self.bindings.len()
    }

    /// Binds `set`, resolving each bone output by the deepest hash of its
    /// hierarchy path. Bones missing from `registry` are skipped.
    pub(crate) fn bind(&mut self, set: Option<Arc<AnimationSet>>, registry: &OutputRegistry) {
        self.bindings.clear();
        if let Some(anim) = &set {
            for (index, (track, hierarchy)) in anim
                .bone_outputs()
                .iter()
                .zip(anim.bones_hierarchy())
                .enumerate()
            {
                let bone = hierarchy.last().copied().unwrap_or(track.bone());
                match registry.handle_of(bone) {
                    Some(output) => self.bindings.push(TrackBinding {
                        bone_output: index,
                        bone,
                        output,
                        cursors: BoneCursors::default(),
                    }),
                    None => log::trace!(
                        "Animation '{}': bone {bone} has no output, skipped",
                        anim.name()
                    ),
                }
            }
            log::debug!(
                "Bound animation '{}' ({}/{} bones matched)",
                anim.name(),
                self.bindings.len(),
                anim.bone_output_count()
            );
        }
        self.set = set;
    }

    /// Stops driving the listed bones until the next bind.
    pub(crate) fn unbind_bones(&mut self, bones: &[BoneHash]) {
        self.bindings.retain(|binding| !bones.contains(&binding.bone));
    }

    /// Whether the track takes part in this step's blend.
    pub(crate) fn contributes(&self) -> bool {
        self.params.enabled && self.params.weight > 0.0 && self.set.is_some()
    }

    /// Moves local time forward by `dt * speed`, looping over the set duration.
    pub(crate) fn advance(&mut self, dt: f32) {
        let Some(set) = &self.set else {
            return;
        };
        self.position += dt * self.params.speed;
        let duration = set.duration_seconds();
        if duration > 0.0 {
            self.position = self.position.rem_euclid(duration);
        } else {
            self.position = 0.0;
        }
    }

    /// Samples every bound bone at the current position into `buffer`.
    pub(crate) fn sample_into(
        &mut self,
        track_index: usize,
        mode: InterpolationMode,
        buffer: &mut BlendBuffer,
    ) {
        let Some(set) = &self.set else {
            return;
        };
        let time = self.position * set.ticks_per_second();
        let weight = self.params.weight;

        for binding in &mut self.bindings {
            let Some(track) = set.bone_output(binding.bone_output) else {
                continue;
            };
            if let Some(pose) = track.sample(time, &mut binding.cursors, mode) {
                buffer.push(
                    binding.output,
                    Contribution {
                        track: track_index,
                        weight,
                        pose,
                    },
                );
            }
        }
    }
}
