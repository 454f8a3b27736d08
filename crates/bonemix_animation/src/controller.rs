//! Animation Controller
//!
//! [`AnimationController`] drives a fixed number of [`Track`]s, each bound to
//! at most one shared [`AnimationSet`], and blends them into per-bone
//! matrices.
//!
//! # Frame flow
//!
//! ```text
//! advance_time(dt, sink)
//!   ├─ clock += dt
//!   ├─ per track: apply due events (enable / speed / weight)
//!   ├─ per contributing track: advance local time, sample bound bones
//!   └─ per touched output: blend contributions → write matrix into sink
//! ```
//!
//! # Sharing
//!
//! The animation set catalog and the output registry live behind
//! `Arc<RwLock<_>>`. [`AnimationController::clone_controller`] shares both
//! and copies every track by value, so many characters can play the same
//! loaded animations independently.

use std::sync::Arc;

use bonemix_core::BoneHash;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::blend::BlendBuffer;
use crate::curve::InterpolationMode;
use crate::event::{Event, EventKind};
use crate::output::{OutputHandle, OutputRegistry, OutputSink};
use crate::set::AnimationSet;
use crate::track::Track;

/// Construction-time settings of an [`AnimationController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Number of tracks; fixed for the controller's lifetime.
    pub track_count: usize,
    /// Linear keyframe interpolation; when off, keys are held (step).
    pub interpolation: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            track_count: 2,
            interpolation: true,
        }
    }
}

/// Name-indexed list of the animation sets known to a controller.
#[derive(Debug, Default, Clone)]
pub struct AnimationCatalog {
    sets: Vec<Arc<AnimationSet>>,
    by_name: FxHashMap<String, usize>,
}

impl AnimationCatalog {
    /// Adds `set`. When several sets share a name, lookups by name return
    /// the first one registered.
    pub fn register(&mut self, set: Arc<AnimationSet>) {
        let index = self.sets.len();
        self.by_name.entry(set.name().to_owned()).or_insert(index);
        self.sets.push(set);
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<AnimationSet>> {
        self.sets.get(index)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Arc<AnimationSet>> {
        self.by_name.get(name).and_then(|&index| self.sets.get(index))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AnimationSet>> {
        self.sets.iter()
    }
}

/// Multi-track skeletal animation player.
///
/// Not meant for concurrent use: every mutating call takes `&mut self`.
/// Distinct controllers (including clones) may live on different threads.
#[derive(Debug)]
pub struct AnimationController {
    cloned: bool,
    catalog: Arc<RwLock<AnimationCatalog>>,
    outputs: Arc<RwLock<OutputRegistry>>,
    tracks: Vec<Track>,
    time: f32,
    interpolation: bool,
    blend: BlendBuffer,
}

impl AnimationController {
    #[must_use]
    pub fn new(track_count: usize) -> Self {
        Self::with_settings(ControllerSettings {
            track_count,
            ..Default::default()
        })
    }

    #[must_use]
    pub fn with_settings(settings: ControllerSettings) -> Self {
        Self {
            cloned: false,
            catalog: Arc::default(),
            outputs: Arc::default(),
            tracks: vec![Track::default(); settings.track_count],
            time: 0.0,
            interpolation: settings.interpolation,
            blend: BlendBuffer::default(),
        }
    }

    /// New controller sharing this one's catalog and output registry, with
    /// every track copied by value.
    #[must_use]
    pub fn clone_controller(&self) -> Self {
        Self {
            cloned: true,
            catalog: Arc::clone(&self.catalog),
            outputs: Arc::clone(&self.outputs),
            tracks: self.tracks.clone(),
            time: self.time,
            interpolation: self.interpolation,
            blend: BlendBuffer::default(),
        }
    }

    /// True for controllers produced by [`Self::clone_controller`].
    #[inline]
    #[must_use]
    pub fn is_clone(&self) -> bool {
        self.cloned
    }

    /// True when both controllers use the same catalog and output registry.
    #[must_use]
    pub fn shares_data_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.catalog, &other.catalog) && Arc::ptr_eq(&self.outputs, &other.outputs)
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Registers the destination slot of `bone`.
    ///
    /// Must happen before the first [`Self::advance_time`]. Registering the
    /// same bone again returns the existing handle.
    pub fn register_animation_output(&mut self, bone: BoneHash) -> OutputHandle {
        self.outputs.write().register(bone)
    }

    #[must_use]
    pub fn output_handle(&self, bone: BoneHash) -> Option<OutputHandle> {
        self.outputs.read().handle_of(bone)
    }

    #[must_use]
    pub fn output_count(&self) -> usize {
        self.outputs.read().len()
    }

    pub fn register_animation_set(&mut self, set: Arc<AnimationSet>) {
        self.catalog.write().register(set);
    }

    #[must_use]
    pub fn animation_set(&self, index: usize) -> Option<Arc<AnimationSet>> {
        self.catalog.read().get(index).cloned()
    }

    #[must_use]
    pub fn animation_set_by_name(&self, name: &str) -> Option<Arc<AnimationSet>> {
        self.catalog.read().by_name(name).cloned()
    }

    #[must_use]
    pub fn animation_set_count(&self) -> usize {
        self.catalog.read().len()
    }

    /// Snapshot of the catalog in registration order.
    #[must_use]
    pub fn animation_sets(&self) -> Vec<Arc<AnimationSet>> {
        self.catalog.read().iter().cloned().collect()
    }

    /// Binds `set` to `track` (or unbinds with `None`).
    ///
    /// Only that track's transient blend state is discarded; its time,
    /// weight, speed and pending events are kept.
    ///
    /// # Panics
    ///
    /// Panics when `track` is out of range.
    pub fn set_track_animation_set(&mut self, track: usize, set: Option<Arc<AnimationSet>>) {
        let outputs = Arc::clone(&self.outputs);
        let registry = outputs.read();
        self.track_mut(track).bind(set, &registry);
    }

    /// Instantly drops the listed bones from every track except `skip_track`.
    ///
    /// Used when switching animations so bones driven by the new track are
    /// not blended with stale poses from the old one.
    pub fn reset_bones_transition(&mut self, skip_track: usize, bones: &[BoneHash]) {
        for (index, track) in self.tracks.iter_mut().enumerate() {
            if index != skip_track {
                track.unbind_bones(bones);
            }
        }
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Resets the clock to zero and drops every pending event.
    pub fn reset(&mut self) {
        self.time = 0.0;
        for track in &mut self.tracks {
            track.events.clear();
        }
    }

    /// Controller clock in seconds.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn add_event_enable(&mut self, track: usize, enable: bool, delay: f32) {
        let target = if enable { 1.0 } else { 0.0 };
        self.push_event(track, EventKind::Enable, target, delay, 0.0);
    }

    pub fn add_event_speed(&mut self, track: usize, speed: f32, delay: f32, smooth: f32) {
        self.push_event(track, EventKind::Speed, speed, delay, smooth);
    }

    pub fn add_event_weight(&mut self, track: usize, weight: f32, delay: f32, smooth: f32) {
        self.push_event(track, EventKind::Weight, weight, delay, smooth);
    }

    fn push_event(&mut self, track: usize, kind: EventKind, target: f32, delay: f32, smooth: f32) {
        let start = self.time + delay;
        self.track_mut(track)
            .events
            .push(Event::new(kind, target, start, smooth));
    }

    /// Enables or disables `track` now, dropping its pending enable events.
    pub fn set_track_enable(&mut self, track: usize, enable: bool) {
        let track = self.track_mut(track);
        track.events.remove_kind(EventKind::Enable);
        track.params.enabled = enable;
    }

    pub fn set_track_speed(&mut self, track: usize, speed: f32) {
        self.track_mut(track).params.speed = speed;
    }

    pub fn set_track_weight(&mut self, track: usize, weight: f32) {
        self.track_mut(track).params.weight = weight;
    }

    /// Sets the local time of `track` in seconds.
    pub fn set_track_position(&mut self, track: usize, position: f32) {
        self.track_mut(track).position = position;
    }

    pub fn clear_track_events(&mut self, track: usize) {
        self.track_mut(track).events.clear();
    }

    pub fn set_interpolation(&mut self, enabled: bool) {
        self.interpolation = enabled;
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> bool {
        self.interpolation
    }

    // ========================================================================
    // Track queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn track(&self, track: usize) -> &Track {
        let count = self.tracks.len();
        assert!(track < count, "track index {track} out of range ({count} tracks)");
        &self.tracks[track]
    }

    #[must_use]
    pub fn track_position(&self, track: usize) -> f32 {
        self.track(track).position()
    }

    #[must_use]
    pub fn track_weight(&self, track: usize) -> f32 {
        self.track(track).weight()
    }

    #[must_use]
    pub fn track_speed(&self, track: usize) -> f32 {
        self.track(track).speed()
    }

    #[must_use]
    pub fn is_track_enabled(&self, track: usize) -> bool {
        self.track(track).is_enabled()
    }

    #[must_use]
    pub fn track_animation_set(&self, track: usize) -> Option<Arc<AnimationSet>> {
        self.track(track).animation_set().cloned()
    }

    #[must_use]
    pub fn pending_event_count(&self, track: usize) -> usize {
        self.track(track).events().len()
    }

    fn track_mut(&mut self, track: usize) -> &mut Track {
        let count = self.tracks.len();
        assert!(track < count, "track index {track} out of range ({count} tracks)");
        &mut self.tracks[track]
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Advances the clock by `dt` seconds and writes the blended matrix of
    /// every output touched by at least one track into `sink`.
    ///
    /// Outputs no track drives are left untouched.
    ///
    /// # Panics
    ///
    /// Panics, before any state changes, when `sink` has fewer slots than
    /// there are registered outputs.
    pub fn advance_time<S: OutputSink + ?Sized>(&mut self, dt: f32, sink: &mut S) {
        let slot_count = self.outputs.read().len();
        assert!(
            sink.slot_count() >= slot_count,
            "output sink has {} slots but {slot_count} outputs are registered",
            sink.slot_count()
        );

        self.time += dt;
        let now = self.time;
        let mode = if self.interpolation {
            InterpolationMode::Linear
        } else {
            InterpolationMode::Step
        };

        self.blend.reset(slot_count);
        for (index, track) in self.tracks.iter_mut().enumerate() {
            track.events.update(now, &mut track.params);
            if !track.contributes() {
                continue;
            }
            track.advance(dt);
            track.sample_into(index, mode, &mut self.blend);
        }

        for (handle, pose) in self.blend.compose() {
            sink.write_output(handle, pose.to_matrix());
        }
    }
}

impl Clone for AnimationController {
    fn clone(&self) -> Self {
        self.clone_controller()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Quat, Vec3};

    fn h(name: &str) -> BoneHash {
        BoneHash::from_name(name)
    }

    fn slide_set(name: &str, to: Vec3) -> Arc<AnimationSet> {
        let mut set = AnimationSet::new("test.fbx", name, 1.0, 1.0);
        set.add_bone_output(
            vec![h("root"), h("bone")],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![0.0, 1.0],
            vec![Vec3::ZERO, to],
        )
        .unwrap();
        Arc::new(set)
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn invalid_track_index_panics() {
        let mut controller = AnimationController::new(1);
        controller.set_track_weight(1, 0.5);
    }

    #[test]
    #[should_panic(expected = "output sink")]
    fn short_sink_is_rejected_before_advancing() {
        let mut controller = AnimationController::new(1);
        controller.register_animation_output(h("bone"));
        let mut sink: Vec<Mat4> = Vec::new();
        controller.advance_time(0.1, &mut sink);
    }

    #[test]
    fn rebinding_resets_cursors_but_keeps_track_state() {
        let mut controller = AnimationController::new(1);
        controller.register_animation_output(h("bone"));
        controller.set_track_animation_set(0, Some(slide_set("a", Vec3::X)));
        controller.set_track_weight(0, 0.7);
        controller.add_event_speed(0, 2.0, 5.0, 0.0);
        let mut sink = vec![Mat4::IDENTITY];
        controller.advance_time(0.25, &mut sink);

        controller.set_track_animation_set(0, Some(slide_set("b", Vec3::Y)));
        assert!((controller.track_position(0) - 0.25).abs() < 1e-6);
        assert!((controller.track_weight(0) - 0.7).abs() < 1e-6);
        assert_eq!(controller.pending_event_count(0), 1);
        assert!(controller.track(0).bindings[0].cursors == Default::default());
    }

    #[test]
    fn interpolation_off_holds_keys() {
        let mut controller = AnimationController::new(1);
        controller.register_animation_output(h("bone"));
        controller.set_track_animation_set(0, Some(slide_set("a", Vec3::X * 10.0)));
        controller.set_interpolation(false);
        let mut sink = vec![Mat4::IDENTITY];
        controller.advance_time(0.5, &mut sink);
        assert_eq!(sink[0].w_axis.truncate(), Vec3::ZERO);
    }

    #[test]
    fn three_track_rotation_blend_follows_track_order() {
        let mut controller = AnimationController::new(3);
        controller.register_animation_output(h("bone"));
        for (track, angle) in [0.0_f32, 1.0, 2.0].into_iter().enumerate() {
            let mut set = AnimationSet::new("f", format!("r{track}"), 1.0, 1.0);
            set.add_bone_output(
                vec![h("bone")],
                vec![],
                vec![],
                vec![0.0],
                vec![Quat::from_rotation_y(angle)],
                vec![],
                vec![],
            )
            .unwrap();
            controller.set_track_animation_set(track, Some(Arc::new(set)));
        }
        let mut sink = vec![Mat4::IDENTITY];
        controller.advance_time(0.0, &mut sink);

        // Equal weights: slerp(slerp(r0, r1, 1/2), r2, 1/3)
        let expected = Quat::from_rotation_y(0.0)
            .slerp(Quat::from_rotation_y(1.0), 0.5)
            .slerp(Quat::from_rotation_y(2.0), 1.0 / 3.0);
        let (_, rotation, _) = sink[0].to_scale_rotation_translation();
        assert!(rotation.angle_between(expected) < 1e-3);
    }
}
