use bonemix_core::{BoneHash, BonemixError, Result};
use glam::{Mat4, Quat, Vec3};

use crate::curve::{InterpolationMode, KeyframeCurve, KeyframeCursor};

/// Scale / rotation / translation of one bone at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonePose {
    pub scale: Vec3,
    pub rotation: Quat,
    pub translation: Vec3,
}

impl BonePose {
    pub const IDENTITY: Self = Self {
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Scale first, then rotate, then translate.
    #[inline]
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for BonePose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-curve cursors for one bound [`BoneOutputTrack`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoneCursors {
    pub scale: KeyframeCursor,
    pub rotation: KeyframeCursor,
    pub translation: KeyframeCursor,
}

/// Keyframe curves animating a single bone.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneOutputTrack {
    bone: BoneHash,
    scale: KeyframeCurve<Vec3>,
    rotation: KeyframeCurve<Quat>,
    translation: KeyframeCurve<Vec3>,
}

impl BoneOutputTrack {
    #[must_use]
    pub fn new(
        bone: BoneHash,
        scale: KeyframeCurve<Vec3>,
        rotation: KeyframeCurve<Quat>,
        translation: KeyframeCurve<Vec3>,
    ) -> Self {
        Self {
            bone,
            scale,
            rotation,
            translation,
        }
    }

    #[inline]
    #[must_use]
    pub fn bone(&self) -> BoneHash {
        self.bone
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> &KeyframeCurve<Vec3> {
        &self.scale
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> &KeyframeCurve<Quat> {
        &self.rotation
    }

    #[inline]
    #[must_use]
    pub fn translation(&self) -> &KeyframeCurve<Vec3> {
        &self.translation
    }

    /// True when none of the three curves has a key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scale.is_empty() && self.rotation.is_empty() && self.translation.is_empty()
    }

    /// Samples all three curves at `time` (in ticks).
    ///
    /// Returns `None` when the track has no keys at all; a single empty curve
    /// falls back to the identity component.
    pub fn sample(
        &self,
        time: f32,
        cursors: &mut BoneCursors,
        mode: InterpolationMode,
    ) -> Option<BonePose> {
        if self.is_empty() {
            return None;
        }
        Some(BonePose {
            scale: self
                .scale
                .sample_with_cursor(time, &mut cursors.scale, mode)
                .unwrap_or(Vec3::ONE),
            rotation: self
                .rotation
                .sample_with_cursor(time, &mut cursors.rotation, mode)
                .unwrap_or(Quat::IDENTITY),
            translation: self
                .translation
                .sample_with_cursor(time, &mut cursors.translation, mode)
                .unwrap_or(Vec3::ZERO),
        })
    }
}

/// Immutable keyframe data for one animation clip.
///
/// Built once by an import pipeline through [`AnimationSet::set_data`] and
/// [`AnimationSet::add_bone_output`], then shared read-only (usually behind
/// an `Arc`) by any number of controllers.
///
/// Every bone output carries the root-to-bone chain of bone hashes it was
/// authored against, so it can be matched against skeletons whose topology
/// differs from the authoring one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationSet {
    file_name: String,
    name: String,
    duration_ticks: f32,
    ticks_per_second: f32,
    bone_outputs: Vec<BoneOutputTrack>,
    bones_hierarchy: Vec<Vec<BoneHash>>,
}

impl AnimationSet {
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        name: impl Into<String>,
        duration_ticks: f32,
        ticks_per_second: f32,
    ) -> Self {
        let mut set = Self::default();
        set.set_data(file_name, name, duration_ticks, ticks_per_second);
        set
    }

    pub fn set_data(
        &mut self,
        file_name: impl Into<String>,
        name: impl Into<String>,
        duration_ticks: f32,
        ticks_per_second: f32,
    ) {
        self.file_name = file_name.into();
        self.name = name.into();
        self.duration_ticks = duration_ticks;
        self.ticks_per_second = ticks_per_second;
    }

    /// Appends the curves of one bone.
    ///
    /// The bone is identified by the last (deepest) hash of `hierarchy`.
    /// On error the set is left unchanged.
    pub fn add_bone_output(
        &mut self,
        hierarchy: Vec<BoneHash>,
        scale_times: Vec<f32>,
        scale_values: Vec<Vec3>,
        rotation_times: Vec<f32>,
        rotation_values: Vec<Quat>,
        translation_times: Vec<f32>,
        translation_values: Vec<Vec3>,
    ) -> Result<()> {
        let bone = *hierarchy.last().ok_or(BonemixError::EmptyHierarchy)?;
        let track = BoneOutputTrack::new(
            bone,
            KeyframeCurve::new("scale", scale_times, scale_values)?,
            KeyframeCurve::new("rotation", rotation_times, rotation_values)?,
            KeyframeCurve::new("translation", translation_times, translation_values)?,
        );
        self.push_bone_output(hierarchy, track);
        Ok(())
    }

    pub(crate) fn push_bone_output(&mut self, hierarchy: Vec<BoneHash>, track: BoneOutputTrack) {
        self.bone_outputs.push(track);
        self.bones_hierarchy.push(hierarchy);
    }

    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duration in ticks.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration_ticks
    }

    #[inline]
    #[must_use]
    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    /// Duration in seconds, `0.0` when the tick rate is not positive.
    #[must_use]
    pub fn duration_seconds(&self) -> f32 {
        if self.ticks_per_second > 0.0 {
            self.duration_ticks / self.ticks_per_second
        } else {
            0.0
        }
    }

    #[inline]
    #[must_use]
    pub fn bone_output_count(&self) -> usize {
        self.bone_outputs.len()
    }

    #[inline]
    #[must_use]
    pub fn bone_outputs(&self) -> &[BoneOutputTrack] {
        &self.bone_outputs
    }

    #[inline]
    #[must_use]
    pub fn bone_output(&self, index: usize) -> Option<&BoneOutputTrack> {
        self.bone_outputs.get(index)
    }

    /// Root-to-bone hash chains, parallel to [`Self::bone_outputs`].
    #[inline]
    #[must_use]
    pub fn bones_hierarchy(&self) -> &[Vec<BoneHash>] {
        &self.bones_hierarchy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(name: &str) -> BoneHash {
        BoneHash::from_name(name)
    }

    #[test]
    fn bone_is_deepest_hierarchy_entry() {
        let mut set = AnimationSet::new("walk.fbx", "walk", 30.0, 30.0);
        set.add_bone_output(
            vec![h("root"), h("spine"), h("head")],
            vec![],
            vec![],
            vec![0.0],
            vec![Quat::IDENTITY],
            vec![],
            vec![],
        )
        .unwrap();

        assert_eq!(set.bone_output_count(), 1);
        assert_eq!(set.bone_outputs()[0].bone(), h("head"));
        assert_eq!(set.bones_hierarchy()[0].len(), 3);
        assert!((set.duration_seconds() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn failed_add_leaves_set_unchanged() {
        let mut set = AnimationSet::new("a", "b", 1.0, 1.0);
        let err = set
            .add_bone_output(
                vec![h("root")],
                vec![0.0, 1.0],
                vec![Vec3::ONE],
                vec![],
                vec![],
                vec![],
                vec![],
            )
            .unwrap_err();
        assert!(matches!(err, BonemixError::CurveLengthMismatch { curve: "scale", .. }));

        let err = set
            .add_bone_output(vec![], vec![], vec![], vec![], vec![], vec![], vec![])
            .unwrap_err();
        assert!(matches!(err, BonemixError::EmptyHierarchy));
        assert_eq!(set.bone_output_count(), 0);
        assert!(set.bones_hierarchy().is_empty());
    }

    #[test]
    fn missing_curves_fall_back_to_identity() {
        let track = BoneOutputTrack::new(
            h("hand"),
            KeyframeCurve::empty(),
            KeyframeCurve::empty(),
            KeyframeCurve::new("translation", vec![0.0], vec![Vec3::X]).unwrap(),
        );
        let mut cursors = BoneCursors::default();
        let pose = track
            .sample(3.0, &mut cursors, InterpolationMode::Linear)
            .unwrap();
        assert_eq!(pose.scale, Vec3::ONE);
        assert_eq!(pose.rotation, Quat::IDENTITY);
        assert_eq!(pose.translation, Vec3::X);

        let empty = BoneOutputTrack::new(
            h("hand"),
            KeyframeCurve::empty(),
            KeyframeCurve::empty(),
            KeyframeCurve::empty(),
        );
        assert!(empty.sample(0.0, &mut cursors, InterpolationMode::Linear).is_none());
    }
}
