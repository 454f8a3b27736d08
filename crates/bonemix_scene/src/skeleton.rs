use bonemix_animation::{AnimationController, OutputHandle, OutputSink};
use bonemix_core::BoneHash;
use glam::Mat4;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Index of a bone inside its [`Skeleton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(u32);

impl BoneId {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Bone {
    pub name_hash: BoneHash,
    pub parent: Option<BoneId>,
    pub children: SmallVec<[BoneId; 4]>,
    /// Rest pose, relative to the parent.
    pub bind_matrix: Mat4,
    /// Current pose relative to the parent; written by the controller.
    pub local_matrix: Mat4,
    /// Accumulated transform, valid after [`Skeleton::update_world_matrices`].
    pub world_matrix: Mat4,
}

/// Bone hierarchy stored as a flat arena.
///
/// Bones can only be added under an existing parent, so the arena is always
/// in parent-before-child order and world matrices resolve in one pass.
///
/// The skeleton also acts as the [`OutputSink`] of the controllers it
/// registered with: each output handle maps back to a bone whose
/// `local_matrix` receives the blended transform.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    lookup: FxHashMap<BoneHash, BoneId>,
    // Indexed by output handle
    outputs: Vec<Option<BoneId>>,
}

impl Skeleton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bone.
    ///
    /// # Panics
    ///
    /// Panics when `parent` does not refer to an existing bone.
    pub fn add_bone(
        &mut self,
        name_hash: BoneHash,
        parent: Option<BoneId>,
        bind_matrix: Mat4,
    ) -> BoneId {
        let id = BoneId(self.bones.len() as u32);
        if let Some(parent) = parent {
            assert!(
                parent.index() < self.bones.len(),
                "parent bone {} does not exist",
                parent.index()
            );
            self.bones[parent.index()].children.push(id);
        }

        if self.lookup.contains_key(&name_hash) {
            log::warn!("Duplicate bone {name_hash} in skeleton, lookups keep the first one");
        } else {
            self.lookup.insert(name_hash, id);
        }

        self.bones.push(Bone {
            name_hash,
            parent,
            children: SmallVec::new(),
            bind_matrix,
            local_matrix: bind_matrix,
            world_matrix: Mat4::IDENTITY,
        });
        id
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    #[inline]
    #[must_use]
    pub fn find(&self, name_hash: BoneHash) -> Option<BoneId> {
        self.lookup.get(&name_hash).copied()
    }

    #[must_use]
    pub fn parent(&self, id: BoneId) -> Option<BoneId> {
        self.bone(id).and_then(|bone| bone.parent)
    }

    #[must_use]
    pub fn children(&self, id: BoneId) -> &[BoneId] {
        self.bone(id)
            .map(|bone| bone.children.as_slice())
            .unwrap_or_default()
    }

    /// Bones without a parent.
    pub fn roots(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.parent.is_none())
            .map(|(index, _)| BoneId(index as u32))
    }

    /// Root-to-bone chain of name hashes, as stored in animation sets.
    #[must_use]
    pub fn path(&self, id: BoneId) -> Vec<BoneHash> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(bone) = current.and_then(|id| self.bone(id)) {
            path.push(bone.name_hash);
            current = bone.parent;
        }
        path.reverse();
        path
    }

    /// Registers every bone as an animation output of `controller`.
    ///
    /// The skeleton remembers the returned handles so it can be passed
    /// straight to [`AnimationController::advance_time`].
    pub fn register_outputs(&mut self, controller: &mut AnimationController) {
        for (index, bone) in self.bones.iter().enumerate() {
            let handle = controller.register_animation_output(bone.name_hash);
            if self.outputs.len() <= handle.index() {
                self.outputs.resize(handle.index() + 1, None);
            }
            self.outputs[handle.index()] = Some(BoneId(index as u32));
        }
    }

    /// Bone written through `handle`, if any.
    #[must_use]
    pub fn output_bone(&self, handle: OutputHandle) -> Option<BoneId> {
        self.outputs.get(handle.index()).copied().flatten()
    }

    /// Puts every bone back into its bind pose.
    pub fn reset_pose(&mut self) {
        for bone in &mut self.bones {
            bone.local_matrix = bone.bind_matrix;
        }
    }

    /// Recomputes world matrices, parents first.
    pub fn update_world_matrices(&mut self) {
        for index in 0..self.bones.len() {
            let parent_world = self.bones[index]
                .parent
                .map_or(Mat4::IDENTITY, |parent| self.bones[parent.index()].world_matrix);
            let bone = &mut self.bones[index];
            bone.world_matrix = parent_world * bone.local_matrix;
        }
    }

    #[must_use]
    pub fn local_matrix(&self, id: BoneId) -> Option<Mat4> {
        self.bone(id).map(|bone| bone.local_matrix)
    }

    #[must_use]
    pub fn world_matrix(&self, id: BoneId) -> Option<Mat4> {
        self.bone(id).map(|bone| bone.world_matrix)
    }
}

impl OutputSink for Skeleton {
    fn slot_count(&self) -> usize {
        self.outputs.len()
    }

    fn write_output(&mut self, handle: OutputHandle, matrix: Mat4) {
        if let Some(id) = self.output_bone(handle) {
            self.bones[id.index()].local_matrix = matrix;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn h(name: &str) -> BoneHash {
        BoneHash::from_name(name)
    }

    fn chain() -> (Skeleton, BoneId, BoneId, BoneId) {
        let mut skeleton = Skeleton::new();
        let root = skeleton.add_bone(h("root"), None, Mat4::IDENTITY);
        let spine = skeleton.add_bone(h("spine"), Some(root), Mat4::from_translation(Vec3::Y));
        let head = skeleton.add_bone(h("head"), Some(spine), Mat4::from_translation(Vec3::Y));
        (skeleton, root, spine, head)
    }

    #[test]
    fn path_runs_root_to_bone() {
        let (skeleton, root, spine, head) = chain();
        assert_eq!(skeleton.path(head), vec![h("root"), h("spine"), h("head")]);
        assert_eq!(skeleton.path(root), vec![h("root")]);
        assert_eq!(skeleton.children(root), &[spine]);
        assert_eq!(skeleton.parent(head), Some(spine));
        assert_eq!(skeleton.roots().collect::<Vec<_>>(), vec![root]);
    }

    #[test]
    fn world_matrices_accumulate_parents() {
        let (mut skeleton, _, _, head) = chain();
        skeleton.update_world_matrices();
        let world = skeleton.world_matrix(head).unwrap();
        assert!((world.w_axis.truncate() - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn duplicate_names_keep_first_lookup() {
        let mut skeleton = Skeleton::new();
        let first = skeleton.add_bone(h("twin"), None, Mat4::IDENTITY);
        skeleton.add_bone(h("twin"), Some(first), Mat4::IDENTITY);
        assert_eq!(skeleton.find(h("twin")), Some(first));
        assert_eq!(skeleton.len(), 2);
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn unknown_parent_panics() {
        let mut skeleton = Skeleton::new();
        skeleton.add_bone(h("orphan"), Some(BoneId(3)), Mat4::IDENTITY);
    }
}
