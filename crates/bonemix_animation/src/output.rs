use bonemix_core::BoneHash;
use glam::Mat4;
use rustc_hash::FxHashMap;

/// Index of a registered output slot.
///
/// Handles are dense and assigned in registration order, so a consumer can
/// keep its destination matrices in a plain array indexed by handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputHandle(u32);

impl OutputHandle {
    #[inline]
    #[must_use]
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Destination storage for composed bone matrices.
///
/// The controller only writes through this trait; the storage itself is
/// always owned by the consumer.
pub trait OutputSink {
    /// Number of addressable slots. Every registered handle must be below it.
    fn slot_count(&self) -> usize;

    fn write_output(&mut self, handle: OutputHandle, matrix: Mat4);
}

impl OutputSink for [Mat4] {
    fn slot_count(&self) -> usize {
        self.len()
    }

    fn write_output(&mut self, handle: OutputHandle, matrix: Mat4) {
        self[handle.index()] = matrix;
    }
}

impl OutputSink for Vec<Mat4> {
    fn slot_count(&self) -> usize {
        self.len()
    }

    fn write_output(&mut self, handle: OutputHandle, matrix: Mat4) {
        self[handle.index()] = matrix;
    }
}

/// Bone hash → output handle table shared by a controller and its clones.
#[derive(Debug, Default, Clone)]
pub struct OutputRegistry {
    bones: Vec<BoneHash>,
    lookup: FxHashMap<BoneHash, OutputHandle>,
}

impl OutputRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bone`, returning its handle.
    ///
    /// Registering a bone twice keeps the original slot and logs a warning.
    pub fn register(&mut self, bone: BoneHash) -> OutputHandle {
        if let Some(&handle) = self.lookup.get(&bone) {
            log::warn!(
                "Animation output for bone {bone} registered twice, reusing slot {}",
                handle.index()
            );
            return handle;
        }
        let handle = OutputHandle::new(self.bones.len());
        self.bones.push(bone);
        self.lookup.insert(bone, handle);
        handle
    }

    #[inline]
    #[must_use]
    pub fn handle_of(&self, bone: BoneHash) -> Option<OutputHandle> {
        self.lookup.get(&bone).copied()
    }

    #[inline]
    #[must_use]
    pub fn bone_of(&self, handle: OutputHandle) -> Option<BoneHash> {
        self.bones.get(handle.index()).copied()
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

    /// `(handle, bone)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (OutputHandle, BoneHash)> + '_ {
        self.bones
            .iter()
            .enumerate()
            .map(|(index, &bone)| (OutputHandle::new(index), bone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_dense_and_rebind_is_tolerated() {
        let mut registry = OutputRegistry::new();
        let a = registry.register(BoneHash::from_name("a"));
        let b = registry.register(BoneHash::from_name("b"));
        let again = registry.register(BoneHash::from_name("a"));

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(again, a);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.bone_of(b), Some(BoneHash::from_name("b")));
        assert_eq!(registry.handle_of(BoneHash::from_name("c")), None);
    }

    #[test]
    fn slice_sink_writes_by_index() {
        let mut matrices = vec![Mat4::IDENTITY; 3];
        let m = Mat4::from_translation(glam::Vec3::X);
        matrices.write_output(OutputHandle::new(2), m);
        assert_eq!(matrices[2], m);
        assert_eq!(matrices.as_mut_slice().slot_count(), 3);
    }
}
