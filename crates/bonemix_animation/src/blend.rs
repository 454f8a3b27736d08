//! Per-output accumulation and multi-track blending.

use smallvec::SmallVec;

use crate::output::OutputHandle;
use crate::set::BonePose;
use crate::values::slerp_shortest;

/// One track's sampled pose for one output during the current step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub track: usize,
    pub weight: f32,
    pub pose: BonePose,
}

/// Blends the contributions of several tracks into one pose.
///
/// - one contributor: its pose is returned untouched
/// - scale and translation: weight-normalized arithmetic mean
/// - rotation: iterative spherical blend in slice order, each step folding
///   the next rotation in with factor `w_i / (w_0 + .. + w_i)`
///
/// For three or more contributors the rotation result depends on the order of
/// `contributions`; callers pass them in track-index order.
///
/// Returns `None` for an empty slice or a non-positive total weight.
#[must_use]
pub fn blend_contributions(contributions: &[Contribution]) -> Option<BonePose> {
    let (first, rest) = contributions.split_first()?;
    if rest.is_empty() {
        return Some(first.pose);
    }

    let mut total = first.weight;
    let mut scale = first.pose.scale * first.weight;
    let mut translation = first.pose.translation * first.weight;
    let mut rotation = first.pose.rotation;

    for c in rest {
        total += c.weight;
        scale += c.pose.scale * c.weight;
        translation += c.pose.translation * c.weight;
        if total > 0.0 {
            rotation = slerp_shortest(rotation, c.pose.rotation, c.weight / total);
        }
    }

    if total <= 0.0 {
        return None;
    }
    Some(BonePose {
        scale: scale / total,
        rotation,
        translation: translation / total,
    })
}

/// Accumulation buffers for every registered output, rebuilt each step.
#[derive(Debug, Clone, Default)]
pub(crate) struct BlendBuffer {
    slots: Vec<SmallVec<[Contribution; 4]>>,
}

impl BlendBuffer {
    /// Clears every slot and resizes to `slot_count`, keeping allocations.
    pub fn reset(&mut self, slot_count: usize) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.slots.resize_with(slot_count, SmallVec::new);
    }

    pub fn push(&mut self, handle: OutputHandle, contribution: Contribution) {
        if let Some(slot) = self.slots.get_mut(handle.index()) {
            slot.push(contribution);
        }
    }

    /// Blended pose of every output that received at least one contribution.
    pub fn compose(&self) -> impl Iterator<Item = (OutputHandle, BonePose)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            blend_contributions(slot).map(|pose| (OutputHandle::new(index), pose))
        })
    }

    #[cfg(test)]
    pub fn contributions(&self, handle: OutputHandle) -> &[Contribution] {
        &self.slots[handle.index()]
    }
}
