use std::cmp::Ordering;

use bonemix_core::{BonemixError, Result};

use crate::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    /// Hold the value of the segment start.
    Step,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Last segment index found by a sampling call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Time-indexed keyframe curve.
///
/// Key times are strictly increasing. Sampling clamps at both ends: before
/// the first key the first value is returned, at or after the last key the
/// last value is held.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeCurve<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>,
}

impl<T: Interpolatable> Default for KeyframeCurve<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Interpolatable> KeyframeCurve<T> {
    /// Builds a curve, rejecting mismatched array lengths and key times that
    /// are not strictly increasing. `name` is only used in the error.
    pub fn new(name: &'static str, times: Vec<f32>, values: Vec<T>) -> Result<Self> {
        if times.len() != values.len() {
            return Err(BonemixError::CurveLengthMismatch {
                curve: name,
                times: times.len(),
                values: values.len(),
            });
        }
        if let Some(index) = times
            .windows(2)
            .position(|w| w[1].partial_cmp(&w[0]) != Some(Ordering::Greater))
        {
            return Err(BonemixError::UnsortedKeyTimes {
                curve: name,
                index: index + 1,
            });
        }
        if times.first().is_some_and(|t| t.is_nan()) {
            return Err(BonemixError::UnsortedKeyTimes {
                curve: name,
                index: 0,
            });
        }
        Ok(Self { times, values })
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Stateless sampling (binary search). `None` for an empty curve.
    #[must_use]
    pub fn sample(&self, time: f32, mode: InterpolationMode) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let index = self.times.partition_point(|&t| t <= time).saturating_sub(1);
        Some(self.sample_at_frame(index, time, mode))
    }

    /// Sampling with a cursor.
    ///
    /// Monotonic playback hits the cached segment or one of its neighbours,
    /// so lookup is O(1) amortized; large jumps (scrubbing, loop wrap) fall
    /// back to a binary search.
    pub fn sample_with_cursor(
        &self,
        time: f32,
        cursor: &mut KeyframeCursor,
        mode: InterpolationMode,
    ) -> Option<T> {
        match self.times.len() {
            0 => None,
            1 => Some(self.values[0]),
            _ => {
                let index = self.locate(time, cursor);
                Some(self.sample_at_frame(index, time, mode))
            }
        }
    }

    fn locate(&self, time: f32, cursor: &mut KeyframeCursor) -> usize {
        let len = self.times.len();
        // A stale cursor (curve switched under it) restarts from the front
        let i = cursor.last_index.min(len - 1);

        let hit = if time >= self.times[i] {
            // Forward: find the segment whose right edge is past `time`
            (i..len.min(i + MAX_SCAN_OFFSET + 1))
                .find(|&idx| idx + 1 == len || time < self.times[idx + 1])
        } else {
            // Backward: the right edge is already known to be past `time`
            (i.saturating_sub(MAX_SCAN_OFFSET)..i)
                .rev()
                .find(|&idx| time >= self.times[idx])
        };

        let index = hit.unwrap_or_else(|| {
            self.times
                .partition_point(|&t| t <= time)
                .saturating_sub(1)
        });
        cursor.last_index = index;
        index
    }

    fn sample_at_frame(&self, index: usize, time: f32, mode: InterpolationMode) -> T {
        let len = self.times.len();
        if index >= len - 1 {
            return self.values[len - 1];
        }

        let t0 = self.times[index];
        let t1 = self.times[index + 1];
        // Before the first key: hold the first value
        if time <= t0 {
            return self.values[index];
        }

        match mode {
            InterpolationMode::Step => self.values[index],
            InterpolationMode::Linear => {
                let factor = ((time - t0) / (t1 - t0)).clamp(0.0, 1.0);
                T::interpolate_linear(self.values[index], self.values[index + 1], factor)
            }
        }
    }
}
