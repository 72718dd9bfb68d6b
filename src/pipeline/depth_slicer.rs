//! Exponential depth slicing
//!
//! Slice 0 covers `[near_clip, near_plane)` where `near_plane` is the
//! "special" near plane. The remaining slices grow geometrically up to the
//! far clip plane:
//!
//! ```text
//! slice(d) = clamp(floor(log2(d * depth_scale + depth_bias)), 0, slice_count)
//! ```
//!
//! with `depth_scale = (2^n - 2) / (far - near_plane)` and
//! `depth_bias = 2 - depth_scale * near_plane`, so `near_plane` maps to 2
//! (slice 1) and `far` maps to `2^n` (slice `n`, the exclusive end).

use std::ops::Range;

/// Depth-to-slice mapping for one view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSlicer {
    /// Depth at which slice 0 ends
    pub near_plane: f32,
    pub depth_scale: f32,
    pub depth_bias: f32,
    pub slice_count: u32,
}

impl DepthSlicer {
    /// Derive scale and bias from the view's clip planes.
    ///
    /// The caller guarantees `far_clip_plane > near_plane`.
    pub fn new(
        near_clip_plane: f32,
        far_clip_plane: f32,
        special_near_plane: f32,
        slice_count: u32,
    ) -> Self {
        let near_plane = special_near_plane
            .min(far_clip_plane * 0.1)
            .max(near_clip_plane);
        let depth_scale = (2f32.powi(slice_count as i32) - 2.0) / (far_clip_plane - near_plane);
        let depth_bias = 2.0 - depth_scale * near_plane;
        Self {
            near_plane,
            depth_scale,
            depth_bias,
            slice_count,
        }
    }

    /// Slice containing a view-space depth (distance along the view direction)
    pub fn slice_index(&self, depth: f32) -> u32 {
        let scaled = depth * self.depth_scale + self.depth_bias;
        // Values below 1 have a negative log; NaN fails the comparison too
        if !(scaled > 1.0) {
            return 0;
        }
        let slice = scaled.log2().floor();
        if slice >= self.slice_count as f32 {
            self.slice_count
        } else {
            slice as u32
        }
    }

    /// Half-open range of slices touched by `[min_depth, max_depth]`
    pub fn slice_range(&self, min_depth: f32, max_depth: f32) -> Range<u32> {
        let start = self.slice_index(min_depth);
        let end = (self.slice_index(max_depth) + 1).min(self.slice_count);
        start..end.max(start)
    }

    /// View-space depth interval covered by a slice, `[start, end)`
    pub fn slice_depth_range(&self, slice: u32) -> (f32, f32) {
        let boundary = |k: u32| (2f32.powi(k as i32) - self.depth_bias) / self.depth_scale;
        let start = if slice == 0 { 0.0 } else { boundary(slice) };
        let end = if slice + 1 >= self.slice_count {
            f32::INFINITY
        } else {
            boundary(slice + 1)
        };
        (start, end)
    }
}
