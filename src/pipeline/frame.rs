//! Per-frame clustering state
//!
//! [`FrameContext`] owns one [`ViewFrameState`] per view. All of it is rebuilt
//! every frame; only allocations survive between frames.

use super::cluster_compactor::CompactedCluster;
use super::cluster_grid::{ClusterBox, ClusterDescriptor};
use crate::backend::Extent3d;
use crate::scene::{LightKind, PointLightData, SpotLightData};
use std::sync::atomic::{AtomicU32, Ordering};

const SPOT_BIT: u32 = 1 << 31;

/// Reference from a cluster to one view-local light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightClusterNode {
    pub kind: LightKind,
    pub index: u32,
}

impl LightClusterNode {
    pub fn point(index: u32) -> Self {
        Self {
            kind: LightKind::Point,
            index,
        }
    }

    pub fn spot(index: u32) -> Self {
        Self {
            kind: LightKind::Spot,
            index,
        }
    }

    /// Pack into one word: the high bit marks spot lights
    pub fn pack(self) -> u32 {
        match self.kind {
            LightKind::Point => self.index & !SPOT_BIT,
            LightKind::Spot => self.index | SPOT_BIT,
        }
    }

    pub fn unpack(packed: u32) -> Self {
        if packed & SPOT_BIT != 0 {
            Self::spot(packed & !SPOT_BIT)
        } else {
            Self::point(packed)
        }
    }
}

/// A light visible in a view, with the clusters it overlaps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBinding {
    /// Kind and view-local index
    pub node: LightClusterNode,
    /// Index in the frame's `LightCollection` list of the same kind
    pub source: u32,
    pub clusters: ClusterBox,
}

/// Mutable clustering state of one view
#[derive(Debug, Default)]
pub struct ViewFrameState {
    pub(crate) descriptor: Option<ClusterDescriptor>,
    pub(crate) point_boxes: Vec<ClusterBox>,
    pub(crate) spot_boxes: Vec<ClusterBox>,
    pub(crate) bindings: Vec<LightBinding>,
    pub(crate) point_lights: Vec<PointLightData>,
    pub(crate) spot_lights: Vec<SpotLightData>,
    /// Per-cluster node counts, then scatter cursors
    pub(crate) cluster_cursors: Vec<AtomicU32>,
    /// Prefix sum of node counts, `cluster_count + 1` entries
    pub(crate) cluster_offsets: Vec<u32>,
    /// Packed [`LightClusterNode`]s grouped by cluster
    pub(crate) nodes: Vec<AtomicU32>,
    pub(crate) compacted: Vec<CompactedCluster>,
    pub(crate) light_indices: Vec<u32>,
}

impl ViewFrameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything produced for the previous frame, keeping capacity
    pub fn reset(&mut self) {
        self.descriptor = None;
        self.point_boxes.clear();
        self.spot_boxes.clear();
        self.bindings.clear();
        self.point_lights.clear();
        self.spot_lights.clear();
        self.cluster_cursors.clear();
        self.cluster_offsets.clear();
        self.nodes.clear();
        self.compacted.clear();
        self.light_indices.clear();
    }

    /// Cluster layout, `None` when the view was skipped this frame
    pub fn descriptor(&self) -> Option<&ClusterDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.descriptor.is_some()
    }

    pub fn cluster_count(&self) -> usize {
        self.descriptor.map_or(0, |d| d.cluster_count())
    }

    /// Extent of the cluster texture, zero for inactive views
    pub fn cluster_extent(&self) -> Extent3d {
        match self.descriptor {
            Some(descriptor) => {
                let dims = descriptor.grid.dims;
                Extent3d::new(dims.x, dims.y, dims.z)
            }
            None => Extent3d::new(0, 0, 0),
        }
    }

    /// Visible lights with their cluster boxes, points first
    pub fn bindings(&self) -> &[LightBinding] {
        &self.bindings
    }

    pub fn point_lights(&self) -> &[PointLightData] {
        &self.point_lights
    }

    pub fn spot_lights(&self) -> &[SpotLightData] {
        &self.spot_lights
    }

    /// Total number of (light, cluster) overlaps
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Unordered nodes binned into one cluster
    pub fn cluster_nodes(&self, cluster: usize) -> impl Iterator<Item = LightClusterNode> + '_ {
        let range = match (self.cluster_offsets.get(cluster), self.cluster_offsets.get(cluster + 1)) {
            (Some(&start), Some(&end)) => start as usize..end as usize,
            _ => 0..0,
        };
        self.nodes[range]
            .iter()
            .map(|node| LightClusterNode::unpack(node.load(Ordering::Relaxed)))
    }

    pub fn compacted_clusters(&self) -> &[CompactedCluster] {
        &self.compacted
    }

    pub fn light_indices(&self) -> &[u32] {
        &self.light_indices
    }

    /// View-local point and spot indices of a compacted cluster
    pub fn cluster_lights(&self, cluster: usize) -> (&[u32], &[u32]) {
        let Some(record) = self.compacted.get(cluster) else {
            return (&[], &[]);
        };
        let start = record.index_start as usize;
        let points = record.point_count() as usize;
        let spots = record.spot_count() as usize;
        match self.light_indices.get(start..start + points + spots) {
            Some(indices) => indices.split_at(points),
            None => (&[], &[]),
        }
    }
}

/// All per-view state for the frame being prepared
#[derive(Debug, Default)]
pub struct FrameContext {
    views: Vec<ViewFrameState>,
}

impl FrameContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the context for `view_count` views. States of views that are kept
    /// retain their allocations.
    pub fn begin_frame(&mut self, view_count: usize) {
        self.views.truncate(view_count);
        self.views.resize_with(view_count, ViewFrameState::new);
    }

    pub fn views(&self) -> &[ViewFrameState] {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut [ViewFrameState] {
        &mut self.views
    }

    pub fn view(&self, index: usize) -> Option<&ViewFrameState> {
        self.views.get(index)
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }
}
