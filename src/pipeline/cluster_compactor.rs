//! Cluster compaction
//!
//! Turns each cluster's binned nodes into a contiguous run of view-local
//! light indices (points first, then spots) and a [`CompactedCluster`] record.

use super::frame::{LightClusterNode, ViewFrameState};
use crate::scene::LightKind;
use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

/// Per-cluster texel: start of the cluster's index run and packed light counts
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CompactedCluster {
    pub index_start: u32,
    /// `point_count | spot_count << 16`
    pub packed_counts: u32,
}

const _: () = assert!(std::mem::size_of::<CompactedCluster>() == 8);

impl CompactedCluster {
    pub fn new(index_start: u32, point_count: u16, spot_count: u16) -> Self {
        Self {
            index_start,
            packed_counts: point_count as u32 | (spot_count as u32) << 16,
        }
    }

    pub fn point_count(&self) -> u16 {
        (self.packed_counts & 0xffff) as u16
    }

    pub fn spot_count(&self) -> u16 {
        (self.packed_counts >> 16) as u16
    }

    pub fn light_count(&self) -> usize {
        self.point_count() as usize + self.spot_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.packed_counts == 0
    }
}

/// Compact every cluster of a binned view.
///
/// Clusters are processed in contiguous runs of at least `clusters_per_task`.
/// Nodes are only read, so running this again without rebinning gives the
/// same output.
pub fn compact_clusters(state: &mut ViewFrameState, clusters_per_task: usize) {
    let cluster_count = state.cluster_count();
    state.compacted.clear();
    state.light_indices.clear();
    if cluster_count == 0 || state.cluster_offsets.len() != cluster_count + 1 {
        return;
    }

    let offsets = &state.cluster_offsets;
    let nodes = &state.nodes;
    state.compacted.resize(cluster_count, CompactedCluster::default());
    state.light_indices.resize(offsets[cluster_count] as usize, 0);

    let mut runs: Vec<&mut [u32]> = Vec::with_capacity(cluster_count);
    let mut rest: &mut [u32] = &mut state.light_indices;
    for window in offsets.windows(2) {
        let (run, tail) = std::mem::take(&mut rest).split_at_mut((window[1] - window[0]) as usize);
        runs.push(run);
        rest = tail;
    }

    state
        .compacted
        .par_iter_mut()
        .zip(runs.into_par_iter())
        .enumerate()
        .with_min_len(clusters_per_task.max(1))
        .for_each(|(cluster, (record, run))| {
            let start = offsets[cluster];
            let end = offsets[cluster + 1];
            let cluster_nodes = &nodes[start as usize..end as usize];
            *record = compact_cluster(start, cluster_nodes, run);
        });
}

fn compact_cluster(
    index_start: u32,
    nodes: &[AtomicU32],
    run: &mut [u32],
) -> CompactedCluster {
    if nodes.is_empty() {
        return CompactedCluster::default();
    }

    let mut point_count = 0;
    for node in nodes {
        let node = LightClusterNode::unpack(node.load(Ordering::Relaxed));
        if node.kind == LightKind::Point {
            run[point_count] = node.index;
            point_count += 1;
        }
    }
    let mut spot_count = 0;
    for node in nodes {
        let node = LightClusterNode::unpack(node.load(Ordering::Relaxed));
        if node.kind == LightKind::Spot {
            run[point_count + spot_count] = node.index;
            spot_count += 1;
        }
    }
    run[..point_count].sort_unstable();
    run[point_count..point_count + spot_count].sort_unstable();

    let kept_points = point_count.min(u16::MAX as usize);
    let kept_spots = spot_count.min(u16::MAX as usize);
    if kept_points < point_count {
        run.copy_within(point_count..point_count + kept_spots, kept_points);
        log::warn!(
            "Cluster holds {point_count} point lights, only {kept_points} are referenced"
        );
    }
    CompactedCluster::new(index_start, kept_points as u16, kept_spots as u16)
}
