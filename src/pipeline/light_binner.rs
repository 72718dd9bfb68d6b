//! Light binning
//!
//! Lights are assigned to clusters with a parallel counting sort:
//! 1. Cluster boxes of every point light, then every spot light (parallel)
//! 2. Dense view-local indices for the visible lights (sequential)
//! 3. Atomic per-cluster node counts (parallel)
//! 4. Exclusive prefix sum of the counts (sequential)
//! 5. Scatter of packed nodes into each cluster's range (parallel)

use super::clip_region::{compute_clip_region, ProjectionTerms};
use super::cluster_grid::{ClusterBox, ClusterDescriptor};
use super::frame::{LightBinding, LightClusterNode, ViewFrameState};
use crate::scene::{LightCollection, RenderView};
use crate::LightClusterConfig;
use glam::Vec3;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

/// Clusters overlapped by a sphere at world `position`. Empty when the light
/// has no valid radius or lies entirely outside the clip planes.
pub fn compute_cluster_box(
    descriptor: &ClusterDescriptor,
    terms: &ProjectionTerms,
    view: &RenderView,
    position: Vec3,
    radius: f32,
) -> ClusterBox {
    if !(radius.is_finite() && radius > 0.0) {
        return ClusterBox::EMPTY;
    }

    let center = view.to_view_space(position);
    let depth = -center.z;
    if depth + radius < view.near_clip_plane || depth - radius > view.far_clip_plane {
        return ClusterBox::EMPTY;
    }

    let region = compute_clip_region(center, radius, terms);
    let grid = &descriptor.grid;
    ClusterBox::new(
        grid.tile_range_x(region.min.x, region.max.x),
        grid.tile_range_y(region.min.y, region.max.y),
        descriptor.slicer.slice_range(depth - radius, depth + radius),
    )
}

/// Bin the frame's lights into the clusters of one view.
///
/// The state must have been reset and given a descriptor for this frame;
/// inactive views are left untouched.
pub fn bin_lights(
    state: &mut ViewFrameState,
    view: &RenderView,
    lights: &LightCollection,
    config: &LightClusterConfig,
) {
    let Some(descriptor) = state.descriptor else {
        return;
    };
    let terms = ProjectionTerms::from_projection(&view.projection);
    let linear = config.use_linear_lighting;

    lights
        .points
        .par_iter()
        .map(|light| {
            let radius = light.culling_radius(linear);
            compute_cluster_box(&descriptor, &terms, view, light.position, radius)
        })
        .collect_into_vec(&mut state.point_boxes);
    lights
        .spots
        .par_iter()
        .map(|light| {
            let radius = light.culling_radius(linear);
            compute_cluster_box(&descriptor, &terms, view, light.position, radius)
        })
        .collect_into_vec(&mut state.spot_boxes);

    collect_visible_lights(state, lights);
    count_nodes(state, &descriptor);
    let total = prefix_sum(state);
    scatter_nodes(state, &descriptor, total);
}

fn collect_visible_lights(state: &mut ViewFrameState, lights: &LightCollection) {
    state.bindings.clear();
    state.point_lights.clear();
    state.spot_lights.clear();

    for (source, (light, clusters)) in lights.points.iter().zip(&state.point_boxes).enumerate() {
        if clusters.is_empty() {
            continue;
        }
        let node = LightClusterNode::point(state.point_lights.len() as u32);
        state.point_lights.push(light.to_gpu_data());
        state.bindings.push(LightBinding {
            node,
            source: source as u32,
            clusters: *clusters,
        });
    }
    for (source, (light, clusters)) in lights.spots.iter().zip(&state.spot_boxes).enumerate() {
        if clusters.is_empty() {
            continue;
        }
        let node = LightClusterNode::spot(state.spot_lights.len() as u32);
        state.spot_lights.push(light.to_gpu_data());
        state.bindings.push(LightBinding {
            node,
            source: source as u32,
            clusters: *clusters,
        });
    }
}

fn count_nodes(state: &mut ViewFrameState, descriptor: &ClusterDescriptor) {
    state.cluster_cursors.clear();
    state
        .cluster_cursors
        .resize_with(descriptor.cluster_count(), || AtomicU32::new(0));

    let grid = descriptor.grid;
    let counts = &state.cluster_cursors;
    state.bindings.par_iter().for_each(|binding| {
        for cluster in binding.clusters.cluster_indices(grid) {
            counts[cluster].fetch_add(1, Ordering::Relaxed);
        }
    });
}

/// Turn counts into exclusive offsets, leaving each cursor at its cluster's start
fn prefix_sum(state: &mut ViewFrameState) -> u32 {
    state.cluster_offsets.clear();
    state.cluster_offsets.reserve(state.cluster_cursors.len() + 1);
    let mut total = 0u32;
    for cursor in &mut state.cluster_cursors {
        let count = *cursor.get_mut();
        state.cluster_offsets.push(total);
        *cursor.get_mut() = total;
        total += count;
    }
    state.cluster_offsets.push(total);
    total
}

fn scatter_nodes(state: &mut ViewFrameState, descriptor: &ClusterDescriptor, total: u32) {
    state.nodes.clear();
    state.nodes.resize_with(total as usize, || AtomicU32::new(0));

    let grid = descriptor.grid;
    let cursors = &state.cluster_cursors;
    let nodes = &state.nodes;
    state.bindings.par_iter().for_each(|binding| {
        let packed = binding.node.pack();
        for cluster in binding.clusters.cluster_indices(grid) {
            let slot = cursors[cluster].fetch_add(1, Ordering::Relaxed);
            nodes[slot as usize].store(packed, Ordering::Relaxed);
        }
    });
}
