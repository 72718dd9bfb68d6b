//! Clustered point/spot light renderer
//!
//! Drives the per-frame phases for every view:
//! 1. Reset the view's state and derive its cluster layout
//! 2. Bin the lights ([`bin_lights`])
//! 3. Compact the clusters ([`compact_clusters`])
//!
//! and uploads the result through a [`GpuUploader`].

use super::cluster_compactor::compact_clusters;
use super::cluster_grid::{ClusterDescriptor, ClusterShaderParams};
use super::frame::{FrameContext, ViewFrameState};
use super::light_binner::bin_lights;
use super::light_upload::{upload_frame, ViewResources};
use crate::backend::GpuUploader;
use crate::error::ClusterResult;
use crate::scene::{LightCollection, RenderView};
use crate::LightClusterConfig;

/// Assigns the frame's point and spot lights to view clusters
pub struct ClusteredLightRenderer {
    config: LightClusterConfig,
    frame: FrameContext,
    /// Lights without a valid radius in the last prepared frame
    invalid_light_count: usize,
}

impl ClusteredLightRenderer {
    pub fn new(config: LightClusterConfig) -> ClusterResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            frame: FrameContext::new(),
            invalid_light_count: 0,
        })
    }

    pub fn config(&self) -> &LightClusterConfig {
        &self.config
    }

    /// Bin and compact `lights` for every view. Results of the previous frame
    /// are discarded.
    pub fn prepare(&mut self, lights: &LightCollection, views: &[RenderView]) {
        let linear = self.config.use_linear_lighting;
        let invalid = lights
            .points
            .iter()
            .map(|light| light.culling_radius(linear))
            .chain(lights.spots.iter().map(|light| light.culling_radius(linear)))
            .filter(|radius| *radius <= 0.0)
            .count();
        // Reported when the count changes, not every frame
        if invalid != self.invalid_light_count {
            if invalid > 0 {
                log::warn!("Skipping {invalid} lights without a valid radius");
            } else {
                log::debug!("All lights have a valid radius again");
            }
            self.invalid_light_count = invalid;
        }

        self.frame.begin_frame(views.len());
        for (index, (view, state)) in views.iter().zip(self.frame.views_mut()).enumerate() {
            process_view(index, view, lights, &self.config, state);
        }
    }

    /// Upload every view's clusters and lights, returning the bound resources per view
    pub fn upload<U: GpuUploader + ?Sized>(
        &self,
        uploader: &mut U,
    ) -> ClusterResult<Vec<ViewResources>> {
        Ok(upload_frame(&self.frame, uploader)?)
    }

    /// Number of lights skipped in the last frame for lacking a valid radius
    pub fn invalid_light_count(&self) -> usize {
        self.invalid_light_count
    }

    pub fn frame(&self) -> &FrameContext {
        &self.frame
    }

    pub fn view_count(&self) -> usize {
        self.frame.view_count()
    }

    pub fn view(&self, index: usize) -> Option<&ViewFrameState> {
        self.frame.view(index)
    }

    /// Shader constants of a view, `None` if it was skipped this frame
    pub fn shader_params(&self, index: usize) -> Option<ClusterShaderParams> {
        self.frame
            .view(index)
            .and_then(|state| state.descriptor())
            .map(|descriptor| descriptor.shader_params())
    }
}

fn process_view(
    index: usize,
    view: &RenderView,
    lights: &LightCollection,
    config: &LightClusterConfig,
    state: &mut ViewFrameState,
) {
    state.reset();
    let Some(descriptor) = ClusterDescriptor::from_view(view, config) else {
        log::warn!(
            "Skipping light clustering for view {index} (viewport {:?}, clip planes {}..{})",
            view.viewport_size,
            view.near_clip_plane,
            view.far_clip_plane
        );
        return;
    };
    state.descriptor = Some(descriptor);

    bin_lights(state, view, lights, config);
    compact_clusters(state, config.clusters_per_task);

    log::debug!(
        "View {index}: {}x{}x{} clusters, {} point / {} spot lights visible, {} cluster references",
        descriptor.grid.tile_count_x(),
        descriptor.grid.tile_count_y(),
        descriptor.grid.slice_count(),
        state.point_lights().len(),
        state.spot_lights().len(),
        state.node_count()
    );
}
