//! Upload of the clustered light data through a [`GpuUploader`]
//!
//! Capacity is reserved for every view before any data is written, sized to
//! the largest view of the frame. Resources never get a zero-sized
//! allocation or an empty write: a kind with no data for a view receives a
//! single zeroed element.

use super::cluster_compactor::CompactedCluster;
use super::frame::{FrameContext, ViewFrameState};
use crate::backend::{
    BackendResult, Extent3d, GpuUploader, ResourceDescriptor, ResourceHandle, ResourceKind,
};
use bytemuck::Pod;

/// Handles of the resources bound for one view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewResources {
    pub cluster_texture: ResourceHandle,
    pub light_indices: ResourceHandle,
    pub point_lights: ResourceHandle,
    pub spot_lights: ResourceHandle,
}

impl ViewResources {
    pub fn handle(&self, kind: ResourceKind) -> ResourceHandle {
        match kind {
            ResourceKind::ClusterTexture => self.cluster_texture,
            ResourceKind::LightIndices => self.light_indices,
            ResourceKind::PointLights => self.point_lights,
            ResourceKind::SpotLights => self.spot_lights,
        }
    }
}

/// Per-kind element capacity shared by all views of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadCapacity {
    pub cluster_extent: Extent3d,
    pub light_indices: u32,
    pub point_lights: u32,
    pub spot_lights: u32,
}

impl UploadCapacity {
    /// Smallest capacity any backend accepts
    pub const MINIMUM: Self = Self {
        cluster_extent: Extent3d::ONE,
        light_indices: 1,
        point_lights: 1,
        spot_lights: 1,
    };

    /// Maximum over every view of the frame
    pub fn for_frame(frame: &FrameContext) -> Self {
        frame
            .views()
            .iter()
            .fold(Self::MINIMUM, |capacity, view| Self {
                cluster_extent: capacity.cluster_extent.max(view.cluster_extent()),
                light_indices: capacity.light_indices.max(view.light_indices().len() as u32),
                point_lights: capacity.point_lights.max(view.point_lights().len() as u32),
                spot_lights: capacity.spot_lights.max(view.spot_lights().len() as u32),
            })
    }

    pub fn extent(&self, kind: ResourceKind) -> Extent3d {
        match kind {
            ResourceKind::ClusterTexture => self.cluster_extent,
            ResourceKind::LightIndices => Extent3d::linear(self.light_indices),
            ResourceKind::PointLights => Extent3d::linear(self.point_lights),
            ResourceKind::SpotLights => Extent3d::linear(self.spot_lights),
        }
    }
}

/// Reserve capacity for all views, then write each view's data
pub fn upload_frame<U: GpuUploader + ?Sized>(
    frame: &FrameContext,
    uploader: &mut U,
) -> BackendResult<Vec<ViewResources>> {
    let capacity = UploadCapacity::for_frame(frame);
    log::trace!(
        "Light cluster capacity: {:?} clusters, {} indices, {} point lights, {} spot lights",
        capacity.cluster_extent,
        capacity.light_indices,
        capacity.point_lights,
        capacity.spot_lights
    );

    let mut resources = Vec::with_capacity(frame.view_count());
    for view in 0..frame.view_count() as u32 {
        let mut reserve = |kind| {
            uploader.ensure_capacity(&ResourceDescriptor::new(view, kind, capacity.extent(kind)))
        };
        resources.push(ViewResources {
            cluster_texture: reserve(ResourceKind::ClusterTexture)?,
            light_indices: reserve(ResourceKind::LightIndices)?,
            point_lights: reserve(ResourceKind::PointLights)?,
            spot_lights: reserve(ResourceKind::SpotLights)?,
        });
    }

    for (state, handles) in frame.views().iter().zip(&resources) {
        upload_view(uploader, state, handles)?;
    }
    Ok(resources)
}

fn upload_view<U: GpuUploader + ?Sized>(
    uploader: &mut U,
    state: &ViewFrameState,
    handles: &ViewResources,
) -> BackendResult<()> {
    let clusters = state.compacted_clusters();
    if clusters.is_empty() {
        let empty = CompactedCluster::default();
        uploader.upload_texture(handles.cluster_texture, Extent3d::ONE, bytemuck::bytes_of(&empty))?;
    } else {
        uploader.upload_texture(
            handles.cluster_texture,
            state.cluster_extent(),
            bytemuck::cast_slice(clusters),
        )?;
    }
    upload_elements(uploader, handles.light_indices, state.light_indices())?;
    upload_elements(uploader, handles.point_lights, state.point_lights())?;
    upload_elements(uploader, handles.spot_lights, state.spot_lights())
}

fn upload_elements<U: GpuUploader + ?Sized, T: Pod>(
    uploader: &mut U,
    handle: ResourceHandle,
    data: &[T],
) -> BackendResult<()> {
    if data.is_empty() {
        uploader.upload(handle, 0, bytemuck::bytes_of(&T::zeroed()))
    } else {
        uploader.upload(handle, 0, bytemuck::cast_slice(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryUploader;

    #[test]
    fn empty_frame_gets_minimum_resources() {
        let mut frame = FrameContext::new();
        frame.begin_frame(2);
        let mut uploader = MemoryUploader::new();
        let resources = upload_frame(&frame, &mut uploader).expect("upload");

        assert_eq!(resources.len(), 2);
        assert_eq!(uploader.resource_count(), 8);
        for handles in &resources {
            for kind in ResourceKind::ALL {
                let handle = handles.handle(kind);
                assert_eq!(uploader.extent(handle), Some(Extent3d::ONE));
                let bytes = uploader.bytes(handle).expect("resource");
                assert_eq!(bytes.len() as u64, kind.element_size());
                assert!(bytes.iter().all(|&b| b == 0));
            }
        }
    }

    #[test]
    fn capacity_of_empty_frame_is_minimum() {
        let frame = FrameContext::new();
        assert_eq!(UploadCapacity::for_frame(&frame), UploadCapacity::MINIMUM);
        assert_eq!(
            UploadCapacity::MINIMUM.extent(ResourceKind::PointLights),
            Extent3d::linear(1)
        );
    }
}
