//! Clustered light assignment pipeline
//!
//! Per view and frame:
//! 1. Depth slicing and tile layout - [`ClusterDescriptor`]
//! 2. Binning - lights to clusters with a parallel counting sort
//! 3. Compaction - per-cluster index runs and [`CompactedCluster`] records
//! 4. Upload - cluster texture, index buffer and light buffers

pub mod clip_region;
pub mod cluster_compactor;
pub mod cluster_grid;
pub mod depth_slicer;
pub mod frame;
pub mod light_binner;
pub mod light_clustering;
pub mod light_upload;

pub use clip_region::{compute_clip_region, ClipRegion, ProjectionTerms};
pub use cluster_compactor::{compact_clusters, CompactedCluster};
pub use cluster_grid::{
    ClusterBox, ClusterDescriptor, ClusterGrid, ClusterShaderParams, MAX_TILES_PER_AXIS,
};
pub use depth_slicer::DepthSlicer;
pub use frame::{FrameContext, LightBinding, LightClusterNode, ViewFrameState};
pub use light_binner::{bin_lights, compute_cluster_box};
pub use light_clustering::ClusteredLightRenderer;
pub use light_upload::{upload_frame, UploadCapacity, ViewResources};
