//! Lilium Clusters - clustered light assignment for Forward+ shading
//!
//! Every frame, dynamic point and spot lights are binned into a 3D grid of
//! view-frustum clusters (screen tiles × exponential depth slices). The
//! result is a compact table consumed by a clustered forward shading pass:
//! - a 3D texture of `(index_start, point_count | spot_count << 16)` per cluster
//! - a flat `u32` light index buffer
//! - point and spot light parameter buffers
//!
//! # Features
//! - Data-parallel binning (counting sort with atomic counters) and compaction via rayon
//! - Conservative closed-form sphere clip regions
//! - Multiple views per frame with a single capacity pass before upload
//! - Pluggable upload backends: an in-memory backend and wgpu (feature `wgpu-backend`)
//!
//! # Example
//!
//! ```
//! use glam::{Vec2, Vec3};
//! use lilium_clusters::{
//!     ClusteredLightRenderer, LightClusterConfig, LightCollection, MemoryUploader, RenderView,
//! };
//!
//! let mut renderer = ClusteredLightRenderer::new(LightClusterConfig::default()).unwrap();
//! let mut lights = LightCollection::new();
//! lights.add_point_light(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE, 2.0);
//!
//! let view = RenderView::perspective(
//!     Vec3::ZERO,
//!     Vec3::NEG_Z,
//!     Vec3::Y,
//!     60f32.to_radians(),
//!     Vec2::new(1920.0, 1080.0),
//!     0.1,
//!     1000.0,
//! );
//! renderer.prepare(&lights, &[view]);
//!
//! let mut uploader = MemoryUploader::new();
//! let resources = renderer.upload(&mut uploader).unwrap();
//! assert_eq!(resources.len(), 1);
//! ```

pub mod backend;
pub mod error;
pub mod pipeline;
pub mod scene;

pub use backend::{GpuUploader, MemoryUploader};
#[cfg(feature = "wgpu-backend")]
pub use backend::WgpuUploader;
pub use error::{ClusterError, ClusterResult};
pub use pipeline::{ClusterShaderParams, ClusteredLightRenderer, CompactedCluster, ViewResources};
pub use scene::{Light, LightCollection, LightKind, PointLight, RenderView, SpotLight};

/// Largest supported number of depth slices.
///
/// `2^slices` must stay exactly representable and packed counts must fit
/// the cluster texel layout.
pub const MAX_CLUSTER_SLICES: u32 = 16;

/// Configuration for clustered light assignment
#[derive(Debug, Clone, PartialEq)]
pub struct LightClusterConfig {
    /// Size of a screen tile in pixels
    pub cluster_size: u32,
    /// Number of exponential depth slices
    pub cluster_slices: u32,
    /// View-space depth at which the first slice ends
    pub special_near_plane: f32,
    /// Interpret light radius terms as `1/r` instead of `1/r²`
    pub use_linear_lighting: bool,
    /// Minimum number of contiguous clusters handed to one worker during compaction
    pub clusters_per_task: usize,
}

impl Default for LightClusterConfig {
    fn default() -> Self {
        Self {
            cluster_size: 64,
            cluster_slices: 8,
            special_near_plane: 2.0,
            use_linear_lighting: false,
            clusters_per_task: 64,
        }
    }
}

impl LightClusterConfig {
    pub fn with_cluster_size(mut self, cluster_size: u32) -> Self {
        self.cluster_size = cluster_size;
        self
    }

    pub fn with_cluster_slices(mut self, cluster_slices: u32) -> Self {
        self.cluster_slices = cluster_slices;
        self
    }

    pub fn with_special_near_plane(mut self, special_near_plane: f32) -> Self {
        self.special_near_plane = special_near_plane;
        self
    }

    pub fn with_linear_lighting(mut self, use_linear_lighting: bool) -> Self {
        self.use_linear_lighting = use_linear_lighting;
        self
    }

    pub fn with_clusters_per_task(mut self, clusters_per_task: usize) -> Self {
        self.clusters_per_task = clusters_per_task;
        self
    }

    /// Check the configuration before any frame is processed
    pub fn validate(&self) -> ClusterResult<()> {
        if self.cluster_size == 0 {
            return Err(ClusterError::InvalidConfig(
                "cluster_size must be greater than zero".into(),
            ));
        }
        if !(2..=MAX_CLUSTER_SLICES).contains(&self.cluster_slices) {
            return Err(ClusterError::InvalidConfig(format!(
                "cluster_slices must be in 2..={MAX_CLUSTER_SLICES}, got {}",
                self.cluster_slices
            )));
        }
        if !(self.special_near_plane.is_finite() && self.special_near_plane > 0.0) {
            return Err(ClusterError::InvalidConfig(format!(
                "special_near_plane must be positive and finite, got {}",
                self.special_near_plane
            )));
        }
        if self.clusters_per_task == 0 {
            return Err(ClusterError::InvalidConfig(
                "clusters_per_task must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_config_is_valid() {
        let config = LightClusterConfig::default();
        assert_eq!(config.cluster_size, 64);
        assert_eq!(config.cluster_slices, 8);
        assert_eq!(config.special_near_plane, 2.0);
        assert!(!config.use_linear_lighting);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::zero_cluster_size(LightClusterConfig::default().with_cluster_size(0))]
    #[case::single_slice(LightClusterConfig::default().with_cluster_slices(1))]
    #[case::too_many_slices(LightClusterConfig::default().with_cluster_slices(17))]
    #[case::negative_near(LightClusterConfig::default().with_special_near_plane(-1.0))]
    #[case::nan_near(LightClusterConfig::default().with_special_near_plane(f32::NAN))]
    #[case::zero_task_size(LightClusterConfig::default().with_clusters_per_task(0))]
    fn invalid_configs_are_rejected(#[case] config: LightClusterConfig) {
        assert!(matches!(
            config.validate(),
            Err(ClusterError::InvalidConfig(_))
        ));
    }
}
