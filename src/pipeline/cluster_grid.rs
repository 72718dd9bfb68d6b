//! Cluster grid layout for a single view

use super::depth_slicer::DepthSlicer;
use crate::scene::RenderView;
use crate::LightClusterConfig;
use bytemuck::{Pod, Zeroable};
use glam::{UVec3, Vec2};
use std::ops::Range;

/// Largest number of tiles along a screen axis, the usual 3D texture
/// dimension limit
pub const MAX_TILES_PER_AXIS: u32 = 2048;

/// Cluster dimensions of one view: screen tiles × depth slices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterGrid {
    /// `(tiles_x, tiles_y, slices)`
    pub dims: UVec3,
    /// Tile size in pixels
    pub cluster_size: u32,
    /// Viewport size in pixels
    pub view_size: Vec2,
}

impl ClusterGrid {
    pub fn new(view_size: Vec2, cluster_size: u32, slices: u32) -> Self {
        let tiles = (view_size / cluster_size as f32).ceil();
        Self {
            dims: UVec3::new(tiles.x as u32, tiles.y as u32, slices),
            cluster_size,
            view_size,
        }
    }

    pub fn tile_count_x(&self) -> u32 {
        self.dims.x
    }

    pub fn tile_count_y(&self) -> u32 {
        self.dims.y
    }

    pub fn slice_count(&self) -> u32 {
        self.dims.z
    }

    pub fn cluster_count(&self) -> usize {
        self.dims.x as usize * self.dims.y as usize * self.dims.z as usize
    }

    /// Linear cluster index, X fastest then Y then Z (3D texture texel order)
    pub fn cluster_index(&self, x: u32, y: u32, z: u32) -> usize {
        let (tx, ty) = (self.dims.x as usize, self.dims.y as usize);
        x as usize + y as usize * tx + z as usize * tx * ty
    }

    pub fn cluster_coords(&self, index: usize) -> UVec3 {
        let (tx, ty) = (self.dims.x as usize, self.dims.y as usize);
        UVec3::new(
            (index % tx) as u32,
            ((index / tx) % ty) as u32,
            (index / (tx * ty)) as u32,
        )
    }

    /// Tiles covered by an NDC interval on the X axis
    pub fn tile_range_x(&self, ndc_min: f32, ndc_max: f32) -> Range<u32> {
        let start = clamp_tile(self.tile_of(ndc_min, self.view_size.x), self.dims.x);
        let end = clamp_tile(self.tile_of(ndc_max, self.view_size.x) + 1.0, self.dims.x);
        start..end.max(start)
    }

    /// Tiles covered by an NDC interval on the Y axis.
    ///
    /// Tile rows count down from the top of the screen while NDC Y points up.
    pub fn tile_range_y(&self, ndc_min: f32, ndc_max: f32) -> Range<u32> {
        let start = clamp_tile(self.tile_of(-ndc_max, self.view_size.y), self.dims.y);
        let end = clamp_tile(self.tile_of(-ndc_min, self.view_size.y) + 1.0, self.dims.y);
        start..end.max(start)
    }

    /// Scale from screen UV to cluster-texture UV
    pub fn cluster_stride(&self) -> Vec2 {
        let covered = self.dims.truncate().as_vec2() * self.cluster_size as f32;
        self.view_size / covered
    }

    fn tile_of(&self, ndc: f32, extent: f32) -> f32 {
        ((ndc * 0.5 + 0.5) * extent / self.cluster_size as f32).floor()
    }
}

fn clamp_tile(tile: f32, count: u32) -> u32 {
    if tile.is_nan() || tile <= 0.0 {
        0
    } else if tile >= count as f32 {
        count
    } else {
        tile as u32
    }
}

/// Half-open 3D box of clusters, `min..max` per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterBox {
    pub min: UVec3,
    pub max: UVec3,
}

impl Default for ClusterBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl ClusterBox {
    pub const EMPTY: Self = Self {
        min: UVec3::ZERO,
        max: UVec3::ZERO,
    };

    pub fn new(x: Range<u32>, y: Range<u32>, z: Range<u32>) -> Self {
        Self {
            min: UVec3::new(x.start, y.start, z.start),
            max: UVec3::new(x.end, y.end, z.end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y || self.max.z <= self.min.z
    }

    /// Number of clusters inside the box
    pub fn volume(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let size = self.max - self.min;
        size.x as usize * size.y as usize * size.z as usize
    }

    pub fn contains(&self, coords: UVec3) -> bool {
        coords.cmpge(self.min).all() && coords.cmplt(self.max).all()
    }

    /// Linear indices of every cluster in the box
    pub fn cluster_indices(self, grid: ClusterGrid) -> impl Iterator<Item = usize> {
        let ClusterBox { min, max } = self;
        (min.z..max.z).flat_map(move |z| {
            (min.y..max.y)
                .flat_map(move |y| (min.x..max.x).map(move |x| grid.cluster_index(x, y, z)))
        })
    }
}

/// Per-view shader constants (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ClusterShaderParams {
    pub cluster_stride: Vec2,
    pub cluster_depth_scale: f32,
    pub cluster_depth_bias: f32,
    pub cluster_count: UVec3,
    pub cluster_size: u32,
}

const _: () = assert!(std::mem::size_of::<ClusterShaderParams>() == 32);

/// Everything needed to map a view-space position to a cluster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterDescriptor {
    pub grid: ClusterGrid,
    pub slicer: DepthSlicer,
}

impl ClusterDescriptor {
    /// Describe the clusters of a view, or `None` when the view can't be clustered
    /// (degenerate viewport, more than [`MAX_TILES_PER_AXIS`] tiles on an axis,
    /// or far plane not beyond the first slice).
    pub fn from_view(view: &RenderView, config: &LightClusterConfig) -> Option<Self> {
        if view.is_degenerate() {
            return None;
        }
        let slicer = DepthSlicer::new(
            view.near_clip_plane,
            view.far_clip_plane,
            config.special_near_plane,
            config.cluster_slices,
        );
        let usable = view.far_clip_plane > slicer.near_plane
            && slicer.depth_scale.is_finite()
            && slicer.depth_scale > 0.0;
        if !usable {
            return None;
        }
        let grid = ClusterGrid::new(view.viewport_size, config.cluster_size, config.cluster_slices);
        if grid.tile_count_x() > MAX_TILES_PER_AXIS || grid.tile_count_y() > MAX_TILES_PER_AXIS {
            return None;
        }
        Some(Self { grid, slicer })
    }

    pub fn cluster_count(&self) -> usize {
        self.grid.cluster_count()
    }

    pub fn shader_params(&self) -> ClusterShaderParams {
        ClusterShaderParams {
            cluster_stride: self.grid.cluster_stride(),
            cluster_depth_scale: self.slicer.depth_scale,
            cluster_depth_bias: self.slicer.depth_bias,
            cluster_count: self.grid.dims,
            cluster_size: self.grid.cluster_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use rstest::rstest;

    fn hd_grid() -> ClusterGrid {
        ClusterGrid::new(Vec2::new(1920.0, 1080.0), 64, 8)
    }

    #[test]
    fn grid_dimensions_round_up() {
        let grid = hd_grid();
        assert_eq!(grid.dims, UVec3::new(30, 17, 8));
        assert_eq!(grid.cluster_count(), 30 * 17 * 8);
    }

    #[test]
    fn cluster_index_round_trips() {
        let grid = hd_grid();
        for index in [0, 1, 29, 30, 509, 510, grid.cluster_count() - 1] {
            let c = grid.cluster_coords(index);
            assert_eq!(grid.cluster_index(c.x, c.y, c.z), index);
        }
        assert_eq!(grid.cluster_index(1, 1, 1), 1 + 30 + 510);
    }

    #[rstest]
    #[case::full(-1.0, 1.0, 0..30)]
    #[case::left_half(-1.0, 0.0, 0..16)]
    #[case::off_left(-3.0, -1.5, 0..0)]
    #[case::off_right(1.5, 3.0, 30..30)]
    #[case::sliver(0.0, 0.001, 15..16)]
    fn tile_range_x_cases(#[case] min: f32, #[case] max: f32, #[case] expected: Range<u32>) {
        assert_eq!(hd_grid().tile_range_x(min, max), expected);
    }

    #[test]
    fn tile_range_y_is_flipped() {
        let grid = hd_grid();
        // Upper half of NDC maps to the first tile rows
        assert_eq!(grid.tile_range_y(0.5, 1.0), 0..5);
        assert_eq!(grid.tile_range_y(-1.0, -0.5), 12..17);
        assert_eq!(grid.tile_range_y(-1.0, 1.0), 0..17);
    }

    #[test]
    fn cluster_stride_covers_partial_tiles() {
        let stride = hd_grid().cluster_stride();
        assert_eq!(stride.x, 1.0);
        assert!((stride.y - 1080.0 / (17.0 * 64.0)).abs() < 1e-6);
    }

    #[test]
    fn box_iterates_its_clusters() {
        let grid = hd_grid();
        let cluster_box = ClusterBox::new(2..4, 5..6, 1..3);
        let indices: Vec<usize> = cluster_box.cluster_indices(grid).collect();
        assert_eq!(indices.len(), cluster_box.volume());
        assert_eq!(indices.len(), 4);
        assert_eq!(indices[0], grid.cluster_index(2, 5, 1));
        assert_eq!(indices[3], grid.cluster_index(3, 5, 2));
        for index in indices {
            assert!(cluster_box.contains(grid.cluster_coords(index)));
        }
        assert!(ClusterBox::EMPTY.is_empty());
        assert_eq!(ClusterBox::new(3..3, 0..1, 0..1).cluster_indices(grid).count(), 0);
    }

    #[rstest]
    #[case::empty(Vec2::ZERO, 0.1, 100.0)]
    #[case::inverted_clip_planes(Vec2::splat(256.0), 5.0, 1.0)]
    #[case::infinite_viewport(Vec2::new(f32::INFINITY, 100.0), 0.1, 100.0)]
    #[case::too_many_tiles(Vec2::new(1.0e9, 100.0), 0.1, 100.0)]
    fn descriptor_rejects_unusable_views(
        #[case] viewport_size: Vec2,
        #[case] near: f32,
        #[case] far: f32,
    ) {
        let projection = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0);
        let view = RenderView::new(Mat4::IDENTITY, projection, viewport_size, near, far);
        assert!(ClusterDescriptor::from_view(&view, &LightClusterConfig::default()).is_none());
    }

    #[test]
    fn descriptor_accepts_largest_grid() {
        let size = (MAX_TILES_PER_AXIS * 64) as f32;
        let projection = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0);
        let view = RenderView::new(Mat4::IDENTITY, projection, Vec2::new(size, 64.0), 0.1, 100.0);
        let descriptor = ClusterDescriptor::from_view(&view, &LightClusterConfig::default())
            .expect("grid at the tile limit");
        assert_eq!(descriptor.grid.dims, UVec3::new(MAX_TILES_PER_AXIS, 1, 8));
    }

    #[test]
    fn shader_params_follow_descriptor() {
        let view = RenderView::perspective(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::Y,
            1.0,
            Vec2::new(1920.0, 1080.0),
            0.1,
            1000.0,
        );
        let descriptor = ClusterDescriptor::from_view(&view, &LightClusterConfig::default())
            .expect("valid view");
        let params = descriptor.shader_params();
        assert_eq!(params.cluster_count, UVec3::new(30, 17, 8));
        assert_eq!(params.cluster_size, 64);
        assert_eq!(params.cluster_depth_scale, descriptor.slicer.depth_scale);
        assert_eq!(bytemuck::bytes_of(&params).len(), 32);
    }
}
