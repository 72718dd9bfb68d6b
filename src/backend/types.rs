//! Common types shared between uploader backends

use crate::pipeline::CompactedCluster;
use crate::scene::{PointLightData, SpotLightData};

/// Kind of GPU resource produced by light clustering. Every view owns one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// 3D texture with one `(index_start, packed_counts)` texel per cluster
    ClusterTexture,
    /// Flat `u32` light index buffer
    LightIndices,
    /// `PointLightData` records
    PointLights,
    /// `SpotLightData` records
    SpotLights,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::ClusterTexture,
        ResourceKind::LightIndices,
        ResourceKind::PointLights,
        ResourceKind::SpotLights,
    ];

    /// Size in bytes of one element (texel or buffer record)
    pub fn element_size(&self) -> u64 {
        let size = match self {
            ResourceKind::ClusterTexture => std::mem::size_of::<CompactedCluster>(),
            ResourceKind::LightIndices => std::mem::size_of::<u32>(),
            ResourceKind::PointLights => std::mem::size_of::<PointLightData>(),
            ResourceKind::SpotLights => std::mem::size_of::<SpotLightData>(),
        };
        size as u64
    }

    pub fn is_texture(&self) -> bool {
        matches!(self, ResourceKind::ClusterTexture)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::ClusterTexture => "Light Clusters",
            ResourceKind::LightIndices => "Light Indices",
            ResourceKind::PointLights => "Point Lights",
            ResourceKind::SpotLights => "Spot Lights",
        }
    }

    /// Texel format for texture resources
    pub fn texture_format(&self) -> Option<TextureFormat> {
        match self {
            ResourceKind::ClusterTexture => Some(TextureFormat::Rg32Uint),
            _ => None,
        }
    }

    /// Resources are copy sources so their contents can be read back
    pub fn buffer_usage(&self) -> BufferUsage {
        BufferUsage::STORAGE | BufferUsage::COPY_DST | BufferUsage::COPY_SRC
    }

    pub fn texture_usage(&self) -> TextureUsage {
        TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST | TextureUsage::COPY_SRC
    }
}

/// Texture format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Two 32-bit unsigned channels
    Rg32Uint,
}

impl TextureFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Rg32Uint => 8,
        }
    }
}

/// Texture usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureUsage(u32);

impl TextureUsage {
    pub const COPY_DST: Self = Self(1 << 0);
    pub const TEXTURE_BINDING: Self = Self(1 << 1);
    pub const COPY_SRC: Self = Self(1 << 2);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for TextureUsage {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferUsage(u32);

impl BufferUsage {
    pub const COPY_DST: Self = Self(1 << 0);
    pub const STORAGE: Self = Self(1 << 1);
    pub const COPY_SRC: Self = Self(1 << 2);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Extent of a resource in elements. Buffers use `height == depth == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3d {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Extent3d {
    pub const ONE: Self = Self::new(1, 1, 1);

    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self { width, height, depth }
    }

    /// A one-dimensional extent for buffers
    pub const fn linear(count: u32) -> Self {
        Self::new(count, 1, 1)
    }

    pub fn element_count(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.depth as u64
    }

    /// Component-wise maximum
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.width.max(other.width),
            self.height.max(other.height),
            self.depth.max(other.depth),
        )
    }

    /// True when `other` fits inside `self` on every axis
    pub fn contains(&self, other: Self) -> bool {
        other.width <= self.width && other.height <= self.height && other.depth <= self.depth
    }
}

/// Request for a per-view resource with at least the given extent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub view: u32,
    pub kind: ResourceKind,
    pub extent: Extent3d,
}

impl ResourceDescriptor {
    pub fn new(view: u32, kind: ResourceKind, extent: Extent3d) -> Self {
        Self { view, kind, extent }
    }

    pub fn byte_size(&self) -> u64 {
        self.extent.element_count() * self.kind.element_size()
    }

    pub fn label(&self) -> String {
        format!("{} (view {})", self.kind.label(), self.view)
    }
}
