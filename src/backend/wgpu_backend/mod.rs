//! wgpu uploader backend

use crate::backend::traits::*;
use crate::backend::types::*;
use std::collections::HashMap;
use std::sync::Arc;

enum WgpuResource {
    Buffer {
        buffer: wgpu::Buffer,
        size: u64,
        kind: ResourceKind,
    },
    Texture {
        texture: wgpu::Texture,
        view: wgpu::TextureView,
        extent: Extent3d,
    },
}

/// Uploader backed by a wgpu device and queue.
///
/// Writes go through `Queue::write_buffer`/`Queue::write_texture`, so they land
/// before any command buffer submitted afterwards on the same queue.
pub struct WgpuUploader {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    resources: HashMap<u64, WgpuResource>,
    slots: HashMap<(u32, ResourceKind), u64>,
    next_resource_id: u64,
}

impl WgpuUploader {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self {
            device,
            queue,
            resources: HashMap::new(),
            slots: HashMap::new(),
            next_resource_id: 1,
        }
    }

    /// Buffer behind a handle, for binding in the shading pass
    pub fn buffer(&self, handle: ResourceHandle) -> Option<&wgpu::Buffer> {
        match self.resources.get(&handle.0) {
            Some(WgpuResource::Buffer { buffer, .. }) => Some(buffer),
            _ => None,
        }
    }

    /// Texture behind a handle, for copies and readback
    pub fn texture(&self, handle: ResourceHandle) -> Option<&wgpu::Texture> {
        match self.resources.get(&handle.0) {
            Some(WgpuResource::Texture { texture, .. }) => Some(texture),
            _ => None,
        }
    }

    /// Texture view behind a handle, for binding in the shading pass
    pub fn texture_view(&self, handle: ResourceHandle) -> Option<&wgpu::TextureView> {
        match self.resources.get(&handle.0) {
            Some(WgpuResource::Texture { view, .. }) => Some(view),
            _ => None,
        }
    }

    fn convert_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
        match format {
            TextureFormat::Rg32Uint => wgpu::TextureFormat::Rg32Uint,
        }
    }

    fn convert_buffer_usage(usage: BufferUsage) -> wgpu::BufferUsages {
        let mut result = wgpu::BufferUsages::empty();
        if usage.contains(BufferUsage::COPY_DST) {
            result |= wgpu::BufferUsages::COPY_DST;
        }
        if usage.contains(BufferUsage::STORAGE) {
            result |= wgpu::BufferUsages::STORAGE;
        }
        if usage.contains(BufferUsage::COPY_SRC) {
            result |= wgpu::BufferUsages::COPY_SRC;
        }
        result
    }

    fn convert_texture_usage(usage: TextureUsage) -> wgpu::TextureUsages {
        let mut result = wgpu::TextureUsages::empty();
        if usage.contains(TextureUsage::COPY_DST) {
            result |= wgpu::TextureUsages::COPY_DST;
        }
        if usage.contains(TextureUsage::TEXTURE_BINDING) {
            result |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if usage.contains(TextureUsage::COPY_SRC) {
            result |= wgpu::TextureUsages::COPY_SRC;
        }
        result
    }

    fn fits(resource: &WgpuResource, desc: &ResourceDescriptor) -> bool {
        match resource {
            WgpuResource::Buffer { size, .. } => *size >= desc.byte_size(),
            WgpuResource::Texture { extent, .. } => extent.contains(desc.extent),
        }
    }

    fn create_resource(&self, desc: &ResourceDescriptor, extent: Extent3d) -> BackendResult<WgpuResource> {
        let label = desc.label();
        if let Some(format) = desc.kind.texture_format() {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label.as_str()),
                size: wgpu::Extent3d {
                    width: extent.width,
                    height: extent.height,
                    depth_or_array_layers: extent.depth,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D3,
                format: Self::convert_texture_format(format),
                usage: Self::convert_texture_usage(desc.kind.texture_usage()),
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            Ok(WgpuResource::Texture {
                texture,
                view,
                extent,
            })
        } else {
            let size = extent.element_count() * desc.kind.element_size();
            let limit = self.device.limits().max_storage_buffer_binding_size as u64;
            if size > limit {
                return Err(BackendError::BufferCreationFailed(format!(
                    "{label}: {size} bytes exceeds the storage binding limit of {limit}"
                )));
            }
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label.as_str()),
                size,
                usage: Self::convert_buffer_usage(desc.kind.buffer_usage()),
                mapped_at_creation: false,
            });
            Ok(WgpuResource::Buffer {
                buffer,
                size,
                kind: desc.kind,
            })
        }
    }
}

impl GpuUploader for WgpuUploader {
    fn ensure_capacity(&mut self, desc: &ResourceDescriptor) -> BackendResult<ResourceHandle> {
        if desc.byte_size() == 0 {
            return Err(BackendError::ZeroSizedResource(desc.label()));
        }

        let slot = (desc.view, desc.kind);
        let mut extent = desc.extent;
        if let Some(id) = self.slots.get(&slot).copied() {
            if let Some(existing) = self.resources.get(&id) {
                if Self::fits(existing, desc) {
                    return Ok(ResourceHandle(id));
                }
                if let WgpuResource::Texture { extent: old, .. } = existing {
                    extent = old.max(desc.extent);
                }
            }
            if let Some(old) = self.resources.remove(&id) {
                match old {
                    WgpuResource::Buffer { buffer, .. } => buffer.destroy(),
                    WgpuResource::Texture { texture, .. } => texture.destroy(),
                }
            }
        }

        let resource = self.create_resource(desc, extent)?;
        log::info!("Allocated {} with extent {:?}", desc.label(), extent);

        let id = self.next_resource_id;
        self.next_resource_id += 1;
        self.resources.insert(id, resource);
        self.slots.insert(slot, id);

        Ok(ResourceHandle(id))
    }

    fn upload(
        &mut self,
        handle: ResourceHandle,
        byte_offset: u64,
        data: &[u8],
    ) -> BackendResult<()> {
        match self.resources.get(&handle.0) {
            Some(WgpuResource::Buffer { buffer, size, .. }) => {
                check_buffer_write(byte_offset, data.len(), *size)?;
                self.queue.write_buffer(buffer, byte_offset, data);
                Ok(())
            }
            Some(WgpuResource::Texture { .. }) => Err(BackendError::WrongResourceType {
                handle,
                actual: ResourceKind::ClusterTexture,
                expected: "buffer",
            }),
            None => Err(BackendError::UnknownHandle(handle)),
        }
    }

    fn upload_texture(
        &mut self,
        handle: ResourceHandle,
        region: Extent3d,
        data: &[u8],
    ) -> BackendResult<()> {
        let Some(resource) = self.resources.get(&handle.0) else {
            return Err(BackendError::UnknownHandle(handle));
        };
        let (texture, extent) = match resource {
            WgpuResource::Texture { texture, extent, .. } => (texture, extent),
            WgpuResource::Buffer { kind, .. } => {
                return Err(BackendError::WrongResourceType {
                    handle,
                    actual: *kind,
                    expected: "texture",
                })
            }
        };

        let texel_size = ResourceKind::ClusterTexture.element_size();
        check_texture_write(region, data.len(), *extent, texel_size)?;

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(region.width * texel_size as u32),
                rows_per_image: Some(region.height),
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: region.depth,
            },
        );
        Ok(())
    }
}
