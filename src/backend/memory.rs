//! In-memory uploader backend
//!
//! Keeps every resource as a byte vector. It enforces the same rules as a
//! strict GPU backend: zero-sized allocations and empty or out-of-range
//! writes are errors.

use crate::backend::traits::*;
use crate::backend::types::*;
use std::collections::HashMap;

struct MemoryResource {
    kind: ResourceKind,
    extent: Extent3d,
    bytes: Vec<u8>,
}

/// CPU-side uploader backend
pub struct MemoryUploader {
    resources: HashMap<u64, MemoryResource>,
    slots: HashMap<(u32, ResourceKind), u64>,
    next_resource_id: u64,
    allocation_count: usize,
    upload_count: usize,
}

impl Default for MemoryUploader {
    fn default() -> Self {
        Self {
            resources: HashMap::new(),
            slots: HashMap::new(),
            // Ids start at 1, as in the wgpu backend
            next_resource_id: 1,
            allocation_count: 0,
            upload_count: 0,
        }
    }
}

impl MemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle currently bound to a view's resource slot
    pub fn handle(&self, view: u32, kind: ResourceKind) -> Option<ResourceHandle> {
        self.slots.get(&(view, kind)).copied().map(ResourceHandle)
    }

    /// Raw contents of a resource
    pub fn bytes(&self, handle: ResourceHandle) -> Option<&[u8]> {
        self.resources.get(&handle.0).map(|r| r.bytes.as_slice())
    }

    /// Allocated extent of a resource
    pub fn extent(&self, handle: ResourceHandle) -> Option<Extent3d> {
        self.resources.get(&handle.0).map(|r| r.extent)
    }

    /// Number of allocations performed so far (reallocations included)
    pub fn allocation_count(&self) -> usize {
        self.allocation_count
    }

    /// Number of successful writes
    pub fn upload_count(&self) -> usize {
        self.upload_count
    }

    /// Number of live resources
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    fn resource_mut(&mut self, handle: ResourceHandle) -> BackendResult<&mut MemoryResource> {
        self.resources
            .get_mut(&handle.0)
            .ok_or(BackendError::UnknownHandle(handle))
    }
}

impl GpuUploader for MemoryUploader {
    fn ensure_capacity(&mut self, desc: &ResourceDescriptor) -> BackendResult<ResourceHandle> {
        if desc.byte_size() == 0 {
            return Err(BackendError::ZeroSizedResource(desc.label()));
        }

        let slot = (desc.view, desc.kind);
        let mut extent = desc.extent;
        if let Some(id) = self.slots.get(&slot).copied() {
            if let Some(existing) = self.resources.get(&id) {
                if existing.extent.contains(desc.extent) {
                    return Ok(ResourceHandle(id));
                }
                extent = existing.extent.max(desc.extent);
            }
            self.resources.remove(&id);
        }

        let id = self.next_resource_id;
        self.next_resource_id += 1;
        let byte_size = extent.element_count() * desc.kind.element_size();
        log::trace!(
            "Allocating {} with extent {:?} ({} bytes)",
            desc.label(),
            extent,
            byte_size
        );
        self.resources.insert(
            id,
            MemoryResource {
                kind: desc.kind,
                extent,
                bytes: vec![0; byte_size as usize],
            },
        );
        self.slots.insert(slot, id);
        self.allocation_count += 1;

        Ok(ResourceHandle(id))
    }

    fn upload(
        &mut self,
        handle: ResourceHandle,
        byte_offset: u64,
        data: &[u8],
    ) -> BackendResult<()> {
        let resource = self.resource_mut(handle)?;
        if resource.kind.is_texture() {
            return Err(BackendError::WrongResourceType {
                handle,
                actual: resource.kind,
                expected: "buffer",
            });
        }
        check_buffer_write(byte_offset, data.len(), resource.bytes.len() as u64)?;

        let start = byte_offset as usize;
        resource.bytes[start..start + data.len()].copy_from_slice(data);
        self.upload_count += 1;
        Ok(())
    }

    fn upload_texture(
        &mut self,
        handle: ResourceHandle,
        region: Extent3d,
        data: &[u8],
    ) -> BackendResult<()> {
        let resource = self.resource_mut(handle)?;
        if !resource.kind.is_texture() {
            return Err(BackendError::WrongResourceType {
                handle,
                actual: resource.kind,
                expected: "texture",
            });
        }
        let texel_size = resource.kind.element_size();
        check_texture_write(region, data.len(), resource.extent, texel_size)?;

        let texel_size = texel_size as usize;
        let row_len = region.width as usize * texel_size;
        let extent = resource.extent;
        for z in 0..region.depth as usize {
            for y in 0..region.height as usize {
                let src = (z * region.height as usize + y) * row_len;
                let dst = ((z * extent.height as usize + y) * extent.width as usize) * texel_size;
                resource.bytes[dst..dst + row_len].copy_from_slice(&data[src..src + row_len]);
            }
        }
        self.upload_count += 1;
        Ok(())
    }
}
