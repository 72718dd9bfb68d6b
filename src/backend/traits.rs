//! Core uploader abstraction
//!
//! The clustering passes never talk to a GPU API directly. They size and fill
//! resources through [`GpuUploader`], which both the in-memory and the wgpu
//! backends implement.

use crate::backend::types::*;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to create buffer: {0}")]
    BufferCreationFailed(String),
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Zero-sized resource rejected: {0}")]
    ZeroSizedResource(String),
    #[error("Unknown resource handle {0:?}")]
    UnknownHandle(ResourceHandle),
    #[error("Resource {handle:?} is a {actual:?}, expected a {expected}")]
    WrongResourceType {
        handle: ResourceHandle,
        actual: ResourceKind,
        expected: &'static str,
    },
    #[error("Upload of {len} bytes at offset {offset} exceeds resource size {capacity}")]
    OutOfBounds { offset: u64, len: u64, capacity: u64 },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU buffer or texture owned by an uploader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub(crate) u64);

impl ResourceHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Receiver of the clustered light data.
///
/// Resources are keyed by `(view, kind)`. Capacity only grows: a request that
/// fits the current resource returns the same handle.
pub trait GpuUploader {
    /// Make sure the resource for `desc.view`/`desc.kind` holds at least
    /// `desc.extent` elements, (re)allocating when it does not.
    fn ensure_capacity(&mut self, desc: &ResourceDescriptor) -> BackendResult<ResourceHandle>;

    /// Write `data` into a buffer starting at `byte_offset`
    fn upload(&mut self, handle: ResourceHandle, byte_offset: u64, data: &[u8])
        -> BackendResult<()>;

    /// Write tightly packed texels into the `region` at the texture origin
    fn upload_texture(
        &mut self,
        handle: ResourceHandle,
        region: Extent3d,
        data: &[u8],
    ) -> BackendResult<()>;
}

/// Validate a buffer write against the resource size
pub(crate) fn check_buffer_write(byte_offset: u64, len: usize, capacity: u64) -> BackendResult<()> {
    let len = len as u64;
    if len == 0 {
        return Err(BackendError::ZeroSizedResource("empty buffer upload".into()));
    }
    match byte_offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(BackendError::OutOfBounds {
            offset: byte_offset,
            len,
            capacity,
        }),
    }
}

/// Validate a texture write against the texture extent
pub(crate) fn check_texture_write(
    region: Extent3d,
    data_len: usize,
    extent: Extent3d,
    texel_size: u64,
) -> BackendResult<()> {
    let expected = region.element_count() * texel_size;
    if expected == 0 || data_len == 0 {
        return Err(BackendError::ZeroSizedResource("empty texture upload".into()));
    }
    if !extent.contains(region) || data_len as u64 != expected {
        return Err(BackendError::OutOfBounds {
            offset: 0,
            len: data_len as u64,
            capacity: extent.element_count() * texel_size,
        });
    }
    Ok(())
}
