//! Uploader backend abstraction layer
//!
//! Provides the [`GpuUploader`] boundary and its implementations.
//!
//! # Available Backends
//!
//! - `memory` (always available): CPU-side resources, used headless and in tests
//! - `wgpu-backend`: buffers and 3D textures on a wgpu device

pub mod memory;
pub mod traits;
pub mod types;
#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

pub use memory::MemoryUploader;
pub use traits::*;
pub use types::*;
#[cfg(feature = "wgpu-backend")]
pub use wgpu_backend::WgpuUploader;
