//! wgpu uploader tests against a real device.
//!
//! These need a GPU adapter and are ignored by default. Without an adapter
//! they return early.
//!
//! ```bash
//! cargo test --test wgpu_uploader -- --ignored
//! ```

mod common;

use std::sync::Arc;

use common::{hd_view, init_logger};
use glam::Vec3;
use lilium_clusters::backend::{Extent3d, GpuUploader, ResourceDescriptor, ResourceKind};
use lilium_clusters::{ClusteredLightRenderer, LightClusterConfig, LightCollection, WgpuUploader};

/// Row pitch required by texture-to-buffer copies
const COPY_ROW_ALIGNMENT: u32 = 256;

struct TestDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl TestDevice {
    fn new() -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Cluster Upload Test Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .ok()?;
        Some(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    fn uploader(&self) -> WgpuUploader {
        WgpuUploader::new(self.device.clone(), self.queue.clone())
    }

    fn staging_buffer(&self, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        })
    }

    fn map_staging(&self, staging: &wgpu::Buffer) -> Vec<u8> {
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .expect("map callback")
            .expect("map readback buffer");
        let data = slice.get_mapped_range().to_vec();
        staging.unmap();
        data
    }

    fn read_buffer(&self, buffer: &wgpu::Buffer, size: u64) -> Vec<u8> {
        let staging = self.staging_buffer(size);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit([encoder.finish()]);
        self.map_staging(&staging)
    }

    /// Texels of the whole texture, rows tightly packed
    fn read_texture(&self, texture: &wgpu::Texture, extent: Extent3d, texel_size: u32) -> Vec<u8> {
        let row = extent.width * texel_size;
        let padded_row = row.div_ceil(COPY_ROW_ALIGNMENT) * COPY_ROW_ALIGNMENT;
        let rows = extent.height * extent.depth;
        let staging = self.staging_buffer(padded_row as u64 * rows as u64);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(extent.height),
                },
            },
            wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: extent.depth,
            },
        );
        self.queue.submit([encoder.finish()]);

        self.map_staging(&staging)
            .chunks(padded_row as usize)
            .flat_map(|chunk| chunk[..row as usize].to_vec())
            .collect()
    }
}

fn test_device() -> Option<TestDevice> {
    init_logger();
    let device = TestDevice::new();
    if device.is_none() {
        eprintln!("No wgpu adapter available, skipping");
    }
    device
}

// ============================================================================
// Resource Upload Tests
// ============================================================================

#[test]
#[ignore = "requires a GPU adapter"]
fn test_texture_sub_region_upload() {
    let Some(ctx) = test_device() else {
        return;
    };
    let mut uploader = ctx.uploader();
    let extent = Extent3d::new(3, 2, 2);
    let handle = uploader
        .ensure_capacity(&ResourceDescriptor::new(0, ResourceKind::ClusterTexture, extent))
        .expect("texture");

    // 2x1x2 region of Rg32Uint texels
    let texels: [u32; 8] = [1, 1, 2, 2, 3, 3, 4, 4];
    uploader
        .upload_texture(handle, Extent3d::new(2, 1, 2), bytemuck::cast_slice(&texels))
        .expect("texture upload");

    let texture = uploader.texture(handle).expect("texture resource");
    let bytes = ctx.read_texture(texture, extent, 8);
    let contents: &[u32] = bytemuck::cast_slice(&bytes);
    // slice 0, row 0
    assert_eq!(&contents[0..6], &[1, 1, 2, 2, 0, 0]);
    // slice 0, row 1 untouched
    assert_eq!(&contents[6..12], &[0; 6]);
    // slice 1, row 0
    assert_eq!(&contents[12..18], &[3, 3, 4, 4, 0, 0]);
    assert_eq!(&contents[18..24], &[0; 6]);
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_buffer_upload_and_growth() {
    let Some(ctx) = test_device() else {
        return;
    };
    let mut uploader = ctx.uploader();
    let indices = |count| ResourceDescriptor::new(0, ResourceKind::LightIndices, Extent3d::linear(count));

    let small = uploader.ensure_capacity(&indices(4)).expect("buffer");
    assert_eq!(uploader.ensure_capacity(&indices(2)).expect("buffer"), small);

    let data: [u32; 2] = [7, 9];
    uploader
        .upload(small, 4, bytemuck::cast_slice(&data))
        .expect("buffer upload");
    let buffer = uploader.buffer(small).expect("buffer resource");
    let bytes = ctx.read_buffer(buffer, 16);
    assert_eq!(bytemuck::cast_slice::<u8, u32>(&bytes), &[0, 7, 9, 0]);

    assert!(uploader.upload(small, 12, bytemuck::cast_slice(&data)).is_err());

    let large = uploader.ensure_capacity(&indices(32)).expect("buffer");
    assert_ne!(large, small);
    assert!(uploader.buffer(small).is_none());
    assert_eq!(uploader.buffer(large).map(wgpu::Buffer::size), Some(128));
}

// ============================================================================
// Frame Upload Tests
// ============================================================================

#[test]
#[ignore = "requires a GPU adapter"]
fn test_frame_upload_matches_prepared_data() {
    let Some(ctx) = test_device() else {
        return;
    };
    let mut lights = LightCollection::new();
    lights.add_point_light(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE, 2.0);
    lights.add_spot_light(Vec3::new(1.0, 1.0, -8.0), Vec3::NEG_Z, Vec3::ONE, 4.0, 0.3, 0.5);
    let mut renderer =
        ClusteredLightRenderer::new(LightClusterConfig::default()).expect("valid config");
    renderer.prepare(&lights, &[hd_view()]);

    let mut uploader = ctx.uploader();
    let resources = renderer.upload(&mut uploader).expect("upload succeeds");
    let state = renderer.view(0).expect("view state");

    let expected_indices: &[u8] = bytemuck::cast_slice(state.light_indices());
    let buffer = uploader.buffer(resources[0].light_indices).expect("index buffer");
    let bytes = ctx.read_buffer(buffer, expected_indices.len() as u64);
    assert_eq!(bytes, expected_indices);

    let extent = state.cluster_extent();
    let texture = uploader.texture(resources[0].cluster_texture).expect("cluster texture");
    let bytes = ctx.read_texture(texture, extent, 8);
    assert_eq!(bytes.as_slice(), bytemuck::cast_slice(state.compacted_clusters()));
}
