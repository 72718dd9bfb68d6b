//! Shared helpers for the clustering integration tests.

#![allow(dead_code)]

use glam::{Vec2, Vec3};
use lilium_clusters::{LightCollection, RenderView, SpotLight};

pub const HD: Vec2 = Vec2::new(1920.0, 1080.0);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Camera at the origin looking down `-Z`, so world space equals view space
pub fn origin_view(viewport_size: Vec2, near: f32, far: f32) -> RenderView {
    RenderView::perspective(
        Vec3::ZERO,
        Vec3::NEG_Z,
        Vec3::Y,
        60f32.to_radians(),
        viewport_size,
        near,
        far,
    )
}

pub fn hd_view() -> RenderView {
    origin_view(HD, 0.1, 1000.0)
}

/// Evenly distributed unit vectors
pub fn fibonacci_sphere(count: usize) -> Vec<Vec3> {
    let golden_angle = std::f32::consts::PI * (3.0 - 5f32.sqrt());
    (0..count)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
            let ring = (1.0 - y * y).sqrt();
            let theta = golden_angle * i as f32;
            Vec3::new(ring * theta.cos(), y, ring * theta.sin())
        })
        .collect()
}

/// Deterministic pseudo-random value in `[0, 1)`
pub fn hash01(seed: u32) -> f32 {
    let mut x = seed.wrapping_mul(0x9e37_79b9) ^ 0x85eb_ca6b;
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    (x >> 8) as f32 / (1u32 << 24) as f32
}

/// Point and spot lights scattered through the frustum of [`origin_view`],
/// including some behind the camera and past the far plane
pub fn scattered_lights(points: usize, spots: usize, far: f32) -> LightCollection {
    let mut lights = LightCollection::new();
    let place = |seed: u32| {
        let depth = -5.0 + (far + 20.0) * hash01(seed);
        let spread = depth.abs().max(1.0) * 0.8;
        Vec3::new(
            (hash01(seed + 1) * 2.0 - 1.0) * spread,
            (hash01(seed + 2) * 2.0 - 1.0) * spread * 0.6,
            -depth,
        )
    };
    for i in 0..points as u32 {
        let radius = 0.5 + 6.0 * hash01(i * 7 + 3);
        lights.add_point_light(place(i * 7), Vec3::ONE, radius);
    }
    for i in 0..spots as u32 {
        let seed = 100_000 + i * 7;
        let range = 1.0 + 8.0 * hash01(seed + 3);
        lights.push(SpotLight::new(
            place(seed),
            Vec3::new(0.0, -1.0, -0.5),
            Vec3::ONE,
            range,
            0.3,
            0.6,
        ));
    }
    lights
}
