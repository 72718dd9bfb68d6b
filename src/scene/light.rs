//! Clusterable light types

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Kind of a clusterable light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LightKind {
    Point,
    Spot,
}

/// Point light
///
/// `inv_square_radius` is `1/r²` for inverse-square falloff. Lights authored
/// for linear lighting store `1/r` in the same field (see [`PointLight::linear`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub inv_square_radius: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ONE, 10.0)
    }
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, radius: f32) -> Self {
        Self {
            position,
            color,
            inv_square_radius: 1.0 / (radius * radius),
        }
    }

    /// Point light whose radius term is `1/r`, for renderers using linear lighting
    pub fn linear(position: Vec3, color: Vec3, radius: f32) -> Self {
        Self {
            position,
            color,
            inv_square_radius: 1.0 / radius,
        }
    }

    /// World-space radius beyond which the light contributes nothing
    pub fn culling_radius(&self, use_linear_lighting: bool) -> f32 {
        radius_from_term(self.inv_square_radius, use_linear_lighting)
    }

    /// Convert to GPU data format
    pub fn to_gpu_data(&self) -> PointLightData {
        PointLightData {
            position: self.position,
            inv_square_radius: self.inv_square_radius,
            color: self.color,
            _padding: 0.0,
        }
    }
}

/// Spot light
///
/// The cone is encoded as `angle_scale`/`angle_offset` so the shader evaluates
/// `saturate(dot(-L, direction) * angle_scale + angle_offset)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub inv_square_range: f32,
    pub angle_scale: f32,
    pub angle_offset: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self::new(Vec3::ZERO, -Vec3::Y, Vec3::ONE, 10.0, 0.3, 0.5)
    }
}

impl SpotLight {
    /// Create a spot light from inner/outer cone half-angles in radians
    pub fn new(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        range: f32,
        inner_angle: f32,
        outer_angle: f32,
    ) -> Self {
        let (angle_scale, angle_offset) = cone_terms(inner_angle, outer_angle);
        Self {
            position,
            direction: direction.normalize_or_zero(),
            color,
            inv_square_range: 1.0 / (range * range),
            angle_scale,
            angle_offset,
        }
    }

    /// Spot light whose range term is `1/r`, for renderers using linear lighting
    pub fn linear(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        range: f32,
        inner_angle: f32,
        outer_angle: f32,
    ) -> Self {
        Self {
            inv_square_range: 1.0 / range,
            ..Self::new(position, direction, color, range, inner_angle, outer_angle)
        }
    }

    pub fn culling_radius(&self, use_linear_lighting: bool) -> f32 {
        radius_from_term(self.inv_square_range, use_linear_lighting)
    }

    /// Convert to GPU data format
    pub fn to_gpu_data(&self) -> SpotLightData {
        SpotLightData {
            position: self.position,
            inv_square_range: self.inv_square_range,
            direction: self.direction,
            angle_scale: self.angle_scale,
            color: self.color,
            angle_offset: self.angle_offset,
        }
    }
}

/// A clusterable light, resolved to its kind once when the frame's collection is built
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Point(PointLight),
    Spot(SpotLight),
}

impl Light {
    pub fn kind(&self) -> LightKind {
        match self {
            Light::Point(_) => LightKind::Point,
            Light::Spot(_) => LightKind::Spot,
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            Light::Point(light) => light.position,
            Light::Spot(light) => light.position,
        }
    }

    pub fn culling_radius(&self, use_linear_lighting: bool) -> f32 {
        match self {
            Light::Point(light) => light.culling_radius(use_linear_lighting),
            Light::Spot(light) => light.culling_radius(use_linear_lighting),
        }
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Light::Point(light)
    }
}

impl From<SpotLight> for Light {
    fn from(light: SpotLight) -> Self {
        Light::Spot(light)
    }
}

/// Radius from a `1/r²` (or `1/r` in linear mode) term. Invalid terms give 0.
fn radius_from_term(term: f32, use_linear_lighting: bool) -> f32 {
    if !(term.is_finite() && term > 0.0) {
        return 0.0;
    }
    let radius = if use_linear_lighting {
        1.0 / term
    } else {
        (1.0 / term).sqrt()
    };
    if radius.is_finite() {
        radius
    } else {
        0.0
    }
}

fn cone_terms(inner_angle: f32, outer_angle: f32) -> (f32, f32) {
    let cos_inner = inner_angle.cos();
    let cos_outer = outer_angle.cos();
    let angle_scale = 1.0 / (cos_inner - cos_outer).max(0.001);
    let angle_offset = -cos_outer * angle_scale;
    (angle_scale, angle_offset)
}

/// GPU point light record (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PointLightData {
    /// World-space position
    pub position: Vec3,
    pub inv_square_radius: f32,
    pub color: Vec3,
    pub _padding: f32,
}

/// GPU spot light record (48 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpotLightData {
    /// World-space position
    pub position: Vec3,
    pub inv_square_range: f32,
    /// World-space direction the cone points at
    pub direction: Vec3,
    pub angle_scale: f32,
    pub color: Vec3,
    pub angle_offset: f32,
}

const _: () = assert!(std::mem::size_of::<PointLightData>() == 32);
const _: () = assert!(std::mem::size_of::<SpotLightData>() == 48);
