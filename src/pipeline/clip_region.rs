//! Conservative screen-space bounds of a light's bounding sphere
//!
//! For each screen axis the two planes through the eye that are tangent to
//! the sphere are found in closed form. A tangent plane only tightens the
//! bound when its tangent point lies in front of the camera.

use glam::{Mat4, Vec2, Vec3};

/// Lights closer than this to the eye plane get the full NDC range
pub const MIN_LIGHT_DEPTH: f32 = 1e-4;

/// Projection terms used by the solver.
///
/// For a right-handed perspective projection,
/// `ndc.x = scale_x * x / depth - offset_x` with `depth = -z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionTerms {
    pub scale_x: f32,
    pub offset_x: f32,
    pub scale_y: f32,
    pub offset_y: f32,
}

impl ProjectionTerms {
    pub fn from_projection(projection: &Mat4) -> Self {
        Self {
            scale_x: projection.x_axis.x,
            offset_x: projection.z_axis.x,
            scale_y: projection.y_axis.y,
            offset_y: projection.z_axis.y,
        }
    }
}

/// Axis-aligned NDC rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRegion {
    pub min: Vec2,
    pub max: Vec2,
}

impl ClipRegion {
    pub const FULL: Self = Self {
        min: Vec2::NEG_ONE,
        max: Vec2::ONE,
    };

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }
}

/// Clip region of a sphere centered at `center` (view space, camera looking
/// down `-Z`) with the given radius.
pub fn compute_clip_region(center: Vec3, radius: f32, terms: &ProjectionTerms) -> ClipRegion {
    let mut region = ClipRegion::FULL;
    let depth = -center.z;
    if depth.abs() < MIN_LIGHT_DEPTH {
        return region;
    }

    update_axis(
        center.x,
        depth,
        radius,
        terms.scale_x,
        terms.offset_x,
        &mut region.min.x,
        &mut region.max.x,
    );
    update_axis(
        center.y,
        depth,
        radius,
        terms.scale_y,
        terms.offset_y,
        &mut region.min.y,
        &mut region.max.y,
    );
    region
}

fn update_axis(
    lc: f32,
    lz: f32,
    radius: f32,
    camera_scale: f32,
    camera_offset: f32,
    clip_min: &mut f32,
    clip_max: &mut f32,
) {
    // The discriminant r²lc² - (lc² + lz²)(r² - lz²) factors into
    // lz² (lc² + lz² - r²). Using the factored form keeps precision for
    // lights close to the eye plane.
    let len_sq = lc * lc + lz * lz;
    let outside = len_sq - radius * radius;
    if !(outside > 0.0) {
        return;
    }
    let root = outside.sqrt();
    let a = radius * lc;
    let b = lz.abs() * root;
    // nz = (r - nc * lc) / lz expanded per root, without dividing by lz
    let c = radius * lz;
    let d = lz.signum() * lc * root;
    let roots = [
        ((a + b) / len_sq, (c - d) / len_sq),
        ((a - b) / len_sq, (c + d) / len_sq),
    ];
    for (nc, nz) in roots {
        update_axis_root(nc, nz, lz, radius, camera_scale, camera_offset, clip_min, clip_max);
    }
}

/// Apply one tangent plane with unit normal `(nc, nz)` to the axis bounds
#[allow(clippy::too_many_arguments)]
fn update_axis_root(
    nc: f32,
    nz: f32,
    lz: f32,
    radius: f32,
    camera_scale: f32,
    camera_offset: f32,
    clip_min: &mut f32,
    clip_max: &mut f32,
) {
    if nc == 0.0 {
        return;
    }
    // Depth of the tangent point
    let pz = lz - radius * nz;
    if pz > 0.0 {
        let c = -nz * camera_scale / nc - camera_offset;
        if nc > 0.0 {
            *clip_min = clip_min.max(c);
        } else {
            *clip_max = clip_max.min(c);
        }
    }
}
