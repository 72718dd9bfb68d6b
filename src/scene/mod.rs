//! Scene-side inputs: lights and render views

mod light;
mod view;

pub use light::*;
pub use view::*;

use glam::Vec3;

/// The frame's clusterable lights, split by kind.
///
/// Light indices used by the clustering passes are positions in
/// [`LightCollection::points`] and [`LightCollection::spots`].
#[derive(Debug, Clone, Default)]
pub struct LightCollection {
    pub points: Vec<PointLight>,
    pub spots: Vec<SpotLight>,
}

impl LightCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from tagged lights, preserving order within each kind
    pub fn from_lights<I>(lights: I) -> Self
    where
        I: IntoIterator<Item = Light>,
    {
        let mut collection = Self::new();
        for light in lights {
            collection.push(light);
        }
        collection
    }

    pub fn push(&mut self, light: impl Into<Light>) {
        match light.into() {
            Light::Point(point) => self.points.push(point),
            Light::Spot(spot) => self.spots.push(spot),
        }
    }

    /// Add a point light to the collection
    pub fn add_point_light(&mut self, position: Vec3, color: Vec3, radius: f32) {
        self.points.push(PointLight::new(position, color, radius));
    }

    /// Add a spot light to the collection
    pub fn add_spot_light(
        &mut self,
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        range: f32,
        inner_angle: f32,
        outer_angle: f32,
    ) {
        self.spots.push(SpotLight::new(
            position,
            direction,
            color,
            range,
            inner_angle,
            outer_angle,
        ));
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.spots.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len() + self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.spots.is_empty()
    }
}

impl FromIterator<Light> for LightCollection {
    fn from_iter<T: IntoIterator<Item = Light>>(iter: T) -> Self {
        Self::from_lights(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lights_are_split_by_kind_in_order() {
        let lights = vec![
            Light::Point(PointLight::new(Vec3::X, Vec3::ONE, 1.0)),
            Light::Spot(SpotLight::default()),
            Light::Point(PointLight::new(Vec3::Y, Vec3::ONE, 1.0)),
        ];
        let collection: LightCollection = lights.into_iter().collect();
        assert_eq!(collection.points.len(), 2);
        assert_eq!(collection.spots.len(), 1);
        assert_eq!(collection.points[0].position, Vec3::X);
        assert_eq!(collection.points[1].position, Vec3::Y);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn clear_empties_collection() {
        let mut collection = LightCollection::new();
        collection.add_point_light(Vec3::ZERO, Vec3::ONE, 1.0);
        collection.add_spot_light(Vec3::ZERO, Vec3::NEG_Y, Vec3::ONE, 3.0, 0.2, 0.4);
        assert!(!collection.is_empty());
        collection.clear();
        assert!(collection.is_empty());
    }
}
