use crate::{GroundHit, GroundProbe, LayerMask};
use bevy::prelude::*;
use std::fmt::Debug;

/// Number of bisection steps used to refine a marched hit.
const REFINE_STEPS: usize = 24;

/// Ground defined by a height function over the XZ plane.
///
/// The function returns `None` where the ground is undefined (holes, outside the map).
/// Vertical rays are answered exactly; other rays are marched at `step` and refined by bisection.
#[derive(Clone)]
pub struct HeightfieldGround<F>
where
	F: Fn(f32, f32) -> Option<f32> + Send + Sync,
{
	height: F,
	pub layers: LayerMask,
	pub step: f32,
}

impl<F> Debug for HeightfieldGround<F>
where
	F: Fn(f32, f32) -> Option<f32> + Send + Sync,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HeightfieldGround")
			.field("layers", &self.layers)
			.field("step", &self.step)
			.finish()
	}
}

impl<F> HeightfieldGround<F>
where
	F: Fn(f32, f32) -> Option<f32> + Send + Sync,
{
	/// Heightfield on layer 0, marched at 0.25 units.
	pub fn new(height: F) -> Self {
		Self { height, layers: LayerMask::layer(0), step: 0.25 }
	}

	pub fn on_layers(mut self, layers: LayerMask) -> Self {
		self.layers = layers;
		self
	}

	pub fn with_step(mut self, step: f32) -> Self {
		self.step = step;
		self
	}

	pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
		(self.height)(x, z)
	}

	/// Signed height of `p` above the ground, `None` over holes.
	fn clearance(&self, p: Vec3) -> Option<f32> {
		self.height_at(p.x, p.z).map(|h| p.y - h)
	}

	fn vertical_hit(&self, ray: Ray3d, max_distance: f32) -> Option<GroundHit> {
		let direction = *ray.direction;
		let ground = self.height_at(ray.origin.x, ray.origin.z)?;
		let distance = (ground - ray.origin.y) / direction.y;
		if distance < 0.0 || distance > max_distance {
			return None;
		}
		Some(GroundHit { point: Vec3::new(ray.origin.x, ground, ray.origin.z), distance })
	}

	fn marched_hit(&self, ray: Ray3d, max_distance: f32) -> Option<GroundHit> {
		let step = if self.step > 0.0 { self.step } else { 0.25 };

		let mut previous = 0.0;
		if let Some(clearance) = self.clearance(ray.origin) {
			if clearance <= 0.0 {
				// the ray starts underground
				let point = Vec3::new(ray.origin.x, ray.origin.y - clearance, ray.origin.z);
				return Some(GroundHit { point, distance: 0.0 });
			}
		}

		let mut t = step;
		loop {
			let t_clamped = t.min(max_distance);
			let p = ray.get_point(t_clamped);
			if let Some(clearance) = self.clearance(p) {
				if clearance <= 0.0 {
					return Some(self.refine(ray, previous, t_clamped));
				}
			}
			if t_clamped >= max_distance {
				return None;
			}
			previous = t_clamped;
			t += step;
		}
	}

	/// Bisects between an above-ground distance `above` and a below-ground distance `below`.
	fn refine(&self, ray: Ray3d, mut above: f32, mut below: f32) -> GroundHit {
		for _ in 0..REFINE_STEPS {
			let mid = (above + below) * 0.5;
			match self.clearance(ray.get_point(mid)) {
				Some(clearance) if clearance <= 0.0 => below = mid,
				_ => above = mid,
			}
		}

		let mut point = ray.get_point(below);
		if let Some(h) = self.height_at(point.x, point.z) {
			point.y = h;
		}
		GroundHit { point, distance: below }
	}
}

impl<F> GroundProbe for HeightfieldGround<F>
where
	F: Fn(f32, f32) -> Option<f32> + Send + Sync,
{
	fn raycast(&self, ray: Ray3d, max_distance: f32, layers: LayerMask) -> Option<GroundHit> {
		if !self.layers.intersects(layers) || max_distance <= 0.0 {
			return None;
		}

		let direction = *ray.direction;
		if direction.x.abs() < 1e-6 && direction.z.abs() < 1e-6 {
			return self.vertical_hit(ray, max_distance);
		}

		self.marched_hit(ray, max_distance)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn slope() -> HeightfieldGround<impl Fn(f32, f32) -> Option<f32> + Send + Sync> {
		HeightfieldGround::new(|x: f32, _z: f32| Some(0.5 * x))
	}

	#[test]
	fn test_vertical_ray_is_exact() {
		let ground = slope();
		let ray = Ray3d::new(Vec3::new(4.0, 10.0, 1.0), Dir3::NEG_Y);
		let hit = ground.raycast(ray, 50.0, LayerMask::ALL).unwrap();
		assert_eq!(hit.point, Vec3::new(4.0, 2.0, 1.0));
		assert!((hit.distance - 8.0).abs() < 1e-5);
	}

	#[test]
	fn test_oblique_ray_refines_onto_surface() {
		let ground = HeightfieldGround::new(|_x: f32, _z: f32| Some(1.0));
		let direction = Dir3::new(Vec3::new(1.0, -1.0, 0.0)).unwrap();
		let ray = Ray3d::new(Vec3::new(0.0, 5.0, 0.0), direction);

		let hit = ground.raycast(ray, 20.0, LayerMask::ALL).unwrap();
		assert!((hit.point.x - 4.0).abs() < 1e-3, "hit at {:?}", hit.point);
		assert_eq!(hit.point.y, 1.0);
	}

	#[test]
	fn test_holes_and_layers() {
		let ground = HeightfieldGround::new(|x: f32, _z: f32| if x < 0.0 { None } else { Some(0.0) });

		let over_hole = Ray3d::new(Vec3::new(-1.0, 3.0, 0.0), Dir3::NEG_Y);
		assert!(ground.raycast(over_hole, 10.0, LayerMask::ALL).is_none());

		let over_ground = Ray3d::new(Vec3::new(1.0, 3.0, 0.0), Dir3::NEG_Y);
		assert!(ground.raycast(over_ground, 10.0, LayerMask::ALL).is_some());
		assert!(ground.raycast(over_ground, 10.0, LayerMask::layer(2)).is_none());
		assert!(ground.raycast(over_ground, 2.0, LayerMask::ALL).is_none());
	}
}
