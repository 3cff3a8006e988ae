pub mod conform;
pub mod heightfield;
pub mod layer;
pub mod plane;

pub use conform::GroundConformer;
pub use heightfield::HeightfieldGround;
pub use layer::{LayerError, LayerMask, LayerNames};
pub use plane::FlatGround;

use bevy::prelude::*;
use std::sync::Arc;

/// The nearest point a probe ray touched the ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
	/// World-space hit point.
	pub point: Vec3,
	/// Distance travelled along the ray.
	pub distance: f32,
}

/// Trait for surfaces that can be probed for ground height.
///
/// Probes are queried from the main update and from parallel fill passes, so they must be
/// shareable across threads.
pub trait GroundProbe: Send + Sync {
	/// Casts `ray` against the ground and returns the nearest hit within `max_distance`.
	///
	/// Surfaces that are not on any of the `layers` are ignored.
	fn raycast(&self, ray: Ray3d, max_distance: f32, layers: LayerMask) -> Option<GroundHit>;
}

impl<G: GroundProbe + ?Sized> GroundProbe for &G {
	fn raycast(&self, ray: Ray3d, max_distance: f32, layers: LayerMask) -> Option<GroundHit> {
		(**self).raycast(ray, max_distance, layers)
	}
}

impl<G: GroundProbe + ?Sized> GroundProbe for Arc<G> {
	fn raycast(&self, ray: Ray3d, max_distance: f32, layers: LayerMask) -> Option<GroundHit> {
		(**self).raycast(ray, max_distance, layers)
	}
}

impl<G: GroundProbe + ?Sized> GroundProbe for Box<G> {
	fn raycast(&self, ray: Ray3d, max_distance: f32, layers: LayerMask) -> Option<GroundHit> {
		(**self).raycast(ray, max_distance, layers)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_probe_through_references() {
		let flat = Arc::new(FlatGround::new(1.5));
		let ray = Ray3d::new(Vec3::new(3.0, 5.0, -2.0), Dir3::NEG_Y);

		let by_arc = flat.raycast(ray, 10.0, LayerMask::ALL).unwrap();
		let by_ref = (&*flat).raycast(ray, 10.0, LayerMask::ALL).unwrap();
		assert_eq!(by_arc, by_ref);
		assert!((by_arc.distance - 3.5).abs() < 1e-5);
	}
}
