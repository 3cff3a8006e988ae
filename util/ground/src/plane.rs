use crate::{GroundHit, GroundProbe, LayerMask};
use bevy::prelude::*;

/// Infinite horizontal ground plane at a fixed height.
#[derive(Debug, Clone, Copy)]
pub struct FlatGround {
	pub height: f32,
	pub layers: LayerMask,
}

impl FlatGround {
	/// Plane on layer 0.
	pub fn new(height: f32) -> Self {
		Self { height, layers: LayerMask::layer(0) }
	}

	pub fn on_layers(mut self, layers: LayerMask) -> Self {
		self.layers = layers;
		self
	}
}

impl GroundProbe for FlatGround {
	fn raycast(&self, ray: Ray3d, max_distance: f32, layers: LayerMask) -> Option<GroundHit> {
		if !self.layers.intersects(layers) {
			return None;
		}

		let direction = *ray.direction;
		if direction.y.abs() < 1e-6 {
			// parallel to the plane
			return None;
		}

		let distance = (self.height - ray.origin.y) / direction.y;
		if distance < 0.0 || distance > max_distance {
			return None;
		}

		let mut point = ray.get_point(distance);
		point.y = self.height;
		Some(GroundHit { point, distance })
	}
}
