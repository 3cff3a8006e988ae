use crate::{GroundProbe, LayerMask};
use bevy::prelude::*;

/// Projects points vertically onto the ground.
///
/// A probe ray starts `probe_height` above the point and travels straight down for at most
/// `probe_distance`. Conformed points sit at the hit height plus `offset`.
#[derive(Clone, Copy)]
pub struct GroundConformer<'a> {
	probe: &'a dyn GroundProbe,
	pub layers: LayerMask,
	pub offset: f32,
	pub probe_height: f32,
	pub probe_distance: f32,
}

impl std::fmt::Debug for GroundConformer<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GroundConformer")
			.field("layers", &self.layers)
			.field("offset", &self.offset)
			.field("probe_height", &self.probe_height)
			.field("probe_distance", &self.probe_distance)
			.finish()
	}
}

impl<'a> GroundConformer<'a> {
	pub const DEFAULT_PROBE_HEIGHT: f32 = 100.0;
	pub const DEFAULT_PROBE_DISTANCE: f32 = 200.0;

	pub fn new(probe: &'a dyn GroundProbe) -> Self {
		Self {
			probe,
			layers: LayerMask::ALL,
			offset: 0.0,
			probe_height: Self::DEFAULT_PROBE_HEIGHT,
			probe_distance: Self::DEFAULT_PROBE_DISTANCE,
		}
	}

	pub fn with_layers(mut self, layers: LayerMask) -> Self {
		self.layers = layers;
		self
	}

	pub fn with_offset(mut self, offset: f32) -> Self {
		self.offset = offset;
		self
	}

	pub fn with_probe_height(mut self, probe_height: f32) -> Self {
		self.probe_height = probe_height;
		self
	}

	pub fn with_probe_distance(mut self, probe_distance: f32) -> Self {
		self.probe_distance = probe_distance;
		self
	}

	/// Ground height under `(x, z)`, ignoring the offset.
	pub fn ground_height(&self, point: Vec3) -> Option<f32> {
		let origin = Vec3::new(point.x, point.y + self.probe_height, point.z);
		let ray = Ray3d::new(origin, Dir3::NEG_Y);
		self.probe.raycast(ray, self.probe_distance, self.layers).map(|hit| hit.point.y)
	}

	/// Conformed point, or `None` when the probe misses.
	pub fn try_conform(&self, point: Vec3) -> Option<Vec3> {
		self.ground_height(point).map(|y| Vec3::new(point.x, y + self.offset, point.z))
	}

	/// Conformed point. A miss leaves the point unchanged.
	pub fn conform(&self, point: Vec3) -> Vec3 {
		match self.try_conform(point) {
			Some(conformed) => conformed,
			None => {
				log::warn!("No ground under {:?}, keeping the point unconformed", point);
				point
			}
		}
	}
}
