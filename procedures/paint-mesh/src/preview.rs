use bevy::prelude::*;

/// Polyline shown while drawing. Rendering reads `positions` when `enabled` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewLine {
	positions: Vec<Vec3>,
	enabled: bool,
}

impl PreviewLine {
	pub fn set_positions(&mut self, positions: Vec<Vec3>) {
		self.positions = positions;
	}

	pub fn positions(&self) -> &[Vec3] {
		&self.positions
	}

	pub fn position_count(&self) -> usize {
		self.positions.len()
	}

	pub fn set_enabled(&mut self, enabled: bool) {
		self.enabled = enabled;
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Disables the line and drops its positions.
	pub fn clear(&mut self) {
		self.positions.clear();
		self.enabled = false;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_clear_disables() {
		let mut line = PreviewLine::default();
		line.set_enabled(true);
		line.set_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Z]);
		assert_eq!(line.position_count(), 3);
		assert_eq!(line.positions()[1], Vec3::X);

		line.clear();
		assert!(!line.is_enabled());
		assert_eq!(line.position_count(), 0);
	}
}
