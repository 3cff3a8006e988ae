use crate::config::MeshConfig;
use crate::polygon;
use bevy::prelude::*;
use ground::GroundConformer;
use rayon::prelude::*;
use thiserror::Error;

/// Upper bound on grid points examined for one polygon.
pub const MAX_GRID_POINTS: usize = 1 << 20;

#[derive(Debug, Error, PartialEq)]
pub enum FillError {
	#[error("fill spacing must be positive and finite, got {0}")]
	InvalidSpacing(f32),
	#[error("fill polygon needs at least 3 points, got {0}")]
	TooFewPoints(usize),
	#[error("fill grid of {points} points exceeds the limit of {limit}")]
	GridTooLarge { points: usize, limit: usize },
}

/// Places fill objects on a regular XZ grid inside a polygon.
pub struct FillPlacer<'a> {
	conformer: GroundConformer<'a>,
	spacing: f32,
	offset: f32,
}

impl<'a> FillPlacer<'a> {
	/// `conformer` should already carry the ground offset; `offset` is added on top of it.
	pub fn new(conformer: GroundConformer<'a>, spacing: f32, offset: f32) -> Self {
		Self { conformer, spacing, offset }
	}

	pub fn from_config(config: &MeshConfig, conformer: GroundConformer<'a>) -> Self {
		Self::new(conformer, config.fill_object_spacing, config.fill_offset)
	}

	/// World-space fill positions in row-major order (rows along Z, columns along X).
	///
	/// Grid points whose probe misses the ground are skipped.
	pub fn place(&self, polygon: &[Vec3]) -> Result<Vec<Vec3>, FillError> {
		if !(self.spacing.is_finite() && self.spacing > 0.0) {
			return Err(FillError::InvalidSpacing(self.spacing));
		}
		let outer = polygon::strip_closing_point(polygon);
		let Some((min, max)) = polygon::bounds_xz(outer).filter(|_| outer.len() >= 3) else {
			return Err(FillError::TooFewPoints(outer.len()));
		};

		// counted in f64 so tiny spacings cannot overflow the cast
		let columns = ((max.x - min.x) as f64 / self.spacing as f64).floor() + 1.0;
		let rows = ((max.y - min.y) as f64 / self.spacing as f64).floor() + 1.0;
		let grid = columns * rows;
		if grid > MAX_GRID_POINTS as f64 {
			let points = grid.min(usize::MAX as f64) as usize;
			return Err(FillError::GridTooLarge { points, limit: MAX_GRID_POINTS });
		}
		let (columns, rows) = (columns as usize, rows as usize);

		let top = outer.iter().map(|p| p.y).fold(f32::MIN, f32::max);
		let lift = Vec3::Y * self.offset;

		let placements: Vec<Vec3> = (0..rows)
			.into_par_iter()
			.flat_map_iter(|row| {
				let z = min.y + row as f32 * self.spacing;
				(0..columns).filter_map(move |column| {
					let x = min.x + column as f32 * self.spacing;
					let probe = Vec3::new(x, top, z);
					if !polygon::point_in_polygon_xz(probe, outer) {
						return None;
					}
					match self.conformer.try_conform(probe) {
						Some(grounded) => Some(grounded + lift),
						None => {
							log::debug!("Fill point ({}, {}) has no ground, skipped", x, z);
							None
						}
					}
				})
			})
			.collect();

		log::debug!(
			"Fill grid {}x{} at spacing {}: {} placements",
			columns,
			rows,
			self.spacing,
			placements.len()
		);
		Ok(placements)
	}
}
