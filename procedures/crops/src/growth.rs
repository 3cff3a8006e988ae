use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GrowthError {
	#[error("a crop needs at least one growth stage")]
	NoStages,
	#[error("{scales} stage scales need {expected} durations, got {durations}")]
	MismatchedDurations { scales: usize, durations: usize, expected: usize },
	#[error("stage {stage} has invalid duration {duration}")]
	InvalidDuration { stage: usize, duration: f32 },
	#[error("stage {stage} has invalid scale {scale}")]
	InvalidScale { stage: usize, scale: f32 },
}

/// Growth stages of a crop.
///
/// `scales[i]` is the crop's scale on entering stage `i`; `durations[i]` is the time spent in
/// stage `i` before moving on. The last stage is maturity and has no duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrowthStages")]
pub struct GrowthStages {
	durations: Vec<f32>,
	scales: Vec<f32>,
}

#[derive(Deserialize)]
struct RawGrowthStages {
	durations: Vec<f32>,
	scales: Vec<f32>,
}

impl TryFrom<RawGrowthStages> for GrowthStages {
	type Error = GrowthError;

	fn try_from(raw: RawGrowthStages) -> Result<Self, Self::Error> {
		Self::new(raw.durations, raw.scales)
	}
}

impl GrowthStages {
	pub fn new(durations: Vec<f32>, scales: Vec<f32>) -> Result<Self, GrowthError> {
		if scales.is_empty() {
			return Err(GrowthError::NoStages);
		}
		if durations.len() + 1 != scales.len() {
			return Err(GrowthError::MismatchedDurations {
				scales: scales.len(),
				durations: durations.len(),
				expected: scales.len() - 1,
			});
		}
		if let Some((stage, duration)) =
			durations.iter().enumerate().find(|(_, d)| !(d.is_finite() && **d > 0.0))
		{
			return Err(GrowthError::InvalidDuration { stage, duration: *duration });
		}
		if let Some((stage, scale)) =
			scales.iter().enumerate().find(|(_, s)| !(s.is_finite() && **s >= 0.0))
		{
			return Err(GrowthError::InvalidScale { stage, scale: *scale });
		}
		Ok(Self { durations, scales })
	}

	pub fn stage_count(&self) -> usize {
		self.scales.len()
	}

	pub fn mature_stage(&self) -> usize {
		self.scales.len() - 1
	}

	/// Time from planting to maturity.
	pub fn total_duration(&self) -> f32 {
		self.durations.iter().sum()
	}

	pub fn duration(&self, stage: usize) -> Option<f32> {
		self.durations.get(stage).copied()
	}

	pub fn scale(&self, stage: usize) -> f32 {
		self.scales[stage.min(self.mature_stage())]
	}
}

/// What one call to [`CropGrowth::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthEvent {
	/// Still in the same stage.
	Growing,
	/// Entered a new, not yet mature, stage.
	StageReached(usize),
	/// Is mature, either just now or already.
	Mature,
}

/// Growth progress of one crop, advanced once per tick.
///
/// Removing this component cancels growth for good.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CropGrowth {
	pub stage: usize,
	/// Seconds spent in the current stage
	pub elapsed: f32,
	/// Scale of the fully grown crop
	pub base_scale: Vec3,
}

impl CropGrowth {
	pub fn new(base_scale: Vec3) -> Self {
		Self { stage: 0, elapsed: 0.0, base_scale }
	}

	pub fn is_mature(&self, stages: &GrowthStages) -> bool {
		self.stage >= stages.mature_stage()
	}

	/// Advances by `dt` seconds, possibly through several stages. Non-positive steps do nothing.
	pub fn advance(&mut self, dt: f32, stages: &GrowthStages) -> GrowthEvent {
		if self.is_mature(stages) {
			return GrowthEvent::Mature;
		}
		if dt.is_finite() && dt > 0.0 {
			self.elapsed += dt;
		}

		let start = self.stage;
		while let Some(duration) = stages.duration(self.stage) {
			if self.elapsed < duration {
				break;
			}
			self.elapsed -= duration;
			self.stage += 1;
		}

		if self.is_mature(stages) {
			self.elapsed = 0.0;
			GrowthEvent::Mature
		} else if self.stage != start {
			GrowthEvent::StageReached(self.stage)
		} else {
			GrowthEvent::Growing
		}
	}

	/// Scale factor, interpolated from the current stage toward the next one.
	pub fn scale(&self, stages: &GrowthStages) -> f32 {
		let current = stages.scale(self.stage);
		match stages.duration(self.stage) {
			Some(duration) => {
				let t = (self.elapsed / duration).clamp(0.0, 1.0);
				current + (stages.scale(self.stage + 1) - current) * t
			}
			None => current,
		}
	}

	/// Transform scale for the current progress.
	pub fn transform_scale(&self, stages: &GrowthStages) -> Vec3 {
		self.base_scale * self.scale(stages)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn carrot() -> GrowthStages {
		GrowthStages::new(vec![2.0, 4.0], vec![0.2, 0.6, 1.0]).unwrap()
	}

	#[test]
	fn test_stage_validation() {
		assert_eq!(GrowthStages::new(vec![], vec![]), Err(GrowthError::NoStages));
		assert!(matches!(
			GrowthStages::new(vec![1.0, 1.0], vec![0.5, 1.0]),
			Err(GrowthError::MismatchedDurations { expected: 1, .. })
		));
		assert_eq!(
			GrowthStages::new(vec![1.0, 0.0], vec![0.1, 0.5, 1.0]),
			Err(GrowthError::InvalidDuration { stage: 1, duration: 0.0 })
		);
		assert!(matches!(
			GrowthStages::new(vec![1.0], vec![f32::NAN, 1.0]),
			Err(GrowthError::InvalidScale { stage: 0, .. })
		));

		let single = GrowthStages::new(vec![], vec![1.0]).unwrap();
		assert!(CropGrowth::new(Vec3::ONE).is_mature(&single));
	}

	#[test]
	fn test_advances_through_stages() {
		let stages = carrot();
		let mut growth = CropGrowth::new(Vec3::ONE);

		assert_eq!(growth.advance(1.0, &stages), GrowthEvent::Growing);
		assert!((growth.scale(&stages) - 0.4).abs() < 1e-6);

		assert_eq!(growth.advance(1.0, &stages), GrowthEvent::StageReached(1));
		assert_eq!(growth.elapsed, 0.0);
		assert!((growth.scale(&stages) - 0.6).abs() < 1e-6);

		assert_eq!(growth.advance(3.0, &stages), GrowthEvent::Growing);
		assert_eq!(growth.advance(1.0, &stages), GrowthEvent::Mature);
		assert_eq!(growth.stage, 2);
		assert_eq!(growth.scale(&stages), 1.0);
	}

	#[test]
	fn test_stops_when_mature() {
		let stages = carrot();
		let mut growth = CropGrowth::new(Vec3::splat(2.0));

		// one long tick skips straight to maturity
		assert_eq!(growth.advance(100.0, &stages), GrowthEvent::Mature);
		let mature = growth;
		assert_eq!(growth.advance(5.0, &stages), GrowthEvent::Mature);
		assert_eq!(growth, mature);
		assert_eq!(growth.transform_scale(&stages), Vec3::splat(2.0));
	}

	#[test]
	fn test_ignores_bad_steps() {
		let stages = carrot();
		let mut growth = CropGrowth::new(Vec3::ONE);
		for dt in [0.0, -3.0, f32::NAN, f32::INFINITY] {
			assert_eq!(growth.advance(dt, &stages), GrowthEvent::Growing);
		}
		assert_eq!(growth, CropGrowth::new(Vec3::ONE));
	}

	#[test]
	fn test_stages_from_json() {
		let stages: GrowthStages =
			serde_json::from_str(r#"{ "durations": [2.0, 4.0], "scales": [0.2, 0.6, 1.0] }"#).unwrap();
		assert_eq!(stages, carrot());
		assert_eq!(stages.total_duration(), 6.0);

		let invalid = serde_json::from_str::<GrowthStages>(r#"{ "durations": [2.0], "scales": [] }"#);
		assert!(invalid.is_err());
	}
}
