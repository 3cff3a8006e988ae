use crate::behavior::{deserialize_behaviors, BehaviorTemplate};
use bevy::prelude::*;
use ground::{GroundConformer, GroundProbe, LayerMask};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// How the drawn control points are turned into the outer boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CurveType {
	/// Straight segments through the control points.
	None,
	/// Uniform Catmull-Rom spline through the control points.
	#[default]
	CatmullRom,
	/// Straight segments with rounded corners.
	FilletCorners,
}

/// Parameters for one painted surface. Immutable while a drawing session is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
	pub curve_type: CurveType,
	/// Samples per spline span, pieces per fillet arc and straight run (2 - 64)
	pub curve_segments: u32,
	/// Fillet radius upper bound (0 - 0.49)
	pub fillet_amount: f32,
	/// Scale of the inner ring about the centroid (0 - 0.9)
	pub inner_loop_scale: f32,
	/// Scale of the innermost ring about the centroid (0 - 0.89), always below `inner_loop_scale`
	pub innermost_loop_scale: f32,
	/// Flip triangle winding so the surface faces down
	pub invert_normals: bool,
	/// Ground layers the conformance probe may hit
	pub ground_layers: LayerMask,
	/// Height above the ground at which vertices are placed
	pub ground_offset: f32,
	/// How far above a point the downward probe starts
	pub probe_height: f32,
	/// Maximum probe ray length
	pub probe_distance: f32,
	/// Grid spacing for fill objects; zero or negative disables filling
	pub fill_object_spacing: f32,
	/// Extra height of fill objects above the surface
	pub fill_offset: f32,
	/// Name of the fill template to instantiate, if any
	pub fill_template: Option<String>,
	pub convex_collider: bool,
	/// Linear RGBA base colour of the surface material
	pub surface_color: [f32; 4],
	#[serde(deserialize_with = "deserialize_behaviors")]
	pub behaviors: Vec<BehaviorTemplate>,
}

impl Default for MeshConfig {
	fn default() -> Self {
		Self {
			curve_type: CurveType::CatmullRom,
			curve_segments: 8,
			fillet_amount: 0.25,
			inner_loop_scale: 0.6,
			innermost_loop_scale: 0.3,
			invert_normals: false,
			ground_layers: LayerMask::ALL,
			ground_offset: 0.05,
			probe_height: GroundConformer::DEFAULT_PROBE_HEIGHT,
			probe_distance: GroundConformer::DEFAULT_PROBE_DISTANCE,
			fill_object_spacing: 1.0,
			fill_offset: 0.0,
			fill_template: None,
			convex_collider: false,
			surface_color: [0.36, 0.25, 0.16, 1.0],
			behaviors: Vec::new(),
		}
	}
}

/// A value that validation replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigCorrection {
	pub field: &'static str,
	pub original: f32,
	pub corrected: f32,
}

impl MeshConfig {
	pub const MIN_CURVE_SEGMENTS: u32 = 2;
	pub const MAX_CURVE_SEGMENTS: u32 = 64;
	pub const MAX_FILLET_AMOUNT: f32 = 0.49;
	pub const MAX_INNER_LOOP_SCALE: f32 = 0.9;
	pub const MAX_INNERMOST_LOOP_SCALE: f32 = 0.89;
	/// Minimum gap kept between the inner and innermost scales.
	pub const LOOP_SCALE_GAP: f32 = 0.01;

	/// Clamps every field into range and returns what changed.
	///
	/// NaN resets a field to its default. Afterwards `innermost_loop_scale < inner_loop_scale`
	/// always holds.
	pub fn validate(&mut self) -> Vec<ConfigCorrection> {
		let defaults = Self::default();
		let mut corrections = Vec::new();

		let segments =
			self.curve_segments.clamp(Self::MIN_CURVE_SEGMENTS, Self::MAX_CURVE_SEGMENTS);
		if segments != self.curve_segments {
			corrections.push(ConfigCorrection {
				field: "curve_segments",
				original: self.curve_segments as f32,
				corrected: segments as f32,
			});
			self.curve_segments = segments;
		}

		correct_range(
			&mut corrections,
			"fillet_amount",
			&mut self.fillet_amount,
			defaults.fillet_amount,
			0.0..=Self::MAX_FILLET_AMOUNT,
		);
		correct_range(
			&mut corrections,
			"inner_loop_scale",
			&mut self.inner_loop_scale,
			defaults.inner_loop_scale,
			0.0..=Self::MAX_INNER_LOOP_SCALE,
		);
		correct_range(
			&mut corrections,
			"innermost_loop_scale",
			&mut self.innermost_loop_scale,
			defaults.innermost_loop_scale,
			0.0..=Self::MAX_INNERMOST_LOOP_SCALE,
		);

		if self.innermost_loop_scale >= self.inner_loop_scale {
			let inner = self.inner_loop_scale.max(Self::LOOP_SCALE_GAP);
			if inner != self.inner_loop_scale {
				corrections.push(ConfigCorrection {
					field: "inner_loop_scale",
					original: self.inner_loop_scale,
					corrected: inner,
				});
				self.inner_loop_scale = inner;
			}
			let innermost = (inner - Self::LOOP_SCALE_GAP).max(0.0);
			corrections.push(ConfigCorrection {
				field: "innermost_loop_scale",
				original: self.innermost_loop_scale,
				corrected: innermost,
			});
			self.innermost_loop_scale = innermost;
		}

		correct_finite(
			&mut corrections,
			"ground_offset",
			&mut self.ground_offset,
			defaults.ground_offset,
		);
		correct_finite(&mut corrections, "fill_offset", &mut self.fill_offset, defaults.fill_offset);

		if !(self.probe_height.is_finite() && self.probe_height >= 0.0) {
			corrections.push(ConfigCorrection {
				field: "probe_height",
				original: self.probe_height,
				corrected: defaults.probe_height,
			});
			self.probe_height = defaults.probe_height;
		}
		if !(self.probe_distance.is_finite() && self.probe_distance > 0.0) {
			corrections.push(ConfigCorrection {
				field: "probe_distance",
				original: self.probe_distance,
				corrected: defaults.probe_distance,
			});
			self.probe_distance = defaults.probe_distance;
		}

		for correction in &corrections {
			log::warn!(
				"Mesh config {} corrected from {} to {}",
				correction.field,
				correction.original,
				correction.corrected
			);
		}

		corrections
	}

	/// Conformer set up with this configuration's layers, offset and probe window.
	pub fn conformer<'a>(&self, probe: &'a dyn GroundProbe) -> GroundConformer<'a> {
		GroundConformer::new(probe)
			.with_layers(self.ground_layers)
			.with_offset(self.ground_offset)
			.with_probe_height(self.probe_height)
			.with_probe_distance(self.probe_distance)
	}

	pub fn surface_color(&self) -> Color {
		let [r, g, b, a] = self.surface_color;
		Color::linear_rgba(r, g, b, a)
	}
}

fn correct_range(
	corrections: &mut Vec<ConfigCorrection>,
	field: &'static str,
	value: &mut f32,
	default: f32,
	range: std::ops::RangeInclusive<f32>,
) {
	let corrected = if value.is_nan() {
		default
	} else {
		value.clamp(*range.start(), *range.end())
	};
	// NaN never compares equal, so it is always recorded
	if corrected != *value {
		corrections.push(ConfigCorrection { field, original: *value, corrected });
		*value = corrected;
	}
}

fn correct_finite(
	corrections: &mut Vec<ConfigCorrection>,
	field: &'static str,
	value: &mut f32,
	default: f32,
) {
	if !value.is_finite() {
		corrections.push(ConfigCorrection { field, original: *value, corrected: default });
		*value = default;
	}
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to parse mesh configurations: {0}")]
	Parse(#[from] serde_json::Error),
	#[error("no mesh configuration named '{0}'")]
	Unknown(String),
}

/// Named mesh configurations, every entry validated on insertion.
#[derive(Resource, Debug, Clone, Default)]
pub struct MeshConfigSet {
	configs: BTreeMap<String, MeshConfig>,
}

impl MeshConfigSet {
	pub fn new() -> Self {
		Self { configs: BTreeMap::new() }
	}

	/// Parses a JSON object of `name -> config`.
	///
	/// Missing fields take their defaults. Behaviors of an unknown kind are skipped with a warning.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let raw: BTreeMap<String, MeshConfig> = serde_json::from_str(json)?;
		let mut set = Self::new();
		for (name, config) in raw {
			set.insert(name, config);
		}
		Ok(set)
	}

	pub fn to_json(&self) -> Result<String, ConfigError> {
		Ok(serde_json::to_string_pretty(&self.configs)?)
	}

	/// Validates and stores `config` under `name`, replacing any previous entry.
	pub fn insert(
		&mut self,
		name: impl Into<String>,
		mut config: MeshConfig,
	) -> Vec<ConfigCorrection> {
		let name = name.into();
		let corrections = config.validate();
		if !corrections.is_empty() {
			log::info!("Mesh config '{}' loaded with {} correction(s)", name, corrections.len());
		}
		self.configs.insert(name, config);
		corrections
	}

	pub fn with(mut self, name: impl Into<String>, config: MeshConfig) -> Self {
		self.insert(name, config);
		self
	}

	pub fn get(&self, name: &str) -> Result<&MeshConfig, ConfigError> {
		self.configs.get(name).ok_or_else(|| ConfigError::Unknown(name.to_string()))
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.configs.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.configs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.configs.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_is_valid() {
		let mut config = MeshConfig::default();
		assert!(config.validate().is_empty());
	}

	#[test]
	fn test_out_of_range_values_clamped() {
		let mut config = MeshConfig {
			curve_segments: 0,
			fillet_amount: 3.0,
			inner_loop_scale: -1.0,
			innermost_loop_scale: 0.5,
			..Default::default()
		};
		let corrections = config.validate();

		assert_eq!(config.curve_segments, 2);
		assert_eq!(config.fillet_amount, 0.49);
		assert!(config.innermost_loop_scale < config.inner_loop_scale);
		assert!(corrections.iter().any(|c| c.field == "curve_segments"));
		assert!(corrections.iter().any(|c| c.field == "fillet_amount"));

		let mut dense = MeshConfig { curve_segments: 4_000_000_000, ..Default::default() };
		let corrections = dense.validate();
		assert_eq!(dense.curve_segments, MeshConfig::MAX_CURVE_SEGMENTS);
		assert_eq!(corrections.len(), 1);
		assert_eq!(corrections[0].field, "curve_segments");
	}

	#[test]
	fn test_innermost_always_below_inner() {
		let values = [-1.0, 0.0, 0.005, 0.01, 0.3, 0.5, 0.89, 0.9, 1.5, f32::NAN];
		for inner in values {
			for innermost in values {
				let mut config = MeshConfig {
					inner_loop_scale: inner,
					innermost_loop_scale: innermost,
					..Default::default()
				};
				config.validate();
				assert!(
					config.innermost_loop_scale < config.inner_loop_scale,
					"inner {} innermost {} -> {} {}",
					inner,
					innermost,
					config.inner_loop_scale,
					config.innermost_loop_scale
				);
				assert!(config.innermost_loop_scale >= 0.0);
				assert!(config.inner_loop_scale <= MeshConfig::MAX_INNER_LOOP_SCALE);
			}
		}
	}

	#[test]
	fn test_nan_resets_to_default() {
		let mut config =
			MeshConfig { fillet_amount: f32::NAN, probe_distance: -4.0, ..Default::default() };
		let corrections = config.validate();

		assert_eq!(config.fillet_amount, MeshConfig::default().fillet_amount);
		assert_eq!(config.probe_distance, MeshConfig::default().probe_distance);
		assert_eq!(corrections.len(), 2);
	}

	#[test]
	fn test_config_set_from_json() {
		let json = r#"{
			"garden": {
				"curve_type": "FilletCorners",
				"fillet_amount": 0.3,
				"fill_template": "carrot",
				"behaviors": [
					{ "kind": "Fertile", "growth_multiplier": 2.0 },
					{ "kind": "Teleport", "range": 4.0 }
				]
			},
			"path": { "curve_type": "None", "inner_loop_scale": 0.2, "innermost_loop_scale": 0.4 }
		}"#;

		let set = MeshConfigSet::from_json(json).unwrap();
		assert_eq!(set.len(), 2);

		let garden = set.get("garden").unwrap();
		assert_eq!(garden.curve_type, CurveType::FilletCorners);
		assert_eq!(garden.fill_template.as_deref(), Some("carrot"));
		assert_eq!(garden.behaviors, vec![BehaviorTemplate::Fertile { growth_multiplier: 2.0 }]);
		assert_eq!(garden.curve_segments, MeshConfig::default().curve_segments);

		let path = set.get("path").unwrap();
		assert!(path.innermost_loop_scale < path.inner_loop_scale);

		assert!(matches!(set.get("orchard"), Err(ConfigError::Unknown(_))));
		assert!(MeshConfigSet::from_json("{ not json").is_err());
	}
}
