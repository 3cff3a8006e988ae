use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Bit mask selecting which ground layers a probe may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
	pub const ALL: Self = Self(u32::MAX);
	pub const NONE: Self = Self(0);

	/// Mask with only layer `index` set. Indices past 31 select nothing.
	pub fn layer(index: u8) -> Self {
		Self(1u32.checked_shl(index as u32).unwrap_or(0))
	}

	pub fn with(self, other: Self) -> Self {
		Self(self.0 | other.0)
	}

	pub fn intersects(self, other: Self) -> bool {
		self.0 & other.0 != 0
	}

	pub fn is_empty(self) -> bool {
		self.0 == 0
	}
}

impl Default for LayerMask {
	fn default() -> Self {
		Self::ALL
	}
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayerError {
	#[error("layer name '{0}' is already mapped")]
	DuplicateName(String),
	#[error("layer index {index} is already mapped to '{existing}'")]
	DuplicateIndex { index: u8, existing: String },
	#[error("layer index {0} is out of range (0-31)")]
	IndexOutOfRange(u8),
}

/// Named ground layers, so configuration can refer to "terrain" rather than bit indices.
#[derive(Debug, Clone, Default)]
pub struct LayerNames {
	names: BTreeMap<String, u8>,
}

impl LayerNames {
	pub fn new() -> Self {
		Self { names: BTreeMap::new() }
	}

	/// Maps `name` to `index`. Duplicate names or indices are rejected and the existing mapping
	/// is kept.
	pub fn register(&mut self, name: impl Into<String>, index: u8) -> Result<(), LayerError> {
		let name = name.into();
		if index > 31 {
			return Err(LayerError::IndexOutOfRange(index));
		}
		if self.names.contains_key(&name) {
			return Err(LayerError::DuplicateName(name));
		}
		if let Some((existing, _)) = self.names.iter().find(|(_, i)| **i == index) {
			return Err(LayerError::DuplicateIndex { index, existing: existing.clone() });
		}
		self.names.insert(name, index);
		Ok(())
	}

	pub fn index_of(&self, name: &str) -> Option<u8> {
		self.names.get(name).copied()
	}

	/// Builds a mask from layer names. Unknown names are skipped with a warning.
	pub fn mask_for<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> LayerMask {
		names.into_iter().fold(LayerMask::NONE, |mask, name| match self.index_of(name) {
			Some(index) => mask.with(LayerMask::layer(index)),
			None => {
				log::warn!("Unknown ground layer '{}' ignored", name);
				mask
			}
		})
	}
}
