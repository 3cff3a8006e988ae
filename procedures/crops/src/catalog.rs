use crate::growth::GrowthStages;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A kind of crop and how it grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropKind {
	pub name: String,
	pub stages: GrowthStages,
}

/// Crop kinds keyed by the fill template that plants them.
#[derive(Resource, Debug, Clone, Default)]
pub struct CropCatalog {
	by_template: HashMap<String, CropKind>,
}

impl CropCatalog {
	pub fn new() -> Self {
		Self { by_template: HashMap::new() }
	}

	/// Fill objects spawned from `template` will grow as `kind`.
	pub fn register(&mut self, template: impl Into<String>, kind: CropKind) {
		let template = template.into();
		if let Some(previous) = self.by_template.insert(template.clone(), kind) {
			log::warn!("Template '{}' no longer plants '{}'", template, previous.name);
		}
	}

	pub fn with(mut self, template: impl Into<String>, kind: CropKind) -> Self {
		self.register(template, kind);
		self
	}

	pub fn get(&self, template: &str) -> Option<&CropKind> {
		self.by_template.get(template)
	}

	pub fn len(&self) -> usize {
		self.by_template.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_template.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_register_and_replace() {
		let wheat = CropKind {
			name: "wheat".to_string(),
			stages: GrowthStages::new(vec![3.0], vec![0.3, 1.0]).unwrap(),
		};
		let barley = CropKind { name: "barley".to_string(), ..wheat.clone() };

		let mut catalog = CropCatalog::new().with("grain", wheat);
		assert_eq!(catalog.get("grain").map(|k| k.name.as_str()), Some("wheat"));

		catalog.register("grain", barley);
		assert_eq!(catalog.len(), 1);
		assert_eq!(catalog.get("grain").map(|k| k.name.as_str()), Some("barley"));
		assert!(catalog.get("rock").is_none());
	}
}
