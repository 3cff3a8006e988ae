use anyhow::Context;
use bevy::prelude::*;
use crops::{CropCatalog, CropKind, GrowthStages};
use ground::LayerNames;
use paint_mesh::{
	BehaviorTemplate, CurveType, FillTemplate, FillTemplates, MeshConfig, MeshConfigSet,
};
use std::path::Path;

/// Surfaces available when no configuration file is given.
pub fn builtin_configs(layers: &LayerNames) -> MeshConfigSet {
	let terrain = layers.mask_for(["terrain"]);

	MeshConfigSet::new()
		.with(
			"garden",
			MeshConfig {
				curve_type: CurveType::FilletCorners,
				fillet_amount: 0.3,
				ground_layers: terrain,
				fill_object_spacing: 0.8,
				fill_offset: 0.05,
				fill_template: Some("carrot".to_string()),
				behaviors: vec![BehaviorTemplate::Fertile { growth_multiplier: 1.5 }],
				..Default::default()
			},
		)
		.with(
			"path",
			MeshConfig {
				curve_type: CurveType::None,
				inner_loop_scale: 0.5,
				innermost_loop_scale: 0.0,
				ground_layers: terrain,
				ground_offset: 0.03,
				fill_object_spacing: 0.0,
				surface_color: [0.55, 0.5, 0.42, 1.0],
				..Default::default()
			},
		)
		.with(
			"pond",
			MeshConfig {
				curve_type: CurveType::CatmullRom,
				curve_segments: 12,
				ground_layers: terrain,
				ground_offset: 0.1,
				fill_object_spacing: 2.5,
				fill_template: Some("pebble".to_string()),
				convex_collider: true,
				surface_color: [0.15, 0.35, 0.6, 1.0],
				behaviors: vec![BehaviorTemplate::Bob { amplitude: 0.05, frequency: 0.25 }],
				..Default::default()
			},
		)
}

/// Reads a JSON object of named mesh configurations.
pub fn load_mesh_configs(path: impl AsRef<Path>) -> anyhow::Result<MeshConfigSet> {
	let path = path.as_ref();
	let json = std::fs::read_to_string(path)
		.with_context(|| format!("Failed to read mesh configurations from {}", path.display()))?;
	let configs = MeshConfigSet::from_json(&json)
		.with_context(|| format!("Invalid mesh configurations in {}", path.display()))?;
	log::info!("Loaded {} mesh configurations from {}", configs.len(), path.display());
	Ok(configs)
}

pub fn default_crops() -> anyhow::Result<CropCatalog> {
	let carrot = CropKind {
		name: "carrot".to_string(),
		stages: GrowthStages::new(vec![4.0, 6.0, 8.0], vec![0.15, 0.4, 0.75, 1.0])?,
	};
	Ok(CropCatalog::new().with("carrot", carrot))
}

pub fn setup_fill_templates(
	mut templates: ResMut<FillTemplates>,
	mut meshes: ResMut<Assets<Mesh>>,
	mut materials: ResMut<Assets<StandardMaterial>>,
) {
	templates.register(
		"carrot",
		FillTemplate {
			mesh: meshes.add(Cone { radius: 0.12, height: 0.4 }),
			material: materials.add(StandardMaterial {
				base_color: Color::srgb(0.2, 0.7, 0.15),
				..default()
			}),
			scale: Vec3::ONE,
		},
	);
	templates.register(
		"pebble",
		FillTemplate {
			mesh: meshes.add(Sphere::new(0.15)),
			material: materials.add(StandardMaterial {
				base_color: Color::srgb(0.5, 0.5, 0.52),
				perceptual_roughness: 0.8,
				..default()
			}),
			scale: Vec3::new(1.0, 0.5, 1.0),
		},
	);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::terrain::{ground_layers, TERRAIN_LAYER};
	use ground::LayerMask;

	#[test]
	fn test_builtin_configs_are_valid() {
		let configs = builtin_configs(&ground_layers().unwrap());
		assert_eq!(configs.names().collect::<Vec<_>>(), vec!["garden", "path", "pond"]);
		for name in ["garden", "path", "pond"] {
			let mut config = configs.get(name).unwrap().clone();
			assert_eq!(config.ground_layers, LayerMask::layer(TERRAIN_LAYER));
			assert!(config.validate().is_empty(), "{} needed corrections", name);
		}
	}

	#[test]
	fn test_load_mesh_configs() {
		let path = std::env::temp_dir().join(format!("farm-configs-{}.json", std::process::id()));
		std::fs::write(&path, r#"{ "bed": { "curve_type": "None", "fill_template": "carrot" } }"#)
			.unwrap();
		let configs = load_mesh_configs(&path).unwrap();
		std::fs::remove_file(&path).unwrap();

		let bed = configs.get("bed").unwrap();
		assert_eq!(bed.curve_type, CurveType::None);
		assert_eq!(bed.fill_template.as_deref(), Some("carrot"));

		let missing = load_mesh_configs(path.with_extension("missing")).unwrap_err();
		assert!(missing.to_string().contains("Failed to read"));
	}

	#[test]
	fn test_default_crops() {
		let crops = default_crops().unwrap();
		let carrot = crops.get("carrot").unwrap();
		assert_eq!(carrot.stages.stage_count(), 4);
		assert_eq!(carrot.stages.total_duration(), 18.0);
	}
}
