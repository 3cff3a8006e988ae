use bevy::prelude::*;
use farm_playground::{config, terrain, FarmPlugin};

fn main() -> anyhow::Result<()> {
	// [seed] [mesh-configs.json]
	let mut args = std::env::args().skip(1);
	let seed = args.next().and_then(|s| s.parse::<u32>().ok()).unwrap_or(12345);
	let configs = match args.next() {
		Some(path) => config::load_mesh_configs(path)?,
		None => config::builtin_configs(&terrain::ground_layers()?),
	};
	let crops = config::default_crops()?;

	println!("Starting farm playground with seed: {}", seed);

	App::new()
		.add_plugins(DefaultPlugins.set(WindowPlugin {
			primary_window: Some(Window {
				title: "Farm Playground".to_string(),
				resolution: (1280, 720).into(),
				..default()
			}),
			..default()
		}))
		.add_plugins(FarmPlugin { seed, configs, crops })
		.run();

	Ok(())
}
