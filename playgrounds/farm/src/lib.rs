use bevy::prelude::*;
use std::f32::consts::PI;

mod camera;
pub mod config;
pub mod input;
pub mod terrain;
mod ui;

use crops::{CropCatalog, CropsPlugin};
use paint_mesh::{ManagerId, MeshConfigSet, PaintMeshPlugin};

pub use camera::CameraController;
pub use input::DrawingInput;
pub use terrain::{FarmGround, FarmTerrain};

pub use crops;
pub use paint_mesh;

/// Manager driven by the local mouse and keyboard.
pub const LOCAL_MANAGER: ManagerId = ManagerId(0);

pub struct FarmPlugin {
	pub seed: u32,
	pub configs: MeshConfigSet,
	pub crops: CropCatalog,
}

impl Plugin for FarmPlugin {
	fn build(&self, app: &mut App) {
		let farm_terrain = FarmTerrain::new(self.seed);
		let input = DrawingInput::new(LOCAL_MANAGER, self.configs.names().map(str::to_string));

		app.add_plugins(PaintMeshPlugin::new(farm_terrain.probe(), self.configs.clone()))
			.add_plugins(CropsPlugin { catalog: self.crops.clone() });

		app.insert_resource(ClearColor(Color::hsla(201.0, 0.69, 0.62, 1.0)))
			.insert_resource(farm_terrain)
			.insert_resource(input)
			.add_systems(
				Startup,
				(
					camera::setup_camera,
					setup_lighting,
					terrain::setup_ground,
					config::setup_fill_templates,
					ui::setup_status_ui,
				),
			)
			.add_systems(
				Update,
				(
					camera::camera_controller,
					input::keyboard_drawing_input,
					input::mouse_drawing_input,
					ui::update_status_display,
				),
			);
	}
}

fn setup_lighting(mut commands: Commands) {
	commands.insert_resource(AmbientLight {
		color: Color::WHITE,
		brightness: 400.0,
		affects_lightmapped_meshes: true,
	});

	// sun
	commands.spawn((
		DirectionalLight { illuminance: 10000.0, shadows_enabled: true, ..default() },
		Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -PI / 4.0, PI / 4.0, 0.0)),
	));

	// fill from the opposite side
	commands.spawn((
		DirectionalLight { illuminance: 500.0, shadows_enabled: false, ..default() },
		Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, PI / 4.0, -PI / 4.0, 0.0)),
	));
}
