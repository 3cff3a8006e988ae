use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use paint_mesh::{DrawingCommand, ManagerId};

/// Which manager the keyboard and mouse drive, and which configuration `B` starts.
#[derive(Resource, Debug, Clone)]
pub struct DrawingInput {
	pub manager: ManagerId,
	configs: Vec<String>,
	selected: usize,
}

impl DrawingInput {
	pub fn new(manager: ManagerId, configs: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self { manager, configs: configs.into_iter().map(Into::into).collect(), selected: 0 }
	}

	pub fn selected(&self) -> Option<&str> {
		self.configs.get(self.selected).map(String::as_str)
	}

	/// Selects the next configuration, wrapping around.
	pub fn cycle(&mut self) -> Option<&str> {
		if !self.configs.is_empty() {
			self.selected = (self.selected + 1) % self.configs.len();
		}
		self.selected()
	}

	/// Command for a key pressed this frame, if it maps to one.
	pub fn command_for_key(&self, key: KeyCode) -> Option<DrawingCommand> {
		let manager = self.manager;
		match key {
			KeyCode::KeyB => self
				.selected()
				.map(|config| DrawingCommand::Activate { manager, config: config.to_string() }),
			KeyCode::Backspace => Some(DrawingCommand::DeleteLastPoint { manager }),
			KeyCode::Enter => Some(DrawingCommand::Finalize { manager }),
			KeyCode::Escape => Some(DrawingCommand::Reset { manager }),
			_ => None,
		}
	}
}

const COMMAND_KEYS: [KeyCode; 4] =
	[KeyCode::KeyB, KeyCode::Backspace, KeyCode::Enter, KeyCode::Escape];

pub fn keyboard_drawing_input(
	keyboard_input: Res<ButtonInput<KeyCode>>,
	mut input: ResMut<DrawingInput>,
	mut drawing_commands: MessageWriter<DrawingCommand>,
) {
	if keyboard_input.just_pressed(KeyCode::Tab) {
		if let Some(config) = input.cycle() {
			log::info!("Selected configuration '{}'", config);
		}
	}

	for key in COMMAND_KEYS {
		if !keyboard_input.just_pressed(key) {
			continue;
		}
		if let Some(command) = input.command_for_key(key) {
			drawing_commands.write(command);
		}
	}
}

/// Left click casts a ray from the cursor into the scene.
pub fn mouse_drawing_input(
	mouse_buttons: Res<ButtonInput<MouseButton>>,
	input: Res<DrawingInput>,
	windows: Query<&Window, With<PrimaryWindow>>,
	cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
	mut drawing_commands: MessageWriter<DrawingCommand>,
) {
	if !mouse_buttons.just_pressed(MouseButton::Left) {
		return;
	}
	let Ok(window) = windows.single() else {
		return;
	};
	let Some(cursor) = window.cursor_position() else {
		return;
	};
	let Ok((camera, camera_transform)) = cameras.single() else {
		return;
	};

	match camera.viewport_to_world(camera_transform, cursor) {
		Ok(ray) => {
			drawing_commands.write(DrawingCommand::PlacePointFromRay { manager: input.manager, ray });
		}
		Err(e) => log::debug!("No pick ray for cursor {:?}: {:?}", cursor, e),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MANAGER: ManagerId = ManagerId(1);

	#[test]
	fn test_cycle_wraps() {
		let mut input = DrawingInput::new(MANAGER, ["garden", "path"]);
		assert_eq!(input.selected(), Some("garden"));
		assert_eq!(input.cycle(), Some("path"));
		assert_eq!(input.cycle(), Some("garden"));

		let mut empty = DrawingInput::new(MANAGER, Vec::<String>::new());
		assert_eq!(empty.cycle(), None);
		assert!(empty.command_for_key(KeyCode::KeyB).is_none());
	}

	#[test]
	fn test_keys_write_commands() {
		let mut app = App::new();
		app.init_resource::<ButtonInput<KeyCode>>()
			.insert_resource(DrawingInput::new(MANAGER, ["garden", "path"]))
			.add_message::<DrawingCommand>()
			.add_systems(Update, keyboard_drawing_input);

		{
			let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
			keys.press(KeyCode::Tab);
			keys.press(KeyCode::KeyB);
		}
		app.update();

		let commands: Vec<_> = app
			.world()
			.resource::<Messages<DrawingCommand>>()
			.iter_current_update_messages()
			.cloned()
			.collect();
		assert_eq!(commands.len(), 1);
		assert!(matches!(
			&commands[0],
			DrawingCommand::Activate { manager, config } if *manager == MANAGER && config == "path"
		));
	}
}
