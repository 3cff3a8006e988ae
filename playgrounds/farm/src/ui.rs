use crate::input::DrawingInput;
use bevy::prelude::*;
use crops::CropGrowth;
use paint_mesh::{DrawingManagers, GeneratedSurface, SessionState};

#[derive(Component)]
pub struct StatusDisplay;

pub fn setup_status_ui(mut commands: Commands) {
	log::info!("Setting up status UI");

	commands
		.spawn((
			Node {
				position_type: PositionType::Absolute,
				top: Val::Px(10.0),
				left: Val::Px(10.0),
				padding: UiRect::all(Val::Px(10.0)),
				..default()
			},
			BackgroundColor(Color::srgba(0.1, 0.15, 0.1, 0.7)),
			StatusDisplay,
		))
		.with_children(|parent| {
			parent.spawn((
				Text::new(""),
				TextFont { font_size: 18.0, ..default() },
				TextColor(Color::WHITE),
			));
		});
}

fn state_label(state: SessionState) -> &'static str {
	match state {
		SessionState::Idle => "idle",
		SessionState::Active => "drawing",
		SessionState::Finalized => "finalized",
	}
}

pub fn update_status_display(
	input: Res<DrawingInput>,
	managers: Res<DrawingManagers>,
	surfaces: Query<(), With<GeneratedSurface>>,
	crops: Query<&CropGrowth>,
	display: Query<&Children, With<StatusDisplay>>,
	mut text_query: Query<&mut Text>,
) {
	let Ok(children) = display.single() else {
		return;
	};
	let Some(mut text) = children.first().and_then(|entity| text_query.get_mut(*entity).ok()) else {
		return;
	};

	let manager = managers.get(input.manager);
	let state = manager.map_or(SessionState::Idle, |m| m.state());
	let points = manager.map_or(0, |m| m.points().len());

	text.0 = format!(
		"Config: {} (Tab)\nState: {}  Points: {}\nSurfaces: {}  Crops: {}\n\
		 B start | LMB point | Backspace undo | Enter finish | Esc cancel",
		input.selected().unwrap_or("none"),
		state_label(state),
		points,
		surfaces.iter().count(),
		crops.iter().count(),
	);
}
