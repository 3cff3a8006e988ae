use crate::catalog::CropCatalog;
use crate::growth::{CropGrowth, GrowthEvent};
use bevy::prelude::*;
use paint_mesh::{Fertile, FillObject};

/// Sent once when a crop reaches its last stage.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct CropMatured {
	pub entity: Entity,
	pub template: String,
}

pub struct CropsPlugin {
	pub catalog: CropCatalog,
}

impl Plugin for CropsPlugin {
	fn build(&self, app: &mut App) {
		app.insert_resource(self.catalog.clone())
			.add_message::<CropMatured>()
			.add_systems(Update, (plant_crops, grow_crops).chain());
	}
}

/// Starts growth on fill objects whose template is a known crop.
pub fn plant_crops(
	mut commands: Commands,
	catalog: Res<CropCatalog>,
	mut planted: Query<(Entity, &FillObject, &mut Transform), Added<FillObject>>,
) {
	for (entity, fill, mut transform) in planted.iter_mut() {
		let Some(kind) = catalog.get(&fill.template) else {
			continue;
		};
		let growth = CropGrowth::new(transform.scale);
		transform.scale = growth.transform_scale(&kind.stages);
		commands.entity(entity).insert(growth);
		log::debug!("Planted {} at {:?}", kind.name, transform.translation);
	}
}

/// Advances every growing crop by the frame time, scaled by its surface's fertility.
pub fn grow_crops(
	time: Res<Time>,
	catalog: Res<CropCatalog>,
	fertile: Query<&Fertile>,
	mut crops: Query<(Entity, &FillObject, &mut CropGrowth, &mut Transform, Option<&ChildOf>)>,
	mut matured: MessageWriter<CropMatured>,
) {
	let dt = time.delta_secs();

	for (entity, fill, mut growth, mut transform, parent) in crops.iter_mut() {
		let Some(kind) = catalog.get(&fill.template) else {
			continue;
		};
		if growth.is_mature(&kind.stages) {
			continue;
		}

		let multiplier = parent
			.and_then(|child_of| fertile.get(child_of.parent()).ok())
			.map_or(1.0, |f| f.growth_multiplier.max(0.0));

		let event = growth.advance(dt * multiplier, &kind.stages);
		transform.scale = growth.transform_scale(&kind.stages);

		match event {
			GrowthEvent::Growing => {}
			GrowthEvent::StageReached(stage) => {
				log::debug!("{} {:?} reached stage {}", kind.name, entity, stage);
			}
			GrowthEvent::Mature => {
				log::info!("{} {:?} is mature", kind.name, entity);
				matured.write(CropMatured { entity, template: fill.template.clone() });
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::CropKind;
	use crate::growth::GrowthStages;
	use std::time::Duration;

	fn app() -> App {
		let catalog = CropCatalog::new().with(
			"carrot",
			CropKind {
				name: "carrot".to_string(),
				stages: GrowthStages::new(vec![2.0, 2.0], vec![0.2, 0.6, 1.0]).unwrap(),
			},
		);
		let mut app = App::new();
		app.init_resource::<Time>().add_plugins(CropsPlugin { catalog });
		app
	}

	fn tick(app: &mut App, seconds: f32) {
		app.world_mut().resource_mut::<Time>().advance_by(Duration::from_secs_f32(seconds));
		app.update();
	}

	fn matured(app: &App) -> usize {
		app.world().resource::<Messages<CropMatured>>().iter_current_update_messages().count()
	}

	#[test]
	fn test_crops_grow_faster_on_fertile_surfaces() {
		let mut app = app();
		let world = app.world_mut();
		let plain = world.spawn(Transform::default()).id();
		let rich = world.spawn((Transform::default(), Fertile { growth_multiplier: 2.0 })).id();

		let spawn_crop = |world: &mut World, parent: Entity| {
			world
				.spawn((
					FillObject { template: "carrot".to_string() },
					Transform::from_scale(Vec3::splat(2.0)),
					ChildOf(parent),
				))
				.id()
		};
		let slow = spawn_crop(world, plain);
		let fast = spawn_crop(world, rich);
		let rock = world
			.spawn((FillObject { template: "rock".to_string() }, Transform::default(), ChildOf(plain)))
			.id();

		app.update();
		let scale = |app: &App, entity: Entity| app.world().get::<Transform>(entity).map(|t| t.scale.x);
		assert_eq!(scale(&app, slow), Some(0.4));
		assert!(app.world().get::<CropGrowth>(rock).is_none());

		tick(&mut app, 1.0);
		assert_eq!(app.world().get::<CropGrowth>(slow).map(|g| g.stage), Some(0));
		assert_eq!(app.world().get::<CropGrowth>(fast).map(|g| g.stage), Some(1));
		assert!((scale(&app, fast).unwrap_or_default() - 1.2).abs() < 1e-5);

		// delta stays at one second per update
		app.update();
		assert_eq!(app.world().get::<CropGrowth>(fast).map(|g| g.stage), Some(2));
		assert_eq!(scale(&app, fast), Some(2.0));
		assert_eq!(matured(&app), 1);
	}

	#[test]
	fn test_removing_growth_cancels() {
		let mut app = app();
		let crop = app
			.world_mut()
			.spawn((FillObject { template: "carrot".to_string() }, Transform::default()))
			.id();
		app.update();

		tick(&mut app, 1.0);
		app.world_mut().entity_mut(crop).remove::<CropGrowth>();
		let frozen = app.world().get::<Transform>(crop).map(|t| t.scale);

		tick(&mut app, 10.0);
		assert!(app.world().get::<CropGrowth>(crop).is_none());
		assert_eq!(app.world().get::<Transform>(crop).map(|t| t.scale), frozen);
		assert_eq!(matured(&app), 0);
	}
}
