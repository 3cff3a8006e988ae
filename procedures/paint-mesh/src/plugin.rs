use crate::assembler::MeshBounds;
use crate::behavior::{bob_surfaces, spin_surfaces};
use crate::config::MeshConfigSet;
use crate::session::{DrawingManager, GeneratedPolygon, ManagerId, SessionError, SessionSlot};
use bevy::prelude::*;
use ground::GroundProbe;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

const PREVIEW_COLOR: Color = Color::srgb(1.0, 0.85, 0.1);
/// Lift applied to preview lines so they are not hidden by the ground.
const PREVIEW_LIFT: f32 = 0.03;
const MARKER_RADIUS: f32 = 0.12;

/// Ground probe shared with the drawing systems.
/// Generic over the probe type so playgrounds can plug in their own terrain.
#[derive(Resource)]
pub struct GroundResource<G: GroundProbe> {
	pub probe: Arc<G>,
}

impl<G: GroundProbe> GroundResource<G> {
	pub fn new(probe: G) -> Self {
		Self { probe: Arc::new(probe) }
	}

	pub fn from_arc(probe: Arc<G>) -> Self {
		Self { probe }
	}
}

/// All drawing managers, created on first use.
#[derive(Resource, Debug, Default)]
pub struct DrawingManagers {
	managers: BTreeMap<ManagerId, DrawingManager>,
}

impl DrawingManagers {
	pub fn get(&self, id: ManagerId) -> Option<&DrawingManager> {
		self.managers.get(&id)
	}

	pub fn get_or_insert(&mut self, id: ManagerId) -> &mut DrawingManager {
		self.managers.entry(id).or_insert_with(|| DrawingManager::new(id))
	}

	pub fn iter(&self) -> impl Iterator<Item = &DrawingManager> {
		self.managers.values()
	}
}

/// Object spawned at every fill position.
#[derive(Debug, Clone)]
pub struct FillTemplate {
	pub mesh: Handle<Mesh>,
	pub material: Handle<StandardMaterial>,
	pub scale: Vec3,
}

/// Fill templates by name, as referenced from `MeshConfig::fill_template`.
#[derive(Resource, Debug, Default)]
pub struct FillTemplates {
	templates: HashMap<String, FillTemplate>,
}

impl FillTemplates {
	pub fn register(&mut self, name: impl Into<String>, template: FillTemplate) {
		let name = name.into();
		if self.templates.insert(name.clone(), template).is_some() {
			log::warn!("Fill template '{}' replaced", name);
		}
	}

	pub fn get(&self, name: &str) -> Option<&FillTemplate> {
		self.templates.get(name)
	}
}

/// Input to the drawing managers.
#[derive(Message, Debug, Clone)]
pub enum DrawingCommand {
	/// Start drawing with the named configuration from [`MeshConfigSet`].
	Activate { manager: ManagerId, config: String },
	PlacePoint { manager: ManagerId, point: Vec3 },
	/// Place a point where the ray meets the ground.
	PlacePointFromRay { manager: ManagerId, ray: Ray3d },
	DeleteLastPoint { manager: ManagerId },
	Finalize { manager: ManagerId },
	Reset { manager: ManagerId },
}

impl DrawingCommand {
	pub fn manager(&self) -> ManagerId {
		match self {
			Self::Activate { manager, .. }
			| Self::PlacePoint { manager, .. }
			| Self::PlacePointFromRay { manager, .. }
			| Self::DeleteLastPoint { manager }
			| Self::Finalize { manager }
			| Self::Reset { manager } => *manager,
		}
	}
}

#[derive(Message, Debug, Clone)]
pub struct PolygonFinalized {
	pub polygon: GeneratedPolygon,
}

/// Root entity of a painted surface.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedSurface {
	pub manager: ManagerId,
}

/// Collision shape request for a painted surface. Physics backends build the collider.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct SurfaceCollider {
	pub convex: bool,
	pub bounds: MeshBounds,
}

/// Object placed inside a painted surface, parented to it.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct FillObject {
	pub template: String,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointMarker {
	pub manager: ManagerId,
	pub index: usize,
}

#[derive(Resource)]
pub struct PointMarkerAssets {
	pub mesh: Handle<Mesh>,
	pub material: Handle<StandardMaterial>,
}

pub struct PaintMeshPlugin<G: GroundProbe + 'static> {
	pub ground: Arc<G>,
	pub configs: MeshConfigSet,
}

impl<G: GroundProbe + 'static> PaintMeshPlugin<G> {
	pub fn new(ground: G, configs: MeshConfigSet) -> Self {
		Self { ground: Arc::new(ground), configs }
	}
}

impl<G: GroundProbe + 'static> Plugin for PaintMeshPlugin<G> {
	fn build(&self, app: &mut App) {
		app.insert_resource(GroundResource::from_arc(self.ground.clone()))
			.insert_resource(self.configs.clone())
			.init_resource::<SessionSlot>()
			.init_resource::<DrawingManagers>()
			.init_resource::<FillTemplates>()
			.add_message::<DrawingCommand>()
			.add_message::<PolygonFinalized>()
			.add_systems(Startup, setup_point_marker_assets)
			.add_systems(
				Update,
				(
					process_drawing_commands::<G>,
					spawn_generated_polygons,
					sync_point_markers,
					draw_preview_lines,
				)
					.chain(),
			)
			.add_systems(Update, (spin_surfaces, bob_surfaces));
	}
}

pub fn setup_point_marker_assets(
	mut commands: Commands,
	mut meshes: ResMut<Assets<Mesh>>,
	mut materials: ResMut<Assets<StandardMaterial>>,
) {
	commands.insert_resource(PointMarkerAssets {
		mesh: meshes.add(Sphere::new(MARKER_RADIUS)),
		material: materials.add(StandardMaterial {
			base_color: PREVIEW_COLOR,
			unlit: true,
			..default()
		}),
	});
}

/// Applies queued drawing commands. Rejected commands are logged and change nothing.
pub fn process_drawing_commands<G: GroundProbe + 'static>(
	mut drawing_commands: MessageReader<DrawingCommand>,
	mut finalized: MessageWriter<PolygonFinalized>,
	mut slot: ResMut<SessionSlot>,
	mut managers: ResMut<DrawingManagers>,
	configs: Res<MeshConfigSet>,
	ground: Res<GroundResource<G>>,
) {
	let probe: &dyn GroundProbe = ground.probe.as_ref();

	for command in drawing_commands.read() {
		let manager = managers.get_or_insert(command.manager());
		let result = match command {
			DrawingCommand::Activate { config, .. } => match configs.get(config) {
				Ok(found) => manager.activate(&mut slot, found.clone()).map(|_| ()),
				Err(_) => Err(SessionError::MissingConfiguration(config.clone())),
			},
			DrawingCommand::PlacePoint { point, .. } => manager.place_point(&slot, probe, *point),
			DrawingCommand::PlacePointFromRay { ray, .. } => {
				manager.place_point_from_ray(&slot, probe, *ray).map(|_| ())
			}
			DrawingCommand::DeleteLastPoint { .. } => {
				manager.delete_last_point(&slot, probe).map(|_| ())
			}
			DrawingCommand::Finalize { .. } => manager
				.finalize(&mut slot, probe)
				.map(|polygon| {
					finalized.write(PolygonFinalized { polygon });
				}),
			DrawingCommand::Reset { .. } => {
				manager.reset(&mut slot);
				Ok(())
			}
		};

		if let Err(e) = result {
			log::warn!("Drawing command {:?} rejected: {}", command, e);
		}
	}
}

/// Spawns the surface entity for each finalized polygon, with its behaviors and fill objects.
pub fn spawn_generated_polygons(
	mut commands: Commands,
	mut finalized: MessageReader<PolygonFinalized>,
	mut meshes: ResMut<Assets<Mesh>>,
	mut materials: ResMut<Assets<StandardMaterial>>,
	templates: Res<FillTemplates>,
) {
	for PolygonFinalized { polygon } in finalized.read() {
		let mesh = meshes.add(polygon.mesh.to_mesh());
		let material = materials.add(StandardMaterial {
			base_color: polygon.config.surface_color(),
			perceptual_roughness: 0.9,
			..default()
		});

		let mut surface = commands.spawn((
			GeneratedSurface { manager: polygon.manager },
			SurfaceCollider { convex: polygon.config.convex_collider, bounds: polygon.mesh.bounds },
			Mesh3d(mesh),
			MeshMaterial3d(material),
			Transform::from_translation(polygon.mesh.centroid),
		));
		for behavior in &polygon.config.behaviors {
			behavior.attach(&mut surface);
		}
		let parent = surface.id();

		let Some(name) = &polygon.config.fill_template else {
			continue;
		};
		let Some(template) = templates.get(name) else {
			log::warn!("Fill template '{}' is not registered, surface left empty", name);
			continue;
		};

		// children are placed relative to the surface origin
		for position in &polygon.fill {
			commands.spawn((
				FillObject { template: name.clone() },
				Mesh3d(template.mesh.clone()),
				MeshMaterial3d(template.material.clone()),
				Transform::from_translation(*position - polygon.mesh.centroid)
					.with_scale(template.scale),
				ChildOf(parent),
			));
		}
		log::info!("Spawned surface {:?} with {} '{}' fill objects", parent, polygon.fill.len(), name);
	}
}

/// Rebuilds the control point markers whenever a manager changed.
pub fn sync_point_markers(
	mut commands: Commands,
	managers: Res<DrawingManagers>,
	assets: Option<Res<PointMarkerAssets>>,
	markers: Query<Entity, With<PointMarker>>,
) {
	if !managers.is_changed() {
		return;
	}
	let Some(assets) = assets else {
		return;
	};

	for entity in markers.iter() {
		commands.entity(entity).despawn();
	}
	for manager in managers.iter() {
		for (index, point) in manager.points().iter().enumerate() {
			commands.spawn((
				PointMarker { manager: manager.id(), index },
				Mesh3d(assets.mesh.clone()),
				MeshMaterial3d(assets.material.clone()),
				Transform::from_translation(*point),
			));
		}
	}
}

pub fn draw_preview_lines(managers: Res<DrawingManagers>, mut gizmos: Gizmos) {
	for manager in managers.iter() {
		let preview = manager.preview();
		if !preview.is_enabled() || preview.position_count() < 2 {
			continue;
		}
		gizmos.linestrip(
			preview.positions().iter().map(|p| *p + Vec3::Y * PREVIEW_LIFT),
			PREVIEW_COLOR,
		);
	}
}
