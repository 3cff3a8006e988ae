use crate::assembler::{AssemblyError, PolygonMesh, PolygonMeshAssembler};
use crate::config::{ConfigCorrection, MeshConfig};
use crate::curve::{generate_curve, CurveOptions};
use crate::fill::FillPlacer;
use crate::polygon;
use crate::preview::PreviewLine;
use bevy::prelude::*;
use ground::GroundProbe;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a pick ray used to place points.
pub const PICK_DISTANCE: f32 = 1000.0;

/// Points needed before a polygon can be generated.
pub const MIN_POLYGON_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManagerId(pub u32);

impl std::fmt::Display for ManagerId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "manager#{}", self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
	#[default]
	Idle,
	Active,
	Finalized,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
	#[error("a drawing session is already active for {owner}")]
	SessionBusy { owner: ManagerId },
	#[error("{0} does not own the active drawing session")]
	NotActive(ManagerId),
	#[error("pick ray did not hit the ground")]
	NoGroundHit,
	#[error("there are no points to delete")]
	NoPoints,
	#[error("a polygon needs at least {required} points, got {actual}")]
	InsufficientPoints { required: usize, actual: usize },
	#[error("no mesh configuration named '{0}'")]
	MissingConfiguration(String),
	#[error("failed to assemble polygon mesh: {0}")]
	Assembly(#[from] AssemblyError),
}

/// The session currently holding the slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
	pub owner: ManagerId,
	pub config: MeshConfig,
}

/// Single drawing session shared by every manager. At most one manager owns it.
#[derive(Resource, Debug, Clone, Default)]
pub struct SessionSlot {
	active: Option<ActiveSession>,
}

impl SessionSlot {
	pub fn new() -> Self {
		Self { active: None }
	}

	pub fn owner(&self) -> Option<ManagerId> {
		self.active.as_ref().map(|session| session.owner)
	}

	pub fn is_free(&self) -> bool {
		self.active.is_none()
	}

	pub fn active(&self) -> Option<&ActiveSession> {
		self.active.as_ref()
	}

	/// Configuration of the session if `id` owns it.
	pub fn config_for(&self, id: ManagerId) -> Result<&MeshConfig, SessionError> {
		match &self.active {
			Some(session) if session.owner == id => Ok(&session.config),
			_ => Err(SessionError::NotActive(id)),
		}
	}

	fn claim(&mut self, id: ManagerId, config: MeshConfig) -> Result<(), SessionError> {
		if let Some(owner) = self.owner() {
			return Err(SessionError::SessionBusy { owner });
		}
		self.active = Some(ActiveSession { owner: id, config });
		Ok(())
	}

	/// Frees the slot if `id` owns it.
	fn release(&mut self, id: ManagerId) -> bool {
		if self.owner() == Some(id) {
			self.active = None;
			true
		} else {
			false
		}
	}
}

/// Everything a successful finalize produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPolygon {
	pub manager: ManagerId,
	pub mesh: PolygonMesh,
	/// World-space outer ring, without the closing point
	pub boundary: Vec<Vec3>,
	/// World-space fill object positions
	pub fill: Vec<Vec3>,
	pub config: MeshConfig,
}

/// One drawing tool instance: its control points, preview and lifecycle state.
#[derive(Debug, Clone)]
pub struct DrawingManager {
	id: ManagerId,
	state: SessionState,
	points: Vec<Vec3>,
	preview: PreviewLine,
}

impl DrawingManager {
	pub fn new(id: ManagerId) -> Self {
		Self { id, state: SessionState::Idle, points: Vec::new(), preview: PreviewLine::default() }
	}

	pub fn id(&self) -> ManagerId {
		self.id
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn points(&self) -> &[Vec3] {
		&self.points
	}

	pub fn preview(&self) -> &PreviewLine {
		&self.preview
	}

	/// Starts a session with `config`, validated first.
	///
	/// Rejected while any manager, this one included, owns the slot.
	pub fn activate(
		&mut self,
		slot: &mut SessionSlot,
		mut config: MeshConfig,
	) -> Result<Vec<ConfigCorrection>, SessionError> {
		if let Some(owner) = slot.owner() {
			log::warn!("{} cannot start drawing: session busy with {}", self.id, owner);
			return Err(SessionError::SessionBusy { owner });
		}

		let corrections = config.validate();
		slot.claim(self.id, config)?;

		self.points.clear();
		self.preview.clear();
		self.preview.set_enabled(true);
		self.state = SessionState::Active;
		log::info!("{} started drawing", self.id);
		Ok(corrections)
	}

	/// Appends a world-space point and refreshes the preview.
	pub fn place_point(
		&mut self,
		slot: &SessionSlot,
		probe: &dyn GroundProbe,
		point: Vec3,
	) -> Result<(), SessionError> {
		let config = slot.config_for(self.id)?;
		self.points.push(point);
		self.refresh_preview(config, probe);
		log::debug!("{} placed point {} at {:?}", self.id, self.points.len(), point);
		Ok(())
	}

	/// Probes the ground along `ray` and places a point at the hit.
	pub fn place_point_from_ray(
		&mut self,
		slot: &SessionSlot,
		probe: &dyn GroundProbe,
		ray: Ray3d,
	) -> Result<Vec3, SessionError> {
		let config = slot.config_for(self.id)?;
		let hit = probe
			.raycast(ray, PICK_DISTANCE, config.ground_layers)
			.ok_or(SessionError::NoGroundHit)?;
		self.place_point(slot, probe, hit.point)?;
		Ok(hit.point)
	}

	pub fn delete_last_point(
		&mut self,
		slot: &SessionSlot,
		probe: &dyn GroundProbe,
	) -> Result<Vec3, SessionError> {
		let config = slot.config_for(self.id)?;
		let removed = self.points.pop().ok_or(SessionError::NoPoints)?;
		self.refresh_preview(config, probe);
		Ok(removed)
	}

	/// Generates the surface from the placed points and ends the session.
	///
	/// On failure nothing changes. Fill problems are logged and leave the surface unfilled.
	pub fn finalize(
		&mut self,
		slot: &mut SessionSlot,
		probe: &dyn GroundProbe,
	) -> Result<GeneratedPolygon, SessionError> {
		let config = slot.config_for(self.id)?.clone();
		if self.points.len() < MIN_POLYGON_POINTS {
			log::warn!(
				"{} cannot finalize with {} point(s), {} required",
				self.id,
				self.points.len(),
				MIN_POLYGON_POINTS
			);
			return Err(SessionError::InsufficientPoints {
				required: MIN_POLYGON_POINTS,
				actual: self.points.len(),
			});
		}

		let conformer = config.conformer(probe);
		let curve = generate_curve(&self.points, true, CurveOptions::from(&config), &conformer);
		let mesh = PolygonMeshAssembler::new(&config, conformer).assemble(&curve)?;
		let boundary = polygon::distinct_ring(&curve);

		let fill = match FillPlacer::from_config(&config, conformer).place(&boundary) {
			Ok(fill) => fill,
			Err(e) => {
				log::warn!("{} skipped filling: {}", self.id, e);
				Vec::new()
			}
		};

		slot.release(self.id);
		self.points.clear();
		self.preview.clear();
		self.state = SessionState::Finalized;
		log::info!(
			"{} finalized polygon: {} vertices, {} fill objects",
			self.id,
			mesh.vertex_count(),
			fill.len()
		);

		Ok(GeneratedPolygon { manager: self.id, mesh, boundary, fill, config })
	}

	/// Discards points and preview and returns to idle, releasing the slot if held.
	pub fn reset(&mut self, slot: &mut SessionSlot) {
		if slot.release(self.id) {
			log::info!("{} released the drawing session", self.id);
		}
		self.points.clear();
		self.preview.clear();
		self.state = SessionState::Idle;
	}

	fn refresh_preview(&mut self, config: &MeshConfig, probe: &dyn GroundProbe) {
		let closed = self.points.len() >= MIN_POLYGON_POINTS;
		let conformer = config.conformer(probe);
		let positions =
			generate_curve(&self.points, closed, CurveOptions::from(config), &conformer);
		self.preview.set_positions(positions);
	}
}
