pub mod assembler;
pub mod behavior;
pub mod config;
pub mod curve;
pub mod fill;
pub mod plugin;
pub mod polygon;
pub mod preview;
pub mod session;

pub use assembler::{AssemblyError, CenterClosure, MeshBounds, PolygonMesh, PolygonMeshAssembler};
pub use behavior::{BehaviorTemplate, Bob, Fertile, Spin};
pub use config::{ConfigCorrection, ConfigError, CurveType, MeshConfig, MeshConfigSet};
pub use curve::{generate_curve, CurveOptions};
pub use fill::{FillError, FillPlacer};
pub use plugin::{
	DrawingCommand, DrawingManagers, FillObject, FillTemplate, FillTemplates, GeneratedSurface,
	GroundResource, PaintMeshPlugin, PointMarker, PolygonFinalized, SurfaceCollider,
};
pub use preview::PreviewLine;
pub use session::{
	DrawingManager, GeneratedPolygon, ManagerId, SessionError, SessionSlot, SessionState,
};

pub use ground;

// Hosts should:
// - build a `MeshConfigSet` (in code or from JSON)
// - add `PaintMeshPlugin` with their ground probe
// - register fill templates in `FillTemplates`
// - send `DrawingCommand` messages from their input handling
