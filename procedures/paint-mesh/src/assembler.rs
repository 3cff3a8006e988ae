use crate::config::MeshConfig;
use crate::polygon;
use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use ground::GroundConformer;
use thiserror::Error;

/// Innermost scales below this close the center with a single centroid vertex.
const CENTROID_EPSILON: f32 = 1e-4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
	#[error("polygon needs at least 3 unique boundary points, got {0}")]
	TooFewPoints(usize),
}

/// How the middle of the polygon is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterClosure {
	/// Fan from the inner ring to one centroid vertex; no innermost ring is emitted.
	Centroid,
	/// Fan across the innermost ring.
	InnermostFan,
}

/// Local-space axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
	pub min: Vec3,
	pub max: Vec3,
}

/// Triangulated ringed polygon, positioned relative to its world-space centroid.
///
/// Vertex layout: outer ring `[0, n)`, inner ring `[n, 2n)`, then either the innermost ring
/// `[2n, 3n)` or the centroid at `2n`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonMesh {
	pub positions: Vec<[f32; 3]>,
	pub normals: Vec<[f32; 3]>,
	pub uvs: Vec<[f32; 2]>,
	pub indices: Vec<u32>,
	/// World-space centroid; positions are relative to it
	pub centroid: Vec3,
	pub bounds: MeshBounds,
	/// Vertices per ring
	pub ring_len: usize,
	pub closure: CenterClosure,
}

impl PolygonMesh {
	pub fn vertex_count(&self) -> usize {
		self.positions.len()
	}

	pub fn triangle_count(&self) -> usize {
		self.indices.len() / 3
	}

	pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
		self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
	}

	/// Unnormalized face normal of a triangle.
	pub fn face_normal(&self, triangle: [u32; 3]) -> Vec3 {
		let [a, b, c] = triangle.map(|i| Vec3::from(self.positions[i as usize]));
		(b - a).cross(c - a)
	}

	pub fn to_mesh(&self) -> Mesh {
		let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
		mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone());
		mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone());
		mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone());
		mesh.insert_indices(Indices::U32(self.indices.clone()));
		mesh
	}
}

/// Builds the three-ring surface mesh from a closed boundary.
pub struct PolygonMeshAssembler<'a> {
	config: &'a MeshConfig,
	conformer: GroundConformer<'a>,
}

impl<'a> PolygonMeshAssembler<'a> {
	pub fn new(config: &'a MeshConfig, conformer: GroundConformer<'a>) -> Self {
		Self { config, conformer }
	}

	/// Repeated consecutive points and a trailing copy of the first point are ignored.
	pub fn assemble(&self, boundary: &[Vec3]) -> Result<PolygonMesh, AssemblyError> {
		let outer = polygon::distinct_ring(boundary);
		let n = outer.len();
		if n < 3 {
			return Err(AssemblyError::TooFewPoints(n));
		}

		if polygon::signed_area_xz(&outer).abs() < polygon::POINT_EPSILON * polygon::POINT_EPSILON {
			log::warn!("Polygon of {} points has no area on the ground plane", n);
		}

		let Some(mean) = polygon::centroid(&outer) else {
			return Err(AssemblyError::TooFewPoints(n));
		};
		let centroid = self.conformer.conform(mean);

		let ring = |scale: f32| -> Vec<Vec3> {
			outer.iter().map(|p| self.conformer.conform(centroid + (*p - centroid) * scale)).collect()
		};
		let inner = ring(self.config.inner_loop_scale);
		let closure = if self.config.innermost_loop_scale < CENTROID_EPSILON {
			CenterClosure::Centroid
		} else {
			CenterClosure::InnermostFan
		};

		// ---------- vertices ------------------------------------------------------
		let mut world: Vec<Vec3> = Vec::with_capacity(3 * n);
		world.extend_from_slice(&outer);
		world.extend(inner);
		match closure {
			CenterClosure::Centroid => world.push(centroid),
			CenterClosure::InnermostFan => world.extend(ring(self.config.innermost_loop_scale)),
		}

		let uvs = planar_uvs(&world);
		let local: Vec<Vec3> = world.iter().map(|p| *p - centroid).collect();

		// ---------- triangles -----------------------------------------------------
		let invert = self.config.invert_normals;
		let n32 = n as u32;
		let mut indices = Vec::with_capacity(3 * (5 * n));
		strip(&mut indices, 0, n32, n32, invert);
		match closure {
			CenterClosure::Centroid => centroid_fan(&mut indices, n32, 2 * n32, n32, invert),
			CenterClosure::InnermostFan => {
				strip(&mut indices, n32, 2 * n32, n32, invert);
				innermost_fan(&mut indices, 2 * n32, n32, invert);
			}
		}

		let normals = smooth_normals(&local, &indices);
		let bounds = local.iter().fold(
			MeshBounds { min: Vec3::splat(f32::MAX), max: Vec3::splat(f32::MIN) },
			|b, p| MeshBounds { min: b.min.min(*p), max: b.max.max(*p) },
		);

		log::debug!(
			"Assembled polygon mesh: {} vertices, {} triangles, closure {:?}",
			local.len(),
			indices.len() / 3,
			closure
		);

		Ok(PolygonMesh {
			positions: local.iter().map(|p| p.to_array()).collect(),
			normals,
			uvs,
			indices,
			centroid,
			bounds,
			ring_len: n,
			closure,
		})
	}
}

/// XZ projection normalized to the bounding box of all vertices.
fn planar_uvs(points: &[Vec3]) -> Vec<[f32; 2]> {
	let Some((min, max)) = polygon::bounds_xz(points) else {
		return Vec::new();
	};
	let mut extent = max - min;
	if extent.x <= 0.0 {
		extent.x = 1.0;
	}
	if extent.y <= 0.0 {
		extent.y = 1.0;
	}
	points.iter().map(|p| ((p.xz() - min) / extent).to_array()).collect()
}

fn push_triangle(indices: &mut Vec<u32>, a: u32, b: u32, c: u32, invert: bool) {
	if invert {
		indices.extend_from_slice(&[a, c, b]);
	} else {
		indices.extend_from_slice(&[a, b, c]);
	}
}

/// Two triangles per segment between ring `a` and ring `b`.
fn strip(indices: &mut Vec<u32>, a: u32, b: u32, n: u32, invert: bool) {
	for i in 0..n {
		let j = (i + 1) % n;
		push_triangle(indices, a + i, b + i, a + j, invert);
		push_triangle(indices, a + j, b + i, b + j, invert);
	}
}

fn centroid_fan(indices: &mut Vec<u32>, ring: u32, center: u32, n: u32, invert: bool) {
	for i in 0..n {
		let j = (i + 1) % n;
		push_triangle(indices, ring + i, center, ring + j, invert);
	}
}

/// Fan from the ring's first vertex to every non-adjacent pair.
fn innermost_fan(indices: &mut Vec<u32>, ring: u32, n: u32, invert: bool) {
	for i in 1..n - 1 {
		push_triangle(indices, ring, ring + i + 1, ring + i, invert);
	}
}

/// Area-weighted vertex normals.
fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<[f32; 3]> {
	let mut accumulated = vec![Vec3::ZERO; positions.len()];
	for triangle in indices.chunks_exact(3) {
		let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
		let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
		accumulated[a] += face;
		accumulated[b] += face;
		accumulated[c] += face;
	}
	accumulated.into_iter().map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use ground::{FlatGround, HeightfieldGround};

	fn unit_square() -> Vec<Vec3> {
		vec![
			Vec3::new(0.0, 0.0, 0.0),
			Vec3::new(1.0, 0.0, 0.0),
			Vec3::new(1.0, 0.0, 1.0),
			Vec3::new(0.0, 0.0, 1.0),
		]
	}

	fn config(inner: f32, innermost: f32, invert: bool) -> MeshConfig {
		MeshConfig {
			inner_loop_scale: inner,
			innermost_loop_scale: innermost,
			invert_normals: invert,
			ground_offset: 0.0,
			..Default::default()
		}
	}

	#[test]
	fn test_unit_square_with_centroid() {
		let ground = FlatGround::new(0.0);
		let config = config(0.5, 0.0, false);
		let assembler = PolygonMeshAssembler::new(&config, config.conformer(&ground));

		let mesh = assembler.assemble(&unit_square()).unwrap();
		assert_eq!(mesh.vertex_count(), 9);
		assert_eq!(mesh.triangle_count(), 12);
		assert_eq!(mesh.closure, CenterClosure::Centroid);
		assert_eq!(mesh.centroid, Vec3::new(0.5, 0.0, 0.5));

		// inner ring halfway to the centroid, centroid last
		assert_eq!(mesh.positions[4], [-0.25, 0.0, -0.25]);
		assert_eq!(mesh.positions[8], [0.0, 0.0, 0.0]);
		assert_eq!(
			mesh.bounds,
			MeshBounds { min: Vec3::new(-0.5, 0.0, -0.5), max: Vec3::new(0.5, 0.0, 0.5) }
		);
	}

	#[test]
	fn test_trailing_duplicate_ignored() {
		let ground = FlatGround::new(0.0);
		let config = config(0.5, 0.0, false);
		let assembler = PolygonMeshAssembler::new(&config, config.conformer(&ground));

		let mut closed = unit_square();
		closed.push(closed[0]);
		assert_eq!(assembler.assemble(&closed).unwrap().vertex_count(), 9);
	}

	#[test]
	fn test_strip_counts_and_innermost_fan() {
		let ground = FlatGround::new(0.0);
		let config = config(0.6, 0.3, false);
		let assembler = PolygonMeshAssembler::new(&config, config.conformer(&ground));

		let pentagon: Vec<Vec3> = (0..5)
			.map(|i| {
				let angle = i as f32 * std::f32::consts::TAU / 5.0;
				Vec3::new(angle.cos(), 0.0, angle.sin())
			})
			.collect();
		let mesh = assembler.assemble(&pentagon).unwrap();

		assert_eq!(mesh.closure, CenterClosure::InnermostFan);
		assert_eq!(mesh.vertex_count(), 15);
		// two strips of 2n plus an (n - 2) fan
		assert_eq!(mesh.triangle_count(), 2 * 5 + 2 * 5 + 3);
	}

	#[test]
	fn test_triangle_has_single_innermost_triangle() {
		let ground = FlatGround::new(0.0);
		let config = config(0.6, 0.3, false);
		let assembler = PolygonMeshAssembler::new(&config, config.conformer(&ground));

		let triangle = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0)];
		let mesh = assembler.assemble(&triangle).unwrap();
		assert_eq!(mesh.triangle_count(), 6 + 6 + 1);
		let last = mesh.triangles().last().unwrap();
		assert!(last.iter().all(|i| *i >= 6));
	}

	#[test]
	fn test_invert_flips_winding() {
		let ground = FlatGround::new(0.0);
		for innermost in [0.0, 0.25] {
			let up = config(0.5, innermost, false);
			let down = config(0.5, innermost, true);
			let up_mesh = PolygonMeshAssembler::new(&up, up.conformer(&ground))
				.assemble(&unit_square())
				.unwrap();
			let down_mesh = PolygonMeshAssembler::new(&down, down.conformer(&ground))
				.assemble(&unit_square())
				.unwrap();

			assert_eq!(up_mesh.triangle_count(), down_mesh.triangle_count());
			for (a, b) in up_mesh.triangles().zip(down_mesh.triangles()) {
				assert_eq!([a[0], a[2], a[1]], b);
				assert!(up_mesh.face_normal(a).y > 0.0);
				assert!(down_mesh.face_normal(b).y < 0.0);
			}
			assert!(up_mesh.normals.iter().all(|n| n[1] > 0.99));
			assert!(down_mesh.normals.iter().all(|n| n[1] < -0.99));
		}
	}

	#[test]
	fn test_uvs_cover_unit_range() {
		let ground = FlatGround::new(0.0);
		let config = config(0.5, 0.0, false);
		let assembler = PolygonMeshAssembler::new(&config, config.conformer(&ground));

		let wide: Vec<Vec3> = unit_square().iter().map(|p| Vec3::new(p.x * 4.0, 0.0, p.z)).collect();
		let mesh = assembler.assemble(&wide).unwrap();
		assert_eq!(mesh.uvs[0], [0.0, 0.0]);
		assert_eq!(mesh.uvs[2], [1.0, 1.0]);
		assert_eq!(mesh.uvs[8], [0.5, 0.5]);
	}

	#[test]
	fn test_degenerate_uv_extent() {
		let line = [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
		let uvs = planar_uvs(&line);
		assert_eq!(uvs, vec![[0.0, 0.0], [0.5, 0.0], [1.0, 0.0]]);
	}

	#[test]
	fn test_rings_conform_to_ground() {
		let ground = HeightfieldGround::new(|x: f32, z: f32| Some(x - z));
		let config = MeshConfig { ground_offset: 0.2, ..config(0.5, 0.25, false) };
		let assembler = PolygonMeshAssembler::new(&config, config.conformer(&ground));

		let mesh = assembler.assemble(&unit_square()).unwrap();
		// outer ring is kept as given; inner rings and centroid follow the ground
		assert!((mesh.centroid.y - 0.2).abs() < 1e-5);
		for p in &mesh.positions[4..] {
			let world = Vec3::from(*p) + mesh.centroid;
			assert!((world.y - (world.x - world.z + 0.2)).abs() < 1e-4);
		}
	}

	#[test]
	fn test_too_few_points() {
		let ground = FlatGround::new(0.0);
		let config = MeshConfig::default();
		let assembler = PolygonMeshAssembler::new(&config, config.conformer(&ground));

		let two = [Vec3::ZERO, Vec3::X];
		assert_eq!(assembler.assemble(&two), Err(AssemblyError::TooFewPoints(2)));
		let closed_two = [Vec3::ZERO, Vec3::X, Vec3::ZERO];
		assert_eq!(assembler.assemble(&closed_two), Err(AssemblyError::TooFewPoints(2)));
		let repeated = [Vec3::ZERO, Vec3::X, Vec3::X, Vec3::X, Vec3::ZERO];
		assert_eq!(assembler.assemble(&repeated), Err(AssemblyError::TooFewPoints(2)));

		let mut square = unit_square();
		let corner = square[1];
		square.insert(2, corner);
		let mesh = assembler.assemble(&square).unwrap();
		assert_eq!(mesh.ring_len, 4);
	}

	#[test]
	fn test_to_mesh_attributes() {
		let ground = FlatGround::new(0.0);
		let config = config(0.5, 0.0, false);
		let polygon = PolygonMeshAssembler::new(&config, config.conformer(&ground))
			.assemble(&unit_square())
			.unwrap();

		let mesh = polygon.to_mesh();
		assert_eq!(mesh.count_vertices(), 9);
		assert_eq!(mesh.indices().map(|i| i.len()), Some(36));
	}
}
