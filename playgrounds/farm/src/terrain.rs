use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use ground::{HeightfieldGround, LayerError, LayerMask, LayerNames};
use noise::{NoiseFn, Perlin};

/// Ground layer of the farm terrain.
pub const TERRAIN_LAYER: u8 = 0;

/// Ground layers configurations can refer to by name.
pub fn ground_layers() -> Result<LayerNames, LayerError> {
	let mut layers = LayerNames::new();
	layers.register("terrain", TERRAIN_LAYER)?;
	Ok(layers)
}

/// Rolling farmland heights from layered Perlin noise.
#[derive(Resource, Clone)]
pub struct FarmTerrain {
	perlin: Perlin,
	/// Peak height in meters
	pub height_scale: f32,
	/// Base noise frequency
	pub frequency: f64,
	/// Side length of the square map in meters, centered on the origin
	pub size: f32,
}

impl FarmTerrain {
	pub fn new(seed: u32) -> Self {
		Self { perlin: Perlin::new(seed), height_scale: 3.0, frequency: 0.02, size: 200.0 }
	}

	/// Terrain height at `(x, z)`, `None` off the map.
	pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
		let half = self.size * 0.5;
		if x.abs() > half || z.abs() > half {
			return None;
		}

		let mut height = 0.0;
		let mut amplitude = 1.0;
		let mut frequency = self.frequency;
		let mut max_value = 0.0;

		for _ in 0..4 {
			let sample = self.perlin.get([x as f64 * frequency, z as f64 * frequency]) as f32;
			height += sample * amplitude;
			max_value += amplitude;
			amplitude *= 0.5;
			frequency *= 2.0;
		}

		Some((height / max_value) * self.height_scale)
	}

	/// Probe used by the drawing tools.
	pub fn probe(&self) -> FarmGround {
		let terrain = self.clone();
		HeightfieldGround::new(Box::new(move |x: f32, z: f32| terrain.height_at(x, z)) as HeightFn)
			.on_layers(LayerMask::layer(TERRAIN_LAYER))
			.with_step(0.5)
	}

	/// Grid mesh of the terrain with `resolution` quads per side.
	pub fn mesh(&self, resolution: u32) -> Mesh {
		let resolution = resolution.max(1);
		let n = resolution + 1;
		let half = self.size * 0.5;
		let step = self.size / resolution as f32;

		let height = |x: f32, z: f32| self.height_at(x, z).unwrap_or(0.0);

		let mut positions = Vec::with_capacity((n * n) as usize);
		let mut normals = Vec::with_capacity((n * n) as usize);
		let mut uvs = Vec::with_capacity((n * n) as usize);
		for iz in 0..n {
			for ix in 0..n {
				let x = -half + ix as f32 * step;
				let z = -half + iz as f32 * step;
				positions.push([x, height(x, z), z]);

				// central differences, clamped at the map edge
				let dx = height((x + step).min(half), z) - height((x - step).max(-half), z);
				let dz = height(x, (z + step).min(half)) - height(x, (z - step).max(-half));
				let normal = Vec3::new(-dx, 2.0 * step, -dz).normalize_or(Vec3::Y);
				normals.push(normal.to_array());

				uvs.push([ix as f32 / resolution as f32, iz as f32 / resolution as f32]);
			}
		}

		let mut indices = Vec::with_capacity((resolution * resolution * 6) as usize);
		for iz in 0..resolution {
			for ix in 0..resolution {
				let i = iz * n + ix;
				// counter-clockwise seen from above
				indices.extend_from_slice(&[i, i + n, i + 1, i + 1, i + n, i + n + 1]);
			}
		}

		let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD);
		mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
		mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
		mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
		mesh.insert_indices(Indices::U32(indices));
		mesh
	}
}

pub type HeightFn = Box<dyn Fn(f32, f32) -> Option<f32> + Send + Sync>;

/// Ground probe over [`FarmTerrain`].
pub type FarmGround = HeightfieldGround<HeightFn>;

#[derive(Component)]
pub struct FarmGroundMesh;

pub fn setup_ground(
	mut commands: Commands,
	mut meshes: ResMut<Assets<Mesh>>,
	mut materials: ResMut<Assets<StandardMaterial>>,
	terrain: Res<FarmTerrain>,
) {
	let mesh = meshes.add(terrain.mesh(160));
	let material = materials.add(StandardMaterial {
		base_color: Color::srgb(0.33, 0.55, 0.24),
		perceptual_roughness: 1.0,
		..default()
	});

	commands.spawn((Mesh3d(mesh), MeshMaterial3d(material), Transform::IDENTITY, FarmGroundMesh));
	log::info!("Spawned {}m farm terrain", terrain.size);
}
