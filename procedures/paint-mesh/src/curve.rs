use crate::config::{CurveType, MeshConfig};
use bevy::prelude::*;
use ground::GroundConformer;

/// Fillet amounts and radii below this are treated as zero.
const FILLET_EPSILON: f32 = 1e-4;

/// Curve settings taken from a [`MeshConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveOptions {
	pub curve_type: CurveType,
	pub segments: u32,
	pub fillet_amount: f32,
}

impl From<&MeshConfig> for CurveOptions {
	fn from(config: &MeshConfig) -> Self {
		Self {
			curve_type: config.curve_type,
			segments: config.curve_segments,
			fillet_amount: config.fillet_amount,
		}
	}
}

/// Turns control points into a sampled boundary.
///
/// Closed output ends on its first point. Spline and fillet samples are ground-conformed;
/// `CurveType::None` returns the control points untouched.
pub fn generate_curve(
	points: &[Vec3],
	closed: bool,
	options: CurveOptions,
	conformer: &GroundConformer,
) -> Vec<Vec3> {
	if points.is_empty() {
		return Vec::new();
	}

	let segments =
		options.segments.clamp(MeshConfig::MIN_CURVE_SEGMENTS, MeshConfig::MAX_CURVE_SEGMENTS);
	match options.curve_type {
		CurveType::None => straight(points, closed),
		CurveType::CatmullRom => catmull_rom(points, closed, segments, conformer),
		CurveType::FilletCorners if options.fillet_amount < FILLET_EPSILON => {
			straight(points, closed)
		}
		CurveType::FilletCorners => {
			fillet_corners(points, closed, segments, options.fillet_amount, conformer)
		}
	}
}

fn straight(points: &[Vec3], closed: bool) -> Vec<Vec3> {
	let mut out = points.to_vec();
	if closed {
		out.push(points[0]);
	}
	out
}

/// Uniform Catmull-Rom position at `t` on the span from `p1` to `p2`.
pub fn catmull_rom_point(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
	let t2 = t * t;
	let t3 = t2 * t;
	0.5 * ((2.0 * p1)
		+ (p2 - p0) * t
		+ (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
		+ (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// Control points with the neighbours needed to evaluate every span.
fn pad_for_spline(points: &[Vec3], closed: bool) -> Vec<Vec3> {
	let n = points.len();
	let mut padded = Vec::with_capacity(n + 3);
	if closed {
		padded.push(points[n - 1]);
		padded.extend_from_slice(points);
		padded.push(points[0]);
		padded.push(points[1 % n]);
	} else {
		padded.push(points[0]);
		padded.extend_from_slice(points);
		padded.push(points[n - 1]);
	}
	while padded.len() < 4 {
		padded.push(points[n - 1]);
	}
	padded
}

fn catmull_rom(
	points: &[Vec3],
	closed: bool,
	segments: u32,
	conformer: &GroundConformer,
) -> Vec<Vec3> {
	let padded = pad_for_spline(points, closed);
	let spans = padded.len() - 3;
	let mut out = Vec::with_capacity(spans * segments as usize + 1);

	for span in 0..spans {
		let [p0, p1, p2, p3] = [padded[span], padded[span + 1], padded[span + 2], padded[span + 3]];
		for j in 0..=segments {
			// the first sample repeats the previous span's last one
			if span > 0 && j == 0 {
				continue;
			}
			let t = j as f32 / segments as f32;
			out.push(conformer.conform(catmull_rom_point(p0, p1, p2, p3, t)));
		}
	}

	log::debug!("Catmull-Rom curve: {} control points -> {} samples", points.len(), out.len());
	out
}

/// Rounded corner around a control point.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fillet {
	start: Vec3,
	corner: Vec3,
	end: Vec3,
	radius: f32,
}

impl Fillet {
	fn new(prev: Vec3, corner: Vec3, next: Vec3, amount: f32) -> Self {
		let incoming = corner - prev;
		let outgoing = next - corner;
		let shorter = incoming.length().min(outgoing.length());
		let radius = amount.min(shorter * 0.5).clamp(0.0, 1.0);

		let start = corner - incoming.normalize_or_zero() * radius;
		let end = corner + outgoing.normalize_or_zero() * radius;
		Self { start, corner, end, radius }
	}

	/// A corner left sharp.
	fn sharp(corner: Vec3) -> Self {
		Self { start: corner, corner, end: corner, radius: 0.0 }
	}

	/// Quadratic Bézier from `start` through the corner's pull to `end`, excluding `start`.
	fn arc(&self, segments: u32, out: &mut Vec<Vec3>, conformer: &GroundConformer) {
		if self.radius < FILLET_EPSILON {
			return;
		}
		for k in 1..=segments {
			let t = k as f32 / segments as f32;
			let u = 1.0 - t;
			let p = u * u * self.start + 2.0 * u * t * self.corner + t * t * self.end;
			out.push(conformer.conform(p));
		}
	}
}

/// Straight run from `from` to `to`, excluding `from`, split so long edges follow the ground.
fn straight_run(
	from: Vec3,
	to: Vec3,
	segments: u32,
	out: &mut Vec<Vec3>,
	conformer: &GroundConformer,
) {
	if from.distance_squared(to) < FILLET_EPSILON * FILLET_EPSILON {
		return;
	}
	for k in 1..=segments {
		let t = k as f32 / segments as f32;
		out.push(conformer.conform(from.lerp(to, t)));
	}
}

fn fillet_corners(
	points: &[Vec3],
	closed: bool,
	segments: u32,
	amount: f32,
	conformer: &GroundConformer,
) -> Vec<Vec3> {
	let n = points.len();
	let fillets: Vec<Fillet> = (0..n)
		.map(|i| {
			let has_neighbours = closed || (i > 0 && i + 1 < n);
			if n < 3 || !has_neighbours {
				return Fillet::sharp(points[i]);
			}
			let prev = points[(i + n - 1) % n];
			let next = points[(i + 1) % n];
			Fillet::new(prev, points[i], next, amount)
		})
		.collect();

	let mut out = Vec::new();
	let first = if closed { fillets[0].start } else { points[0] };
	out.push(conformer.conform(first));

	let mut cursor = first;
	for (i, fillet) in fillets.iter().enumerate() {
		if i == 0 && !closed {
			continue;
		}
		if !(i == 0 && closed) {
			straight_run(cursor, fillet.start, segments, &mut out, conformer);
		}
		fillet.arc(segments, &mut out, conformer);
		cursor = fillet.end;
	}

	// open loops already ended on their sharp last point
	if closed {
		straight_run(cursor, fillets[0].start, segments, &mut out, conformer);
		let start = out[0];
		if let Some(last) = out.last_mut() {
			*last = start;
		}
	}

	log::debug!("Fillet curve: {} control points -> {} samples", n, out.len());
	out
}
