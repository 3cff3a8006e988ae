//! Horizontal-plane helpers for closed point loops.
//!
//! Loops are ordered `Vec3` sequences; only X and Z take part in the planar tests.

use bevy::prelude::*;

/// Distance under which two boundary points are treated as the same point.
pub const POINT_EPSILON: f32 = 1e-4;

/// Drops a trailing copy of the first point, if present.
pub fn strip_closing_point(points: &[Vec3]) -> &[Vec3] {
	match (points.first(), points.last()) {
		(Some(first), Some(last))
			if points.len() > 1 && first.distance_squared(*last) < POINT_EPSILON * POINT_EPSILON =>
		{
			&points[..points.len() - 1]
		}
		_ => points,
	}
}

/// Ring of distinct points: runs of near-equal neighbours collapse to their first point and
/// copies of the first point at the end are dropped.
pub fn distinct_ring(points: &[Vec3]) -> Vec<Vec3> {
	let same = |a: Vec3, b: Vec3| a.distance_squared(b) < POINT_EPSILON * POINT_EPSILON;
	let mut ring: Vec<Vec3> = Vec::with_capacity(points.len());
	for p in points {
		if !ring.last().is_some_and(|last| same(*last, *p)) {
			ring.push(*p);
		}
	}
	while ring.len() > 1 && same(ring[0], ring[ring.len() - 1]) {
		ring.pop();
	}
	ring
}

/// Arithmetic mean of the points.
pub fn centroid(points: &[Vec3]) -> Option<Vec3> {
	if points.is_empty() {
		return None;
	}
	Some(points.iter().copied().sum::<Vec3>() / points.len() as f32)
}

/// Axis-aligned XZ bounds as `(min, max)`, with x in `.x` and z in `.y`.
pub fn bounds_xz(points: &[Vec3]) -> Option<(Vec2, Vec2)> {
	let first = points.first()?;
	let start = (first.xz(), first.xz());
	Some(points.iter().fold(start, |(min, max), p| (min.min(p.xz()), max.max(p.xz()))))
}

/// Shoelace area over X and Z. Positive when the loop turns from +X toward +Z.
pub fn signed_area_xz(points: &[Vec3]) -> f32 {
	let n = points.len();
	if n < 3 {
		return 0.0;
	}
	let twice: f32 = (0..n)
		.map(|i| {
			let a = points[i];
			let b = points[(i + 1) % n];
			a.x * b.z - b.x * a.z
		})
		.sum();
	twice * 0.5
}

/// Odd/even ray-crossing test on the XZ plane.
///
/// An edge counts when exactly one of its endpoints is at or below `p.z`, so vertices shared by
/// two edges are counted once.
pub fn point_in_polygon_xz(p: Vec3, polygon: &[Vec3]) -> bool {
	let n = polygon.len();
	if n < 3 {
		return false;
	}

	let mut inside = false;
	let mut j = n - 1;
	for i in 0..n {
		let a = polygon[i];
		let b = polygon[j];
		if (a.z <= p.z) != (b.z <= p.z) {
			let x = a.x + (p.z - a.z) * (b.x - a.x) / (b.z - a.z);
			if p.x < x {
				inside = !inside;
			}
		}
		j = i;
	}
	inside
}
