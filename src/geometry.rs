//! Pure geometric helpers: normalization, polygon construction and
//! distances, boundary projection
//!
//! Everything here is side-effect free. Polygons are `geo` types; positions
//! and directions are [`Vec2`].

use geo::{EuclideanDistance, LineInterpolatePoint, LineLocatePoint, Translate};
use geo_types::{Coord, LineString, Point, Polygon};

use crate::core::error::{FlockError, Result};
use crate::core::types::Vec2;

/// Normalize a vector to unit length.
///
/// Fails with [`FlockError::ZeroMagnitude`] for the zero vector. Callers
/// substitute the zero vector rather than propagating NaN.
pub fn try_normalize(v: Vec2) -> Result<Vec2> {
    let len = v.length();
    if len == 0.0 {
        return Err(FlockError::ZeroMagnitude);
    }
    Ok(Vec2::new(v.x / len, v.y / len))
}

/// Normalize, recovering the zero vector for zero-magnitude input.
pub fn normalize_or_zero(v: Vec2) -> Vec2 {
    try_normalize(v).unwrap_or(Vec2::ZERO)
}

/// Build a closed polygon from vertices in ring order.
pub fn polygon_from_points(points: &[Vec2]) -> Polygon<f32> {
    let mut coords: Vec<Coord<f32>> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    Polygon::new(LineString::from(coords), vec![])
}

/// Exterior-ring vertices of a polygon, without the closing duplicate.
pub fn exterior_points(poly: &Polygon<f32>) -> Vec<Vec2> {
    let coords = &poly.exterior().0;
    let end = coords.len().saturating_sub(1);
    coords[..end].iter().map(|c| Vec2::new(c.x, c.y)).collect()
}

/// True if the vertices form a valid closed simple polygon: at least three
/// finite vertices and no two non-adjacent edges crossing.
pub fn is_simple_polygon(points: &[Vec2]) -> bool {
    if points.len() < 3 {
        return false;
    }
    if points.iter().any(|p| !p.is_finite()) {
        return false;
    }
    !is_self_intersecting(points)
}

/// Distance from a point to a polygon (zero inside).
pub fn point_distance(poly: &Polygon<f32>, p: Vec2) -> f32 {
    poly.euclidean_distance(&Point::new(p.x, p.y))
}

/// Minimum distance between two polygons (zero when overlapping).
pub fn polygon_distance(a: &Polygon<f32>, b: &Polygon<f32>) -> f32 {
    a.euclidean_distance(b)
}

/// Closest point on a polygon's exterior ring to `p`: project onto the ring
/// by arc-length fraction, then interpolate back to a coordinate.
pub fn closest_boundary_point(poly: &Polygon<f32>, p: Vec2) -> Vec2 {
    let ring = poly.exterior();
    let projected = ring
        .line_locate_point(&Point::new(p.x, p.y))
        .and_then(|fraction| ring.line_interpolate_point(fraction));
    match projected {
        Some(q) => Vec2::new(q.x(), q.y()),
        // Degenerate ring (zero length); any vertex is as close as any other
        None => ring.0.first().map(|c| Vec2::new(c.x, c.y)).unwrap_or(p),
    }
}

/// Translate a polygon by an offset.
pub fn translate(poly: &Polygon<f32>, offset: Vec2) -> Polygon<f32> {
    poly.translate(offset.x, offset.y)
}

/// Grow a polygon by pushing each vertex away from the vertex centroid by
/// `margin`. Exact for the rectangle footprints agents carry; conservative
/// for other convex shapes.
pub fn inflate(poly: &Polygon<f32>, margin: f32) -> Polygon<f32> {
    let points = exterior_points(poly);
    let n = points.len().max(1) as f32;
    let centroid = points
        .iter()
        .fold(Vec2::ZERO, |acc, p| acc + *p)
        * (1.0 / n);
    let pushed: Vec<Vec2> = points
        .iter()
        .map(|p| *p + normalize_or_zero(*p - centroid) * margin)
        .collect();
    polygon_from_points(&pushed)
}

/// Polygonal approximation of a circle, counter-clockwise.
pub fn circle_polygon(center: Vec2, radius: f32, segments: usize) -> Polygon<f32> {
    let n = segments.max(3);
    let points: Vec<Vec2> = (0..n)
        .map(|i| {
            let angle = (i as f32) / (n as f32) * std::f32::consts::TAU;
            Vec2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect();
    polygon_from_points(&points)
}

/// Check if polygon edges intersect each other (excluding adjacent edges)
fn is_self_intersecting(points: &[Vec2]) -> bool {
    let n = points.len();
    if n < 4 {
        return false; // Triangle can't self-intersect
    }

    for i in 0..n {
        let a1 = points[i];
        let a2 = points[(i + 1) % n];

        for j in (i + 2)..n {
            // Skip adjacent edges
            if j == (i + n - 1) % n {
                continue;
            }

            let b1 = points[j];
            let b2 = points[(j + 1) % n];

            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

/// Check if two line segments intersect (proper intersection, not touching)
fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = cross_sign(b1, b2, a1);
    let d2 = cross_sign(b1, b2, a2);
    let d3 = cross_sign(a1, a2, b1);
    let d4 = cross_sign(a1, a2, b2);

    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn cross_sign(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon<f32> {
        polygon_from_points(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ])
    }

    #[test]
    fn test_normalize_zero_fails() {
        assert!(matches!(try_normalize(Vec2::ZERO), Err(FlockError::ZeroMagnitude)));
        assert_eq!(normalize_or_zero(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_normalize_unit_length() {
        let v = try_normalize(Vec2::new(3.0, 4.0)).unwrap();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!((v.x - 0.6).abs() < 1e-6);
        assert!((v.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_point_distance_outside_and_inside() {
        let square = unit_square();
        assert!((point_distance(&square, Vec2::new(3.0, 0.5)) - 2.0).abs() < 1e-5);
        assert_eq!(point_distance(&square, Vec2::new(0.5, 0.5)), 0.0);
    }

    #[test]
    fn test_closest_boundary_point_projects_onto_edge() {
        let square = unit_square();
        let cp = closest_boundary_point(&square, Vec2::new(0.5, 3.0));
        assert!((cp.x - 0.5).abs() < 1e-4);
        assert!((cp.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_closest_boundary_point_from_inside() {
        // Projection still lands on the ring, not the interior
        let square = unit_square();
        let cp = closest_boundary_point(&square, Vec2::new(0.5, 0.9));
        assert!((cp.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_simple_polygon_detection() {
        let square = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert!(is_simple_polygon(&square));

        // Bowtie: edges cross
        let bowtie = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ];
        assert!(!is_simple_polygon(&bowtie));

        assert!(!is_simple_polygon(&[Vec2::ZERO, Vec2::new(1.0, 0.0)]));
        assert!(!is_simple_polygon(&[
            Vec2::new(f32::NAN, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
        ]));
    }

    #[test]
    fn test_inflate_grows_rectangle() {
        let square = unit_square();
        let grown = inflate(&square, 0.5);
        let d = point_distance(&grown, Vec2::new(0.5, 0.5));
        assert_eq!(d, 0.0);
        // A point just outside the original square is now inside
        assert_eq!(point_distance(&grown, Vec2::new(1.2, 1.2)), 0.0);
    }

    #[test]
    fn test_translate_moves_polygon() {
        let square = unit_square();
        let moved = translate(&square, Vec2::new(10.0, -2.0));
        let points = exterior_points(&moved);
        assert!((points[0].x - 10.0).abs() < 1e-6);
        assert!((points[0].y + 2.0).abs() < 1e-6);
    }
}
