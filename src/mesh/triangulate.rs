//! Display triangulation for polygon faces.
//!
//! Each polygon is projected onto its Newell plane and ear-clipped. At every
//! step the ear with the best shape (lowest aspect ratio) is clipped, so
//! n-gons come out as balanced triangles rather than a fan of slivers. When no
//! valid ear is left (degenerate or self-intersecting loops) the remainder is
//! fan-triangulated from its first corner. The output always holds exactly
//! k - 2 triangles for a k-gon and never touches the source mesh.

use bevy::prelude::*;

use super::poly_mesh::{newell_normal, FaceId, PolyMesh, VertexId};

/// Triangulate a set of faces for display.
///
/// Returns vertex ids flattened so that every consecutive run of three forms
/// one triangle. Faces with fewer than three corners contribute nothing.
pub fn triangulate_faces(mesh: &PolyMesh, faces: &[FaceId]) -> Vec<VertexId> {
    let positions = mesh.positions();
    faces
        .iter()
        .filter_map(|&f| mesh.faces.get(f as usize))
        .flat_map(|face| triangulate_polygon(&face.vertices, &positions))
        .flatten()
        .collect()
}

/// Triangulate one polygon loop given by vertex ids into `positions`.
pub fn triangulate_polygon(polygon: &[VertexId], positions: &[Vec3]) -> Vec<[VertexId; 3]> {
    match polygon.len() {
        0..=2 => return Vec::new(),
        3 => return vec![[polygon[0], polygon[1], polygon[2]]],
        _ => {}
    }

    let position = |v: VertexId| positions.get(v as usize).copied().unwrap_or(Vec3::ZERO);

    let normal = newell_normal(polygon, position).normalize_or_zero();
    if normal == Vec3::ZERO {
        return fan(polygon);
    }

    // Project to 2D for ear detection
    let (u_axis, v_axis) = make_orthonormal_basis(normal);
    let projected: Vec<Vec2> = polygon
        .iter()
        .map(|&v| {
            let p = position(v);
            Vec2::new(p.dot(u_axis), p.dot(v_axis))
        })
        .collect();

    // Loop positions still to be clipped
    let mut remaining: Vec<usize> = (0..polygon.len()).collect();
    let mut triangles = Vec::with_capacity(polygon.len() - 2);

    while remaining.len() > 3 {
        let n = remaining.len();
        let mut best: Option<(usize, f32)> = None;

        // Only reflex (or flat) corners can intrude into an ear
        let reflex: Vec<usize> = (0..n)
            .filter(|&k| {
                let a = projected[remaining[(k + n - 1) % n]];
                let b = projected[remaining[k]];
                let c = projected[remaining[(k + 1) % n]];
                cross_2d(b - a, c - a) <= 0.0
            })
            .collect();

        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;

            let a = projected[remaining[prev]];
            let b = projected[remaining[i]];
            let c = projected[remaining[next]];

            // Reflex or flat corner
            if cross_2d(b - a, c - a) <= 0.0 {
                continue;
            }

            let has_interior_point = reflex.iter().any(|&k| {
                k != prev
                    && k != i
                    && k != next
                    && point_in_triangle_2d(projected[remaining[k]], a, b, c)
            });
            if has_interior_point {
                continue;
            }

            let quality = aspect_ratio(a, b, c);
            if best.is_none_or(|(_, q)| quality < q) {
                best = Some((i, quality));
            }
        }

        let Some((ear, _)) = best else {
            break;
        };
        let prev = (ear + n - 1) % n;
        let next = (ear + 1) % n;
        triangles.push([
            polygon[remaining[prev]],
            polygon[remaining[ear]],
            polygon[remaining[next]],
        ]);
        remaining.remove(ear);
    }

    let rest: Vec<VertexId> = remaining.iter().map(|&i| polygon[i]).collect();
    triangles.extend(fan(&rest));
    triangles
}

/// Fan triangulation from the first corner.
fn fan(polygon: &[VertexId]) -> Vec<[VertexId; 3]> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    (1..polygon.len() - 1)
        .map(|i| [polygon[0], polygon[i], polygon[i + 1]])
        .collect()
}

/// Longest edge squared over area, normalized so an equilateral triangle scores 1.
fn aspect_ratio(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    let area = cross_2d(b - a, c - a).abs() * 0.5;
    if area <= f32::EPSILON {
        return f32::INFINITY;
    }
    let longest_sq = (b - a)
        .length_squared()
        .max((c - b).length_squared())
        .max((a - c).length_squared());
    longest_sq * 3.0_f32.sqrt() / (4.0 * area)
}

/// 2D cross product (z-component).
fn cross_2d(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Check if point P is inside triangle ABC (2D, using barycentric coordinates).
fn point_in_triangle_2d(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);

    let inv_denom = 1.0 / (dot00 * dot11 - dot01 * dot01);
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;

    u >= 0.0 && v >= 0.0 && u + v < 1.0
}

/// Build an orthonormal basis from a normal vector.
fn make_orthonormal_basis(normal: Vec3) -> (Vec3, Vec3) {
    let up = if normal.y.abs() < 0.99 {
        Vec3::Y
    } else {
        Vec3::X
    };
    let u = normal.cross(up).normalize();
    let v = normal.cross(u).normalize();
    (u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::poly_mesh::fixtures::*;
    use crate::mesh::poly_mesh::EdgeKey;
    use std::collections::HashMap;

    /// Count how often each undirected edge appears across the triangles.
    fn edge_usage(triangles: &[[VertexId; 3]]) -> HashMap<EdgeKey, usize> {
        let mut usage = HashMap::new();
        for t in triangles {
            for i in 0..3 {
                *usage.entry(EdgeKey::new(t[i], t[(i + 1) % 3])).or_insert(0) += 1;
            }
        }
        usage
    }

    fn signed_area(t: [VertexId; 3], positions: &[Vec3]) -> f32 {
        let [a, b, c] = t.map(|v| positions[v as usize]);
        (b - a).cross(c - a).z * 0.5
    }

    #[test]
    fn octagon_yields_six_triangles() {
        let mesh = regular_polygon(8);
        let flat = triangulate_faces(&mesh, &[0]);
        assert_eq!(flat.len(), 18);

        let triangles: Vec<[VertexId; 3]> =
            flat.chunks(3).map(|c| [c[0], c[1], c[2]]).collect();
        let usage = edge_usage(&triangles);
        for i in 0..8 {
            let boundary = EdgeKey::new(i, (i + 1) % 8);
            assert_eq!(usage.get(&boundary), Some(&1), "boundary edge {boundary:?}");
        }
        // Interior diagonals are shared by exactly two triangles
        for (edge, count) in &usage {
            let is_boundary = (edge.1 - edge.0) == 1 || (edge.0 == 0 && edge.1 == 7);
            if !is_boundary {
                assert_eq!(*count, 2, "diagonal {edge:?}");
            }
        }
    }

    #[test]
    fn k_gon_yields_k_minus_two() {
        for sides in 3..=12 {
            let mesh = regular_polygon(sides);
            let flat = triangulate_faces(&mesh, &[0]);
            assert_eq!(flat.len(), 3 * (sides as usize - 2), "{sides}-gon");
        }
    }

    #[test]
    fn triangle_is_returned_unchanged() {
        let mesh = single_triangle();
        assert_eq!(triangulate_faces(&mesh, &[0]), vec![0, 1, 2]);
    }

    #[test]
    fn concave_polygon_stays_inside() {
        // Arrow head pointing up with a notch at the bottom
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, -1.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(-2.0, -1.0, 0.0),
        ];
        let triangles = triangulate_polygon(&[0, 1, 2, 3], &positions);
        assert_eq!(triangles.len(), 2);
        for t in &triangles {
            assert!(signed_area(*t, &positions) > 0.0, "triangle {t:?} is inverted");
        }
    }

    #[test]
    fn prefers_balanced_triangles() {
        // Long thin rectangle split into a hexagon with two mid-edge corners
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(4.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let triangles = triangulate_polygon(&[0, 1, 2, 3, 4, 5], &positions);
        assert_eq!(triangles.len(), 4);

        // A fan from corner 0 would create the sliver (0, 2, 3); balanced clipping never does
        let usage = edge_usage(&triangles);
        assert!(!usage.contains_key(&EdgeKey::new(0, 3)));
    }

    #[test]
    fn comb_polygon_keeps_every_triangle_inside() {
        // Three teeth hanging off a bar: many reflex corners at the gaps
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(3.0, 2.0, 0.0),
            Vec3::new(4.0, 2.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(5.0, 3.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
        ];
        let polygon: Vec<VertexId> = (0..12).collect();
        let triangles = triangulate_polygon(&polygon, &positions);
        assert_eq!(triangles.len(), 10);

        let total: f32 = triangles.iter().map(|t| signed_area(*t, &positions)).sum();
        for t in &triangles {
            assert!(signed_area(*t, &positions) > 0.0, "triangle {t:?} is inverted");
        }
        // Bar (5 x 1) plus three teeth (1 x 2 each)
        assert!((total - 11.0).abs() < 1e-4);
    }

    #[test]
    fn collinear_polygon_falls_back_to_fan() {
        let positions: Vec<Vec3> = (0..5).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let triangles = triangulate_polygon(&[0, 1, 2, 3, 4], &positions);
        assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    }

    #[test]
    fn deterministic_output() {
        let mesh = regular_polygon(9);
        assert_eq!(
            triangulate_faces(&mesh, &[0]),
            triangulate_faces(&mesh, &[0])
        );
    }

    #[test]
    fn source_mesh_is_untouched() {
        let mesh = regular_polygon(7);
        let before = mesh.clone();
        let _ = triangulate_faces(&mesh, &[0]);
        assert_eq!(mesh, before);
    }
}
