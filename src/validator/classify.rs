//! Defect classifiers.
//!
//! Each classifier scans a mesh once in `refresh` and caches the matching
//! element ids. Projection reads the cache against whatever mesh it is handed
//! and silently skips ids that no longer exist in it.

use bevy::prelude::*;

use super::projection::OverlayTransform;
use crate::mesh::{EdgeId, FaceId, PolyMesh, VertexId, triangulate_faces};

/// Projected triangles ready for drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceGeometry {
    pub positions: Vec<Vec3>,
    /// Triples indexing into `positions`
    pub indices: Vec<[u32; 3]>,
}

impl FaceGeometry {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// World-space corners of each triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.iter().filter_map(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }
}

/// Which faces a [`FaceDefects`] classifier matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceRule {
    /// Exactly three edges
    Triangles,
    /// More than four edges
    Ngons,
}

impl FaceRule {
    pub fn matches(self, edge_count: usize) -> bool {
        match self {
            FaceRule::Triangles => edge_count == 3,
            FaceRule::Ngons => edge_count > 4,
        }
    }
}

/// Faces matching a [`FaceRule`], plus their display triangulation.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDefects {
    rule: FaceRule,
    faces: Vec<FaceId>,
    /// Flattened triangle list covering `faces`, three ids per triangle
    triangle_vertices: Vec<VertexId>,
}

impl FaceDefects {
    pub fn new(rule: FaceRule) -> Self {
        Self {
            rule,
            faces: Vec::new(),
            triangle_vertices: Vec::new(),
        }
    }

    pub fn rule(&self) -> FaceRule {
        self.rule
    }

    pub fn refresh(&mut self, mesh: &PolyMesh) {
        self.faces = (0..mesh.faces.len() as FaceId)
            .filter(|&face| self.rule.matches(mesh.face_edge_count(face)))
            .collect();

        // Loops that revisit a corner can match on edge count while holding
        // more than three corners, so every face goes through the
        // triangulator and contributes whole triples.
        self.triangle_vertices = triangulate_faces(mesh, &self.faces);
    }

    pub fn faces(&self) -> &[FaceId] {
        &self.faces
    }

    /// Flattened display triangulation of the matched faces.
    pub fn triangle_vertices(&self) -> &[VertexId] {
        &self.triangle_vertices
    }

    pub fn count(&self) -> usize {
        self.faces.len()
    }

    /// Boundary edges of every matched face. Edges shared by two matched
    /// faces are emitted once per face.
    pub fn project_edges(
        &self,
        mesh: &PolyMesh,
        transform: &OverlayTransform,
        offset: f32,
    ) -> Vec<[Vec3; 2]> {
        let distance = transform.edge_offset(offset);
        let edges = self
            .faces
            .iter()
            .filter_map(|&face| mesh.faces.get(face as usize))
            .flat_map(|face| face.edges.iter().copied());
        project_edge_ids(mesh, edges, transform, distance)
    }

    /// Cached triangles, one fresh position per triangle corner.
    pub fn project_faces(
        &self,
        mesh: &PolyMesh,
        transform: &OverlayTransform,
        offset: f32,
    ) -> FaceGeometry {
        let distance = transform.face_offset(offset);
        let mut geometry = FaceGeometry::default();

        for tri in self.triangle_vertices.chunks_exact(3) {
            let Some(corners) = tri
                .iter()
                .map(|&v| mesh.vertices.get(v as usize))
                .collect::<Option<Vec<_>>>()
            else {
                continue;
            };

            let base = geometry.positions.len() as u32;
            geometry.positions.extend(
                corners
                    .iter()
                    .map(|v| transform.project(v.position, v.normal, distance)),
            );
            geometry.indices.push([base, base + 1, base + 2]);
        }

        geometry
    }
}

/// Edges not shared by exactly two faces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeDefects {
    edges: Vec<EdgeId>,
}

impl EdgeDefects {
    pub fn refresh(&mut self, mesh: &PolyMesh) {
        self.edges = (0..mesh.edges.len() as EdgeId)
            .filter(|&edge| !mesh.edge_is_manifold(edge))
            .collect();
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn count(&self) -> usize {
        self.edges.len()
    }

    pub fn project_edges(
        &self,
        mesh: &PolyMesh,
        transform: &OverlayTransform,
        offset: f32,
    ) -> Vec<[Vec3; 2]> {
        let distance = transform.edge_offset(offset);
        project_edge_ids(mesh, self.edges.iter().copied(), transform, distance)
    }
}

fn project_edge_ids(
    mesh: &PolyMesh,
    edges: impl Iterator<Item = EdgeId>,
    transform: &OverlayTransform,
    distance: f32,
) -> Vec<[Vec3; 2]> {
    edges
        .filter_map(|edge| {
            let [a, b] = mesh.edges.get(edge as usize)?.vertices;
            let a = mesh.vertices.get(a as usize)?;
            let b = mesh.vertices.get(b as usize)?;
            Some([
                transform.project(a.position, a.normal, distance),
                transform.project(b.position, b.normal, distance),
            ])
        })
        .collect()
}

/// Named vertex valence buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoleKind {
    /// Valence 3
    NPole,
    /// Valence 5
    EPole,
    /// Valence above 5
    MorePole,
    /// No incident edges
    Isolated,
}

impl PoleKind {
    /// Bucket for a valence. Valences 1, 2 and 4 are not poles.
    pub fn from_valence(valence: usize) -> Option<Self> {
        match valence {
            0 => Some(PoleKind::Isolated),
            3 => Some(PoleKind::NPole),
            5 => Some(PoleKind::EPole),
            v if v > 5 => Some(PoleKind::MorePole),
            _ => None,
        }
    }
}

/// Vertices bucketed by valence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoleDefects {
    n_poles: Vec<VertexId>,
    e_poles: Vec<VertexId>,
    more_poles: Vec<VertexId>,
    isolated: Vec<VertexId>,
}

impl PoleDefects {
    pub fn refresh(&mut self, mesh: &PolyMesh) {
        self.n_poles.clear();
        self.e_poles.clear();
        self.more_poles.clear();
        self.isolated.clear();

        for vertex in 0..mesh.vertices.len() as VertexId {
            if let Some(kind) = PoleKind::from_valence(mesh.vertex_valence(vertex)) {
                self.bucket_mut(kind).push(vertex);
            }
        }
    }

    pub fn vertices(&self, kind: PoleKind) -> &[VertexId] {
        match kind {
            PoleKind::NPole => &self.n_poles,
            PoleKind::EPole => &self.e_poles,
            PoleKind::MorePole => &self.more_poles,
            PoleKind::Isolated => &self.isolated,
        }
    }

    fn bucket_mut(&mut self, kind: PoleKind) -> &mut Vec<VertexId> {
        match kind {
            PoleKind::NPole => &mut self.n_poles,
            PoleKind::EPole => &mut self.e_poles,
            PoleKind::MorePole => &mut self.more_poles,
            PoleKind::Isolated => &mut self.isolated,
        }
    }

    pub fn count(&self, kind: PoleKind) -> usize {
        self.vertices(kind).len()
    }

    pub fn project_points(
        &self,
        mesh: &PolyMesh,
        kind: PoleKind,
        transform: &OverlayTransform,
        offset: f32,
    ) -> Vec<Vec3> {
        let distance = transform.edge_offset(offset);
        self.vertices(kind)
            .iter()
            .filter_map(|&v| mesh.vertices.get(v as usize))
            .map(|v| transform.project(v.position, v.normal, distance))
            .collect()
    }
}

/// Borrowed view of the classifier behind one category.
#[derive(Debug, Clone, Copy)]
pub enum ClassifierRef<'a> {
    Faces(&'a FaceDefects),
    Edges(&'a EdgeDefects),
    Poles(&'a PoleDefects, PoleKind),
}

impl ClassifierRef<'_> {
    pub fn count(&self) -> usize {
        match self {
            ClassifierRef::Faces(faces) => faces.count(),
            ClassifierRef::Edges(edges) => edges.count(),
            ClassifierRef::Poles(poles, kind) => poles.count(*kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::poly_mesh::fixtures::*;

    fn refreshed_faces(rule: FaceRule, mesh: &PolyMesh) -> FaceDefects {
        let mut defects = FaceDefects::new(rule);
        defects.refresh(mesh);
        defects
    }

    fn refreshed_poles(mesh: &PolyMesh) -> PoleDefects {
        let mut poles = PoleDefects::default();
        poles.refresh(mesh);
        poles
    }

    #[test]
    fn cube_has_no_face_or_edge_defects() {
        let mesh = cube();
        assert_eq!(refreshed_faces(FaceRule::Triangles, &mesh).count(), 0);
        assert_eq!(refreshed_faces(FaceRule::Ngons, &mesh).count(), 0);

        let mut edges = EdgeDefects::default();
        edges.refresh(&mesh);
        assert_eq!(edges.count(), 0);
    }

    #[test]
    fn cube_corners_are_n_poles() {
        let poles = refreshed_poles(&cube());
        assert_eq!(poles.count(PoleKind::NPole), 8);
        assert_eq!(poles.count(PoleKind::EPole), 0);
        assert_eq!(poles.count(PoleKind::MorePole), 0);
        assert_eq!(poles.count(PoleKind::Isolated), 0);
    }

    #[test]
    fn single_triangle_projects_one_triple() {
        let mesh = single_triangle();
        let triangles = refreshed_faces(FaceRule::Triangles, &mesh);
        assert_eq!(triangles.count(), 1);
        assert_eq!(refreshed_faces(FaceRule::Ngons, &mesh).count(), 0);

        let geometry = triangles.project_faces(&mesh, &OverlayTransform::identity(), 0.1);
        assert_eq!(geometry.positions.len(), 3);
        assert_eq!(geometry.indices, vec![[0, 1, 2]]);
    }

    #[test]
    fn fan_reports_the_shared_edge() {
        let mesh = non_manifold_fan();
        let mut edges = EdgeDefects::default();
        edges.refresh(&mesh);

        let Some(shared) = mesh.find_edge(0, 1) else {
            panic!("fan should contain the spine edge");
        };
        assert!(edges.edges().contains(&shared));
        assert!(!mesh.edge_is_manifold(shared));
        // Every other edge borders a single face.
        assert!(edges.edges().iter().all(|&e| mesh.edge_face_count(e) != 2));
    }

    #[test]
    fn face_rules_partition_with_quads() {
        let mut mesh = cube();
        let extra = mesh.add_vertex(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
        mesh.add_face(&[2, 3, extra]);
        let octagon = regular_polygon(8);
        let offset = mesh.vertices.len() as u32;
        for v in &octagon.vertices {
            mesh.add_vertex(v.position + Vec3::X * 5.0, v.normal);
        }
        mesh.add_face(&(offset..offset + 8).collect::<Vec<_>>());

        let triangles = refreshed_faces(FaceRule::Triangles, &mesh);
        let ngons = refreshed_faces(FaceRule::Ngons, &mesh);
        let quads = (0..mesh.faces.len() as u32)
            .filter(|&f| mesh.face_edge_count(f) == 4)
            .count();

        assert_eq!(triangles.count(), 1);
        assert_eq!(ngons.count(), 1);
        assert_eq!(triangles.count() + ngons.count() + quads, mesh.faces.len());
        assert!(triangles.faces().iter().all(|f| !ngons.faces().contains(f)));
    }

    #[test]
    fn ngon_triangulation_is_cached() {
        let mesh = regular_polygon(8);
        let ngons = refreshed_faces(FaceRule::Ngons, &mesh);
        assert_eq!(ngons.triangle_vertices().len(), 18);

        let geometry = ngons.project_faces(&mesh, &OverlayTransform::identity(), 0.1);
        assert_eq!(geometry.indices.len(), 6);
        assert_eq!(geometry.positions.len(), 18);
    }

    #[test]
    fn face_edges_include_shared_edges_twice() {
        let mut mesh = PolyMesh::from_polygons(
            &[
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(0.5, 1.0, 0.0),
                Vec3::new(0.5, -1.0, 0.0),
            ],
            &[vec![0, 1, 2], vec![1, 0, 3]],
        );
        mesh.recompute_normals();
        let triangles = refreshed_faces(FaceRule::Triangles, &mesh);
        let edges = triangles.project_edges(&mesh, &OverlayTransform::identity(), 0.1);
        assert_eq!(edges.len(), 6);
    }

    #[test]
    fn revisited_corner_keeps_triples_aligned() {
        let mut mesh = PolyMesh::from_polygons(
            &[
                Vec3::ZERO,
                Vec3::X,
                Vec3::Y,
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::new(4.0, 0.0, 0.0),
                Vec3::new(3.0, 1.0, 0.0),
            ],
            &[vec![0, 1, 2, 0, 1], vec![3, 4, 5]],
        );
        mesh.recompute_normals();
        assert_eq!(mesh.face_edge_count(0), 3);

        let triangles = refreshed_faces(FaceRule::Triangles, &mesh);
        assert_eq!(triangles.count(), 2);

        let flat = triangles.triangle_vertices();
        assert_eq!(flat.len() % 3, 0);
        assert_eq!(flat.chunks(3).last(), Some(&[3, 4, 5][..]));

        let geometry = triangles.project_faces(&mesh, &OverlayTransform::identity(), 0.1);
        assert_eq!(geometry.indices.len(), flat.len() / 3);
    }

    #[test]
    fn valence_buckets_are_exclusive() {
        for valence in 0..12 {
            let expected = match valence {
                0 => Some(PoleKind::Isolated),
                3 => Some(PoleKind::NPole),
                5 => Some(PoleKind::EPole),
                6.. => Some(PoleKind::MorePole),
                _ => None,
            };
            assert_eq!(PoleKind::from_valence(valence), expected);
        }
    }

    #[test]
    fn isolated_vertex_is_reported() {
        let mut mesh = cube();
        let lonely = mesh.add_vertex(Vec3::splat(4.0), Vec3::ZERO);
        let poles = refreshed_poles(&mesh);
        assert_eq!(poles.vertices(PoleKind::Isolated), &[lonely]);

        let points =
            poles.project_points(&mesh, PoleKind::Isolated, &OverlayTransform::identity(), 0.1);
        assert_eq!(points, vec![Vec3::splat(4.0)]);
    }

    #[test]
    fn refresh_is_idempotent() {
        let mesh = non_manifold_fan();
        let mut poles = refreshed_poles(&mesh);
        let first = poles.clone();
        poles.refresh(&mesh);
        assert_eq!(poles, first);

        let mut ngons = refreshed_faces(FaceRule::Ngons, &regular_polygon(7));
        let first = ngons.clone();
        ngons.refresh(&regular_polygon(7));
        assert_eq!(ngons, first);
    }

    #[test]
    fn stale_ids_are_skipped() {
        let mesh = regular_polygon(6);
        let ngons = refreshed_faces(FaceRule::Ngons, &mesh);
        let emptied = PolyMesh::default();
        let transform = OverlayTransform::identity();
        assert!(ngons.project_edges(&emptied, &transform, 0.1).is_empty());
        assert!(ngons.project_faces(&emptied, &transform, 0.1).is_empty());
    }
}
