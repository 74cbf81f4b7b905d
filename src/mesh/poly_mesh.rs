//! Boundary-representation polygon mesh.
//!
//! `PolyMesh` keeps explicit vertex, edge and face records with adjacency in
//! both directions (face → edges → vertices, vertex → link edges,
//! edge → link faces). Faces are arbitrary polygons, so quads and n-gons
//! survive import instead of being flattened to triangles.
//!
//! Uses index-based arena storage (not pointers), the same way the modeling
//! half-edge mesh does.

use bevy::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};
use bevy::prelude::*;
use std::collections::HashMap;

use super::triangulate::triangulate_polygon;

/// Index into the vertex array.
pub type VertexId = u32;
/// Index into the edge array.
pub type EdgeId = u32;
/// Index into the face array.
pub type FaceId = u32;

/// Canonical edge key (lower vertex index first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(pub VertexId, pub VertexId);

impl EdgeKey {
    /// Create a canonical key with the lower index first.
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b { EdgeKey(a, b) } else { EdgeKey(b, a) }
    }
}

/// A vertex and the edges that touch it.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Link edges, in creation order.
    pub edges: Vec<EdgeId>,
}

/// An edge between two vertices and the faces that use it.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshEdge {
    pub vertices: [VertexId; 2],
    /// Link faces, each listed once.
    pub faces: Vec<FaceId>,
}

/// A polygon face: ordered vertex loop plus the matching edge loop.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshFace {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
}

/// Polygon mesh with explicit adjacency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMesh {
    pub vertices: Vec<MeshVertex>,
    pub edges: Vec<MeshEdge>,
    pub faces: Vec<MeshFace>,
    edge_lookup: HashMap<EdgeKey, EdgeId>,
}

impl PolyMesh {
    /// Build a mesh from vertex positions and polygon index loops.
    ///
    /// Edges are shared between polygons through their canonical key. Polygon
    /// corners that point past the vertex array are dropped. Normals are
    /// recomputed from the faces.
    pub fn from_polygons(positions: &[Vec3], polygons: &[Vec<VertexId>]) -> Self {
        let mut mesh = PolyMesh::default();
        for &position in positions {
            mesh.add_vertex(position, Vec3::ZERO);
        }
        for polygon in polygons {
            mesh.add_face(polygon);
        }
        mesh.recompute_normals();
        mesh
    }

    /// Replace computed normals with explicit ones where they are non-zero.
    pub fn with_normals(mut self, normals: &[Vec3]) -> Self {
        for (vertex, &normal) in self.vertices.iter_mut().zip(normals) {
            if normal != Vec3::ZERO {
                vertex.normal = normal.normalize_or_zero();
            }
        }
        self
    }

    /// Build a `PolyMesh` from a Bevy `Mesh`.
    ///
    /// Every triangle becomes a face. Vertices that share the exact same
    /// position are welded, since Bevy meshes split vertices along hard edges
    /// and UV seams. Returns `None` if the mesh lacks positions or uses a
    /// non-triangle topology.
    pub fn from_bevy_mesh(mesh: &Mesh) -> Option<Self> {
        if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
            warn!(
                "Mesh validation skipped: unsupported topology {:?}",
                mesh.primitive_topology()
            );
            return None;
        }

        let positions: Vec<Vec3> = match mesh.attribute(Mesh::ATTRIBUTE_POSITION)? {
            VertexAttributeValues::Float32x3(v) => v.iter().map(|p| Vec3::from(*p)).collect(),
            _ => return None,
        };

        let normals: Vec<Vec3> = match mesh.attribute(Mesh::ATTRIBUTE_NORMAL) {
            Some(VertexAttributeValues::Float32x3(v)) => {
                v.iter().map(|n| Vec3::from(*n)).collect()
            }
            _ => vec![Vec3::ZERO; positions.len()],
        };

        let corners: Vec<u32> = match mesh.indices() {
            Some(Indices::U32(indices)) => indices.clone(),
            Some(Indices::U16(indices)) => indices.iter().map(|&i| i as u32).collect(),
            None => (0..positions.len() as u32).collect(),
        };

        // Weld split vertices by exact position
        let mut welded: HashMap<[u32; 3], VertexId> = HashMap::new();
        let mut remap: Vec<VertexId> = Vec::with_capacity(positions.len());
        let mut unique_positions: Vec<Vec3> = Vec::new();
        let mut summed_normals: Vec<Vec3> = Vec::new();
        for (i, position) in positions.iter().enumerate() {
            let key = [position.x.to_bits(), position.y.to_bits(), position.z.to_bits()];
            let id = *welded.entry(key).or_insert_with(|| {
                unique_positions.push(*position);
                summed_normals.push(Vec3::ZERO);
                (unique_positions.len() - 1) as VertexId
            });
            summed_normals[id as usize] += normals.get(i).copied().unwrap_or(Vec3::ZERO);
            remap.push(id);
        }

        let polygons: Vec<Vec<VertexId>> = corners
            .chunks_exact(3)
            .map(|c| {
                c.iter()
                    .map(|&i| remap.get(i as usize).copied().unwrap_or(u32::MAX))
                    .collect()
            })
            .collect();

        Some(PolyMesh::from_polygons(&unique_positions, &polygons).with_normals(&summed_normals))
    }

    /// Convert to a triangle-list Bevy `Mesh` for display.
    pub fn to_bevy_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, default());

        mesh.insert_attribute(
            Mesh::ATTRIBUTE_POSITION,
            self.vertices
                .iter()
                .map(|v| [v.position.x, v.position.y, v.position.z])
                .collect::<Vec<_>>(),
        );
        mesh.insert_attribute(
            Mesh::ATTRIBUTE_NORMAL,
            self.vertices
                .iter()
                .map(|v| [v.normal.x, v.normal.y, v.normal.z])
                .collect::<Vec<_>>(),
        );

        let positions = self.positions();
        let indices: Vec<u32> = self
            .faces
            .iter()
            .flat_map(|face| triangulate_polygon(&face.vertices, &positions))
            .flatten()
            .collect();
        mesh.insert_indices(Indices::U32(indices));
        mesh
    }

    /// Add a vertex with no links and return its index.
    pub fn add_vertex(&mut self, position: Vec3, normal: Vec3) -> VertexId {
        let id = self.vertices.len() as VertexId;
        self.vertices.push(MeshVertex {
            position,
            normal,
            edges: Vec::new(),
        });
        id
    }

    /// Add (or look up) the edge between two vertices.
    ///
    /// Returns `None` when either vertex does not exist or both are the same.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        if a == b || a as usize >= self.vertices.len() || b as usize >= self.vertices.len() {
            return None;
        }
        let key = EdgeKey::new(a, b);
        if let Some(&id) = self.edge_lookup.get(&key) {
            return Some(id);
        }

        let id = self.edges.len() as EdgeId;
        self.edges.push(MeshEdge {
            vertices: [key.0, key.1],
            faces: Vec::new(),
        });
        self.vertices[a as usize].edges.push(id);
        self.vertices[b as usize].edges.push(id);
        self.edge_lookup.insert(key, id);
        Some(id)
    }

    /// Add a polygon face and link it to its edges. Returns the new face ID.
    ///
    /// Out-of-range corners are dropped and consecutive duplicates collapsed.
    /// A loop left with fewer than three corners is still stored as a
    /// degenerate face; it never matches a face category. Returns `None` only
    /// when no corner survives.
    pub fn add_face(&mut self, polygon: &[VertexId]) -> Option<FaceId> {
        let vertex_count = self.vertices.len();
        let mut corners: Vec<VertexId> = Vec::with_capacity(polygon.len());
        for &v in polygon {
            if v as usize >= vertex_count {
                warn!("Dropping polygon corner {v}: mesh has {vertex_count} vertices");
                continue;
            }
            if corners.last() != Some(&v) {
                corners.push(v);
            }
        }
        while corners.len() > 1 && corners.first() == corners.last() {
            corners.pop();
        }
        if corners.is_empty() {
            return None;
        }

        let face_id = self.faces.len() as FaceId;
        let mut face_edges: Vec<EdgeId> = Vec::with_capacity(corners.len());
        let n = corners.len();
        if n > 1 {
            for i in 0..n {
                let Some(edge) = self.add_edge(corners[i], corners[(i + 1) % n]) else {
                    continue;
                };
                if !face_edges.contains(&edge) {
                    face_edges.push(edge);
                }
                let link = &mut self.edges[edge as usize].faces;
                if !link.contains(&face_id) {
                    link.push(face_id);
                }
            }
        }

        self.faces.push(MeshFace {
            vertices: corners,
            edges: face_edges,
        });
        Some(face_id)
    }

    /// Remove a face, keeping its edges and vertices. Face IDs above it shift
    /// down by one.
    pub fn remove_face(&mut self, face: FaceId) -> bool {
        if face as usize >= self.faces.len() {
            return false;
        }
        self.faces.remove(face as usize);
        for edge in &mut self.edges {
            edge.faces.retain(|&f| f != face);
            for f in &mut edge.faces {
                if *f > face {
                    *f -= 1;
                }
            }
        }
        true
    }

    /// Look up the edge joining two vertices.
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edge_lookup.get(&EdgeKey::new(a, b)).copied()
    }

    /// Vertex positions in index order.
    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Area-weighted face normal (Newell's method), not normalized.
    pub fn face_newell_normal(&self, face: FaceId) -> Vec3 {
        let Some(face) = self.faces.get(face as usize) else {
            return Vec3::ZERO;
        };
        newell_normal(&face.vertices, |v| {
            self.vertices
                .get(v as usize)
                .map_or(Vec3::ZERO, |vertex| vertex.position)
        })
    }

    /// Recompute vertex normals from face normals (smooth shading).
    pub fn recompute_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = Vec3::ZERO;
        }

        for fi in 0..self.faces.len() {
            let normal = self.face_newell_normal(fi as FaceId);
            for &v in &self.faces[fi].vertices {
                self.vertices[v as usize].normal += normal;
            }
        }

        for v in &mut self.vertices {
            v.normal = v.normal.normalize_or_zero();
        }
    }
}

/// Newell normal of a vertex loop, scaled by twice the loop area.
pub(crate) fn newell_normal(polygon: &[VertexId], position: impl Fn(VertexId) -> Vec3) -> Vec3 {
    let n = polygon.len();
    let mut normal = Vec3::ZERO;
    for i in 0..n {
        let a = position(polygon[i]);
        let b = position(polygon[(i + 1) % n]);
        normal += a.cross(b);
    }
    normal
}
