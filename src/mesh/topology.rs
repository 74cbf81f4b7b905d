//! Read-only topology queries over a `PolyMesh`.
//!
//! Every query is total: ids past the end of the mesh report zero or `false`
//! instead of panicking, so callers holding ids from an older snapshot never
//! crash a scan.

use super::poly_mesh::{EdgeId, FaceId, PolyMesh, VertexId};

/// Aggregate element counts used as the cheap dirty check between snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MeshCounts {
    pub verts: usize,
    pub edges: usize,
    pub faces: usize,
    /// Triangles a full loop triangulation would produce.
    pub loop_triangles: usize,
}

impl PolyMesh {
    /// Number of edges bounding a face.
    pub fn face_edge_count(&self, face: FaceId) -> usize {
        self.faces.get(face as usize).map_or(0, |f| f.edges.len())
    }

    /// Number of faces using an edge.
    pub fn edge_face_count(&self, edge: EdgeId) -> usize {
        self.edges.get(edge as usize).map_or(0, |e| e.faces.len())
    }

    /// An edge is manifold when exactly two faces use it.
    pub fn edge_is_manifold(&self, edge: EdgeId) -> bool {
        self.edge_face_count(edge) == 2
    }

    /// Number of edges touching a vertex.
    pub fn vertex_valence(&self, vertex: VertexId) -> usize {
        self.vertices.get(vertex as usize).map_or(0, |v| v.edges.len())
    }

    /// Triangles produced by triangulating every face (k - 2 per k-gon).
    pub fn loop_triangle_count(&self) -> usize {
        self.faces
            .iter()
            .map(|f| f.vertices.len().saturating_sub(2))
            .sum()
    }

    pub fn counts(&self) -> MeshCounts {
        MeshCounts {
            verts: self.vertices.len(),
            edges: self.edges.len(),
            faces: self.faces.len(),
            loop_triangles: self.loop_triangle_count(),
        }
    }
}
