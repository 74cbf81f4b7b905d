//! Polygon mesh representation, topology queries and display triangulation.

pub mod poly_mesh;
pub mod source;
pub mod topology;
pub mod triangulate;

pub use poly_mesh::{EdgeId, EdgeKey, FaceId, MeshEdge, MeshFace, MeshVertex, PolyMesh, VertexId};
pub use source::EditablePolyMesh;
pub use topology::MeshCounts;
pub use triangulate::{triangulate_faces, triangulate_polygon};
