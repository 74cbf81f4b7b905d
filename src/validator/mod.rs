//! Mesh defect classification and live tracking.
//!
//! Selected meshes get a [`MeshSession`] in the [`SessionRegistry`]. Sessions
//! classify their mesh once on creation and again only when a change
//! notification shows the element counts moved. The overlay pulls projected
//! geometry from the cached results every frame.

pub mod classify;
pub mod feed;
pub mod plugin;
pub mod projection;
pub mod registry;
pub mod session;
mod systems;

pub use classify::{
    ClassifierRef, EdgeDefects, FaceDefects, FaceGeometry, FaceRule, PoleDefects, PoleKind,
};
pub use feed::{FeedSubscription, MeshChange, MeshChangeFeed};
pub use plugin::{MeshValidatorPlugin, ValidatorSet};
pub use projection::OverlayTransform;
pub use registry::SessionRegistry;
pub use session::{
    MeshProvider, MeshSession, MeshSnapshot, SessionState, SessionSummary, SnapshotOrigin,
};
pub use systems::{EcsMeshProvider, MeshAssetVersions};

/// The fixed set of defects the validator can highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefectCategory {
    /// Faces with exactly three edges
    Triangles,
    /// Faces with more than four edges
    Ngons,
    /// Edges not shared by exactly two faces
    NonManifold,
    /// Vertices with three edges
    NPoles,
    /// Vertices with five edges
    EPoles,
    /// Vertices with more than five edges
    MorePoles,
    /// Vertices with no edges
    IsolatedVerts,
}

/// What kind of overlay geometry a category produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// Edge outlines plus filled triangles
    Faces,
    /// Edge outlines only
    Edges,
    /// Point markers only
    Points,
}

impl DefectCategory {
    pub const COUNT: usize = 7;

    /// All categories in display order.
    pub const ALL: [DefectCategory; Self::COUNT] = [
        DefectCategory::NonManifold,
        DefectCategory::Triangles,
        DefectCategory::Ngons,
        DefectCategory::NPoles,
        DefectCategory::EPoles,
        DefectCategory::MorePoles,
        DefectCategory::IsolatedVerts,
    ];

    /// Stable slot for per-category lookup tables.
    pub const fn index(self) -> usize {
        match self {
            DefectCategory::Triangles => 0,
            DefectCategory::Ngons => 1,
            DefectCategory::NonManifold => 2,
            DefectCategory::NPoles => 3,
            DefectCategory::EPoles => 4,
            DefectCategory::MorePoles => 5,
            DefectCategory::IsolatedVerts => 6,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DefectCategory::Triangles => "Triangles",
            DefectCategory::Ngons => "Ngons",
            DefectCategory::NonManifold => "Non manifold",
            DefectCategory::NPoles => "N poles",
            DefectCategory::EPoles => "E poles",
            DefectCategory::MorePoles => "Poles > 5",
            DefectCategory::IsolatedVerts => "Isolated verts",
        }
    }

    pub fn overlay_kind(&self) -> OverlayKind {
        match self {
            DefectCategory::Triangles | DefectCategory::Ngons => OverlayKind::Faces,
            DefectCategory::NonManifold => OverlayKind::Edges,
            DefectCategory::NPoles
            | DefectCategory::EPoles
            | DefectCategory::MorePoles
            | DefectCategory::IsolatedVerts => OverlayKind::Points,
        }
    }

    /// The valence bucket for vertex categories.
    pub fn pole_kind(&self) -> Option<PoleKind> {
        match self {
            DefectCategory::NPoles => Some(PoleKind::NPole),
            DefectCategory::EPoles => Some(PoleKind::EPole),
            DefectCategory::MorePoles => Some(PoleKind::MorePole),
            DefectCategory::IsolatedVerts => Some(PoleKind::Isolated),
            _ => None,
        }
    }
}
