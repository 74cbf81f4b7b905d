//! Per-entity validation session.
//!
//! A session owns a snapshot of one entity's mesh and the classifier caches
//! computed from it. It only reclassifies when the aggregate element counts
//! move, so edits that keep every count (an edge flip, say) leave the cached
//! results in place until the next count-changing edit.

use bevy::prelude::*;

use super::DefectCategory;
use super::classify::{
    ClassifierRef, EdgeDefects, FaceDefects, FaceGeometry, FaceRule, PoleDefects, PoleKind,
};
use super::projection::OverlayTransform;
use crate::editor::{InteractionMode, ValidatorChecks};
use crate::mesh::{MeshCounts, PolyMesh};

/// Where a snapshot's mesh came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    /// The live edit-mode mesh
    LiveEdit,
    /// A disposable copy of the stored mesh data
    StoredCopy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshSnapshot {
    pub mesh: PolyMesh,
    /// Host version the copy was taken at
    pub version: u64,
    pub origin: SnapshotOrigin,
}

/// Host-side access to entity meshes.
pub trait MeshProvider {
    /// Current version of the entity's mesh, `None` if it has none.
    fn mesh_version(&self, entity: Entity, mode: InteractionMode) -> Option<u64>;

    /// Copy the entity's mesh for classification.
    fn snapshot(&self, entity: Entity, mode: InteractionMode) -> Option<MeshSnapshot>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Snapshot and classifier caches agree
    Active,
    /// A count delta was observed and reclassification is pending
    Stale,
}

/// Statistics for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub counts: MeshCounts,
    /// Defect count per enabled category, in display order
    pub defects: Vec<(DefectCategory, usize)>,
}

#[derive(Debug, Clone)]
pub struct MeshSession {
    entity: Entity,
    snapshot: MeshSnapshot,
    counts: MeshCounts,
    state: SessionState,
    triangles: FaceDefects,
    ngons: FaceDefects,
    non_manifold: EdgeDefects,
    poles: PoleDefects,
}

impl MeshSession {
    /// Create a session and classify every enabled category once.
    pub fn bind(entity: Entity, snapshot: MeshSnapshot, checks: &ValidatorChecks) -> Self {
        let counts = snapshot.mesh.counts();
        let mut session = Self {
            entity,
            snapshot,
            counts,
            state: SessionState::Active,
            triangles: FaceDefects::new(FaceRule::Triangles),
            ngons: FaceDefects::new(FaceRule::Ngons),
            non_manifold: EdgeDefects::default(),
            poles: PoleDefects::default(),
        };
        session.refresh_enabled(checks);
        session
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn snapshot(&self) -> &MeshSnapshot {
        &self.snapshot
    }

    pub fn mesh(&self) -> &PolyMesh {
        &self.snapshot.mesh
    }

    /// Counts cached at the last classification.
    pub fn current_counts(&self) -> MeshCounts {
        self.counts
    }

    /// Pick up a newer host mesh and reclassify if its counts moved.
    ///
    /// A count delta seen while every category is disabled leaves the
    /// session `Stale`; the next call with a category enabled catches up.
    /// Returns `true` when the classifiers were re-run.
    pub fn refresh_if_stale(
        &mut self,
        provider: &impl MeshProvider,
        mode: InteractionMode,
        checks: &ValidatorChecks,
    ) -> bool {
        if provider.mesh_version(self.entity, mode) != Some(self.snapshot.version) {
            if let Some(snapshot) = provider.snapshot(self.entity, mode) {
                self.snapshot = snapshot;
            }
        }

        let counts = self.snapshot.mesh.counts();
        if counts == self.counts && self.state == SessionState::Active {
            return false;
        }

        self.state = SessionState::Stale;
        if !checks.any_enabled() {
            // Nothing to reclassify yet; stay stale until a category is on
            return false;
        }

        self.counts = counts;
        self.refresh_enabled(checks);
        self.state = SessionState::Active;

        debug!(
            "Reclassified {:?}: {} verts, {} edges, {} faces",
            self.entity, counts.verts, counts.edges, counts.faces
        );
        true
    }

    /// Reclassify a single category against the current snapshot.
    pub fn refresh_category(&mut self, category: DefectCategory) {
        let mesh = &self.snapshot.mesh;
        match category {
            DefectCategory::Triangles => self.triangles.refresh(mesh),
            DefectCategory::Ngons => self.ngons.refresh(mesh),
            DefectCategory::NonManifold => self.non_manifold.refresh(mesh),
            DefectCategory::NPoles
            | DefectCategory::EPoles
            | DefectCategory::MorePoles
            | DefectCategory::IsolatedVerts => self.poles.refresh(mesh),
        }
    }

    fn refresh_enabled(&mut self, checks: &ValidatorChecks) {
        let mut poles_done = false;
        for category in checks.enabled_categories() {
            if category.pole_kind().is_some() {
                // One scan fills every valence bucket
                if poles_done {
                    continue;
                }
                poles_done = true;
            }
            self.refresh_category(category);
        }
    }

    pub fn classifier(&self, category: DefectCategory) -> ClassifierRef<'_> {
        match category {
            DefectCategory::Triangles => ClassifierRef::Faces(&self.triangles),
            DefectCategory::Ngons => ClassifierRef::Faces(&self.ngons),
            DefectCategory::NonManifold => ClassifierRef::Edges(&self.non_manifold),
            DefectCategory::NPoles => ClassifierRef::Poles(&self.poles, PoleKind::NPole),
            DefectCategory::EPoles => ClassifierRef::Poles(&self.poles, PoleKind::EPole),
            DefectCategory::MorePoles => ClassifierRef::Poles(&self.poles, PoleKind::MorePole),
            DefectCategory::IsolatedVerts => ClassifierRef::Poles(&self.poles, PoleKind::Isolated),
        }
    }

    pub fn summary(&self, checks: &ValidatorChecks) -> SessionSummary {
        SessionSummary {
            counts: self.counts,
            defects: checks
                .enabled_categories()
                .map(|category| (category, self.classifier(category).count()))
                .collect(),
        }
    }

    /// Edge outlines for a face or edge category.
    pub fn edge_segments(
        &self,
        category: DefectCategory,
        transform: &OverlayTransform,
        offset: f32,
    ) -> Vec<[Vec3; 2]> {
        let mesh = &self.snapshot.mesh;
        match self.classifier(category) {
            ClassifierRef::Faces(faces) => faces.project_edges(mesh, transform, offset),
            ClassifierRef::Edges(edges) => edges.project_edges(mesh, transform, offset),
            ClassifierRef::Poles(..) => Vec::new(),
        }
    }

    /// Filled triangles for a face category.
    pub fn face_geometry(
        &self,
        category: DefectCategory,
        transform: &OverlayTransform,
        offset: f32,
    ) -> FaceGeometry {
        match self.classifier(category) {
            ClassifierRef::Faces(faces) => faces.project_faces(&self.snapshot.mesh, transform, offset),
            _ => FaceGeometry::default(),
        }
    }

    /// Point markers for a vertex category.
    pub fn points(
        &self,
        category: DefectCategory,
        transform: &OverlayTransform,
        offset: f32,
    ) -> Vec<Vec3> {
        match self.classifier(category) {
            ClassifierRef::Poles(poles, kind) => {
                poles.project_points(&self.snapshot.mesh, kind, transform, offset)
            }
            _ => Vec::new(),
        }
    }
}
