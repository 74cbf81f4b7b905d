//! The set of live validation sessions.
//!
//! The registry is empty whenever tracking is off. While tracking, it keeps
//! exactly one session per selected mesh entity, all built for the same
//! interaction mode. A mode change throws every session away.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use super::DefectCategory;
use super::classify::FaceGeometry;
use super::feed::{FeedSubscription, MeshChange, MeshChangeFeed};
use super::projection::OverlayTransform;
use super::session::{MeshProvider, MeshSession, SessionSummary};
use crate::editor::{InteractionMode, ValidatorChecks};

#[derive(Resource, Default)]
pub struct SessionRegistry {
    sessions: HashMap<Entity, MeshSession>,
    /// Mode the sessions were built in, `None` while not tracking
    mode: Option<InteractionMode>,
    subscription: Option<FeedSubscription>,
}

impl SessionRegistry {
    pub fn is_tracking(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn mode(&self) -> Option<InteractionMode> {
        self.mode
    }

    /// Start tracking: subscribe to change notifications and bind a session
    /// for every selected mesh.
    pub fn enable_tracking(
        &mut self,
        feed: &mut MeshChangeFeed,
        mode: InteractionMode,
        selection: &[Entity],
        provider: &impl MeshProvider,
        checks: &ValidatorChecks,
    ) {
        self.sessions.clear();
        if self.subscription.is_none() {
            self.subscription = Some(feed.subscribe());
        }
        self.mode = Some(mode);
        self.add_sessions(selection, provider, checks);
        info!(
            "Mesh tracking started ({} mesh(es), {:?} mode)",
            self.sessions.len(),
            mode
        );
    }

    /// Stop tracking and drop every session.
    pub fn disable_tracking(&mut self, feed: &mut MeshChangeFeed) {
        if let Some(subscription) = self.subscription.take() {
            feed.unsubscribe(subscription);
            info!("Mesh tracking stopped");
        }
        self.sessions.clear();
        self.mode = None;
    }

    /// Reconcile sessions with the current selection and mode.
    pub fn on_selection_or_mode_changed(
        &mut self,
        mode: InteractionMode,
        selection: &[Entity],
        provider: &impl MeshProvider,
        checks: &ValidatorChecks,
    ) {
        if !self.is_tracking() {
            return;
        }

        if self.mode != Some(mode) {
            info!("Interaction mode changed to {:?}, rebuilding sessions", mode);
            self.sessions.clear();
            self.mode = Some(mode);
            self.add_sessions(selection, provider, checks);
            return;
        }

        // Drop deselected and despawned entities
        self.sessions.retain(|entity, _| {
            selection.contains(entity) && provider.mesh_version(*entity, mode).is_some()
        });
        self.add_sessions(selection, provider, checks);
    }

    fn add_sessions(
        &mut self,
        selection: &[Entity],
        provider: &impl MeshProvider,
        checks: &ValidatorChecks,
    ) {
        let Some(mode) = self.mode else {
            return;
        };
        for &entity in selection {
            if self.sessions.contains_key(&entity) {
                continue;
            }
            let Some(snapshot) = provider.snapshot(entity, mode) else {
                continue;
            };
            debug!("Binding validation session for {:?}", entity);
            self.sessions
                .insert(entity, MeshSession::bind(entity, snapshot, checks));
        }
    }

    /// Forward a change to its session. Only acts in Edit mode.
    ///
    /// Returns `true` if the session reclassified.
    pub fn on_mesh_changed(
        &mut self,
        change: MeshChange,
        provider: &impl MeshProvider,
        checks: &ValidatorChecks,
    ) -> bool {
        if !self.is_tracking() || !checks.poll() || !change.geometry_updated {
            return false;
        }
        let Some(mode @ InteractionMode::Edit) = self.mode else {
            return false;
        };
        let Some(session) = self.sessions.get_mut(&change.entity) else {
            return false;
        };
        session.refresh_if_stale(provider, mode, checks)
    }

    /// Drain pending notifications and dispatch each one.
    pub fn process_feed(
        &mut self,
        feed: &mut MeshChangeFeed,
        provider: &impl MeshProvider,
        checks: &ValidatorChecks,
    ) {
        let Some(subscription) = &self.subscription else {
            return;
        };
        let changes = feed.drain(subscription);
        for change in changes {
            self.on_mesh_changed(change, provider, checks);
        }
    }

    /// Catch a freshly enabled category up on every session.
    pub fn on_check_enabled(&mut self, category: DefectCategory) {
        for session in self.sessions.values_mut() {
            session.refresh_category(category);
        }
    }

    pub fn session(&self, entity: Entity) -> Option<&MeshSession> {
        self.sessions.get(&entity)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &MeshSession> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn summary(&self, entity: Entity, checks: &ValidatorChecks) -> Option<SessionSummary> {
        Some(self.session(entity)?.summary(checks))
    }

    pub fn edge_positions(
        &self,
        entity: Entity,
        category: DefectCategory,
        transform: &OverlayTransform,
        offset: f32,
    ) -> Vec<[Vec3; 2]> {
        self.session(entity)
            .map(|session| session.edge_segments(category, transform, offset))
            .unwrap_or_default()
    }

    pub fn face_geometry(
        &self,
        entity: Entity,
        category: DefectCategory,
        transform: &OverlayTransform,
        offset: f32,
    ) -> FaceGeometry {
        self.session(entity)
            .map(|session| session.face_geometry(category, transform, offset))
            .unwrap_or_default()
    }

    pub fn point_positions(
        &self,
        entity: Entity,
        category: DefectCategory,
        transform: &OverlayTransform,
        offset: f32,
    ) -> Vec<Vec3> {
        self.session(entity)
            .map(|session| session.points(category, transform, offset))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::poly_mesh::fixtures::*;
    use crate::validator::session::SnapshotOrigin;
    use crate::validator::session::test_provider::{TestProvider, entity};

    struct Harness {
        registry: SessionRegistry,
        feed: MeshChangeFeed,
        provider: TestProvider,
        checks: ValidatorChecks,
    }

    impl Harness {
        fn new() -> Self {
            let mut checks = ValidatorChecks::all();
            checks.check_data = true;
            Self {
                registry: SessionRegistry::default(),
                feed: MeshChangeFeed::default(),
                provider: TestProvider::default(),
                checks,
            }
        }

        fn mesh_entity(&mut self, mesh: crate::mesh::PolyMesh) -> Entity {
            let entity = entity();
            self.provider.insert(entity, mesh);
            entity
        }

        fn enable(&mut self, mode: InteractionMode, selection: &[Entity]) {
            self.registry.enable_tracking(
                &mut self.feed,
                mode,
                selection,
                &self.provider,
                &self.checks,
            );
        }

        fn reconcile(&mut self, mode: InteractionMode, selection: &[Entity]) {
            self.registry.on_selection_or_mode_changed(
                mode,
                selection,
                &self.provider,
                &self.checks,
            );
        }

        fn notify(&mut self, entity: Entity) {
            self.feed.publish(MeshChange {
                entity,
                geometry_updated: true,
            });
            self.registry
                .process_feed(&mut self.feed, &self.provider, &self.checks);
        }

        fn triangle_count(&self, entity: Entity) -> Option<usize> {
            self.registry
                .session(entity)
                .map(|s| s.classifier(DefectCategory::Triangles).count())
        }
    }

    fn add_roof(mesh: &mut crate::mesh::PolyMesh) {
        let apex = mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        mesh.add_face(&[7, 6, apex]);
    }

    #[test]
    fn enable_binds_selected_meshes_only() {
        let mut h = Harness::new();
        let a = h.mesh_entity(cube());
        let b = h.mesh_entity(single_triangle());
        let not_a_mesh = entity();

        h.enable(InteractionMode::Object, &[a, not_a_mesh]);
        assert!(h.registry.is_tracking());
        assert_eq!(h.registry.len(), 1);
        assert!(h.registry.session(a).is_some());
        assert!(h.registry.session(b).is_none());
        assert_eq!(h.feed.subscriber_count(), 1);
    }

    #[test]
    fn enable_twice_keeps_one_subscription() {
        let mut h = Harness::new();
        let a = h.mesh_entity(cube());
        h.enable(InteractionMode::Object, &[a]);
        h.enable(InteractionMode::Object, &[a]);
        assert_eq!(h.feed.subscriber_count(), 1);
        assert_eq!(h.registry.len(), 1);
    }

    #[test]
    fn disable_empties_registry_and_unsubscribes() {
        let mut h = Harness::new();
        let a = h.mesh_entity(cube());
        h.enable(InteractionMode::Edit, &[a]);
        h.registry.disable_tracking(&mut h.feed);

        assert!(!h.registry.is_tracking());
        assert!(h.registry.is_empty());
        assert_eq!(h.registry.mode(), None);
        assert_eq!(h.feed.subscriber_count(), 0);
    }

    #[test]
    fn mode_change_rebuilds_every_session() {
        let mut h = Harness::new();
        let a = h.mesh_entity(cube());
        h.enable(InteractionMode::Object, &[a]);
        assert_eq!(
            h.registry.session(a).map(|s| s.snapshot().origin),
            Some(SnapshotOrigin::StoredCopy)
        );

        h.reconcile(InteractionMode::Edit, &[a]);
        assert_eq!(h.registry.mode(), Some(InteractionMode::Edit));
        assert_eq!(
            h.registry.session(a).map(|s| s.snapshot().origin),
            Some(SnapshotOrigin::LiveEdit)
        );
    }

    #[test]
    fn selection_changes_add_and_remove_sessions() {
        let mut h = Harness::new();
        let a = h.mesh_entity(cube());
        let b = h.mesh_entity(regular_polygon(6));
        h.enable(InteractionMode::Object, &[a]);

        h.reconcile(InteractionMode::Object, &[a, b]);
        assert_eq!(h.registry.len(), 2);

        h.reconcile(InteractionMode::Object, &[b]);
        assert!(h.registry.session(a).is_none());
        assert!(h.registry.session(b).is_some());
    }

    #[test]
    fn despawned_entities_are_dropped() {
        let mut h = Harness::new();
        let a = h.mesh_entity(cube());
        h.enable(InteractionMode::Object, &[a]);

        h.provider.meshes.remove(&a);
        h.reconcile(InteractionMode::Object, &[a]);
        assert!(h.registry.is_empty());
    }

    #[test]
    fn edits_refresh_sessions_in_edit_mode() {
        let mut h = Harness::new();
        let a = h.mesh_entity(cube());
        h.enable(InteractionMode::Edit, &[a]);
        assert_eq!(h.triangle_count(a), Some(0));

        h.provider.edit(a, add_roof);
        h.notify(a);
        assert_eq!(h.triangle_count(a), Some(1));
        assert_eq!(h.registry.session(a).map(|s| s.current_counts().verts), Some(9));
    }

    #[test]
    fn edits_are_ignored_in_object_mode() {
        let mut h = Harness::new();
        let a = h.mesh_entity(cube());
        h.enable(InteractionMode::Object, &[a]);

        h.provider.edit(a, add_roof);
        h.notify(a);
        assert_eq!(h.triangle_count(a), Some(0));
    }

    #[test]
    fn edits_are_ignored_when_no_category_is_enabled() {
        let mut h = Harness::new();
        let a = h.mesh_entity(cube());
        h.enable(InteractionMode::Edit, &[a]);

        h.checks = ValidatorChecks::none();
        h.checks.check_data = true;
        h.provider.edit(a, add_roof);
        h.notify(a);
        assert_eq!(h.registry.session(a).map(|s| s.current_counts().verts), Some(8));
    }

    #[test]
    fn attribute_only_changes_are_ignored() {
        let mut h = Harness::new();
        let a = h.mesh_entity(cube());
        h.enable(InteractionMode::Edit, &[a]);
        h.provider.edit(a, add_roof);

        let change = MeshChange {
            entity: a,
            geometry_updated: false,
        };
        assert!(!h.registry.on_mesh_changed(change, &h.provider, &h.checks));
        assert_eq!(h.triangle_count(a), Some(0));
    }

    #[test]
    fn count_preserving_edit_is_not_detected() {
        let mut h = Harness::new();
        let a = h.mesh_entity(regular_polygon(5));
        h.enable(InteractionMode::Edit, &[a]);
        assert_eq!(
            h.registry
                .session(a)
                .map(|s| s.classifier(DefectCategory::Ngons).count()),
            Some(1)
        );

        // Reverse the pentagon's winding: same counts, different loop
        h.provider.edit(a, |mesh| {
            mesh.remove_face(0);
            mesh.add_face(&[4, 3, 2, 1, 0]);
        });
        let change = MeshChange {
            entity: a,
            geometry_updated: true,
        };
        assert!(!h.registry.on_mesh_changed(change, &h.provider, &h.checks));
        // The snapshot still follows the host version
        assert_eq!(h.registry.session(a).map(|s| s.snapshot().version), Some(1));
    }

    #[test]
    fn lazy_enable_fills_new_category() {
        let mut h = Harness::new();
        h.checks = ValidatorChecks::none().with(DefectCategory::Triangles, true);
        h.checks.check_data = true;
        let a = h.mesh_entity(regular_polygon(7));
        h.enable(InteractionMode::Object, &[a]);
        let ngons = |h: &Harness| {
            h.registry
                .session(a)
                .map(|s| s.classifier(DefectCategory::Ngons).count())
        };
        assert_eq!(ngons(&h), Some(0));

        h.checks.set(DefectCategory::Ngons, true);
        h.registry.on_check_enabled(DefectCategory::Ngons);
        assert_eq!(ngons(&h), Some(1));
    }

    #[test]
    fn render_pull_for_unknown_entity_is_empty() {
        let h = Harness::new();
        let transform = OverlayTransform::identity();
        let nobody = entity();
        assert!(
            h.registry
                .edge_positions(nobody, DefectCategory::Ngons, &transform, 0.1)
                .is_empty()
        );
        assert!(
            h.registry
                .face_geometry(nobody, DefectCategory::Ngons, &transform, 0.1)
                .is_empty()
        );
        assert!(
            h.registry
                .point_positions(nobody, DefectCategory::NPoles, &transform, 0.15)
                .is_empty()
        );
    }
}
