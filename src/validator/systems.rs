use bevy::ecs::system::SystemParam;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use super::DefectCategory;
use super::feed::{MeshChange, MeshChangeFeed};
use super::registry::SessionRegistry;
use super::session::{MeshProvider, MeshSnapshot, SnapshotOrigin};
use crate::editor::{InteractionMode, ValidatorChecks};
use crate::mesh::{EditablePolyMesh, PolyMesh};
use crate::selection::Selected;

/// Version stamps for mesh assets.
///
/// Stamps come from one shared counter, so two different assets never carry
/// the same version once stamped. An asset is restamped when it is modified
/// and whenever an entity starts pointing at it.
#[derive(Resource, Default)]
pub struct MeshAssetVersions {
    last_stamp: u64,
    versions: HashMap<AssetId<Mesh>, u64>,
}

impl MeshAssetVersions {
    pub fn get(&self, id: AssetId<Mesh>) -> u64 {
        self.versions.get(&id).copied().unwrap_or(0)
    }

    fn stamp(&mut self, id: AssetId<Mesh>) {
        self.last_stamp += 1;
        self.versions.insert(id, self.last_stamp);
    }
}

/// Reads entity meshes out of the world.
///
/// An `EditablePolyMesh` wins over the entity's `Mesh3d` asset. In Edit mode
/// it is reported as the live mesh; everything else is a stored copy.
#[derive(SystemParam)]
pub struct EcsMeshProvider<'w, 's> {
    editable: Query<'w, 's, &'static EditablePolyMesh>,
    stored: Query<'w, 's, &'static Mesh3d>,
    meshes: Res<'w, Assets<Mesh>>,
    versions: Res<'w, MeshAssetVersions>,
}

impl MeshProvider for EcsMeshProvider<'_, '_> {
    fn mesh_version(&self, entity: Entity, _mode: InteractionMode) -> Option<u64> {
        if let Ok(editable) = self.editable.get(entity) {
            return Some(editable.version());
        }
        let handle = self.stored.get(entity).ok()?;
        self.meshes
            .contains(&handle.0)
            .then(|| self.versions.get(handle.0.id()))
    }

    fn snapshot(&self, entity: Entity, mode: InteractionMode) -> Option<MeshSnapshot> {
        if let Ok(editable) = self.editable.get(entity) {
            return Some(MeshSnapshot {
                mesh: editable.mesh().clone(),
                version: editable.version(),
                origin: match mode {
                    InteractionMode::Edit => SnapshotOrigin::LiveEdit,
                    InteractionMode::Object => SnapshotOrigin::StoredCopy,
                },
            });
        }

        let handle = self.stored.get(entity).ok()?;
        let mesh = self.meshes.get(&handle.0)?;
        Some(MeshSnapshot {
            mesh: PolyMesh::from_bevy_mesh(mesh)?,
            version: self.versions.get(handle.0.id()),
            origin: SnapshotOrigin::StoredCopy,
        })
    }
}

/// Turn ECS change detection and asset events into feed notifications.
pub(crate) fn publish_mesh_changes(
    mut feed: ResMut<MeshChangeFeed>,
    mut versions: ResMut<MeshAssetVersions>,
    mut asset_events: MessageReader<AssetEvent<Mesh>>,
    edited: Query<Entity, Changed<EditablePolyMesh>>,
    reassigned: Query<(Entity, &Mesh3d), (Changed<Mesh3d>, Without<EditablePolyMesh>)>,
    stored: Query<(Entity, &Mesh3d), Without<EditablePolyMesh>>,
) {
    for entity in &edited {
        feed.publish(MeshChange {
            entity,
            geometry_updated: true,
        });
    }

    // A swapped handle points at a different asset
    for (entity, handle) in &reassigned {
        versions.stamp(handle.0.id());
        feed.publish(MeshChange {
            entity,
            geometry_updated: true,
        });
    }

    for event in asset_events.read() {
        let AssetEvent::Modified { id } = event else {
            continue;
        };
        versions.stamp(*id);
        for (entity, handle) in &stored {
            if handle.0.id() == *id {
                feed.publish(MeshChange {
                    entity,
                    geometry_updated: true,
                });
            }
        }
    }
}

/// One notification cycle: follow the tracking toggle, catch up newly
/// enabled categories, reconcile with selection and mode, then dispatch
/// pending changes.
pub(crate) fn run_tracking_cycle(
    mut registry: ResMut<SessionRegistry>,
    mut feed: ResMut<MeshChangeFeed>,
    mut checks: ResMut<ValidatorChecks>,
    mut previously_enabled: Local<Vec<DefectCategory>>,
    mode: Res<State<InteractionMode>>,
    selected: Query<Entity, With<Selected>>,
    provider: EcsMeshProvider,
) {
    let mode = *mode.get();
    let selection: Vec<Entity> = selected.iter().collect();

    if checks.check_data && selection.is_empty() {
        info!("Nothing selected, mesh validation switched off");
        checks.check_data = false;
    }

    match (checks.check_data, registry.is_tracking()) {
        (true, false) => registry.enable_tracking(&mut feed, mode, &selection, &provider, &checks),
        (false, true) => registry.disable_tracking(&mut feed),
        _ => {}
    }

    let enabled: Vec<DefectCategory> = checks.enabled_categories().collect();
    for &category in &enabled {
        if !previously_enabled.contains(&category) {
            registry.on_check_enabled(category);
        }
    }
    *previously_enabled = enabled;

    if !registry.is_tracking() {
        return;
    }

    registry.on_selection_or_mode_changed(mode, &selection, &provider, &checks);
    registry.process_feed(&mut feed, &provider, &checks);
}
