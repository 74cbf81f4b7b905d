//! Host-side editable mesh component.
//!
//! `EditablePolyMesh` is the live polygon representation of an entity. While
//! present it governs the entity's display mesh: `regenerate_display_meshes`
//! rebuilds `Mesh3d` from it whenever it changes. Every mutable access bumps a
//! version counter, which validator sessions compare to decide whether their
//! snapshot is out of date.

use bevy::prelude::*;

use super::poly_mesh::PolyMesh;

/// Live, versioned polygon mesh attached to an entity.
#[derive(Component, Debug, Clone)]
pub struct EditablePolyMesh {
    mesh: PolyMesh,
    version: u64,
}

impl EditablePolyMesh {
    pub fn new(mesh: PolyMesh) -> Self {
        Self { mesh, version: 0 }
    }

    pub fn mesh(&self) -> &PolyMesh {
        &self.mesh
    }

    /// Number of edits applied since creation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Mutable access to the mesh. Counts as an edit.
    pub fn edit(&mut self) -> &mut PolyMesh {
        self.version += 1;
        &mut self.mesh
    }
}

/// Rebuild `Mesh3d` for entities whose `EditablePolyMesh` changed (or was just
/// added).
pub fn regenerate_display_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    changed: Query<(Entity, &EditablePolyMesh, Option<&Mesh3d>), Changed<EditablePolyMesh>>,
) {
    for (entity, editable, mesh_handle) in &changed {
        let display = editable.mesh().to_bevy_mesh();
        match mesh_handle.and_then(|handle| meshes.get_mut(&handle.0)) {
            Some(mut existing) => *existing = display,
            None => {
                let handle = meshes.add(display);
                commands.entity(entity).insert(Mesh3d(handle));
            }
        }
    }
}
