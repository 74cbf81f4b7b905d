use bevy::prelude::*;

use super::feed::MeshChangeFeed;
use super::registry::SessionRegistry;
use super::systems::{MeshAssetVersions, publish_mesh_changes, run_tracking_cycle};
use crate::editor::ValidatorStatePlugin;
use crate::gizmos::ValidatorGizmosPlugin;
use crate::mesh::source::regenerate_display_meshes;
use crate::settings::OverlaySettingsPlugin;

/// Frame ordering for the validator. Toggles are handled first, sessions are
/// brought up to date next, and the overlay is drawn last from the cached
/// results.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidatorSet {
    /// Apply toggle and settings messages
    Notify,
    /// Publish mesh changes and refresh sessions
    Track,
    /// Pull overlay geometry and draw it
    Draw,
}

/// Configuration for the mesh validator plugin
pub struct MeshValidatorPlugin {
    /// Draw the overlay with gizmos. Needs the render stack.
    pub draw_overlay: bool,
    /// Read `overlay.ron` from the user config directory at startup
    pub load_settings: bool,
}

impl Default for MeshValidatorPlugin {
    fn default() -> Self {
        Self {
            draw_overlay: true,
            load_settings: true,
        }
    }
}

impl MeshValidatorPlugin {
    /// Tracking only: no drawing and no config file access.
    pub fn headless() -> Self {
        Self {
            draw_overlay: false,
            load_settings: false,
        }
    }
}

impl Plugin for MeshValidatorPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(ValidatorStatePlugin)
            .add_plugins(OverlaySettingsPlugin {
                load_from_disk: self.load_settings,
            })
            .init_resource::<SessionRegistry>()
            .init_resource::<MeshChangeFeed>()
            .init_resource::<MeshAssetVersions>()
            .configure_sets(
                Update,
                (ValidatorSet::Notify, ValidatorSet::Track, ValidatorSet::Draw).chain(),
            )
            .add_systems(
                Update,
                (
                    regenerate_display_meshes,
                    publish_mesh_changes,
                    run_tracking_cycle,
                )
                    .chain()
                    .in_set(ValidatorSet::Track),
            );

        if self.draw_overlay {
            app.add_plugins(ValidatorGizmosPlugin);
        }
    }
}
