//! Overlay drawing.
//!
//! A thin consumer of the session registry: each frame it pulls projected
//! geometry for every tracked entity and enabled category and draws it with
//! gizmos. It never triggers classification.

use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;

use crate::editor::ValidatorChecks;
use crate::settings::OverlaySettings;
use crate::validator::{OverlayKind, OverlayTransform, SessionRegistry, ValidatorSet};

/// World radius of a point marker per pixel of `point_size`
const POINT_RADIUS_PER_PIXEL: f32 = 0.0025;

/// Gizmo group for validator highlights
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct ValidatorGizmos;

pub struct ValidatorGizmosPlugin;

impl Plugin for ValidatorGizmosPlugin {
    fn build(&self, app: &mut App) {
        app.init_gizmo_group::<ValidatorGizmos>().add_systems(
            Update,
            (sync_gizmo_config, draw_overlay)
                .chain()
                .in_set(ValidatorSet::Draw)
                .run_if(overlay_visible),
        );
    }
}

fn overlay_visible(checks: Res<ValidatorChecks>) -> bool {
    checks.show_overlay
}

/// Configure gizmo appearance
fn sync_gizmo_config(settings: Res<OverlaySettings>, mut config_store: ResMut<GizmoConfigStore>) {
    if !settings.is_changed() {
        return;
    }
    let (config, _) = config_store.config_mut::<ValidatorGizmos>();
    config.line.width = settings.line_width;
}

/// Draw every enabled category for every tracked entity
fn draw_overlay(
    mut gizmos: Gizmos<ValidatorGizmos>,
    registry: Res<SessionRegistry>,
    checks: Res<ValidatorChecks>,
    settings: Res<OverlaySettings>,
    transforms: Query<&GlobalTransform>,
) {
    for session in registry.sessions() {
        let Ok(global) = transforms.get(session.entity()) else {
            continue;
        };
        let transform = OverlayTransform::from_global(global);

        for category in checks.enabled_categories() {
            let style = settings.style(category);
            match category.overlay_kind() {
                OverlayKind::Faces => {
                    let faces = session.face_geometry(category, &transform, style.edges_offset);
                    for [a, b, c] in faces.triangles() {
                        gizmos.linestrip([a, b, c, a], style.color);
                    }
                    let outline = style.color.with_alpha(1.0);
                    for [a, b] in session.edge_segments(category, &transform, style.edges_offset) {
                        gizmos.line(a, b, outline);
                    }
                }
                OverlayKind::Edges => {
                    for [a, b] in session.edge_segments(category, &transform, style.edges_offset) {
                        gizmos.line(a, b, style.color);
                    }
                }
                OverlayKind::Points => {
                    let radius = style.point_size * POINT_RADIUS_PER_PIXEL;
                    for point in session.points(category, &transform, style.points_offset) {
                        gizmos.sphere(Isometry3d::from_translation(point), radius, style.color);
                    }
                }
            }
        }
    }
}
