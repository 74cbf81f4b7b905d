use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::validator::{DefectCategory, ValidatorSet};

/// Overlay appearance that persists to disk
#[derive(Resource, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OverlaySettings {
    /// Edge outline width in pixels (1 to 10)
    pub line_width: f32,
    /// Point marker size in pixels (1 to 20)
    pub point_size: f32,
    /// Distance of point markers above the surface (0.1 to 5)
    pub points_offset: f32,
    /// Distance of edges and faces above the surface (0.1 to 5)
    pub edges_offset: f32,
    pub non_manifold_color: [f32; 4],
    pub triangles_color: [f32; 4],
    pub ngons_color: [f32; 4],
    pub e_poles_color: [f32; 4],
    pub n_poles_color: [f32; 4],
    pub more_poles_color: [f32; 4],
    pub isolated_verts_color: [f32; 4],
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            line_width: 3.0,
            point_size: 10.0,
            points_offset: 0.15,
            edges_offset: 0.1,
            non_manifold_color: [0.5, 1.0, 0.5, 1.0],
            triangles_color: [0.7, 0.7, 0.05, 0.4],
            ngons_color: [0.7, 0.07, 0.06, 0.4],
            e_poles_color: [0.5, 0.625, 1.0, 1.0],
            n_poles_color: [0.5, 1.0, 0.5, 1.0],
            more_poles_color: [1.0, 0.145, 0.145, 1.0],
            isolated_verts_color: [1.0, 0.5, 0.5, 1.0],
        }
    }
}

/// Resolved drawing parameters for one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub color: Color,
    pub line_width: f32,
    pub point_size: f32,
    pub edges_offset: f32,
    pub points_offset: f32,
}

impl OverlaySettings {
    /// Copy with every numeric field pulled back into its valid range.
    pub fn clamped(&self) -> Self {
        Self {
            line_width: self.line_width.clamp(1.0, 10.0),
            point_size: self.point_size.clamp(1.0, 20.0),
            points_offset: self.points_offset.clamp(0.1, 5.0),
            edges_offset: self.edges_offset.clamp(0.1, 5.0),
            ..self.clone()
        }
    }

    pub fn color(&self, category: DefectCategory) -> Color {
        let [r, g, b, a] = match category {
            DefectCategory::Triangles => self.triangles_color,
            DefectCategory::Ngons => self.ngons_color,
            DefectCategory::NonManifold => self.non_manifold_color,
            DefectCategory::NPoles => self.n_poles_color,
            DefectCategory::EPoles => self.e_poles_color,
            DefectCategory::MorePoles => self.more_poles_color,
            DefectCategory::IsolatedVerts => self.isolated_verts_color,
        };
        Color::srgba(r, g, b, a)
    }

    pub fn style(&self, category: DefectCategory) -> OverlayStyle {
        OverlayStyle {
            color: self.color(category),
            line_width: self.line_width,
            point_size: self.point_size,
            edges_offset: self.edges_offset,
            points_offset: self.points_offset,
        }
    }

    /// Get the settings file path
    fn file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("bevy_mesh_validator");
            p.push("overlay.ron");
            p
        })
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            return Self::default();
        };

        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        match ron::from_str::<Self>(&content) {
            Ok(settings) => settings.clamped(),
            Err(e) => {
                error!("Failed to parse overlay settings {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::file_path() else {
            error!("Could not determine config directory");
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {}", e);
                return;
            }
        }

        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(content) => {
                if let Err(e) = fs::write(&path, content) {
                    error!("Failed to save overlay settings: {}", e);
                } else {
                    info!("Overlay settings saved to: {:?}", path);
                }
            }
            Err(e) => {
                error!("Failed to serialize overlay settings: {}", e);
            }
        }
    }
}

/// Event to write the current overlay settings to disk
#[derive(Message)]
pub struct SaveOverlaySettingsEvent;

pub struct OverlaySettingsPlugin {
    pub load_from_disk: bool,
}

impl Plugin for OverlaySettingsPlugin {
    fn build(&self, app: &mut App) {
        let settings = if self.load_from_disk {
            OverlaySettings::load()
        } else {
            OverlaySettings::default()
        };
        app.insert_resource(settings)
            .add_message::<SaveOverlaySettingsEvent>()
            .add_systems(
                Update,
                (clamp_overlay_settings, handle_save_settings)
                    .chain()
                    .in_set(ValidatorSet::Notify),
            );
    }
}

/// Keep externally edited values inside their ranges
fn clamp_overlay_settings(mut settings: ResMut<OverlaySettings>) {
    if !settings.is_changed() {
        return;
    }
    let clamped = settings.clamped();
    if *settings != clamped {
        *settings = clamped;
    }
}

fn handle_save_settings(
    mut events: MessageReader<SaveOverlaySettingsEvent>,
    settings: Res<OverlaySettings>,
) {
    if events.read().count() > 0 {
        settings.save();
    }
}
