//! # Bevy Mesh Validator
//!
//! Live topology diagnostics for Bevy editors. Selected meshes are scanned
//! for triangles, n-gons, non-manifold edges, poles and isolated vertices,
//! and the matches are highlighted in the viewport as the mesh is edited.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bevy::prelude::*;
//! use bevy_mesh_validator::MeshValidatorPlugin;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(MeshValidatorPlugin::default())
//!         .run();
//! }
//! ```
//!
//! ## Tracking Meshes
//!
//! Give an entity an `EditablePolyMesh` (or a plain `Mesh3d`) and mark it
//! `Selected`, then switch tracking on:
//!
//! ```ignore
//! commands.spawn((
//!     EditablePolyMesh::new(PolyMesh::from_polygons(&positions, &polygons)),
//!     Transform::default(),
//!     Selected,
//! ));
//!
//! checks.check_data = true;
//! checks.show_overlay = true;
//! ```
//!
//! ## Modes
//!
//! - **Object mode**: sessions classify a copy of the stored mesh once
//! - **Edit mode**: sessions follow the live `EditablePolyMesh` and
//!   reclassify whenever an edit changes its element counts

pub mod editor;
pub mod gizmos;
pub mod mesh;
pub mod selection;
pub mod settings;
pub mod validator;

// Re-export the main plugin
pub use validator::{MeshValidatorPlugin, ValidatorSet};

// Re-export mesh types
pub use mesh::{EditablePolyMesh, MeshCounts, PolyMesh};

// Re-export selection types
pub use selection::Selected;

// Re-export editor state types
pub use editor::{
    InteractionMode, SetCheckEvent, ToggleOverlayEvent, ToggleTrackingEvent, ValidatorChecks,
};

// Re-export validator types
pub use validator::{DefectCategory, MeshChangeFeed, SessionRegistry};

// Re-export settings
pub use settings::{OverlaySettings, SaveOverlaySettingsEvent};
