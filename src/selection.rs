use bevy::prelude::*;

/// Marker component for selected entities
///
/// The validator tracks every entity carrying this marker while mesh
/// tracking is on. Picking is left to the host application.
#[derive(Component, Default)]
pub struct Selected;
