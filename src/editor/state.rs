use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::validator::{DefectCategory, ValidatorSet};

/// How the user is currently interacting with meshes.
///
/// Object and Edit mode see different mesh representations (stored copy vs.
/// live edit mesh), so every validator session is rebuilt when this changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, States)]
pub enum InteractionMode {
    /// Whole objects are selected and transformed
    #[default]
    Object,
    /// The live mesh of the selection is being edited
    Edit,
}

/// Session-level validator toggles (not persisted).
#[derive(Debug, Clone, Resource)]
pub struct ValidatorChecks {
    /// Whether selected meshes are tracked and classified
    pub check_data: bool,
    /// Whether the overlay is drawn
    pub show_overlay: bool,
    enabled: [bool; DefectCategory::COUNT],
}

impl Default for ValidatorChecks {
    fn default() -> Self {
        let mut enabled = [false; DefectCategory::COUNT];
        enabled[DefectCategory::Triangles.index()] = true;
        Self {
            check_data: false,
            show_overlay: false,
            enabled,
        }
    }
}

impl ValidatorChecks {
    /// Toggles with every category switched off.
    pub fn none() -> Self {
        Self {
            enabled: [false; DefectCategory::COUNT],
            ..default()
        }
    }

    /// Toggles with every category switched on.
    pub fn all() -> Self {
        Self {
            enabled: [true; DefectCategory::COUNT],
            ..default()
        }
    }

    pub fn is_enabled(&self, category: DefectCategory) -> bool {
        self.enabled[category.index()]
    }

    pub fn set(&mut self, category: DefectCategory, enabled: bool) {
        self.enabled[category.index()] = enabled;
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, category: DefectCategory, enabled: bool) -> Self {
        self.set(category, enabled);
        self
    }

    /// Enabled categories in display order.
    pub fn enabled_categories(&self) -> impl Iterator<Item = DefectCategory> + '_ {
        DefectCategory::ALL
            .into_iter()
            .filter(|&category| self.is_enabled(category))
    }

    pub fn any_enabled(&self) -> bool {
        self.enabled.iter().any(|&e| e)
    }

    /// Tracking is on and at least one category is enabled.
    pub fn poll(&self) -> bool {
        self.check_data && self.any_enabled()
    }
}

/// Event to toggle mesh tracking on/off
#[derive(Message)]
pub struct ToggleTrackingEvent;

/// Event to toggle overlay drawing on/off
#[derive(Message)]
pub struct ToggleOverlayEvent;

/// Event to enable or disable a single defect category
#[derive(Message)]
pub struct SetCheckEvent {
    pub category: DefectCategory,
    pub enabled: bool,
}

pub struct ValidatorStatePlugin;

impl Plugin for ValidatorStatePlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<StatesPlugin>() {
            app.add_plugins(StatesPlugin);
        }

        app.init_state::<InteractionMode>()
            .init_resource::<ValidatorChecks>()
            .add_message::<ToggleTrackingEvent>()
            .add_message::<ToggleOverlayEvent>()
            .add_message::<SetCheckEvent>()
            .add_systems(
                Update,
                (handle_toggle_tracking, handle_toggle_overlay, handle_set_check)
                    .in_set(ValidatorSet::Notify),
            );
    }
}

/// Handle toggling mesh tracking
fn handle_toggle_tracking(
    mut events: MessageReader<ToggleTrackingEvent>,
    mut checks: ResMut<ValidatorChecks>,
) {
    for _ in events.read() {
        checks.check_data = !checks.check_data;
        info!(
            "Mesh validation: {}",
            if checks.check_data { "ON" } else { "OFF" }
        );
    }
}

/// Handle toggling the overlay
fn handle_toggle_overlay(
    mut events: MessageReader<ToggleOverlayEvent>,
    mut checks: ResMut<ValidatorChecks>,
) {
    for _ in events.read() {
        checks.show_overlay = !checks.show_overlay;
        info!(
            "Validation overlay: {}",
            if checks.show_overlay { "VISIBLE" } else { "HIDDEN" }
        );
    }
}

/// Handle switching a single category on or off
fn handle_set_check(mut events: MessageReader<SetCheckEvent>, mut checks: ResMut<ValidatorChecks>) {
    for event in events.read() {
        checks.set(event.category, event.enabled);
        debug!(
            "{} check: {}",
            event.category.display_name(),
            if event.enabled { "ON" } else { "OFF" }
        );
    }
}
