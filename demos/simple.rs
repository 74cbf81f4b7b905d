//! Simple example showing the mesh validator overlay.
//!
//! Run with: `cargo run --example simple`
//!
//! Spawns a few meshes that each carry a different defect, all selected.
//! - Press 'T' to toggle tracking and 'O' to toggle the overlay
//! - Press '1'..'7' to toggle a defect category
//! - Press 'Tab' to switch between Object and Edit mode
//! - Press 'E' in Edit mode to pull a new triangle out of the first mesh
//! - Press 'S' to save the overlay settings

use bevy::prelude::*;
use bevy_mesh_validator::{
    DefectCategory, EditablePolyMesh, InteractionMode, MeshValidatorPlugin, PolyMesh,
    SaveOverlaySettingsEvent, Selected, SetCheckEvent, ToggleOverlayEvent, ToggleTrackingEvent,
    ValidatorChecks,
};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Bevy Mesh Validator - Simple Example".to_string(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(MeshValidatorPlugin::default())
        .add_systems(Startup, setup_scene)
        .add_systems(Update, (handle_keys, grow_first_mesh))
        .run();
}

/// First spawned mesh, the target of the edit key
#[derive(Component)]
struct EditTarget;

fn cube_positions() -> Vec<Vec3> {
    vec![
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(0.5, 0.5, -0.5),
        Vec3::new(-0.5, 0.5, -0.5),
        Vec3::new(-0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(0.5, 0.5, 0.5),
        Vec3::new(-0.5, 0.5, 0.5),
    ]
}

fn cube_faces() -> Vec<Vec<u32>> {
    vec![
        vec![4, 5, 6, 7],
        vec![1, 0, 3, 2],
        vec![5, 1, 2, 6],
        vec![0, 4, 7, 3],
        vec![7, 6, 2, 3],
        vec![0, 1, 5, 4],
    ]
}

fn setup_scene(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 4.0, 9.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight::default(),
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.6, 0.6, 0.65),
        ..default()
    });

    // Quad cube, every corner an n-pole
    commands.spawn((
        Name::new("Cube"),
        EditablePolyMesh::new(PolyMesh::from_polygons(&cube_positions(), &cube_faces())),
        MeshMaterial3d(material.clone()),
        Transform::from_xyz(-3.0, 0.0, 0.0),
        Selected,
        EditTarget,
    ));

    // Octagon n-gon
    let octagon: Vec<Vec3> = (0..8)
        .map(|i| {
            let angle = i as f32 / 8.0 * std::f32::consts::TAU;
            Vec3::new(angle.cos(), 0.0, -angle.sin())
        })
        .collect();
    commands.spawn((
        Name::new("Octagon"),
        EditablePolyMesh::new(PolyMesh::from_polygons(&octagon, &[(0..8).collect()])),
        MeshMaterial3d(material.clone()),
        Transform::from_xyz(-1.0, 0.0, 0.0),
        Selected,
    ));

    // Three triangles on one edge, plus a stray vertex
    let mut fan = PolyMesh::from_polygons(
        &[
            Vec3::ZERO,
            Vec3::Y,
            Vec3::X,
            Vec3::Z,
            Vec3::new(-1.0, 0.0, -1.0),
        ],
        &[vec![0, 1, 2], vec![0, 1, 3], vec![0, 1, 4]],
    );
    fan.add_vertex(Vec3::new(0.0, 1.5, 0.0), Vec3::Y);
    commands.spawn((
        Name::new("Fan"),
        EditablePolyMesh::new(fan),
        MeshMaterial3d(material.clone()),
        Transform::from_xyz(1.5, 0.0, 0.0),
        Selected,
    ));

    // Plain Bevy sphere, tracked through its asset
    commands.spawn((
        Name::new("Sphere"),
        Mesh3d(meshes.add(Sphere::new(0.7).mesh().uv(12, 8))),
        MeshMaterial3d(material),
        Transform::from_xyz(3.5, 0.0, 0.0),
        Selected,
    ));
}

fn handle_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    checks: Res<ValidatorChecks>,
    mode: Res<State<InteractionMode>>,
    mut next_mode: ResMut<NextState<InteractionMode>>,
    mut toggle_tracking: MessageWriter<ToggleTrackingEvent>,
    mut toggle_overlay: MessageWriter<ToggleOverlayEvent>,
    mut set_check: MessageWriter<SetCheckEvent>,
    mut save: MessageWriter<SaveOverlaySettingsEvent>,
) {
    if keyboard.just_pressed(KeyCode::KeyT) {
        toggle_tracking.write(ToggleTrackingEvent);
    }
    if keyboard.just_pressed(KeyCode::KeyO) {
        toggle_overlay.write(ToggleOverlayEvent);
    }
    if keyboard.just_pressed(KeyCode::KeyS) {
        save.write(SaveOverlaySettingsEvent);
    }
    if keyboard.just_pressed(KeyCode::Tab) {
        next_mode.set(match mode.get() {
            InteractionMode::Object => InteractionMode::Edit,
            InteractionMode::Edit => InteractionMode::Object,
        });
    }

    let digits = [
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
        KeyCode::Digit5,
        KeyCode::Digit6,
        KeyCode::Digit7,
    ];
    for (key, category) in digits.into_iter().zip(DefectCategory::ALL) {
        if keyboard.just_pressed(key) {
            set_check.write(SetCheckEvent {
                category,
                enabled: !checks.is_enabled(category),
            });
        }
    }
}

/// Extrude a triangle off the first face of the edit target
fn grow_first_mesh(
    keyboard: Res<ButtonInput<KeyCode>>,
    mode: Res<State<InteractionMode>>,
    mut targets: Query<&mut EditablePolyMesh, With<EditTarget>>,
) {
    if !keyboard.just_pressed(KeyCode::KeyE) || *mode.get() != InteractionMode::Edit {
        return;
    }
    let Ok(mut editable) = targets.single_mut() else {
        return;
    };

    let mesh = editable.edit();
    let Some(face) = mesh.faces.first() else {
        return;
    };
    let [a, b] = [face.vertices[0], face.vertices[1]];
    let normal = mesh.face_newell_normal(0);
    let base = (mesh.vertices[a as usize].position + mesh.vertices[b as usize].position) * 0.5;
    let height = 0.3 + mesh.vertices.len() as f32 * 0.05;
    let apex = mesh.add_vertex(base + normal * height, normal);
    mesh.add_face(&[a, b, apex]);
    mesh.recompute_normals();
}
