//! Executes the frame's draw list with Bevy.
//!
//! Lines and the vehicle become quads in a single vertex-coloured mesh that
//! is rewritten in place each frame. The clear command sets [`ClearColor`]
//! and the text command drives one `Text2d`.

use bevy::{
    prelude::*,
    render::{
        mesh::{Indices, PrimitiveTopology},
        render_asset::RenderAssetUsages,
        view::NoFrustumCulling,
    },
    sprite::Anchor,
};

use super::{DrawCommand, DrawList};
use crate::game_state::TickSet;

pub struct CanvasPlugin;

impl Plugin for CanvasPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_canvas)
            .add_systems(Update, paint_canvas.after(TickSet));
    }
}

/// Marker for the mesh entity holding trail and vehicle geometry.
#[derive(Component)]
pub struct TrailCanvas;

/// Marker for the zoom readout.
#[derive(Component)]
pub struct HudText;

fn setup_canvas(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let mut geometry = QuadBatch::default();
    geometry.push_quad([Vec2::ZERO; 4], Color::NONE);

    commands.spawn((
        Mesh2d(meshes.add(geometry.into_mesh())),
        MeshMaterial2d(materials.add(ColorMaterial::default())),
        Transform::default(),
        NoFrustumCulling,
        TrailCanvas,
    ));

    commands.spawn((
        Text2d::new(""),
        TextFont {
            font_size: super::HUD_FONT_SIZE,
            ..default()
        },
        TextColor(Color::WHITE),
        Anchor::BottomLeft,
        Transform::from_xyz(0.0, 0.0, 1.0),
        HudText,
    ));

    info!("Trail canvas initialized");
}

/// Triangle-list geometry under construction, in window pixels.
#[derive(Default)]
struct QuadBatch {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 4]>,
    indices: Vec<u32>,
}

impl QuadBatch {
    fn with_capacity(quads: usize) -> Self {
        Self {
            positions: Vec::with_capacity(quads * 4),
            colors: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
        }
    }

    fn quad_count(&self) -> usize {
        self.positions.len() / 4
    }

    /// Corners in winding order, as window pixels.
    fn push_quad(&mut self, corners: [Vec2; 4], color: Color) {
        let base = self.positions.len() as u32;
        let linear = color.to_linear();
        for corner in corners {
            self.positions.push([corner.x, corner.y, 0.0]);
            self.colors.push([linear.red, linear.green, linear.blue, linear.alpha]);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// A stroke from `from` to `to`, extended by half its width at both ends.
    fn push_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        let dir = (to - from).try_normalize().unwrap_or(Vec2::X);
        let half = width / 2.0;
        let along = dir * half;
        let across = dir.perp() * half;
        let a = from - along;
        let b = to + along;
        self.push_quad([a - across, b - across, b + across, a + across], color);
    }

    fn push_rect(&mut self, center: Vec2, size: Vec2, rotation: f32, color: Color) {
        let rot = Vec2::from_angle(rotation);
        let half = size / 2.0;
        let corners = [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ]
        .map(|corner| center + rot.rotate(corner));
        self.push_quad(corners, color);
    }

    /// Convert window pixels (origin top-left, y down) to the centred, y-up
    /// space of the default 2D camera.
    fn to_camera_space(&mut self, viewport: Vec2) {
        for p in &mut self.positions {
            p[0] -= viewport.x / 2.0;
            p[1] = viewport.y / 2.0 - p[1];
        }
    }

    fn write_to(self, mesh: &mut Mesh) {
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors);
        mesh.insert_indices(Indices::U32(self.indices));
    }

    fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
        );
        self.write_to(&mut mesh);
        mesh
    }
}

fn paint_canvas(
    draw_list: Res<DrawList>,
    windows: Query<&Window, With<bevy::window::PrimaryWindow>>,
    canvas: Query<&Mesh2d, With<TrailCanvas>>,
    mut hud: Query<(&mut Text2d, &mut TextColor, &mut Transform), With<HudText>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut clear_color: ResMut<ClearColor>,
    mut last_quads: Local<usize>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Ok(mesh2d) = canvas.get_single() else {
        return;
    };
    let viewport = Vec2::new(window.width(), window.height());

    let mut batch = QuadBatch::with_capacity(*last_quads);
    for command in &draw_list.commands {
        match command {
            DrawCommand::Clear { color } => {
                if clear_color.0 != *color {
                    clear_color.0 = *color;
                }
            }
            DrawCommand::Line { from, to, width, color } => {
                batch.push_line(*from, *to, *width, *color);
            }
            DrawCommand::Rect { center, size, rotation, color } => {
                batch.push_rect(*center, *size, *rotation, *color);
            }
            DrawCommand::Text { text, position, color, .. } => {
                if let Ok((mut content, mut text_color, mut transform)) = hud.get_single_mut() {
                    if content.0 != *text {
                        content.0.clone_from(text);
                    }
                    text_color.0 = *color;
                    transform.translation.x = position.x - viewport.x / 2.0;
                    transform.translation.y = viewport.y / 2.0 - position.y;
                }
            }
        }
    }

    if batch.quad_count() == 0 {
        return;
    }
    *last_quads = batch.quad_count();
    batch.to_camera_space(viewport);
    if let Some(mesh) = meshes.get_mut(&mesh2d.0) {
        batch.write_to(mesh);
    }
}
