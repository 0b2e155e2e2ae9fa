//! 2D camera that follows the vehicle, with cursor-anchored wheel zoom.
//!
//! The view is described by a [`CameraRig`]: the world point at the top-left
//! corner of the window (`offset`) and a scale factor (`zoom`). Screen
//! coordinates are window pixels with the origin at the top-left, y down:
//! `screen = (world - offset) * zoom`.

use bevy::{input::mouse::MouseWheel, prelude::*, window::PrimaryWindow};

use crate::game_state::{GameConfig, GameState};
use crate::trail::Aabb;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera)
            .add_systems(
                PreUpdate,
                camera_zoom
                    .after(bevy::input::InputSystem)
                    .run_if(resource_exists::<GameState>),
            );
    }
}

/// Tuning constants for the camera.
#[derive(Resource, Clone, Debug)]
pub struct CameraConfig {
    /// Fraction of the viewport, per axis, covered by the centred dead zone
    /// used at zoom 1.0.
    pub dead_zone_factor: f32,
    /// Margin, as a fraction of the viewport, that pushes the view when zoomed.
    pub edge_buffer: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Zoom change per wheel notch.
    pub zoom_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            dead_zone_factor: 0.5,
            edge_buffer: 0.1,
            min_zoom: 0.5,
            max_zoom: 10.0,
            zoom_step: 0.5,
        }
    }
}

/// Which way a wheel notch zooms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Offset and zoom of the view onto the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub offset: Vec2,
    pub zoom: f32,
}

impl CameraRig {
    /// A rig at zoom 1.0 with the centre of a `viewport * world_scale` world
    /// in the middle of the window.
    pub fn centered(viewport: Vec2, world_scale: f32) -> Self {
        Self {
            offset: viewport * (world_scale - 1.0) / 2.0,
            zoom: 1.0,
        }
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.offset) * self.zoom
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen / self.zoom + self.offset
    }

    /// The part of the world currently on screen.
    pub fn visible_world(&self, viewport: Vec2) -> Aabb {
        Aabb::new(self.offset, viewport / self.zoom)
    }

    /// Shift the view so `target` is back inside the follow region.
    ///
    /// At exactly zoom 1.0 the region is a centred dead zone; at any other zoom
    /// it is the viewport minus an edge buffer. The offset moves by the
    /// smallest amount that puts the target on the region boundary. The target
    /// is measured in zoomed screen space, `(target - offset) * zoom`, not as
    /// the unscaled `target - offset`, so margins are always window pixels.
    pub fn follow(&mut self, target: Vec2, viewport: Vec2, config: &CameraConfig) {
        let margin = if self.zoom == 1.0 {
            viewport * config.dead_zone_factor / 2.0
        } else {
            viewport * config.edge_buffer
        };
        let screen = self.world_to_screen(target);
        let lo = margin;
        let hi = viewport - margin;

        if screen.x < lo.x {
            self.offset.x -= (lo.x - screen.x) / self.zoom;
        } else if screen.x > hi.x {
            self.offset.x += (screen.x - hi.x) / self.zoom;
        }
        if screen.y < lo.y {
            self.offset.y -= (lo.y - screen.y) / self.zoom;
        } else if screen.y > hi.y {
            self.offset.y += (screen.y - hi.y) / self.zoom;
        }
    }

    /// Step the zoom while keeping the world point under `cursor` fixed on
    /// screen. Returns whether the zoom changed.
    pub fn zoom_at(&mut self, cursor: Vec2, direction: ZoomDirection, config: &CameraConfig) -> bool {
        let before = self.screen_to_world(cursor);
        let zoom = match direction {
            ZoomDirection::In => (self.zoom + config.zoom_step).min(config.max_zoom),
            ZoomDirection::Out => (self.zoom - config.zoom_step).max(config.min_zoom),
        };
        if zoom == self.zoom {
            return false;
        }
        self.zoom = zoom;
        let after = self.screen_to_world(cursor);
        self.offset += before - after;
        true
    }
}

/// Marker for the window camera.
#[derive(Component)]
pub struct TrailCamera;

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2d, TrailCamera));
}

/// Apply one zoom step per wheel event, anchored at the cursor.
fn camera_zoom(
    mut scroll_events: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    config: Res<GameConfig>,
    mut state: ResMut<GameState>,
) {
    let Ok(window) = windows.get_single() else {
        scroll_events.clear();
        return;
    };
    let cursor = window
        .cursor_position()
        .unwrap_or_else(|| Vec2::new(window.width(), window.height()) / 2.0);

    for event in scroll_events.read() {
        let direction = if event.y > 0.0 {
            ZoomDirection::In
        } else if event.y < 0.0 {
            ZoomDirection::Out
        } else {
            continue;
        };
        if state.camera.zoom_at(cursor, direction, &config.camera) {
            info!("Zoom: {:.1}x", state.camera.zoom);
        }
    }
}
