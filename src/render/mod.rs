//! Projection of the game state into screen-space draw commands.
//!
//! [`project`] is pure: it turns the trail, the vehicle and the HUD into a
//! [`DrawCommand`] list in window pixels (origin top-left, y down).
//! [`canvas`] executes that list against Bevy every frame.

use bevy::prelude::*;

use crate::game_state::GameState;

pub mod canvas;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(canvas::CanvasPlugin);
    }
}

/// One drawing operation against the window surface.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole surface.
    Clear { color: Color },
    /// A stroke with round-ish caps.
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Color,
    },
    /// A filled rectangle centred on `center`, rotated clockwise by
    /// `rotation` radians on the y-down surface.
    Rect {
        center: Vec2,
        size: Vec2,
        rotation: f32,
        color: Color,
    },
    /// Text with its baseline-left corner at `position`.
    Text {
        text: String,
        position: Vec2,
        font_size: f32,
        color: Color,
    },
}

/// The most recent frame's draw list.
#[derive(Resource, Default, Debug)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

const HUD_FONT_SIZE: f32 = 16.0;
/// Position of the zoom readout relative to the bottom-right corner.
const HUD_INSET: Vec2 = Vec2::new(120.0, 10.0);

/// Draw the trail, the vehicle and the zoom readout, in that order.
///
/// Segments entirely outside the visible part of the world are skipped, so
/// cost follows what is on screen rather than the whole trail.
pub fn project(state: &GameState, viewport: Vec2, out: &mut Vec<DrawCommand>) {
    let camera = &state.camera;
    let zoom = camera.zoom;
    let visible = camera.visible_world(viewport);

    out.push(DrawCommand::Clear {
        color: state.mode.background(),
    });

    for segment in state.trail.segments() {
        if !segment.bounds().overlaps(&visible) {
            continue;
        }
        out.push(DrawCommand::Line {
            from: camera.world_to_screen(segment.start),
            to: camera.world_to_screen(segment.end),
            width: (segment.width * zoom).max(1.0),
            color: segment.color,
        });
    }

    let vehicle = &state.vehicle;
    out.push(DrawCommand::Rect {
        center: camera.world_to_screen(vehicle.position),
        size: Vec2::new(vehicle.width(), vehicle.length()) * zoom,
        rotation: vehicle.heading,
        color: state.mode.vehicle_color(vehicle.is_erasing),
    });

    out.push(DrawCommand::Text {
        text: format!("Zoom: {:.1}x", zoom),
        position: viewport - HUD_INSET,
        font_size: HUD_FONT_SIZE,
        color: state.mode.foreground(),
    });
}
