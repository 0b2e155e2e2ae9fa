use bevy::prelude::*;

use trailcar::{audio, camera, game_state, render, ui};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Trailcar".into(),
                resolution: (1280., 720.).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::BLACK))
        // Simulation tick and trail
        .add_plugins(game_state::GameStatePlugin)
        .add_plugins(camera::CameraPlugin)
        .add_plugins(render::RenderPlugin)
        // Buttons, instructions, notices
        .add_plugins(ui::UiPlugin)
        // Background music
        .add_plugins(audio::AudioPlugin)
        .run();
}
