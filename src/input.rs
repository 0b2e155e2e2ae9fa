//! Per-frame input snapshot.
//!
//! The core never reads Bevy's input resources directly; a system samples the
//! keyboard once per frame into an [`InputSnapshot`] and hands that to the tick.

use bevy::prelude::*;

/// Which controls are held this frame.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub turn_left: bool,
    pub turn_right: bool,
    pub accelerate: bool,
    pub decelerate: bool,
    pub draw: bool,
    pub erase: bool,
    pub width_increase: bool,
    pub width_decrease: bool,
}

impl InputSnapshot {
    pub fn from_keys(keys: &ButtonInput<KeyCode>) -> Self {
        Self {
            turn_left: keys.pressed(KeyCode::ArrowLeft),
            turn_right: keys.pressed(KeyCode::ArrowRight),
            accelerate: keys.pressed(KeyCode::ArrowUp),
            decelerate: keys.pressed(KeyCode::ArrowDown),
            draw: keys.pressed(KeyCode::Space),
            erase: keys.pressed(KeyCode::KeyE),
            width_increase: keys.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]),
            width_decrease: keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]),
        }
    }
}

/// Sample the keyboard into the frame's snapshot.
pub fn sample_input(keys: Res<ButtonInput<KeyCode>>, mut snapshot: ResMut<InputSnapshot>) {
    let next = InputSnapshot::from_keys(&keys);
    if next.draw != snapshot.draw {
        info!("Pen {}", if next.draw { "down" } else { "up" });
    }
    if next.erase != snapshot.erase {
        info!("Eraser {}", if next.erase { "on" } else { "off" });
    }
    *snapshot = next;
}
