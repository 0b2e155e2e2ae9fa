//! Trailcar - drive a small car over an open canvas and paint with it.
//!
//! The car leaves a trail of coloured segments while the pen is down and
//! erases whatever it drives over while the eraser is held. The trail is
//! grouped into routes, one per pen stroke; the camera follows the car and
//! zooms around the mouse cursor.

pub mod audio;
pub mod camera;
pub mod game_state;
pub mod input;
pub mod render;
pub mod trail;
pub mod ui;
pub mod vehicle;
