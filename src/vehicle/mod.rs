//! Player vehicle kinematics.
//!
//! The vehicle turns at a fixed rate, drives at a fixed speed while a
//! throttle key is held and coasts to a stop otherwise. Its position is
//! clamped to the world rectangle every tick.

use std::f32::consts::TAU;

use bevy::prelude::*;

use crate::input::InputSnapshot;

/// Tuning constants for the vehicle.
#[derive(Resource, Clone, Debug)]
pub struct DriveConfig {
    /// Heading change per tick while a turn key is held (radians).
    pub turn_rate: f32,
    /// Distance travelled per tick under throttle (world units).
    pub speed: f32,
    /// Velocity multiplier applied per tick without throttle.
    pub coast_factor: f32,
    /// Width the vehicle starts with.
    pub initial_width: f32,
    pub min_width: f32,
    pub max_width: f32,
    /// Width change per tick while a width key is held.
    pub width_step: f32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            turn_rate: 0.05,
            speed: 1.0,
            coast_factor: 0.95,
            initial_width: 3.0,
            min_width: 1.0,
            max_width: 20.0,
            width_step: 1.0,
        }
    }
}

/// Pose and footprint of the player vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    /// Centre of the vehicle in world space.
    pub position: Vec2,
    /// Heading in radians, kept in `[0, TAU)`.
    pub heading: f32,
    /// Displacement applied on the next tick.
    pub velocity: Vec2,
    width: f32,
    /// Set while the eraser is active; drives the sprite colour.
    pub is_erasing: bool,
}

impl Vehicle {
    pub fn new(position: Vec2, config: &DriveConfig) -> Self {
        Self {
            position,
            heading: 0.0,
            velocity: Vec2::ZERO,
            width: config.initial_width.clamp(config.min_width, config.max_width),
            is_erasing: false,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Length always follows width so the two can never disagree.
    pub fn length(&self) -> f32 {
        self.width * 2.0
    }

    /// Unit vector the vehicle points along. Screen space is y-down, so a
    /// positive heading turns counter-clockwise on screen.
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.heading.cos(), -self.heading.sin())
    }

    /// Advance heading, velocity and position by one tick.
    ///
    /// `world_extent` is the size of the drawable world; the vehicle stops
    /// dead at the wall rather than sliding along it.
    pub fn integrate(&mut self, input: &InputSnapshot, world_extent: Vec2, config: &DriveConfig) {
        if input.turn_left {
            self.heading += config.turn_rate;
        }
        if input.turn_right {
            self.heading -= config.turn_rate;
        }
        self.heading = wrap_heading(self.heading);

        if input.accelerate {
            self.velocity = self.forward() * config.speed;
        } else if input.decelerate {
            self.velocity = -self.forward() * config.speed;
        } else {
            self.velocity *= config.coast_factor;
        }

        self.position += self.velocity;
        self.clamp_to(world_extent);
    }

    /// Pull the vehicle back inside a world of size `world_extent`, keeping
    /// half its width and half its length clear of each wall.
    pub fn clamp_to(&mut self, world_extent: Vec2) {
        let half = Vec2::new(self.width / 2.0, self.length() / 2.0);
        self.position = Vec2::new(
            clamp_axis(self.position.x, half.x, world_extent.x - half.x),
            clamp_axis(self.position.y, half.y, world_extent.y - half.y),
        );
    }

    /// Grow or shrink the vehicle. Increase wins when both keys are held.
    pub fn adjust_width(&mut self, input: &InputSnapshot, config: &DriveConfig) {
        if input.width_increase {
            self.width = (self.width + config.width_step).min(config.max_width);
        } else if input.width_decrease {
            self.width = (self.width - config.width_step).max(config.min_width);
        }
    }
}

/// `rem_euclid` rounds tiny negative angles up to exactly `TAU`.
fn wrap_heading(heading: f32) -> f32 {
    let wrapped = heading.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// `max(lo, min(hi, v))`. Unlike `f32::clamp` this does not panic when the
/// world is smaller than the vehicle (`lo > hi`); the lower wall wins.
fn clamp_axis(v: f32, lo: f32, hi: f32) -> f32 {
    lo.max(hi.min(v))
}
