//! Rectangle overlap and trail erasure.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::{RouteId, Segment, TrailStore};

/// Axis-aligned rectangle stored as a min corner plus size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Open-interval overlap: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.min.x + other.size.x
            && self.min.x + self.size.x > other.min.x
            && self.min.y < other.min.y + other.size.y
            && self.min.y + self.size.y > other.min.y
    }

    /// The eraser footprint of a vehicle at `position`.
    ///
    /// Both corner offsets use the width while the height uses the length, so
    /// the box hangs below the vehicle centre.
    pub fn eraser(position: Vec2, width: f32, length: f32) -> Self {
        Self::new(position - Vec2::splat(width / 2.0), Vec2::new(width, length))
    }
}

impl Segment {
    /// Bounding box of the stroke, padded by half the line width on every side.
    pub fn bounds(&self) -> Aabb {
        let min = self.start.min(self.end) - Vec2::splat(self.width / 2.0);
        let size = (self.start - self.end).abs() + Vec2::splat(self.width);
        Aabb::new(min, size)
    }
}

/// What an erase pass removed.
#[derive(Debug, Default)]
pub struct EraseReport {
    pub segments_removed: usize,
    pub routes_pruned: SmallVec<[RouteId; 4]>,
}

impl TrailStore {
    /// Remove every segment whose bounds overlap `eraser`, then drop routes
    /// left empty. Removal is immediate; surviving segments keep their order.
    pub fn erase_rect(&mut self, eraser: &Aabb) -> EraseReport {
        let mut report = EraseReport::default();
        self.routes.retain_mut(|route| {
            let before = route.segments.len();
            route.segments.retain(|segment| !segment.bounds().overlaps(eraser));
            report.segments_removed += before - route.segments.len();
            if route.segments.is_empty() {
                report.routes_pruned.push(route.id);
                false
            } else {
                true
            }
        });
        report
    }
}
