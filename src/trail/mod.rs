//! Painted trail left behind the vehicle.
//!
//! A [`TrailStore`] holds routes in creation order; a route is one continuous
//! stroke made of short coloured segments in drawing order. The vehicle writes
//! into the store through a [`TrailPen`], which remembers where the last
//! segment ended and which route it is extending.

use bevy::prelude::*;

use crate::game_state::DisplayMode;

pub mod collision;

pub use collision::{Aabb, EraseReport};

/// Tuning constants for trail recording.
#[derive(Resource, Clone, Debug)]
pub struct TrailConfig {
    /// Movement below this distance does not emit a segment.
    pub min_segment_length: f32,
    /// Hue advance per segment in rainbow mode (degrees).
    pub hue_step: f32,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            min_segment_length: 0.1,
            hue_step: 10.0,
        }
    }
}

/// Stable identifier of a route, unaffected by erasure of other routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RouteId(u64);

/// One straight stroke between two sampled vehicle positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    pub width: f32,
    /// Baked at creation; later mode changes do not repaint it.
    pub color: Color,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// A continuous stroke.
#[derive(Clone, Debug)]
pub struct Route {
    pub id: RouteId,
    pub segments: Vec<Segment>,
}

impl Route {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn length(&self) -> f32 {
        self.segments.iter().map(Segment::length).sum()
    }
}

/// Every route drawn so far. No route in the store is ever empty.
#[derive(Debug, Default)]
pub struct TrailStore {
    routes: Vec<Route>,
    next_id: u64,
}

impl TrailStore {
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.routes.iter().map(|r| r.segments.len()).sum()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.routes.iter().flat_map(|r| r.segments.iter())
    }

    /// Hand out an id for a route that does not exist yet.
    pub fn next_route_id(&mut self) -> RouteId {
        let id = RouteId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append to route `id`, creating it at the end of the store if it is not
    /// present. The active route is almost always last, so search from the back.
    pub fn append(&mut self, id: RouteId, segment: Segment) {
        match self.routes.iter_mut().rev().find(|r| r.id == id) {
            Some(route) => route.segments.push(segment),
            None => self.routes.push(Route {
                id,
                segments: vec![segment],
            }),
        }
    }
}

/// The vehicle's trail-writing cursor.
#[derive(Debug, Default)]
pub struct TrailPen {
    /// Where the next segment starts; `None` while the pen is up.
    cursor: Option<Vec2>,
    /// Route being extended. Non-owning: the route may have been erased.
    active: Option<RouteId>,
    /// Rainbow hue of the next segment, in degrees.
    hue: f32,
}

impl TrailPen {
    pub fn is_down(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_route(&self) -> Option<RouteId> {
        self.active
    }

    /// Record one tick of drawing at `position`.
    ///
    /// The pen going down starts a new route and places the cursor without
    /// emitting anything. While it stays down a segment is emitted each time
    /// the vehicle has moved more than `min_segment_length` from the cursor.
    /// The route itself only enters the store with its first segment.
    pub fn record_stroke(
        &mut self,
        store: &mut TrailStore,
        drawing: bool,
        position: Vec2,
        width: f32,
        mode: DisplayMode,
        config: &TrailConfig,
    ) {
        if !drawing {
            if self.active.take().is_some() {
                debug!("Route finished, {} routes in store", store.routes().len());
            }
            self.cursor = None;
            return;
        }

        let (Some(id), Some(cursor)) = (self.active, self.cursor) else {
            let id = store.next_route_id();
            debug!("Starting route {:?} at {}", id, position);
            self.active = Some(id);
            self.cursor = Some(position);
            self.hue = 0.0;
            return;
        };

        if position.distance(cursor) <= config.min_segment_length {
            return;
        }

        store.append(
            id,
            Segment {
                start: cursor,
                end: position,
                width,
                color: mode.stroke_color(self.hue),
            },
        );
        self.hue = (self.hue + config.hue_step) % 360.0;
        self.cursor = Some(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_path(
        pen: &mut TrailPen,
        store: &mut TrailStore,
        points: &[Vec2],
        mode: DisplayMode,
    ) {
        let config = TrailConfig::default();
        for &p in points {
            pen.record_stroke(store, true, p, 3.0, mode, &config);
        }
    }

    #[test]
    fn pen_down_places_cursor_without_emitting() {
        let mut store = TrailStore::default();
        let mut pen = TrailPen::default();
        draw_path(&mut pen, &mut store, &[Vec2::new(5.0, 5.0)], DisplayMode::Dark);
        assert!(pen.is_down());
        assert!(store.is_empty());
    }

    #[test]
    fn stationary_vehicle_emits_nothing() {
        let mut store = TrailStore::default();
        let mut pen = TrailPen::default();
        let jitter = [
            Vec2::new(5.0, 5.0),
            Vec2::new(5.0, 5.0),
            Vec2::new(5.05, 5.0),
            Vec2::new(5.0, 5.1),
        ];
        draw_path(&mut pen, &mut store, &jitter, DisplayMode::Dark);
        assert_eq!(store.segment_count(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn segments_chain_from_cursor() {
        let mut store = TrailStore::default();
        let mut pen = TrailPen::default();
        let path = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.05, 0.0),
            Vec2::new(2.0, 0.0),
        ];
        draw_path(&mut pen, &mut store, &path, DisplayMode::Dark);

        let route = &store.routes()[0];
        assert_eq!(route.segments.len(), 2);
        assert_eq!(route.segments[0].start, Vec2::ZERO);
        assert_eq!(route.segments[0].end, Vec2::new(1.0, 0.0));
        assert_eq!(route.segments[1].start, Vec2::new(1.0, 0.0));
        assert_eq!(route.segments[1].end, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn each_pen_down_starts_a_new_route() {
        let config = TrailConfig::default();
        let mut store = TrailStore::default();
        let mut pen = TrailPen::default();
        for stroke in 0..3 {
            let y = stroke as f32 * 10.0;
            draw_path(
                &mut pen,
                &mut store,
                &[Vec2::new(0.0, y), Vec2::new(5.0, y)],
                DisplayMode::Light,
            );
            pen.record_stroke(&mut store, false, Vec2::new(5.0, y), 3.0, DisplayMode::Light, &config);
            assert!(!pen.is_down());
        }
        assert_eq!(store.routes().len(), 3);
        assert!(store.routes().iter().all(|r| r.segments.len() == 1));
        assert!(store.segments().all(|s| s.color == Color::BLACK));
    }

    #[test]
    fn rainbow_hue_wraps_after_full_circle() {
        let mut store = TrailStore::default();
        let mut pen = TrailPen::default();
        let path: Vec<Vec2> = (0..=37).map(|i| Vec2::new(i as f32, 0.0)).collect();
        draw_path(&mut pen, &mut store, &path, DisplayMode::Rainbow);

        let segments = &store.routes()[0].segments;
        assert_eq!(segments.len(), 37);
        for (i, segment) in segments.iter().enumerate() {
            let hue = (i as f32 * 10.0) % 360.0;
            assert_eq!(segment.color, Color::hsl(hue, 1.0, 0.5));
        }
        assert_eq!(segments[36].color, segments[0].color);
    }

    #[test]
    fn rainbow_hue_restarts_with_each_route() {
        let config = TrailConfig::default();
        let mut store = TrailStore::default();
        let mut pen = TrailPen::default();
        let path: Vec<Vec2> = (0..5).map(|i| Vec2::new(i as f32, 0.0)).collect();
        draw_path(&mut pen, &mut store, &path, DisplayMode::Rainbow);
        pen.record_stroke(&mut store, false, Vec2::ZERO, 3.0, DisplayMode::Rainbow, &config);
        draw_path(&mut pen, &mut store, &path, DisplayMode::Rainbow);

        assert_eq!(store.routes().len(), 2);
        assert_eq!(store.routes()[1].segments[0].color, Color::hsl(0.0, 1.0, 0.5));
    }

    #[test]
    fn mode_change_does_not_repaint_existing_segments() {
        let mut store = TrailStore::default();
        let mut pen = TrailPen::default();
        draw_path(&mut pen, &mut store, &[Vec2::ZERO, Vec2::new(1.0, 0.0)], DisplayMode::Dark);
        draw_path(&mut pen, &mut store, &[Vec2::new(2.0, 0.0)], DisplayMode::Light);

        let segments = &store.routes()[0].segments;
        assert_eq!(segments[0].color, Color::WHITE);
        assert_eq!(segments[1].color, Color::BLACK);
    }

    #[test]
    fn erased_active_route_is_reopened_by_next_segment() {
        let mut store = TrailStore::default();
        let mut pen = TrailPen::default();
        draw_path(&mut pen, &mut store, &[Vec2::ZERO, Vec2::new(1.0, 0.0)], DisplayMode::Dark);
        let id = pen.active_route();

        store.erase_rect(&Aabb::new(Vec2::splat(-5.0), Vec2::splat(10.0)));
        assert!(store.is_empty());

        draw_path(&mut pen, &mut store, &[Vec2::new(20.0, 0.0)], DisplayMode::Dark);
        assert_eq!(store.routes().len(), 1);
        assert_eq!(Some(store.routes()[0].id), id);
        assert_eq!(store.routes()[0].segments[0].start, Vec2::new(1.0, 0.0));
    }
}
