//! Core game state and the per-frame tick.
//!
//! All mutable play state lives in one [`GameState`] resource. Each frame the
//! input snapshot and current window size are fed to [`GameState::tick`],
//! which moves the vehicle, records or erases trail, moves the camera and
//! returns the frame's draw list.

use anyhow::{ensure, Context};
use bevy::{prelude::*, window::PrimaryWindow};

use crate::camera::{CameraConfig, CameraRig};
use crate::input::{sample_input, InputSnapshot};
use crate::render::canvas::{HudText, TrailCanvas};
use crate::render::{self, DrawCommand, DrawList};
use crate::trail::{Aabb, TrailConfig, TrailPen, TrailStore};
use crate::ui::{HelpButton, InstructionsPanel, ModeButton, MusicButton, NoticePanel};
use crate::vehicle::{DriveConfig, Vehicle};

pub struct GameStatePlugin;

impl Plugin for GameStatePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameConfig>()
            .init_resource::<InputSnapshot>()
            .init_resource::<DrawList>()
            .configure_sets(Update, TickSet.run_if(resource_exists::<GameState>))
            .add_systems(Startup, init_game_state)
            .add_systems(PostStartup, check_setup.pipe(abort_on_setup_fault))
            .add_systems(
                Update,
                (cycle_mode_hotkey, sample_input, run_tick)
                    .chain()
                    .in_set(TickSet),
            );
    }
}

/// Systems that advance the simulation by one frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TickSet;

/// Colour scheme, cycled by the mode button.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum DisplayMode {
    /// White on black.
    #[default]
    Dark,
    /// Black on white.
    Light,
    /// Black vehicle on white, trail painted through the hue circle.
    Rainbow,
}

impl DisplayMode {
    pub fn next(self) -> Self {
        match self {
            DisplayMode::Dark => DisplayMode::Light,
            DisplayMode::Light => DisplayMode::Rainbow,
            DisplayMode::Rainbow => DisplayMode::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Dark => "Dark",
            DisplayMode::Light => "Light",
            DisplayMode::Rainbow => "Rainbow",
        }
    }

    pub fn background(self) -> Color {
        match self {
            DisplayMode::Dark => Color::BLACK,
            DisplayMode::Light | DisplayMode::Rainbow => Color::WHITE,
        }
    }

    /// Colour for HUD text and buttons.
    pub fn foreground(self) -> Color {
        match self {
            DisplayMode::Dark => Color::WHITE,
            DisplayMode::Light | DisplayMode::Rainbow => Color::BLACK,
        }
    }

    /// Colour of a new trail segment; `hue` only matters in rainbow mode.
    pub fn stroke_color(self, hue: f32) -> Color {
        match self {
            DisplayMode::Rainbow => Color::hsl(hue, 1.0, 0.5),
            DisplayMode::Light => Color::BLACK,
            DisplayMode::Dark => Color::WHITE,
        }
    }

    pub fn vehicle_color(self, erasing: bool) -> Color {
        if erasing {
            Color::srgb(1.0, 0.0, 0.0)
        } else {
            self.foreground()
        }
    }
}

/// All tuning constants.
#[derive(Resource, Clone, Debug)]
pub struct GameConfig {
    pub drive: DriveConfig,
    pub trail: TrailConfig,
    pub camera: CameraConfig,
    /// World size as a multiple of the viewport.
    pub world_scale: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            drive: DriveConfig::default(),
            trail: TrailConfig::default(),
            camera: CameraConfig::default(),
            world_scale: 5.0,
        }
    }
}

/// Everything that changes while playing.
#[derive(Resource, Debug)]
pub struct GameState {
    pub vehicle: Vehicle,
    pub pen: TrailPen,
    pub trail: TrailStore,
    pub camera: CameraRig,
    pub mode: DisplayMode,
}

impl GameState {
    /// Vehicle in the middle of the world, centred on screen.
    pub fn new(viewport: Vec2, config: &GameConfig) -> Self {
        Self {
            vehicle: Vehicle::new(viewport * config.world_scale / 2.0, &config.drive),
            pen: TrailPen::default(),
            trail: TrailStore::default(),
            camera: CameraRig::centered(viewport, config.world_scale),
            mode: DisplayMode::default(),
        }
    }

    /// Advance one frame and return what to draw.
    ///
    /// `viewport` is re-read every frame since the world bounds follow it.
    pub fn tick(&mut self, input: &InputSnapshot, viewport: Vec2, config: &GameConfig) -> Vec<DrawCommand> {
        let mut commands = Vec::new();
        self.tick_into(input, viewport, config, &mut commands);
        commands
    }

    /// [`GameState::tick`] writing into a reused buffer.
    pub fn tick_into(
        &mut self,
        input: &InputSnapshot,
        viewport: Vec2,
        config: &GameConfig,
        out: &mut Vec<DrawCommand>,
    ) {
        let world_extent = viewport * config.world_scale;

        self.vehicle.integrate(input, world_extent, &config.drive);
        self.vehicle.adjust_width(input, &config.drive);
        self.vehicle.clamp_to(world_extent);
        self.pen.record_stroke(
            &mut self.trail,
            input.draw,
            self.vehicle.position,
            self.vehicle.width(),
            self.mode,
            &config.trail,
        );
        self.erase(input.erase);
        self.camera.follow(self.vehicle.position, viewport, &config.camera);

        trace!(
            "Vehicle at {} heading {:.2}, {} segments",
            self.vehicle.position,
            self.vehicle.heading,
            self.trail.segment_count()
        );

        render::project(self, viewport, out);
    }

    fn erase(&mut self, erasing: bool) {
        self.vehicle.is_erasing = erasing;
        if !erasing {
            return;
        }
        let eraser = Aabb::eraser(
            self.vehicle.position,
            self.vehicle.width(),
            self.vehicle.length(),
        );
        let report = self.trail.erase_rect(&eraser);
        if report.segments_removed > 0 {
            debug!(
                "Erased {} segments, pruned {} routes",
                report.segments_removed,
                report.routes_pruned.len()
            );
        }
    }
}

fn viewport_size(window: &Window) -> Vec2 {
    Vec2::new(window.width(), window.height())
}

fn init_game_state(
    mut commands: Commands,
    windows: Query<&Window, With<PrimaryWindow>>,
    config: Res<GameConfig>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let viewport = viewport_size(window);
    info!("Viewport {}x{}, world scale {}", viewport.x, viewport.y, config.world_scale);
    commands.insert_resource(GameState::new(viewport, &config));
}

/// Everything the tick, the canvas and the controls need must exist before
/// the first frame.
fn check_setup(
    windows: Query<&Window, With<PrimaryWindow>>,
    state: Option<Res<GameState>>,
    canvas: Query<(), With<TrailCanvas>>,
    hud: Query<(), With<HudText>>,
    mode: Query<(), With<ModeButton>>,
    help: Query<(), With<HelpButton>>,
    music: Query<(), With<MusicButton>>,
    instructions: Query<(), With<InstructionsPanel>>,
    notice: Query<(), With<NoticePanel>>,
) -> anyhow::Result<()> {
    windows.get_single().context("primary window not found")?;
    ensure!(state.is_some(), "game state was not initialized");
    canvas.get_single().context("trail canvas not found")?;
    hud.get_single().context("zoom readout not found")?;
    mode.get_single().context("mode button not found")?;
    help.get_single().context("help button not found")?;
    music.get_single().context("music button not found")?;
    instructions.get_single().context("instructions panel not found")?;
    notice.get_single().context("notice panel not found")?;
    Ok(())
}

/// A setup fault stops the app instead of running without a surface.
fn abort_on_setup_fault(In(result): In<anyhow::Result<()>>, mut exit: EventWriter<AppExit>) {
    if let Err(err) = result {
        error!("Setup failed: {err:#}");
        exit.send(AppExit::error());
    }
}

/// `M` cycles the display mode, like the mode button.
fn cycle_mode_hotkey(keys: Res<ButtonInput<KeyCode>>, mut state: ResMut<GameState>) {
    if keys.just_pressed(KeyCode::KeyM) {
        state.mode = state.mode.next();
        info!("Display mode: {:?}", state.mode);
    }
}

/// Run one tick per frame.
fn run_tick(
    windows: Query<&Window, With<PrimaryWindow>>,
    input: Res<InputSnapshot>,
    config: Res<GameConfig>,
    mut state: ResMut<GameState>,
    mut draw_list: ResMut<DrawList>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let viewport = viewport_size(window);
    draw_list.commands.clear();
    state.tick_into(&input, viewport, &config, &mut draw_list.commands);
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    fn idle() -> InputSnapshot {
        InputSnapshot::default()
    }

    #[test]
    fn mode_cycles_through_all_three() {
        let mut mode = DisplayMode::default();
        assert_eq!(mode, DisplayMode::Dark);
        mode = mode.next();
        assert_eq!(mode, DisplayMode::Light);
        mode = mode.next();
        assert_eq!(mode, DisplayMode::Rainbow);
        assert_eq!(mode.next(), DisplayMode::Dark);
    }

    #[test]
    fn vehicle_starts_in_world_centre() {
        let config = GameConfig::default();
        let state = GameState::new(VIEWPORT, &config);
        assert_eq!(state.vehicle.position, Vec2::new(2000.0, 1500.0));
        assert_eq!(state.camera.world_to_screen(state.vehicle.position), VIEWPORT / 2.0);
    }

    #[test]
    fn drawing_straight_line_in_dark_mode() {
        let config = GameConfig::default();
        let mut state = GameState::new(VIEWPORT, &config);
        state.vehicle.position = Vec2::new(100.0, 100.0);
        let draw = InputSnapshot { draw: true, ..idle() };

        state.tick(&draw, VIEWPORT, &config);
        for step in 1..=5 {
            state.vehicle.position = Vec2::new(100.0, 100.0 + step as f32 * 2.0);
            state.vehicle.velocity = Vec2::ZERO;
            state.tick(&draw, VIEWPORT, &config);
        }

        let routes = state.trail.routes();
        assert_eq!(routes.len(), 1);
        assert!((routes[0].length() - 10.0).abs() < 1e-4);
        assert!(routes[0].segments.iter().all(|s| s.color == Color::WHITE));
        assert_eq!(routes[0].segments.last().map(|s| s.end), Some(Vec2::new(100.0, 110.0)));
    }

    #[test]
    fn driving_while_drawing_then_erasing_everything() {
        let config = GameConfig::default();
        let mut state = GameState::new(VIEWPORT, &config);
        let drive_and_draw = InputSnapshot { accelerate: true, draw: true, ..idle() };
        for _ in 0..20 {
            state.tick(&drive_and_draw, VIEWPORT, &config);
        }
        assert_eq!(state.trail.segment_count(), 19);

        let reverse_and_erase = InputSnapshot { decelerate: true, erase: true, ..idle() };
        for _ in 0..25 {
            state.tick(&reverse_and_erase, VIEWPORT, &config);
            assert!(state.trail.routes().iter().all(|r| !r.is_empty()));
        }
        assert!(state.vehicle.is_erasing);
        assert!(state.trail.is_empty());

        state.tick(&idle(), VIEWPORT, &config);
        assert!(!state.vehicle.is_erasing);
    }

    #[test]
    fn toggling_pen_never_leaves_empty_routes() {
        let config = GameConfig::default();
        let mut state = GameState::new(VIEWPORT, &config);
        for i in 0..200 {
            let input = InputSnapshot {
                accelerate: i % 3 != 0,
                turn_left: i % 7 == 0,
                draw: (i / 4) % 2 == 0,
                erase: i % 11 == 0,
                ..idle()
            };
            state.tick(&input, VIEWPORT, &config);
            assert!(state.trail.routes().iter().all(|r| !r.is_empty()));
        }
    }

    #[test]
    fn camera_keeps_vehicle_on_screen() {
        let config = GameConfig::default();
        let mut state = GameState::new(VIEWPORT, &config);
        let input = InputSnapshot { accelerate: true, ..idle() };
        for _ in 0..1_000 {
            state.tick(&input, VIEWPORT, &config);
            let screen = state.camera.world_to_screen(state.vehicle.position);
            assert!(screen.x >= 200.0 - 1e-2 && screen.x <= 600.0 + 1e-2);
        }
    }

    #[test]
    fn widening_at_the_wall_stays_inside_after_the_tick() {
        let config = GameConfig::default();
        let mut state = GameState::new(VIEWPORT, &config);
        let world = VIEWPORT * config.world_scale;
        state.vehicle.position = Vec2::new(1.5, world.y - 3.0);
        let input = InputSnapshot {
            decelerate: true,
            width_increase: true,
            erase: true,
            ..idle()
        };
        for _ in 0..30 {
            state.tick(&input, VIEWPORT, &config);
            let half = Vec2::new(state.vehicle.width() / 2.0, state.vehicle.length() / 2.0);
            let pos = state.vehicle.position;
            assert!(pos.x >= half.x && pos.x <= world.x - half.x);
            assert!(pos.y >= half.y && pos.y <= world.y - half.y);
        }
        assert_eq!(state.vehicle.position, Vec2::new(10.0, world.y - 20.0));
    }

    #[test]
    fn shrinking_viewport_pulls_vehicle_inside_new_world() {
        let config = GameConfig::default();
        let mut state = GameState::new(VIEWPORT, &config);
        let small = Vec2::new(200.0, 100.0);
        state.tick(&idle(), small, &config);
        assert_eq!(state.vehicle.position, Vec2::new(998.5, 497.0));
    }

    fn fully_set_up_app() -> App {
        let mut app = App::new();
        app.insert_resource(GameState::new(VIEWPORT, &GameConfig::default()));
        let world = app.world_mut();
        world.spawn((Window::default(), PrimaryWindow));
        world.spawn(TrailCanvas);
        world.spawn(HudText);
        world.spawn(ModeButton);
        world.spawn(HelpButton);
        world.spawn(MusicButton);
        world.spawn(InstructionsPanel);
        world.spawn(NoticePanel);
        app.add_systems(Update, check_setup.pipe(abort_on_setup_fault));
        app
    }

    fn despawn_all<T: Component>(app: &mut App) {
        let world = app.world_mut();
        let found: Vec<Entity> = world.query_filtered::<Entity, With<T>>().iter(world).collect();
        for entity in found {
            world.despawn(entity);
        }
    }

    #[test]
    fn complete_setup_keeps_running() {
        let mut app = fully_set_up_app();
        let result = app.world_mut().run_system_once(check_setup).unwrap();
        assert!(result.is_ok());

        app.update();
        assert!(app.should_exit().is_none());
    }

    #[test]
    fn missing_canvas_aborts() {
        let mut app = fully_set_up_app();
        despawn_all::<TrailCanvas>(&mut app);

        let err = app.world_mut().run_system_once(check_setup).unwrap().unwrap_err();
        assert_eq!(err.to_string(), "trail canvas not found");

        app.update();
        assert!(matches!(app.should_exit(), Some(AppExit::Error(_))));
    }

    #[test]
    fn missing_controls_abort() {
        let cases: [(fn(&mut App), &str); 5] = [
            (despawn_all::<ModeButton>, "mode button not found"),
            (despawn_all::<HelpButton>, "help button not found"),
            (despawn_all::<MusicButton>, "music button not found"),
            (despawn_all::<InstructionsPanel>, "instructions panel not found"),
            (despawn_all::<NoticePanel>, "notice panel not found"),
        ];
        for (remove, message) in cases {
            let mut app = fully_set_up_app();
            remove(&mut app);

            let err = app.world_mut().run_system_once(check_setup).unwrap().unwrap_err();
            assert_eq!(err.to_string(), message);

            app.update();
            assert!(matches!(app.should_exit(), Some(AppExit::Error(_))));
        }
    }

    #[test]
    fn missing_game_state_aborts() {
        let mut app = fully_set_up_app();
        app.world_mut().remove_resource::<GameState>();

        let err = app.world_mut().run_system_once(check_setup).unwrap().unwrap_err();
        assert_eq!(err.to_string(), "game state was not initialized");
    }
}
