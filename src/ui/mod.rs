//! On-screen buttons, instructions and notices.

use std::time::Duration;

use bevy::prelude::*;

use crate::audio::{MusicState, ToggleMusic};
use crate::game_state::{DisplayMode, GameState};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<UiNotice>()
            .add_systems(Startup, setup_ui)
            .add_systems(
                Update,
                (
                    handle_mode_button.run_if(resource_exists::<GameState>),
                    handle_help_button,
                    handle_music_button,
                    show_notices,
                    hide_expired_panels,
                    update_music_label,
                    restyle_for_mode.run_if(resource_exists::<GameState>),
                ),
            );
    }
}

/// A message shown to the player for a few seconds.
#[derive(Event, Debug, Clone)]
pub struct UiNotice(pub String);

const INSTRUCTIONS: &str = "Arrows: drive | Space: draw | E: erase\n\
Ctrl / Shift: wider / narrower | Wheel: zoom | M: mode";
const INSTRUCTIONS_SECS: f32 = 6.0;
const NOTICE_SECS: f32 = 5.0;
const BUTTON_BG: Color = Color::srgba(0.5, 0.5, 0.5, 0.25);
const PANEL_BG: Color = Color::srgba(0.05, 0.05, 0.05, 0.85);
const PANEL_TEXT: Color = Color::srgb(0.95, 0.95, 0.95);

#[derive(Component)]
pub(crate) struct ModeButton;

#[derive(Component)]
pub(crate) struct HelpButton;

#[derive(Component)]
pub(crate) struct MusicButton;

/// Text inside a button; recoloured with the display mode.
#[derive(Component)]
struct ButtonLabel;

#[derive(Component)]
struct ModeLabel;

#[derive(Component)]
struct MusicLabel;

/// A panel that hides itself when its timer runs out.
#[derive(Component)]
struct TimedPanel(Timer);

#[derive(Component)]
pub(crate) struct InstructionsPanel;

#[derive(Component)]
pub(crate) struct NoticePanel;

#[derive(Component)]
struct NoticeText;

fn setup_ui(mut commands: Commands) {
    let fg = DisplayMode::default().foreground();

    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Px(10.0),
            column_gap: Val::Px(8.0),
            flex_direction: FlexDirection::Row,
            ..default()
        })
        .with_children(|bar| {
            spawn_button(bar, DisplayMode::default().label(), fg, (ModeButton,), ModeLabel);
            spawn_button(bar, "?", fg, (HelpButton,), ());
            spawn_button(bar, MusicState::default().label(), fg, (MusicButton,), MusicLabel);
        });

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(56.0),
                padding: UiRect::all(Val::Px(10.0)),
                ..default()
            },
            BackgroundColor(PANEL_BG),
            Visibility::Hidden,
            TimedPanel(finished_timer(INSTRUCTIONS_SECS)),
            InstructionsPanel,
        ))
        .with_children(|panel| {
            panel.spawn((
                Text::new(INSTRUCTIONS),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(PANEL_TEXT),
            ));
        });

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Percent(25.0),
                right: Val::Percent(25.0),
                top: Val::Px(10.0),
                padding: UiRect::all(Val::Px(10.0)),
                justify_content: JustifyContent::Center,
                ..default()
            },
            BackgroundColor(PANEL_BG),
            Visibility::Hidden,
            TimedPanel(finished_timer(NOTICE_SECS)),
            NoticePanel,
        ))
        .with_children(|panel| {
            panel.spawn((
                Text::new(""),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(PANEL_TEXT),
                NoticeText,
            ));
        });
}

fn spawn_button(
    parent: &mut ChildBuilder,
    label: &str,
    color: Color,
    marker: impl Bundle,
    label_marker: impl Bundle,
) {
    parent
        .spawn((
            Button,
            Node {
                padding: UiRect::axes(Val::Px(10.0), Val::Px(6.0)),
                border: UiRect::all(Val::Px(1.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(BUTTON_BG),
            BorderColor(color),
            marker,
        ))
        .with_children(|button| {
            button.spawn((
                Text::new(label),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(color),
                ButtonLabel,
                label_marker,
            ));
        });
}

/// A timer that has already run out, so its panel starts hidden.
fn finished_timer(secs: f32) -> Timer {
    let mut timer = Timer::from_seconds(secs, TimerMode::Once);
    timer.tick(Duration::from_secs_f32(secs));
    timer
}

fn show_panel(visibility: &mut Visibility, panel: &mut TimedPanel) {
    panel.0.reset();
    *visibility = Visibility::Inherited;
}

fn handle_mode_button(
    interactions: Query<&Interaction, (Changed<Interaction>, With<ModeButton>)>,
    mut state: ResMut<GameState>,
) {
    for interaction in &interactions {
        if *interaction == Interaction::Pressed {
            state.mode = state.mode.next();
            info!("Display mode: {:?}", state.mode);
        }
    }
}

fn handle_help_button(
    interactions: Query<&Interaction, (Changed<Interaction>, With<HelpButton>)>,
    mut panel: Query<(&mut Visibility, &mut TimedPanel), With<InstructionsPanel>>,
) {
    for interaction in &interactions {
        if *interaction != Interaction::Pressed {
            continue;
        }
        if let Ok((mut visibility, mut timer)) = panel.get_single_mut() {
            show_panel(&mut visibility, &mut timer);
        }
    }
}

fn handle_music_button(
    interactions: Query<&Interaction, (Changed<Interaction>, With<MusicButton>)>,
    mut toggles: EventWriter<ToggleMusic>,
) {
    for interaction in &interactions {
        if *interaction == Interaction::Pressed {
            toggles.send(ToggleMusic);
        }
    }
}

fn show_notices(
    mut notices: EventReader<UiNotice>,
    mut panel: Query<(&mut Visibility, &mut TimedPanel), With<NoticePanel>>,
    mut text: Query<&mut Text, With<NoticeText>>,
) {
    let Some(UiNotice(message)) = notices.read().last() else {
        return;
    };
    warn!("{message}");
    if let Ok(mut text) = text.get_single_mut() {
        **text = message.clone();
    }
    if let Ok((mut visibility, mut timer)) = panel.get_single_mut() {
        show_panel(&mut visibility, &mut timer);
    }
}

fn hide_expired_panels(time: Res<Time>, mut panels: Query<(&mut Visibility, &mut TimedPanel)>) {
    for (mut visibility, mut panel) in &mut panels {
        if panel.0.tick(time.delta()).just_finished() {
            *visibility = Visibility::Hidden;
        }
    }
}

fn update_music_label(music: Res<MusicState>, mut label: Query<&mut Text, With<MusicLabel>>) {
    if !music.is_changed() {
        return;
    }
    if let Ok(mut text) = label.get_single_mut() {
        **text = music.label().to_string();
    }
}

/// Follow the display mode: button text and borders use the HUD colour.
fn restyle_for_mode(
    state: Res<GameState>,
    mut applied: Local<Option<DisplayMode>>,
    mut labels: Query<(&mut TextColor, Option<&mut Text>, Has<ModeLabel>), With<ButtonLabel>>,
    mut borders: Query<&mut BorderColor, With<Button>>,
) {
    if *applied == Some(state.mode) {
        return;
    }
    *applied = Some(state.mode);

    let fg = state.mode.foreground();
    for (mut color, text, is_mode_label) in &mut labels {
        color.0 = fg;
        if let (true, Some(mut text)) = (is_mode_label, text) {
            **text = state.mode.label().to_string();
        }
    }
    for mut border in &mut borders {
        border.0 = fg;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panels_start_hidden_and_expire_after_their_duration() {
        let mut timer = finished_timer(INSTRUCTIONS_SECS);
        assert!(timer.finished());

        timer.reset();
        assert!(!timer.finished());
        timer.tick(Duration::from_secs_f32(5.9));
        assert!(!timer.finished());
        timer.tick(Duration::from_secs_f32(0.2));
        assert!(timer.just_finished());
    }
}
