//! Background music toggle.
//!
//! Music starts muted and nothing plays until the player unmutes. If the track
//! cannot be loaded the toggle flips back to muted and a notice is shown; the
//! game loop never sees the failure.

use bevy::{
    asset::LoadState,
    audio::{AudioSinkPlayback, Volume},
    prelude::*,
};

use crate::ui::UiNotice;

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MusicConfig>()
            .init_resource::<MusicState>()
            .add_event::<ToggleMusic>()
            .add_event::<MusicLoadFailed>()
            .add_systems(
                Update,
                (apply_music_toggle, watch_music_playback, revert_failed_music).chain(),
            );
    }
}

/// Request to flip the mute flag, sent by the music button.
#[derive(Event)]
pub struct ToggleMusic;

/// The track behind the current player could not be loaded.
#[derive(Event, Debug)]
struct MusicLoadFailed(String);

#[derive(Resource, Clone, Debug)]
pub struct MusicConfig {
    /// Track path relative to the asset folder.
    pub track: String,
    pub volume: f32,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            track: "audio/background.ogg".into(),
            volume: 0.7,
        }
    }
}

/// Mute flag plus the player entity, if one has been spawned.
#[derive(Resource, Debug)]
pub struct MusicState {
    muted: bool,
    player: Option<Entity>,
}

impl Default for MusicState {
    fn default() -> Self {
        Self {
            muted: true,
            player: None,
        }
    }
}

impl MusicState {
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn label(&self) -> &'static str {
        if self.muted {
            "Music: Off"
        } else {
            "Music: On"
        }
    }

    /// Flip the mute flag and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Playback was rejected: go back to muted and forget the player so the
    /// next toggle retries from scratch. Returns the discarded player.
    pub fn playback_failed(&mut self) -> Option<Entity> {
        self.muted = true;
        self.player.take()
    }
}

const PLAYBACK_NOTICE: &str =
    "Click the music button again to start music after interacting with the page.";

fn apply_music_toggle(
    mut commands: Commands,
    mut toggles: EventReader<ToggleMusic>,
    mut state: ResMut<MusicState>,
    config: Res<MusicConfig>,
    asset_server: Res<AssetServer>,
    sinks: Query<&AudioSink>,
) {
    for _ in toggles.read() {
        let muted = state.toggle();
        let sink = state.player.and_then(|player| sinks.get(player).ok());
        match (muted, sink) {
            (true, Some(sink)) => sink.pause(),
            (true, None) => {
                // Still loading; drop it so it does not start once ready.
                if let Some(player) = state.player.take() {
                    commands.entity(player).despawn();
                }
            }
            (false, Some(sink)) => sink.play(),
            (false, None) => {
                if state.player.is_none() {
                    let player = commands
                        .spawn((
                            AudioPlayer::new(asset_server.load(config.track.clone())),
                            PlaybackSettings::LOOP.with_volume(Volume::new(config.volume)),
                        ))
                        .id();
                    state.player = Some(player);
                }
            }
        }
        info!("Music {}", if muted { "muted" } else { "unmuted" });
    }
}

/// Report a failed load of the current player's track.
fn watch_music_playback(
    state: Res<MusicState>,
    players: Query<&AudioPlayer>,
    asset_server: Res<AssetServer>,
    mut failures: EventWriter<MusicLoadFailed>,
) {
    let Some(player) = state.player else {
        return;
    };
    let Ok(audio) = players.get(player) else {
        return;
    };
    if let Some(LoadState::Failed(err)) = asset_server.get_load_state(&audio.0) {
        failures.send(MusicLoadFailed(err.to_string()));
    }
}

/// Go back to muted, drop the failed player and tell the player once.
fn revert_failed_music(
    mut commands: Commands,
    mut failures: EventReader<MusicLoadFailed>,
    mut state: ResMut<MusicState>,
    mut notices: EventWriter<UiNotice>,
) {
    let Some(MusicLoadFailed(reason)) = failures.read().last() else {
        return;
    };
    error!("Audio play failed: {reason}");
    if let Some(entity) = state.playback_failed() {
        commands.entity(entity).despawn();
    }
    notices.send(UiNotice(PLAYBACK_NOTICE.into()));
}
