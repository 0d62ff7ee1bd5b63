pub mod app_error;
pub mod audio_cue;
pub mod card_renderer;
pub mod catalog_loader;
pub mod config;
pub mod countdown_timer;
pub mod deck_controller;
pub mod deck_session;
pub mod filter_pipeline;
pub mod models;
pub mod preference_store;
pub mod tone_synth;

#[cfg(feature = "desktop")]
mod commands;
#[cfg(feature = "desktop")]
mod events;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use crate::app_error::AppError;
    use crate::audio_cue::{AudioCueEngine, SystemAudioBackend};
    use crate::catalog_loader::load_exercises;
    use crate::commands::{self, DesktopSession};
    use crate::config::EngineConfig;
    use crate::deck_session::DeckSession;
    use crate::events::{emit_app_error, emit_deck_changed, emit_timer_tick};
    use crate::preference_store::PreferenceStore;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};
    use tauri::path::BaseDirectory;
    use tauri::{AppHandle, Manager, WindowEvent};
    use tokio::time::{interval, MissedTickBehavior};
    use tracing::{error, info, warn};
    use tracing_subscriber::EnvFilter;

    const CATALOG_RESOURCE: &str = "exercises.json";
    const CUE_SCRATCH_DIR: &str = "cues";

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("mindful_deck=info")),
            )
            .init();

        let result = tauri::Builder::default()
            .setup(|app| {
                let data_dir = app.path().app_data_dir()?;
                let config = EngineConfig::load_or_default(&data_dir);
                let poll_interval = config.poll_interval();
                let backend =
                    SystemAudioBackend::new(data_dir.join(CUE_SCRATCH_DIR), config.sample_rate);
                let mut session = DeckSession::new(
                    config,
                    PreferenceStore::new(data_dir.clone()),
                    AudioCueEngine::new(backend),
                );

                let catalog_path = app.path().resolve(CATALOG_RESOURCE, BaseDirectory::Resource)?;
                let catalog = load_exercises(&catalog_path);
                if let Err(err) = &catalog {
                    emit_app_error(app.handle(), AppError::from(err).payload());
                }
                session.load_catalog(catalog);

                app.manage(Mutex::new(session));
                spawn_poll_loop(app.handle().clone(), poll_interval);
                info!(data_dir = %data_dir.display(), "mindful deck ready");
                Ok(())
            })
            .on_window_event(|window, event| {
                if let WindowEvent::Destroyed = event {
                    if let Some(session) = window.try_state::<Mutex<DesktopSession>>() {
                        match session.lock() {
                            Ok(mut session) => session.unmount(),
                            Err(_) => warn!("deck session lock poisoned on window close"),
                        }
                    }
                }
            })
            .invoke_handler(tauri::generate_handler![
                commands::get_deck,
                commands::go_next,
                commands::go_previous,
                commands::swipe_start,
                commands::swipe_move,
                commands::swipe_end,
                commands::key_arrow,
                commands::select_category,
                commands::toggle_favorites_only,
                commands::toggle_favorite,
                commands::toggle_completed,
                commands::timer_play_pause,
                commands::timer_reset,
                commands::get_settings,
                commands::save_settings,
                commands::toggle_mute,
                commands::share_text,
            ])
            .run(tauri::generate_context!());

        if let Err(err) = result {
            error!(error = %err, "error while running tauri application");
        }
    }

    /// Drives deck transitions and timer ticks from wall-clock time until the
    /// deck is unmounted.
    fn spawn_poll_loop(app: AppHandle, period: Duration) {
        tauri::async_runtime::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let session = app.state::<Mutex<DesktopSession>>();
                let changes = match session.lock() {
                    Ok(mut session) if session.is_mounted() => {
                        let update = session.poll(Instant::now());
                        (!update.is_empty()).then(|| (update, session.snapshot()))
                    }
                    Ok(_) => {
                        info!("deck unmounted, stopping poll loop");
                        break;
                    }
                    Err(_) => {
                        warn!("deck session lock poisoned, stopping poll loop");
                        break;
                    }
                };
                let Some((update, snapshot)) = changes else {
                    continue;
                };
                if !update.timer_events.is_empty() {
                    emit_timer_tick(&app, snapshot.timer.clone());
                }
                if update.card_changed {
                    emit_deck_changed(&app, snapshot);
                }
            }
        });
    }
}
