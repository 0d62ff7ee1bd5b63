use crate::app_error::AppError;
use crate::audio_cue::SystemAudioBackend;
use crate::deck_session::{DeckSession, DeckSnapshot};
use crate::events::{emit_app_error, emit_deck_changed, emit_timer_tick};
use crate::models::{Category, Settings, TimerState};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Instant;
use tauri::{AppHandle, State};
use tracing::warn;

pub type DesktopSession = DeckSession<SystemAudioBackend>;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowKey {
    Left,
    Right,
}

#[tauri::command]
pub async fn get_deck(
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<DeckSnapshot, String> {
    with_session(&session, &app, |session| session.snapshot())
}

#[tauri::command]
pub async fn go_next(
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<bool, String> {
    update_deck(&session, &app, |session| session.go_next(Instant::now()))
}

#[tauri::command]
pub async fn go_previous(
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<bool, String> {
    update_deck(&session, &app, |session| session.go_previous(Instant::now()))
}

#[tauri::command]
pub async fn swipe_start(
    x: f32,
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<(), String> {
    with_session(&session, &app, |session| session.swipe_start(x))
}

#[tauri::command]
pub async fn swipe_move(
    x: f32,
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<(), String> {
    with_session(&session, &app, |session| session.swipe_move(x))
}

#[tauri::command]
pub async fn swipe_end(
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<bool, String> {
    update_deck(&session, &app, |session| session.swipe_end(Instant::now()))
}

#[tauri::command]
pub async fn key_arrow(
    key: ArrowKey,
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<bool, String> {
    update_deck(&session, &app, |session| match key {
        ArrowKey::Left => session.key_arrow_left(Instant::now()),
        ArrowKey::Right => session.key_arrow_right(Instant::now()),
    })
}

#[tauri::command]
pub async fn select_category(
    category: Option<Category>,
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<(), String> {
    update_deck(&session, &app, |session| session.select_category(category))
}

#[tauri::command]
pub async fn toggle_favorites_only(
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<bool, String> {
    update_deck(&session, &app, |session| session.toggle_favorites_only())
}

#[tauri::command]
pub async fn toggle_favorite(
    exercise_id: u32,
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<bool, String> {
    update_deck(&session, &app, |session| session.toggle_favorite(exercise_id))
}

#[tauri::command]
pub async fn toggle_completed(
    exercise_id: u32,
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<bool, String> {
    update_deck(&session, &app, |session| session.toggle_completed(exercise_id))
}

#[tauri::command]
pub async fn timer_play_pause(
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<TimerState, String> {
    let timer = with_session(&session, &app, |session| {
        session.toggle_play_pause(Instant::now());
        session.timer().state()
    })?;
    emit_timer_tick(&app, timer.clone());
    Ok(timer)
}

#[tauri::command]
pub async fn timer_reset(
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<TimerState, String> {
    let timer = with_session(&session, &app, |session| {
        session.reset_timer();
        session.timer().state()
    })?;
    emit_timer_tick(&app, timer.clone());
    Ok(timer)
}

#[tauri::command]
pub async fn get_settings(
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<Settings, String> {
    with_session(&session, &app, |session| session.settings())
}

#[tauri::command]
pub async fn save_settings(
    settings: Settings,
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<(), String> {
    with_session(&session, &app, |session| session.save_settings(&settings))
}

#[tauri::command]
pub async fn toggle_mute(
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<bool, String> {
    update_deck(&session, &app, |session| session.toggle_mute())
}

#[tauri::command]
pub async fn share_text(
    exercise_id: u32,
    session: State<'_, Mutex<DesktopSession>>,
    app: AppHandle,
) -> Result<Option<String>, String> {
    with_session(&session, &app, |session| session.share_text(exercise_id))
}

fn with_session<T>(
    session: &Mutex<DesktopSession>,
    app: &AppHandle,
    action: impl FnOnce(&mut DesktopSession) -> T,
) -> Result<T, String> {
    let mut session = session.lock().map_err(|_| {
        report_error(app, AppError::system("Kunde inte läsa övningskortleken"))
    })?;
    Ok(action(&mut session))
}

/// Runs `action` and pushes the resulting deck to the web view.
fn update_deck<T>(
    session: &Mutex<DesktopSession>,
    app: &AppHandle,
    action: impl FnOnce(&mut DesktopSession) -> T,
) -> Result<T, String> {
    let (result, snapshot) = with_session(session, app, |session| {
        let result = action(session);
        (result, session.snapshot())
    })?;
    emit_deck_changed(app, snapshot);
    Ok(result)
}

fn report_error(app: &AppHandle, error: AppError) -> String {
    emit_app_error(app, error.payload());
    match error.detail() {
        Some(detail) => warn!(kind = ?error.kind(), detail, "app error"),
        None => warn!(kind = ?error.kind(), message = error.message(), "app error"),
    }
    error.message().to_string()
}
