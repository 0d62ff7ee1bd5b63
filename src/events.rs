use crate::app_error::AppErrorPayload;
use crate::deck_session::DeckSnapshot;
use crate::models::TimerState;
use serde::Serialize;
use tauri::{AppHandle, Emitter};
use tracing::warn;

const DECK_CHANGED_EVENT: &str = "deck-changed";
const TIMER_TICK_EVENT: &str = "timer-tick";
const APP_ERROR_EVENT: &str = "app-error";

fn emit_event<S: Serialize + Clone>(app: &AppHandle, event: &str, payload: S) {
    if let Err(err) = app.emit(event, payload) {
        warn!(event, error = %err, "failed to emit event");
    }
}

pub fn emit_deck_changed(app: &AppHandle, snapshot: DeckSnapshot) {
    emit_event(app, DECK_CHANGED_EVENT, snapshot);
}

pub fn emit_timer_tick(app: &AppHandle, timer: TimerState) {
    emit_event(app, TIMER_TICK_EVENT, timer);
}

pub fn emit_app_error(app: &AppHandle, payload: AppErrorPayload) {
    emit_event(app, APP_ERROR_EVENT, payload);
}
