use std::sync::Arc;

use chrono::Utc;
use tauri::{AppHandle, Emitter, Runtime, State};
use tracing::warn;

use crate::config::MenuConfig;
use crate::error::AppResult;
use crate::services::actions::{Action, ActionOutcome, Dispatcher};
use crate::services::notifier::{announce, DesktopNotifier};
use crate::ui::tray;
use crate::web::{clip_views, ClipView};

pub const CLIPS_UPDATED: &str = "clips://updated";

pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub menu: MenuConfig,
    pub web_url: Option<String>,
}

/// Runs an action for the tray or the history window: posts its notice and
/// refreshes both surfaces.
pub fn perform<R: Runtime>(app: &AppHandle<R>, state: &AppState, action: Action) -> AppResult<ActionOutcome> {
    let result = state.dispatcher.dispatch(action);
    if let Err(err) = &result {
        warn!("{action:?} failed: {err}");
    }
    announce(&DesktopNotifier::new(app.clone()), &result);
    history_changed(app);
    result
}

pub fn history_changed<R: Runtime>(app: &AppHandle<R>) {
    tray::request_refresh(app);
    let _ = app.emit(CLIPS_UPDATED, ());
}

fn run_action(app: &AppHandle, state: &AppState, action: Action) -> Result<String, String> {
    perform(app, state, action)
        .map(|outcome| outcome.to_string())
        .map_err(|err| err.to_string())
}

#[tauri::command]
pub fn list_clips(state: State<'_, AppState>) -> Result<Vec<ClipView>, String> {
    clip_views(state.dispatcher.watcher().db(), usize::MAX, Utc::now()).map_err(|err| err.to_string())
}

#[tauri::command]
pub fn copy_clip(app: AppHandle, state: State<'_, AppState>, id: i64) -> Result<String, String> {
    run_action(&app, &state, Action::Copy(id))
}

#[tauri::command]
pub fn toggle_pin(app: AppHandle, state: State<'_, AppState>, id: i64) -> Result<String, String> {
    run_action(&app, &state, Action::TogglePin(id))
}

#[tauri::command]
pub fn delete_clip(app: AppHandle, state: State<'_, AppState>, id: i64) -> Result<String, String> {
    run_action(&app, &state, Action::Delete(id))
}

#[tauri::command]
pub fn clear_history(app: AppHandle, state: State<'_, AppState>) -> Result<String, String> {
    run_action(&app, &state, Action::Clear)
}
