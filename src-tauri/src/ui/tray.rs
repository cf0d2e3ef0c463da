//! Menu-bar tray: renders `MenuModel` rows as a native menu and routes
//! clicks back through `ui::command`.

use tauri::menu::{Menu, MenuItem, PredefinedMenuItem};
use tauri::tray::TrayIconBuilder;
use tauri::{AppHandle, Manager, Runtime};
use tauri_plugin_opener::OpenerExt;
use tracing::warn;

use crate::commands::{perform, AppState};
use crate::ui::command::{parse_command, Command};
use crate::ui::menu::{build_menu, MenuModel, MenuRow, MenuState};

pub const TRAY_ID: &str = "clipflow-tray";
pub const HISTORY_WINDOW: &str = "history";

pub fn tray_menu<R: Runtime>(app: &AppHandle<R>, model: &MenuModel) -> tauri::Result<Menu<R>> {
    let menu = Menu::new(app)?;
    for (index, row) in model.rows().into_iter().enumerate() {
        match row {
            MenuRow::Label(text) => {
                menu.append(&MenuItem::with_id(app, format!("label-{index}"), text, false, None::<&str>)?)?
            }
            MenuRow::Separator => menu.append(&PredefinedMenuItem::separator(app)?)?,
            MenuRow::Item { label, command } => {
                menu.append(&MenuItem::with_id(app, command, label, true, None::<&str>)?)?
            }
        }
    }
    Ok(menu)
}

/// Rebuilds the tray menu from the store. Must run on the main thread.
pub fn refresh<R: Runtime>(app: &AppHandle<R>) {
    let Some(state) = app.try_state::<AppState>() else {
        return;
    };
    let Some(tray) = app.tray_by_id(TRAY_ID) else {
        warn!("tray icon {TRAY_ID} is missing");
        return;
    };

    let watcher = state.dispatcher.watcher();
    let menu_state = MenuState {
        paused: watcher.is_paused(),
        login_enabled: state.dispatcher.login_enabled(),
        web_url: state.web_url.clone(),
    };
    let model = match build_menu(watcher.db(), &state.menu, &menu_state) {
        Ok(model) => model,
        Err(err) => {
            warn!("failed to build tray menu: {err}");
            return;
        }
    };

    match tray_menu(app, &model) {
        Ok(menu) => {
            if let Err(err) = tray.set_menu(Some(menu)) {
                warn!("failed to set tray menu: {err}");
            }
        }
        Err(err) => warn!("failed to create tray menu: {err}"),
    }
}

/// Schedules `refresh` on the main thread. Safe to call from any thread.
pub fn request_refresh<R: Runtime>(app: &AppHandle<R>) {
    let handle = app.clone();
    if let Err(err) = app.run_on_main_thread(move || refresh(&handle)) {
        warn!("failed to schedule tray refresh: {err}");
    }
}

/// Creates the tray icon when the bundle config did not, then fills its menu.
pub fn install<R: Runtime>(app: &AppHandle<R>) -> tauri::Result<()> {
    if app.tray_by_id(TRAY_ID).is_none() {
        let mut builder = TrayIconBuilder::with_id(TRAY_ID).tooltip("ClipFlow");
        if let Some(icon) = app.default_window_icon().cloned() {
            builder = builder.icon(icon);
        } else {
            warn!("no default window icon available for tray icon");
        }
        builder.build(app)?;
    }
    refresh(app);
    Ok(())
}

pub fn handle_menu_event<R: Runtime>(app: &AppHandle<R>, id: &str) {
    // Label rows are disabled and their ids do not parse.
    let Ok(command) = parse_command(id) else {
        return;
    };
    let Some(state) = app.try_state::<AppState>() else {
        return;
    };

    match command {
        Command::Action(action) => {
            let _ = perform(app, &state, action);
        }
        Command::List => show_history_window(app),
        Command::Web => {
            if let Some(url) = &state.web_url {
                if let Err(err) = app.opener().open_url(url.as_str(), None::<&str>) {
                    warn!("failed to open web viewer: {err}");
                }
            }
        }
        Command::Quit => app.exit(0),
        Command::Menu | Command::Help => {}
    }
}

pub fn show_history_window<R: Runtime>(app: &AppHandle<R>) {
    let Some(window) = app.get_webview_window(HISTORY_WINDOW) else {
        warn!("history window is missing");
        return;
    };
    let _ = window.unminimize();
    let _ = window.show();
    let _ = window.set_focus();
}
