pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod ui;
pub mod utils;
pub mod web;

use std::io::{self, IsTerminal};
use std::sync::Arc;

use tauri::{Manager, RunEvent, WindowEvent};
use tauri_plugin_autostart::MacosLauncher;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::AppState;
use config::Config;
use db::Database;
use error::{AppError, AppResult};
use services::actions::Dispatcher;
use services::login_item::{AutostartLoginItems, LoginItemRegistrar, UnsupportedLoginItems};
use services::watcher::ClipWatcher;
use ui::console::Console;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

fn register_login_item(login_items: &dyn LoginItemRegistrar) {
    match login_items.is_enabled() {
        Ok(true) => {}
        Ok(false) => {
            if let Err(err) = login_items.enable() {
                warn!("failed to enable start on login: {err}");
            }
        }
        Err(err) => warn!("failed to query login items: {err}"),
    }
}

struct WebViewer {
    url: String,
    stop: oneshot::Sender<()>,
}

impl WebViewer {
    fn stop(self) {
        let _ = self.stop.send(());
    }
}

/// Starts the web viewer on the shared async runtime. `None` when disabled
/// or when the port could not be bound.
fn start_web(config: &Config, db: &Arc<Database>) -> Option<WebViewer> {
    if !config.web.enabled {
        return None;
    }

    let listener = match tauri::async_runtime::block_on(web::bind(config.web.port)) {
        Ok(listener) => listener,
        Err(err) => {
            warn!("web viewer disabled, port {} unavailable: {err}", config.web.port);
            return None;
        }
    };

    let (stop, stopped) = oneshot::channel();
    tauri::async_runtime::spawn(web::serve(
        listener,
        Arc::clone(db),
        config.web.list_limit,
        stopped,
    ));
    Some(WebViewer {
        url: format!("http://127.0.0.1:{}", config.web.port),
        stop,
    })
}

pub fn run(cli: Cli) -> AppResult<()> {
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.clone())?;
    cli.apply(&mut config);
    config.validate()?;

    let db_path = config.db_path()?;
    let db = Arc::new(Database::new(&db_path, config.history.capacity)?);
    info!(
        "history at {} ({} entries, capacity {})",
        db_path.display(),
        db.count()?,
        db.capacity()
    );

    let clipboard = clipboard::default_service(config.watcher.read_timeout())?;
    let watcher = Arc::new(ClipWatcher::new(Arc::clone(&db), clipboard));
    let web = start_web(&config, &db);

    if cli.headless {
        run_headless(&config, watcher, web)
    } else {
        run_tray(config, watcher, web)
    }
}

fn run_headless(config: &Config, watcher: Arc<ClipWatcher>, web: Option<WebViewer>) -> AppResult<()> {
    let poller = watcher.spawn(config.watcher.poll_interval(), |_| {})?;
    let dispatcher = Dispatcher::new(watcher, Arc::new(UnsupportedLoginItems));
    let web_url = web.as_ref().map(|web| web.url.clone());

    let result = if io::stdin().is_terminal() {
        Console::new(&dispatcher, &config.menu, web_url).run(io::stdin().lock(), io::stdout())
    } else {
        info!("running without a terminal, press Ctrl-C to stop");
        tauri::async_runtime::block_on(tokio::signal::ctrl_c())
    };

    poller.stop();
    if let Some(web) = web {
        web.stop();
    }
    info!("ClipFlow stopped");
    result.map_err(Into::into)
}

fn run_tray(config: Config, watcher: Arc<ClipWatcher>, web: Option<WebViewer>) -> AppResult<()> {
    let poll_interval = config.watcher.poll_interval();
    let web_url = web.as_ref().map(|web| web.url.clone());
    let setup_watcher = Arc::clone(&watcher);

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_autostart::init(
            MacosLauncher::LaunchAgent,
            None::<Vec<&'static str>>,
        ))
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_opener::init())
        .setup(move |app| {
            #[cfg(target_os = "macos")]
            app.set_activation_policy(tauri::ActivationPolicy::Accessory);

            let login_items: Arc<dyn LoginItemRegistrar> =
                Arc::new(AutostartLoginItems::new(app.handle().clone()));
            if config.login.register_on_launch {
                register_login_item(login_items.as_ref());
            }

            app.manage(AppState {
                dispatcher: Arc::new(Dispatcher::new(setup_watcher, login_items)),
                menu: config.menu.clone(),
                web_url,
            });
            ui::tray::install(app.handle())?;
            Ok(())
        })
        .on_menu_event(|app, event| ui::tray::handle_menu_event(app, event.id().as_ref()))
        .on_window_event(|window, event| {
            if let WindowEvent::CloseRequested { api, .. } = event {
                api.prevent_close();
                let _ = window.hide();
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::list_clips,
            commands::copy_clip,
            commands::toggle_pin,
            commands::delete_clip,
            commands::clear_history
        ])
        .build(tauri::generate_context!())
        .map_err(|err| AppError::Internal(format!("failed to build tray app: {err}")))?;

    let handle = app.handle().clone();
    let mut poller = Some(watcher.spawn(poll_interval, move |_| {
        commands::history_changed(&handle);
    })?);
    let mut web = web;

    app.run(move |_app, event| {
        if let RunEvent::Exit = event {
            if let Some(poller) = poller.take() {
                poller.stop();
            }
            if let Some(web) = web.take() {
                web.stop();
            }
            info!("ClipFlow stopped");
        }
    });
    Ok(())
}
