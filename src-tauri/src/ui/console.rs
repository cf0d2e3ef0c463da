use std::io::{self, BufRead, Write};

use chrono::Utc;
use tracing::warn;

use crate::config::MenuConfig;
use crate::services::actions::{ActionOutcome, Dispatcher};
use crate::ui::command::{parse_command, Command};
use crate::ui::menu::{build_menu, render_menu, MenuState};
use crate::ui::window::render_table;

const HELP: &str = "\
commands:
  <id> | copy <id>     copy an entry back to the clipboard
  pin <id>             pin or unpin an entry
  delete <id>          remove an entry
  clear                remove all unpinned entries
  pause                pause or resume monitoring
  login                toggle start on login
  menu                 show the menu
  list                 show the full history window
  web                  show the web viewer address
  quit                 stop ClipFlow";

/// Interactive menu on stdin/stdout for `--headless` runs. Returns when the
/// user quits or input ends.
pub struct Console<'a> {
    dispatcher: &'a Dispatcher,
    menu: &'a MenuConfig,
    web_url: Option<String>,
}

impl<'a> Console<'a> {
    pub fn new(dispatcher: &'a Dispatcher, menu: &'a MenuConfig, web_url: Option<String>) -> Self {
        Self {
            dispatcher,
            menu,
            web_url,
        }
    }

    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        self.show_menu(&mut output)?;
        write!(output, "> ")?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command, &mut output)?,
                Err(message) => writeln!(output, "! {message}")?,
            }
            write!(output, "> ")?;
            output.flush()?;
        }
        writeln!(output)?;
        Ok(())
    }

    fn execute<W: Write>(&self, command: Command, output: &mut W) -> io::Result<()> {
        match command {
            Command::Action(action) => {
                match self.dispatcher.dispatch(action) {
                    Ok(ActionOutcome::Done(notice)) => writeln!(output, "✓ {notice}")?,
                    Ok(outcome @ ActionOutcome::NotFound(_)) => writeln!(output, "· {outcome}")?,
                    Err(err) => {
                        warn!("{action:?} failed: {err}");
                        writeln!(output, "! {err}")?;
                    }
                }
                self.show_menu(output)
            }
            Command::Menu => self.show_menu(output),
            Command::List => self.show_window(output),
            Command::Web => self.show_web(output),
            Command::Help => writeln!(output, "{HELP}"),
            Command::Quit => Ok(()),
        }
    }

    fn show_menu<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let state = MenuState {
            paused: self.dispatcher.watcher().is_paused(),
            login_enabled: self.dispatcher.login_enabled(),
            web_url: self.web_url.clone(),
        };
        match build_menu(self.dispatcher.watcher().db(), self.menu, &state) {
            Ok(menu) => write!(output, "{}", render_menu(&menu)),
            Err(err) => {
                warn!("failed to build menu: {err}");
                writeln!(output, "! history unavailable: {err}")
            }
        }
    }

    fn show_window<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let db = self.dispatcher.watcher().db();
        match db.list(usize::MAX, true) {
            Ok(clips) => write!(
                output,
                "{}",
                render_table(&clips, Utc::now(), self.menu.preview_length)
            ),
            Err(err) => {
                warn!("failed to list history: {err}");
                writeln!(output, "! history unavailable: {err}")
            }
        }
    }

    fn show_web<W: Write>(&self, output: &mut W) -> io::Result<()> {
        match &self.web_url {
            Some(url) => writeln!(output, "web viewer: {url}"),
            None => writeln!(output, "! web viewer is disabled"),
        }
    }
}
