use std::fmt::Write as _;

use crate::config::MenuConfig;
use crate::db::{Clip, Database, DbError};
use crate::utils::text::preview;

const PIN_MARKER: &str = "★";
const RULE: &str = "────────────────────────";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: i64,
    pub label: String,
}

impl MenuEntry {
    /// Selecting a history entry copies it.
    pub fn command(&self) -> String {
        format!("copy {}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    /// Command text that triggers the item, see `ui::command`.
    pub command: &'static str,
}

/// Snapshot of what the tray menu shows. Rebuilt on every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuModel {
    pub header: String,
    pub pinned: Vec<MenuEntry>,
    pub recent: Vec<MenuEntry>,
    /// Action items, one separator between groups.
    pub groups: Vec<Vec<MenuItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuRow {
    /// Disabled text.
    Label(String),
    Separator,
    Item { label: String, command: String },
}

#[derive(Debug, Clone, Default)]
pub struct MenuState {
    pub paused: bool,
    pub login_enabled: bool,
    pub web_url: Option<String>,
}

pub fn build_menu(db: &Database, config: &MenuConfig, state: &MenuState) -> Result<MenuModel, DbError> {
    let total = db.count()?;
    let header = format!(
        "ClipFlow v{} · {total} {}",
        env!("CARGO_PKG_VERSION"),
        if total == 1 { "entry" } else { "entries" }
    );

    // Pinned rows sort first, so a couple of extra rows leave room for them
    // without pushing recent entries out entirely.
    let rows = db.list(config.recent_items + 2, true)?;
    let (pinned, unpinned): (Vec<_>, Vec<_>) = rows.into_iter().partition(|clip| clip.pinned);

    let entry = |clip: Clip| MenuEntry {
        id: clip.id,
        label: preview(&clip.content, config.preview_length),
    };
    let pinned = pinned.into_iter().map(entry).collect();
    let recent = unpinned
        .into_iter()
        .take(config.recent_items)
        .map(entry)
        .collect();

    let mut history = vec![MenuItem {
        label: "Show history window".to_string(),
        command: "list",
    }];
    if let Some(url) = &state.web_url {
        history.push(MenuItem {
            label: format!("Open web viewer ({url})"),
            command: "web",
        });
    }
    history.push(MenuItem {
        label: "Clear history (keeps pins)".to_string(),
        command: "clear",
    });

    let toggles = vec![
        MenuItem {
            label: if state.paused {
                "Resume monitoring".to_string()
            } else {
                "Pause monitoring".to_string()
            },
            command: "pause",
        },
        MenuItem {
            label: format!(
                "Start on login: {}",
                if state.login_enabled { "on" } else { "off" }
            ),
            command: "login",
        },
    ];

    let quit = vec![MenuItem {
        label: "Quit ClipFlow".to_string(),
        command: "quit",
    }];

    Ok(MenuModel {
        header,
        pinned,
        recent,
        groups: vec![history, toggles, quit],
    })
}

impl MenuModel {
    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.groups.iter().flatten()
    }

    /// Flattened top-to-bottom layout shared by the tray and the console.
    pub fn rows(&self) -> Vec<MenuRow> {
        let mut rows = vec![MenuRow::Label(self.header.clone()), MenuRow::Separator];

        for entry in &self.pinned {
            rows.push(MenuRow::Item {
                label: format!("{PIN_MARKER} {}", entry.label),
                command: entry.command(),
            });
        }
        if !self.pinned.is_empty() {
            rows.push(MenuRow::Separator);
        }
        for entry in &self.recent {
            rows.push(MenuRow::Item {
                label: entry.label.clone(),
                command: entry.command(),
            });
        }
        if !self.recent.is_empty() {
            rows.push(MenuRow::Separator);
        }

        for (index, group) in self.groups.iter().enumerate() {
            if index > 0 {
                rows.push(MenuRow::Separator);
            }
            rows.extend(group.iter().map(|item| MenuRow::Item {
                label: item.label.clone(),
                command: item.command.to_string(),
            }));
        }
        rows
    }
}

pub fn render_menu(menu: &MenuModel) -> String {
    let mut out = String::new();
    for row in menu.rows() {
        let _ = match row {
            MenuRow::Label(text) => writeln!(out, "{text}"),
            MenuRow::Separator => writeln!(out, "{RULE}"),
            MenuRow::Item { label, command } => writeln!(out, "  {label:<40} [{command}]"),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RecordOutcome;
    use crate::services::actions::Action;
    use crate::ui::command::{parse_command, Command};

    fn record(db: &Database, content: &str) -> i64 {
        match db.record(content).expect("record") {
            RecordOutcome::Inserted { clip, .. } | RecordOutcome::Touched(clip) => clip.id,
            RecordOutcome::Skipped => panic!("skipped"),
        }
    }

    #[test]
    fn header_counts_entries() {
        let db = Database::new_in_memory(10).expect("db init");
        record(&db, "only one");
        let menu = build_menu(&db, &MenuConfig::default(), &MenuState::default()).expect("menu");
        assert_eq!(menu.header, format!("ClipFlow v{} · 1 entry", env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn pinned_entries_come_first_and_recent_is_capped() {
        let db = Database::new_in_memory(50).expect("db init");
        let pinned = record(&db, "pinned\nnote");
        db.toggle_pin(pinned).expect("pin");
        for i in 0..12 {
            record(&db, &format!("clip {i}"));
        }

        let config = MenuConfig {
            recent_items: 3,
            preview_length: 40,
        };
        let menu = build_menu(&db, &config, &MenuState::default()).expect("menu");

        assert_eq!(menu.pinned, vec![MenuEntry { id: pinned, label: "pinned ↵ note".to_string() }]);
        let labels: Vec<&str> = menu.recent.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["clip 11", "clip 10", "clip 9"]);
    }

    #[test]
    fn labels_reflect_state() {
        let db = Database::new_in_memory(10).expect("db init");
        let state = MenuState {
            paused: true,
            login_enabled: true,
            web_url: Some("http://127.0.0.1:17890".to_string()),
        };
        let menu = build_menu(&db, &MenuConfig::default(), &state).expect("menu");
        let labels: Vec<&str> = menu.items().map(|i| i.label.as_str()).collect();

        assert!(labels.contains(&"Resume monitoring"));
        assert!(labels.contains(&"Start on login: on"));
        assert!(labels.contains(&"Open web viewer (http://127.0.0.1:17890)"));

        let idle = build_menu(&db, &MenuConfig::default(), &MenuState::default()).expect("menu");
        assert!(idle.items().any(|i| i.label == "Pause monitoring"));
        assert!(idle.items().all(|i| i.command != "web"));
    }

    #[test]
    fn every_clickable_row_maps_to_a_command() {
        let db = Database::new_in_memory(10).expect("db init");
        let id = record(&db, "starred");
        db.toggle_pin(id).expect("pin");
        let plain = record(&db, "plain");
        let state = MenuState {
            web_url: Some("http://127.0.0.1:17890".to_string()),
            ..MenuState::default()
        };
        let menu = build_menu(&db, &MenuConfig::default(), &state).expect("menu");

        let commands: Vec<Command> = menu
            .rows()
            .into_iter()
            .filter_map(|row| match row {
                MenuRow::Item { command, .. } => Some(parse_command(&command).expect("parses")),
                _ => None,
            })
            .collect();

        assert_eq!(
            commands,
            vec![
                Command::Action(Action::Copy(id)),
                Command::Action(Action::Copy(plain)),
                Command::List,
                Command::Web,
                Command::Action(Action::Clear),
                Command::Action(Action::PauseResume),
                Command::Action(Action::ToggleLogin),
                Command::Quit,
            ]
        );
    }

    #[test]
    fn empty_history_has_no_entry_separators() {
        let db = Database::new_in_memory(10).expect("db init");
        let rows = build_menu(&db, &MenuConfig::default(), &MenuState::default())
            .expect("menu")
            .rows();
        let separators = rows.iter().filter(|row| **row == MenuRow::Separator).count();
        assert_eq!(separators, 3);
    }

    #[test]
    fn render_marks_pins() {
        let db = Database::new_in_memory(10).expect("db init");
        let id = record(&db, "starred");
        db.toggle_pin(id).expect("pin");
        record(&db, "plain");

        let text = render_menu(&build_menu(&db, &MenuConfig::default(), &MenuState::default()).expect("menu"));
        assert!(text.contains("★ starred"));
        assert!(text.contains(&format!("[copy {id}]")));
        assert!(text.contains("plain"));
        assert!(text.contains("[quit]"));
    }
}
