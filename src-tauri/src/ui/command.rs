use crate::services::actions::Action;

/// A user request from the console or a tray menu item. Tray items carry
/// their command text as the menu id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(Action),
    Menu,
    List,
    Web,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(Command::Menu);
    };
    let argument = parts.next();
    if parts.next().is_some() {
        return Err(format!("too many arguments for '{verb}'"));
    }

    let id = || -> Result<i64, String> {
        let raw = argument.ok_or_else(|| format!("'{verb}' needs an entry id"))?;
        raw.parse::<i64>()
            .map_err(|_| format!("'{raw}' is not an entry id"))
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "copy" | "c" => Command::Action(Action::Copy(id()?)),
        "pin" | "unpin" | "p" => Command::Action(Action::TogglePin(id()?)),
        "delete" | "del" | "rm" => Command::Action(Action::Delete(id()?)),
        "clear" => Command::Action(Action::Clear),
        "pause" | "resume" => Command::Action(Action::PauseResume),
        "login" => Command::Action(Action::ToggleLogin),
        "menu" | "m" => Command::Menu,
        "list" | "ls" | "window" => Command::List,
        "web" => Command::Web,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => match other.parse::<i64>() {
            Ok(id) if argument.is_none() => Command::Action(Action::Copy(id)),
            _ => return Err(format!("unknown command '{verb}' (try 'help')")),
        },
    };
    Ok(command)
}
