//! Commands typed at the prompt.
//!
//! Parsing is pure so it can be tested without a terminal.

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List the molds available for placement
    Molds,
    /// Place a mold on the canvas
    Add { mold_id: String, x: f64, y: f64 },
    /// Move an object
    Move { object_id: String, x: f64, y: f64 },
    /// Remove an object
    Remove { object_id: String },
    /// Remove every object
    Clear,
    /// Show the local canvas
    List,
    /// Show the transport state
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
molds                   list molds
add <moldId> <x> <y>    place a mold
move <objId> <x> <y>    move an object
rm <objId>              remove an object
clear                   clear the canvas
list                    show the canvas
status                  show the connection state
quit                    exit
";

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = parts.split_first() else {
        return Err(CommandError::Usage("help"));
    };

    match (name, args) {
        ("molds", []) => Ok(Command::Molds),
        ("add", [mold_id, x, y]) => Ok(Command::Add {
            mold_id: mold_id.to_string(),
            x: parse_number(x)?,
            y: parse_number(y)?,
        }),
        ("add", _) => Err(CommandError::Usage("add <moldId> <x> <y>")),
        ("move", [object_id, x, y]) => Ok(Command::Move {
            object_id: object_id.to_string(),
            x: parse_number(x)?,
            y: parse_number(y)?,
        }),
        ("move", _) => Err(CommandError::Usage("move <objId> <x> <y>")),
        ("rm", [object_id]) => Ok(Command::Remove {
            object_id: object_id.to_string(),
        }),
        ("rm", _) => Err(CommandError::Usage("rm <objId>")),
        ("clear", []) => Ok(Command::Clear),
        ("list", []) => Ok(Command::List),
        ("status", []) => Ok(Command::Status),
        ("help", []) => Ok(Command::Help),
        ("quit" | "exit", []) => Ok(Command::Quit),
        _ => Err(CommandError::Unknown(line.trim().to_string())),
    }
}

fn parse_number(value: &str) -> Result<f64, CommandError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError::InvalidNumber(value.to_string()))
}
