//! Commands typed by the player. Coordinates are only parsed here, whether a
//! point is on the board is up to the session.

use weiqi::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Play(Point),
    Pass,
    Quit,
    Help,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("Unknown command: {0}. Type help for a list of commands.")]
    Unknown(String),
    #[error("Not a coordinate: {0}")]
    BadCoordinate(String),
}

pub const HELP: &str = "Commands: `x y` or `play x y` to place a stone, `pass`, `quit`.";

/// Accepts `x y`, `x,y`, `play x y`, `pass`, `quit` and `help`.
pub fn parse_command(line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    let lower = line.to_ascii_lowercase();
    match lower.as_str() {
        "pass" => return Ok(Command::Pass),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        "help" | "?" | "" => return Ok(Command::Help),
        _ => {}
    }

    let coordinates = lower
        .strip_prefix("play ")
        .unwrap_or(&lower)
        .replace(',', " ");
    let parts: Vec<&str> = coordinates.split_whitespace().collect();
    match parts.as_slice() {
        [x, y] => Ok(Command::Play(Point::new(coordinate(x)?, coordinate(y)?))),
        _ => Err(InputError::Unknown(line.to_string())),
    }
}

fn coordinate(text: &str) -> Result<u8, InputError> {
    text.parse()
        .map_err(|_| InputError::BadCoordinate(text.to_string()))
}
