//! Stdin line grammar.
//!
//! A line starting with `/` is a command. A line whose first word is a
//! direction (`w`, `left`, `ArrowUp`, ...) walks that way, optionally for a
//! number of milliseconds. Anything else is sent as chat.

use std::path::PathBuf;
use std::time::Duration;

use classroom_sync::Direction;

/// How long a bare direction is held.
pub const DEFAULT_STEP: Duration = Duration::from_millis(200);

/// Upper bound for a single walk so a typo can't pin a key for minutes.
const MAX_STEP: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Walk(Direction, Duration),
    Say(String),
    Board(PathBuf),
    Mic(bool),
    Mute(bool),
    Who,
    Join,
    Leave,
    Help,
    Quit,
}

pub const HELP: &str = "\
  w/a/s/d [ms]     walk (also up/down/left/right and arrow names)
  /say <text>      send a chat message (plain text works too)
  /board <path>    share an image on the whiteboard
  /mic on|off      start or stop the microphone
  /mute, /unmute   mute without releasing the microphone
  /who             list participants
  /leave, /join    leave or rejoin the room
  /quit            leave and exit";

/// Parse one line. `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(command) = line.strip_prefix('/') {
        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };
        return parse_command(name, rest).map(Some);
    }

    let mut words = line.split_whitespace();
    if let Some(direction) = words.next().and_then(|w| w.parse::<Direction>().ok()) {
        let duration = match words.next() {
            Some(ms) => parse_millis(ms)?,
            None => DEFAULT_STEP,
        };
        if words.next().is_none() {
            return Ok(Some(Input::Walk(direction, duration)));
        }
    }

    Ok(Some(Input::Say(line.to_string())))
}

fn parse_command(name: &str, rest: &str) -> Result<Input, String> {
    match name {
        "say" if !rest.is_empty() => Ok(Input::Say(rest.to_string())),
        "say" => Err("usage: /say <text>".into()),
        "board" if !rest.is_empty() => Ok(Input::Board(PathBuf::from(rest))),
        "board" => Err("usage: /board <path>".into()),
        "mic" => match rest {
            "on" => Ok(Input::Mic(true)),
            "off" => Ok(Input::Mic(false)),
            _ => Err("usage: /mic on|off".into()),
        },
        "mute" => Ok(Input::Mute(true)),
        "unmute" => Ok(Input::Mute(false)),
        "who" => Ok(Input::Who),
        "join" => Ok(Input::Join),
        "leave" => Ok(Input::Leave),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        other => Err(format!("unknown command: /{other} (try /help)")),
    }
}

fn parse_millis(s: &str) -> Result<Duration, String> {
    let ms: u64 = s
        .trim_end_matches("ms")
        .parse()
        .map_err(|_| format!("not a duration: {s}"))?;
    Ok(Duration::from_millis(ms).min(MAX_STEP))
}
