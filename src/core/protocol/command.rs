// src/core/protocol/command.rs

//! Turns a raw request line into a typed `Command`.

use crate::core::acl::Capability;
use crate::core::errors::ProtocolError;
use lazy_static::lazy_static;
use regex::Regex;
use strum_macros::IntoStaticStr;

lazy_static! {
    static ref ARGUMENT: Regex = Regex::new(r#""(.*?)""#).unwrap();

    // Whole-line shapes a keyword must match before its arguments are consulted.
    static ref AUTHENTICATE_SHAPE: Regex = Regex::new(r#"^AUTHENTICATE ".*" ".*"$"#).unwrap();
    static ref CHECK_SHAPE: Regex = Regex::new(r#"^CHECK ".*"$"#).unwrap();
    static ref PLAY_SHAPE: Regex = Regex::new(r#"^PLAY ".*"$"#).unwrap();
    static ref BARE_SHAPE: Regex = Regex::new(r"^[A-Z_]+$").unwrap();
}

/// A request line split into its keyword and quoted arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Everything before the first double quote, trimmed.
    pub keyword: String,
    /// The contents of each `"..."` pair, left to right, quotes stripped.
    pub args: Vec<String>,
}

impl ParsedLine {
    /// Splits a line. Never fails: malformed input just yields odd tokens.
    pub fn tokenize(line: &str) -> Self {
        let keyword = line.split('"').next().unwrap_or_default().trim().to_string();
        Self {
            keyword,
            args: parse_arguments(line),
        }
    }
}

/// Extracts every double-quoted substring of `line`, in order. Embedded quotes
/// cannot be escaped; an unmatched trailing quote is ignored.
pub fn parse_arguments(line: &str) -> Vec<String> {
    ARGUMENT
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Every request the protocol understands.
#[derive(Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Authenticate { device: String, password: String },
    /// The raw argument; a non-numeric version simply never matches.
    Check { version: String },
    Update,
    GetState,
    Pause,
    Unpause,
    Stop,
    Play { filename: String },
}

impl Command {
    /// Parses one request line (without its trailing newline).
    pub fn parse(line: &str) -> Result<Command, ProtocolError> {
        if line.trim().is_empty() {
            return Err(ProtocolError::EmptyLine);
        }

        let ParsedLine { keyword, args } = ParsedLine::tokenize(line);
        let shape: &Regex = match keyword.as_str() {
            "AUTHENTICATE" => &*AUTHENTICATE_SHAPE,
            "CHECK" => &*CHECK_SHAPE,
            "PLAY" => &*PLAY_SHAPE,
            "UPDATE" | "GET_STATE" | "PAUSE" | "UNPAUSE" | "STOP" => &*BARE_SHAPE,
            _ => return Err(ProtocolError::UnknownCommand(keyword)),
        };
        if !shape.is_match(line) {
            return Err(ProtocolError::UnknownCommand(keyword));
        }

        let mut args = args.into_iter();
        let command = match keyword.as_str() {
            "AUTHENTICATE" => Command::Authenticate {
                device: args
                    .next()
                    .ok_or(ProtocolError::MissingArgument("AUTHENTICATE"))?,
                password: args
                    .next()
                    .ok_or(ProtocolError::MissingArgument("AUTHENTICATE"))?,
            },
            "CHECK" => Command::Check {
                version: args.next().ok_or(ProtocolError::MissingArgument("CHECK"))?,
            },
            "PLAY" => Command::Play {
                filename: args.next().ok_or(ProtocolError::MissingArgument("PLAY"))?,
            },
            "UPDATE" => Command::Update,
            "GET_STATE" => Command::GetState,
            "PAUSE" => Command::Pause,
            "UNPAUSE" => Command::Unpause,
            "STOP" => Command::Stop,
            _ => return Err(ProtocolError::UnknownCommand(keyword)),
        };
        Ok(command)
    }

    /// The protocol keyword, e.g. `GET_STATE`.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// The capability an identity needs for this command. `AUTHENTICATE` is ungated.
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            Command::Authenticate { .. } => None,
            Command::Check { .. } => Some(Capability::CheckVersion),
            Command::Update => Some(Capability::Update),
            Command::GetState => Some(Capability::GetState),
            Command::Pause => Some(Capability::Pause),
            Command::Unpause => Some(Capability::Unpause),
            Command::Stop => Some(Capability::Stop),
            Command::Play { .. } => Some(Capability::Play),
        }
    }

    /// True for commands that change what the player is doing.
    pub fn is_transition(&self) -> bool {
        matches!(
            self,
            Command::Play { .. } | Command::Pause | Command::Unpause | Command::Stop
        )
    }
}

// Keeps passwords out of debug logs.
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Authenticate { device, .. } => f
                .debug_struct("Authenticate")
                .field("device", device)
                .field("password", &"<redacted>")
                .finish(),
            Command::Check { version } => f.debug_struct("Check").field("version", version).finish(),
            Command::Play { filename } => f.debug_struct("Play").field("filename", filename).finish(),
            other => f.write_str(other.name()),
        }
    }
}
