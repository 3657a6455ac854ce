// src/core/protocol/reply.rs

//! Reply values and their wire rendering.

use crate::core::player::PlayerStateSnapshot;

/// What the server writes back for one request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    No,
    /// A payload sent verbatim as one line (catalog document, player state).
    /// An empty payload is how a denied `UPDATE`/`GET_STATE` is answered.
    Line(String),
    /// Nothing is written. Used for lines that are not valid commands.
    Silent,
}

impl Reply {
    pub fn from_outcome(success: bool) -> Self {
        if success { Reply::Ok } else { Reply::No }
    }

    /// Renders a player snapshot in the `GET_STATE` template.
    pub fn state(snapshot: &PlayerStateSnapshot) -> Self {
        Reply::Line(render_state(snapshot))
    }

    /// The text to write, without the trailing newline. `None` for `Silent`.
    pub fn into_line(self) -> Option<String> {
        match self {
            Reply::Ok => Some("OK".to_string()),
            Reply::No => Some("NO".to_string()),
            Reply::Line(line) => Some(line),
            Reply::Silent => None,
        }
    }
}

/// `PLAYING="yes";ARTIST="...";ALBUM="...";SONG="...";LENGTH="...";POSITION="...";`
///
/// All six fields are always present. With nothing loaded every field but
/// `PLAYING` is empty.
pub fn render_state(snapshot: &PlayerStateSnapshot) -> String {
    let playing = if snapshot.playing { "yes" } else { "no" };
    let (length, position) = if snapshot.is_loaded() {
        (
            snapshot.length_ms.to_string(),
            snapshot.position_ms.to_string(),
        )
    } else {
        (String::new(), String::new())
    };
    format!(
        "PLAYING=\"{}\";ARTIST=\"{}\";ALBUM=\"{}\";SONG=\"{}\";LENGTH=\"{}\";POSITION=\"{}\";",
        playing,
        flatten(&snapshot.artist),
        flatten(&snapshot.album),
        flatten(&snapshot.song),
        length,
        position
    )
}

// A tag value containing a newline would split the reply into two lines.
fn flatten(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
