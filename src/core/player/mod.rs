// src/core/player/mod.rs

//! The playback collaborator the server drives. The real audio engine lives
//! outside this crate; the server only needs the narrow `Player` interface.

mod virtual_player;

pub use virtual_player::VirtualPlayer;

use thiserror::Error;

/// Reasons a playback transition can be refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("no file given")]
    EmptyPath,

    #[error("player is not playing")]
    NotPlaying,

    #[error("player is not paused")]
    NotPaused,

    #[error("playback engine failure: {0}")]
    Engine(String),
}

/// An immutable description of playback at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerStateSnapshot {
    pub playing: bool,
    pub artist: String,
    pub album: String,
    pub song: String,
    pub file: String,
    pub length_ms: u64,
    pub position_ms: u64,
}

impl PlayerStateSnapshot {
    /// Nothing loaded, nothing playing.
    pub fn stopped() -> Self {
        Self::default()
    }

    /// True while a file is loaded, whether playing or paused.
    pub fn is_loaded(&self) -> bool {
        !self.file.is_empty()
    }
}

/// The operations the protocol can trigger on the playback engine.
///
/// Implementations are shared by every connection, but calls are serialized
/// by the server-wide dispatch lock.
pub trait Player: Send + Sync {
    fn play(&self, path: &str) -> Result<(), PlayerError>;
    fn pause(&self) -> Result<(), PlayerError>;
    fn unpause(&self) -> Result<(), PlayerError>;
    fn stop(&self) -> Result<(), PlayerError>;
    fn snapshot(&self) -> PlayerStateSnapshot;
}
