// src/core/player/virtual_player.rs

//! An in-memory stand-in for a playback engine.

use super::{Player, PlayerError, PlayerStateSnapshot};
use parking_lot::Mutex;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    /// Replaced wholesale on every transition.
    snapshot: PlayerStateSnapshot,
    /// When playback last (re)started; `None` while paused or stopped.
    resumed_at: Option<Instant>,
}

impl Inner {
    fn position_now(&self) -> u64 {
        let elapsed = self
            .resumed_at
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);
        let position = self.snapshot.position_ms.saturating_add(elapsed);
        if self.snapshot.length_ms > 0 {
            position.min(self.snapshot.length_ms)
        } else {
            position
        }
    }
}

/// Tracks what a real engine would be doing without producing any sound.
///
/// Track metadata is read from an `Artist/Album/Song.ext` path layout.
#[derive(Debug, Default)]
pub struct VirtualPlayer {
    inner: Mutex<Inner>,
}

impl VirtualPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

fn component(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Player for VirtualPlayer {
    fn play(&self, path: &str) -> Result<(), PlayerError> {
        if path.trim().is_empty() {
            return Err(PlayerError::EmptyPath);
        }
        let file = Path::new(path);
        let album_dir = file.parent();
        let artist_dir = album_dir.and_then(|p| p.parent());
        let snapshot = PlayerStateSnapshot {
            playing: true,
            artist: component(artist_dir),
            album: component(album_dir),
            song: file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file: path.to_string(),
            length_ms: 0,
            position_ms: 0,
        };
        debug!("Virtual player now playing '{}'", path);
        let mut inner = self.inner.lock();
        inner.snapshot = snapshot;
        inner.resumed_at = Some(Instant::now());
        Ok(())
    }

    fn pause(&self) -> Result<(), PlayerError> {
        let mut inner = self.inner.lock();
        if !inner.snapshot.playing {
            return Err(PlayerError::NotPlaying);
        }
        let paused = PlayerStateSnapshot {
            playing: false,
            position_ms: inner.position_now(),
            ..inner.snapshot.clone()
        };
        inner.snapshot = paused;
        inner.resumed_at = None;
        Ok(())
    }

    fn unpause(&self) -> Result<(), PlayerError> {
        let mut inner = self.inner.lock();
        if inner.snapshot.playing || !inner.snapshot.is_loaded() {
            return Err(PlayerError::NotPaused);
        }
        let resumed = PlayerStateSnapshot {
            playing: true,
            ..inner.snapshot.clone()
        };
        inner.snapshot = resumed;
        inner.resumed_at = Some(Instant::now());
        Ok(())
    }

    fn stop(&self) -> Result<(), PlayerError> {
        let mut inner = self.inner.lock();
        inner.snapshot = PlayerStateSnapshot::stopped();
        inner.resumed_at = None;
        Ok(())
    }

    fn snapshot(&self) -> PlayerStateSnapshot {
        let inner = self.inner.lock();
        PlayerStateSnapshot {
            position_ms: inner.position_now(),
            ..inner.snapshot.clone()
        }
    }
}
