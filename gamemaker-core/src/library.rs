//! Saved-game persistence.
//!
//! A simple key-value style store for finished games: the whole library
//! lives in one versioned JSON file, read and written through `tokio::fs`.
//! No game logic here; the host application decides when to save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Current library file version.
const LIBRARY_VERSION: u32 = 1;

/// Errors from library operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// One saved game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGame {
    pub id: Uuid,

    /// Title of the book the game was made from.
    pub book_title: String,

    /// Title of the generated game.
    pub game_title: String,

    /// The complete playable HTML document.
    pub html: String,

    pub play_count: u32,

    pub created_at: DateTime<Utc>,

    pub last_played: Option<DateTime<Utc>>,
}

impl SavedGame {
    pub fn new(
        book_title: impl Into<String>,
        game_title: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_title: book_title.into(),
            game_title: game_title.into(),
            html: html.into(),
            play_count: 0,
            created_at: Utc::now(),
            last_played: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LibraryFile {
    version: u32,
    games: Vec<SavedGame>,
}

/// The on-disk collection of saved games.
#[derive(Debug)]
pub struct GameLibrary {
    path: PathBuf,
    games: Vec<SavedGame>,
}

impl GameLibrary {
    /// Open a library file, or start an empty library if the file does not
    /// exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref().to_path_buf();

        let games = match fs::read_to_string(&path).await {
            Ok(content) => {
                let file: LibraryFile = serde_json::from_str(&content)?;
                if file.version != LIBRARY_VERSION {
                    return Err(LibraryError::VersionMismatch {
                        expected: LIBRARY_VERSION,
                        found: file.version,
                    });
                }
                file.games
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, games })
    }

    /// Write the library back to disk.
    pub async fn save(&self) -> Result<(), LibraryError> {
        let file = LibraryFile {
            version: LIBRARY_VERSION,
            games: self.games.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }

    /// All saved games, newest first.
    pub fn games(&self) -> &[SavedGame] {
        &self.games
    }

    /// Add a game and return its id.
    pub fn add(&mut self, game: SavedGame) -> Uuid {
        let id = game.id;
        self.games.insert(0, game);
        id
    }

    /// Bump the play count for a game. Returns false for unknown ids.
    pub fn record_play(&mut self, id: Uuid) -> bool {
        match self.games.iter_mut().find(|g| g.id == id) {
            Some(game) => {
                game.play_count += 1;
                game.last_played = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    /// Remove a game. Returns false for unknown ids.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.games.len();
        self.games.retain(|g| g.id != id);
        self.games.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }
}
