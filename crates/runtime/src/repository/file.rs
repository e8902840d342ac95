//! File-based GameRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use galaxy_core::{GameId, LiveGame};

use super::{GameRepository, RepositoryError, Result};

/// File-based implementation of GameRepository.
///
/// Each game is stored as pretty-printed JSON in `game_{id}.json`. Writes go
/// to a temporary file that is renamed over the old save, so a crash never
/// leaves a half-written game behind.
pub struct FileGameRepository {
    base_dir: PathBuf,
}

impl FileGameRepository {
    /// Create a new file-based game repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Repository under the platform data directory, e.g.
    /// `~/.local/share/galaxy/games` on Linux.
    pub fn in_data_dir() -> Result<Self> {
        let base_dir = directories::ProjectDirs::from("", "", "galaxy")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./save_data"));
        Self::new(base_dir.join("games"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn game_path(&self, id: GameId) -> PathBuf {
        self.base_dir.join(format!("game_{}.json", id.0))
    }
}

impl GameRepository for FileGameRepository {
    fn save(&self, game: &LiveGame) -> Result<()> {
        let path = self.game_path(game.id());
        let temp_path = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(game)?;
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved {} to {}", game.id(), path.display());

        Ok(())
    }

    fn load(&self, id: GameId) -> Result<Option<LiveGame>> {
        let path = self.game_path(id);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let game: LiveGame = serde_json::from_slice(&bytes)?;
        if game.id() != id {
            return Err(RepositoryError::CorruptedData(format!(
                "{} holds {}",
                path.display(),
                game.id()
            )));
        }

        tracing::debug!("Loaded {} from {}", id, path.display());

        Ok(Some(game))
    }

    fn exists(&self, id: GameId) -> bool {
        self.game_path(id).exists()
    }

    fn delete(&self, id: GameId) -> Result<()> {
        let path = self.game_path(id);

        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted {}", id);
        }

        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<GameId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(id) = filename
                    .strip_prefix("game_")
                    .and_then(|s| s.strip_suffix(".json"))
                && let Ok(id) = id.parse::<u64>()
            {
                ids.push(GameId(id));
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }
}
