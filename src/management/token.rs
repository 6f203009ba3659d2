use std::path::PathBuf;

use crate::{Res, types::Session};

/// Persists the authenticated session to the local data directory.
///
/// The stored file is an opaque JSON blob containing the access and refresh
/// tokens; it is a secret artifact and its contents are never logged. Writes
/// go to a temporary sibling first and are moved into place with a rename,
/// so a concurrent reader observes either the old or the new complete
/// session, never a partial one.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store at the default location
    /// (`<data dir>/spexport/cache/session.json`).
    pub fn new() -> Self {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("spexport/cache/session.json");
        TokenStore { path }
    }

    /// Store at an explicit path. Used by tests and alternate profiles.
    pub fn at(path: PathBuf) -> Self {
        TokenStore { path }
    }

    /// Loads the persisted session, or `None` if none has been saved.
    pub async fn load(&self) -> Res<Option<Session>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session: Session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    /// Atomically persists the session.
    pub async fn save(&self, session: &Session) -> Res<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(session)?;
        let tmp = self.path.with_extension("json.tmp");
        async_fs::write(&tmp, json).await?;
        async_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Removes the persisted session; a subsequent `load` returns `None`.
    pub async fn clear(&self) -> Res<()> {
        match async_fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        TokenStore::new()
    }
}
