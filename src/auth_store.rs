//! Remembered login, so a restart resumes the last session.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::api::AuthUser;
use crate::config::AuthConfig;

/// JSON file holding the signed-in account and its token
#[derive(Debug, Clone)]
pub struct AuthStore {
  path: PathBuf,
}

impl AuthStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// The store described by config, or `None` when logins aren't remembered.
  pub fn from_config(config: &AuthConfig) -> Result<Option<Self>> {
    if !config.remember {
      return Ok(None);
    }
    let path = match &config.file {
      Some(path) => path.clone(),
      None => Self::default_path()?,
    };
    Ok(Some(Self::new(path)))
  }

  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("dashdeck").join("auth.json"))
  }

  #[cfg(test)]
  pub fn path(&self) -> &std::path::Path {
    &self.path
  }

  /// The remembered account. A missing file is no account; an unreadable
  /// one is logged and ignored so the login screen still comes up.
  pub fn load(&self) -> Option<AuthUser> {
    let contents = match std::fs::read_to_string(&self.path) {
      Ok(contents) => contents,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "could not read saved login");
        return None;
      }
    };

    match serde_json::from_str::<AuthUser>(&contents) {
      Ok(user) if !user.username.is_empty() => Some(user),
      Ok(_) => None,
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "discarding malformed saved login");
        None
      }
    }
  }

  pub fn save(&self, user: &AuthUser) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create {}: {}", parent.display(), e))?;
    }

    let json = serde_json::to_string_pretty(user)?;
    std::fs::write(&self.path, json)
      .map_err(|e| eyre!("Failed to write {}: {}", self.path.display(), e))?;

    // The file carries a bearer token
    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| eyre!("Failed to restrict {}: {}", self.path.display(), e))?;
    }

    debug!(path = %self.path.display(), username = %user.username, "login saved");
    Ok(())
  }

  pub fn clear(&self) -> Result<()> {
    match std::fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(eyre!("Failed to remove {}: {}", self.path.display(), e)),
    }
  }
}
