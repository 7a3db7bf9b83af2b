//! Runtime configuration, read from an optional TOML file and `FACTSTREAK_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  /// How long a write waits on a locked database before reporting a conflict.
  pub busy_timeout_ms: u64,
}

impl ServerConfig {
  /// Layer defaults, then `path` (if it exists), then the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8000)?
      .set_default("store_path", "factstreak.db")?
      .set_default("busy_timeout_ms", 5000)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("FACTSTREAK"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn busy_timeout(&self) -> Duration { Duration::from_millis(self.busy_timeout_ms) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/factstreak.toml")).unwrap();
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.busy_timeout(), Duration::from_secs(5));
    assert_eq!(cfg.store_path, PathBuf::from("factstreak.db"));
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/data/f.db")),
      PathBuf::from(home).join("data/f.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs/f.db")), PathBuf::from("/abs/f.db"));
  }
}
