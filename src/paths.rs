use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "duotalk";

/// Base directory for persisted configuration (settings, key fallback store).
/// `DUOTALK_CONFIG_DIR` overrides the platform default.
pub(crate) fn config_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("DUOTALK_CONFIG_DIR") {
    let trimmed = dir.trim();
    if !trimmed.is_empty() {
      let path = PathBuf::from(trimmed);
      let _ = fs::create_dir_all(&path);
      return path;
    }
  }
  let base = dirs::config_dir()
    .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
  let dir = base.join(APP_DIR);
  let _ = fs::create_dir_all(&dir);
  dir
}

pub(crate) fn resolve_config_path(filename: &str) -> PathBuf {
  config_dir().join(filename)
}
