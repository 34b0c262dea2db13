use crate::paths::resolve_config_path;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const KEYRING_SERVICE: &str = "dev.duotalk.chat";
const FALLBACK_KEYS_FILE: &str = "api_keys.json";
const ENV_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FileKeyStore {
    keys: HashMap<String, String>,
}

fn normalize_provider(provider: &str) -> Result<String, String> {
    let normalized = provider.trim().to_lowercase();
    if normalized == "openai" {
        Ok(normalized)
    } else {
        Err(format!("Unknown answer provider: {}", provider))
    }
}

/// Keys usually look like `sk-...` / `sk-proj-...`. Advisory only; a key
/// that fails this check is still sent to the service.
pub fn looks_like_api_key(key: &str) -> bool {
    let trimmed = key.trim();
    trimmed.starts_with("sk-") || trimmed.starts_with("sk-proj-")
}

fn fallback_file_path() -> PathBuf {
    resolve_config_path(FALLBACK_KEYS_FILE)
}

fn load_file_store(path: &Path) -> Result<FileKeyStore, String> {
    if !path.exists() {
        return Ok(FileKeyStore::default());
    }
    let raw = fs::read_to_string(path).map_err(|e| format!("Failed to read key store: {}", e))?;
    serde_json::from_str(&raw).map_err(|e| format!("Failed to parse key store: {}", e))
}

fn save_file_store(path: &Path, store: &FileKeyStore) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(store)
        .map_err(|e| format!("Failed to serialize key store: {}", e))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write key store: {}", e))
}

fn try_store_in_keyring(provider: &str, api_key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, provider)
        .map_err(|e| format!("Failed to create keyring entry: {}", e))?;
    entry
        .set_password(api_key)
        .map_err(|e| format!("Failed to store key in system keyring: {}", e))
}

fn try_read_from_keyring(provider: &str) -> Result<Option<String>, String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, provider)
        .map_err(|e| format!("Failed to create keyring entry: {}", e))?;
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(format!("Failed to read key from system keyring: {}", err)),
    }
}

fn try_delete_from_keyring(provider: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, provider)
        .map_err(|e| format!("Failed to create keyring entry: {}", e))?;
    match entry.delete_password() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => Err(format!("Failed to delete key from system keyring: {}", err)),
    }
}

pub fn store_api_key(provider: &str, api_key: &str) -> Result<(), String> {
    let provider = normalize_provider(provider)?;
    let key = api_key.trim();
    if key.is_empty() {
        return Err("API key cannot be empty".to_string());
    }

    let path = fallback_file_path();
    if let Err(err) = try_store_in_keyring(&provider, key) {
        warn!(
            "System keyring storage unavailable for provider '{}': {}. Falling back to file storage.",
            provider, err
        );
        let mut store = load_file_store(&path)?;
        store.keys.insert(provider, key.to_string());
        return save_file_store(&path, &store);
    }

    let mut store = load_file_store(&path)?;
    store.keys.remove(&provider);
    save_file_store(&path, &store)?;
    Ok(())
}

/// Stored key for a provider: system keyring first, file fallback second.
pub fn read_api_key(provider: &str) -> Result<Option<String>, String> {
    let provider = normalize_provider(provider)?;
    match try_read_from_keyring(&provider) {
        Ok(Some(key)) if !key.trim().is_empty() => return Ok(Some(key)),
        Ok(_) => {}
        Err(err) => {
            warn!(
                "System keyring read unavailable for provider '{}': {}. Falling back to file storage.",
                provider, err
            );
        }
    }

    let store = load_file_store(&fallback_file_path())?;
    Ok(store
        .keys
        .get(&provider)
        .cloned()
        .filter(|value| !value.trim().is_empty()))
}

pub fn clear_api_key(provider: &str) -> Result<(), String> {
    let provider = normalize_provider(provider)?;
    if let Err(err) = try_delete_from_keyring(&provider) {
        warn!(
            "System keyring delete unavailable for provider '{}': {}. Cleaning file fallback.",
            provider, err
        );
    }

    let path = fallback_file_path();
    let mut store = load_file_store(&path)?;
    store.keys.remove(&provider);
    save_file_store(&path, &store)?;
    Ok(())
}

/// Credential lookup in priority order: stored secret (keyring or file
/// fallback), then process environment. The interactive prompt is the
/// shell's job when this returns `None`.
pub fn resolve_api_key(provider: &str) -> Option<String> {
    match read_api_key(provider) {
        Ok(Some(key)) => return Some(key),
        Ok(None) => {}
        Err(err) => warn!("Stored key lookup failed: {}", err),
    }
    std::env::var(ENV_API_KEY)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_check_accepts_usual_shapes() {
        assert!(looks_like_api_key("sk-abcdef1234567890"));
        assert!(looks_like_api_key("sk-proj-abcdef1234567890"));
        assert!(looks_like_api_key("  sk-abcdef1234567890  "));
        assert!(!looks_like_api_key("api-abcdef"));
        assert!(!looks_like_api_key(""));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(normalize_provider("openai").is_ok());
        assert!(normalize_provider(" OpenAI ").is_ok());
        assert!(normalize_provider("gemini").is_err());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("duotalk_keys_{}", crate::util::now_ms()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(FALLBACK_KEYS_FILE);

        let mut store = FileKeyStore::default();
        store
            .keys
            .insert("openai".to_string(), "sk-test1234567890".to_string());
        save_file_store(&path, &store).unwrap();

        let loaded = load_file_store(&path).unwrap();
        assert_eq!(
            loaded.keys.get("openai").map(String::as_str),
            Some("sk-test1234567890")
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_store_is_empty() {
        let path = std::env::temp_dir().join("duotalk_keys_missing.json");
        let _ = fs::remove_file(&path);
        let store = load_file_store(&path).unwrap();
        assert!(store.keys.is_empty());
    }
}
