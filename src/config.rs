use crate::coordinator::{DEFAULT_UPDATE_INTERVAL, MIN_UPDATE_INTERVAL};
use crate::sutro_api::API_ENDPOINT;
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::env;
use std::sync::Mutex;
use std::time::Duration;

/// Everything the host keeps for one configured integration instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub title: String,
    pub username: String,
    pub password: String,
    pub token: String,
    pub update_interval: Duration,
}

/// Host-provided storage for config entries.
pub trait ConfigStore: Send + Sync {
    fn load(&self, entry_id: &str) -> Option<ConfigEntry>;
    fn save(&self, entry: ConfigEntry);
    fn remove(&self, entry_id: &str) -> Option<ConfigEntry>;
}

/// In-process store; entries vanish with the process.
#[derive(Default)]
pub struct MemoryConfigStore {
    entries: Mutex<HashMap<String, ConfigEntry>>,
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(entry_id)
            .cloned()
    }

    fn save(&self, entry: ConfigEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(entry.entry_id.clone(), entry);
    }

    fn remove(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(entry_id)
    }
}

/// Clamps a requested interval to the supported floor.
pub fn clamp_interval(update_interval: Duration) -> Duration {
    update_interval.max(MIN_UPDATE_INTERVAL)
}

/// Settings for the standalone runner, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeSettings {
    pub api_url: String,
    pub username: String,
    pub password: String,
    pub token: Option<String>,
    pub update_interval: Duration,
}

impl BridgeSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let username = env::var("SUTRO_USERNAME").unwrap_or_default();
        let password = env::var("SUTRO_PASSWORD").unwrap_or_default();
        let token = non_empty(env::var("SUTRO_TOKEN").ok());

        if token.is_none() && (username.is_empty() || password.is_empty()) {
            bail!("Set SUTRO_TOKEN, or SUTRO_USERNAME and SUTRO_PASSWORD");
        }

        let update_interval = match non_empty(env::var("SUTRO_UPDATE_INTERVAL").ok()) {
            Some(secs) => Duration::from_secs(
                secs.trim()
                    .parse()
                    .with_context(|| format!("Invalid SUTRO_UPDATE_INTERVAL `{secs}`"))?,
            ),
            None => DEFAULT_UPDATE_INTERVAL,
        };

        Ok(Self {
            api_url: non_empty(env::var("SUTRO_API_URL").ok())
                .unwrap_or_else(|| API_ENDPOINT.to_string()),
            username,
            password,
            token,
            update_interval: clamp_interval(update_interval),
        })
    }
}

fn non_empty(val: Option<String>) -> Option<String> {
    val.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment is process-global; keep env tests serialized
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "SUTRO_USERNAME",
            "SUTRO_PASSWORD",
            "SUTRO_TOKEN",
            "SUTRO_UPDATE_INTERVAL",
            "SUTRO_API_URL",
        ] {
            env::remove_var(key);
        }
    }

    fn entry(entry_id: &str) -> ConfigEntry {
        ConfigEntry {
            entry_id: entry_id.to_string(),
            title: "mySutro Service".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            token: "T".to_string(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryConfigStore::default();
        assert_eq!(store.load("a"), None);

        store.save(entry("a"));
        assert_eq!(store.load("a"), Some(entry("a")));

        let mut updated = entry("a");
        updated.token = "T2".to_string();
        store.save(updated.clone());
        assert_eq!(store.load("a"), Some(updated.clone()));

        assert_eq!(store.remove("a"), Some(updated));
        assert_eq!(store.load("a"), None);
    }

    #[test]
    fn test_clamp_interval() {
        assert_eq!(clamp_interval(Duration::from_secs(0)), MIN_UPDATE_INTERVAL);
        assert_eq!(clamp_interval(Duration::from_secs(5)), Duration::from_secs(5));
        assert_eq!(clamp_interval(Duration::from_secs(45)), Duration::from_secs(45));
    }

    #[test]
    fn test_settings_from_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("SUTRO_USERNAME", "pool@example.com");
        env::set_var("SUTRO_PASSWORD", "hunter2");
        env::set_var("SUTRO_UPDATE_INTERVAL", "2");

        let settings = BridgeSettings::from_env().unwrap();
        assert_eq!(settings.api_url, API_ENDPOINT);
        assert_eq!(settings.username, "pool@example.com");
        assert_eq!(settings.token, None);
        assert_eq!(settings.update_interval, MIN_UPDATE_INTERVAL);

        clear_env();
    }

    #[test]
    fn test_settings_token_only() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("SUTRO_TOKEN", "abc");
        env::set_var("SUTRO_API_URL", "http://localhost:1234/graphql");

        let settings = BridgeSettings::from_env().unwrap();
        assert_eq!(settings.token.as_deref(), Some("abc"));
        assert_eq!(settings.api_url, "http://localhost:1234/graphql");
        assert_eq!(settings.update_interval, DEFAULT_UPDATE_INTERVAL);

        clear_env();
    }

    #[test]
    fn test_settings_missing_credentials() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("SUTRO_USERNAME", "pool@example.com");
        assert!(BridgeSettings::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_settings_invalid_interval() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("SUTRO_TOKEN", "abc");
        env::set_var("SUTRO_UPDATE_INTERVAL", "often");
        let err = BridgeSettings::from_env().unwrap_err();
        assert!(err.to_string().contains("SUTRO_UPDATE_INTERVAL"));

        clear_env();
    }
}
