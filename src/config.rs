use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::storage::{self, LocalStore, StorageBackend};

/// Storage key the config is kept under.
pub const CONFIG_KEY: &str = "config";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub duration_secs: u64,
    pub number_of_words: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_secs: 30,
            number_of_words: 50,
        }
    }
}

impl Config {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Apply command line values on top of what was stored.
    pub fn with_overrides(
        mut self,
        duration_secs: Option<u64>,
        number_of_words: Option<usize>,
    ) -> Self {
        if let Some(secs) = duration_secs {
            self.duration_secs = secs;
        }
        if let Some(n) = number_of_words {
            self.number_of_words = n;
        }
        self
    }

    /// Zero is not a usable countdown or batch size; fall back to the defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.duration_secs == 0 {
            self.duration_secs = defaults.duration_secs;
        }
        if self.number_of_words == 0 {
            self.number_of_words = defaults.number_of_words;
        }
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> storage::Result<()>;
}

/// Keeps the config in a [`LocalStore`] under [`CONFIG_KEY`].
#[derive(Debug, Clone)]
pub struct StoredConfig<B: StorageBackend> {
    store: LocalStore<B>,
}

impl<B: StorageBackend> StoredConfig<B> {
    pub fn new(store: LocalStore<B>) -> Self {
        Self { store }
    }
}

impl<B: StorageBackend> ConfigStore for StoredConfig<B> {
    fn load(&self) -> Config {
        self.store
            .load::<Config>(CONFIG_KEY)
            .map(Config::sanitized)
            .unwrap_or_default()
    }

    fn save(&self, cfg: &Config) -> storage::Result<()> {
        self.store.store(CONFIG_KEY, cfg)
    }
}
