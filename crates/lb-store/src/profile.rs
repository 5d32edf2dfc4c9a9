use std::path::{Path, PathBuf};
use std::{env, fs};

use lb_core::{ReminderSink, TrackingSession};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::store::Store;

const DB_FILE: &str = "leave-behind.db";
const CONFIG_FILE: &str = "config.toml";

/// Default base directory for all leave-behind storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".leave-behind")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// A user's on-disk state: the database plus `config.toml`.
pub struct Profile {
    store: Store,
    config: Config,
    /// `None` for in-memory profiles; config changes are then not written.
    config_path: Option<PathBuf>,
}

impl Profile {
    pub fn open(base_dir: Option<&Path>) -> Result<Self> {
        let base = base_dir.map(PathBuf::from).unwrap_or_else(default_base_dir);
        fs::create_dir_all(&base).map_err(|e| {
            StoreError::InvalidData(format!("failed to create {}: {e}", base.display()))
        })?;

        let config_path = base.join(CONFIG_FILE);
        let config = Config::load(&config_path)?;
        let store = Store::open(&base.join(DB_FILE))?;
        tracing::debug!("opened profile at {}", base.display());

        Ok(Self {
            store,
            config,
            config_path: Some(config_path),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            store: Store::open_in_memory()?,
            config: Config::default(),
            config_path: None,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn set_config(&mut self, config: Config) -> Result<()> {
        config.validate()?;
        if let Some(path) = &self.config_path {
            config.save(path)?;
        }
        self.config = config;
        Ok(())
    }

    /// Build a stopped session over this profile's places, items, history and
    /// dwell threshold. The store becomes the session's history persistence.
    pub fn into_session<S: ReminderSink>(self, sink: S) -> Result<TrackingSession<Store, S>> {
        let places = self.store.load_places()?;
        let items = self.store.load_items()?;
        let policy = self.config.policy();
        Ok(TrackingSession::new(self.store, sink, policy)
            .with_places(places)
            .with_items(items))
    }
}
