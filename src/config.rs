use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::SessionDuration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Prefill for the new-session dialog, updated after each start
    pub default_hours: u64,
    pub default_minutes: u64,
    pub default_seconds: u64,
    pub bell_on_end: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_hours: 0,
            default_minutes: 25,
            default_seconds: 0,
            bell_on_end: false,
        }
    }
}

impl Config {
    pub fn remember_duration(&mut self, duration: SessionDuration) {
        let secs = duration.as_secs();
        self.default_hours = secs / 3600;
        self.default_minutes = (secs % 3600) / 60;
        self.default_seconds = secs % 60;
    }

    /// Dialog field prefill; zero fields are left blank.
    pub fn duration_fields(&self) -> [String; 3] {
        [self.default_hours, self.default_minutes, self.default_seconds].map(|v| {
            if v == 0 {
                String::new()
            } else {
                v.to_string()
            }
        })
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "writing-stats") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("writing_stats_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
