//! Configuration loading and validation.
//!
//! One explicit value threaded through the dispatcher by reference; there is
//! no process-wide configuration state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::common::collections::HashSet;
use crate::model::state::ScreenId;
use crate::sys::geometry::Point;
use crate::sys::virtual_desktop::VirtualDesktopId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Logical screen ids in priority order; discovered monitors are paired
    /// with these front to back.
    pub screen_ids: Vec<ScreenId>,
    pub initial_focused_screen: ScreenId,
    /// Windows with these exact titles are never registered.
    pub ignored_window_titles: HashSet<String>,
    /// Center the cursor over a window as part of the composite focus action.
    pub mouse_follows_focus: bool,
    /// Fallback relocation reference for a window whose screen origin cannot
    /// be resolved.
    pub default_origin: Point,
    /// Desktops the user switches between; the shortfall is created at
    /// startup.
    pub virtual_desktop_ids: Vec<VirtualDesktopId>,
    /// How long the dispatcher waits for a message before checking for
    /// shutdown, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            screen_ids: vec![ScreenId::new("LEFT"), ScreenId::new("RIGHT")],
            initial_focused_screen: ScreenId::new("RIGHT"),
            ignored_window_titles: ["Task Switching", "Chrome Legacy Window"]
                .into_iter()
                .map(String::from)
                .collect(),
            mouse_follows_focus: true,
            default_origin: Point::default(),
            virtual_desktop_ids: [1, 4, 2, 3, 5].map(VirtualDesktopId::new).to_vec(),
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
    #[error("screen_ids must not be empty")]
    NoScreenIds,
    #[error("screen id {0} is listed more than once")]
    DuplicateScreenId(ScreenId),
    #[error("initial_focused_screen {0} is not in screen_ids")]
    UnknownInitialScreen(ScreenId),
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// The default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mado").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_ids.is_empty() {
            return Err(ConfigError::NoScreenIds);
        }
        let mut seen = HashSet::default();
        for id in &self.screen_ids {
            if !seen.insert(id) {
                return Err(ConfigError::DuplicateScreenId(id.clone()));
            }
        }
        if !self.screen_ids.contains(&self.initial_focused_screen) {
            return Err(ConfigError::UnknownInitialScreen(self.initial_focused_screen.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.screen_ids.len(), 2);
        assert_eq!(config.initial_focused_screen, ScreenId::new("RIGHT"));
        assert!(config.ignored_window_titles.contains("Task Switching"));
        assert!(config.mouse_follows_focus);
    }

    #[test]
    fn loads_a_partial_file_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
screen_ids = ["MAIN"]
initial_focused_screen = "MAIN"
mouse_follows_focus = false
"#
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.screen_ids, vec![ScreenId::new("MAIN")]);
        assert!(!config.mouse_follows_focus);
        // Untouched fields keep their defaults.
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn rejects_an_initial_screen_outside_the_id_list() {
        let config = Config {
            initial_focused_screen: ScreenId::new("CENTER"),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::UnknownInitialScreen(_))));
    }

    #[test]
    fn rejects_duplicate_screen_ids() {
        let config = Config {
            screen_ids: vec!["LEFT".into(), "LEFT".into()],
            initial_focused_screen: "LEFT".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateScreenId(_))));
    }

    #[test]
    fn rejects_an_empty_screen_id_list() {
        let config = Config { screen_ids: vec![], ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::NoScreenIds)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load(Path::new("/nonexistent/mado.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
