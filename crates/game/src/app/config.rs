use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine::app::JoystickConfig;
use engine::LoopConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// Optional client settings. Every field falls back to the engine default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ClientConfig {
    pub(crate) window_title: String,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) tick_interval_ms: u64,
    pub(crate) animation_fps: u32,
    /// 0 disables the cap.
    pub(crate) max_render_fps: u32,
    pub(crate) metrics_log_interval_ms: u64,
    pub(crate) joystick_radius: f32,
    pub(crate) joystick_dead_zone: f32,
    /// Overrides `assets/base/town.xml` under the project root.
    pub(crate) town_content_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let loop_config = LoopConfig::default();
        Self {
            window_title: loop_config.window_title,
            window_width: loop_config.window_width,
            window_height: loop_config.window_height,
            tick_interval_ms: loop_config.tick_interval.as_millis() as u64,
            animation_fps: loop_config.animation_fps,
            max_render_fps: loop_config.max_render_fps.unwrap_or(0),
            metrics_log_interval_ms: loop_config.metrics_log_interval.as_millis() as u64,
            joystick_radius: loop_config.joystick.radius,
            joystick_dead_zone: loop_config.joystick.dead_zone,
            town_content_path: None,
        }
    }
}

impl ClientConfig {
    pub(crate) fn to_loop_config(&self) -> LoopConfig {
        let defaults = JoystickConfig::default();
        LoopConfig {
            window_title: self.window_title.clone(),
            window_width: self.window_width.max(1),
            window_height: self.window_height.max(1),
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            animation_fps: self.animation_fps,
            max_render_fps: Some(self.max_render_fps),
            metrics_log_interval: Duration::from_millis(self.metrics_log_interval_ms),
            joystick: JoystickConfig {
                radius: positive_or(self.joystick_radius, defaults.radius),
                dead_zone: self.joystick_dead_zone.max(0.0),
            },
            ..LoopConfig::default()
        }
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {path}: {source}", path = .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}{location}: {source}", path = .path.display(), location = describe_json_path(.json_path))]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

fn describe_json_path(json_path: &str) -> String {
    if json_path.is_empty() || json_path == "." {
        String::new()
    } else {
        format!(" at {json_path}")
    }
}

pub(crate) fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(path, &raw)
}

pub(crate) fn parse_json<T: DeserializeOwned>(path: &Path, raw: &str) -> Result<T, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}
