use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Viewport;

const FPS_ENV: &str = "FTL_PLAYER_FPS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub canvas: CanvasConfig,
}

/// Terminal area the viewport is scaled onto, in character cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub columns: u16,
    pub rows: u16,
    #[serde(default = "default_marker")]
    pub marker: char,
    #[serde(default = "default_marker_color")]
    pub marker_color: MarkerColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Named(NamedColor),
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Red,
    Yellow,
    Cyan,
    Magenta,
    White,
}

fn default_fps() -> u32 { 60 }
fn default_marker() -> char { '●' }
fn default_marker_color() -> MarkerColor { MarkerColor::Named(NamedColor::Red) }

impl Default for CanvasConfig {
    fn default() -> Self {
        // Terminal cells are roughly twice as tall as wide, so a square
        // viewport maps onto twice as many columns as rows.
        CanvasConfig {
            columns: 80,
            rows: 40,
            marker: default_marker(),
            marker_color: default_marker_color(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            viewport: Viewport::default(),
            fps: default_fps(),
            canvas: CanvasConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Load `~/.config/ftl-player/player.json`, falling back to defaults when
    /// the file is missing or invalid, then apply environment overrides.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => config,
                Err(e) => {
                    warn!(
                        path = %config_path.display(),
                        error = %e,
                        "invalid player config, using defaults"
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        config.apply_env_overrides(std::env::var(FPS_ENV).ok().as_deref());
        config
    }

    fn apply_env_overrides(&mut self, fps: Option<&str>) {
        let Some(raw) = fps else {
            return;
        };
        match raw.trim().parse::<u32>() {
            Ok(fps) if fps > 0 => self.fps = fps,
            _ => warn!(value = raw, "ignoring {FPS_ENV}: expected a positive integer"),
        }
    }

    /// Wall-clock time budget for one tick.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("ftl-player");
        path.push("player.json");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_reference_window() {
        let config = PlayerConfig::default();
        assert_eq!(config.viewport.width, 800.0);
        assert_eq!(config.viewport.height, 800.0);
        assert_eq!(config.viewport.margin(), 10.0);
        assert_eq!(config.fps, 60);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: PlayerConfig = serde_json::from_str(r#"{"fps": 30}"#).unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.viewport, Viewport::default());
        assert_eq!(config.canvas, CanvasConfig::default());

        let config: PlayerConfig = serde_json::from_str(
            r#"{"canvas": {"columns": 60, "rows": 30, "marker_color": {"r": 1, "g": 2, "b": 3}}}"#,
        )
        .unwrap();
        assert_eq!(config.canvas.columns, 60);
        assert_eq!(config.canvas.marker, '●');
        assert_eq!(config.canvas.marker_color, MarkerColor::Rgb { r: 1, g: 2, b: 3 });
    }

    #[test]
    fn fps_override_requires_a_positive_integer() {
        let mut config = PlayerConfig::default();
        config.apply_env_overrides(Some("0"));
        assert_eq!(config.fps, 60);
        config.apply_env_overrides(Some("fast"));
        assert_eq!(config.fps, 60);
        config.apply_env_overrides(Some(" 24 "));
        assert_eq!(config.fps, 24);
        config.apply_env_overrides(None);
        assert_eq!(config.fps, 24);
    }

    #[test]
    fn tick_interval_matches_fps() {
        let config = PlayerConfig {
            fps: 50,
            ..PlayerConfig::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
    }
}
