//! Editor interaction settings parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::env::VarError;

use crate::consts::{CLOSE_PATH_DISTANCE, HANDLE_RADIUS, MIN_CREATE_SIZE, ROTATE_HANDLE_OFFSET};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    /// Hit slop for vertex, border and rotation handles.
    pub handle_radius: f64,
    /// Distance from the top edge midpoint to the rotation handle.
    pub rotate_handle_offset: f64,
    /// Snap distance that closes an arbitrary path onto its first point.
    pub close_path_distance: f64,
    /// Drag-created shapes below this size are discarded.
    pub min_create_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_radius: HANDLE_RADIUS,
            rotate_handle_offset: ROTATE_HANDLE_OFFSET,
            close_path_distance: CLOSE_PATH_DISTANCE,
            min_create_size: MIN_CREATE_SIZE,
        }
    }
}

impl EditorConfig {
    /// Build config from environment variables. Every variable is optional.
    ///
    /// - `SCENE_HANDLE_RADIUS`: default 8
    /// - `SCENE_ROTATE_HANDLE_OFFSET`: default 24
    /// - `SCENE_CLOSE_PATH_DISTANCE`: default 8
    /// - `SCENE_MIN_CREATE_SIZE`: default 1
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` when a variable is set but is not a
    /// finite, non-negative number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            handle_radius: env_parse_f64("SCENE_HANDLE_RADIUS", HANDLE_RADIUS)?,
            rotate_handle_offset: env_parse_f64("SCENE_ROTATE_HANDLE_OFFSET", ROTATE_HANDLE_OFFSET)?,
            close_path_distance: env_parse_f64("SCENE_CLOSE_PATH_DISTANCE", CLOSE_PATH_DISTANCE)?,
            min_create_size: env_parse_f64("SCENE_MIN_CREATE_SIZE", MIN_CREATE_SIZE)?,
        })
    }
}

fn env_parse_f64(var: &'static str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => parse_distance(var, &raw),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(raw)) => {
            Err(ConfigError::Parse { var, value: raw.to_string_lossy().into_owned() })
        }
    }
}

fn parse_distance(var: &'static str, raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(ConfigError::Parse { var, value: raw.to_string() }),
    }
}
