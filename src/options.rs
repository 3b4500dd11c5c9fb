//! Centralized runtime options with TOML preset support.
//!
//! All sub-structs use `#[serde(default)]` so partial TOML files (e.g.
//! only overriding `[instances]`) work correctly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MyriadError;

/// Instance population options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstanceOptions {
    /// Desired instance count. Clamped to at least 1 and rounded to the
    /// nearest power of two before buffers are allocated.
    pub count: u32,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self { count: 100_000 }
    }
}

/// Camera projection and placement options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Eye height above the instance ring.
    pub eye_height: f32,
    /// Horizontal eye distance from the ring center.
    pub eye_distance: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            eye_height: 60.0,
            eye_distance: 160.0,
        }
    }
}

/// Frame pacing options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct FrameOptions {
    /// Target FPS cap (0 = unlimited).
    pub target_fps: u32,
}

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Instance population options.
    pub instances: InstanceOptions,
    /// Camera projection and placement options.
    pub camera: CameraOptions,
    /// Frame pacing options.
    pub frame: FrameOptions,
}

impl Options {
    /// Parse options from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`MyriadError::OptionsParse`] on malformed TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self, MyriadError> {
        toml::from_str(toml_str)
            .map_err(|e| MyriadError::OptionsParse(e.to_string()))
    }

    /// Serialize options to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`MyriadError::OptionsParse`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, MyriadError> {
        toml::to_string_pretty(self)
            .map_err(|e| MyriadError::OptionsParse(e.to_string()))
    }

    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`MyriadError::Io`] on read failure and
    /// [`MyriadError::OptionsParse`] on malformed TOML.
    pub fn load(path: &Path) -> Result<Self, MyriadError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Save options to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`MyriadError::Io`] on write failure.
    pub fn save(&self, path: &Path) -> Result<(), MyriadError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_round_trip() {
        let mut options = Options::default();
        options.instances.count = 1 << 20;
        options.frame.target_fps = 120;

        let toml_str = options.to_toml().unwrap();
        let parsed = Options::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = Options::from_toml("[instances]\ncount = 4096\n").unwrap();
        assert_eq!(parsed.instances.count, 4096);
        assert_eq!(parsed.camera, CameraOptions::default());
        assert_eq!(parsed.frame, FrameOptions::default());
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = Options::from_toml("instances = \"many\"").unwrap_err();
        assert!(matches!(err, MyriadError::OptionsParse(_)));
    }
}
