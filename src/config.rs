use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagram::OverlayPlacement;
use crate::error::{Error, Result};
use crate::geometry::ConnectorConfig;
use crate::measure::{LayoutConfig, UnresolvedPolicy};
use crate::session::SessionConfig;

/// Everything tunable about a diagram, loadable from a TOML file.
///
/// ```toml
/// policy = "warn-and-skip"
/// overlay = "above"
///
/// [layout]
/// stack-breakpoint = 420.0
///
/// [connector]
/// control-ratio = 0.5
///
/// [session]
/// settle-delays-ms = [100, 500]
/// coalesce-ms = 50
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub layout: LayoutConfig,
    pub connector: ConnectorConfig,
    pub session: SessionConfig,
    pub policy: UnresolvedPolicy,
    pub overlay: OverlayPlacement,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }
}
