//! Client configuration
//!
//! Loaded from an optional JSON file. Every field has a default, so an empty object (or no
//! file at all) is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ui::board_layout::BoardLayout;
use crate::ui::theme::{BOARD_PADDING, MAX_BOARD_WIDTH, MIN_BOARD_WIDTH};

/// Board size bounds in pixels
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BoardConfig {
    /// Width at a board size preference of 0%
    pub min_width_px: f32,
    /// Width at a board size preference of 100%
    pub max_width_px: f32,
    pub padding_px: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            min_width_px: MIN_BOARD_WIDTH,
            max_width_px: MAX_BOARD_WIDTH,
            padding_px: BOARD_PADDING,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClientConfig {
    pub board: BoardConfig,
    /// Where display preferences are stored; the platform config directory when unset
    pub preferences_file: Option<PathBuf>,
    /// Per engine call deadline in milliseconds; no deadline when unset
    pub request_timeout_ms: Option<u64>,
    /// Training piece to start with (king, rook, knight, bishop, queen)
    pub variant: Option<String>,
}

impl ClientConfig {
    /// Read the configuration file, or fall back to defaults when no path is given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// JSON schema of the configuration file, pretty printed
    pub fn json_schema() -> anyhow::Result<String> {
        let schema = schemars::schema_for!(ClientConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn board_layout(&self) -> BoardLayout {
        BoardLayout::new(
            self.board.min_width_px,
            self.board.max_width_px,
            self.board.padding_px,
        )
    }
}
