//! Presentation settings.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use heapscope_graph::DEFAULT_AUTO_EXPAND_DEPTH;
use serde::{Deserialize, Serialize};

use crate::error::ViewError;

/// Knobs shared by every view.
///
/// Missing fields in a configuration file take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Children revealed on expand, and per "show more".
    pub default_populate_count: usize,
    /// Levels a retainer tree descends through singleton chains.
    pub auto_expand_depth: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_populate_count: 100,
            auto_expand_depth: DEFAULT_AUTO_EXPAND_DEPTH,
        }
    }
}

/// Reads a [`ViewConfig`] from a JSON file.
///
/// # Errors
///
/// Returns [`ViewError::is_io`] if the file cannot be read and
/// [`ViewError::is_deserialization`] if it is not a valid configuration.
pub fn load_view_config(path: &Path) -> Result<ViewConfig, ViewError> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(ViewError::deserialize)
}
