use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tunables for one suffix-resolution session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Suffix consulted for `-lfoo` targets.
    pub library_suffix: String,
    /// Initial directories of the global default search path.
    pub default_path: Vec<PathBuf>,
    pub include_flag: String,
    pub library_flag: String,
    pub includes_var: String,
    pub libs_var: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            library_suffix: ".a".to_string(),
            default_path: Vec::new(),
            include_flag: "-I".to_string(),
            library_flag: "-L".to_string(),
            includes_var: ".INCLUDES".to_string(),
            libs_var: ".LIBS".to_string(),
        }
    }
}
