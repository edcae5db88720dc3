//! Explicit catalog configuration, read from TOML.
//!
//! ```toml
//! content_dir = "../../sc2/content"
//! source_dir = "../../sc2/src"
//! default_package = "starcon.ls2"
//!
//! [[governing]]
//! pattern = "(?:^|/)comm/([^/]*)/.*\\.h$"
//! package = "comm/${1}.ls2"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CatalogError;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GoverningRuleConfig {
    /// Regex searched for anywhere in the header path.
    pub pattern: String,
    /// Replacement template, `${1}` etc. refer to the pattern's groups.
    pub package: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub content_dir: PathBuf,
    pub source_dir: PathBuf,
    pub master_map: String,
    pub index_extension: String,
    pub header_pattern: String,
    pub governing: Vec<GoverningRuleConfig>,
    pub default_package: String,
    pub archive_prefix: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            source_dir: PathBuf::from("src"),
            master_map: "uqm.rmp".to_string(),
            index_extension: "ls2".to_string(),
            header_pattern: r"\.h$".to_string(),
            governing: default_governing_rules(),
            default_package: "starcon.ls2".to_string(),
            archive_prefix: Some("content/".to_string()),
        }
    }
}

fn default_governing_rules() -> Vec<GoverningRuleConfig> {
    vec![
        GoverningRuleConfig {
            pattern: r"(?:^|/)comm/([^/]*)/.*\.h$".to_string(),
            package: "comm/${1}.ls2".to_string(),
        },
        GoverningRuleConfig {
            pattern: r"(?:^|/)ships/([^/]*)/.*\.h$".to_string(),
            package: "ship/${1}.ls2".to_string(),
        },
    ]
}

impl CatalogConfig {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|err| CatalogError::io(path, err))?;
        let mut config = Self::parse_toml(&text).map_err(|source| CatalogError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.rebase_relative_paths(base_dir);
        Ok(config)
    }

    pub fn parse_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Content and source directories given relative to `base_dir` become
    /// paths under it.
    pub fn rebase_relative_paths(&mut self, base_dir: &Path) {
        for dir in [&mut self.content_dir, &mut self.source_dir] {
            if dir.is_relative() {
                *dir = base_dir.join(&*dir);
            }
        }
    }

    pub fn master_map_path(&self) -> PathBuf {
        self.content_dir.join(&self.master_map)
    }
}
