//! Site configuration loading.
//!
//! Configuration lives in three YAML documents under `content/_config/`,
//! each parsed and validated independently so an error message can name
//! the exact document at fault:
//!
//! ```text
//! content/_config/
//! ├── settings.yaml     # version, defaultLocale, supportedLocales, basePath
//! ├── categories.yaml   # categories: [{id, name, icon, order}, ...]
//! └── featured.yaml     # featured: [item-id, ...]
//! ```
//!
//! Configuration is a hard precondition: the build cannot derive URLs or
//! assemble the feed header without it, so any missing document, YAML
//! error, or schema violation is fatal.

use crate::schema::{Category, Validate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("schema violation in {path}: {}", violations.join("; "))]
    Schema {
        path: PathBuf,
        violations: Vec<String>,
    },
}

/// Feed-level settings from `settings.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Feed format version, copied verbatim into the feed.
    pub version: String,
    pub default_locale: String,
    pub supported_locales: Vec<String>,
    /// Deployment prefix for emitted image URLs. Empty means the site
    /// is served from the root.
    #[serde(default)]
    pub base_path: String,
}

#[derive(Debug, Deserialize)]
struct CategoriesFile {
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct FeaturedFile {
    featured: Vec<String>,
}

/// The three configuration documents, loaded and validated.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub categories: Vec<Category>,
    pub featured: Vec<String>,
}

const CONFIG_SUBDIR: &str = "_config";

/// Load configuration from `{content_dir}/_config/`.
pub fn load(content_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = content_dir.join(CONFIG_SUBDIR);

    let settings: Settings = read_yaml(&config_dir.join("settings.yaml"))?;
    if settings.version.trim().is_empty() {
        return Err(ConfigError::Schema {
            path: config_dir.join("settings.yaml"),
            violations: vec!["version: must not be empty".to_string()],
        });
    }

    let categories_path = config_dir.join("categories.yaml");
    let CategoriesFile { categories } = read_yaml(&categories_path)?;
    let violations: Vec<String> = categories
        .iter()
        .flat_map(|c| {
            c.validate()
                .into_iter()
                .map(move |v| format!("categories[{}]: {v}", c.id))
        })
        .collect();
    if !violations.is_empty() {
        return Err(ConfigError::Schema {
            path: categories_path,
            violations,
        });
    }

    let FeaturedFile { featured } = read_yaml(&config_dir.join("featured.yaml"))?;

    Ok(Config {
        settings,
        categories,
        featured,
    })
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
